//! Coaching session entry point.
//!
//! Orchestrates the complete coaching flow:
//! utterance → reply + feedback → synthesized speech → playback

use crate::audio::player::{AudioOutput, NullOutput, PlayerEvent};
use crate::coach::remote::RemoteBackend;
use crate::config::Config;
use crate::error::{ParloError, Result};
use crate::session::sink::SessionSink;
use crate::session::{Session, SessionEvent, SessionOptions};
use crate::transcript::turn::{ConversationTurn, Role, TranscriptFragment};
use owo_colors::OwoColorize;
use std::sync::Arc;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

#[cfg(feature = "playback")]
use crate::audio::player::{CpalPlayer, suppress_audio_warnings};

/// Sink rendering session updates to the terminal.
///
/// The learner's own lines are not echoed back; the terminal already
/// shows what they typed.
struct TerminalSink {
    quiet: bool,
    verbosity: u8,
}

impl SessionSink for TerminalSink {
    fn turn(&mut self, turn: &ConversationTurn) {
        match turn.role {
            Role::User => {
                if self.verbosity >= 1 {
                    eprintln!("{} {}", "you:".dimmed(), turn.text.dimmed());
                }
            }
            Role::Agent => println!("{} {}", "coach:".green().bold(), turn.text),
            Role::System => eprintln!("{}", turn.text.dimmed()),
        }
    }

    fn feedback(&mut self, turn: &ConversationTurn) {
        let Some(feedback) = &turn.feedback else {
            return;
        };
        println!("{} {}", "note:".yellow().bold(), feedback.comment);
        for issue in &feedback.issues {
            match &issue.hint {
                Some(hint) => println!("  {} — {}", issue.word.yellow(), hint),
                None => println!("  {}", issue.word.yellow()),
            }
        }
        if let Some(score) = feedback.score {
            println!("  {} {}/100", "score:".yellow(), score);
        }
    }

    fn notice(&mut self, message: Option<&str>) {
        if let Some(message) = message {
            eprintln!("{}", message.magenta());
        }
    }

    fn playback(&mut self, playing: bool) {
        if !self.quiet {
            let label = if playing { "▶ playing" } else { "⏸ stopped" };
            eprintln!("{}", label.dimmed());
        }
    }

    fn name(&self) -> &'static str {
        "terminal"
    }
}

/// Builds the audio output, falling back to a silent one when no device
/// is available so the session still works over text.
fn build_output(
    config: &Config,
    player_tx: crossbeam_channel::Sender<PlayerEvent>,
    quiet: bool,
) -> Box<dyn AudioOutput> {
    #[cfg(feature = "playback")]
    {
        suppress_audio_warnings();
        match CpalPlayer::new(config.audio.device.as_deref(), player_tx) {
            Ok(player) => return Box::new(player),
            Err(e) => {
                if !quiet {
                    eprintln!(
                        "parlo: audio unavailable ({}), continuing without playback",
                        e
                    );
                }
            }
        }
    }
    #[cfg(not(feature = "playback"))]
    let _ = (config, player_tx, quiet);

    Box::new(NullOutput)
}

/// Forwards end-of-segment events from the realtime audio thread into the
/// session's event channel.
fn bridge_player_events(
    player_rx: crossbeam_channel::Receiver<PlayerEvent>,
    events: mpsc::Sender<SessionEvent>,
) {
    std::thread::spawn(move || {
        while player_rx.recv().is_ok() {
            if events.blocking_send(SessionEvent::PlaybackEnded).is_err() {
                break;
            }
        }
    });
}

/// Run the interactive coaching session.
///
/// Each stdin line is one final user utterance. An empty line toggles
/// playback of the coach's last reply; `/quit` ends the session.
///
/// # Arguments
/// * `config` - Effective configuration (CLI overrides already applied)
/// * `quiet` - Suppress status messages
/// * `verbosity` - Verbosity level (0=default, 1=echo user turns, 2=diagnostics)
/// * `no_feedback` - Skip per-utterance pronunciation feedback
pub async fn run_session_command(
    config: Config,
    quiet: bool,
    verbosity: u8,
    no_feedback: bool,
) -> Result<()> {
    let backend = Arc::new(RemoteBackend::from_config(&config)?);

    let (events_tx, events_rx) = mpsc::channel(64);
    let (player_tx, player_rx) = crossbeam_channel::unbounded();

    let output = build_output(&config, player_tx, quiet);
    bridge_player_events(player_rx, events_tx.clone());

    let mut options = SessionOptions::from_config(&config);
    if no_feedback {
        options.feedback = false;
    }

    let sink = Box::new(TerminalSink { quiet, verbosity });
    let session = Session::new(backend, output, sink, options, events_tx.clone());
    let handle = tokio::spawn(session.run(events_rx));

    if !quiet {
        eprintln!("Ready. Type a sentence and press Enter.");
        eprintln!("Empty line plays/pauses the coach's reply, /quit exits.");
    }

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        let event = match line.as_str() {
            "" => SessionEvent::TogglePlayback,
            "/quit" | "/q" => break,
            _ => SessionEvent::Fragment(TranscriptFragment::new(Role::User, line, true)),
        };
        if events_tx.send(event).await.is_err() {
            break;
        }
    }

    let _ = events_tx.send(SessionEvent::Shutdown).await;
    handle
        .await
        .map_err(|e| ParloError::Other(format!("session task failed: {}", e)))?;
    Ok(())
}

/// Run the say command: synthesize one phrase and play it.
///
/// Enter pauses/resumes, `q` (or end of input) quits. Exits when the
/// phrase finishes playing.
#[cfg(feature = "playback")]
pub async fn run_say_command(config: Config, text: String, quiet: bool) -> Result<()> {
    use crate::audio::wav::buffer_duration;
    use crate::coach::backend::CoachBackend;
    use crate::playback::clock::SystemClock;
    use crate::playback::tracker::{PlaybackTracker, ToggleAction};

    suppress_audio_warnings();

    let backend = RemoteBackend::from_config(&config)?;
    if !quiet {
        eprintln!("Synthesizing…");
    }
    let samples = Arc::new(backend.synthesize(&text).await?);
    let rate = config.audio.tts_sample_rate;

    let (player_tx, player_rx) = crossbeam_channel::unbounded();
    let mut output = CpalPlayer::new(config.audio.device.as_deref(), player_tx)?;

    let mut tracker = PlaybackTracker::new(Box::new(SystemClock::new()));
    tracker.load(buffer_duration(samples.len(), rate));

    // stdin lines drive pause/resume; a dedicated thread keeps reads off
    // the runtime
    let (line_tx, line_rx) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        use std::io::BufRead;
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    if let Some(ToggleAction::Play { offset }) = tracker.toggle() {
        output.play(Arc::clone(&samples), rate, offset)?;
        if !quiet {
            eprintln!("Playing. Enter pauses/resumes, q quits.");
        }
    }

    tokio::task::spawn_blocking(move || {
        loop {
            crossbeam_channel::select! {
                recv(player_rx) -> event => {
                    if event.is_err() {
                        break;
                    }
                    tracker.segment_ended();
                    if tracker.paused_at() == 0.0 {
                        break; // ran to the end
                    }
                }
                recv(line_rx) -> line => {
                    match line {
                        Ok(l) if l.trim() == "q" => break,
                        Ok(_) => match tracker.toggle() {
                            Some(ToggleAction::Play { offset }) => {
                                if output.play(Arc::clone(&samples), rate, offset).is_err() {
                                    break;
                                }
                            }
                            Some(ToggleAction::Pause) => {
                                output.stop();
                                tracker.segment_ended();
                            }
                            None => {}
                        },
                        Err(_) => break,
                    }
                }
            }
        }
    })
    .await
    .map_err(|e| ParloError::Other(format!("playback task failed: {}", e)))?;

    Ok(())
}

/// Run the check command: verify configuration and backend reachability.
pub async fn run_check_command(config: Config) -> Result<()> {
    let ok = "✓".green().to_string();
    let fail = "✗".red().to_string();

    match config.api_key() {
        Ok(_) => println!("{} API key configured", ok),
        Err(e) => {
            println!("{} {}", fail, e);
            return Ok(());
        }
    }

    match RemoteBackend::from_config(&config) {
        Ok(backend) => match backend.probe().await {
            Ok(()) => println!("{} backend reachable at {}", ok, config.api.endpoint),
            Err(e) => println!("{} {}", fail, e),
        },
        Err(e) => println!("{} {}", fail, e),
    }

    #[cfg(feature = "playback")]
    match crate::audio::player::list_output_devices() {
        Ok(devices) if !devices.is_empty() => {
            println!("{} {} audio output device(s) found", ok, devices.len())
        }
        Ok(_) => println!("{} no audio output devices found", fail),
        Err(e) => println!("{} {}", fail, e),
    }
    #[cfg(not(feature = "playback"))]
    println!("{} built without playback support", fail);

    Ok(())
}
