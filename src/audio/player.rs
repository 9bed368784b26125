//! Audio output for synthesized speech.
//!
//! The session owns one playback slot: starting a new segment implicitly
//! invalidates the previous one. [`AudioOutput`] is the seam the session
//! drives; [`CpalPlayer`] is the real device implementation behind the
//! `playback` feature. Segment exhaustion is reported over a crossbeam
//! channel because the device callback runs on a realtime thread.

use crate::error::Result;
use std::sync::Arc;

/// Event emitted by the player outside the session's control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The current segment ran out of samples.
    SegmentEnded,
}

/// Playback collaborator: start a segment at an offset, stop the slot.
pub trait AudioOutput: Send {
    /// Starts a new segment at `offset_secs` into the buffer, stopping any
    /// segment that is still running.
    fn play(&mut self, buffer: Arc<Vec<i16>>, sample_rate: u32, offset_secs: f64) -> Result<()>;

    /// Stops the current segment, if any. Does not emit a [`PlayerEvent`];
    /// the caller knows it stopped the segment.
    fn stop(&mut self);
}

/// No-op output for sessions running without an audio device.
pub struct NullOutput;

impl AudioOutput for NullOutput {
    fn play(&mut self, _buffer: Arc<Vec<i16>>, _sample_rate: u32, _offset_secs: f64) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) {}
}

#[cfg(feature = "playback")]
pub use cpal_player::{CpalPlayer, list_output_devices, suppress_audio_warnings};

#[cfg(feature = "playback")]
mod cpal_player {
    use super::{AudioOutput, PlayerEvent};
    use crate::audio::wav::resample;
    use crate::error::{ParloError, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Run a closure with stderr temporarily redirected to /dev/null.
    ///
    /// This suppresses noisy ALSA/JACK/PipeWire messages that CPAL triggers
    /// when probing audio backends. The messages are harmless but confusing
    /// to users.
    ///
    /// # Safety
    /// Uses `libc::dup`/`libc::dup2` to save and restore file descriptor 2
    /// (stderr). Safe as long as no other thread is concurrently
    /// manipulating fd 2.
    fn with_suppressed_stderr<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        unsafe {
            let saved_fd = libc::dup(2);
            let devnull = libc::open(c"/dev/null".as_ptr(), libc::O_WRONLY);
            if saved_fd >= 0 && devnull >= 0 {
                libc::dup2(devnull, 2);
                libc::close(devnull);
            }

            let result = f();

            if saved_fd >= 0 {
                libc::dup2(saved_fd, 2);
                libc::close(saved_fd);
            }

            result
        }
    }

    /// Suppress noisy JACK/ALSA error messages that occur during audio
    /// backend probing.
    ///
    /// # Safety
    /// This modifies environment variables which is safe when called before
    /// spawning threads.
    pub fn suppress_audio_warnings() {
        // SAFETY: Called at startup before any threads are spawned
        unsafe {
            std::env::set_var("JACK_NO_START_SERVER", "1");
            std::env::set_var("JACK_NO_AUDIO_RESERVATION", "1");
            std::env::set_var("PIPEWIRE_DEBUG", "0");
            std::env::set_var("ALSA_DEBUG", "0");
            std::env::set_var("PW_LOG", "0");
        }
    }

    /// Device name patterns to filter out (not useful for speech playback).
    const FILTERED_PATTERNS: &[&str] = &[
        "surround",
        "front:",
        "rear:",
        "center:",
        "side:",
        "S/PDIF",
    ];

    fn should_filter_device(name: &str) -> bool {
        let lower = name.to_lowercase();
        FILTERED_PATTERNS
            .iter()
            .any(|pattern| lower.contains(&pattern.to_lowercase()))
    }

    /// List available audio output devices.
    ///
    /// Filters out obviously unusable devices (surround channels, S/PDIF).
    /// cpal may print ALSA/JACK warnings to stderr while probing backends;
    /// these are suppressed.
    pub fn list_output_devices() -> Result<Vec<String>> {
        let (host, devices) = with_suppressed_stderr(|| {
            let host = cpal::default_host();
            let devices = host.output_devices();
            (host, devices)
        });
        let _ = host; // keep host alive while iterating devices
        let devices = devices.map_err(|e| ParloError::AudioOutput {
            message: format!("Failed to enumerate output devices: {}", e),
        })?;

        let mut device_names = Vec::new();
        for device in devices {
            if let Ok(name) = device.name()
                && !should_filter_device(&name)
            {
                device_names.push(name);
            }
        }

        Ok(device_names)
    }

    /// Wrapper for cpal::Stream to make it Send.
    ///
    /// SAFETY: The stream is only accessed from the session task; play and
    /// stop are called synchronously and never share the stream across
    /// threads.
    struct SendableStream(cpal::Stream);

    unsafe impl Send for SendableStream {}

    /// Real audio output implementation using CPAL.
    ///
    /// Opens the default (or named) output device, resamples the buffer to
    /// the device rate, and plays from the requested offset. When the
    /// buffer is exhausted a [`PlayerEvent::SegmentEnded`] is sent on the
    /// event channel exactly once per segment.
    pub struct CpalPlayer {
        device: cpal::Device,
        device_rate: u32,
        device_channels: u16,
        stream: Option<SendableStream>,
        events: crossbeam_channel::Sender<PlayerEvent>,
    }

    impl CpalPlayer {
        /// Create a new player on the given output device.
        ///
        /// # Arguments
        /// * `device_name` - Optional device name. If None, uses the default
        ///   output device.
        /// * `events` - Channel the end-of-segment event is reported on.
        pub fn new(
            device_name: Option<&str>,
            events: crossbeam_channel::Sender<PlayerEvent>,
        ) -> Result<Self> {
            let device = with_suppressed_stderr(|| {
                let host = cpal::default_host();

                if let Some(name) = device_name {
                    let devices = host.output_devices().map_err(|e| ParloError::AudioOutput {
                        message: format!("Failed to enumerate devices: {}", e),
                    })?;

                    let mut found_device = None;
                    for dev in devices {
                        if let Ok(dev_name) = dev.name()
                            && dev_name == name
                        {
                            found_device = Some(dev);
                            break;
                        }
                    }

                    found_device.ok_or_else(|| ParloError::AudioDeviceNotFound {
                        device: name.to_string(),
                    })
                } else {
                    host.default_output_device()
                        .ok_or_else(|| ParloError::AudioDeviceNotFound {
                            device: "default".to_string(),
                        })
                }
            })?;

            let config = device
                .default_output_config()
                .map_err(|e| ParloError::AudioOutput {
                    message: format!("Failed to query output config: {}", e),
                })?;

            Ok(Self {
                device_rate: config.sample_rate(),
                device_channels: config.channels(),
                device,
                stream: None,
                events,
            })
        }

        fn build_stream(&self, samples: Vec<i16>) -> Result<cpal::Stream> {
            let config = cpal::StreamConfig {
                channels: self.device_channels,
                sample_rate: self.device_rate,
                buffer_size: cpal::BufferSize::Default,
            };

            let channels = self.device_channels as usize;
            let events = self.events.clone();
            let ended = Arc::new(AtomicBool::new(false));
            let mut pos = 0usize;

            let stream = self
                .device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _| {
                        for frame in data.chunks_mut(channels) {
                            let value = if pos < samples.len() {
                                let s = samples[pos] as f32 / i16::MAX as f32;
                                pos += 1;
                                s
                            } else {
                                // Buffer exhausted: report once, pad silence
                                if !ended.swap(true, Ordering::Relaxed) {
                                    let _ = events.try_send(PlayerEvent::SegmentEnded);
                                }
                                0.0
                            };
                            for sample in frame.iter_mut() {
                                *sample = value;
                            }
                        }
                    },
                    |err| {
                        eprintln!("parlo: audio output error: {}", err);
                    },
                    None,
                )
                .map_err(|e| ParloError::AudioOutput {
                    message: format!("Failed to build output stream: {}", e),
                })?;

            Ok(stream)
        }
    }

    impl AudioOutput for CpalPlayer {
        fn play(
            &mut self,
            buffer: Arc<Vec<i16>>,
            sample_rate: u32,
            offset_secs: f64,
        ) -> Result<()> {
            // Stop-before-start: the slot holds one segment at a time
            self.stop();

            let device_samples = resample(&buffer, sample_rate, self.device_rate);
            let start = ((offset_secs * self.device_rate as f64) as usize)
                .min(device_samples.len());
            let remaining = device_samples[start..].to_vec();

            let stream = self.build_stream(remaining)?;
            stream.play().map_err(|e| ParloError::AudioOutput {
                message: format!("Failed to start playback: {}", e),
            })?;

            self.stream = Some(SendableStream(stream));
            Ok(())
        }

        fn stop(&mut self) {
            // Dropping the stream tears down the callback; a stopped segment
            // never reports SegmentEnded
            self.stream = None;
        }
    }
}
