use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use parlo::app::{run_check_command, run_session_command};
use parlo::cli::{Cli, Commands, ConfigAction};
use parlo::config::Config;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref(), cli.device, cli.voice)?;
            run_session_command(config, cli.quiet, cli.verbose, cli.no_feedback).await?;
        }
        Some(Commands::Say { text }) => {
            let config = load_config(cli.config.as_deref(), cli.device, cli.voice)?;
            #[cfg(feature = "playback")]
            parlo::app::run_say_command(config, text, cli.quiet).await?;
            #[cfg(not(feature = "playback"))]
            {
                let _ = (config, text);
                anyhow::bail!("parlo was built without playback support");
            }
        }
        Some(Commands::Devices) => {
            list_audio_devices()?;
        }
        Some(Commands::Check) => {
            let config = load_config(cli.config.as_deref(), cli.device, cli.voice)?;
            run_check_command(config).await?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Load configuration, apply environment then CLI overrides.
fn load_config(
    path: Option<&Path>,
    device: Option<String>,
    voice: Option<String>,
) -> Result<Config> {
    let mut config = match path {
        Some(p) => Config::load(p)?,
        None => Config::load_or_default(&Config::default_path())?,
    }
    .with_env_overrides();

    if let Some(d) = device {
        config.audio.device = Some(d);
    }
    if let Some(v) = voice {
        config.api.voice = v;
    }

    Ok(config)
}

fn list_audio_devices() -> Result<()> {
    #[cfg(feature = "playback")]
    {
        let devices = parlo::audio::list_output_devices()?;
        if devices.is_empty() {
            eprintln!("No audio output devices found.");
        } else {
            println!("{}", "Audio output devices:".bold());
            for device in devices {
                println!("  {}", device);
            }
        }
        Ok(())
    }
    #[cfg(not(feature = "playback"))]
    anyhow::bail!("parlo was built without playback support")
}

fn handle_config_command(action: ConfigAction, path: Option<&Path>) -> Result<()> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
        ConfigAction::Init => {
            if config_path.exists() {
                eprintln!(
                    "{} config already exists at {}",
                    "warning:".yellow().bold(),
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&config_path, toml::to_string_pretty(&Config::default())?)?;
            println!("Wrote {}", config_path.display());
        }
    }

    Ok(())
}
