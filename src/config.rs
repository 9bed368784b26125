use crate::defaults;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub audio: AudioConfig,
    pub coach: CoachConfig,
}

/// Remote backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the coaching backend.
    pub endpoint: String,
    /// API key. Usually left unset here and provided via PARLO_API_KEY.
    pub key: Option<String>,
    /// Conversation model name.
    pub chat_model: String,
    /// Synthesis voice name.
    pub voice: String,
}

/// Audio output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    /// Output device name. None selects the system default.
    pub device: Option<String>,
    /// Sample rate the synthesis backend delivers.
    pub tts_sample_rate: u32,
}

/// Coaching behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoachConfig {
    /// Quiet period before background speech synthesis fires.
    pub debounce_ms: u64,
    /// Seconds before a transient notice is cleared.
    pub notice_clear_secs: u64,
    /// Request per-utterance pronunciation feedback.
    pub feedback: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::DEFAULT_ENDPOINT.to_string(),
            key: None,
            chat_model: defaults::DEFAULT_CHAT_MODEL.to_string(),
            voice: defaults::DEFAULT_VOICE.to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            tts_sample_rate: defaults::TTS_SAMPLE_RATE,
        }
    }
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::DEBOUNCE_MS,
            notice_clear_secs: defaults::NOTICE_CLEAR_SECS,
            feedback: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - PARLO_API_KEY → api.key
    /// - PARLO_ENDPOINT → api.endpoint
    /// - PARLO_AUDIO_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(key) = std::env::var("PARLO_API_KEY")
            && !key.is_empty()
        {
            self.api.key = Some(key);
        }

        if let Ok(endpoint) = std::env::var("PARLO_ENDPOINT")
            && !endpoint.is_empty()
        {
            self.api.endpoint = endpoint;
        }

        if let Ok(device) = std::env::var("PARLO_AUDIO_DEVICE")
            && !device.is_empty()
        {
            self.audio.device = Some(device);
        }

        self
    }

    /// Resolve the API key, erroring if neither config nor environment set one.
    pub fn api_key(&self) -> crate::error::Result<String> {
        self.api
            .key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(crate::error::ParloError::ApiKeyMissing)
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/parlo/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .expect("Could not determine config directory")
            .join("parlo")
            .join("config.toml")
    }
}
