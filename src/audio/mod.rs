//! Audio container handling and playback output.

pub mod player;
pub mod wav;

pub use player::{AudioOutput, NullOutput, PlayerEvent};
#[cfg(feature = "playback")]
pub use player::{CpalPlayer, list_output_devices, suppress_audio_warnings};
pub use wav::{buffer_duration, decode_wav, encode_wav, pcm_to_samples, resample, wrap_pcm};
