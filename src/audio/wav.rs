//! WAV container construction and parsing.
//!
//! The synthesis backend delivers raw little-endian 16-bit PCM; wrapping it
//! in the canonical 44-byte RIFF header makes it decodable by any audio
//! library. Decoding accepts arbitrary WAV input, downmixing stereo to mono.

use crate::defaults::WAV_HEADER_LEN;
use crate::error::{ParloError, Result};
use std::io::Cursor;

/// Builds a mono 16-bit PCM WAV file from raw sample bytes.
///
/// Writes the standard 44-byte descriptive header followed by the payload
/// unchanged. The payload must be little-endian i16 samples.
pub fn wrap_pcm(pcm: &[u8], sample_rate: u32) -> Vec<u8> {
    const CHANNELS: u16 = 1;
    const BITS_PER_SAMPLE: u16 = 16;

    let byte_rate = sample_rate * u32::from(CHANNELS) * u32::from(BITS_PER_SAMPLE) / 8;
    let block_align = CHANNELS * BITS_PER_SAMPLE / 8;
    let data_len = pcm.len() as u32;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&CHANNELS.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// Builds a mono 16-bit PCM WAV file from decoded samples.
pub fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        pcm.extend_from_slice(&s.to_le_bytes());
    }
    wrap_pcm(&pcm, sample_rate)
}

/// Parses a WAV container into mono samples and the source sample rate.
///
/// Stereo input is downmixed by averaging channel pairs. Payloads that are
/// not 16-bit integer PCM are rejected.
pub fn decode_wav(bytes: &[u8]) -> Result<(Vec<i16>, u32)> {
    let mut reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| ParloError::AudioDecode {
            message: format!("Failed to parse WAV data: {}", e),
        })?;

    let spec = reader.spec();
    if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
        return Err(ParloError::AudioDecode {
            message: format!(
                "Unsupported WAV format: {}-bit {:?}",
                spec.bits_per_sample, spec.sample_format
            ),
        });
    }

    let raw_samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ParloError::AudioDecode {
            message: format!("Failed to read WAV samples: {}", e),
        })?;

    // Convert to mono if stereo
    let samples = if spec.channels == 2 {
        raw_samples
            .chunks_exact(2)
            .map(|chunk| {
                let left = chunk[0] as i32;
                let right = chunk[1] as i32;
                ((left + right) / 2) as i16
            })
            .collect()
    } else {
        raw_samples
    };

    Ok((samples, spec.sample_rate))
}

/// Interprets raw little-endian bytes as i16 samples.
///
/// A trailing odd byte is dropped.
pub fn pcm_to_samples(pcm: &[u8]) -> Vec<i16> {
    pcm.chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

/// Simple linear interpolation resampling.
pub fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}

/// Duration in seconds of a mono sample buffer at the given rate.
pub fn buffer_duration(len: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    len as f64 / sample_rate as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_pcm_header_is_44_bytes() {
        let wav = wrap_pcm(&[], 24000);
        assert_eq!(wav.len(), WAV_HEADER_LEN);
    }

    #[test]
    fn wrap_pcm_header_fields() {
        let pcm = vec![0u8; 100];
        let wav = wrap_pcm(&pcm, 24000);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        // RIFF size = 36 + data length
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 136);
        // PCM format tag
        assert_eq!(u16::from_le_bytes(wav[20..22].try_into().unwrap()), 1);
        // Mono
        assert_eq!(u16::from_le_bytes(wav[22..24].try_into().unwrap()), 1);
        // Sample rate
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 24000);
        // Byte rate = rate * channels * 2
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 48000);
        // Block align
        assert_eq!(u16::from_le_bytes(wav[32..34].try_into().unwrap()), 2);
        // Bits per sample
        assert_eq!(u16::from_le_bytes(wav[34..36].try_into().unwrap()), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 100);
    }

    #[test]
    fn wrap_pcm_appends_payload_unchanged() {
        let pcm = vec![1u8, 2, 3, 4];
        let wav = wrap_pcm(&pcm, 16000);
        assert_eq!(&wav[WAV_HEADER_LEN..], &pcm[..]);
    }

    #[test]
    fn encode_then_decode_preserves_samples() {
        let samples = vec![0i16, 100, -100, i16::MAX, i16::MIN];
        let wav = encode_wav(&samples, 24000);

        let (decoded, rate) = decode_wav(&wav).unwrap();
        assert_eq!(decoded, samples);
        assert_eq!(rate, 24000);
    }

    #[test]
    fn decode_wav_16khz_header_roundtrip() {
        let wav = encode_wav(&[1i16, 2, 3], 16000);
        let (_, rate) = decode_wav(&wav).unwrap();
        assert_eq!(rate, 16000);
    }

    #[test]
    fn decode_wav_downmixes_stereo() {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 24000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in &[100i16, 200, 300, 400] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, _) = decode_wav(&cursor.into_inner()).unwrap();
        assert_eq!(samples, vec![150i16, 350]);
    }

    #[test]
    fn decode_wav_rejects_garbage() {
        let garbage = vec![0u8, 1, 2, 3, 4, 5];
        let result = decode_wav(&garbage);

        assert!(result.is_err());
        match result {
            Err(ParloError::AudioDecode { message }) => {
                assert!(message.contains("Failed to parse WAV"));
            }
            _ => panic!("Expected AudioDecode error"),
        }
    }

    #[test]
    fn decode_wav_rejects_missing_riff_header() {
        let bad = b"XXXX\x00\x00\x00\x00WAVEfmt ";
        assert!(decode_wav(&bad[..]).is_err());
    }

    #[test]
    fn decode_wav_rejects_empty_input() {
        assert!(decode_wav(&[]).is_err());
    }

    #[test]
    fn pcm_to_samples_little_endian() {
        let pcm = [0x01u8, 0x00, 0xFF, 0xFF];
        assert_eq!(pcm_to_samples(&pcm), vec![1i16, -1]);
    }

    #[test]
    fn pcm_to_samples_drops_trailing_odd_byte() {
        let pcm = [0x01u8, 0x00, 0x7F];
        assert_eq!(pcm_to_samples(&pcm), vec![1i16]);
    }

    #[test]
    fn resample_identity_same_rate() {
        let samples = vec![100i16, 200, 300];
        assert_eq!(resample(&samples, 24000, 24000), samples);
    }

    #[test]
    fn resample_halves_sample_count() {
        let samples = vec![0i16; 4800]; // 200ms at 24kHz
        let resampled = resample(&samples, 24000, 12000);
        assert_eq!(resampled.len(), 2400);
    }

    #[test]
    fn resample_doubles_sample_count_with_interpolation() {
        let samples = vec![0i16, 1000, 2000];
        let resampled = resample(&samples, 12000, 24000);

        assert_eq!(resampled.len(), 6);
        assert_eq!(resampled[0], 0);
        assert!(resampled[1] > 0 && resampled[1] < 1000);
        assert_eq!(resampled[2], 1000);
    }

    #[test]
    fn resample_preserves_amplitude() {
        let samples = vec![1000i16; 240];
        let resampled = resample(&samples, 24000, 48000);
        assert!(resampled.iter().all(|&s| (999..=1001).contains(&s)));
    }

    #[test]
    fn resample_handles_edge_cases() {
        assert!(resample(&[], 24000, 16000).is_empty());

        let single = resample(&[100i16], 24000, 16000);
        assert_eq!(single, vec![100]);
    }

    #[test]
    fn buffer_duration_seconds() {
        assert_eq!(buffer_duration(24000, 24000), 1.0);
        assert_eq!(buffer_duration(12000, 24000), 0.5);
        assert_eq!(buffer_duration(100, 0), 0.0);
    }
}
