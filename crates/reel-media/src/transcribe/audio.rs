//! Audio extraction for speech recognition.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Sample rate Whisper expects.
pub const WHISPER_SAMPLE_RATE: u32 = 16_000;

/// Decode the audio track of `video` to 16 kHz mono f32 samples.
pub async fn extract_pcm_samples(video: &Path, scratch_dir: &Path) -> MediaResult<Vec<f32>> {
    let raw_path = scratch_dir.join("audio.f32le");

    let cmd = FfmpegCommand::new(video, &raw_path)
        .no_video()
        .output_args(["-ac", "1", "-ar"])
        .output_arg(WHISPER_SAMPLE_RATE.to_string())
        .output_args(["-f", "f32le"]);

    FfmpegRunner::new().run(&cmd).await?;

    let bytes = tokio::fs::read(&raw_path).await?;
    decode_f32le(&bytes)
}

fn decode_f32le(bytes: &[u8]) -> MediaResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(MediaError::transcription_failed(format!(
            "PCM stream length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_f32le() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0.5f32.to_le_bytes());
        bytes.extend_from_slice(&(-1.0f32).to_le_bytes());
        assert_eq!(decode_f32le(&bytes).unwrap(), vec![0.5, -1.0]);
        assert!(decode_f32le(&[0, 1, 2]).is_err());
    }
}
