//! FLAC encoding for segment files
//!
//! Segments are stored losslessly so the transcription API gets the best
//! possible input at roughly 40% of raw PCM size.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

/// Sample rate every segment is resampled to before encoding
pub const SEGMENT_SAMPLE_RATE: u32 = 16_000;

const BITS_PER_SAMPLE: usize = 16;
const CHANNELS: usize = 1;

/// FLAC encoding errors
#[derive(Debug, thiserror::Error)]
pub enum FlacError {
    #[error("FLAC config error: {0}")]
    Config(String),

    #[error("FLAC encoding failed: {0}")]
    Encode(String),

    #[error("FLAC write failed: {0}")]
    Write(String),
}

/// Encode mono 16-bit PCM at [`SEGMENT_SAMPLE_RATE`] into FLAC bytes.
pub fn encode_flac(pcm_samples: &[i16]) -> Result<Vec<u8>, FlacError> {
    // flacenc works on i32 samples internally
    let samples: Vec<i32> = pcm_samples.iter().map(|&s| s as i32).collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| FlacError::Config(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        &samples,
        CHANNELS,
        BITS_PER_SAMPLE,
        SEGMENT_SAMPLE_RATE as usize,
    );

    let stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| FlacError::Encode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    stream
        .write(&mut sink)
        .map_err(|e| FlacError::Write(e.to_string()))?;

    Ok(sink.into_inner())
}
