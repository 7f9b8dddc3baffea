//! cpal microphone capture adapter
//!
//! Captures PCM from the default input device, mixes to mono, resamples
//! to the segment rate, FLAC-encodes, and writes the finished segment
//! file. The cpal stream is driven on a blocking thread because it is
//! not `Send`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use rubato::{FftFixedIn, Resampler};
use tokio::sync::watch;
use tracing::warn;

use crate::application::ports::{AudioCapture, CaptureError, CaptureStats};

use super::flac::{encode_flac, SEGMENT_SAMPLE_RATE};

/// How often the blocking capture loop checks the deadline and stop flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Microphone capture via cpal.
pub struct CpalCapture;

impl CpalCapture {
    pub fn new() -> Self {
        Self
    }

    fn input_device() -> Result<cpal::Device, CaptureError> {
        cpal::default_host()
            .default_input_device()
            .ok_or(CaptureError::NoAudioDevice)
    }

    /// Pick an i16/f32 input config, preferring mono and the segment rate
    fn input_config(device: &cpal::Device) -> Result<(StreamConfig, SampleFormat), CaptureError> {
        let supported = device
            .supported_input_configs()
            .map_err(|e| CaptureError::StartFailed(format!("no input configs: {e}")))?;

        let mut best: Option<cpal::SupportedStreamConfigRange> = None;
        for config in supported {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }
            let is_better = match &best {
                None => true,
                Some(current) => config.channels() < current.channels(),
            };
            if is_better {
                best = Some(config);
            }
        }

        let range = best.ok_or_else(|| {
            CaptureError::StartFailed("no supported input configuration".to_string())
        })?;

        let sample_rate = if range.min_sample_rate().0 <= SEGMENT_SAMPLE_RATE
            && range.max_sample_rate().0 >= SEGMENT_SAMPLE_RATE
        {
            SampleRate(SEGMENT_SAMPLE_RATE)
        } else {
            range.min_sample_rate()
        };

        let sample_format = range.sample_format();
        let config = StreamConfig {
            channels: range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };
        Ok((config, sample_format))
    }

    /// Average interleaved channels down to mono
    fn mix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
        if channels == 1 {
            return samples.to_vec();
        }
        samples
            .chunks(channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    }

    /// Resample mono PCM from the device rate to the segment rate
    fn resample(samples: &[i16], source_rate: u32) -> Result<Vec<i16>, CaptureError> {
        if source_rate == SEGMENT_SAMPLE_RATE {
            return Ok(samples.to_vec());
        }

        let input: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();
        let ratio = SEGMENT_SAMPLE_RATE as f64 / source_rate as f64;
        let output_len = (input.len() as f64 * ratio).ceil() as usize;

        let mut resampler = FftFixedIn::<f32>::new(
            source_rate as usize,
            SEGMENT_SAMPLE_RATE as usize,
            1024,
            2,
            1,
        )
        .map_err(|e| CaptureError::CaptureFailed(format!("resampler init failed: {e}")))?;

        let mut output = Vec::with_capacity(output_len);
        let mut pos = 0;
        while pos < input.len() {
            let needed = resampler.input_frames_next();
            let end = (pos + needed).min(input.len());
            let mut chunk = input[pos..end].to_vec();
            chunk.resize(needed, 0.0);

            let resampled = resampler
                .process(&[chunk], None)
                .map_err(|e| CaptureError::CaptureFailed(format!("resampling failed: {e}")))?;
            output.extend(resampled[0].iter().map(|&s| (s * 32767.0) as i16));
            pos = end;
        }
        output.truncate(output_len);
        Ok(output)
    }

    fn capture_blocking(
        path: &Path,
        limit: Duration,
        stop: watch::Receiver<bool>,
    ) -> Result<CaptureStats, CaptureError> {
        let device = Self::input_device()?;
        let (config, sample_format) = Self::input_config(&device)?;
        let sample_rate = config.sample_rate.0;
        let channels = config.channels;

        let buffer: Arc<StdMutex<Vec<i16>>> = Arc::new(StdMutex::new(Vec::new()));
        let active = Arc::new(AtomicBool::new(true));

        let stream = match sample_format {
            SampleFormat::I16 => {
                let buffer = Arc::clone(&buffer);
                let active = Arc::clone(&active);
                device
                    .build_input_stream(
                        &config,
                        move |data: &[i16], _: &cpal::InputCallbackInfo| {
                            if active.load(Ordering::SeqCst) {
                                let mono = CpalCapture::mix_to_mono(data, channels);
                                if let Ok(mut buffer) = buffer.lock() {
                                    buffer.extend_from_slice(&mono);
                                }
                            }
                        },
                        |err| warn!(error = %err, "audio stream error"),
                        None,
                    )
                    .map_err(|e| CaptureError::StartFailed(e.to_string()))?
            }
            SampleFormat::F32 => {
                let buffer = Arc::clone(&buffer);
                let active = Arc::clone(&active);
                device
                    .build_input_stream(
                        &config,
                        move |data: &[f32], _: &cpal::InputCallbackInfo| {
                            if active.load(Ordering::SeqCst) {
                                let as_i16: Vec<i16> =
                                    data.iter().map(|&s| (s * 32767.0) as i16).collect();
                                let mono = CpalCapture::mix_to_mono(&as_i16, channels);
                                if let Ok(mut buffer) = buffer.lock() {
                                    buffer.extend_from_slice(&mono);
                                }
                            }
                        },
                        |err| warn!(error = %err, "audio stream error"),
                        None,
                    )
                    .map_err(|e| CaptureError::StartFailed(e.to_string()))?
            }
            other => {
                return Err(CaptureError::StartFailed(format!(
                    "unsupported sample format {other:?}"
                )))
            }
        };

        stream
            .play()
            .map_err(|e| CaptureError::StartFailed(e.to_string()))?;

        let started = Instant::now();
        while started.elapsed() < limit && !*stop.borrow() {
            std::thread::sleep(POLL_INTERVAL);
        }
        let elapsed = started.elapsed();

        active.store(false, Ordering::SeqCst);
        drop(stream);

        let samples = {
            let mut buffer = buffer
                .lock()
                .map_err(|_| CaptureError::CaptureFailed("capture buffer poisoned".to_string()))?;
            std::mem::take(&mut *buffer)
        };
        if samples.is_empty() {
            return Err(CaptureError::CaptureFailed(
                "no audio data captured".to_string(),
            ));
        }

        let resampled = Self::resample(&samples, sample_rate)?;
        let flac = encode_flac(&resampled).map_err(|e| CaptureError::WriteFailed(e.to_string()))?;
        std::fs::write(path, flac).map_err(|e| CaptureError::WriteFailed(e.to_string()))?;

        Ok(CaptureStats { elapsed })
    }
}

impl Default for CpalCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioCapture for CpalCapture {
    async fn capture(
        &self,
        path: &Path,
        limit: Duration,
        stop: watch::Receiver<bool>,
    ) -> Result<CaptureStats, CaptureError> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::capture_blocking(&path, limit, stop))
            .await
            .map_err(|e| CaptureError::CaptureFailed(format!("capture task join error: {e}")))?
    }
}
