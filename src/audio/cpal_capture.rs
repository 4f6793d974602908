//! cpal-based audio capture
//!
//! Uses the cpal crate for cross-platform audio input. cpal::Stream is
//! not Send, so the stream lives on a dedicated thread; the data callback
//! folds channels to mono, resamples to the target rate, and forwards each
//! block to the sink. The sink runs on the driver's callback thread and
//! must not block.

use super::{AudioCapture, FrameSink};
use crate::config::AudioConfig;
use crate::error::AudioError;
use std::thread;
use tokio::sync::oneshot;

/// cpal-based audio capture implementation
pub struct CpalCapture {
    config: AudioConfig,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl CpalCapture {
    pub fn new(config: &AudioConfig) -> Result<Self, AudioError> {
        Ok(Self {
            config: config.clone(),
            stop_tx: None,
            thread_handle: None,
        })
    }
}

/// Find an audio input device by name with flexible matching:
/// exact, then case-insensitive, then substring.
fn find_audio_device(host: &cpal::Host, device_name: &str) -> Result<cpal::Device, AudioError> {
    use cpal::traits::{DeviceTrait, HostTrait};

    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| AudioError::Connection(e.to_string()))?
        .collect();

    let search_lower = device_name.to_lowercase();

    let matched = devices
        .iter()
        .position(|d| d.name().map(|n| n == device_name).unwrap_or(false))
        .or_else(|| {
            devices
                .iter()
                .position(|d| d.name().map(|n| n.to_lowercase() == search_lower).unwrap_or(false))
        })
        .or_else(|| {
            devices.iter().position(|d| {
                d.name()
                    .map(|n| n.to_lowercase().contains(&search_lower))
                    .unwrap_or(false)
            })
        });

    match matched {
        Some(index) => {
            let device = devices.into_iter().nth(index);
            device.ok_or_else(|| AudioError::DeviceNotFound(device_name.to_string()))
        }
        None => Err(AudioError::DeviceNotFound(device_name.to_string())),
    }
}

#[async_trait::async_trait]
impl AudioCapture for CpalCapture {
    async fn start(&mut self, sink: FrameSink) -> Result<(), AudioError> {
        use cpal::traits::{DeviceTrait, HostTrait};

        let host = cpal::default_host();

        let device = if self.config.device == "default" {
            host.default_input_device()
                .ok_or_else(|| AudioError::DeviceNotFound("default".to_string()))?
        } else {
            find_audio_device(&host, &self.config.device)?
        };

        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());
        tracing::info!("Using audio device: {}", device_name);

        let supported_config = device
            .default_input_config()
            .map_err(|e| AudioError::Connection(e.to_string()))?;

        let source_rate = supported_config.sample_rate().0;
        let source_channels = supported_config.channels() as usize;
        let target_rate = self.config.sample_rate;
        let sample_format = supported_config.sample_format();

        tracing::debug!(
            "Device config: {} Hz, {} channel(s), format: {:?}",
            source_rate,
            source_channels,
            sample_format
        );

        let (stop_tx, stop_rx) = std::sync::mpsc::channel::<()>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), AudioError>>();

        let thread_handle = thread::spawn(move || {
            use cpal::traits::StreamTrait;

            let stream_config = cpal::StreamConfig {
                channels: supported_config.channels(),
                sample_rate: supported_config.sample_rate(),
                buffer_size: cpal::BufferSize::Default,
            };

            let err_fn = |err| tracing::error!("Audio stream error: {}", err);

            let stream_result = match sample_format {
                cpal::SampleFormat::F32 => build_stream::<f32>(
                    &device,
                    &stream_config,
                    sink,
                    source_rate,
                    target_rate,
                    source_channels,
                    err_fn,
                ),
                cpal::SampleFormat::I16 => build_stream::<i16>(
                    &device,
                    &stream_config,
                    sink,
                    source_rate,
                    target_rate,
                    source_channels,
                    err_fn,
                ),
                cpal::SampleFormat::U16 => build_stream::<u16>(
                    &device,
                    &stream_config,
                    sink,
                    source_rate,
                    target_rate,
                    source_channels,
                    err_fn,
                ),
                format => Err(AudioError::StreamError(format!(
                    "unsupported sample format: {:?}",
                    format
                ))),
            };

            let stream = match stream_result {
                Ok(s) => s,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = ready_tx.send(Err(AudioError::StreamError(e.to_string())));
                return;
            }

            let _ = ready_tx.send(Ok(()));
            tracing::debug!("Audio capture thread started");

            // Park until told to stop; dropping the stream closes it
            let _ = stop_rx.recv();
            drop(stream);
            tracing::debug!("Audio capture thread stopped");
        });

        match ready_rx.await {
            Ok(Ok(())) => {
                self.stop_tx = Some(stop_tx);
                self.thread_handle = Some(thread_handle);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread_handle.join();
                Err(e)
            }
            Err(_) => Err(AudioError::StreamError(
                "capture thread exited before starting".to_string(),
            )),
        }
    }

    async fn stop(&mut self) -> Result<(), AudioError> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        Ok(())
    }
}

/// Build an input stream for a specific sample type
fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sink: FrameSink,
    source_rate: u32,
    target_rate: u32,
    source_channels: usize,
    err_fn: impl Fn(cpal::StreamError) + Send + 'static,
) -> Result<cpal::Stream, AudioError>
where
    T: cpal::Sample + cpal::SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    use cpal::traits::DeviceTrait;

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                // Convert to f32 and mix to mono
                let mono_f32: Vec<f32> = data
                    .chunks(source_channels)
                    .map(|frame| {
                        let sum: f32 = frame
                            .iter()
                            .map(|&s| <f32 as cpal::FromSample<T>>::from_sample_(s))
                            .sum();
                        sum / source_channels as f32
                    })
                    .collect();

                let block = if source_rate != target_rate {
                    resample(&mono_f32, source_rate, target_rate)
                } else {
                    mono_f32
                };

                sink(&block);
            },
            err_fn,
            None,
        )
        .map_err(|e| AudioError::StreamError(e.to_string()))?;

    Ok(stream)
}

/// Linear interpolation resampling
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let new_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(new_len);

    for i in 0..new_len {
        let src_idx = i as f64 / ratio;
        let idx = src_idx.floor() as usize;
        let frac = (src_idx - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else {
            samples.get(idx).copied().unwrap_or(0.0)
        };

        output.push(sample);
    }

    output
}
