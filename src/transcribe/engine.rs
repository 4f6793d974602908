//! External engine invocation pipeline
//!
//! One session's worth of audio goes through four steps: f32 → 16-bit PCM
//! conversion, a WAV transport file, a timed child-process engine run, and
//! stdout cleanup. The transport file is a NamedTempFile so it is deleted
//! on every exit path, including engine failure and timeout. The engine is
//! spawned with kill_on_drop so a timed-out invocation cannot linger.
//!
//! Runs on a worker task only; the hook and audio threads never touch this.

use super::Transcriber;
use crate::config::{expand_tilde, EngineConfig};
use crate::error::TranscribeError;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Transcriber that shells out to a whisper-cli compatible binary
pub struct EngineTranscriber {
    engine_path: PathBuf,
    model_path: PathBuf,
    timeout: Duration,
}

impl EngineTranscriber {
    pub fn new(config: &EngineConfig) -> Result<Self, TranscribeError> {
        let engine_path = resolve_engine_path(config.path.as_deref())?;
        let model_path = expand_tilde(&config.model);

        if !model_path.exists() {
            tracing::warn!(
                "Model file {:?} not found; the engine will fail until it is downloaded",
                model_path
            );
        }

        tracing::info!(
            "Engine: {:?} with model {:?} (timeout {}s)",
            engine_path,
            model_path,
            config.timeout_secs
        );

        Ok(Self {
            engine_path,
            model_path,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait::async_trait]
impl Transcriber for EngineTranscriber {
    async fn transcribe(&self, samples: &[f32]) -> Result<String, TranscribeError> {
        if samples.is_empty() {
            return Err(TranscribeError::NoAudioCaptured);
        }

        let duration_secs = samples.len() as f32 / 16000.0;
        tracing::debug!(
            "Transcribing {:.2}s of audio ({} samples)",
            duration_secs,
            samples.len()
        );
        let start = std::time::Instant::now();

        // Dropped on every return path below, deleting the file
        let transport = write_transport_wav(samples)?;

        let child = Command::new(&self.engine_path)
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(transport.path())
            .arg("-nt")
            .arg("-np")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TranscribeError::EngineFailed(format!("failed to launch: {}", e)))?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TranscribeError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| TranscribeError::EngineFailed(format!("wait failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TranscribeError::EngineFailed(format!(
                "exit {:?}: {}",
                output.status.code(),
                stderr.trim().chars().take(200).collect::<String>()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = clean_transcript(&stdout);

        if text.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.trim().is_empty() {
                tracing::debug!("Engine stderr: {}", stderr.trim());
            }
            return Err(TranscribeError::NoSpeechDetected);
        }

        tracing::info!(
            "Transcribed {:.1}s of audio in {:.2}s",
            duration_secs,
            start.elapsed().as_secs_f32()
        );
        Ok(text)
    }
}

/// Scale and clamp a float sample into 16-bit signed PCM
///
/// Out-of-range input is clamped, not rejected: [-1.0, 1.0] maps onto
/// [-32768, 32767].
pub fn pcm16_from_f32(sample: f32) -> i16 {
    let scaled = (f64::from(sample.clamp(-1.0, 1.0)) * 32768.0) as i32;
    scaled.clamp(-32768, 32767) as i16
}

/// Write samples into a fresh WAV transport file (mono, 16kHz, 16-bit)
fn write_transport_wav(samples: &[f32]) -> Result<tempfile::NamedTempFile, TranscribeError> {
    let transport = tempfile::Builder::new()
        .prefix("scribekey_")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| TranscribeError::Io(format!("failed to create transport file: {}", e)))?;

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(transport.path(), spec)
        .map_err(|e| TranscribeError::Io(format!("failed to create WAV writer: {}", e)))?;

    for &sample in samples {
        writer
            .write_sample(pcm16_from_f32(sample))
            .map_err(|e| TranscribeError::Io(format!("failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| TranscribeError::Io(format!("failed to finalize WAV: {}", e)))?;

    Ok(transport)
}

/// Clean raw engine stdout into the final transcript
///
/// Splits into lines, trims whitespace, drops empties, rejoins with
/// newlines.
pub fn clean_transcript(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Resolve the engine binary path from config, PATH, or common locations
fn resolve_engine_path(configured: Option<&str>) -> Result<PathBuf, TranscribeError> {
    if let Some(path) = configured {
        let expanded = expand_tilde(path);
        if expanded.exists() {
            return Ok(expanded);
        }
        return Err(TranscribeError::EngineNotFound(path.to_string()));
    }

    let candidates = [
        which::which("whisper-cli").ok(),
        which::which("whisper").ok(),
        Some(PathBuf::from("/usr/local/bin/whisper-cli")),
        Some(PathBuf::from("/usr/bin/whisper-cli")),
        directories::BaseDirs::new().map(|d| d.home_dir().join(".local/bin/whisper-cli")),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(TranscribeError::EngineNotFound(
        "whisper-cli (searched PATH and common install locations)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_conversion_is_byte_exact() {
        assert_eq!(pcm16_from_f32(-1.0), -32768);
        assert_eq!(pcm16_from_f32(0.0), 0);
        assert_eq!(pcm16_from_f32(1.0), 32767);
    }

    #[test]
    fn test_pcm_conversion_clamps_out_of_range() {
        assert_eq!(pcm16_from_f32(-2.5), -32768);
        assert_eq!(pcm16_from_f32(3.0), 32767);
    }

    #[test]
    fn test_clean_transcript() {
        assert_eq!(clean_transcript("  hello world  \n\n  \n"), "hello world");
        assert_eq!(clean_transcript(""), "");
        assert_eq!(clean_transcript("  \n \t \n"), "");
        assert_eq!(
            clean_transcript(" line one \n\n line two \n"),
            "line one\nline two"
        );
    }

    #[test]
    fn test_transport_wav_contents_and_cleanup() {
        let transport = write_transport_wav(&[-1.0, 0.0, 1.0]).unwrap();
        let path = transport.path().to_path_buf();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![-32768, 0, 32767]);

        drop(transport);
        assert!(!path.exists());
    }

    #[test]
    fn test_resolve_configured_engine_missing() {
        let result = resolve_engine_path(Some("/nonexistent/whisper-cli"));
        assert!(matches!(result, Err(TranscribeError::EngineNotFound(_))));
    }

    #[cfg(unix)]
    fn fake_engine(dir: &std::path::Path, script_body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-engine");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", script_body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    fn transcriber_for(engine: PathBuf, timeout_secs: u64) -> EngineTranscriber {
        EngineTranscriber {
            engine_path: engine,
            model_path: PathBuf::from("/nonexistent/model.bin"),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_engine_stdout_is_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), "echo '  hello world  '; echo; echo '   '");
        let transcriber = transcriber_for(engine, 5);

        let text = transcriber.transcribe(&[0.0; 1600]).await.unwrap();
        assert_eq!(text, "hello world");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_engine_output_is_no_speech() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), "exit 0");
        let transcriber = transcriber_for(engine, 5);

        let result = transcriber.transcribe(&[0.0; 1600]).await;
        assert!(matches!(result, Err(TranscribeError::NoSpeechDetected)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_engine_failure() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), "echo 'boom' >&2; exit 3");
        let transcriber = transcriber_for(engine, 5);

        match transcriber.transcribe(&[0.0; 1600]).await {
            Err(TranscribeError::EngineFailed(msg)) => assert!(msg.contains("boom")),
            other => panic!("expected engine failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hung_engine_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let engine = fake_engine(dir.path(), "sleep 30");
        let transcriber = transcriber_for(engine, 1);

        let result = transcriber.transcribe(&[0.0; 1600]).await;
        assert!(matches!(result, Err(TranscribeError::Timeout(1))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_failure_is_engine_failure() {
        let transcriber = transcriber_for(PathBuf::from("/nonexistent/engine"), 5);
        let result = transcriber.transcribe(&[0.0; 1600]).await;
        assert!(matches!(result, Err(TranscribeError::EngineFailed(_))));
    }

    #[tokio::test]
    async fn test_empty_samples_rejected_before_engine_runs() {
        let transcriber = EngineTranscriber {
            engine_path: PathBuf::from("/nonexistent/engine"),
            model_path: PathBuf::from("/nonexistent/model.bin"),
            timeout: Duration::from_secs(1),
        };
        let result = transcriber.transcribe(&[]).await;
        assert!(matches!(result, Err(TranscribeError::NoAudioCaptured)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_transport_file_removed_after_failure() {
        // The engine records the transport path it was given; after the
        // failed run the file must be gone.
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("transport_path");
        let engine = fake_engine(
            dir.path(),
            &format!("echo \"$4\" > {}; exit 1", marker.display()),
        );
        let transcriber = transcriber_for(engine, 5);

        let result = transcriber.transcribe(&[0.5; 1600]).await;
        assert!(result.is_err());

        let recorded = std::fs::read_to_string(&marker).unwrap();
        let transport_path = PathBuf::from(recorded.trim());
        assert!(!transport_path.as_os_str().is_empty());
        assert!(!transport_path.exists());
    }
}
