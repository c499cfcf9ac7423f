//! Viewer attention monitor
//!
//! Wires the full pipeline end to end: frame source → lighting
//! normalization → landmark inference → detection session → sample history,
//! with blink events fanned out to the durable log and the cloud uploader.
//! Without a camera device or model configured it runs on the synthetic
//! source and synthetic landmarks, which keeps the whole loop exercisable
//! anywhere.

use anyhow::Context;
use attention_core::{
    AttentionConfig, AttentionEvent, AttentionSample, DetectionSession, FaceLandmarker, FrameInput,
};
use attention_metrics::StatisticalSummary;
use chrono::Utc;
use frame_capture::{
    CaptureConfig, CaptureError, FrameSource, LightingNormalizer, SyntheticCamera,
};
use landmark_infer::{FaceMeshConfig, FaceMeshDetector};
use ring_buffer::RingBuffer;
use serde::Deserialize;
use session_log::{
    clean_session_label, get_or_create_alias, BlinkLogRecord, CloudUploader, LogStore,
    UploadConfig,
};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// MQTT upload settings
#[derive(Debug, Clone, Deserialize)]
pub struct MqttSettings {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

/// Monitor settings, loadable from `monitor.toml` and `MONITOR_*` env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: u32,
    /// Path of the media being watched; cleaned into the session label
    pub media_path: String,
    /// Directory for the CSV log and viewer config
    pub log_dir: String,
    /// Optional face mesh ONNX model
    #[serde(default)]
    pub model_path: Option<String>,
    pub mqtt: MqttSettings,
}

/// Initialize tracing with `RUST_LOG` filtering (default `info`).
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Load settings from `monitor.toml` (optional) and the environment.
pub fn load_settings() -> Result<MonitorSettings, config::ConfigError> {
    config::Config::builder()
        .set_default("frame_width", 640)?
        .set_default("frame_height", 480)?
        .set_default("fps", 16)?
        .set_default("media_path", "")?
        .set_default("log_dir", "logs")?
        .set_default("mqtt.enabled", false)?
        .set_default("mqtt.host", "localhost")?
        .set_default("mqtt.port", 1883)?
        .add_source(config::File::with_name("monitor").required(false))
        .add_source(config::Environment::with_prefix("MONITOR").separator("__"))
        .build()?
        .try_deserialize()
}

/// Run the monitor loop until ctrl-c or end of stream.
pub async fn run(settings: MonitorSettings) -> anyhow::Result<()> {
    let log_dir = Path::new(&settings.log_dir);
    let alias = get_or_create_alias(&log_dir.join("viewer.json"))
        .context("loading viewer alias")?;
    let label = clean_session_label(&settings.media_path);
    info!(viewer = %alias, session = %label, "starting capture session");

    let store =
        LogStore::with_csv(log_dir.join("blink_log.csv")).context("opening blink log")?;

    let mut uploader = CloudUploader::new(UploadConfig {
        broker_url: settings.mqtt.host.clone(),
        broker_port: settings.mqtt.port,
        viewer_id: alias.clone(),
        ..Default::default()
    });
    if settings.mqtt.enabled {
        if let Err(e) = uploader.connect().await {
            // Records queue locally until the broker comes back
            warn!("MQTT connect failed: {}", e);
        }
    }

    let mut source = SyntheticCamera::new(CaptureConfig {
        device: "synthetic".to_string(),
        width: settings.frame_width,
        height: settings.frame_height,
        fps: settings.fps,
    });
    let normalizer = LightingNormalizer::default();
    let mut landmarker = FaceMeshDetector::new(FaceMeshConfig {
        model_path: settings.model_path.clone(),
        ..Default::default()
    })
    .context("creating landmark detector")?;
    let mut session = DetectionSession::new(AttentionConfig::default())?;
    let mut history: RingBuffer<AttentionSample> = RingBuffer::with_default_capacity();

    let started = Instant::now();
    let mut ticker =
        tokio::time::interval(Duration::from_millis(1000 / settings.fps.max(1) as u64));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                break;
            }
            _ = ticker.tick() => {
                let frame = match source.next_frame() {
                    Ok(frame) => frame,
                    Err(CaptureError::EndOfStream) => break,
                    // Any other capture failure is fatal to the session
                    Err(e) => return Err(e.into()),
                };

                let prepared = normalizer.normalize(&frame);
                let landmarks = landmarker.detect(&prepared.enhanced);
                let input = FrameInput {
                    landmarks,
                    width: frame.width,
                    height: frame.height,
                    brightness: prepared.brightness,
                };

                let now = started.elapsed().as_secs_f64();
                let result = session.process_frame(&input, now);

                for event in &result.events {
                    if let AttentionEvent::BlinkDetected { blink_total, .. } = event {
                        let record = BlinkLogRecord::new(
                            alias.clone(),
                            label.clone(),
                            *blink_total,
                            now,
                            Utc::now(),
                        );
                        store.append(record.clone()).context("appending blink record")?;
                        if settings.mqtt.enabled {
                            uploader.publish(record).await?;
                        }
                    }
                }

                history.push(result.sample);
            }
        }
    }

    if settings.mqtt.enabled && uploader.pending_count() > 0 {
        if let Err(e) = uploader.flush_pending().await {
            warn!(
                pending = uploader.pending_count(),
                "could not flush queued uploads: {}", e
            );
        }
    }

    let summary = StatisticalSummary::compute(&session.metrics().closure_durations());
    info!(
        blinks = session.blink_total(),
        samples = history.total_written(),
        mean_closure_ms = summary.mean,
        longest_distraction_s = session.metrics().longest_distraction_s(),
        "session summary"
    );

    Ok(())
}
