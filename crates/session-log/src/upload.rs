//! MQTT upload with offline queuing
//!
//! Records are published at-least-once; while the broker is unreachable
//! they accumulate in a bounded queue and are flushed on reconnect. The
//! receiving side dedups by the record's logical key.

use crate::record::BlinkLogRecord;
use crate::LogError;
use rumqttc::{AsyncClient, Event, MqttOptions, QoS};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// MQTT broker host
    pub broker_url: String,
    /// MQTT port
    pub broker_port: u16,
    /// Viewer identity used in the client id and topic
    pub viewer_id: String,
    /// Topic prefix (`<prefix>/<viewer>/blinks`)
    pub topic_prefix: String,
    /// Maximum queued records while offline (oldest dropped beyond this)
    pub queue_limit: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            broker_url: "localhost".to_string(),
            broker_port: 1883,
            viewer_id: "unknown".to_string(),
            topic_prefix: "viewers".to_string(),
            queue_limit: 256,
        }
    }
}

/// Wire message for one blink record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlinkMessage {
    pub message_type: String,
    /// Idempotent logical key for receiver-side dedup
    pub dedup_key: String,
    pub record: BlinkLogRecord,
}

/// Blink record uploader.
pub struct CloudUploader {
    config: UploadConfig,
    client: Option<AsyncClient>,
    pending: Mutex<VecDeque<BlinkLogRecord>>,
}

impl CloudUploader {
    pub fn new(config: UploadConfig) -> Self {
        Self {
            config,
            client: None,
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Connect to the MQTT broker and start the event loop.
    pub async fn connect(&mut self) -> Result<(), LogError> {
        let mut options = MqttOptions::new(
            format!("viewer-{}", self.config.viewer_id),
            &self.config.broker_url,
            self.config.broker_port,
        );
        options.set_keep_alive(std::time::Duration::from_secs(30));

        let (client, mut eventloop) = AsyncClient::new(options, 10);

        // Spawn event loop handler
        tokio::spawn(async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(incoming)) => {
                        debug!("MQTT incoming: {:?}", incoming);
                    }
                    Err(e) => {
                        error!("MQTT error: {}", e);
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                    }
                    _ => {}
                }
            }
        });

        self.client = Some(client);
        info!("Connected to MQTT broker: {}", self.config.broker_url);
        Ok(())
    }

    /// Publish one record at-least-once. If no connection is up or the
    /// publish fails, the record is queued for a later flush; queuing is the
    /// intended degradation, not an error.
    pub async fn publish(&self, record: BlinkLogRecord) -> Result<(), LogError> {
        let Some(client) = self.client.as_ref() else {
            warn!("uploader offline, queuing blink record");
            self.enqueue(record);
            return Ok(());
        };

        match self.send(client, &record).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!("publish failed ({}), queuing blink record", e);
                self.enqueue(record);
                Ok(())
            }
        }
    }

    /// Push queued records out. Stops at the first failure, leaving the
    /// remainder queued. Returns how many were delivered.
    pub async fn flush_pending(&self) -> Result<usize, LogError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| LogError::Connection("not connected".to_string()))?;

        let mut delivered = 0;
        loop {
            let Some(record) = self.pop_pending() else {
                break;
            };
            if let Err(e) = self.send(client, &record).await {
                // Put it back at the front and retry on the next flush
                self.requeue_front(record);
                if delivered > 0 {
                    info!(delivered, "partial flush of queued blink records");
                }
                return Err(e);
            }
            delivered += 1;
        }

        if delivered > 0 {
            info!(delivered, "flushed queued blink records");
        }
        Ok(delivered)
    }

    /// Records waiting for delivery.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }

    async fn send(&self, client: &AsyncClient, record: &BlinkLogRecord) -> Result<(), LogError> {
        let message = BlinkMessage {
            message_type: "blink".to_string(),
            dedup_key: record.dedup_key(),
            record: record.clone(),
        };

        let payload =
            serde_json::to_vec(&message).map_err(|e| LogError::Serialization(e.to_string()))?;
        let topic = format!("{}/{}/blinks", self.config.topic_prefix, self.config.viewer_id);

        client
            .publish(&topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| LogError::Publish(e.to_string()))
    }

    fn enqueue(&self, record: BlinkLogRecord) {
        if let Ok(mut pending) = self.pending.lock() {
            while pending.len() >= self.config.queue_limit {
                warn!("upload queue full, dropping oldest record");
                pending.pop_front();
            }
            pending.push_back(record);
        }
    }

    fn pop_pending(&self) -> Option<BlinkLogRecord> {
        self.pending.lock().ok()?.pop_front()
    }

    fn requeue_front(&self, record: BlinkLogRecord) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push_front(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(count: u64) -> BlinkLogRecord {
        BlinkLogRecord::new("CalmLynx88", "Film", count, count as f64, Utc::now())
    }

    #[tokio::test]
    async fn test_offline_publish_queues() {
        let uploader = CloudUploader::new(UploadConfig::default());

        uploader.publish(record(1)).await.unwrap();
        uploader.publish(record(2)).await.unwrap();
        assert_eq!(uploader.pending_count(), 2);
    }

    #[tokio::test]
    async fn test_queue_is_bounded() {
        let uploader = CloudUploader::new(UploadConfig {
            queue_limit: 3,
            ..Default::default()
        });

        for i in 1..=5 {
            uploader.publish(record(i)).await.unwrap();
        }
        assert_eq!(uploader.pending_count(), 3);

        // Oldest dropped: 3, 4, 5 remain
        let front = uploader.pop_pending().unwrap();
        assert_eq!(front.blink_count, 3);
    }

    #[tokio::test]
    async fn test_flush_without_connection_fails() {
        let uploader = CloudUploader::new(UploadConfig::default());
        uploader.publish(record(1)).await.unwrap();

        let err = uploader.flush_pending().await.unwrap_err();
        assert!(matches!(err, LogError::Connection(_)));
        // Nothing lost
        assert_eq!(uploader.pending_count(), 1);
    }

    #[test]
    fn test_message_serializes_with_dedup_key() {
        let r = record(7);
        let message = BlinkMessage {
            message_type: "blink".to_string(),
            dedup_key: r.dedup_key(),
            record: r,
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"dedup_key\":\"CalmLynx88/Film/7\""));
    }
}
