use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

use crate::instance::ServiceStatus;

pub const TOPIC_NOT_RUNNING: &str = "The Minecraft server is not currently running.";
pub const TOPIC_NO_PLAYERS: &str = "No players currently online.";

/// Display surface accepting one short status line.
#[async_trait]
pub trait TopicSink: Send + Sync {
    async fn set_topic(&self, text: &str) -> anyhow::Result<()>;
}

/// Discord-style channel endpoint: PATCH the channel object with a new
/// topic string.
pub struct ChannelTopicSink {
    http: reqwest::Client,
    api_base: String,
    channel_id: u64,
    token: String,
}

impl ChannelTopicSink {
    pub fn new(api_base: String, channel_id: u64, token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base,
            channel_id,
            token,
        }
    }
}

#[async_trait]
impl TopicSink for ChannelTopicSink {
    async fn set_topic(&self, text: &str) -> anyhow::Result<()> {
        let url = format!("{}/channels/{}", self.api_base, self.channel_id);
        self.http
            .patch(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .json(&serde_json::json!({ "topic": text }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Renders the unified status as the one-line topic. Player names are
/// sorted so logically equal statuses always render to the same string.
pub fn render(status: &ServiceStatus) -> String {
    match status {
        ServiceStatus::Unknown | ServiceStatus::Unreachable => TOPIC_NOT_RUNNING.to_string(),
        ServiceStatus::Online(players) if players.is_empty() => TOPIC_NO_PLAYERS.to_string(),
        ServiceStatus::Online(players) => {
            let mut names = players.clone();
            names.sort();
            format!("Players online: {}", names.join(", "))
        }
    }
}

/// Pushes rendered statuses to the sink, skipping writes whose text equals
/// the last one that actually went through. A failed write leaves the
/// recorded text untouched so the next cycle retries.
pub struct StatusPublisher {
    sink: Arc<dyn TopicSink>,
    last: Option<String>,
}

impl StatusPublisher {
    pub fn new(sink: Arc<dyn TopicSink>) -> Self {
        Self { sink, last: None }
    }

    pub async fn publish(&mut self, status: &ServiceStatus) {
        let text = render(status);
        if self.last.as_deref() == Some(text.as_str()) {
            debug!("topic unchanged, skipping write");
            return;
        }
        match self.sink.set_topic(&text).await {
            Ok(()) => self.last = Some(text),
            Err(err) => warn!("failed to update topic: {:#}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct RecordingSink {
        writes: Mutex<Vec<String>>,
        fail_first: AtomicUsize,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                writes: Mutex::new(Vec::new()),
                fail_first: AtomicUsize::new(0),
            })
        }

        fn failing_once() -> Arc<Self> {
            let sink = Self::new();
            sink.fail_first.store(1, Ordering::Relaxed);
            sink
        }

        fn writes(&self) -> Vec<String> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TopicSink for RecordingSink {
        async fn set_topic(&self, text: &str) -> anyhow::Result<()> {
            if self.fail_first.load(Ordering::Relaxed) > 0 {
                self.fail_first.fetch_sub(1, Ordering::Relaxed);
                anyhow::bail!("display surface rejected the write");
            }
            self.writes.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn equal_statuses_produce_one_write() {
        let sink = RecordingSink::new();
        let mut publisher = StatusPublisher::new(sink.clone());

        let status = ServiceStatus::Online(vec!["alpha".to_string()]);
        publisher.publish(&status).await;
        publisher.publish(&status).await;

        assert_eq!(sink.writes(), vec!["Players online: alpha".to_string()]);
    }

    #[tokio::test]
    async fn player_order_does_not_defeat_the_guard() {
        let sink = RecordingSink::new();
        let mut publisher = StatusPublisher::new(sink.clone());

        publisher
            .publish(&ServiceStatus::Online(vec![
                "bravo".to_string(),
                "alpha".to_string(),
            ]))
            .await;
        publisher
            .publish(&ServiceStatus::Online(vec![
                "alpha".to_string(),
                "bravo".to_string(),
            ]))
            .await;

        assert_eq!(sink.writes(), vec!["Players online: alpha, bravo".to_string()]);
    }

    #[tokio::test]
    async fn failed_write_is_retried_next_cycle() {
        let sink = RecordingSink::failing_once();
        let mut publisher = StatusPublisher::new(sink.clone());

        let status = ServiceStatus::Online(vec![]);
        publisher.publish(&status).await;
        assert!(sink.writes().is_empty());

        publisher.publish(&status).await;
        assert_eq!(sink.writes(), vec![TOPIC_NO_PLAYERS.to_string()]);
    }

    #[test]
    fn renders_the_three_shapes() {
        assert_eq!(render(&ServiceStatus::Unknown), TOPIC_NOT_RUNNING);
        assert_eq!(render(&ServiceStatus::Unreachable), TOPIC_NOT_RUNNING);
        assert_eq!(render(&ServiceStatus::Online(vec![])), TOPIC_NO_PLAYERS);
        assert_eq!(
            render(&ServiceStatus::Online(vec![
                "charlie".to_string(),
                "alpha".to_string()
            ])),
            "Players online: alpha, charlie"
        );
    }
}
