//! Metrics sink
//!
//! Events are pushed onto a bounded channel and written to an InfluxDB v2
//! bucket in line protocol by a single drain task. The send path never
//! blocks: when the channel is full the event is dropped. When the metrics
//! config is incomplete the sink is a no-op.

use chrono::Utc;
use reqwest::Client;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::MetricsConfig;

const CHANNEL_CAPACITY: usize = 1024;
const BATCH_SIZE: usize = 100;
const FLUSH_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);
const MEASUREMENT: &str = "bot_event";

/// A single metric field value.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

#[derive(Debug)]
struct Event {
    name: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    unixtime: i64,
}

impl Event {
    fn to_line(&self) -> String {
        let mut line = String::from(MEASUREMENT);
        line.push_str(",event=");
        line.push_str(&escape_tag(&self.name));

        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape_tag(key));
            line.push('=');
            line.push_str(&escape_tag(value));
        }

        line.push(' ');
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_tag(key));
            line.push('=');
            line.push_str(&render_field(value));
        }

        line.push(' ');
        line.push_str(&self.unixtime.to_string());
        line
    }
}

fn escape_tag(value: &str) -> String {
    value.replace('\\', "\\\\").replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

fn render_field(value: &FieldValue) -> String {
    match value {
        FieldValue::Int(v) => format!("{v}i"),
        FieldValue::Float(v) => v.to_string(),
        FieldValue::Bool(v) => v.to_string(),
        FieldValue::Str(v) => format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\"")),
    }
}

/// Handle used by the rest of the application to record events.
#[derive(Clone)]
pub struct MetricsSink {
    tx: Option<mpsc::Sender<Event>>,
}

impl MetricsSink {
    /// Build the real sink and its drain task.
    pub fn influx(config: &MetricsConfig, client: Client) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let handle = tokio::spawn(drain(rx, client, config.clone()));
        (Self { tx: Some(tx) }, handle)
    }

    /// A sink that discards every event.
    pub fn noop() -> Self {
        Self { tx: None }
    }

    /// Record an event. Non-blocking; drops the event when the sink is
    /// saturated or disabled.
    pub fn log_event(&self, name: &str, tags: &[(&str, &str)], fields: &[(&str, FieldValue)]) {
        let Some(ref tx) = self.tx else { return };
        if fields.is_empty() {
            return;
        }

        let event = Event {
            name: name.to_string(),
            tags: tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            unixtime: Utc::now().timestamp(),
        };

        if tx.try_send(event).is_err() {
            debug!(event = name, "Metrics channel saturated, event dropped");
        }
    }

    /// Record an event tagged with the chat it happened in.
    pub fn log_chat_event(&self, name: &str, chat_id: i64, fields: &[(&str, FieldValue)]) {
        if chat_id == 0 {
            return;
        }

        let chat_tag = chat_id.to_string();
        self.log_event(name, &[("chat_id", chat_tag.as_str())], fields);
    }
}

async fn drain(mut rx: mpsc::Receiver<Event>, client: Client, config: MetricsConfig) {
    let url = format!(
        "{}/api/v2/write?org={}&bucket={}&precision=s",
        config.url.trim_end_matches('/'),
        config.org,
        config.bucket
    );

    let mut lines: Vec<String> = Vec::new();

    loop {
        match tokio::time::timeout(FLUSH_INTERVAL, rx.recv()).await {
            Ok(Some(event)) => {
                lines.push(event.to_line());
                if lines.len() >= BATCH_SIZE {
                    flush(&client, &url, &config.token, &mut lines).await;
                }
            }
            Ok(None) => {
                flush(&client, &url, &config.token, &mut lines).await;
                break;
            }
            Err(_) => flush(&client, &url, &config.token, &mut lines).await,
        }
    }
}

async fn flush(client: &Client, url: &str, token: &str, lines: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }

    let body = lines.join("\n");
    lines.clear();

    let result = client
        .post(url)
        .header("Authorization", format!("Token {token}"))
        .header("Content-Type", "text/plain; charset=utf-8")
        .body(body)
        .send()
        .await;

    match result {
        Ok(response) if !response.status().is_success() => {
            warn!(status = %response.status(), "Metrics write rejected");
        }
        Ok(_) => {}
        Err(err) => warn!(error = %err, "Metrics write failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_protocol_rendering() {
        let event = Event {
            name: "captcha_solved".to_string(),
            tags: vec![("chat_id".to_string(), "-1001".to_string())],
            fields: vec![
                ("user_id".to_string(), FieldValue::Int(222)),
                ("note".to_string(), FieldValue::Str("ok".to_string())),
            ],
            unixtime: 1_700_000_000,
        };

        assert_eq!(
            event.to_line(),
            "bot_event,event=captcha_solved,chat_id=-1001 user_id=222i,note=\"ok\" 1700000000"
        );
    }

    #[test]
    fn test_tag_escaping() {
        assert_eq!(escape_tag("a b"), "a\\ b");
        assert_eq!(escape_tag("a,b=c"), "a\\,b\\=c");
    }

    #[test]
    fn test_noop_sink_drops_silently() {
        let sink = MetricsSink::noop();
        sink.log_event("server_started", &[], &[("port", FieldValue::Int(8080))]);
        sink.log_chat_event("captcha_failed", -1001, &[("user_id", FieldValue::Int(1))]);
    }

    #[test]
    fn test_zero_chat_id_is_skipped() {
        let sink = MetricsSink::noop();
        sink.log_chat_event("captcha_failed", 0, &[("user_id", FieldValue::Int(1))]);
    }
}
