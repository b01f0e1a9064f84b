use std::time::Duration;

/// Default ceiling on records decoded per session.
pub const DEFAULT_MAX_RECORDS: usize = 256;

/// Default sleep between decode attempts while the transport is idle.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for an ingestion session.
///
/// ```text
/// ┌───────────────┬────────────────────────────────────────────────────┐
/// │ Field         │ Purpose                                            │
/// ├───────────────┼────────────────────────────────────────────────────┤
/// │ max_records   │ Stop once more than this many records are decoded  │
/// │ poll_interval │ Backoff when fewer than a frame's bytes are queued │
/// │ max_text_len  │ Optional cap on definition/debug text length       │
/// └───────────────┴────────────────────────────────────────────────────┘
/// ```
///
/// The record ceiling bounds how much a session produces; it never
/// truncates the log. The loop stops after the record that takes the
/// count past `max_records`, so a session that hits the ceiling holds
/// `max_records + 1` records.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestConfig {
    pub max_records: usize,
    pub poll_interval: Duration,
    /// `None` keeps the protocol's unbounded text semantics.
    pub max_text_len: Option<usize>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_text_len: None,
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    #[must_use]
    pub fn with_max_text_len(mut self, max_text_len: Option<usize>) -> Self {
        self.max_text_len = max_text_len;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tracer() {
        let config = IngestConfig::default();
        assert_eq!(config.max_records, 256);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.max_text_len, None);
    }

    #[test]
    fn builders_override() {
        let config = IngestConfig::default()
            .with_max_records(3)
            .with_poll_interval(Duration::ZERO)
            .with_max_text_len(Some(80));
        assert_eq!(config.max_records, 3);
        assert_eq!(config.poll_interval, Duration::ZERO);
        assert_eq!(config.max_text_len, Some(80));
    }
}
