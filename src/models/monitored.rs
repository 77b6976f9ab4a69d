use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a monitored item.
///
/// `pending -> monitoring -> {found | failed}`; `failed` may be promoted to
/// `blacklisted` by the monitoring scheduler, and `blacklisted -> pending` is
/// a manual reset only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorStatus {
    #[default]
    Pending,
    Monitoring,
    Found,
    Failed,
    Blacklisted,
}

impl MonitorStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Monitoring => "monitoring",
            Self::Found => "found",
            Self::Failed => "failed",
            Self::Blacklisted => "blacklisted",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "monitoring" => Self::Monitoring,
            "found" => Self::Found,
            "failed" => Self::Failed,
            "blacklisted" => Self::Blacklisted,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for MonitorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A media path waiting for wanted-language subtitles to appear.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitoredItem {
    #[serde(default)]
    pub id: String,
    pub media_id: String,
    pub path: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub last_checked: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: MonitorStatus,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MonitoredItem {
    pub fn validate(&self) -> Result<(), crate::storage::StoreError> {
        if self.media_id.is_empty() {
            return Err(crate::storage::StoreError::Validation(
                "monitored item requires a media_id".into(),
            ));
        }
        if self.path.is_empty() {
            return Err(crate::storage::StoreError::Validation(
                "monitored item requires a path".into(),
            ));
        }
        Ok(())
    }

    /// Applies one check cycle: success marks the item found, a miss bumps
    /// the retry counter and fails the item once retries are exhausted.
    pub fn record_check(&mut self, found: bool) {
        self.last_checked = Some(Utc::now());
        if found {
            self.status = MonitorStatus::Found;
            return;
        }
        self.retry_count += 1;
        if self.retry_count >= self.max_retries.max(1) {
            self.status = MonitorStatus::Failed;
        } else {
            self.status = MonitorStatus::Monitoring;
        }
    }

    /// Manual `blacklisted -> pending` reset; also zeroes the retry counter.
    pub fn reset(&mut self) {
        self.status = MonitorStatus::Pending;
        self.retry_count = 0;
        self.updated_at = Some(Utc::now());
    }

    /// Creation time supplied by the caller, else now.
    #[must_use]
    pub fn created_at_or_now(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or_else(Utc::now)
    }

    /// Whether this item is due for another provider check.
    #[must_use]
    pub fn due_for_check(&self, interval: chrono::Duration, now: DateTime<Utc>) -> bool {
        match self.last_checked {
            None => true,
            Some(checked) => checked < now - interval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(max_retries: u32) -> MonitoredItem {
        MonitoredItem {
            media_id: "1".into(),
            path: "/library/movie.mkv".into(),
            languages: vec!["en".into()],
            max_retries,
            ..Default::default()
        }
    }

    #[test]
    fn found_wins_immediately() {
        let mut it = item(3);
        it.record_check(true);
        assert_eq!(it.status, MonitorStatus::Found);
        assert_eq!(it.retry_count, 0);
    }

    #[test]
    fn misses_accumulate_then_fail() {
        let mut it = item(3);
        it.record_check(false);
        assert_eq!(it.status, MonitorStatus::Monitoring);
        it.record_check(false);
        assert_eq!(it.status, MonitorStatus::Monitoring);
        it.record_check(false);
        assert_eq!(it.status, MonitorStatus::Failed);
        assert_eq!(it.retry_count, 3);
    }

    #[test]
    fn reset_returns_to_pending_and_zeroes_retries() {
        let mut it = item(1);
        it.record_check(false);
        it.status = MonitorStatus::Blacklisted;
        it.reset();
        assert_eq!(it.status, MonitorStatus::Pending);
        assert_eq!(it.retry_count, 0);
    }

    #[test]
    fn due_when_never_checked_or_stale() {
        let now = Utc::now();
        let mut it = item(1);
        assert!(it.due_for_check(chrono::Duration::hours(1), now));

        it.last_checked = Some(now - chrono::Duration::minutes(30));
        assert!(!it.due_for_check(chrono::Duration::hours(1), now));

        it.last_checked = Some(now - chrono::Duration::hours(2));
        assert!(it.due_for_check(chrono::Duration::hours(1), now));
    }
}
