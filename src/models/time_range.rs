use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Time window a query or search type is scoped to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TimeRange {
    /// Fixed window between two instants
    Absolute {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    /// Window of the given length ending now; a zero length means all messages
    Relative { range_secs: u64 },
}

impl TimeRange {
    /// Create an absolute range
    pub fn absolute(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self::Absolute { from, to }
    }

    /// Create a relative range ending now
    pub fn relative(range_secs: u64) -> Self {
        Self::Relative { range_secs }
    }

    /// Range covering all messages ever ingested
    pub fn all_messages() -> Self {
        Self::Relative { range_secs: 0 }
    }

    /// Whether this range covers all messages
    pub fn is_all_messages(&self) -> bool {
        matches!(self, Self::Relative { range_secs: 0 })
    }

    /// Resolve to a concrete window against the given reference instant
    pub fn resolve(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            Self::Absolute { from, to } => (*from, *to),
            Self::Relative { range_secs: 0 } => (DateTime::<Utc>::UNIX_EPOCH, now),
            Self::Relative { range_secs } => (now - Duration::seconds(*range_secs as i64), now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_resolve_absolute() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let range = TimeRange::absolute(from, to);

        let now = Utc::now();
        assert_eq!(range.resolve(now), (from, to));
    }

    #[test]
    fn test_resolve_relative() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let range = TimeRange::relative(300);

        let (from, to) = range.resolve(now);
        assert_eq!(to, now);
        assert_eq!(from, now - Duration::seconds(300));
    }

    #[test]
    fn test_resolve_all_messages() {
        let now = Utc::now();
        let range = TimeRange::all_messages();

        assert!(range.is_all_messages());
        let (from, to) = range.resolve(now);
        assert_eq!(from, DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(to, now);
    }
}
