use chrono::{DateTime, TimeZone, Utc};

use crate::common::errors::ConfigError;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// The age boundary for one run.
///
/// Held at millisecond precision so fractional ages (`0.04167` days is about
/// an hour) are not rounded to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    millis: i64,
}

impl Cutoff {
    /// `now - age_days * 86400s`
    pub fn from_age_days(now: DateTime<Utc>, age_days: f64) -> Result<Self, ConfigError> {
        if !age_days.is_finite() || age_days < 0.0 {
            return Err(ConfigError::InvalidAge { age: age_days });
        }
        let age_millis = (age_days * MILLIS_PER_DAY).round();
        if age_millis > i64::MAX as f64 {
            return Err(ConfigError::InvalidAge { age: age_days });
        }
        Ok(Self {
            millis: now.timestamp_millis().saturating_sub(age_millis as i64),
        })
    }

    /// Cutoff at an exact epoch second
    pub fn at_timestamp(secs: i64) -> Self {
        Self {
            millis: secs.saturating_mul(1000),
        }
    }

    /// Strictly older than the cutoff. An entry exactly at the cutoff is kept.
    pub fn is_expired(&self, modified: u64) -> bool {
        let modified_millis = i64::try_from(modified)
            .map(|secs| secs.saturating_mul(1000))
            .unwrap_or(i64::MAX);
        modified_millis < self.millis
    }

    pub fn timestamp_millis(&self) -> i64 {
        self.millis
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.millis).single()
    }
}
