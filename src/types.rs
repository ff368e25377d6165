use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// Lifecycle status of a single execution.
///
/// `Ready` and `Running` are transient; the other four are terminal and an
/// execution reaches exactly one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ready,
    Running,
    Succeeded,
    Failed,
    Error,
    Cancelled,
}

impl Status {
    /// All statuses, in lifecycle order.
    pub const ALL: [Status; 6] = [
        Status::Ready,
        Status::Running,
        Status::Succeeded,
        Status::Failed,
        Status::Error,
        Status::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Succeeded | Status::Failed | Status::Error | Status::Cancelled
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ready => "READY",
            Status::Running => "RUNNING",
            Status::Succeeded => "SUCCEEDED",
            Status::Failed => "FAILED",
            Status::Error => "ERROR",
            Status::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}

/// Unit attached to a [`Timeout`] value.
///
/// Kept next to the value so that timeout messages can echo back exactly what
/// the caller configured ("50 milliseconds", not "0.05s").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn nanos_per_unit(self) -> u128 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 60 * 60 * 1_000_000_000,
            TimeUnit::Days => 24 * 60 * 60 * 1_000_000_000,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TimeUnit::Nanoseconds => "nanoseconds",
            TimeUnit::Microseconds => "microseconds",
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A timeout as configured by the caller: a signed value plus its unit.
///
/// A value of zero or below means the deadline has already passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Timeout {
    pub value: i64,
    pub unit: TimeUnit,
}

impl Timeout {
    pub fn new(value: i64, unit: TimeUnit) -> Self {
        Self { value, unit }
    }

    pub fn millis(value: i64) -> Self {
        Self::new(value, TimeUnit::Milliseconds)
    }

    pub fn seconds(value: i64) -> Self {
        Self::new(value, TimeUnit::Seconds)
    }

    /// Convert to a `Duration`, or `None` if the timeout is already expired.
    pub fn as_duration(&self) -> Option<Duration> {
        if self.value <= 0 {
            return None;
        }
        let nanos = (self.value as u128).saturating_mul(self.unit.nanos_per_unit());
        let secs = nanos / 1_000_000_000;
        let subsec = (nanos % 1_000_000_000) as u32;
        Some(Duration::new(
            u64::try_from(secs).unwrap_or(u64::MAX),
            subsec,
        ))
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Parses strings like `50ms`, `3s`, `2m`, `1h`, `1d`, `250us`, `10ns`.
impl FromStr for Timeout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty timeout string".to_string());
        }

        let idx = s
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
            .map(|(i, _)| i)
            .ok_or_else(|| "timeout missing unit suffix".to_string())?;

        let (num_part, unit_part) = s.split_at(idx);
        let value: i64 = num_part
            .parse()
            .map_err(|e| format!("invalid timeout number '{}': {}", num_part, e))?;

        let unit = match unit_part.trim().to_lowercase().as_str() {
            "ns" => TimeUnit::Nanoseconds,
            "us" => TimeUnit::Microseconds,
            "ms" => TimeUnit::Milliseconds,
            "s" => TimeUnit::Seconds,
            "m" => TimeUnit::Minutes,
            "h" => TimeUnit::Hours,
            "d" => TimeUnit::Days,
            other => {
                return Err(format!(
                    "unsupported timeout unit '{}'; expected ns, us, ms, s, m, h, or d",
                    other
                ));
            }
        };

        Ok(Timeout::new(value, unit))
    }
}

impl TryFrom<String> for Timeout {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        let terminal: Vec<Status> = Status::ALL
            .into_iter()
            .filter(|s| s.is_terminal())
            .collect();
        assert_eq!(
            terminal,
            vec![
                Status::Succeeded,
                Status::Failed,
                Status::Error,
                Status::Cancelled
            ]
        );
    }

    #[test]
    fn timeout_display_uses_configured_unit() {
        assert_eq!(Timeout::millis(50).to_string(), "50 milliseconds");
        assert_eq!(Timeout::new(2, TimeUnit::Minutes).to_string(), "2 minutes");
    }

    #[test]
    fn non_positive_timeout_is_already_expired() {
        assert_eq!(Timeout::millis(0).as_duration(), None);
        assert_eq!(Timeout::millis(-5).as_duration(), None);
        assert_eq!(
            Timeout::millis(1500).as_duration(),
            Some(Duration::from_millis(1500))
        );
        assert_eq!(
            Timeout::new(1, TimeUnit::Days).as_duration(),
            Some(Duration::from_secs(86_400))
        );
    }

    #[test]
    fn parse_timeout_strings() {
        assert_eq!("50ms".parse::<Timeout>(), Ok(Timeout::millis(50)));
        assert_eq!(" 3s ".parse::<Timeout>(), Ok(Timeout::seconds(3)));
        assert_eq!(
            "-1ms".parse::<Timeout>(),
            Ok(Timeout::millis(-1))
        );
        assert!("10".parse::<Timeout>().is_err());
        assert!("10 fortnights".parse::<Timeout>().is_err());
        assert!("".parse::<Timeout>().is_err());
    }
}
