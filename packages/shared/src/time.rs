//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Get the current time as an RFC 3339 UTC string with millisecond precision
    fn now_rfc3339(&self) -> String;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_rfc3339(&self) -> String {
        utc_timestamp_rfc3339()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given Unix timestamp (milliseconds)
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_rfc3339(&self) -> String {
        timestamp_to_rfc3339(self.fixed_time)
    }
}

/// Get the current UTC time in RFC 3339 format (e.g. `2023-01-01T00:00:00.000Z`)
pub fn utc_timestamp_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert Unix timestamp (milliseconds) to UTC RFC 3339 format
///
/// Out-of-range timestamps are clamped to the Unix epoch.
pub fn timestamp_to_rfc3339(timestamp_millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a wire timestamp for display as `YYYY-MM-DD HH:MM:SS`.
///
/// Accepts RFC 3339 (what this client sends) and offset-less local
/// date-times (what the chat server sends). Returns `None` for anything else.
pub fn display_timestamp(timestamp: &str) -> Option<String> {
    const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    if let Ok(dt) = DateTime::parse_from_rfc3339(timestamp) {
        return Some(dt.format(DISPLAY_FORMAT).to_string());
    }
    NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.format(DISPLAY_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_returns_utc_timestamp() {
        // テスト項目: SystemClock が UTC の RFC 3339 文字列を返す
        // given (前提条件):
        let clock = SystemClock;

        // when (操作):
        let timestamp = clock.now_rfc3339();

        // then (期待する結果):
        assert!(timestamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&timestamp).is_ok());
    }

    #[test]
    fn test_fixed_clock_returns_fixed_timestamp() {
        // テスト項目: FixedClock が何度呼び出しても同じタイムスタンプを返す
        // given (前提条件):
        let clock = FixedClock::new(1672531200000);

        // when (操作):
        let timestamp1 = clock.now_rfc3339();
        let timestamp2 = clock.now_rfc3339();

        // then (期待する結果):
        assert_eq!(timestamp1, "2023-01-01T00:00:00.000Z");
        assert_eq!(timestamp1, timestamp2);
    }

    #[test]
    fn test_timestamp_to_rfc3339_with_milliseconds() {
        // テスト項目: ミリ秒を含むタイムスタンプが正しく変換される
        // given (前提条件):
        let timestamp = 1672531200123;

        // when (操作):
        let result = timestamp_to_rfc3339(timestamp);

        // then (期待する結果):
        assert_eq!(result, "2023-01-01T00:00:00.123Z");
    }

    #[test]
    fn test_display_timestamp_accepts_rfc3339() {
        // テスト項目: RFC 3339 形式のタイムスタンプが表示用に整形される
        // given (前提条件):
        let timestamp = "2023-01-01T09:30:15.000Z";

        // when (操作):
        let result = display_timestamp(timestamp);

        // then (期待する結果):
        assert_eq!(result.as_deref(), Some("2023-01-01 09:30:15"));
    }

    #[test]
    fn test_display_timestamp_accepts_local_datetime() {
        // テスト項目: オフセットなしのローカル日時も表示用に整形される
        // given (前提条件):
        let timestamp = "2023-01-01T09:30:15.123456";

        // when (操作):
        let result = display_timestamp(timestamp);

        // then (期待する結果):
        assert_eq!(result.as_deref(), Some("2023-01-01 09:30:15"));
    }

    #[test]
    fn test_display_timestamp_rejects_garbage() {
        // テスト項目: 解釈できない文字列は None になる
        // given (前提条件):
        let timestamp = "yesterday";

        // when (操作):
        let result = display_timestamp(timestamp);

        // then (期待する結果):
        assert!(result.is_none());
    }
}
