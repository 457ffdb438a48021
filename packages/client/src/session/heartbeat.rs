//! Heart-beat negotiation.
//!
//! Both sides announce `heart-beat:<cx>,<cy>` / `heart-beat:<sx>,<sy>`. The
//! client sends every `max(cx, sy)` ms and expects data every `max(cy, sx)`
//! ms; a zero on either side turns that direction off.

use std::time::Duration;

use super::config::HeartbeatConfig;

/// Heart-beat periods agreed for one connection. `None` is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NegotiatedHeartbeat {
    pub outgoing: Option<Duration>,
    pub incoming: Option<Duration>,
}

impl NegotiatedHeartbeat {
    /// Agree on periods from our offer and the `heart-beat` header of CONNECTED.
    ///
    /// A missing or malformed header turns heart-beating off.
    pub fn negotiate(client: &HeartbeatConfig, server_header: Option<&str>) -> Self {
        let Some((server_out, server_in)) = server_header.and_then(parse_header) else {
            if let Some(raw) = server_header {
                tracing::warn!("Ignoring malformed heart-beat header: {:?}", raw);
            }
            return Self::default();
        };

        Self {
            outgoing: agree(client.outgoing, server_in),
            incoming: agree(client.incoming, server_out),
        }
    }

    /// Silence longer than this means the connection is dead
    pub fn liveness_timeout(&self) -> Option<Duration> {
        self.incoming.and_then(|period| period.checked_mul(2))
    }
}

fn parse_header(value: &str) -> Option<(Duration, Duration)> {
    let (first, second) = value.split_once(',')?;
    let first = first.trim().parse::<u64>().ok()?;
    let second = second.trim().parse::<u64>().ok()?;
    Some((Duration::from_millis(first), Duration::from_millis(second)))
}

fn agree(ours: Duration, theirs: Duration) -> Option<Duration> {
    if ours.is_zero() || theirs.is_zero() {
        None
    } else {
        Some(ours.max(theirs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_negotiate_takes_larger_period() {
        // テスト項目: 送受信の周期はクライアントとサーバーの大きい方の値になる
        // given (前提条件):
        let client = HeartbeatConfig::symmetric(ms(4000));

        // when (操作):
        let agreed = NegotiatedHeartbeat::negotiate(&client, Some("10000,1000"));

        // then (期待する結果):
        assert_eq!(agreed.outgoing, Some(ms(4000)));
        assert_eq!(agreed.incoming, Some(ms(10000)));
        assert_eq!(agreed.liveness_timeout(), Some(ms(20000)));
    }

    #[test]
    fn test_negotiate_zero_disables_direction() {
        // テスト項目: どちらかが 0 を指定した方向の心拍は無効になる
        // given (前提条件):
        let client = HeartbeatConfig {
            outgoing: ms(4000),
            incoming: ms(0),
        };

        // when (操作):
        let agreed = NegotiatedHeartbeat::negotiate(&client, Some("4000,0"));

        // then (期待する結果):
        assert_eq!(agreed.outgoing, None);
        assert_eq!(agreed.incoming, None);
        assert_eq!(agreed.liveness_timeout(), None);
    }

    #[test]
    fn test_negotiate_without_header_disables_heartbeat() {
        // テスト項目: CONNECTED に heart-beat ヘッダーがない場合は心拍を行わない
        // given (前提条件):
        let client = HeartbeatConfig::default();

        // when (操作):
        let missing = NegotiatedHeartbeat::negotiate(&client, None);
        let malformed = NegotiatedHeartbeat::negotiate(&client, Some("fast"));

        // then (期待する結果):
        assert_eq!(missing, NegotiatedHeartbeat::default());
        assert_eq!(malformed, NegotiatedHeartbeat::default());
    }

    #[test]
    fn test_negotiate_accepts_spaces_in_header() {
        // テスト項目: ヘッダー値の前後の空白は許容される
        // given (前提条件):
        let client = HeartbeatConfig::default();

        // when (操作):
        let agreed = NegotiatedHeartbeat::negotiate(&client, Some(" 4000 , 4000 "));

        // then (期待する結果):
        assert_eq!(agreed.outgoing, Some(ms(4000)));
        assert_eq!(agreed.incoming, Some(ms(4000)));
    }
}
