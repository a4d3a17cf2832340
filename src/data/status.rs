//! Shared state of the relay, displayed by `/status`.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Live state of the Bancho connection and relay counters.
/// Internally uses an [Arc], so it's cheap to clone.
#[derive(Debug, Default, Clone)]
pub struct RelayStatus {
    #[allow(clippy::missing_docs_in_private_items)]
    inner: Arc<Mutex<StatusInner>>,
}

#[derive(Debug, Default)]
struct StatusInner {
    connected_since: Option<Instant>,
    channels: BTreeSet<String>,
    relayed: u64,
    failed: u64,
}

/// Point in time copy of [RelayStatus].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// `None` while disconnected.
    pub uptime: Option<Duration>,
    /// Joined channels, sorted.
    pub channels: Vec<String>,
    pub relayed: u64,
    pub failed: u64,
}

impl RelayStatus {
    /// Mark the Bancho session as registered.
    pub async fn set_connected(&self) {
        let mut inner = self.inner.lock().await;
        inner.connected_since = Some(Instant::now());
    }

    /// Mark the Bancho session as gone. Channels are forgotten too, they're
    /// joined again on reconnect.
    pub async fn set_disconnected(&self) {
        let mut inner = self.inner.lock().await;
        inner.connected_since = None;
        inner.channels.clear();
    }

    pub async fn joined(&self, channel: &str) {
        self.inner.lock().await.channels.insert(channel.to_lowercase());
    }

    pub async fn left(&self, channel: &str) {
        self.inner.lock().await.channels.remove(&channel.to_lowercase());
    }

    pub async fn record_relayed(&self) {
        self.inner.lock().await.relayed += 1;
    }

    pub async fn record_failed(&self) {
        self.inner.lock().await.failed += 1;
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.lock().await;
        StatusSnapshot {
            uptime: inner.connected_since.map(|since| since.elapsed()),
            channels: inner.channels.iter().cloned().collect(),
            relayed: inner.relayed,
            failed: inner.failed,
        }
    }
}

/// Helper function to format an uptime.
pub fn format_duration(dur: &Duration) -> String {
    let total_secs = dur.as_secs();
    let total_mins = total_secs / 60;
    let total_hours = total_mins / 60;

    let days = total_hours / 24;
    let hours = total_hours % 24;
    let mins = total_mins % 60;
    let secs = total_secs % 60;

    if days > 0 {
        format!("{days}d {hours:02}h:{mins:02}m:{secs:02}s")
    } else if hours > 0 {
        format!("{hours:02}h:{mins:02}m:{secs:02}s")
    } else {
        format!("{mins:02}m:{secs:02}s")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tracks_connection_and_channels() {
        let status = RelayStatus::default();
        assert_eq!(status.snapshot().await.uptime, None);

        status.set_connected().await;
        status.joined("#osu").await;
        status.joined("#Lobby").await;
        status.joined("#indonesian").await;
        status.left("#LOBBY").await;
        tokio::time::advance(Duration::from_secs(90)).await;

        let snapshot = status.snapshot().await;
        assert_eq!(snapshot.uptime, Some(Duration::from_secs(90)));
        assert_eq!(snapshot.channels, vec!["#indonesian", "#osu"]);

        status.set_disconnected().await;
        let snapshot = status.snapshot().await;
        assert_eq!(snapshot.uptime, None);
        assert!(snapshot.channels.is_empty());
    }

    #[tokio::test]
    async fn counters_survive_reconnects() {
        let status = RelayStatus::default();
        status.record_relayed().await;
        status.record_relayed().await;
        status.record_failed().await;
        status.set_disconnected().await;

        let snapshot = status.snapshot().await;
        assert_eq!((snapshot.relayed, snapshot.failed), (2, 1));
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(&Duration::from_secs(75)), "01m:15s");
        assert_eq!(format_duration(&Duration::from_secs(3_725)), "01h:02m:05s");
        assert_eq!(format_duration(&Duration::from_secs(90_061)), "1d 01h:01m:01s");
    }
}
