//! Background autosave and inactivity warnings
//!
//! Both loops run as tokio tasks bound to one cancellation token and only
//! read session state; the timeout itself is decided by the store.

use super::store::SessionStore;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutWarning {
    FiveMinutes,
    TwoMinutes,
    OneMinute,
}

impl TimeoutWarning {
    pub fn message(self) -> &'static str {
        match self {
            TimeoutWarning::FiveMinutes => "Session will time out in about 5 minutes of inactivity",
            TimeoutWarning::TwoMinutes => "Session will time out in about 2 minutes of inactivity",
            TimeoutWarning::OneMinute => "Session will time out in less than a minute",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarningEvent {
    pub warning: TimeoutWarning,
    pub remaining_secs: u64,
}

/// Warning to raise for the remaining seconds, and how long to wait
/// before the next check
pub fn warning_schedule(remaining_secs: u64) -> (Option<TimeoutWarning>, Duration) {
    match remaining_secs {
        0..=60 => (Some(TimeoutWarning::OneMinute), Duration::from_secs(10)),
        61..=120 => (Some(TimeoutWarning::TwoMinutes), Duration::from_secs(30)),
        241..=300 => (Some(TimeoutWarning::FiveMinutes), Duration::from_secs(60)),
        _ => (None, Duration::from_secs(60)),
    }
}

pub struct SessionTimers {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl SessionTimers {
    /// Spawn the autosave loop, and the warning loop when a sender is given
    pub fn spawn(
        store: Arc<SessionStore>,
        autosave_every: Duration,
        warnings: Option<mpsc::Sender<WarningEvent>>,
    ) -> Self {
        let token = CancellationToken::new();
        let mut handles = Vec::with_capacity(2);

        handles.push(tokio::spawn(autosave_loop(
            store.clone(),
            autosave_every,
            token.clone(),
        )));

        if let Some(tx) = warnings {
            handles.push(tokio::spawn(warning_loop(store, tx, token.clone())));
        }

        Self { token, handles }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Cancel both loops and wait for them to finish
    pub async fn shutdown(self) {
        self.token.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
        debug!("Session timers stopped");
    }
}

async fn autosave_loop(store: Arc<SessionStore>, every: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    // first tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                if store.is_active().await {
                    store.save().await;
                }
            }
        }
    }
}

async fn warning_loop(
    store: Arc<SessionStore>,
    tx: mpsc::Sender<WarningEvent>,
    token: CancellationToken,
) {
    loop {
        if token.is_cancelled() || !store.is_active().await {
            break;
        }

        let remaining_secs = store.time_remaining().await;
        let (warning, wait) = warning_schedule(remaining_secs);

        if let Some(warning) = warning {
            info!("Session inactivity warning: {} ({}s left)", warning.message(), remaining_secs);
            if tx.send(WarningEvent { warning, remaining_secs }).await.is_err() {
                break;
            }
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(wait) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use tempfile::TempDir;

    #[test]
    fn test_warning_schedule_bands() {
        assert_eq!(
            warning_schedule(280),
            (Some(TimeoutWarning::FiveMinutes), Duration::from_secs(60))
        );
        assert_eq!(
            warning_schedule(90),
            (Some(TimeoutWarning::TwoMinutes), Duration::from_secs(30))
        );
        assert_eq!(
            warning_schedule(45),
            (Some(TimeoutWarning::OneMinute), Duration::from_secs(10))
        );
        assert_eq!(warning_schedule(600), (None, Duration::from_secs(60)));
        assert_eq!(warning_schedule(200), (None, Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_warning_sent_when_window_is_short() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SessionStore::new(SessionConfig {
            data_dir: dir.path().to_path_buf(),
            timeout_secs: 30,
            autosave_interval_secs: 60,
        }));
        store.create("Ada", "Engineer").await.unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        let timers = SessionTimers::spawn(store.clone(), Duration::from_secs(60), Some(tx));

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.warning, TimeoutWarning::OneMinute);

        timers.shutdown().await;
    }

    #[tokio::test]
    async fn test_autosave_writes_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SessionStore::new(SessionConfig {
            data_dir: dir.path().to_path_buf(),
            ..SessionConfig::default()
        }));
        let id = store.create("Ada", "Engineer").await.unwrap();
        std::fs::remove_file(store.session_path(&id)).unwrap();

        let timers = SessionTimers::spawn(store.clone(), Duration::from_millis(20), None);
        tokio::time::sleep(Duration::from_millis(150)).await;
        timers.shutdown().await;

        assert!(store.session_path(&id).is_file());
    }
}
