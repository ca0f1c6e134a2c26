//! Background refetch of a board graph on a fixed interval

use super::BoardSync;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Owns the polling task; dropping it stops polling
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// The task only holds a weak reference, so a dropped or closed view ends it
pub(crate) fn spawn_poller(sync: Weak<BoardSync>, period: Duration) -> PollHandle {
    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(sync) = sync.upgrade() else {
                break;
            };
            if !sync.is_active() {
                debug!(board_id = sync.board_id(), "view closed, polling stopped");
                break;
            }
            if let Err(e) = sync.refetch().await {
                warn!(board_id = sync.board_id(), error = %e, "background refetch failed");
            }
        }
    });

    PollHandle { task }
}
