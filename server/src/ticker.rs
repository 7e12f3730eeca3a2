//! Fixed-interval scheduler for the simulation step. Only started when
//! `--tick-period` is supplied; otherwise `/api/v1/game/tick` is the
//! enabled endpoint (§4.5, §6) and this module is unused.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::time::interval;

use crate::db::ScoreboardHandle;
use crate::registry::GameRegistry;
use crate::snapshot;

/// Spawns the ticker task. Returns a [`Notify`] the caller can use to
/// cancel it on shutdown.
pub fn start(
    registry: Arc<GameRegistry>,
    scoreboard: ScoreboardHandle,
    period: Duration,
    state_file: Option<PathBuf>,
    save_state_period: Option<Duration>,
) -> Arc<Notify> {
    let cancel = Arc::new(Notify::new());
    let cancel_for_task = cancel.clone();

    tokio::spawn(async move {
        let mut ticker = interval(period);
        let dt = period.as_secs_f64();
        let mut since_last_save = Duration::ZERO;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let retired = registry.tick(dt).await;
                    scoreboard.forward_retired(retired).await;

                    if let (Some(path), Some(save_period)) = (&state_file, save_state_period) {
                        since_last_save += period;
                        if since_last_save >= save_period {
                            since_last_save = Duration::ZERO;
                            let snap = registry.snapshot().await;
                            if let Err(err) = snapshot::save(path, &snap) {
                                log::error!("periodic snapshot save failed: {err}");
                            }
                        }
                    }
                }
                _ = cancel_for_task.notified() => break,
            }
        }
    });

    cancel
}
