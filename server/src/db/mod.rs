pub mod scoreboard;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::session::RetiredRecord;

pub use scoreboard::{InMemoryScoreboardSink, PgScoreboardSink, ScoreboardError, ScoreboardRecord, ScoreboardSink};

enum PersistCommand {
    Retired(Vec<RetiredRecord>),
    Shutdown,
}

/// Cloneable handle to the background score-writer, mirroring the shape
/// of the teacher's `PersistenceHandle`. Every method is fire-and-forget
/// from the tick's point of view: retirement records never block a tick.
#[derive(Clone)]
pub struct ScoreboardHandle {
    tx: mpsc::Sender<PersistCommand>,
}

impl ScoreboardHandle {
    pub async fn forward_retired(&self, records: Vec<RetiredRecord>) {
        if records.is_empty() {
            return;
        }
        if self.tx.send(PersistCommand::Retired(records)).await.is_err() {
            log::error!("scoreboard worker is gone; dropping retirement records");
        }
    }

    pub async fn shutdown(&self) {
        let _ = self.tx.send(PersistCommand::Shutdown).await;
    }
}

/// Spawns the background task that owns the `ScoreboardSink` and performs
/// the actual database writes off the tick path. Failures are logged and
/// the record is dropped, per §7's policy for the persistence collaborator.
pub fn start_scoreboard_worker(sink: Arc<dyn ScoreboardSink>) -> ScoreboardHandle {
    let (tx, mut rx) = mpsc::channel::<PersistCommand>(1024);

    tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                PersistCommand::Retired(records) => {
                    for record in records {
                        if let Err(err) = sink.insert(&record).await {
                            log::warn!(
                                "dropping retirement record for '{}': {err}",
                                record.name
                            );
                        }
                    }
                }
                PersistCommand::Shutdown => break,
            }
        }
    });

    ScoreboardHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::token::PlayerToken;

    #[tokio::test]
    async fn forwarded_records_reach_the_sink() {
        let sink = Arc::new(InMemoryScoreboardSink::new());
        let handle = start_scoreboard_worker(sink.clone());

        handle
            .forward_retired(vec![RetiredRecord {
                token: PlayerToken::from_parts(1, 1),
                name: "finn".into(),
                score: 12,
                play_time: 42.0,
            }])
            .await;

        handle.shutdown().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let page = sink.page(0, 10).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "finn");
    }
}
