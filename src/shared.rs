use std::sync::Arc;
use tracing::debug;

use crate::delegate::BoundedDelegate;
use crate::observation::{
    GameInfo, GameStatLine, HistoricalRecords, InjuryRecord, ObservationAdapter, ScheduleEntry,
    TimeWindow,
};

/// Data ports shared by every composite model.
///
/// History failures are folded into empty results here, so models only ever see
/// "no data", never an error.
#[derive(Clone)]
pub struct ScoringSources {
    pub observations: ObservationAdapter,
    pub history: Arc<dyn HistoricalRecords>,
    pub delegate: BoundedDelegate,
}

impl ScoringSources {
    pub fn new(
        observations: ObservationAdapter,
        history: Arc<dyn HistoricalRecords>,
        delegate: BoundedDelegate,
    ) -> Self {
        Self {
            observations,
            history,
            delegate,
        }
    }

    pub async fn stat_lines(&self, subject_id: &str, window: &TimeWindow) -> Vec<GameStatLine> {
        self.history
            .game_stats(subject_id, window)
            .await
            .unwrap_or_else(|err| {
                debug!(subject_id, error = %err, "Stat history unavailable");
                Vec::new()
            })
    }

    pub async fn schedule(&self, team_id: &str, window: &TimeWindow) -> Vec<ScheduleEntry> {
        self.history
            .schedule(team_id, window)
            .await
            .unwrap_or_else(|err| {
                debug!(team_id, error = %err, "Schedule unavailable");
                Vec::new()
            })
    }

    pub async fn injuries(&self, subject_id: &str) -> Vec<InjuryRecord> {
        self.history.injuries(subject_id).await.unwrap_or_else(|err| {
            debug!(subject_id, error = %err, "Injury history unavailable");
            Vec::new()
        })
    }

    pub async fn game(&self, game_id: &str) -> Option<GameInfo> {
        self.history.game(game_id).await.unwrap_or_else(|err| {
            debug!(game_id, error = %err, "Game lookup failed");
            None
        })
    }
}
