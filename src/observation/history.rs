use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::models::{
    GameInfo, GameStatLine, InjuryRecord, ScheduleEntry, SubjectProfile, TimeWindow,
};
use super::GatewayError;

/// Read-only queries over time-bounded historical collections.
///
/// Sequences are returned most-recent-first and may be empty.
#[async_trait]
pub trait HistoricalRecords: Send + Sync {
    async fn resolve_subject(&self, subject_id: &str)
        -> Result<Option<SubjectProfile>, GatewayError>;
    async fn schedule(
        &self,
        team_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<ScheduleEntry>, GatewayError>;
    async fn game_stats(
        &self,
        subject_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<GameStatLine>, GatewayError>;
    async fn injuries(&self, subject_id: &str) -> Result<Vec<InjuryRecord>, GatewayError>;
    async fn game(&self, game_id: &str) -> Result<Option<GameInfo>, GatewayError>;
}

/// In-memory implementation of HistoricalRecords for development and testing
#[derive(Debug, Default)]
pub struct InMemoryHistoricalRecords {
    subjects: RwLock<HashMap<String, SubjectProfile>>,
    schedules: RwLock<HashMap<String, Vec<ScheduleEntry>>>,
    stat_lines: RwLock<HashMap<String, Vec<GameStatLine>>>,
    injuries: RwLock<HashMap<String, Vec<InjuryRecord>>>,
    games: RwLock<HashMap<String, GameInfo>>,
}

impl InMemoryHistoricalRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_subject(&self, profile: SubjectProfile) {
        self.subjects
            .write()
            .await
            .insert(profile.id.clone(), profile);
    }

    pub async fn add_schedule_entry(&self, entry: ScheduleEntry) {
        self.schedules
            .write()
            .await
            .entry(entry.team_id.clone())
            .or_default()
            .push(entry);
    }

    pub async fn add_stat_line(&self, subject_id: &str, line: GameStatLine) {
        self.stat_lines
            .write()
            .await
            .entry(subject_id.to_string())
            .or_default()
            .push(line);
    }

    pub async fn add_injury(&self, subject_id: &str, record: InjuryRecord) {
        self.injuries
            .write()
            .await
            .entry(subject_id.to_string())
            .or_default()
            .push(record);
    }

    pub async fn add_game(&self, game: GameInfo) {
        self.games.write().await.insert(game.game_id.clone(), game);
    }
}

#[async_trait]
impl HistoricalRecords for InMemoryHistoricalRecords {
    #[instrument(skip(self))]
    async fn resolve_subject(
        &self,
        subject_id: &str,
    ) -> Result<Option<SubjectProfile>, GatewayError> {
        let subjects = self.subjects.read().await;
        let profile = subjects.get(subject_id).cloned();
        if profile.is_none() {
            debug!(subject_id = %subject_id, "Subject not found in memory");
        }
        Ok(profile)
    }

    #[instrument(skip(self))]
    async fn schedule(
        &self,
        team_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<ScheduleEntry>, GatewayError> {
        let schedules = self.schedules.read().await;
        let mut entries: Vec<ScheduleEntry> = schedules
            .get(team_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| window.contains(entry.starts_at))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        entries.sort_by(|a, b| b.starts_at.cmp(&a.starts_at));
        Ok(entries)
    }

    #[instrument(skip(self))]
    async fn game_stats(
        &self,
        subject_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<GameStatLine>, GatewayError> {
        let stat_lines = self.stat_lines.read().await;
        let mut lines: Vec<GameStatLine> = stat_lines
            .get(subject_id)
            .map(|lines| {
                lines
                    .iter()
                    .filter(|line| window.contains(line.played_at))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        lines.sort_by(|a, b| b.played_at.cmp(&a.played_at));
        Ok(lines)
    }

    #[instrument(skip(self))]
    async fn injuries(&self, subject_id: &str) -> Result<Vec<InjuryRecord>, GatewayError> {
        let injuries = self.injuries.read().await;
        let mut records = injuries.get(subject_id).cloned().unwrap_or_default();
        records.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(records)
    }

    #[instrument(skip(self))]
    async fn game(&self, game_id: &str) -> Result<Option<GameInfo>, GatewayError> {
        Ok(self.games.read().await.get(game_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::models::InjurySeverity;
    use chrono::{Duration, TimeZone, Utc};

    fn line(game_id: &str, days_ago: i64, minutes: f64) -> GameStatLine {
        let as_of = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        GameStatLine {
            game_id: game_id.to_string(),
            played_at: as_of - Duration::days(days_ago),
            minutes,
            output: 20.0,
        }
    }

    #[tokio::test]
    async fn stat_lines_are_windowed_and_most_recent_first() {
        let records = InMemoryHistoricalRecords::new();
        records.add_stat_line("p-1", line("g-old", 40, 30.0)).await;
        records.add_stat_line("p-1", line("g-2", 5, 32.0)).await;
        records.add_stat_line("p-1", line("g-1", 2, 35.0)).await;

        let as_of = Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0).unwrap();
        let lines = records
            .game_stats("p-1", &TimeWindow::ending_at(as_of, 28))
            .await
            .unwrap();

        let ids: Vec<&str> = lines.iter().map(|l| l.game_id.as_str()).collect();
        assert_eq!(ids, vec!["g-1", "g-2"]);
    }

    #[tokio::test]
    async fn unknown_subject_has_empty_history() {
        let records = InMemoryHistoricalRecords::new();

        assert!(records.resolve_subject("ghost").await.unwrap().is_none());
        assert!(records.injuries("ghost").await.unwrap().is_empty());
        assert!(records.game("g-404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn injuries_sorted_newest_first() {
        let records = InMemoryHistoricalRecords::new();
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        records
            .add_injury(
                "p-1",
                InjuryRecord {
                    occurred_at: base,
                    severity: InjurySeverity::Minor,
                    body_part: "ankle".into(),
                },
            )
            .await;
        records
            .add_injury(
                "p-1",
                InjuryRecord {
                    occurred_at: base + Duration::days(90),
                    severity: InjurySeverity::Severe,
                    body_part: "knee".into(),
                },
            )
            .await;

        let injuries = records.injuries("p-1").await.unwrap();
        assert_eq!(injuries[0].body_part, "knee");
        assert_eq!(injuries[1].body_part, "ankle");
    }
}
