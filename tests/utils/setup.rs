use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use player_scoring::observation::{
    GameInfo, GameOutcome, GameStatLine, InjuryRecord, InjurySeverity, PositionGroup,
    ScheduleEntry, Sport, SubjectProfile,
};
use player_scoring::{
    EngineConfig, InMemoryHistoricalRecords, InMemoryObservationGateway, PredictionDelegate,
    ScoreCache, ScoringEngine, UnavailableDelegate,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const SUBJECT_ID: &str = "p-1";
pub const TEAM_ID: &str = "team-a";
pub const NEXT_GAME_ID: &str = "g-next";
pub const VENUE_ID: &str = "v-1";

pub fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 1, 18, 0, 0).unwrap()
}

/// Installs a test subscriber once; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn subject() -> SubjectProfile {
    SubjectProfile {
        id: SUBJECT_ID.to_string(),
        name: "Test Player".to_string(),
        team_id: TEAM_ID.to_string(),
        sport: Sport::Football,
        position: Some(PositionGroup::Quarterback),
        home_utc_offset_hours: -5,
    }
}

pub struct TestSetup {
    pub engine: ScoringEngine,
    pub gateway: Arc<InMemoryObservationGateway>,
    pub history: Arc<InMemoryHistoricalRecords>,
}

pub struct TestSetupBuilder {
    register_subject: bool,
    history_games: u32,
    observations: bool,
    injuries: bool,
    next_game: bool,
    delegate: Arc<dyn PredictionDelegate>,
    cache: Option<Arc<dyn ScoreCache>>,
    config: EngineConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        init_tracing();
        Self {
            register_subject: true,
            history_games: 0,
            observations: false,
            injuries: false,
            next_game: false,
            delegate: Arc::new(UnavailableDelegate),
            cache: None,
            config: EngineConfig::default(),
        }
    }

    /// Weekly games, stat lines and results, the latest two days before `as_of`
    pub fn with_weekly_games(mut self, count: u32) -> Self {
        self.history_games = count;
        self
    }

    /// Tracking, travel, wellness, biomechanics, weather and psychological signals
    pub fn with_observations(mut self) -> Self {
        self.observations = true;
        self
    }

    pub fn with_injuries(mut self) -> Self {
        self.injuries = true;
        self
    }

    /// A home game two days after `as_of`, with venue and crowd data
    pub fn with_next_game(mut self) -> Self {
        self.next_game = true;
        self
    }

    pub fn without_subject(mut self) -> Self {
        self.register_subject = false;
        self
    }

    pub fn with_delegate(mut self, delegate: Arc<dyn PredictionDelegate>) -> Self {
        self.delegate = delegate;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn ScoreCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_delegate_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_delegate_timeout(timeout);
        self
    }

    pub async fn build(self) -> TestSetup {
        let gateway = Arc::new(InMemoryObservationGateway::new());
        let history = Arc::new(InMemoryHistoricalRecords::new());

        if self.register_subject {
            history.add_subject(subject()).await;
        }
        seed_games(&history, self.history_games).await;
        if self.injuries {
            seed_injuries(&history).await;
        }
        if self.observations {
            seed_observations(&gateway).await;
        }
        if self.next_game {
            seed_next_game(&history, &gateway).await;
        }

        let mut builder = ScoringEngine::builder(gateway.clone(), history.clone())
            .with_delegate(self.delegate)
            .with_config(self.config);
        if let Some(cache) = self.cache {
            builder = builder.with_cache(cache);
        }

        TestSetup {
            engine: builder.build(),
            gateway,
            history,
        }
    }
}

async fn seed_games(history: &InMemoryHistoricalRecords, count: u32) {
    for week in 0..count {
        let played_at = as_of() - ChronoDuration::days(2 + 7 * i64::from(week));
        let game_id = format!("g-{week}");
        let result = match week % 3 {
            0 | 1 => GameOutcome::Win,
            _ => GameOutcome::Loss,
        };

        history
            .add_schedule_entry(ScheduleEntry {
                game_id: game_id.clone(),
                team_id: TEAM_ID.to_string(),
                opponent_id: format!("team-{week}"),
                starts_at: played_at,
                venue_id: Some(VENUE_ID.to_string()),
                result: Some(result),
            })
            .await;
        history
            .add_stat_line(
                SUBJECT_ID,
                GameStatLine {
                    game_id,
                    played_at,
                    minutes: 55.0 - f64::from(week),
                    output: 18.0 + f64::from(week % 4) * 2.0,
                },
            )
            .await;
    }
}

async fn seed_injuries(history: &InMemoryHistoricalRecords) {
    history
        .add_injury(
            SUBJECT_ID,
            InjuryRecord {
                occurred_at: as_of() - ChronoDuration::days(60),
                severity: InjurySeverity::Severe,
                body_part: "knee".to_string(),
            },
        )
        .await;
    history
        .add_injury(
            SUBJECT_ID,
            InjuryRecord {
                occurred_at: as_of() - ChronoDuration::days(300),
                severity: InjurySeverity::Minor,
                body_part: "ankle".to_string(),
            },
        )
        .await;
}

async fn seed_observations(gateway: &InMemoryObservationGateway) {
    let payloads = [
        (
            "tracking",
            "metrics",
            json!({ "distanceKm": 9.5, "sprintCount": 30, "accelerations": 40, "decelerations": 35 }),
        ),
        (
            "travel",
            "legs",
            json!([{
                "from": { "lat": 40.7128, "lon": -74.0060 },
                "to": { "lat": 34.0522, "lon": -118.2437 },
                "timezoneShiftHours": -3.0
            }]),
        ),
        ("wellness", "recovery", json!({ "sleepHours": 7.0, "hrvScore": 0.6 })),
        ("biomechanics", "stress", json!([0.4, 0.5, 0.6])),
        (
            "weather",
            "forecast",
            json!({ "temperature": 38.0, "humidity": 85.0, "wind": 12.0, "precipitation": 0.0 }),
        ),
        ("sentiment", "social", json!({ "score": 0.4 })),
        ("sentiment", "news", json!({ "score": -0.2 })),
        ("media", "interview_tone", json!({ "confidence": 0.7 })),
        ("video", "body_language", json!(0.65)),
    ];

    for (capability, operation, payload) in payloads {
        gateway
            .insert(capability, operation, SUBJECT_ID, payload)
            .await;
    }
}

async fn seed_next_game(history: &InMemoryHistoricalRecords, gateway: &InMemoryObservationGateway) {
    let kickoff = as_of() + ChronoDuration::days(2);
    history
        .add_game(GameInfo {
            game_id: NEXT_GAME_ID.to_string(),
            home_team_id: TEAM_ID.to_string(),
            away_team_id: "team-b".to_string(),
            venue_id: VENUE_ID.to_string(),
            kickoff,
        })
        .await;
    history
        .add_schedule_entry(ScheduleEntry {
            game_id: NEXT_GAME_ID.to_string(),
            team_id: TEAM_ID.to_string(),
            opponent_id: "team-b".to_string(),
            starts_at: kickoff,
            venue_id: Some(VENUE_ID.to_string()),
            result: None,
        })
        .await;

    gateway
        .insert(
            "venue",
            "profile",
            VENUE_ID,
            json!({ "venueId": VENUE_ID, "capacity": 76000, "surface": "grass", "indoor": false }),
        )
        .await;
    gateway
        .insert(
            "venue",
            "crowd_acoustics",
            VENUE_ID,
            json!({ "averageDb": 98.0, "peakDb": 112.0 }),
        )
        .await;
    gateway
        .insert(
            "weather",
            "forecast",
            NEXT_GAME_ID,
            json!({ "temperature": 41.0, "wind": 18.0, "precipitation": 0.7 }),
        )
        .await;
}
