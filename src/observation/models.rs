use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Basketball,
    Football,
    Soccer,
    Hockey,
}

impl Sport {
    /// Minutes a full-time starter plays in one game
    pub fn minutes_ceiling(self) -> f64 {
        match self {
            Sport::Basketball => 48.0,
            Sport::Football => 60.0,
            Sport::Soccer => 90.0,
            Sport::Hockey => 60.0,
        }
    }

    pub fn ideal_rest_days(self) -> f64 {
        match self {
            Sport::Basketball => 2.0,
            Sport::Football => 6.0,
            Sport::Soccer => 3.0,
            Sport::Hockey => 2.0,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum PositionGroup {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Kicker,
    Defense,
}

/// Identity and calibration data for a scored athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectProfile {
    pub id: String,
    pub name: String,
    pub team_id: String,
    pub sport: Sport,
    pub position: Option<PositionGroup>,
    /// Offset of the athlete's home timezone from UTC
    pub home_utc_offset_hours: i32,
}

/// Inclusive time range used for historical queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// A window that contains no instant
    pub fn empty() -> Self {
        Self {
            start: DateTime::<Utc>::MAX_UTC,
            end: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// The `days` leading up to `end`; empty when the start is out of range
    pub fn ending_at(end: DateTime<Utc>, days: u32) -> Self {
        match end.checked_sub_signed(Duration::days(i64::from(days))) {
            Some(start) => Self { start, end },
            None => Self::empty(),
        }
    }

    /// The `days` following `start`; empty when the end is out of range
    pub fn starting_at(start: DateTime<Utc>, days: u32) -> Self {
        match start.checked_add_signed(Duration::days(i64::from(days))) {
            Some(end) => Self { start, end },
            None => Self::empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

// ============================================================================
// Historical records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameOutcome {
    Win,
    Loss,
    Draw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub game_id: String,
    pub team_id: String,
    pub opponent_id: String,
    pub starts_at: DateTime<Utc>,
    pub venue_id: Option<String>,
    pub result: Option<GameOutcome>,
}

/// One row of per-game production for an athlete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStatLine {
    pub game_id: String,
    pub played_at: DateTime<Utc>,
    pub minutes: f64,
    /// Fantasy-style production figure for the game
    pub output: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjurySeverity {
    Minor,
    Moderate,
    Severe,
    SeasonEnding,
}

impl InjurySeverity {
    pub fn weight(self) -> f64 {
        match self {
            InjurySeverity::Minor => 0.3,
            InjurySeverity::Moderate => 0.6,
            InjurySeverity::Severe | InjurySeverity::SeasonEnding => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryRecord {
    pub occurred_at: DateTime<Utc>,
    pub severity: InjurySeverity,
    pub body_part: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    pub game_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub venue_id: String,
    pub kickoff: DateTime<Utc>,
}

// ============================================================================
// Gateway payload schemas
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingMetrics {
    #[serde(default, alias = "distance_km", alias = "distance", alias = "totalDistance")]
    pub distance_km: f64,
    #[serde(default, alias = "sprint_count", alias = "sprints")]
    pub sprint_count: u32,
    #[serde(default, alias = "acceleration_count")]
    pub accelerations: u32,
    #[serde(default, alias = "deceleration_count")]
    pub decelerations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(alias = "latitude")]
    pub lat: f64,
    #[serde(alias = "lng", alias = "longitude")]
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelLeg {
    #[serde(alias = "origin")]
    pub from: GeoPoint,
    #[serde(alias = "destination")]
    pub to: GeoPoint,
    #[serde(default, alias = "timezone_shift_hours", alias = "tzShift")]
    pub timezone_shift_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BiomechanicalLoad {
    pub readings: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryMetrics {
    #[serde(default, alias = "sleep_hours", alias = "sleep")]
    pub sleep_hours: Option<f64>,
    #[serde(default, alias = "hrv_score", alias = "hrv")]
    pub hrv_score: Option<f64>,
}

/// Sentiment polarity in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SentimentReading {
    pub score: f64,
}

/// Model-derived confidence in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalReading {
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherConditions {
    #[serde(alias = "temperature", alias = "temperature_f", alias = "temp")]
    pub temperature_f: f64,
    #[serde(default = "default_humidity", alias = "humidity", alias = "humidity_pct")]
    pub humidity_pct: f64,
    #[serde(alias = "wind", alias = "wind_speed", alias = "windSpeed", alias = "wind_mph")]
    pub wind_mph: f64,
    #[serde(default, alias = "precipitation", alias = "precipitation_in")]
    pub precipitation_in: f64,
}

fn default_humidity() -> f64 {
    50.0
}

impl Default for WeatherConditions {
    /// Mild conditions assumed when no forecast is available
    fn default() -> Self {
        Self {
            temperature_f: 72.0,
            humidity_pct: default_humidity(),
            wind_mph: 5.0,
            precipitation_in: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    #[serde(alias = "natural", alias = "natural_grass")]
    Grass,
    #[serde(alias = "turf", alias = "artificial")]
    SyntheticTurf,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueProfile {
    #[serde(alias = "venue_id", alias = "id")]
    pub venue_id: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default = "default_surface")]
    pub surface: Surface,
    #[serde(default, alias = "dome", alias = "is_indoor")]
    pub indoor: bool,
}

fn default_surface() -> Surface {
    Surface::Grass
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrowdAcoustics {
    #[serde(alias = "average_db", alias = "decibels", alias = "db")]
    pub average_db: f64,
    #[serde(default, alias = "peak_db")]
    pub peak_db: Option<f64>,
}

/// A decoded gateway payload, one variant per provider schema
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Tracking(TrackingMetrics),
    Travel(Vec<TravelLeg>),
    Biomechanics(BiomechanicalLoad),
    Recovery(RecoveryMetrics),
    Sentiment(SentimentReading),
    InterviewTone(SignalReading),
    BodyLanguage(SignalReading),
    Weather(WeatherConditions),
    Venue(VenueProfile),
    Crowd(CrowdAcoustics),
}
