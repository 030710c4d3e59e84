use chrono::{DateTime, Timelike, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use tracing::{debug, instrument};

use crate::observation::{
    CrowdAcoustics, GameInfo, PositionGroup, SubjectProfile, Surface, VenueProfile,
    WeatherConditions,
};
use crate::scoring::models::{EnvironmentalReport, FieldAnalysis, FieldCondition, GameContext};
use crate::scoring::normalizer::{self, clamp_unit};
use crate::scoring::pipeline::ThresholdTable;
use crate::shared::ScoringSources;

pub const HOME_ADVANTAGE_BASE: f64 = 0.55;
pub const HOME_ADVANTAGE_CAP: f64 = 0.70;
pub const LARGE_VENUE_CAPACITY: u32 = 70_000;

pub const FIELD_CONDITIONS: ThresholdTable<FieldCondition> = ThresholdTable::above(
    &[
        (0.85, FieldCondition::Excellent),
        (0.70, FieldCondition::Good),
        (0.50, FieldCondition::Fair),
    ],
    FieldCondition::Poor,
);

/// `(condition, speed, traction)` multipliers
type FieldFactors = (f64, f64, f64);

const FIELD_BASELINE: FieldFactors = (0.90, 0.85, 0.90);
const WET_FIELD: FieldFactors = (0.85, 0.90, 0.85);
const SOAKED_FIELD: FieldFactors = (0.80, 0.85, 0.80);
const SYNTHETIC_TURF: FieldFactors = (1.0, 1.10, 1.05);

/// Conditions inside a closed venue
const INDOOR_WEATHER: WeatherConditions = WeatherConditions {
    temperature_f: 72.0,
    humidity_pct: 50.0,
    wind_mph: 0.0,
    precipitation_in: 0.0,
};

pub fn communication_difficulty(average_db: f64) -> f64 {
    if average_db < 85.0 {
        0.0
    } else if average_db < 95.0 {
        0.2
    } else if average_db < 105.0 {
        0.5
    } else {
        0.8
    }
}

pub fn home_advantage(average_db: f64, capacity: u32) -> f64 {
    let mut advantage = HOME_ADVANTAGE_BASE;
    if average_db > 95.0 {
        advantage += 0.05;
    }
    if average_db > 100.0 {
        advantage += 0.05;
    }
    if capacity > LARGE_VENUE_CAPACITY {
        advantage += 0.05;
    }
    advantage.min(HOME_ADVANTAGE_CAP)
}

/// Alignment of kickoff with the subject's body clock, taken from their home offset
pub fn circadian_alignment(kickoff: DateTime<Utc>, home_utc_offset_hours: i32) -> f64 {
    let body_hour = (kickoff.hour() as i32 + home_utc_offset_hours).rem_euclid(24);
    match body_hour {
        5..=11 => 0.80,
        12..=20 => 1.0,
        _ => 0.85,
    }
}

pub fn field_analysis(precipitation_in: f64, surface: Surface, indoor: bool) -> FieldAnalysis {
    let scale = |(c, s, t): FieldFactors, (dc, ds, dt): FieldFactors| (c * dc, s * ds, t * dt);

    let mut factors = FIELD_BASELINE;
    if !indoor && precipitation_in > 0.5 {
        factors = scale(factors, WET_FIELD);
        if precipitation_in > 1.0 {
            factors = scale(factors, SOAKED_FIELD);
        }
    }
    if surface == Surface::SyntheticTurf {
        factors = scale(factors, SYNTHETIC_TURF);
    }

    let (condition, speed, traction) = factors;
    let condition = clamp_unit(condition);
    FieldAnalysis {
        condition,
        speed: clamp_unit(speed),
        traction: clamp_unit(traction),
        classification: FIELD_CONDITIONS.classify(condition),
    }
}

/// Game-day conditions every position modifier is computed from
#[derive(Debug, Clone, Copy)]
pub struct GameConditions {
    pub weather: WeatherConditions,
    pub field: FieldAnalysis,
    pub communication: f64,
    pub home_advantage: f64,
    pub is_home: bool,
    pub circadian: f64,
}

pub fn position_modifier(position: PositionGroup, conditions: &GameConditions) -> f64 {
    let GameConditions {
        weather,
        field,
        communication,
        home_advantage,
        is_home,
        circadian,
    } = *conditions;
    let wind = weather.wind_mph;
    let wet = weather.precipitation_in > 0.5;
    let step = |applies: bool, factor: f64| if applies { factor } else { 1.0 };

    let modifier = match position {
        PositionGroup::Quarterback => {
            step(wind > 15.0, 0.90)
                * step(wind > 25.0, 0.85)
                * step(wet, 0.90)
                * (1.0 - 0.15 * communication)
        }
        PositionGroup::RunningBack => {
            step(field.traction < 0.70, 0.90)
                * step(field.speed > 0.90, 1.05)
                * step(wet, 1.02)
        }
        PositionGroup::WideReceiver => {
            step(wind > 15.0, 0.93)
                * step(wet, 0.90)
                * step(field.speed > 0.90, 1.03)
                * (1.0 - 0.10 * communication)
        }
        PositionGroup::TightEnd => {
            step(wind > 15.0, 0.96) * step(wet, 0.95) * (1.0 - 0.05 * communication)
        }
        PositionGroup::Kicker => {
            step(wind > 10.0, 0.90)
                * step(wind > 20.0, 0.80)
                * step(weather.temperature_f < 32.0, 0.95)
        }
        PositionGroup::Defense => {
            if is_home {
                1.0 + (home_advantage - 0.5) * 0.2
            } else {
                1.0 + communication * 0.05
            }
        }
    };

    modifier * circadian
}

pub fn position_modifiers(conditions: &GameConditions) -> BTreeMap<PositionGroup, f64> {
    PositionGroup::iter()
        .map(|position| (position, position_modifier(position, conditions)))
        .collect()
}

/// Raw game-day observations; any of them may be missing
#[derive(Debug, Clone, Default)]
pub struct EnvironmentalInputs {
    pub game: Option<GameInfo>,
    pub venue: Option<VenueProfile>,
    pub weather: Option<WeatherConditions>,
    pub crowd: Option<CrowdAcoustics>,
}

#[derive(Debug, Clone, Default)]
pub struct EnvironmentalModel;

impl EnvironmentalModel {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        profile: &SubjectProfile,
        context: &GameContext,
        inputs: &EnvironmentalInputs,
    ) -> EnvironmentalReport {
        let indoor = inputs.venue.as_ref().is_some_and(|v| v.indoor);
        let surface = inputs
            .venue
            .as_ref()
            .map(|v| v.surface)
            .unwrap_or(Surface::Grass);
        let capacity = inputs.venue.as_ref().map(|v| v.capacity).unwrap_or(0);
        let average_db = inputs.crowd.map(|c| c.average_db).unwrap_or(0.0);

        let weather = if indoor {
            INDOOR_WEATHER
        } else {
            inputs.weather.unwrap_or_default()
        };
        let is_home = inputs
            .game
            .as_ref()
            .is_some_and(|g| g.home_team_id == profile.team_id);
        let circadian = inputs
            .game
            .as_ref()
            .map(|g| circadian_alignment(g.kickoff, profile.home_utc_offset_hours))
            .unwrap_or(1.0);

        let conditions = GameConditions {
            weather,
            field: field_analysis(weather.precipitation_in, surface, indoor),
            communication: communication_difficulty(average_db),
            home_advantage: home_advantage(average_db, capacity),
            is_home,
            circadian,
        };
        let position_modifiers = position_modifiers(&conditions);
        let subject_modifier = profile
            .position
            .and_then(|p| position_modifiers.get(&p).copied());

        EnvironmentalReport {
            subject_id: profile.id.clone(),
            game_id: context.game_id.clone(),
            is_home,
            weather_risk: normalizer::environmental_risk(inputs.weather.as_ref(), indoor).value,
            field: conditions.field,
            home_advantage: conditions.home_advantage,
            communication_difficulty: conditions.communication,
            circadian_alignment: circadian,
            position_modifiers,
            subject_modifier,
            generated_at: context.as_of,
        }
    }

    #[instrument(skip(self, sources, profile), fields(subject_id = %profile.id))]
    pub async fn gather(
        &self,
        sources: &ScoringSources,
        profile: &SubjectProfile,
        context: &GameContext,
    ) -> EnvironmentalInputs {
        let Some(game) = sources.game(&context.game_id).await else {
            debug!(game_id = %context.game_id, "Game not found, using neutral conditions");
            return EnvironmentalInputs::default();
        };

        let (venue, crowd, weather) = tokio::join!(
            sources.observations.venue(&game.venue_id),
            sources.observations.crowd(&game.venue_id),
            sources.observations.weather(json!({
                "gameId": game.game_id,
                "venueId": game.venue_id,
            })),
        );

        debug!(
            venue = venue.is_some(),
            crowd = crowd.is_some(),
            weather = weather.is_some(),
            "Gathered environmental inputs"
        );

        EnvironmentalInputs {
            game: Some(game),
            venue,
            weather,
            crowd,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{InMemoryHistoricalRecords, InMemoryObservationGateway};
    use crate::shared::test_utils::{as_of, profile, SourcesBuilder};
    use chrono::TimeZone;
    use rstest::rstest;
    use std::sync::Arc;

    fn calm() -> GameConditions {
        GameConditions {
            weather: INDOOR_WEATHER,
            field: field_analysis(0.0, Surface::Grass, false),
            communication: 0.0,
            home_advantage: HOME_ADVANTAGE_BASE,
            is_home: false,
            circadian: 1.0,
        }
    }

    #[rstest]
    #[case(84.0, 0.0)]
    #[case(85.0, 0.2)]
    #[case(94.0, 0.2)]
    #[case(95.0, 0.5)]
    #[case(104.0, 0.5)]
    #[case(105.0, 0.8)]
    fn communication_steps(#[case] db: f64, #[case] expected: f64) {
        assert_eq!(communication_difficulty(db), expected);
    }

    #[test]
    fn home_advantage_rises_with_noise_and_caps() {
        let mut previous = 0.0;
        for db in [60.0, 90.0, 96.0, 101.0, 120.0] {
            let advantage = home_advantage(db, 80_000);
            assert!(advantage >= previous);
            assert!(advantage <= HOME_ADVANTAGE_CAP);
            previous = advantage;
        }
        assert!((home_advantage(101.0, 80_000) - HOME_ADVANTAGE_CAP).abs() < 1e-9);
        assert_eq!(home_advantage(60.0, 20_000), HOME_ADVANTAGE_BASE);
    }

    #[rstest]
    #[case(17, -5, 1.0)]
    #[case(14, -5, 0.80)]
    #[case(1, -5, 1.0)]
    #[case(2, -5, 0.85)]
    #[case(3, 0, 0.85)]
    #[case(23, 0, 0.85)]
    fn circadian_follows_body_clock(
        #[case] utc_hour: u32,
        #[case] offset: i32,
        #[case] expected: f64,
    ) {
        let kickoff = Utc.with_ymd_and_hms(2024, 11, 3, utc_hour, 0, 0).unwrap();
        assert_eq!(circadian_alignment(kickoff, offset), expected);
    }

    #[test]
    fn heavy_rain_degrades_grass() {
        let dry = field_analysis(0.0, Surface::Grass, false);
        assert_eq!(dry.classification, FieldCondition::Excellent);

        let soaked = field_analysis(1.5, Surface::Grass, false);
        assert!((soaked.condition - 0.612).abs() < 1e-9);
        assert_eq!(soaked.classification, FieldCondition::Fair);
        assert!(soaked.traction < 0.70);

        let dome = field_analysis(1.5, Surface::Grass, true);
        assert_eq!(dome, dry);
    }

    #[test]
    fn synthetic_turf_is_faster() {
        let turf = field_analysis(0.0, Surface::SyntheticTurf, false);
        assert!((turf.speed - 0.935).abs() < 1e-9);
        assert!((turf.traction - 0.945).abs() < 1e-9);
        assert!(turf.speed <= 1.0);
    }

    #[test]
    fn wind_hurts_passing_and_kicking() {
        let mut conditions = calm();
        conditions.weather.wind_mph = 22.0;
        conditions.weather.temperature_f = 30.0;

        let modifiers = position_modifiers(&conditions);
        assert!((modifiers[&PositionGroup::Quarterback] - 0.90).abs() < 1e-9);
        assert!((modifiers[&PositionGroup::Kicker] - 0.684).abs() < 1e-9);
        assert!((modifiers[&PositionGroup::TightEnd] - 0.96).abs() < 1e-9);
        assert_eq!(modifiers[&PositionGroup::RunningBack], 1.0);
        assert_eq!(modifiers.len(), 6);
    }

    #[test]
    fn defense_feeds_on_home_crowd() {
        let mut conditions = calm();
        conditions.is_home = true;
        conditions.home_advantage = HOME_ADVANTAGE_CAP;
        conditions.circadian = 0.85;

        let modifier = position_modifier(PositionGroup::Defense, &conditions);
        assert!((modifier - 1.04 * 0.85).abs() < 1e-9);
    }

    #[tokio::test]
    async fn gather_and_score_a_loud_dome() {
        let history = Arc::new(InMemoryHistoricalRecords::new());
        history
            .add_game(GameInfo {
                game_id: "g-1".into(),
                home_team_id: "team-a".into(),
                away_team_id: "team-b".into(),
                venue_id: "v-1".into(),
                kickoff: Utc.with_ymd_and_hms(2024, 11, 3, 18, 0, 0).unwrap(),
            })
            .await;
        let gateway = Arc::new(InMemoryObservationGateway::new());
        gateway
            .insert(
                "venue",
                "profile",
                "v-1",
                json!({ "venueId": "v-1", "capacity": 72000, "surface": "turf", "dome": true }),
            )
            .await;
        gateway
            .insert("venue", "crowd_acoustics", "v-1", json!({ "averageDb": 102.0 }))
            .await;
        gateway
            .insert(
                "weather",
                "forecast",
                "g-1",
                json!({ "temperature": 20.0, "wind": 30.0, "precipitation": 2.0 }),
            )
            .await;
        let sources = SourcesBuilder::new()
            .with_history(history)
            .with_gateway(gateway)
            .build();
        let model = EnvironmentalModel::new();
        let subject = profile("p-1");
        let context = GameContext::new("g-1", as_of());

        let inputs = model.gather(&sources, &subject, &context).await;
        let report = model.score(&subject, &context, &inputs);

        assert!(report.is_home);
        assert_eq!(report.weather_risk, 0.0);
        assert_eq!(report.communication_difficulty, 0.5);
        assert!((report.home_advantage - HOME_ADVANTAGE_CAP).abs() < 1e-9);
        assert_eq!(report.field.classification, FieldCondition::Excellent);
        // 18:00 UTC is 13:00 on the subject's body clock
        assert_eq!(report.circadian_alignment, 1.0);
        assert!((report.subject_modifier.unwrap() - 0.925).abs() < 1e-9);
        assert_eq!(report.generated_at, as_of());
    }

    #[tokio::test]
    async fn unknown_game_reports_neutral_conditions() {
        let sources = SourcesBuilder::new().build();
        let model = EnvironmentalModel::new();
        let subject = profile("p-1");
        let context = GameContext::new("missing", as_of());

        let inputs = model.gather(&sources, &subject, &context).await;
        let report = model.score(&subject, &context, &inputs);

        assert!(!report.is_home);
        assert_eq!(report.circadian_alignment, 1.0);
        assert_eq!(report.communication_difficulty, 0.0);
        assert!(report.position_modifiers.values().all(|m| m.is_finite()));
    }
}
