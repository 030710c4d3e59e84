//! Pure, total mappings from raw observations to bounded features.
//!
//! Each function accepts the "missing" shape of its input (`None`, an empty
//! slice) and maps it to a documented neutral value instead of failing.

use chrono::{DateTime, Duration, Utc};

use crate::observation::{
    BiomechanicalLoad, GameOutcome, GameStatLine, InjuryRecord, RecoveryMetrics, ScheduleEntry,
    SentimentReading, SignalReading, Sport, TrackingMetrics, TravelLeg, WeatherConditions,
};

use super::geo::haversine_km;
use super::models::{FeatureName, NormalizedFeature};

pub const PHYSICAL_LOAD_DENOMINATOR: f64 = 400.0;
pub const TRAVEL_DISTANCE_REFERENCE_KM: f64 = 5000.0;
pub const TIMEZONE_SHIFT_REFERENCE_HOURS: f64 = 9.0;
pub const HIGH_GAMES_PER_WEEK: f64 = 2.0;
pub const WORKLOAD_RATIO_REFERENCE: f64 = 2.0;
pub const INJURY_RECENCY_DAYS: f64 = 365.0;
pub const INJURY_COUNT_REFERENCE: f64 = 5.0;
pub const SLEEP_TARGET_HOURS: f64 = 8.0;
pub const DEFAULT_PERFORMANCE_CORRELATION: f64 = -0.3;
pub const NEUTRAL: f64 = 0.5;

const ACUTE_DAYS: i64 = 7;
const CHRONIC_DAYS: i64 = 28;
const TEAM_FORM_GAMES: usize = 10;
const TEAM_FORM_MIN_GAMES: usize = 3;
const TREND_WINDOW: usize = 3;
const CORRELATION_GAMES: usize = 10;

/// Clamps to [0, 1], mapping NaN to 0
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub fn ratio_to_reference(value: f64, high: f64) -> f64 {
    if high <= 0.0 {
        return 0.0;
    }
    clamp_unit(value / high)
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

// ============================================================================
// Load and schedule
// ============================================================================

pub fn physical_load(metrics: Option<&TrackingMetrics>) -> NormalizedFeature {
    let Some(metrics) = metrics else {
        return NormalizedFeature::defaulted(FeatureName::PhysicalLoad, 0.0);
    };

    let load = metrics.distance_km.max(0.0) * 10.0
        + f64::from(metrics.sprint_count) * 2.0
        + f64::from(metrics.accelerations)
        + f64::from(metrics.decelerations);

    NormalizedFeature::observed(
        FeatureName::PhysicalLoad,
        load / PHYSICAL_LOAD_DENOMINATOR,
    )
}

pub fn travel_fatigue(legs: &[TravelLeg]) -> NormalizedFeature {
    if legs.is_empty() {
        return NormalizedFeature::defaulted(FeatureName::TravelFatigue, 0.0);
    }

    let distance_km: f64 = legs.iter().map(|leg| haversine_km(leg.from, leg.to)).sum();
    let shift_hours: f64 = legs
        .iter()
        .map(|leg| leg.timezone_shift_hours)
        .filter(|h| h.is_finite())
        .map(f64::abs)
        .sum();

    let value = ratio_to_reference(distance_km, TRAVEL_DISTANCE_REFERENCE_KM) * 0.6
        + ratio_to_reference(shift_hours, TIMEZONE_SHIFT_REFERENCE_HOURS) * 0.4;

    NormalizedFeature::observed(FeatureName::TravelFatigue, value)
}

pub fn game_frequency(games: usize, lookback_days: u32) -> NormalizedFeature {
    if games == 0 || lookback_days == 0 {
        return NormalizedFeature::defaulted(FeatureName::GameFrequency, 0.0);
    }

    let weeks = f64::from(lookback_days) / 7.0;
    let per_week = games as f64 / weeks;
    NormalizedFeature::observed(
        FeatureName::GameFrequency,
        ratio_to_reference(per_week, HIGH_GAMES_PER_WEEK),
    )
}

pub fn minutes_load(lines: &[GameStatLine], sport: Sport) -> NormalizedFeature {
    match mean(lines.iter().map(|l| l.minutes.max(0.0))) {
        Some(average) => NormalizedFeature::observed(
            FeatureName::MinutesPlayed,
            ratio_to_reference(average, sport.minutes_ceiling()),
        ),
        None => NormalizedFeature::defaulted(FeatureName::MinutesPlayed, 0.0),
    }
}

/// Whole days between the most recent played game and `as_of`
pub fn rest_days(lines: &[GameStatLine], as_of: DateTime<Utc>) -> Option<f64> {
    lines
        .iter()
        .filter(|l| l.played_at <= as_of)
        .map(|l| l.played_at)
        .max()
        .map(|last| (as_of - last).num_days() as f64)
}

/// `max(1 - (ideal - actual) / ideal, 0)`, capped at 1; no previous game is fully rested
pub fn recovery_score(rest_days: Option<f64>, ideal_rest_days: f64) -> f64 {
    match rest_days {
        Some(actual) if ideal_rest_days > 0.0 => {
            clamp_unit((1.0 - (ideal_rest_days - actual) / ideal_rest_days).max(0.0))
        }
        _ => 1.0,
    }
}

pub fn recovery_time(rest_days: Option<f64>, sport: Sport) -> NormalizedFeature {
    let score = recovery_score(rest_days, sport.ideal_rest_days());
    if rest_days.is_some() {
        NormalizedFeature::observed(FeatureName::RecoveryTime, score)
    } else {
        NormalizedFeature::defaulted(FeatureName::RecoveryTime, score)
    }
}

// ============================================================================
// Injury inputs
// ============================================================================

fn mean_daily_minutes(lines: &[GameStatLine], as_of: DateTime<Utc>, days: i64) -> f64 {
    let since = as_of
        .checked_sub_signed(Duration::days(days))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let total: f64 = lines
        .iter()
        .filter(|l| l.played_at > since && l.played_at <= as_of)
        .map(|l| l.minutes.max(0.0))
        .sum();
    total / days as f64
}

/// Acute (7-day) to chronic (28-day) daily load ratio, 1 when there is no chronic load
pub fn acute_chronic_ratio(lines: &[GameStatLine], as_of: DateTime<Utc>) -> f64 {
    let acute = mean_daily_minutes(lines, as_of, ACUTE_DAYS);
    let chronic = mean_daily_minutes(lines, as_of, CHRONIC_DAYS);
    if chronic > 0.0 {
        acute / chronic
    } else {
        1.0
    }
}

pub fn workload(lines: &[GameStatLine], as_of: DateTime<Utc>) -> NormalizedFeature {
    let value = ratio_to_reference(acute_chronic_ratio(lines, as_of), WORKLOAD_RATIO_REFERENCE);
    if lines.is_empty() {
        NormalizedFeature::defaulted(FeatureName::Workload, value)
    } else {
        NormalizedFeature::observed(FeatureName::Workload, value)
    }
}

/// Mean severity weight of the recorded injuries, 0 when there are none
pub fn severity_score(records: &[&InjuryRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().map(|r| r.severity.weight()).sum::<f64>() / records.len() as f64
}

pub fn injury_history(records: &[InjuryRecord], as_of: DateTime<Utc>) -> NormalizedFeature {
    let past: Vec<&InjuryRecord> = records.iter().filter(|r| r.occurred_at <= as_of).collect();
    if past.is_empty() {
        return NormalizedFeature::defaulted(FeatureName::HistoricalInjuries, 0.0);
    }

    let recency = past
        .iter()
        .map(|r| {
            let days_since = (as_of - r.occurred_at).num_days() as f64;
            (1.0 - days_since / INJURY_RECENCY_DAYS).max(0.0)
        })
        .fold(0.0, f64::max);
    let severity = severity_score(&past);
    let frequency = ratio_to_reference(past.len() as f64, INJURY_COUNT_REFERENCE);

    NormalizedFeature::observed(
        FeatureName::HistoricalInjuries,
        0.4 * recency + 0.4 * severity + 0.2 * frequency,
    )
}

pub fn biomechanical_stress(load: Option<&BiomechanicalLoad>) -> NormalizedFeature {
    let average = load.and_then(|l| mean(l.readings.iter().copied().map(clamp_unit)));
    match average {
        Some(value) => NormalizedFeature::observed(FeatureName::BiomechanicalStress, value),
        None => NormalizedFeature::defaulted(FeatureName::BiomechanicalStress, 0.0),
    }
}

/// Additive-bucket weather risk; each crossed threshold adds a fixed increment
pub fn weather_risk(weather: &WeatherConditions) -> f64 {
    let mut risk = 0.0;

    if weather.temperature_f > 90.0 {
        risk += 0.3;
    }
    if weather.temperature_f < 32.0 {
        risk += 0.2;
    }
    if weather.humidity_pct > 80.0 {
        risk += 0.2;
    }
    if weather.wind_mph > 20.0 {
        risk += 0.2;
    }
    if weather.precipitation_in > 0.0 {
        risk += 0.3;
    }

    clamp_unit(risk)
}

pub fn environmental_risk(weather: Option<&WeatherConditions>, indoor: bool) -> NormalizedFeature {
    if indoor {
        return NormalizedFeature::observed(FeatureName::EnvironmentalFactors, 0.0);
    }
    match weather {
        Some(w) => NormalizedFeature::observed(FeatureName::EnvironmentalFactors, weather_risk(w)),
        None => NormalizedFeature::defaulted(
            FeatureName::EnvironmentalFactors,
            weather_risk(&WeatherConditions::default()),
        ),
    }
}

pub fn recovery_metrics(
    metrics: Option<&RecoveryMetrics>,
    rest_recovery: Option<f64>,
) -> NormalizedFeature {
    let mut terms = Vec::with_capacity(3);
    if let Some(metrics) = metrics {
        if let Some(sleep) = metrics.sleep_hours.filter(|v| v.is_finite()) {
            terms.push(ratio_to_reference(sleep, SLEEP_TARGET_HOURS));
        }
        if let Some(hrv) = metrics.hrv_score.filter(|v| v.is_finite()) {
            terms.push(clamp_unit(hrv));
        }
    }
    if let Some(rest) = rest_recovery {
        terms.push(clamp_unit(rest));
    }

    match mean(terms) {
        Some(value) => NormalizedFeature::observed(FeatureName::RecoveryMetrics, value),
        None => NormalizedFeature::defaulted(FeatureName::RecoveryMetrics, 1.0),
    }
}

// ============================================================================
// Psychological inputs
// ============================================================================

/// Averages per-source sentiment; each failed source counts as neutral
pub fn sentiment(readings: &[Option<SentimentReading>]) -> NormalizedFeature {
    if readings.iter().all(Option::is_none) {
        return NormalizedFeature::defaulted(FeatureName::Sentiment, NEUTRAL);
    }

    let per_source = readings.iter().map(|reading| match reading {
        Some(r) if r.score.is_finite() => clamp_unit((r.score.clamp(-1.0, 1.0) + 1.0) / 2.0),
        _ => NEUTRAL,
    });

    NormalizedFeature::observed(FeatureName::Sentiment, mean(per_source).unwrap_or(NEUTRAL))
}

pub fn signal(name: FeatureName, reading: Option<SignalReading>) -> NormalizedFeature {
    match reading {
        Some(r) => NormalizedFeature::observed(name, r.confidence),
        None => NormalizedFeature::defaulted(name, NEUTRAL),
    }
}

/// Recent win rate of the team, draws counting as half a win
pub fn team_dynamics(schedule: &[ScheduleEntry]) -> NormalizedFeature {
    let decided: Vec<GameOutcome> = schedule
        .iter()
        .filter_map(|entry| entry.result)
        .take(TEAM_FORM_GAMES)
        .collect();

    if decided.len() < TEAM_FORM_MIN_GAMES {
        return NormalizedFeature::defaulted(FeatureName::TeamDynamics, NEUTRAL);
    }

    let points: f64 = decided
        .iter()
        .map(|outcome| match outcome {
            GameOutcome::Win => 1.0,
            GameOutcome::Draw => 0.5,
            GameOutcome::Loss => 0.0,
        })
        .sum();

    NormalizedFeature::observed(FeatureName::TeamDynamics, points / decided.len() as f64)
}

/// Ratio of the last three games' output to the three before, capped at 2 then halved
pub fn recent_performance(lines: &[GameStatLine]) -> NormalizedFeature {
    if lines.len() < TREND_WINDOW * 2 {
        return NormalizedFeature::defaulted(FeatureName::RecentPerformance, NEUTRAL);
    }

    let output = |slice: &[GameStatLine]| {
        mean(slice.iter().map(|l| l.output.max(0.0))).unwrap_or(0.0)
    };
    let recent = output(&lines[..TREND_WINDOW]);
    let previous = output(&lines[TREND_WINDOW..TREND_WINDOW * 2]);

    let ratio = if previous > 0.0 {
        recent / previous
    } else if recent > 0.0 {
        2.0
    } else {
        1.0
    };

    NormalizedFeature::observed(FeatureName::RecentPerformance, ratio.min(2.0) / 2.0)
}

/// Pearson correlation between per-game minutes load and output
pub fn performance_correlation(lines: &[GameStatLine], sport: Sport) -> f64 {
    let sample: Vec<(f64, f64)> = lines
        .iter()
        .take(CORRELATION_GAMES)
        .filter(|l| l.minutes.is_finite() && l.output.is_finite())
        .map(|l| (l.minutes / sport.minutes_ceiling(), l.output))
        .collect();

    if sample.len() < 3 {
        return DEFAULT_PERFORMANCE_CORRELATION;
    }

    let n = sample.len() as f64;
    let mean_x = sample.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = sample.iter().map(|(_, y)| y).sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &sample {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }

    if var_x <= f64::EPSILON || var_y <= f64::EPSILON {
        return DEFAULT_PERFORMANCE_CORRELATION;
    }

    let r = cov / (var_x.sqrt() * var_y.sqrt());
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        DEFAULT_PERFORMANCE_CORRELATION
    }
}
