use chrono::{DateTime, Utc};

pub const FATIGUE_MODEL: &str = "fatigue";
pub const INJURY_RISK_MODEL: &str = "injury_risk";
pub const PSYCHOLOGICAL_MODEL: &str = "psychological";
pub const ENVIRONMENTAL_MODEL: &str = "environmental";

/// Key for a report computed over a lookback window ending at `as_of`
pub fn lookback_key(model: &str, subject_id: &str, as_of: DateTime<Utc>, days: u32) -> String {
    format!(
        "score:{}:{}:{}:{}d",
        model,
        subject_id,
        as_of.timestamp_millis(),
        days
    )
}

/// Key for a report tied to one game, as seen from `as_of`
pub fn game_key(model: &str, subject_id: &str, game_id: &str, as_of: DateTime<Utc>) -> String {
    format!(
        "score:{}:{}:game-{}:{}",
        model,
        subject_id,
        game_id,
        as_of.timestamp_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn lookback_keys_differ_by_window() {
        let as_of = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let week = lookback_key(FATIGUE_MODEL, "p-1", as_of, 7);
        let month = lookback_key(FATIGUE_MODEL, "p-1", as_of, 28);

        assert_ne!(week, month);
        assert!(week.starts_with("score:fatigue:p-1:"));
        assert!(week.ends_with(":7d"));
    }

    #[test]
    fn game_key_format() {
        let as_of = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            game_key(ENVIRONMENTAL_MODEL, "p-1", "g-7", as_of),
            format!("score:environmental:p-1:game-g-7:{}", as_of.timestamp_millis())
        );
    }

    #[test]
    fn game_keys_differ_by_as_of() {
        let morning = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 3, 1, 19, 0, 0).unwrap();

        assert_ne!(
            game_key(ENVIRONMENTAL_MODEL, "p-1", "g-7", morning),
            game_key(ENVIRONMENTAL_MODEL, "p-1", "g-7", evening)
        );
    }
}
