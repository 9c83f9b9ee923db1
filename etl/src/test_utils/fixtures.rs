use chrono::{NaiveDateTime, TimeDelta};

use crate::types::{PartitionDate, RawObservation};

/// Date used by the fixtures unless stated otherwise.
pub const TEST_DATE: &str = "2024-01-15";

pub fn test_date() -> PartitionDate {
    PartitionDate::parse(TEST_DATE).expect("fixture date should be valid")
}

/// Instant `hour:minute:second` of `date`.
pub fn at(date: PartitionDate, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    date.start_of_day()
        + TimeDelta::hours(hour.into())
        + TimeDelta::minutes(minute.into())
        + TimeDelta::seconds(second.into())
}

/// An observation carrying both default variables.
pub fn wind_observation(timestamp: NaiveDateTime, wind_speed: f64, power: f64) -> RawObservation {
    RawObservation::new(timestamp)
        .with_value("wind_speed", wind_speed)
        .with_value("power", power)
}

/// 144 one-minute observations starting at midnight, only the first ten carrying values.
///
/// Resampled with 10 minute windows, this yields a single populated window at `00:00`.
pub fn sparse_morning(date: PartitionDate) -> Vec<RawObservation> {
    (0..144)
        .map(|minute| {
            let timestamp = date.start_of_day() + TimeDelta::minutes(minute);
            if minute < 10 {
                let offset = minute as f64;
                wind_observation(timestamp, 10.0 + offset, 100.0 + offset * 5.0)
            } else {
                RawObservation::new(timestamp)
            }
        })
        .collect()
}

/// One observation per minute over the whole day, with values derived from the minute.
pub fn full_day(date: PartitionDate) -> Vec<RawObservation> {
    (0..24 * 60)
        .map(|minute| {
            let timestamp = date.start_of_day() + TimeDelta::minutes(minute);
            let offset = (minute % 10) as f64;
            wind_observation(timestamp, 8.0 + offset, 200.0 + offset * 2.0)
        })
        .collect()
}
