use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::bail;
use crate::error::{ErrorKind, EtlError, EtlResult};

/// Text format of a partition date.
const PARTITION_DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of a partition date written as `YYYY-MM-DD`.
const PARTITION_DATE_LEN: usize = 10;

/// The calendar day processed by one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionDate {
    date: NaiveDate,
    /// Midnight of the following day, computed once so that the bounds never overflow.
    end_of_day: NaiveDateTime,
}

impl PartitionDate {
    /// Fails with [`ErrorKind::InvalidPartitionDate`] for the last representable day, whose
    /// end cannot be expressed.
    pub fn new(date: NaiveDate) -> EtlResult<Self> {
        let Some(end_of_day) = date
            .and_time(NaiveTime::MIN)
            .checked_add_signed(TimeDelta::days(1))
        else {
            bail!(
                ErrorKind::InvalidPartitionDate,
                "Date is out of the supported range",
                format!("the day after {date} cannot be represented")
            );
        };

        Ok(Self { date, end_of_day })
    }

    /// Parses a date written exactly as `YYYY-MM-DD`.
    ///
    /// Inputs chrono would otherwise accept, like `2024-1-5` or `+262142-12-31`, are rejected
    /// as well.
    pub fn parse(input: &str) -> EtlResult<Self> {
        if !has_partition_date_shape(input) {
            bail!(
                ErrorKind::InvalidPartitionDate,
                "Date must be in YYYY-MM-DD format",
                format!("'{input}' is not shaped as YYYY-MM-DD")
            );
        }

        let date = NaiveDate::parse_from_str(input, PARTITION_DATE_FORMAT).map_err(|err| {
            EtlError::from((
                ErrorKind::InvalidPartitionDate,
                "Date must be in YYYY-MM-DD format",
                format!("'{input}' is not a valid date: {err}"),
            ))
            .with_source(err)
        })?;

        Self::new(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Midnight at the start of the day.
    pub fn start_of_day(&self) -> NaiveDateTime {
        self.date.and_time(NaiveTime::MIN)
    }

    /// Midnight at the start of the following day, the exclusive end of the partition.
    pub fn end_of_day(&self) -> NaiveDateTime {
        self.end_of_day
    }

    /// The range requested from the raw data source, whose `end` bound is inclusive.
    ///
    /// Last second of the day is used as end, so observations stamped at the next midnight
    /// belong to the next partition.
    pub fn fetch_range(&self) -> (NaiveDateTime, NaiveDateTime) {
        (
            self.start_of_day(),
            self.end_of_day() - TimeDelta::seconds(1),
        )
    }

    /// Returns `true` if `timestamp` falls within `[start of day, start of next day)`.
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        timestamp >= self.start_of_day() && timestamp < self.end_of_day()
    }
}

impl FromStr for PartitionDate {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PartitionDate::parse(s)
    }
}

impl fmt::Display for PartitionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.date.format(PARTITION_DATE_FORMAT))
    }
}

/// Four digits, a dash, two digits, a dash and two digits, all ASCII.
fn has_partition_date_shape(input: &str) -> bool {
    let bytes = input.as_bytes();

    bytes.len() == PARTITION_DATE_LEN
        && bytes.iter().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => *byte == b'-',
            _ => byte.is_ascii_digit(),
        })
}
