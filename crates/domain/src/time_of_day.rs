use chrono::NaiveTime;
use serde::{de::Visitor, Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Wall clock time within a day with minute resolution, written as `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hours: u32,
    minutes: u32,
}

#[derive(Error, Debug, PartialEq)]
pub enum InvalidTimeOfDayError {
    #[error("Time: `{0}` is not formatted as HH:MM between 00:00 and 23:59")]
    Malformed(String),
}

impl TimeOfDay {
    pub fn new(hours: u32, minutes: u32) -> Option<Self> {
        if hours < 24 && minutes < 60 {
            Some(Self { hours, minutes })
        } else {
            None
        }
    }

    pub fn from_minutes(minutes_of_day: u32) -> Option<Self> {
        Self::new(minutes_of_day / 60, minutes_of_day % 60)
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn minutes_of_day(&self) -> u32 {
        self.hours * 60 + self.minutes
    }

    pub fn to_naive_time(&self) -> NaiveTime {
        // Both fields are range checked at construction
        NaiveTime::from_hms_opt(self.hours, self.minutes, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(time: NaiveTime) -> Self {
        use chrono::Timelike;
        Self {
            hours: time.hour(),
            minutes: time.minute(),
        }
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hours, self.minutes)
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidTimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || InvalidTimeOfDayError::Malformed(s.to_string());
        let (hours, minutes) = s.split_once(':').ok_or_else(malformed)?;
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
            return Err(malformed());
        }
        if !all_digits(hours) || !all_digits(minutes) {
            return Err(malformed());
        }
        let hours = hours.parse::<u32>().map_err(|_| malformed())?;
        let minutes = minutes.parse::<u32>().map_err(|_| malformed())?;
        Self::new(hours, minutes).ok_or_else(malformed)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct TimeOfDayVisitor;

        impl<'de> Visitor<'de> for TimeOfDayVisitor {
            type Value = TimeOfDay;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("A time of day formatted as HH:MM")
            }

            fn visit_str<E>(self, value: &str) -> Result<TimeOfDay, E>
            where
                E: serde::de::Error,
            {
                value.parse::<TimeOfDay>().map_err(E::custom)
            }
        }

        deserializer.deserialize_str(TimeOfDayVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_accepts_valid_times() {
        let valid = vec![
            ("00:00", 0),
            ("9:05", 9 * 60 + 5),
            ("09:05", 9 * 60 + 5),
            ("19:59", 19 * 60 + 59),
            ("23:59", 23 * 60 + 59),
        ];
        for (time, minutes) in valid {
            let parsed = time.parse::<TimeOfDay>();
            assert!(parsed.is_ok(), "{} should be valid", time);
            assert_eq!(parsed.unwrap().minutes_of_day(), minutes);
        }
    }

    #[test]
    fn it_rejects_invalid_times() {
        let invalid = vec!["24:00", "12:60", "1:5", "123:00", "12-30", "", ":30", "ab:cd", "+1:30"];
        for time in invalid {
            assert!(time.parse::<TimeOfDay>().is_err(), "{} should be invalid", time);
        }
    }

    #[test]
    fn it_formats_with_padding() {
        let time = TimeOfDay::new(7, 5).unwrap();
        assert_eq!(time.to_string(), "07:05");
        assert_eq!(TimeOfDay::from_minutes(13 * 60 + 20).unwrap().to_string(), "13:20");
        assert!(TimeOfDay::from_minutes(MINUTES_PER_DAY).is_none());
    }

    #[test]
    fn it_orders_by_time_of_day() {
        let early = "08:59".parse::<TimeOfDay>().unwrap();
        let late = "09:00".parse::<TimeOfDay>().unwrap();
        assert!(early < late);
    }
}
