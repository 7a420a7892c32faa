use crate::time_of_day::TimeOfDay;
use chrono::{prelude::*, Duration, LocalResult};
use chrono_tz::Tz;

/// Resolves a wall clock date and time in `tz` to a timestamp in millis.
///
/// Ambiguous times (clocks turned back) resolve to the earliest instant and
/// times that fall in a gap (clocks turned forward) are moved one hour ahead.
pub fn local_to_timestamp_millis(tz: &Tz, date: NaiveDate, time: TimeOfDay) -> Option<i64> {
    let naive = date.and_time(time.to_naive_time());
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.timestamp_millis()),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.timestamp_millis()),
        LocalResult::None => tz
            .from_local_datetime(&(naive + Duration::hours(1)))
            .earliest()
            .map(|dt| dt.timestamp_millis()),
    }
}

pub fn timestamp_to_local(tz: &Tz, millis: i64) -> Option<DateTime<Tz>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.with_timezone(tz))
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono_tz::{Europe::Oslo, UTC};

    #[test]
    fn it_resolves_plain_local_times() {
        let date = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        let ts = local_to_timestamp_millis(&UTC, date, TimeOfDay::new(9, 0).unwrap()).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2021, 6, 1, 9, 0, 0).unwrap().timestamp_millis());

        // Oslo is UTC+2 in the summer
        let ts = local_to_timestamp_millis(&Oslo, date, TimeOfDay::new(9, 0).unwrap()).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2021, 6, 1, 7, 0, 0).unwrap().timestamp_millis());
    }

    #[test]
    fn it_moves_times_in_dst_gap_forward() {
        // 02:30 does not exist in Oslo on 2021-03-28
        let date = NaiveDate::from_ymd_opt(2021, 3, 28).unwrap();
        let ts = local_to_timestamp_millis(&Oslo, date, TimeOfDay::new(2, 30).unwrap()).unwrap();
        let local = timestamp_to_local(&Oslo, ts).unwrap();
        assert_eq!(local.hour(), 3);
        assert_eq!(local.minute(), 30);
    }

    #[test]
    fn it_picks_earliest_on_ambiguous_times() {
        // 02:30 happens twice in Oslo on 2021-10-31
        let date = NaiveDate::from_ymd_opt(2021, 10, 31).unwrap();
        let ts = local_to_timestamp_millis(&Oslo, date, TimeOfDay::new(2, 30).unwrap()).unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2021, 10, 31, 0, 30, 0).unwrap().timestamp_millis());
    }
}
