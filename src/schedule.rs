//! Interval arithmetic behind booking: overlap checks, day windows and slots.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};

use crate::models::Appointment;

pub const SERVICE_MINUTES: i64 = 60;

pub fn service_duration() -> Duration {
    Duration::minutes(SERVICE_MINUTES)
}

/// Half-open time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// A single service slot starting at `start`.
    pub fn slot(start: DateTime<Utc>) -> Self {
        Self::new(start, start + service_duration())
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl From<&Appointment> for Interval {
    fn from(appt: &Appointment) -> Self {
        Interval::new(appt.start_time, appt.end_time)
    }
}

/// First booked appointment that collides with `candidate`, if any.
pub fn first_conflict<'a>(
    booked: &'a [Appointment],
    candidate: &Interval,
) -> Option<&'a Appointment> {
    booked
        .iter()
        .find(|appt| Interval::from(*appt).overlaps(candidate))
}

/// UTC bounds of a salon-local calendar day.
pub fn day_window(day: NaiveDate, offset: FixedOffset) -> Interval {
    let start = local_instant(day, NaiveTime::MIN, offset);
    Interval::new(start, start + Duration::days(1))
}

fn local_instant(day: NaiveDate, time: NaiveTime, offset: FixedOffset) -> DateTime<Utc> {
    // Fixed offsets have no gaps or folds, so the local time always maps to one instant.
    offset
        .from_local_datetime(&day.and_time(time))
        .single()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| day.and_time(time).and_utc())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessHours {
    pub open_hour: u32,
    /// Last slot must end by this hour.
    pub close_hour: u32,
    pub closed_days: Vec<Weekday>,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            open_hour: 10,
            close_hour: 18,
            closed_days: vec![Weekday::Sun],
        }
    }
}

impl BusinessHours {
    pub fn new(open_hour: u32, close_hour: u32) -> Option<Self> {
        if open_hour >= close_hour || close_hour > 24 {
            return None;
        }
        Some(Self {
            open_hour,
            close_hour,
            ..Self::default()
        })
    }

    pub fn is_open_on(&self, day: NaiveDate) -> bool {
        !self.closed_days.contains(&day.weekday())
    }

    /// Hourly slot starts for `day`, each ending no later than closing time.
    pub fn slot_starts(&self, day: NaiveDate, offset: FixedOffset) -> Vec<DateTime<Utc>> {
        if !self.is_open_on(day) {
            return Vec::new();
        }
        let midnight = local_instant(day, NaiveTime::MIN, offset);
        let opening = midnight + Duration::hours(i64::from(self.open_hour));
        let closing = midnight + Duration::hours(i64::from(self.close_hour));

        let mut starts = Vec::new();
        let mut cursor = opening;
        while cursor + service_duration() <= closing {
            starts.push(cursor);
            cursor += service_duration();
        }
        starts
    }
}

/// Slot starts on `day` that do not collide with anything in `booked`.
pub fn free_slots(
    hours: &BusinessHours,
    day: NaiveDate,
    offset: FixedOffset,
    booked: &[Appointment],
) -> Vec<DateTime<Utc>> {
    hours
        .slot_starts(day, offset)
        .into_iter()
        .filter(|start| first_conflict(booked, &Interval::slot(*start)).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2022, 5, 12)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
            .and_utc()
    }

    fn booked(start: DateTime<Utc>) -> Appointment {
        Appointment {
            id: "a".into(),
            customer_id: "c".into(),
            hairdresser_id: "h".into(),
            start_time: start,
            end_time: start + service_duration(),
            service: "coloronly".into(),
            comments: String::new(),
            price: 45.0,
        }
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let noon = Interval::slot(at(12, 0));
        let one = Interval::slot(at(13, 0));
        assert!(!noon.overlaps(&one));
        assert!(!one.overlaps(&noon));
    }

    #[test]
    fn partial_and_nested_overlap() {
        let noon = Interval::slot(at(12, 0));
        assert!(noon.overlaps(&Interval::slot(at(12, 30))));
        assert!(noon.overlaps(&Interval::new(at(12, 15), at(12, 45))));
        assert!(noon.overlaps(&Interval::new(at(11, 0), at(14, 0))));
        assert!(noon.overlaps(&noon));
    }

    #[test]
    fn conflict_lookup_returns_colliding_booking() {
        let list = vec![booked(at(10, 0)), booked(at(14, 0))];
        let hit = first_conflict(&list, &Interval::slot(at(14, 30))).unwrap();
        assert_eq!(hit.start_time, at(14, 0));
        assert!(first_conflict(&list, &Interval::slot(at(11, 0))).is_none());
    }

    #[test]
    fn day_window_follows_offset() {
        let day = NaiveDate::from_ymd_opt(2022, 5, 12).unwrap();
        let edt = FixedOffset::west_opt(4 * 3600).unwrap();
        let window = day_window(day, edt);
        assert_eq!(window.start, at(4, 0));
        assert_eq!(window.end - window.start, Duration::days(1));
    }

    #[test]
    fn slots_cover_opening_hours() {
        let hours = BusinessHours::default();
        let thursday = NaiveDate::from_ymd_opt(2022, 5, 12).unwrap();
        let starts = hours.slot_starts(thursday, FixedOffset::east_opt(0).unwrap());
        assert_eq!(starts.len(), 8);
        assert_eq!(starts[0], at(10, 0));
        assert_eq!(*starts.last().unwrap(), at(17, 0));
    }

    #[test]
    fn closed_on_sunday() {
        let hours = BusinessHours::default();
        let sunday = NaiveDate::from_ymd_opt(2022, 5, 15).unwrap();
        assert!(hours.slot_starts(sunday, FixedOffset::east_opt(0).unwrap()).is_empty());
    }

    #[test]
    fn free_slots_skip_bookings() {
        let hours = BusinessHours::default();
        let day = NaiveDate::from_ymd_opt(2022, 5, 12).unwrap();
        let list = vec![booked(at(12, 0)), booked(at(14, 30))];
        let free = free_slots(&hours, day, FixedOffset::east_opt(0).unwrap(), &list);
        assert!(!free.contains(&at(12, 0)));
        assert!(!free.contains(&at(14, 0)));
        assert!(!free.contains(&at(15, 0)));
        assert!(free.contains(&at(13, 0)));
        assert_eq!(free.len(), 5);
    }

    #[test]
    fn invalid_hours_are_rejected() {
        assert!(BusinessHours::new(18, 10).is_none());
        assert!(BusinessHours::new(9, 25).is_none());
        assert_eq!(BusinessHours::new(9, 17).unwrap().closed_days, vec![Weekday::Sun]);
    }

    proptest! {
        #[test]
        fn overlap_is_commutative(
            a in 0i64..100_000,
            al in 1i64..10_000,
            b in 0i64..100_000,
            bl in 1i64..10_000,
        ) {
            let base = at(0, 0);
            let x = Interval::new(base + Duration::seconds(a), base + Duration::seconds(a + al));
            let y = Interval::new(base + Duration::seconds(b), base + Duration::seconds(b + bl));
            prop_assert_eq!(x.overlaps(&y), y.overlaps(&x));
        }
    }
}
