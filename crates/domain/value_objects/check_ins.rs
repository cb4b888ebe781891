use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    entities::check_ins::CheckInEntity, value_objects::enums::visit_intents::VisitIntent,
};

/// A visit is open until it is checked out. `Open -> Closed` is the only legal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    Open,
    Closed { checked_out_at: DateTime<Utc> },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VisitTransitionError {
    #[error("visit is already closed")]
    AlreadyClosed,
    #[error("check-out time precedes check-in time")]
    CheckOutBeforeCheckIn,
}

impl VisitState {
    pub fn is_open(&self) -> bool {
        matches!(self, VisitState::Open)
    }

    /// Intent the next QR token should carry for a member in this state.
    pub fn next_intent(current: Option<&VisitState>) -> VisitIntent {
        match current {
            Some(VisitState::Open) => VisitIntent::CheckOut,
            _ => VisitIntent::CheckIn,
        }
    }

    pub fn close(
        self,
        checked_in_at: DateTime<Utc>,
        checked_out_at: DateTime<Utc>,
    ) -> Result<VisitState, VisitTransitionError> {
        match self {
            VisitState::Closed { .. } => Err(VisitTransitionError::AlreadyClosed),
            VisitState::Open if checked_out_at < checked_in_at => {
                Err(VisitTransitionError::CheckOutBeforeCheckIn)
            }
            VisitState::Open => Ok(VisitState::Closed { checked_out_at }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QrTokenDto {
    pub token: String,
    pub intent: VisitIntent,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScanOutcome {
    CheckedIn {
        check_in_id: Uuid,
        member_id: Uuid,
        branch_id: Uuid,
        checked_in_at: DateTime<Utc>,
    },
    CheckedOut {
        check_in_id: Uuid,
        member_id: Uuid,
        checked_out_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct VisitDto {
    pub id: Uuid,
    pub member_id: Uuid,
    pub branch_id: Uuid,
    pub check_in_time: DateTime<Utc>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub method: String,
    pub open: bool,
}

impl From<CheckInEntity> for VisitDto {
    fn from(value: CheckInEntity) -> Self {
        let open = value.state().is_open();
        Self {
            id: value.id,
            member_id: value.member_id,
            branch_id: value.branch_id,
            check_in_time: value.check_in_time,
            check_out_time: value.check_out_time,
            method: value.method,
            open,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceDayDto {
    pub date: NaiveDate,
    pub attended: bool,
    pub duration_hours: f64,
}

/// One entry per calendar day (UTC) in `from..=to`. Visits count towards the day they
/// started on; a visit that is still open adds no duration.
pub fn attendance_by_day(
    visits: &[CheckInEntity],
    from: NaiveDate,
    to: NaiveDate,
) -> Vec<AttendanceDayDto> {
    let mut seconds_by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for visit in visits {
        let seconds = visit
            .check_out_time
            .map(|checked_out_at| (checked_out_at - visit.check_in_time).num_seconds().max(0))
            .unwrap_or(0);
        *seconds_by_day
            .entry(visit.check_in_time.date_naive())
            .or_insert(0) += seconds;
    }

    from.iter_days()
        .take_while(|day| *day <= to)
        .map(|day| {
            let seconds = seconds_by_day.get(&day).copied();
            AttendanceDayDto {
                date: day,
                attended: seconds.is_some(),
                duration_hours: seconds
                    .map(|seconds| (seconds as f64 / 36.0).round() / 100.0)
                    .unwrap_or(0.0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn open_visit_closes_once() {
        let checked_in_at = Utc::now();
        let checked_out_at = checked_in_at + Duration::minutes(45);

        let closed = VisitState::Open
            .close(checked_in_at, checked_out_at)
            .unwrap();
        assert_eq!(closed, VisitState::Closed { checked_out_at });

        let again = closed.close(checked_in_at, checked_out_at + Duration::minutes(1));
        assert_eq!(again, Err(VisitTransitionError::AlreadyClosed));
    }

    #[test]
    fn check_out_cannot_precede_check_in() {
        let checked_in_at = Utc::now();
        let result = VisitState::Open.close(checked_in_at, checked_in_at - Duration::seconds(1));
        assert_eq!(result, Err(VisitTransitionError::CheckOutBeforeCheckIn));
    }

    #[test]
    fn next_intent_follows_visit_state() {
        assert_eq!(VisitState::next_intent(None), VisitIntent::CheckIn);
        assert_eq!(
            VisitState::next_intent(Some(&VisitState::Open)),
            VisitIntent::CheckOut
        );
        assert_eq!(
            VisitState::next_intent(Some(&VisitState::Closed {
                checked_out_at: Utc::now()
            })),
            VisitIntent::CheckIn
        );
    }

    fn visit(check_in_time: DateTime<Utc>, minutes: Option<i64>) -> CheckInEntity {
        CheckInEntity {
            id: Uuid::new_v4(),
            member_id: Uuid::nil(),
            subscription_id: Uuid::nil(),
            branch_id: Uuid::nil(),
            check_in_time,
            check_out_time: minutes.map(|minutes| check_in_time + Duration::minutes(minutes)),
            method: "qr".to_string(),
        }
    }

    #[test]
    fn attendance_covers_every_day_in_range() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let morning = Utc.with_ymd_and_hms(2024, 3, 2, 7, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2024, 3, 2, 18, 0, 0).unwrap();
        let open = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();

        let days = attendance_by_day(
            &[visit(morning, Some(90)), visit(evening, Some(45)), visit(open, None)],
            from,
            to,
        );

        assert_eq!(days.len(), 4);
        assert!(!days[0].attended);
        assert_eq!(days[0].duration_hours, 0.0);
        assert!(days[1].attended);
        assert_eq!(days[1].duration_hours, 2.25);
        assert!(!days[2].attended);
        assert!(days[3].attended);
        assert_eq!(days[3].duration_hours, 0.0);
    }
}
