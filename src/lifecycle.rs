//! Ride and join-request lifecycle rules.
//!
//! All status vocabulary lives in the entity enums; this module owns the
//! permitted transitions and the seat accounting that goes with them.
//! Handlers enforce these rules in the database with conditional updates
//! filtered on the expected current state, so a lost race shows up as
//! zero affected rows and is reported as a conflict instead of being
//! applied twice.

use crate::entities::join_request::JoinRequestStatus;
use crate::entities::ride::RideStatus;
use crate::error::{AppError, AppResult};

impl RideStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RideStatus::Requested => "requested",
            RideStatus::Accepted => "accepted",
            RideStatus::Arrived => "arrived",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    /// UI-facing label. Several frontend screens historically used their
    /// own vocabulary for the same lifecycle; this is the single mapping.
    pub fn display_label(self) -> &'static str {
        match self {
            RideStatus::Requested => "searching_driver",
            RideStatus::Accepted => "driver_assigned",
            RideStatus::Arrived => "driver_arrived",
            RideStatus::InProgress => "in_progress",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// The only state a forward step may leave from. `Requested` is the
    /// entry state and `Cancelled` is reachable from any non-terminal
    /// state, so neither has a single predecessor.
    pub fn required_predecessor(self) -> Option<RideStatus> {
        match self {
            RideStatus::Requested | RideStatus::Cancelled => None,
            RideStatus::Accepted => Some(RideStatus::Requested),
            RideStatus::Arrived => Some(RideStatus::Accepted),
            RideStatus::InProgress => Some(RideStatus::Arrived),
            RideStatus::Completed => Some(RideStatus::InProgress),
        }
    }

    pub fn can_transition_to(self, next: RideStatus) -> bool {
        if next == RideStatus::Cancelled {
            return !self.is_terminal();
        }
        next.required_predecessor() == Some(self)
    }

    /// An offer accepts new join requests only before the driver sets off.
    pub fn is_joinable(self) -> bool {
        matches!(self, RideStatus::Requested | RideStatus::Accepted)
    }
}

impl JoinRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinRequestStatus::Pending => "pending",
            JoinRequestStatus::Accepted => "accepted",
            JoinRequestStatus::Rejected => "rejected",
            JoinRequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(self, next: JoinRequestStatus) -> bool {
        match (self, next) {
            (JoinRequestStatus::Pending, JoinRequestStatus::Accepted)
            | (JoinRequestStatus::Pending, JoinRequestStatus::Rejected)
            | (JoinRequestStatus::Pending, JoinRequestStatus::Cancelled)
            | (JoinRequestStatus::Accepted, JoinRequestStatus::Cancelled) => true,
            _ => false,
        }
    }
}

pub fn ensure_ride_transition(from: RideStatus, to: RideStatus) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Cannot move ride from {} to {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

pub fn ensure_join_transition(from: JoinRequestStatus, to: JoinRequestStatus) -> AppResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(AppError::Conflict(format!(
            "Cannot move join request from {} to {}",
            from.as_str(),
            to.as_str()
        )))
    }
}

/// Validate a passenger's seat request against an offer's remaining
/// capacity. A non-positive count is a malformed request; exceeding the
/// remaining seats is a capacity conflict.
pub fn check_requested_seats(seats: i32, available: i32) -> AppResult<()> {
    if seats <= 0 {
        return Err(AppError::BadRequest(
            "Must request at least 1 seat".to_string(),
        ));
    }
    if seats > available {
        return Err(AppError::Conflict(format!(
            "Only {} seats available",
            available
        )));
    }
    Ok(())
}

/// Remaining seats after accepting a request. Mirrors the conditional
/// decrement the handlers run in SQL.
pub fn seats_after_accept(available: i32, seats: i32) -> AppResult<i32> {
    check_requested_seats(seats, available)?;
    Ok(available - seats)
}

/// Remaining seats after a previously accepted request is cancelled.
pub fn seats_after_restore(available: i32, seats: i32) -> i32 {
    available + seats
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Iterable;

    #[test]
    fn forward_transitions_follow_lifecycle_order() {
        assert!(RideStatus::Requested.can_transition_to(RideStatus::Accepted));
        assert!(RideStatus::Accepted.can_transition_to(RideStatus::Arrived));
        assert!(RideStatus::Arrived.can_transition_to(RideStatus::InProgress));
        assert!(RideStatus::InProgress.can_transition_to(RideStatus::Completed));
    }

    #[test]
    fn only_the_listed_next_state_is_reachable() {
        for from in RideStatus::iter() {
            for to in RideStatus::iter() {
                let allowed = from.can_transition_to(to);
                let expected = (to == RideStatus::Cancelled && !from.is_terminal())
                    || to.required_predecessor() == Some(from);
                assert_eq!(allowed, expected, "{:?} -> {:?}", from, to);
            }
        }
    }

    #[test]
    fn cancel_is_reachable_from_any_non_terminal_state() {
        for from in [
            RideStatus::Requested,
            RideStatus::Accepted,
            RideStatus::Arrived,
            RideStatus::InProgress,
        ] {
            assert!(from.can_transition_to(RideStatus::Cancelled));
        }
        assert!(!RideStatus::Completed.can_transition_to(RideStatus::Cancelled));
        assert!(!RideStatus::Cancelled.can_transition_to(RideStatus::Cancelled));
    }

    #[test]
    fn completing_a_requested_ride_is_rejected() {
        assert!(ensure_ride_transition(RideStatus::Requested, RideStatus::Completed).is_err());
        assert!(ensure_ride_transition(RideStatus::Requested, RideStatus::InProgress).is_err());
        assert!(ensure_ride_transition(RideStatus::InProgress, RideStatus::Completed).is_ok());
    }

    #[test]
    fn join_request_transitions() {
        use JoinRequestStatus::*;

        assert!(Pending.can_transition_to(Accepted));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Accepted.can_transition_to(Cancelled));

        assert!(!Accepted.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Accepted));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn seat_request_bounds() {
        assert!(check_requested_seats(1, 3).is_ok());
        assert!(check_requested_seats(3, 3).is_ok());
        assert!(check_requested_seats(0, 3).is_err());
        assert!(check_requested_seats(-1, 3).is_err());
        assert!(check_requested_seats(4, 3).is_err());
    }

    #[test]
    fn accept_then_restore_is_a_round_trip() {
        let after = seats_after_accept(3, 2).unwrap();
        assert_eq!(after, 1);
        assert_eq!(seats_after_restore(after, 2), 3);
    }

    #[test]
    fn seats_never_go_negative() {
        let mut available = 3;
        for _ in 0..3 {
            available = seats_after_accept(available, 1).unwrap();
        }
        assert_eq!(available, 0);
        assert!(seats_after_accept(available, 1).is_err());
    }

    #[test]
    fn display_labels_map_from_canonical_status() {
        assert_eq!(RideStatus::Requested.display_label(), "searching_driver");
        assert_eq!(RideStatus::Accepted.display_label(), "driver_assigned");
        assert_eq!(RideStatus::Arrived.display_label(), "driver_arrived");
        assert_eq!(RideStatus::InProgress.display_label(), "in_progress");
    }
}
