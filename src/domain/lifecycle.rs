//! Service request lifecycle.
//!
//! ```text
//! pending ──accept──▶ accepted ──▶ on_the_way ──▶ in_progress ──▶ completed
//!    │
//!    └──cancel (customer)──▶ cancelled
//! ```
//!
//! Every status write in the crate goes through [`transition`].

use crate::db::models::service_request::{ActorKind, RequestStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot move a request from {from} to {to}")]
    InvalidTransition { from: RequestStatus, to: RequestStatus },

    #[error("a {actor:?} may not move a request from {from} to {to}")]
    NotPermitted {
        from: RequestStatus,
        to: RequestStatus,
        actor: ActorKind,
    },
}

/// The single actor allowed to perform `from → to`, or `None` if the edge does not exist.
pub fn permitted_actor(from: RequestStatus, to: RequestStatus) -> Option<ActorKind> {
    use RequestStatus::*;

    match (from, to) {
        (Pending, Accepted)
        | (Accepted, OnTheWay)
        | (OnTheWay, InProgress)
        | (InProgress, Completed) => Some(ActorKind::Garage),
        (Pending, Cancelled) => Some(ActorKind::Customer),
        _ => None,
    }
}

/// Validate `current → requested` for `actor` and return the new status.
pub fn transition(
    current: RequestStatus,
    requested: RequestStatus,
    actor: ActorKind,
) -> Result<RequestStatus, TransitionError> {
    match permitted_actor(current, requested) {
        None => Err(TransitionError::InvalidTransition { from: current, to: requested }),
        Some(allowed) if allowed != actor => Err(TransitionError::NotPermitted {
            from: current,
            to: requested,
            actor,
        }),
        Some(_) => Ok(requested),
    }
}

/// The next forward step a garage can take from `current`.
pub fn next_garage_step(current: RequestStatus) -> Option<RequestStatus> {
    use RequestStatus::*;

    match current {
        Pending => Some(Accepted),
        Accepted => Some(OnTheWay),
        OnTheWay => Some(InProgress),
        InProgress => Some(Completed),
        Completed | Cancelled => None,
    }
}

/// Position along the forward chain; cancelled sits outside it.
pub fn progress_rank(status: RequestStatus) -> Option<u8> {
    use RequestStatus::*;

    match status {
        Pending => Some(0),
        Accepted => Some(1),
        OnTheWay => Some(2),
        InProgress => Some(3),
        Completed => Some(4),
        Cancelled => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestStatus::*;

    const ALL: [RequestStatus; 6] = [Pending, Accepted, OnTheWay, InProgress, Completed, Cancelled];

    #[test]
    fn garage_walks_the_forward_chain() {
        let mut status = Pending;
        while let Some(next) = next_garage_step(status) {
            status = transition(status, next, ActorKind::Garage).unwrap();
        }
        assert_eq!(status, Completed);
    }

    #[test]
    fn customer_can_only_cancel_pending() {
        assert_eq!(transition(Pending, Cancelled, ActorKind::Customer), Ok(Cancelled));

        for from in [Accepted, OnTheWay, InProgress, Completed, Cancelled] {
            assert_eq!(
                transition(from, Cancelled, ActorKind::Customer),
                Err(TransitionError::InvalidTransition { from, to: Cancelled })
            );
        }
    }

    #[test]
    fn actors_cannot_take_each_others_edges() {
        assert!(matches!(
            transition(Pending, Cancelled, ActorKind::Garage),
            Err(TransitionError::NotPermitted { .. })
        ));
        assert!(matches!(
            transition(Accepted, OnTheWay, ActorKind::Customer),
            Err(TransitionError::NotPermitted { .. })
        ));
        assert!(matches!(
            transition(Pending, Accepted, ActorKind::Customer),
            Err(TransitionError::NotPermitted { .. })
        ));
    }

    #[test]
    fn status_never_moves_backward_or_skips() {
        for from in ALL {
            for to in ALL {
                let accepted = [ActorKind::Customer, ActorKind::Garage]
                    .into_iter()
                    .any(|actor| transition(from, to, actor).is_ok());
                if !accepted {
                    continue;
                }
                match (progress_rank(from), progress_rank(to)) {
                    (Some(a), Some(b)) => assert_eq!(b, a + 1, "{from} -> {to} is not one step forward"),
                    (Some(_), None) => assert_eq!((from, to), (Pending, Cancelled)),
                    _ => panic!("unexpected transition {from} -> {to}"),
                }
            }
        }
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [Completed, Cancelled] {
            for to in ALL {
                assert!(permitted_actor(from, to).is_none());
            }
            assert!(next_garage_step(from).is_none());
        }
    }

    #[test]
    fn self_transitions_are_rejected() {
        for status in ALL {
            assert!(transition(status, status, ActorKind::Garage).is_err());
            assert!(transition(status, status, ActorKind::Customer).is_err());
        }
    }
}
