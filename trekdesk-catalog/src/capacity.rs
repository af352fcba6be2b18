use serde::{Deserialize, Serialize};
use trekdesk_core::CoreError;
use trekdesk_shared::{Batch, BatchUpdate};

/// Derived capacity figures of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacitySnapshot {
    pub max_participants: i32,
    pub current_participants: i32,
    pub reserved_slots: i32,
    /// Capacity not taken by real participants
    pub remaining: i32,
    pub available_slots: i32,
    pub is_full: bool,
    pub marked_as_full: bool,
}

/// Slot arithmetic over `(maxParticipants, currentParticipants, reservedSlots)`.
///
/// Invariant kept by every mutating operation:
/// `0 <= reserved_slots <= max_participants - current_participants`.
/// Each operation returns the `updateBatch` payload describing the change.
pub struct BatchCapacity;

impl BatchCapacity {
    pub fn snapshot(max_participants: i32, current_participants: i32, reserved_slots: i32) -> CapacitySnapshot {
        let remaining = (max_participants - current_participants).max(0);
        let available_slots = (remaining - reserved_slots).max(0);

        CapacitySnapshot {
            max_participants,
            current_participants,
            reserved_slots,
            remaining,
            available_slots,
            is_full: available_slots <= 0,
            // Unclamped: an over-booked batch is full, not marked full
            marked_as_full: reserved_slots == max_participants - current_participants,
        }
    }

    pub fn of(batch: &Batch) -> CapacitySnapshot {
        Self::snapshot(batch.max_participants, batch.current_participants, batch.reserved_slots)
    }

    pub fn remaining(batch: &Batch) -> i32 {
        Self::of(batch).remaining
    }

    pub fn available_slots(batch: &Batch) -> i32 {
        Self::of(batch).available_slots
    }

    pub fn is_full(batch: &Batch) -> bool {
        Self::of(batch).is_full
    }

    /// All remaining capacity is reserved rather than booked.
    ///
    /// This cannot tell an explicit "mark as full" apart from a reservation
    /// that happens to equal the remaining capacity.
    pub fn was_marked_as_full(batch: &Batch) -> bool {
        Self::of(batch).marked_as_full
    }

    pub fn can_accommodate(batch: &Batch, participants: i32) -> bool {
        participants >= 0 && participants <= Self::available_slots(batch)
    }

    /// Reserve everything that is left without touching real participants
    pub fn mark_as_full(batch: &mut Batch) -> BatchUpdate {
        let update = BatchUpdate::reserved(Self::remaining(batch));
        batch.apply(&update);
        update
    }

    pub fn unmark_as_full(batch: &mut Batch) -> Result<BatchUpdate, CapacityError> {
        if !Self::was_marked_as_full(batch) {
            return Err(CapacityError::NotMarkedFull {
                reserved: batch.reserved_slots,
                remaining: Self::remaining(batch),
            });
        }

        let update = BatchUpdate::reserved(0);
        batch.apply(&update);
        Ok(update)
    }

    /// Set the reservation to exactly `slots`
    pub fn reserve_slots(batch: &mut Batch, slots: i32) -> Result<BatchUpdate, CapacityError> {
        if slots < 0 {
            return Err(CapacityError::NegativeReservation { requested: slots });
        }

        let remaining = Self::remaining(batch);
        if slots > remaining {
            return Err(CapacityError::ExceedsRemaining {
                requested: slots,
                remaining,
            });
        }

        let update = BatchUpdate::reserved(slots);
        batch.apply(&update);
        Ok(update)
    }

    /// Change the maximum. A reservation that no longer fits is clamped to
    /// the new remaining capacity and sent along in the same payload.
    pub fn update_max_participants(batch: &mut Batch, new_max: i32) -> Result<BatchUpdate, CapacityError> {
        if new_max < 1 {
            return Err(CapacityError::InvalidMaximum { requested: new_max });
        }
        if new_max < batch.current_participants {
            return Err(CapacityError::BelowCurrentParticipants {
                requested: new_max,
                current: batch.current_participants,
            });
        }

        let new_remaining = new_max - batch.current_participants;
        let mut update = BatchUpdate {
            reserved_slots: None,
            max_participants: Some(new_max),
        };
        if batch.reserved_slots > new_remaining {
            update.reserved_slots = Some(new_remaining);
        }

        batch.apply(&update);
        Ok(update)
    }
}

/// Rejected capacity changes. All of these are input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("Reserved slots cannot be negative (got {requested})")]
    NegativeReservation {
        requested: i32,
    },

    #[error("Cannot reserve {requested} slots: only {remaining} remaining")]
    ExceedsRemaining {
        requested: i32,
        remaining: i32,
    },

    #[error("Max participants must be at least 1 (got {requested})")]
    InvalidMaximum {
        requested: i32,
    },

    #[error("Max participants ({requested}) cannot be lower than current participants ({current})")]
    BelowCurrentParticipants {
        requested: i32,
        current: i32,
    },

    #[error("Batch is not marked as full: {reserved} reserved of {remaining} remaining")]
    NotMarkedFull {
        reserved: i32,
        remaining: i32,
    },
}

impl From<CapacityError> for CoreError {
    fn from(err: CapacityError) -> Self {
        CoreError::ValidationError(err.to_string())
    }
}


#[cfg(test)]
mod proptest_invariants {
    use super::*;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    prop_compose! {
        fn valid_capacity()(max in 1i32..500)(
            max in Just(max),
            current in 0..=max,
            reserved_seed in 0i32..500,
        ) -> (i32, i32, i32) {
            let remaining = max - current;
            let reserved = if remaining == 0 { 0 } else { reserved_seed % (remaining + 1) };
            (max, current, reserved)
        }
    }

    fn batch((max, current, reserved): (i32, i32, i32)) -> Batch {
        let start = Utc::now() + Duration::days(10);
        Batch {
            id: Uuid::new_v4(),
            trek_id: Uuid::new_v4(),
            start_date: start,
            end_date: start + Duration::days(3),
            price: 5_000,
            max_participants: max,
            current_participants: current,
            reserved_slots: reserved,
        }
    }

    proptest! {
        #[test]
        fn prop_available_slots_formula((max, current, reserved) in valid_capacity()) {
            let snapshot = BatchCapacity::snapshot(max, current, reserved);
            prop_assert_eq!(snapshot.available_slots, max - current - reserved);
            prop_assert!(snapshot.available_slots >= 0);
        }

        #[test]
        fn prop_mark_then_unmark_clears_reservation(caps in valid_capacity()) {
            let mut b = batch(caps);
            BatchCapacity::mark_as_full(&mut b);
            prop_assert_eq!(BatchCapacity::available_slots(&b), 0);
            prop_assert_eq!(b.current_participants, caps.1);

            BatchCapacity::unmark_as_full(&mut b).unwrap();
            prop_assert_eq!(b.reserved_slots, 0);
        }

        #[test]
        fn prop_reserve_boundary(caps in valid_capacity()) {
            let (max, current, _) = caps;
            let mut b = batch(caps);

            prop_assert!(BatchCapacity::reserve_slots(&mut b, max - current + 1).is_err());
            prop_assert!(BatchCapacity::reserve_slots(&mut b, max - current).is_ok());
            prop_assert_eq!(b.reserved_slots, max - current);
        }
    }
}
