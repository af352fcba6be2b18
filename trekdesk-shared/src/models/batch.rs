use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A scheduled departure of a trek with its own dates, price and capacity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: Uuid,
    pub trek_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Price per participant, smallest currency unit
    pub price: i64,
    pub max_participants: i32,
    pub current_participants: i32,
    #[serde(default)]
    pub reserved_slots: i32,
}

impl Batch {
    /// Apply an update payload the way the backend would.
    pub fn apply(&mut self, update: &BatchUpdate) {
        if let Some(reserved) = update.reserved_slots {
            self.reserved_slots = reserved;
        }
        if let Some(max) = update.max_participants {
            self.max_participants = max;
        }
    }
}

/// Body of `updateBatch(trekId, batchId, ...)`. Absent fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_slots: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<i32>,
}

impl BatchUpdate {
    pub fn reserved(slots: i32) -> Self {
        Self {
            reserved_slots: Some(slots),
            max_participants: None,
        }
    }
}
