use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trekdesk_shared::RefundType;
use uuid::Uuid;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Tiered refund percentages by days left before departure.
///
/// Built with [`RefundPolicy::new`], which keeps both percentages within
/// 0..=100 and the late tier at or below the early one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPolicy {
    early_min_days: i64,
    early_percent: u8,
    late_min_days: i64,
    late_percent: u8,
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self {
            early_min_days: 7,
            early_percent: 90,
            late_min_days: 3,
            late_percent: 50,
        }
    }
}

impl RefundPolicy {
    /// More than `early_min_days` earns `early_percent`; at least
    /// `late_min_days` earns `late_percent`; anything less earns nothing.
    pub fn new(
        early_min_days: i64,
        early_percent: u8,
        late_min_days: i64,
        late_percent: u8,
    ) -> Result<Self, RefundError> {
        for (tier, percent) in [("early", early_percent), ("late", late_percent)] {
            if percent > 100 {
                return Err(RefundError::PercentOutOfRange { tier, percent });
            }
        }
        if late_min_days > early_min_days {
            return Err(RefundError::TiersOutOfOrder {
                early_min_days,
                late_min_days,
            });
        }

        Ok(Self {
            early_min_days,
            early_percent,
            late_min_days,
            late_percent,
        })
    }

    /// Whole days until departure, rounded up. Negative once departed.
    pub fn days_until_departure(batch_start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        let millis = (batch_start - now).num_milliseconds();
        -((-millis).div_euclid(MILLIS_PER_DAY))
    }

    pub fn percentage(&self, days_until_departure: i64) -> u8 {
        if days_until_departure > self.early_min_days {
            self.early_percent
        } else if days_until_departure >= self.late_min_days {
            self.late_percent
        } else {
            0
        }
    }

    /// Refund owed for cancelling a booking worth `total_price`.
    /// Percentages round down to the smallest currency unit.
    pub fn calculate_refund(
        &self,
        total_price: i64,
        batch_start: DateTime<Utc>,
        now: DateTime<Utc>,
        refund_type: RefundType,
    ) -> Result<i64, RefundError> {
        Ok(self.quote(Uuid::nil(), total_price, batch_start, now, refund_type)?.refund)
    }

    pub fn quote(
        &self,
        booking_id: Uuid,
        total_price: i64,
        batch_start: DateTime<Utc>,
        now: DateTime<Utc>,
        refund_type: RefundType,
    ) -> Result<RefundQuote, RefundError> {
        let days = Self::days_until_departure(batch_start, now);
        let percentage = match refund_type {
            RefundType::Full => 100,
            RefundType::Auto => self.percentage(days),
        };
        let refund = match refund_type {
            RefundType::Full => total_price,
            RefundType::Auto => {
                total_price
                    .checked_mul(i64::from(percentage))
                    .ok_or(RefundError::AmountOverflow { total_price })?
                    / 100
            }
        };

        Ok(RefundQuote {
            booking_id,
            total_price,
            refund,
            refund_type,
            days_until_departure: days,
            percentage,
        })
    }
}

/// Refund under the standard tiers
pub fn calculate_refund(
    total_price: i64,
    batch_start: DateTime<Utc>,
    now: DateTime<Utc>,
    refund_type: RefundType,
) -> Result<i64, RefundError> {
    RefundPolicy::default().calculate_refund(total_price, batch_start, now, refund_type)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundQuote {
    pub booking_id: Uuid,
    pub total_price: i64,
    pub refund: i64,
    pub refund_type: RefundType,
    pub days_until_departure: i64,
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefundError {
    #[error("Refund percentage for the {tier} tier must be at most 100 (got {percent})")]
    PercentOutOfRange {
        tier: &'static str,
        percent: u8,
    },

    #[error("Late refund tier ({late_min_days} days) cannot start after the early tier ({early_min_days} days)")]
    TiersOutOfOrder {
        early_min_days: i64,
        late_min_days: i64,
    },

    #[error("Refund for a booking worth {total_price} is out of range")]
    AmountOverflow {
        total_price: i64,
    },
}
