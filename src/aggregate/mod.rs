//! Condition-indexed aggregation of spike events.

mod conditions;

pub use conditions::{count_by_condition, EpochMarkers};
