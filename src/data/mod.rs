//! Data structures for epoch-conditioned spike counting.

mod parameters;
mod result;
mod table;

pub use parameters::{Parameters, SAMPLE_RATE_KEY, THRESHOLD_KEY};
pub use result::{Condition, SpikeCounts};
pub use table::{
    TraceTable, Value, EPOCH_COLUMNS, LIGHT_COLUMN, REWARD_COLUMN, TRIAL_COLUMN,
};
