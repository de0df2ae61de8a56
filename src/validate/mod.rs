//! Structural and type validation of pipeline input.

mod input;

pub use input::{validate_input, NeuronTrace, ValidatedInput, ValidationError};
