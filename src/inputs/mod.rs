//! Default assumptions and the override resolution layer

pub mod defaults;
pub mod overrides;

pub use defaults::{DefaultInputs, EwmaParams};
pub use overrides::{InputSource, OverrideManager, OverrideSet, TrackedMap, TrackedValue};
