//! Infrastructure layer: wiring configuration into shared state.

pub mod state;

pub use state::{build_state, StateBuilder};
