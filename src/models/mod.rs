//! The Dynamic Fractal Model.
//!
//! Models are implemented as small, pure functions so that analysis code can
//! stay generic. All tunable literals live in `constants`.

pub mod constants;
pub mod model;

pub use model::*;
