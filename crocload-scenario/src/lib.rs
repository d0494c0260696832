//! Load scenario for the crocodiles demo API
//!
//! Setup registers and logs in a fixed user once. Every iteration then walks
//! three groups (public endpoints, create, listing) and pauses for the
//! configured pacing interval.

pub mod assertions;
pub mod flows;
pub mod scenario;

pub use flows::Session;
pub use scenario::CrocodileScenario;
