//! Test utilities and fixtures shared by unit, integration and property tests

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
