//! Solar PV and storage sizing: energy balance simulation, techno-economic metrics,
//! and the bounded search for the best design.

pub mod core;
pub mod error;
pub mod optimiser;
pub mod prelude;
pub mod profile;
pub mod quantity;
pub mod study;

pub use crate::{
    error::Error,
    study::{OptimisationResult, Study},
};
