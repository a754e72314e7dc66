//! Domain models for dental treatment plans.

mod assignment;
mod plan;
mod service;
mod tooth;

pub use assignment::*;
pub use plan::*;
pub use service::*;
pub use tooth::*;
