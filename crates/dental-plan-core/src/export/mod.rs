//! Export functionality for treatment orders.

mod order;

pub use order::*;
