//! Tooth chart reconciliation.
//!
//! Keeps the tooth→services map, the completion status of each service and
//! the transient selection consistent across edits.
//!
//! Pipeline: Action → [`reduce`] → Transition (next state + events) → Session

mod reducer;
mod session;
mod state;
mod status;

pub use reducer::*;
pub use session::*;
pub use state::*;
pub use status::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{InvalidToothId, ServiceId, ToothPosition};

/// Chart errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("{0}")]
    InvalidToothId(#[from] InvalidToothId),

    #[error("No teeth selected for assignment")]
    NoTeethSelected,
}

pub type ChartResult<T> = Result<T, ChartError>;

/// A recoverable condition worth logging; the action was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartNotice {
    /// The (tooth, service) pair is not in the chart.
    NotAssigned {
        tooth: ToothPosition,
        service_id: ServiceId,
    },
}
