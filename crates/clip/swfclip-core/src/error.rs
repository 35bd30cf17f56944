//! Error taxonomy and the anomaly log.
//!
//! Most conversion errors are recoverable: the offending edit or keyframe is
//! dropped, the error is logged and recorded as an [`Anomaly`], and the run
//! continues. Only [`ConvertError::is_fatal`] errors abort a conversion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curve::Channel;
use crate::ids::{ObjectId, OccupantId, SlotId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConvertError {
    #[error("unknown occupant {0} placed at {1}")]
    UnknownOccupant(OccupantId, SlotId),
    #[error("malformed edit at {slot}: {reason}")]
    MalformedEdit { slot: SlotId, reason: String },
    #[error("no curve found for object {object} with channel {channel:?}")]
    MissingCurveTarget { object: ObjectId, channel: Channel },
    #[error("no scene object for {0}")]
    UnresolvedSlot(SlotId),
    #[error("curve targets unknown object {0}")]
    UnknownObject(ObjectId),
    #[error("invalid document: {0}")]
    InvalidDocument(String),
    #[error("document parse error: {0}")]
    Parse(String),
    #[error("clip template: {0}")]
    Template(String),
}

impl ConvertError {
    /// Whether the error aborts the conversion instead of being recorded.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConvertError::UnresolvedSlot(_)
                | ConvertError::UnknownObject(_)
                | ConvertError::InvalidDocument(_)
                | ConvertError::Parse(_)
                | ConvertError::Template(_)
        )
    }
}

/// A recovered error, kept for the conversion report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub frame: u32,
    pub message: String,
}

impl Anomaly {
    pub fn new(frame: u32, err: &ConvertError) -> Self {
        Self {
            frame,
            message: err.to_string(),
        }
    }
}
