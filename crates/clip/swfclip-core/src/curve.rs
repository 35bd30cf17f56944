//! Curves and keyframes.
//!
//! A curve is identified by `(object, channel)` and holds keyframes ordered by
//! frame. Inserting at a frame that already has a keyframe overwrites its
//! value (last writer wins).

use serde::{Deserialize, Serialize};

use crate::ids::ObjectId;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    Position,
    Scale,
    Rotation,
    Active,
    VariantIndex,
}

impl Channel {
    /// Stepped channels hold their value until the next keyframe.
    pub fn is_stepped(self) -> bool {
        matches!(self, Channel::Active | Channel::VariantIndex)
    }
}

/// Per-channel keyframe value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Position { x: f64, y: f64 },
    Scale { x: f64, y: f64 },
    Rotation { degrees: f64 },
    Active { active: bool },
    VariantIndex { index: u32 },
}

impl KeyValue {
    pub fn channel(&self) -> Channel {
        match self {
            KeyValue::Position { .. } => Channel::Position,
            KeyValue::Scale { .. } => Channel::Scale,
            KeyValue::Rotation { .. } => Channel::Rotation,
            KeyValue::Active { .. } => Channel::Active,
            KeyValue::VariantIndex { .. } => Channel::VariantIndex,
        }
    }

    /// Whether the value equals what the target engine assumes without a curve.
    pub fn is_default(&self) -> bool {
        match *self {
            KeyValue::Position { x, y } => x == 0.0 && y == 0.0,
            KeyValue::Scale { x, y } => x == 1.0 && y == 1.0,
            KeyValue::Rotation { degrees } => degrees == 0.0,
            KeyValue::Active { active } => active,
            KeyValue::VariantIndex { index } => index == 0,
        }
    }

    /// Scalar rendition for stepped channels.
    pub fn scalar(&self) -> Option<f64> {
        match *self {
            KeyValue::Active { active } => Some(if active { 1.0 } else { 0.0 }),
            KeyValue::VariantIndex { index } => Some(index as f64),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Keyframe {
    pub frame: u32,
    /// Seconds (`frame / frame_rate`).
    pub time: f64,
    pub value: KeyValue,
}

impl Keyframe {
    pub fn new(frame: u32, time: f64, value: KeyValue) -> Self {
        Self { frame, time, value }
    }

    #[inline]
    pub fn equals(&self, other: &Keyframe) -> bool {
        self.value == other.value
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Curve {
    pub object: ObjectId,
    pub channel: Channel,
    pub keyframes: Vec<Keyframe>,
}

impl Curve {
    pub fn new(object: ObjectId, channel: Channel) -> Self {
        Self {
            object,
            channel,
            keyframes: Vec::new(),
        }
    }

    /// Insert keeping frame order; an existing keyframe at the same frame is overwritten.
    pub fn insert(&mut self, keyframe: Keyframe) {
        debug_assert_eq!(keyframe.value.channel(), self.channel);
        match self
            .keyframes
            .binary_search_by_key(&keyframe.frame, |k| k.frame)
        {
            Ok(i) => self.keyframes[i].value = keyframe.value,
            Err(i) => self.keyframes.insert(i, keyframe),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }
}
