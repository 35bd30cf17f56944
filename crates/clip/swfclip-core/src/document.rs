//! Decoded source document: occupant declarations and the ordered edit stream.
//!
//! Binary tag decoding happens upstream; this module only defines the typed
//! records the simulator replays, plus a JSON loader for them.

use serde::{Deserialize, Serialize};

use crate::affine::{Affine, Bounds};
use crate::error::ConvertError;
use crate::ids::{OccupantId, SlotId};

/// Source units to engine units, used when a document does not say otherwise.
pub const DEFAULT_UNIT_DIVISOR: f64 = 0.05;

fn default_unit_divisor() -> f64 {
    DEFAULT_UNIT_DIVISOR
}

fn default_alias() -> String {
    "clip".into()
}

/// A placeable identity. Immutable once declared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Occupant {
    Shape {
        id: OccupantId,
        bounds: Bounds,
    },
    /// Morph shape; `bounds` are its start bounds.
    MorphShape {
        id: OccupantId,
        bounds: Bounds,
    },
    #[serde(rename_all = "camelCase")]
    Sprite {
        id: OccupantId,
        frame_count: u32,
        /// Matrix of the sprite's own first internal placement.
        #[serde(default)]
        matrix: Option<Affine>,
    },
}

impl Occupant {
    pub fn id(&self) -> OccupantId {
        match self {
            Occupant::Shape { id, .. }
            | Occupant::MorphShape { id, .. }
            | Occupant::Sprite { id, .. } => *id,
        }
    }

    /// Matrix every placement of this occupant is composed with.
    pub fn intrinsic_matrix(&self) -> Affine {
        match self {
            Occupant::Shape { bounds, .. } | Occupant::MorphShape { bounds, .. } => {
                Affine::center_offset(bounds)
            }
            Occupant::Sprite { matrix, .. } => matrix.unwrap_or(Affine::IDENTITY),
        }
    }

    pub fn nametag(&self) -> String {
        let (kind, id) = match self {
            Occupant::Shape { id, .. } => ("SHAPE", id),
            Occupant::MorphShape { id, .. } => ("MORPH", id),
            Occupant::Sprite { id, .. } => ("SPRITE", id),
        };
        format!("[{kind}|{}]", id.0)
    }
}

/// One display-list edit, replayed strictly in source order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Edit {
    /// Inline occupant declaration.
    Define { occupant: Occupant },
    #[serde(rename_all = "camelCase")]
    Place {
        depth: SlotId,
        /// Present when the edit (re)assigns the slot's occupant.
        #[serde(default)]
        occupant: Option<OccupantId>,
        #[serde(default)]
        matrix: Option<Affine>,
        #[serde(default)]
        is_move: bool,
    },
    Rename { depth: SlotId, name: String },
    Remove { depth: SlotId },
    AdvanceFrame,
}

impl Edit {
    pub fn define(occupant: Occupant) -> Self {
        Edit::Define { occupant }
    }

    /// Place `occupant` at `depth`, optionally with an explicit matrix.
    pub fn place(depth: u16, occupant: u16, matrix: Option<Affine>) -> Self {
        Edit::Place {
            depth: SlotId(depth),
            occupant: Some(OccupantId(occupant)),
            matrix,
            is_move: false,
        }
    }

    /// Move whatever currently occupies `depth`.
    pub fn modify(depth: u16, matrix: Affine) -> Self {
        Edit::Place {
            depth: SlotId(depth),
            occupant: None,
            matrix: Some(matrix),
            is_move: true,
        }
    }

    pub fn rename(depth: u16, name: impl Into<String>) -> Self {
        Edit::Rename {
            depth: SlotId(depth),
            name: name.into(),
        }
    }

    pub fn remove(depth: u16) -> Self {
        Edit::Remove {
            depth: SlotId(depth),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    /// Short document name, used as the default clip name.
    #[serde(default = "default_alias")]
    pub alias: String,
    pub frame_rate: f64,
    pub frame_count: u32,
    #[serde(default = "default_unit_divisor")]
    pub unit_divisor: f64,
}

impl DocumentMeta {
    pub fn new(frame_rate: f64, frame_count: u32) -> Self {
        Self {
            alias: default_alias(),
            frame_rate,
            frame_count,
            unit_divisor: DEFAULT_UNIT_DIVISOR,
        }
    }

    pub fn validate(&self) -> Result<(), ConvertError> {
        if !self.frame_rate.is_finite() || self.frame_rate <= 0.0 {
            return Err(ConvertError::InvalidDocument(format!(
                "frameRate must be finite and > 0, got {}",
                self.frame_rate
            )));
        }
        if self.frame_count == 0 {
            return Err(ConvertError::InvalidDocument(
                "frameCount must be > 0".into(),
            ));
        }
        if !self.unit_divisor.is_finite() || self.unit_divisor <= 0.0 {
            return Err(ConvertError::InvalidDocument(format!(
                "unitDivisor must be finite and > 0, got {}",
                self.unit_divisor
            )));
        }
        Ok(())
    }

    /// Seconds at the start of frame `frame`.
    #[inline]
    pub fn time_of(&self, frame: u32) -> f64 {
        frame as f64 / self.frame_rate
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub meta: DocumentMeta,
    pub edits: Vec<Edit>,
}

impl Document {
    pub fn new(meta: DocumentMeta, edits: Vec<Edit>) -> Self {
        Self { meta, edits }
    }

    /// Flatten the per-frame input form: declarations first, then each frame's
    /// edits followed by an `AdvanceFrame`.
    pub fn from_frames(meta: DocumentMeta, occupants: Vec<Occupant>, frames: Vec<Vec<Edit>>) -> Self {
        let total = occupants.len() + frames.iter().map(|f| f.len() + 1).sum::<usize>();
        let mut edits = Vec::with_capacity(total);
        edits.extend(occupants.into_iter().map(Edit::define));
        for frame in frames {
            edits.extend(frame);
            edits.push(Edit::AdvanceFrame);
        }
        Self { meta, edits }
    }
}

/// Parse the JSON rendition of a decoded document.
///
/// Either a flat `edits` stream (with explicit `advanceFrame` markers) or a
/// `frames` list of per-frame edit lists is accepted; `occupants` are
/// declared before the first edit in both cases.
pub fn parse_document_json(s: &str) -> Result<Document, ConvertError> {
    let raw: RawDocument = serde_json::from_str(s).map_err(|e| ConvertError::Parse(e.to_string()))?;
    raw.meta.validate()?;

    let doc = match (raw.edits, raw.frames) {
        (Some(_), Some(_)) => {
            return Err(ConvertError::InvalidDocument(
                "document has both 'edits' and 'frames'".into(),
            ))
        }
        (Some(edits), None) => {
            let mut all = Vec::with_capacity(raw.occupants.len() + edits.len());
            all.extend(raw.occupants.into_iter().map(Edit::define));
            all.extend(edits);
            Document::new(raw.meta, all)
        }
        (None, Some(frames)) => Document::from_frames(raw.meta, raw.occupants, frames),
        (None, None) => Document::from_frames(raw.meta, raw.occupants, Vec::new()),
    };
    Ok(doc)
}

// ----- JSON schema (serde) -----

#[derive(Debug, Deserialize)]
struct RawDocument {
    meta: DocumentMeta,
    #[serde(default)]
    occupants: Vec<Occupant>,
    #[serde(default)]
    edits: Option<Vec<Edit>>,
    #[serde(default)]
    frames: Option<Vec<Vec<Edit>>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_edits() {
        let json = r#"{
            "meta": { "alias": "walk", "frameRate": 24, "frameCount": 2 },
            "occupants": [
                { "type": "shape", "id": 1, "bounds": { "xmin": 0, "xmax": 10, "ymin": 0, "ymax": 4 } },
                { "type": "sprite", "id": 2, "frameCount": 3, "matrix": [1, 0, 0, 1, 5, 5] }
            ],
            "edits": [
                { "kind": "place", "depth": 1, "occupant": 1 },
                { "kind": "rename", "depth": 1, "name": "tail" },
                { "kind": "advanceFrame" },
                { "kind": "place", "depth": 1, "matrix": [1, 0, 0, 1, 2, 0], "isMove": true },
                { "kind": "remove", "depth": 1 }
            ]
        }"#;
        let doc = parse_document_json(json).unwrap();
        assert_eq!(doc.meta.alias, "walk");
        assert_eq!(doc.meta.unit_divisor, DEFAULT_UNIT_DIVISOR);
        assert_eq!(doc.edits.len(), 7);
        assert!(matches!(doc.edits[0], Edit::Define { .. }));
        assert_eq!(doc.edits[2], Edit::place(1, 1, None));
        assert_eq!(doc.edits[5], Edit::modify(1, Affine::translate(2.0, 0.0)));
        assert_eq!(doc.edits[6], Edit::remove(1));
    }

    #[test]
    fn frames_form_appends_advance_markers() {
        let json = r#"{
            "meta": { "frameRate": 12, "frameCount": 2, "unitDivisor": 1 },
            "frames": [
                [ { "kind": "place", "depth": 0, "occupant": 3 } ],
                []
            ]
        }"#;
        let doc = parse_document_json(json).unwrap();
        assert_eq!(
            doc.edits,
            vec![Edit::place(0, 3, None), Edit::AdvanceFrame, Edit::AdvanceFrame]
        );
    }

    #[test]
    fn rejects_bad_metadata() {
        let err = parse_document_json(r#"{ "meta": { "frameRate": 0, "frameCount": 1 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidDocument(_)));
        let err = parse_document_json(r#"{ "meta": { "frameRate": 24, "frameCount": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConvertError::InvalidDocument(_)));
        let err = parse_document_json("{").unwrap_err();
        assert!(matches!(err, ConvertError::Parse(_)));
    }

    #[test]
    fn intrinsic_matrix_per_variant() {
        let shape = Occupant::Shape {
            id: OccupantId(1),
            bounds: Bounds {
                xmin: 0.0,
                xmax: 20.0,
                ymin: -4.0,
                ymax: 4.0,
            },
        };
        assert_eq!(shape.intrinsic_matrix(), Affine::translate(10.0, 0.0));
        let bare = Occupant::Sprite {
            id: OccupantId(2),
            frame_count: 1,
            matrix: None,
        };
        assert_eq!(bare.intrinsic_matrix(), Affine::IDENTITY);
        assert_eq!(bare.nametag(), "[SPRITE|2]");
    }
}
