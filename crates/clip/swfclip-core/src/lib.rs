//! swfclip core (engine-agnostic)
//!
//! Replays the display-list edits of a decoded vector-animation document,
//! turns the resulting per-slot transform history into keyframe curves,
//! optimizes them, and hands a structured clip to engine adapters.
//!
//! Pipeline: [`document`] -> [`display_list`] -> [`object_index`] ->
//! [`timeline`] -> [`optimizer`] -> [`export`]. [`pipeline::convert`] runs
//! all of it.

pub mod affine;
pub mod config;
pub mod curve;
pub mod display_list;
pub mod document;
pub mod error;
pub mod export;
pub mod geometry;
pub mod ids;
pub mod object_index;
pub mod optimizer;
pub mod pipeline;
pub mod timeline;

// Re-exports for consumers (adapters)
pub use affine::{Affine, Bounds};
pub use config::{Config, PropertyBinding};
pub use curve::{Channel, Curve, KeyValue, Keyframe};
pub use display_list::{simulate, DisplayList, Simulator, Slot, SlotTable, TransformRecord};
pub use document::{parse_document_json, Document, DocumentMeta, Edit, Occupant};
pub use error::{Anomaly, ConvertError};
pub use export::{apply_template, export_clip, export_clip_json, ClipExport, ExportedCurve};
pub use geometry::{
    export_geometry, plan_geometry, GeometryExporter, GeometryMode, GeometryRequest,
};
pub use ids::{ObjectId, OccupantId, SlotId};
pub use object_index::{ObjectIndex, SceneObject};
pub use optimizer::{optimize_curve, optimize_curves, OptimizeStats};
pub use pipeline::{convert, Conversion};
pub use timeline::{build_timeline, Timeline};
