//! Static geometry export planning.
//!
//! Rendering shapes to files is done by an external exporter. This module
//! decides which assets are needed and how they are keyed. By default each
//! slot gets one composed asset holding every occupant it ever showed, in
//! variant order, so the Variant-Index curve can pick a frame inside it.
//! [`GeometryMode::SeparateVariants`] asks for one asset per occupant instead.

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::display_list::SlotTable;
use crate::ids::{OccupantId, SlotId};

/// Opaque handle returned by an exporter (typically a file name).
pub type AssetHandle = String;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GeometryMode {
    /// One asset per slot; shared slots list their occupants as frames.
    #[default]
    Composed,
    /// One asset per occupant of a shared slot, keyed `name_variant`.
    SeparateVariants,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GeometryRequest {
    pub slot: SlotId,
    pub slot_name: String,
    /// Occupants drawn into the asset. For a composed asset the position of
    /// an occupant is its frame (variant) index.
    pub occupants: Vec<OccupantId>,
    /// Variant index of a separate-variant asset.
    pub variant: Option<usize>,
}

impl GeometryRequest {
    /// File stem for the exported asset: `name` or `name_variant`.
    pub fn file_stem(&self) -> String {
        match self.variant {
            Some(v) => format!("{}_{}", self.slot_name, v),
            None => self.slot_name.clone(),
        }
    }

    /// Whether the asset holds several frames selected at runtime.
    pub fn is_composed(&self) -> bool {
        self.occupants.len() > 1
    }
}

/// Renders the geometry of one request. Adapters implement this.
pub trait GeometryExporter {
    fn export(&mut self, request: &GeometryRequest) -> Result<AssetHandle, String>;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportedAsset {
    pub request: GeometryRequest,
    pub handle: AssetHandle,
}

/// Requests for every slot that showed at least one occupant, in depth order.
pub fn plan_geometry(slots: &SlotTable, mode: GeometryMode) -> Vec<GeometryRequest> {
    let mut plan = Vec::new();
    for slot in slots.iter().filter(|s| !s.history().is_empty()) {
        match mode {
            GeometryMode::SeparateVariants if slot.is_shared() => {
                for (i, occupant) in slot.history().iter().enumerate() {
                    plan.push(GeometryRequest {
                        slot: slot.id,
                        slot_name: slot.name.clone(),
                        occupants: vec![*occupant],
                        variant: Some(i),
                    });
                }
            }
            _ => plan.push(GeometryRequest {
                slot: slot.id,
                slot_name: slot.name.clone(),
                occupants: slot.history().to_vec(),
                variant: None,
            }),
        }
    }
    plan
}

/// Run every request through `exporter`. Failed requests are logged and skipped.
pub fn export_geometry(
    plan: &[GeometryRequest],
    exporter: &mut dyn GeometryExporter,
) -> Vec<ExportedAsset> {
    let mut assets = Vec::with_capacity(plan.len());
    for request in plan {
        match exporter.export(request) {
            Ok(handle) => {
                info!(
                    "<svg> exported {} ({} occupants) to {}",
                    request.slot_name,
                    request.occupants.len(),
                    handle
                );
                assets.push(ExportedAsset {
                    request: request.clone(),
                    handle,
                });
            }
            Err(err) => error!(
                "<svg> failed to export {} at {}: {err}",
                request.file_stem(),
                request.slot
            ),
        }
    }
    assets
}
