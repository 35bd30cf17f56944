//! Depth-indexed display-list simulator.
//!
//! Replays the edit stream in source order and turns it into a frame-ordered
//! stream of [`TransformRecord`]s. A slot's identity is its depth; the
//! occupant shown there may change over time, so each [`Slot`] keeps an
//! append-only history of distinct occupants. The position of an occupant in
//! that history is its variant index.
//!
//! When an occupant replaces a different one at the same depth without an
//! explicit remove, a vacate record for the old occupant is emitted first so
//! the transition is visible downstream.

use std::collections::BTreeMap;

use hashbrown::HashMap;
use log::{debug, error, warn};
use serde::Serialize;

use crate::affine::Affine;
use crate::config::Config;
use crate::document::{Document, DocumentMeta, Edit, Occupant};
use crate::error::{Anomaly, ConvertError};
use crate::ids::{OccupantId, SlotId};

/// What a slot shows at a frame. `occupant == None` means the slot was vacated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransformRecord {
    pub frame: u32,
    pub occupant: Option<OccupantId>,
    pub slot: SlotId,
    /// Accumulated placement matrix; `None` when the edit carried no geometry.
    pub matrix: Option<Affine>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub id: SlotId,
    pub name: String,
    pub current: Option<OccupantId>,
    history: Vec<OccupantId>,
    /// Composed matrix of the last record emitted for the current occupant.
    matrix: Option<Affine>,
}

impl Slot {
    fn new(id: SlotId, name: String) -> Self {
        Self {
            id,
            name,
            current: None,
            history: Vec::new(),
            matrix: None,
        }
    }

    pub fn matrix(&self) -> Option<&Affine> {
        self.matrix.as_ref()
    }

    /// Distinct occupants ever placed here, in first-placement order.
    pub fn history(&self) -> &[OccupantId] {
        &self.history
    }

    /// Whether more than one distinct occupant used this slot.
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.history.len() > 1
    }

    pub fn variant_of(&self, occupant: OccupantId) -> Option<usize> {
        self.history.iter().position(|o| *o == occupant)
    }

    fn record(&mut self, occupant: OccupantId) {
        if !self.history.contains(&occupant) {
            self.history.push(occupant);
        }
    }
}

/// Slots keyed by depth; iteration is in depth order.
#[derive(Clone, Debug, Default)]
pub struct SlotTable {
    slots: BTreeMap<SlotId, Slot>,
}

impl SlotTable {
    pub fn get(&self, id: SlotId) -> Option<&Slot> {
        self.slots.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.values()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn get_mut(&mut self, id: SlotId) -> Option<&mut Slot> {
        self.slots.get_mut(&id)
    }

    fn ensure(&mut self, id: SlotId, names: &BTreeMap<u16, String>) -> &mut Slot {
        self.slots.entry(id).or_insert_with(|| {
            let name = names
                .get(&id.0)
                .cloned()
                .unwrap_or_else(|| id.0.to_string());
            Slot::new(id, name)
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OccupantEntry {
    pub occupant: Occupant,
    /// Slot the occupant was last placed at, while it is still there.
    pub depth: Option<SlotId>,
}

#[derive(Clone, Debug, Default)]
pub struct OccupantTable {
    entries: HashMap<OccupantId, OccupantEntry>,
}

impl OccupantTable {
    pub fn get(&self, id: OccupantId) -> Option<&OccupantEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by occupant id.
    pub fn sorted(&self) -> Vec<&OccupantEntry> {
        let mut entries: Vec<&OccupantEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.occupant.id());
        entries
    }

    fn declare(&mut self, occupant: Occupant) -> bool {
        let id = occupant.id();
        if self.entries.contains_key(&id) {
            return false;
        }
        self.entries.insert(
            id,
            OccupantEntry {
                occupant,
                depth: None,
            },
        );
        true
    }

    fn get_mut(&mut self, id: OccupantId) -> Option<&mut OccupantEntry> {
        self.entries.get_mut(&id)
    }
}

/// Result of replaying a document.
#[derive(Clone, Debug, Default)]
pub struct DisplayList {
    pub records: Vec<TransformRecord>,
    pub occupants: OccupantTable,
    pub slots: SlotTable,
    pub anomalies: Vec<Anomaly>,
    /// Frame counter after the last edit.
    pub frames: u32,
}

/// Display-list state machine. State is the slot table plus the frame counter.
#[derive(Debug)]
pub struct Simulator<'a> {
    meta: &'a DocumentMeta,
    depth_names: &'a BTreeMap<u16, String>,
    frame: u32,
    occupants: OccupantTable,
    slots: SlotTable,
    records: Vec<TransformRecord>,
}

impl<'a> Simulator<'a> {
    pub fn new(meta: &'a DocumentMeta, cfg: &'a Config) -> Self {
        Self {
            meta,
            depth_names: &cfg.depth_names,
            frame: 0,
            occupants: OccupantTable::default(),
            slots: SlotTable::default(),
            records: Vec::new(),
        }
    }

    #[inline]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn records(&self) -> &[TransformRecord] {
        &self.records
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    /// Apply one edit. Errors are recoverable: the edit is dropped and the
    /// state stays consistent.
    pub fn apply(&mut self, edit: &Edit) -> Result<(), ConvertError> {
        match edit {
            Edit::Define { occupant } => {
                if !self.occupants.declare(occupant.clone()) {
                    warn!(
                        "<swf> {} declared twice, keeping the first declaration",
                        occupant.nametag()
                    );
                }
                Ok(())
            }
            Edit::AdvanceFrame => {
                if self.frame < self.meta.frame_count {
                    debug!("<swf> show frame {}", self.frame);
                    self.frame += 1;
                }
                Ok(())
            }
            _ if self.frame >= self.meta.frame_count => {
                debug!("<swf> ignoring edit past the last frame: {edit:?}");
                Ok(())
            }
            Edit::Place {
                depth,
                occupant,
                matrix,
                is_move,
            } => self.place(*depth, *occupant, *matrix, *is_move),
            Edit::Rename { depth, name } => {
                self.slots.ensure(*depth, self.depth_names).name = name.clone();
                Ok(())
            }
            Edit::Remove { depth } => {
                match self.slots.get(*depth).and_then(|s| s.current) {
                    Some(old) => {
                        self.vacate(*depth, old);
                        Ok(())
                    }
                    None => Err(ConvertError::MalformedEdit {
                        slot: *depth,
                        reason: "remove from an empty slot".into(),
                    }),
                }
            }
        }
    }

    fn place(
        &mut self,
        depth: SlotId,
        occupant: Option<OccupantId>,
        matrix: Option<Affine>,
        is_move: bool,
    ) -> Result<(), ConvertError> {
        let current = self.slots.get(depth).and_then(|s| s.current);

        let (id, matrix) = match (occupant, current) {
            (Some(id), current) => {
                if let Some(old) = current.filter(|old| *old != id) {
                    self.vacate(depth, old);
                }
                if self.occupants.get(id).is_none() {
                    return Err(ConvertError::UnknownOccupant(id, depth));
                }
                if let Some(entry) = self.occupants.get_mut(id) {
                    entry.depth = Some(depth);
                }
                let slot = self.slots.ensure(depth, self.depth_names);
                slot.current = Some(id);
                slot.record(id);
                debug!(
                    "<swf> f{} moving {} to {} (move flag {})",
                    self.frame, id, depth, is_move
                );
                // a fresh placement is always positioned
                (id, Some(matrix.unwrap_or(Affine::IDENTITY)))
            }
            (None, Some(id)) => (id, matrix),
            (None, None) => {
                return Err(ConvertError::MalformedEdit {
                    slot: depth,
                    reason: "modification of a slot with no occupant".into(),
                })
            }
        };

        let matrix = match (matrix, self.occupants.get(id)) {
            (Some(m), Some(entry)) => Some(m.compose(&entry.occupant.intrinsic_matrix())),
            (m, _) => m,
        };
        let slot = self.slots.ensure(depth, self.depth_names);
        if let Some(m) = matrix {
            // same occupant, same position: nothing changes on stage
            if current == Some(id) && slot.matrix == Some(m) {
                debug!("<swf> f{} {} unchanged at {}", self.frame, id, depth);
                return Ok(());
            }
            slot.matrix = Some(m);
        }
        debug!(
            "<swf> f{} {} matrix: {:?}, {}",
            self.frame, id, matrix, depth
        );
        self.records.push(TransformRecord {
            frame: self.frame,
            occupant: Some(id),
            slot: depth,
            matrix,
        });
        Ok(())
    }

    fn vacate(&mut self, depth: SlotId, old: OccupantId) {
        debug!("<swf> f{} removing {} from {}", self.frame, old, depth);
        if let Some(slot) = self.slots.get_mut(depth) {
            slot.current = None;
            slot.matrix = None;
        }
        if let Some(entry) = self.occupants.get_mut(old) {
            if entry.depth == Some(depth) {
                entry.depth = None;
            }
        }
        self.records.push(TransformRecord {
            frame: self.frame,
            occupant: None,
            slot: depth,
            matrix: None,
        });
    }

    pub fn finish(self, anomalies: Vec<Anomaly>) -> DisplayList {
        DisplayList {
            records: self.records,
            occupants: self.occupants,
            slots: self.slots,
            anomalies,
            frames: self.frame,
        }
    }
}

/// Replay every edit of `doc`. Recoverable errors are logged and collected.
pub fn simulate(doc: &Document, cfg: &Config) -> DisplayList {
    let mut sim = Simulator::new(&doc.meta, cfg);
    let mut anomalies = Vec::new();
    for edit in &doc.edits {
        if let Err(err) = sim.apply(edit) {
            error!("<swf> f{} {err}; edit dropped", sim.frame());
            anomalies.push(Anomaly::new(sim.frame(), &err));
        }
    }
    sim.finish(anomalies)
}
