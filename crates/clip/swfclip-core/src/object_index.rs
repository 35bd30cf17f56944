//! Scene objects: one named handle per slot.

use hashbrown::HashMap;
use log::warn;
use serde::Serialize;

use crate::display_list::SlotTable;
use crate::error::ConvertError;
use crate::ids::{IdAllocator, ObjectId, SlotId};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub slot: SlotId,
    pub name: String,
    /// Path of the object relative to the clip root.
    pub path: String,
    /// Number of distinct occupants that used the slot.
    pub variants: usize,
}

impl SceneObject {
    /// Objects on shared slots select their sub-asset through a Variant-Index curve.
    #[inline]
    pub fn needs_variant_curve(&self) -> bool {
        self.variants > 1
    }
}

#[derive(Clone, Debug, Default)]
pub struct ObjectIndex {
    objects: Vec<SceneObject>,
    by_slot: HashMap<SlotId, usize>,
}

impl ObjectIndex {
    /// Create one object per slot, in depth order.
    pub fn build(slots: &SlotTable) -> Self {
        let mut ids = IdAllocator::new();
        let mut index = ObjectIndex::default();
        let mut seen_paths: HashMap<String, SlotId> = HashMap::new();
        for slot in slots.iter() {
            if let Some(other) = seen_paths.insert(slot.name.clone(), slot.id) {
                warn!(
                    "<anim> object path '{}' is used by {} and {}",
                    slot.name, other, slot.id
                );
            }
            index.by_slot.insert(slot.id, index.objects.len());
            index.objects.push(SceneObject {
                id: ids.alloc_object(),
                slot: slot.id,
                name: slot.name.clone(),
                path: slot.name.clone(),
                variants: slot.history().len(),
            });
        }
        index
    }

    /// Every slot seen by the simulator has an object; failing to find one is fatal.
    pub fn resolve(&self, slot: SlotId) -> Result<&SceneObject, ConvertError> {
        self.by_slot
            .get(&slot)
            .map(|&i| &self.objects[i])
            .ok_or(ConvertError::UnresolvedSlot(slot))
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        // ids are dense and allocated in push order
        self.objects.get(id.0 as usize).filter(|o| o.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
