use std::collections::BTreeMap;
use std::sync::Arc;

use deltahub_archive::{Payload, SlotSource};
use deltahub_model::SlotId;

/// Session-scoped table of the bytes bound to each slot.
///
/// The table is immutable: every mutation returns a new registry and leaves
/// the original untouched, so a registry handed to a background export can
/// not change under it. Cloning is cheap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotRegistry {
    slots: Arc<BTreeMap<SlotId, Payload>>,
}
impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `payload` to `slot`, or unbinds the slot when `payload` is
    /// `None`.
    #[must_use]
    pub fn set(&self, slot: SlotId, payload: Option<Payload>) -> Self {
        self.update(|slots| {
            match payload {
                Some(payload) => slots.insert(slot, payload),
                None => slots.remove(&slot),
            };
        })
    }

    /// Moves the bytes bound to `from` over to `to`, replacing anything
    /// already bound there.
    #[must_use]
    pub fn rename(&self, from: &SlotId, to: SlotId) -> Self {
        if !self.slots.contains_key(from) {
            return self.clone();
        }
        self.update(|slots| {
            if let Some(payload) = slots.remove(from) {
                slots.insert(to, payload);
            }
        })
    }

    /// Keeps only the slots for which `keep` returns `true`.
    #[must_use]
    pub fn retain(&self, mut keep: impl FnMut(&SlotId) -> bool) -> Self {
        self.update(|slots| slots.retain(|slot, _| keep(slot)))
    }

    pub fn get(&self, slot: &SlotId) -> Option<&Payload> {
        self.slots.get(slot)
    }

    pub fn contains(&self, slot: &SlotId) -> bool {
        self.slots.contains_key(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotId, &Payload)> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    fn update(&self, change: impl FnOnce(&mut BTreeMap<SlotId, Payload>)) -> Self {
        let mut slots = BTreeMap::clone(&self.slots);
        change(&mut slots);
        Self { slots: Arc::new(slots) }
    }
}
impl SlotSource for SlotRegistry {
    fn payload(&self, slot: &SlotId) -> Option<&Payload> {
        self.get(slot)
    }
}
impl FromIterator<(SlotId, Payload)> for SlotRegistry {
    fn from_iter<T: IntoIterator<Item = (SlotId, Payload)>>(iter: T) -> Self {
        Self {
            slots: Arc::new(iter.into_iter().collect()),
        }
    }
}
