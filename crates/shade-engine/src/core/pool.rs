use crate::api::types::LightId;
use crate::components::light::Light;

struct Slot {
    generation: u32,
    light: Option<Light>,
}

/// Light storage addressed by generational [`LightId`]s.
///
/// Freed slots are reused; their generation is bumped so ids handed out
/// for the previous occupant stop resolving.
#[derive(Default)]
pub struct LightPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl LightPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a light to the pool.
    pub fn insert(&mut self, light: Light) -> LightId {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.light = Some(light);
            return LightId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            light: Some(light),
        });
        LightId { index, generation: 0 }
    }

    /// Remove a light by ID. Returns the removed light if the id was live.
    pub fn remove(&mut self, id: LightId) -> Option<Light> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let light = slot.light.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(light)
    }

    pub fn get(&self, id: LightId) -> Option<&Light> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.light.as_ref()
    }

    pub fn get_mut(&mut self, id: LightId) -> Option<&mut Light> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.light.as_mut()
    }

    pub fn contains(&self, id: LightId) -> bool {
        self.get(id).is_some()
    }

    /// Iterate over live lights with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (LightId, &Light)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            let id = LightId {
                index: i as u32,
                generation: slot.generation,
            };
            slot.light.as_ref().map(|light| (id, light))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LightId, &mut Light)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let id = LightId {
                index: i as u32,
                generation: slot.generation,
            };
            slot.light.as_mut().map(|light| (id, light))
        })
    }

    /// Iterate over live lights only.
    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.slots.iter().filter_map(|slot| slot.light.as_ref())
    }

    /// Number of live lights.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove lights that don't match a predicate.
    pub fn retain<F: FnMut(LightId, &Light) -> bool>(&mut self, mut f: F) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let id = LightId {
                index: i as u32,
                generation: slot.generation,
            };
            if slot.light.as_ref().is_some_and(|light| !f(id, light)) {
                slot.light = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(i as u32);
                self.len -= 1;
            }
        }
    }

    /// Remove every light. Outstanding ids become stale.
    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.light.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(i as u32);
            }
        }
        self.len = 0;
    }
}
