//! A single grid cell's population and its cached sweep-and-prune pairs.

use glam::Vec2;
use hecs::Entity;
use slotmap::SlotMap;

use super::cell::CellKey;
use super::pair::Pair;
use super::AabbKey;
use crate::physics::collider::Aabb;
use crate::physics::layers::CollisionMatrix;

/// Shape summary stored in every chunk the shape overlaps.
#[derive(Debug, Clone, Copy)]
pub struct ShapeEntry {
    /// `None` marks a tombstone waiting for compaction.
    pub entity: Option<Entity>,
    pub aabb: AabbKey,
    pub is_static: bool,
    pub layer: u32,
}

#[derive(Debug)]
pub struct Chunk {
    key: CellKey,
    entries: Vec<ShapeEntry>,
    pairs: Vec<Pair>,
    live: usize,
    dynamic_count: usize,
    dirty: bool,
    needs_compact: bool,
    axis: usize,
}

impl Chunk {
    pub fn new(key: CellKey) -> Self {
        Self {
            key,
            entries: Vec::new(),
            pairs: Vec::new(),
            live: 0,
            dynamic_count: 0,
            dirty: false,
            needs_compact: false,
            axis: 0,
        }
    }

    pub fn key(&self) -> CellKey {
        self.key
    }

    /// Entries including tombstones, in storage order.
    pub fn entries(&self) -> &[ShapeEntry] {
        &self.entries
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn dynamic_count(&self) -> usize {
        self.dynamic_count
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Sort axis for the next sweep: 0 for x, 1 for y.
    pub fn axis(&self) -> usize {
        self.axis
    }

    pub fn entry_capacity(&self) -> usize {
        self.entries.capacity()
    }

    pub fn pair_capacity(&self) -> usize {
        self.pairs.capacity()
    }

    pub fn insert(&mut self, entry: ShapeEntry) {
        if !entry.is_static {
            self.dynamic_count += 1;
        }
        self.entries.push(entry);
        self.live += 1;
        self.dirty = true;
    }

    /// Tombstone the entry for `entity`.
    ///
    /// # Panics
    ///
    /// Panics if the chunk does not hold `entity`.
    pub fn remove(&mut self, entity: Entity) {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.entity == Some(entity))
        else {
            panic!(
                "chunk ({}, {}) does not hold entity {:?}",
                self.key.x(),
                self.key.y(),
                entity
            );
        };

        entry.entity = None;
        if !entry.is_static {
            self.dynamic_count -= 1;
        }
        self.live -= 1;
        self.needs_compact = true;
        self.dirty = true;
    }

    /// Move the entry for `entity` to another collision layer.
    ///
    /// # Panics
    ///
    /// Panics if the chunk does not hold `entity`.
    pub fn set_layer(&mut self, entity: Entity, layer: u32) {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.entity == Some(entity))
        else {
            panic!(
                "chunk ({}, {}) does not hold entity {:?}",
                self.key.x(),
                self.key.y(),
                entity
            );
        };
        entry.layer = layer;
        self.dirty = true;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Drop tombstones, keeping live entries in their relative order.
    pub fn compact(&mut self) {
        self.entries.retain(|entry| entry.entity.is_some());
        self.needs_compact = false;
    }

    /// Refresh the cached pair list if anything here can have moved.
    pub fn sweep(&mut self, aabbs: &SlotMap<AabbKey, Aabb>, matrix: &CollisionMatrix) {
        if self.needs_compact {
            self.compact();
        }
        if !self.dirty && self.dynamic_count == 0 {
            return;
        }

        let axis = self.axis;
        let sort_key = |entry: &ShapeEntry| {
            aabbs
                .get(entry.aabb)
                .map_or(f32::INFINITY, |aabb| aabb.min[axis])
        };
        self.entries
            .sort_by(|a, b| sort_key(a).total_cmp(&sort_key(b)));
        let boxes: Vec<(ShapeEntry, Aabb)> = self
            .entries
            .iter()
            .filter_map(|entry| aabbs.get(entry.aabb).map(|aabb| (*entry, *aabb)))
            .collect();

        self.pairs.clear();
        let mut sum = Vec2::ZERO;
        let mut sum_sq = Vec2::ZERO;

        for (i, (entry_a, aabb_a)) in boxes.iter().enumerate() {
            let center = aabb_a.center();
            sum += center;
            sum_sq += center * center;

            let Some(entity_a) = entry_a.entity else {
                continue;
            };
            for (entry_b, aabb_b) in &boxes[i + 1..] {
                if aabb_b.min[axis] > aabb_a.max[axis] {
                    break;
                }
                let Some(entity_b) = entry_b.entity else {
                    continue;
                };
                if entry_a.is_static && entry_b.is_static {
                    continue;
                }
                if !aabb_a.overlaps(aabb_b) {
                    continue;
                }
                if !matrix.check(entry_a.layer, entry_b.layer) {
                    continue;
                }
                self.pairs.push(Pair::new(entity_a, entity_b));
            }
        }

        if !boxes.is_empty() {
            let n = boxes.len() as f32;
            let variance = sum_sq / n - sum * sum / (n * n);
            self.axis = if variance.y > variance.x { 1 } else { 0 };
        }
        self.dirty = false;
    }
}
