//! Broadphase collision detection on a chunked uniform grid.
//!
//! Every populated cell owns a [`Chunk`] holding summaries of the shapes that
//! overlap it. Chunks keep their own sweep-and-prune pair cache, which is only
//! rebuilt when something in the chunk can have moved. Shapes that span
//! several cells share one AABB through the arena, so moving a body updates
//! every chunk entry at once.

pub mod cell;
pub mod chunk;
pub mod pair;

use std::collections::{HashMap, HashSet};

use hecs::Entity;
use slotmap::SlotMap;

use super::collider::Aabb;
use super::layers::CollisionMatrix;

pub use cell::{cells_for, chunks_hash, CellKey};
pub use chunk::{Chunk, ShapeEntry};
pub use pair::Pair;

slotmap::new_key_type! {
    /// Handle to a shape's AABB in the broadphase arena.
    pub struct AabbKey;
}

/// Index of a chunk in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(usize);

impl ChunkId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Grid membership of an entity, attached by the insert stage.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialRef {
    chunks: Vec<ChunkId>,
    chunks_hash: i32,
    aabb: AabbKey,
    is_static: bool,
    layer: u32,
}

impl SpatialRef {
    pub fn chunks(&self) -> &[ChunkId] {
        &self.chunks
    }

    pub fn chunks_hash(&self) -> i32 {
        self.chunks_hash
    }

    pub fn aabb_key(&self) -> AabbKey {
        self.aabb
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }
}

/// Grid occupancy and cache sizes after a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadphaseStats {
    pub chunks: usize,
    pub live_entries: usize,
    pub entry_capacity: usize,
    pub cached_pairs: usize,
    pub pair_capacity: usize,
    pub unique_pairs: usize,
}

pub struct Broadphase {
    cell_size: f32,
    chunks: Vec<Chunk>,
    index: HashMap<CellKey, ChunkId>,
    aabbs: SlotMap<AabbKey, Aabb>,
    pairs: Vec<Pair>,
    seen: HashSet<Pair>,
}

impl Broadphase {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            chunks: Vec::new(),
            index: HashMap::new(),
            aabbs: SlotMap::with_key(),
            pairs: Vec::new(),
            seen: HashSet::new(),
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// All chunks in creation order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// The chunk for `key`, if that cell was ever populated.
    pub fn chunk(&self, key: CellKey) -> Option<&Chunk> {
        self.index.get(&key).map(|id| &self.chunks[id.0])
    }

    pub fn chunk_by_id(&self, id: ChunkId) -> &Chunk {
        &self.chunks[id.0]
    }

    pub fn aabb(&self, key: AabbKey) -> Option<&Aabb> {
        self.aabbs.get(key)
    }

    /// Unique pairs gathered by the last [`compute_pairs`](Self::compute_pairs).
    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    fn fetch_or_create(&mut self, key: CellKey) -> ChunkId {
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = ChunkId(self.chunks.len());
        self.chunks.push(Chunk::new(key));
        self.index.insert(key, id);
        tracing::debug!(x = key.x(), y = key.y(), chunks = self.chunks.len(), "created chunk");
        id
    }

    /// Register a shape in every cell its AABB touches.
    pub fn insert(&mut self, entity: Entity, aabb: Aabb, is_static: bool, layer: u32) -> SpatialRef {
        let aabb_key = self.aabbs.insert(aabb);
        let keys: Vec<CellKey> = cells_for(&aabb, self.cell_size).collect();
        let chunks_hash = chunks_hash(keys.iter().copied());

        let entry = ShapeEntry {
            entity: Some(entity),
            aabb: aabb_key,
            is_static,
            layer,
        };
        let chunks: Vec<ChunkId> = keys
            .into_iter()
            .map(|key| {
                let id = self.fetch_or_create(key);
                self.chunks[id.0].insert(entry);
                id
            })
            .collect();

        SpatialRef {
            chunks,
            chunks_hash,
            aabb: aabb_key,
            is_static,
            layer,
        }
    }

    /// Move a shape to a new AABB and collision layer.
    ///
    /// When the set of touched cells is unchanged only the shared AABB is
    /// rewritten. Otherwise entries are tombstoned in cells the shape left and
    /// appended to cells it entered. A layer change is written into every
    /// entry the shape already has before the cell sets are compared.
    pub fn update(&mut self, entity: Entity, spatial: &mut SpatialRef, aabb: Aabb, layer: u32) {
        match self.aabbs.get_mut(spatial.aabb) {
            Some(slot) => *slot = aabb,
            None => spatial.aabb = self.aabbs.insert(aabb),
        }

        if layer != spatial.layer {
            for id in &spatial.chunks {
                self.chunks[id.0].set_layer(entity, layer);
            }
            spatial.layer = layer;
        }

        let keys: Vec<CellKey> = cells_for(&aabb, self.cell_size).collect();
        let hash = chunks_hash(keys.iter().copied());
        if hash == spatial.chunks_hash {
            if spatial.is_static {
                for id in &spatial.chunks {
                    self.chunks[id.0].mark_dirty();
                }
            }
            return;
        }

        let entry = ShapeEntry {
            entity: Some(entity),
            aabb: spatial.aabb,
            is_static: spatial.is_static,
            layer: spatial.layer,
        };
        let new_chunks: Vec<ChunkId> = keys
            .into_iter()
            .map(|key| self.fetch_or_create(key))
            .collect();

        for id in &spatial.chunks {
            if !new_chunks.contains(id) {
                self.chunks[id.0].remove(entity);
            }
        }
        for id in &new_chunks {
            if !spatial.chunks.contains(id) {
                self.chunks[id.0].insert(entry);
            }
        }

        spatial.chunks = new_chunks;
        spatial.chunks_hash = hash;
    }

    /// Tombstone the shape in every chunk it occupies and free its AABB.
    ///
    /// # Panics
    ///
    /// Panics if a referenced chunk does not hold `entity`.
    pub fn remove(&mut self, entity: Entity, spatial: &SpatialRef) {
        for id in &spatial.chunks {
            self.chunks[id.0].remove(entity);
        }
        self.aabbs.remove(spatial.aabb);
    }

    /// Sweep every chunk and merge their pairs, deduplicated, in chunk
    /// creation order.
    pub fn compute_pairs(&mut self, matrix: &CollisionMatrix) -> &[Pair] {
        for chunk in &mut self.chunks {
            chunk.sweep(&self.aabbs, matrix);
            for pair in chunk.pairs() {
                if self.seen.insert(*pair) {
                    self.pairs.push(*pair);
                }
            }
        }
        &self.pairs
    }

    /// Forget this tick's global pairs. Per-chunk caches are kept.
    pub fn clear_pairs(&mut self) {
        self.pairs.clear();
        self.seen.clear();
    }

    pub fn stats(&self) -> BroadphaseStats {
        let mut stats = BroadphaseStats {
            chunks: self.chunks.len(),
            unique_pairs: self.pairs.len(),
            ..Default::default()
        };
        for chunk in &self.chunks {
            stats.live_entries += chunk.len();
            stats.entry_capacity += chunk.entry_capacity();
            stats.cached_pairs += chunk.pairs().len();
            stats.pair_capacity += chunk.pair_capacity();
        }
        stats
    }
}
