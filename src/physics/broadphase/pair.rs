//! Unordered entity pairs.

use std::hash::{Hash, Hasher};

use hecs::Entity;

/// Two entities that may be colliding.
///
/// `Pair::new(a, b) == Pair::new(b, a)` and both hash alike, while the
/// original orientation is kept for the narrowphase.
#[derive(Debug, Clone, Copy)]
pub struct Pair {
    pub a: Entity,
    pub b: Entity,
}

impl Pair {
    #[inline]
    pub fn new(a: Entity, b: Entity) -> Self {
        Self { a, b }
    }

    #[inline]
    fn ordered(&self) -> (u64, u64) {
        let a = self.a.to_bits().get();
        let b = self.b.to_bits().get();
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.a == entity || self.b == entity
    }
}

impl PartialEq for Pair {
    fn eq(&self, other: &Self) -> bool {
        self.ordered() == other.ordered()
    }
}

impl Eq for Pair {}

impl Hash for Pair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ordered().hash(state);
    }
}
