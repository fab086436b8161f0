//! Grid cell addressing.

use glam::Vec2;

use crate::physics::collider::Aabb;

const HASH_SEED: i32 = 647;
const HASH_KEY_PRIME: i32 = 307;
const HASH_COUNT_PRIME: i32 = 367;

/// Packed cell coordinate: the low 16 bits of x in the high half, the low 16
/// bits of y in the low half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey(i32);

impl CellKey {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self(((x as i16 as i32) << 16) | (y as i16 as u16 as i32))
    }

    /// Key of the cell containing `point`.
    #[inline]
    pub fn containing(point: Vec2, cell_size: f32) -> Self {
        let (x, y) = cell_coords(point, cell_size);
        Self::new(x, y)
    }

    #[inline]
    pub fn x(self) -> i32 {
        self.0 >> 16
    }

    #[inline]
    pub fn y(self) -> i32 {
        self.0 as i16 as i32
    }

    #[inline]
    pub fn raw(self) -> i32 {
        self.0
    }
}

#[inline]
pub fn cell_coords(point: Vec2, cell_size: f32) -> (i32, i32) {
    (
        (point.x / cell_size).floor() as i32,
        (point.y / cell_size).floor() as i32,
    )
}

/// Every cell an AABB touches, x-major.
pub fn cells_for(aabb: &Aabb, cell_size: f32) -> impl Iterator<Item = CellKey> {
    let (min_x, min_y) = cell_coords(aabb.min, cell_size);
    let (max_x, max_y) = cell_coords(aabb.max, cell_size);
    (min_x..=max_x).flat_map(move |x| (min_y..=max_y).map(move |y| CellKey::new(x, y)))
}

/// Order-independent fingerprint of a set of cells.
pub fn chunks_hash<I>(keys: I) -> i32
where
    I: IntoIterator<Item = CellKey>,
{
    let mut hash = HASH_SEED;
    let mut count = 0i32;
    for key in keys {
        hash ^= key.raw().wrapping_mul(HASH_KEY_PRIME);
        count = count.wrapping_add(1);
    }
    hash ^ count.wrapping_mul(HASH_COUNT_PRIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_unpacks() {
        for (x, y) in [(0, 0), (3, -7), (-1, -1), (-300, 512), (32767, -32768)] {
            let key = CellKey::new(x, y);
            assert_eq!((key.x(), key.y()), (x, y));
        }
    }

    #[test]
    fn test_negative_coordinates_floor() {
        assert_eq!(cell_coords(Vec2::new(-0.1, 49.9), 50.0), (-1, 0));
        assert_eq!(cell_coords(Vec2::new(50.0, -50.0), 50.0), (1, -1));
    }

    #[test]
    fn test_cells_contain_aabb_corners() {
        let aabb = Aabb::new(Vec2::new(-12.0, 30.0), Vec2::new(75.0, 140.0));
        let cells: Vec<CellKey> = cells_for(&aabb, 50.0).collect();

        let corners = [
            aabb.min,
            aabb.max,
            Vec2::new(aabb.min.x, aabb.max.y),
            Vec2::new(aabb.max.x, aabb.min.y),
        ];
        for corner in corners {
            assert!(cells.contains(&CellKey::containing(corner, 50.0)));
        }
        // x in -1..=1, y in 0..=2
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], CellKey::new(-1, 0));
        assert_eq!(cells[1], CellKey::new(-1, 1));
    }

    #[test]
    fn test_hash_ignores_order() {
        let a = [CellKey::new(0, 0), CellKey::new(1, 0), CellKey::new(0, -1)];
        let b = [CellKey::new(0, -1), CellKey::new(0, 0), CellKey::new(1, 0)];
        assert_eq!(chunks_hash(a), chunks_hash(b));
        assert_ne!(chunks_hash(a), chunks_hash(a[..2].iter().copied()));
    }
}
