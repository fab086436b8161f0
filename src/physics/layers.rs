//! Named collision layers and the symmetric matrix deciding which pairs interact.

use super::error::LayerError;

/// One bit per layer in a `u32` mask.
pub const MAX_LAYERS: usize = 32;

/// Which layers collide with which.
///
/// Each registered name gets the bit `1 << index`. The matrix is built once
/// from a lower-triangular table and is symmetric afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollisionMatrix {
    names: Vec<String>,
    masks: Vec<u32>,
}

impl CollisionMatrix {
    /// Build from layer names and a lower-triangular table.
    ///
    /// Row `i` holds `i + 1` flags; `rows[i][j]` says whether layer `i`
    /// collides with layer `j` (for `j <= i`).
    ///
    /// ```
    /// use impulse2d::CollisionMatrix;
    ///
    /// let matrix = CollisionMatrix::from_table(
    ///     &["Default", "Player", "Bullet"],
    ///     &[vec![true], vec![true, false], vec![true, true, false]],
    /// )
    /// .unwrap();
    ///
    /// let player = matrix.layer("Player");
    /// let bullet = matrix.layer("Bullet");
    /// assert!(matrix.check(player, bullet));
    /// assert!(!matrix.check(bullet, bullet));
    /// ```
    pub fn from_table<S, R>(names: &[S], rows: &[R]) -> Result<Self, LayerError>
    where
        S: AsRef<str>,
        R: AsRef<[bool]>,
    {
        if names.is_empty() {
            return Err(LayerError::EmptyTable);
        }
        if names.len() > MAX_LAYERS {
            return Err(LayerError::TooManyLayers {
                count: names.len(),
                max: MAX_LAYERS,
            });
        }
        if rows.len() != names.len() {
            return Err(LayerError::RowLength {
                row: rows.len().min(names.len()),
                expected: names.len(),
                actual: rows.len(),
            });
        }

        let mut owned: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if owned.iter().any(|existing| existing == name) {
                return Err(LayerError::DuplicateLayer(name.to_owned()));
            }
            owned.push(name.to_owned());
        }

        let mut masks = vec![0u32; names.len()];
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != i + 1 {
                return Err(LayerError::RowLength {
                    row: i,
                    expected: i + 1,
                    actual: row.len(),
                });
            }
            for (j, &collides) in row.iter().enumerate() {
                if collides {
                    masks[i] |= 1 << j;
                    masks[j] |= 1 << i;
                }
            }
        }

        tracing::debug!(layers = owned.len(), "built collision matrix");
        Ok(Self {
            names: owned,
            masks,
        })
    }

    /// Bit for a registered layer name.
    ///
    /// # Panics
    ///
    /// Panics if `name` was never registered.
    pub fn layer(&self, name: &str) -> u32 {
        match self.try_layer(name) {
            Some(bit) => bit,
            None => panic!("unknown collision layer `{name}`"),
        }
    }

    pub fn try_layer(&self, name: &str) -> Option<u32> {
        self.names
            .iter()
            .position(|existing| existing == name)
            .map(|index| 1 << index)
    }

    /// Mask of every layer that `layer` collides with.
    ///
    /// # Panics
    ///
    /// Panics if `layer` is not a single registered bit.
    pub fn mask(&self, layer: u32) -> u32 {
        self.masks[self.index_of(layer)]
    }

    /// True when objects on `a` and `b` should interact.
    pub fn check(&self, a: u32, b: u32) -> bool {
        (self.mask(a) & b) == b || (self.mask(b) & a) == a
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn index_of(&self, layer: u32) -> usize {
        let index = layer.trailing_zeros() as usize;
        if !layer.is_power_of_two() || index >= self.masks.len() {
            panic!("unregistered collision layer bit {layer:#x}");
        }
        index
    }
}

impl Default for CollisionMatrix {
    /// A single `Default` layer that collides with itself.
    fn default() -> Self {
        Self {
            names: vec!["Default".to_owned()],
            masks: vec![1],
        }
    }
}
