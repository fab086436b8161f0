//! Physics components for ECS entities.

use glam::Vec2;

use crate::physics::math::approx_eq;

/// Default collision layer bit. Matches the first layer of
/// [`CollisionMatrix::default`](crate::physics::CollisionMatrix::default).
pub const DEFAULT_LAYER: u32 = 1;

/// Rigid body component.
///
/// Inverse mass and inverse inertia are cached and only change through
/// [`set_mass`](Self::set_mass) / [`set_inertia`](Self::set_inertia). A value
/// of zero (or below) means infinite mass: the body never moves in response
/// to collisions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    mass: f32,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
}

impl RigidBody {
    /// Create a body with the given mass and rotational inertia.
    pub fn new(mass: f32, inertia: f32) -> Self {
        let mut body = Self {
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            mass: 0.0,
            inv_mass: 0.0,
            inertia: 0.0,
            inv_inertia: 0.0,
        };
        body.set_mass(mass);
        body.set_inertia(inertia);
        body
    }

    /// Create a new dynamic rigid body with the given mass.
    pub fn new_dynamic(mass: f32) -> Self {
        // Unit inertia per unit mass
        Self::new(mass, mass)
    }

    /// Create a new immovable rigid body.
    pub fn new_static() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn with_velocity(mut self, linear_velocity: Vec2) -> Self {
        self.linear_velocity = linear_velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: f32) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    #[inline]
    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    #[inline]
    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.inv_mass = inverse_or_zero(mass);
    }

    pub fn set_inertia(&mut self, inertia: f32) {
        self.inertia = inertia;
        self.inv_inertia = inverse_or_zero(inertia);
    }

    /// Zero mass and inertia, making the body immovable.
    pub fn make_static(&mut self) {
        self.set_mass(0.0);
        self.set_inertia(0.0);
    }

    /// True when the body has infinite mass.
    #[inline]
    pub fn is_immovable(&self) -> bool {
        approx_eq(self.inv_mass, 0.0)
    }

    /// Instantaneous push: velocity += force / mass.
    pub fn apply_force(&mut self, force: Vec2) {
        self.linear_velocity += force * self.inv_mass;
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new_dynamic(1.0)
    }
}

#[inline]
fn inverse_or_zero(value: f32) -> f32 {
    if value <= 0.0 || approx_eq(value, 0.0) {
        0.0
    } else {
        1.0 / value
    }
}

/// Oriented rectangle geometry in local space.
///
/// Face `i` runs from `vertices[i]` to `vertices[(i + 1) % 4]` and has the
/// outward unit normal `normals[i]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectShape {
    half_extents: Vec2,
    vertices: [Vec2; 4],
    normals: [Vec2; 4],
}

impl RectShape {
    pub fn new(half_extents: Vec2) -> Self {
        let w = half_extents.x;
        let h = half_extents.y;
        Self {
            half_extents,
            vertices: [
                Vec2::new(-w, -h),
                Vec2::new(w, -h),
                Vec2::new(w, h),
                Vec2::new(-w, h),
            ],
            normals: [
                Vec2::new(0.0, -1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 1.0),
                Vec2::new(-1.0, 0.0),
            ],
        }
    }

    #[inline]
    pub fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec2; 4] {
        &self.vertices
    }

    #[inline]
    pub fn normals(&self) -> &[Vec2; 4] {
        &self.normals
    }

    /// Endpoints of face `index` in local space.
    #[inline]
    pub fn face(&self, index: usize) -> (Vec2, Vec2) {
        (self.vertices[index], self.vertices[(index + 1) % 4])
    }

    /// Vertex farthest along `direction` (first one wins on ties).
    pub fn support(&self, direction: Vec2) -> Vec2 {
        let mut best = self.vertices[0];
        let mut best_projection = f32::MIN;
        for vertex in self.vertices {
            let projection = vertex.dot(direction);
            if projection > best_projection {
                best_projection = projection;
                best = vertex;
            }
        }
        best
    }
}

/// Collider shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Circle { radius: f32 },
    Rect(RectShape),
}

/// Collision detection component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub shape: ColliderShape,
    /// Single layer bit registered in the collision matrix.
    pub layer: u32,
}

impl Collider {
    pub fn circle(radius: f32) -> Self {
        Self {
            shape: ColliderShape::Circle { radius },
            layer: DEFAULT_LAYER,
        }
    }

    pub fn rect(half_extents: Vec2) -> Self {
        Self {
            shape: ColliderShape::Rect(RectShape::new(half_extents)),
            layer: DEFAULT_LAYER,
        }
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }
}

impl Default for Collider {
    fn default() -> Self {
        Self::circle(0.5)
    }
}

/// Marks a body as immovable. Bodies carrying it always have zero inverse
/// mass and inertia.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticTag;

/// Ray attached to an entity, recast every tick from the entity's transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Layer bit used to filter hit candidates.
    pub layer: u32,
    pub length: f32,
    /// Ray origin, refreshed from the owner's position each tick.
    pub source: Vec2,
    /// Owner's rotation; the ray points along `(-sin, cos)` of it.
    pub rotation: f32,
    pub hit: bool,
    pub hit_point: Vec2,
}

impl Ray {
    pub fn new(length: f32) -> Self {
        Self {
            layer: DEFAULT_LAYER,
            length,
            source: Vec2::ZERO,
            rotation: 0.0,
            hit: false,
            hit_point: Vec2::ZERO,
        }
    }

    pub fn with_layer(mut self, layer: u32) -> Self {
        self.layer = layer;
        self
    }

    #[inline]
    pub fn direction(&self) -> Vec2 {
        direction_from_rotation(self.rotation)
    }

    /// End point of the ray.
    #[inline]
    pub fn target(&self) -> Vec2 {
        self.source + self.direction() * self.length
    }

    /// Where the ray stops: the hit point if any, otherwise its target.
    pub fn end_point(&self) -> Vec2 {
        if self.hit {
            self.hit_point
        } else {
            self.target()
        }
    }
}

/// Facing direction for a rotation: `(-sin θ, cos θ)`, i.e. +Y at zero.
#[inline]
pub fn direction_from_rotation(rotation: f32) -> Vec2 {
    let (sin, cos) = rotation.sin_cos();
    Vec2::new(-sin, cos)
}
