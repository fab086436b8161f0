//! Ray queries: grid traversal plus exact ray-vs-shape tests.

use glam::Vec2;
use hecs::Entity;

use crate::ecs::components::physics::{Collider, ColliderShape, Ray, RectShape};
use crate::ecs::components::transform::Transform;
use crate::ecs::World;

use super::broadphase::cell::cell_coords;
use super::broadphase::{Broadphase, CellKey};
use super::collider::Aabb;
use super::layers::CollisionMatrix;
use super::math::{approx_eq, cross, EPSILON};

/// Nearest shape hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Entity,
    pub point: Vec2,
}

/// Cells crossed by a segment, in order, with the points where the segment
/// enters each of them.
///
/// `points[i]` and `points[i + 1]` bound the part of the segment inside
/// `cells[i]`, so there is always one more point than cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Traversal {
    pub cells: Vec<CellKey>,
    pub points: Vec<Vec2>,
}

/// Amanatides-Woo walk from the cell holding `source` to the one holding
/// `target`. Consecutive cells always share an edge.
pub fn traverse(source: Vec2, target: Vec2, cell_size: f32) -> Traversal {
    let (mut x, mut y) = cell_coords(source, cell_size);
    let (end_x, end_y) = cell_coords(target, cell_size);
    let delta = target - source;

    let step_x = axis_step(delta.x);
    let step_y = axis_step(delta.y);
    let boundary = |c: i32, step: i32| -> f32 {
        if step > 0 {
            (c + 1) as f32 * cell_size
        } else {
            c as f32 * cell_size
        }
    };

    // Ray parameter (0 at source, 1 at target) of the next boundary crossing
    let mut t_max_x = if step_x != 0 {
        (boundary(x, step_x) - source.x) / delta.x
    } else {
        f32::INFINITY
    };
    let mut t_max_y = if step_y != 0 {
        (boundary(y, step_y) - source.y) / delta.y
    } else {
        f32::INFINITY
    };
    let t_delta_x = if step_x != 0 {
        cell_size / delta.x.abs()
    } else {
        f32::INFINITY
    };
    let t_delta_y = if step_y != 0 {
        cell_size / delta.y.abs()
    } else {
        f32::INFINITY
    };

    let steps = (end_x - x).unsigned_abs() as usize + (end_y - y).unsigned_abs() as usize;
    let mut cells = Vec::with_capacity(steps + 1);
    let mut points = Vec::with_capacity(steps + 2);
    cells.push(CellKey::new(x, y));
    points.push(source);

    for _ in 0..steps {
        let step_along_x = y == end_y || (x != end_x && t_max_x < t_max_y);
        let t = if step_along_x {
            x += step_x;
            let t = t_max_x;
            t_max_x += t_delta_x;
            t
        } else {
            y += step_y;
            let t = t_max_y;
            t_max_y += t_delta_y;
            t
        };
        cells.push(CellKey::new(x, y));
        points.push(source + delta * t.clamp(0.0, 1.0));
    }
    points.push(target);

    Traversal { cells, points }
}

#[inline]
fn axis_step(d: f32) -> i32 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

/// First point where the segment `source..target` meets a circle.
pub fn ray_circle(source: Vec2, target: Vec2, center: Vec2, radius: f32) -> Option<Vec2> {
    let d = target - source;
    let f = source - center;
    let a = d.dot(d);
    if a <= EPSILON {
        return None;
    }
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let in_range = |t: f32| (0.0..=1.0).contains(&t);
    let t = if approx_eq(discriminant, 0.0) {
        Some(-b / (2.0 * a)).filter(|t| in_range(*t))
    } else {
        let root = discriminant.sqrt();
        let near = (-b - root) / (2.0 * a);
        let far = (-b + root) / (2.0 * a);
        [near, far].into_iter().find(|t| in_range(*t))
    }?;
    Some(source + d * t)
}

/// First point where the segment `source..target` crosses a rectangle edge.
pub fn ray_rect(source: Vec2, target: Vec2, rect: &RectShape, transform: &Transform) -> Option<Vec2> {
    let b = target - source;
    let mut best: Option<f32> = None;
    for i in 0..4 {
        let (v1, v2) = rect.face(i);
        let start = transform.to_world(v1);
        let d = transform.to_world(v2) - start;

        let denom = cross(b, d);
        if approx_eq(denom, 0.0) {
            continue;
        }
        let c = start - source;
        let t = cross(c, d) / denom;
        let u = cross(c, b) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) && best.map_or(true, |bt| t < bt) {
            best = Some(t);
        }
    }
    best.map(|t| source + b * t)
}

fn intersect(source: Vec2, target: Vec2, collider: &Collider, transform: &Transform) -> Option<Vec2> {
    match &collider.shape {
        ColliderShape::Circle { radius } => ray_circle(source, target, transform.position, *radius),
        ColliderShape::Rect(rect) => ray_rect(source, target, rect, transform),
    }
}

/// Slack on the ray parameter when testing whether a hit lies in a cell's
/// part of the segment.
const SEGMENT_SLACK: f32 = 1e-5;

/// Nearest hit along `source..target` on shapes whose layer the ray may see.
///
/// Cells are visited in order and the search stops at the first cell that
/// yields a hit inside that cell's part of the segment; within that cell the
/// hit closest to where the ray entered it wins. A shape whose first crossing
/// lies further along is picked up by the cell that crossing falls in. Cells
/// that were never populated are skipped.
pub fn cast(
    world: &hecs::World,
    broadphase: &Broadphase,
    matrix: &CollisionMatrix,
    source: Vec2,
    target: Vec2,
    layer: u32,
    exclude: Option<Entity>,
) -> Option<RayHit> {
    let traversal = traverse(source, target, broadphase.cell_size());
    let delta = target - source;
    let length_sq = delta.length_squared();
    let param = |point: Vec2| {
        if length_sq > EPSILON {
            (point - source).dot(delta) / length_sq
        } else {
            0.0
        }
    };

    for (i, key) in traversal.cells.iter().enumerate() {
        let entry_point = traversal.points[i];
        let exit_point = traversal.points[i + 1];
        let segment = Aabb::from_points(entry_point, exit_point);
        let t_enter = param(entry_point) - SEGMENT_SLACK;
        let t_exit = param(exit_point) + SEGMENT_SLACK;
        let Some(chunk) = broadphase.chunk(*key) else {
            continue;
        };

        let mut best: Option<(RayHit, f32)> = None;
        for entry in chunk.entries() {
            let Some(entity) = entry.entity else {
                continue;
            };
            let Some(aabb) = broadphase.aabb(entry.aabb) else {
                continue;
            };
            if !segment.overlaps(aabb) {
                continue;
            }
            if !matrix.check(layer, entry.layer) {
                continue;
            }
            if exclude == Some(entity) {
                continue;
            }
            let (Ok(transform), Ok(collider)) =
                (world.get::<&Transform>(entity), world.get::<&Collider>(entity))
            else {
                continue;
            };
            let Some(point) = intersect(source, target, &collider, &transform) else {
                continue;
            };
            if !(t_enter..=t_exit).contains(&param(point)) {
                continue;
            }

            let distance_sq = entry_point.distance_squared(point);
            if best.map_or(true, |(_, d)| distance_sq < d) {
                best = Some((RayHit { entity, point }, distance_sq));
            }
        }

        if let Some((hit, _)) = best {
            return Some(hit);
        }
    }
    None
}

/// Recast every [`Ray`] component from its owner's current transform.
pub fn update_rays(world: &mut World, broadphase: &Broadphase, matrix: &CollisionMatrix) {
    for entity in world.filter::<(&Transform, &Ray)>() {
        let Ok((transform, ray)) = world.query_one_mut::<(&Transform, &mut Ray)>(entity) else {
            continue;
        };
        ray.source = transform.position;
        ray.rotation = transform.rotation;
        ray.hit = false;
        let ray = *ray;

        let hit = cast(
            world,
            broadphase,
            matrix,
            ray.source,
            ray.target(),
            ray.layer,
            Some(entity),
        );

        if let (Some(hit), Ok(mut stored)) = (hit, world.get::<&mut Ray>(entity)) {
            stored.hit = true;
            stored.hit_point = hit.point;
        }
    }
}
