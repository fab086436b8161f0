//! Narrowphase collision detection: circle and oriented-rectangle tests.

use glam::Vec2;

use crate::ecs::components::physics::{ColliderShape, RectShape};
use crate::ecs::components::transform::Transform;

use super::contact::ContactInfo;
use super::math::{approx_eq, EPSILON};

/// Detect a collision between two shapes. The normal points from A to B.
pub fn detect_collision(
    shape_a: &ColliderShape,
    transform_a: &Transform,
    shape_b: &ColliderShape,
    transform_b: &Transform,
) -> Option<ContactInfo> {
    match (shape_a, shape_b) {
        (ColliderShape::Circle { radius: ra }, ColliderShape::Circle { radius: rb }) => {
            circle_circle(*ra, transform_a.position, *rb, transform_b.position)
        }
        (ColliderShape::Circle { radius }, ColliderShape::Rect(rect)) => {
            circle_rect(*radius, transform_a.position, rect, transform_b)
        }
        (ColliderShape::Rect(rect), ColliderShape::Circle { radius }) => {
            circle_rect(*radius, transform_b.position, rect, transform_a).map(ContactInfo::flipped)
        }
        (ColliderShape::Rect(rect_a), ColliderShape::Rect(rect_b)) => {
            rect_rect(rect_a, transform_a, rect_b, transform_b)
        }
    }
}

/// Circle-circle test. Coincident centres fall back to a +X normal.
pub fn circle_circle(
    radius_a: f32,
    position_a: Vec2,
    radius_b: f32,
    position_b: Vec2,
) -> Option<ContactInfo> {
    let diff = position_b - position_a;
    let radii = radius_a + radius_b;
    let dist_sq = diff.length_squared();
    if dist_sq >= radii * radii {
        return None;
    }

    let dist = dist_sq.sqrt();
    if approx_eq(dist, 0.0) {
        return Some(ContactInfo::single(Vec2::X, radius_a, position_a));
    }

    let normal = diff / dist;
    Some(ContactInfo::single(
        normal,
        radii - dist,
        normal * radius_a + position_a,
    ))
}

/// Circle (A) against an oriented rectangle (B).
pub fn circle_rect(
    radius: f32,
    center: Vec2,
    rect: &RectShape,
    rect_transform: &Transform,
) -> Option<ContactInfo> {
    let rotation = rect_transform.rotation_matrix();
    let local = rect_transform.to_local(center);

    // Face of least penetration
    let mut separation = f32::MIN;
    let mut face = 0;
    for (i, (normal, vertex)) in rect.normals().iter().zip(rect.vertices()).enumerate() {
        let s = normal.dot(local - *vertex);
        if s > radius {
            return None;
        }
        if s > separation {
            separation = s;
            face = i;
        }
    }

    let face_normal = rect.normals()[face];
    let (v1, v2) = rect.face(face);

    // Centre inside the rectangle
    if separation < EPSILON {
        let normal = -(rotation * face_normal);
        return Some(ContactInfo::single(normal, radius, normal * radius + center));
    }

    let penetration = radius - separation;
    let radius_sq = radius * radius;

    let corner = if (local - v1).dot(v2 - v1) <= 0.0 {
        Some(v1)
    } else if (local - v2).dot(v1 - v2) <= 0.0 {
        Some(v2)
    } else {
        None
    };

    match corner {
        Some(vertex) => {
            if local.distance_squared(vertex) > radius_sq {
                return None;
            }
            let normal = (rotation * (vertex - local)).normalize_or_zero();
            Some(ContactInfo::single(
                normal,
                penetration,
                rect_transform.to_world(vertex),
            ))
        }
        None => {
            if (local - v1).dot(face_normal) > radius {
                return None;
            }
            let normal = -(rotation * face_normal);
            Some(ContactInfo::single(
                normal,
                penetration,
                normal * radius + center,
            ))
        }
    }
}

/// Largest separation of `b` along any face normal of `a`, with that face.
fn find_axis_least_penetration(
    a: &RectShape,
    transform_a: &Transform,
    b: &RectShape,
    transform_b: &Transform,
) -> (f32, usize) {
    let rotation_a = transform_a.rotation_matrix();
    let to_b = transform_b.rotation_matrix().transpose();

    let mut best_distance = f32::MIN;
    let mut best_face = 0;
    for (i, (normal, vertex)) in a.normals().iter().zip(a.vertices()).enumerate() {
        let n = to_b * (rotation_a * *normal);
        let support = b.support(-n);
        let v = transform_b.to_local(transform_a.to_world(*vertex));
        let distance = n.dot(support - v);
        if distance > best_distance {
            best_distance = distance;
            best_face = i;
        }
    }
    (best_distance, best_face)
}

/// Rectangle-rectangle SAT with reference/incident face clipping.
pub fn rect_rect(
    rect_a: &RectShape,
    transform_a: &Transform,
    rect_b: &RectShape,
    transform_b: &Transform,
) -> Option<ContactInfo> {
    let (penetration_a, face_a) = find_axis_least_penetration(rect_a, transform_a, rect_b, transform_b);
    if penetration_a >= 0.0 {
        return None;
    }
    let (penetration_b, face_b) = find_axis_least_penetration(rect_b, transform_b, rect_a, transform_a);
    if penetration_b >= 0.0 {
        return None;
    }

    let (reference, reference_transform, incident, incident_transform, reference_face, flip) =
        if penetration_a >= penetration_b {
            (rect_a, transform_a, rect_b, transform_b, face_a, false)
        } else {
            (rect_b, transform_b, rect_a, transform_a, face_b, true)
        };

    // Incident face: most anti-parallel to the reference normal
    let reference_normal = reference_transform.rotation_matrix() * reference.normals()[reference_face];
    let in_incident = incident_transform.rotation_matrix().transpose() * reference_normal;
    let mut incident_face = 0;
    let mut min_dot = f32::MAX;
    for (i, normal) in incident.normals().iter().enumerate() {
        let d = in_incident.dot(*normal);
        if d < min_dot {
            min_dot = d;
            incident_face = i;
        }
    }
    let (i1, i2) = incident.face(incident_face);
    let incident_points = [
        incident_transform.to_world(i1),
        incident_transform.to_world(i2),
    ];

    let (r1, r2) = reference.face(reference_face);
    let v1 = reference_transform.to_world(r1);
    let v2 = reference_transform.to_world(r2);
    let side = (v2 - v1).normalize_or_zero();
    let face_normal = Vec2::new(side.y, -side.x);
    let offset = face_normal.dot(v1);

    let mut points = [Vec2::ZERO; 2];
    let mut count = 0;
    let mut depth = 0.0;
    for point in incident_points {
        let separation = face_normal.dot(point) - offset;
        if separation <= 0.0 {
            points[count] = point;
            count += 1;
            depth -= separation;
        }
    }
    if count == 0 {
        return None;
    }

    let normal = if flip { -face_normal } else { face_normal };
    Some(ContactInfo::from_points(
        normal,
        depth / count as f32,
        points,
        count,
    ))
}
