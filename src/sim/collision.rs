//! Narrow-phase collision tests for circles and axis-aligned boxes
//!
//! Bodies never rotate (infinite moment), so boxes stay axis-aligned and
//! every test reduces to clamping and per-axis overlap.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Collision shape attached to a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    Box { half: Vec2 },
}

impl Shape {
    /// Axis-aligned bounds of the shape centered at `pos`
    pub fn aabb(&self, pos: Vec2) -> Aabb {
        let half = match *self {
            Shape::Circle { radius } => Vec2::splat(radius),
            Shape::Box { half } => half,
        };
        Aabb {
            min: pos - half,
            max: pos + half,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// Result of a collision check
#[derive(Debug, Clone)]
pub struct CollisionResult {
    /// Whether a collision occurred
    pub hit: bool,
    /// Unit normal pointing from the first shape toward the second
    pub normal: Vec2,
    /// Penetration depth (for position correction)
    pub penetration: f32,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            normal: Vec2::ZERO,
            penetration: 0.0,
        }
    }

    fn hit(normal: Vec2, penetration: f32) -> Self {
        Self {
            hit: true,
            normal,
            penetration,
        }
    }

    fn flipped(mut self) -> Self {
        self.normal = -self.normal;
        self
    }
}

/// Dispatch to the right pairwise test; normal points from `a` to `b`
pub fn collide(a_pos: Vec2, a: &Shape, b_pos: Vec2, b: &Shape) -> CollisionResult {
    match (*a, *b) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(a_pos, ra, b_pos, rb)
        }
        (Shape::Circle { radius }, Shape::Box { half }) => circle_box(a_pos, radius, b_pos, half),
        (Shape::Box { half }, Shape::Circle { radius }) => {
            circle_box(b_pos, radius, a_pos, half).flipped()
        }
        (Shape::Box { half: ha }, Shape::Box { half: hb }) => box_box(a_pos, ha, b_pos, hb),
    }
}

pub fn circle_circle(a_pos: Vec2, ra: f32, b_pos: Vec2, rb: f32) -> CollisionResult {
    let d = b_pos - a_pos;
    let dist = d.length();
    let reach = ra + rb;
    if dist >= reach {
        return CollisionResult::miss();
    }
    // Concentric circles: pick an arbitrary separating axis
    let normal = if dist > 1e-6 { d / dist } else { Vec2::X };
    CollisionResult::hit(normal, reach - dist)
}

pub fn circle_box(c_pos: Vec2, radius: f32, b_pos: Vec2, half: Vec2) -> CollisionResult {
    let local = c_pos - b_pos;
    let closest = local.clamp(-half, half);
    let inside = closest == local;

    if !inside {
        let d = closest - local;
        let dist = d.length();
        if dist >= radius {
            return CollisionResult::miss();
        }
        return CollisionResult::hit(d / dist.max(1e-6), radius - dist);
    }

    // Center is inside the box: push out through the nearest face
    let dx = half.x - local.x.abs();
    let dy = half.y - local.y.abs();
    if dx < dy {
        let outward = Vec2::new(local.x.signum(), 0.0);
        CollisionResult::hit(-outward, radius + dx)
    } else {
        let outward = Vec2::new(0.0, local.y.signum());
        CollisionResult::hit(-outward, radius + dy)
    }
}

pub fn box_box(a_pos: Vec2, ha: Vec2, b_pos: Vec2, hb: Vec2) -> CollisionResult {
    let d = b_pos - a_pos;
    let overlap = (ha + hb) - d.abs();
    if overlap.x <= 0.0 || overlap.y <= 0.0 {
        return CollisionResult::miss();
    }
    if overlap.x < overlap.y {
        let sx = if d.x >= 0.0 { 1.0 } else { -1.0 };
        CollisionResult::hit(Vec2::new(sx, 0.0), overlap.x)
    } else {
        let sy = if d.y >= 0.0 { 1.0 } else { -1.0 };
        CollisionResult::hit(Vec2::new(0.0, sy), overlap.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_circle_hit_and_miss() {
        let r = circle_circle(Vec2::ZERO, 10.0, Vec2::new(15.0, 0.0), 10.0);
        assert!(r.hit);
        assert!((r.normal - Vec2::X).length() < 1e-6);
        assert!((r.penetration - 5.0).abs() < 1e-6);

        let r = circle_circle(Vec2::ZERO, 10.0, Vec2::new(25.0, 0.0), 10.0);
        assert!(!r.hit);
    }

    #[test]
    fn test_circle_box_outside() {
        // Circle just below a box, overlapping its bottom face
        let r = circle_box(Vec2::new(0.0, -18.0), 5.0, Vec2::ZERO, Vec2::splat(15.0));
        assert!(r.hit);
        assert!((r.normal - Vec2::Y).length() < 1e-6);
        assert!((r.penetration - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_circle_box_inside_pushes_through_nearest_face() {
        let r = circle_box(Vec2::new(12.0, 0.0), 5.0, Vec2::ZERO, Vec2::splat(15.0));
        assert!(r.hit);
        // Nearest face is +x, so the box lies toward -x from the circle
        assert!((r.normal - Vec2::NEG_X).length() < 1e-6);
        assert!((r.penetration - 8.0).abs() < 1e-5);
    }

    #[test]
    fn test_box_box_min_axis() {
        let r = box_box(Vec2::ZERO, Vec2::splat(15.0), Vec2::new(25.0, 3.0), Vec2::splat(15.0));
        assert!(r.hit);
        assert_eq!(r.normal, Vec2::X);
        assert!((r.penetration - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_collide_flips_box_circle() {
        let circle = Shape::Circle { radius: 5.0 };
        let bx = Shape::Box { half: Vec2::splat(15.0) };
        let a = collide(Vec2::new(0.0, -18.0), &circle, Vec2::ZERO, &bx);
        let b = collide(Vec2::ZERO, &bx, Vec2::new(0.0, -18.0), &circle);
        assert!(a.hit && b.hit);
        assert!((a.normal + b.normal).length() < 1e-6);
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Shape::Circle { radius: 5.0 }.aabb(Vec2::ZERO);
        let b = Shape::Box { half: Vec2::splat(5.0) }.aabb(Vec2::new(9.0, 0.0));
        let c = Shape::Box { half: Vec2::splat(5.0) }.aabb(Vec2::new(11.0, 0.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
