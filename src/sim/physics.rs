//! Impulse-based 2D rigid body solver
//!
//! Bodies never rotate; gravity is zero. Each step integrates forces,
//! applies damping and a per-body speed cap, moves bodies, then finds
//! overlapping pairs through a spatial hash and resolves them with
//! positional correction plus a normal/friction impulse.
//!
//! Pairs whose collision types were registered with [`PhysicsWorld::add_route`]
//! are reported to a [`CollisionHandler`], which may ignore the contact
//! (no physical response) or let it resolve. Handlers never remove bodies
//! mid-step; they queue entity handles for the orchestrator to reap.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, Shape, collide};
use super::entity::EntityId;

/// Broad-phase bucket size in world units
const BROAD_CELL: f32 = 60.0;

/// Collision category used to route contacts to handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollisionType {
    Player,
    Wall,
    Enemy,
    Bullet,
    Placeable,
    Explosion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyKind {
    Static,
    Dynamic,
    Kinematic,
}

/// Stable generational handle to a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyHandle {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Force accumulated this tick; cleared after each step
    pub force: Vec2,
    pub mass: f32,
    pub kind: BodyKind,
    pub shape: Shape,
    pub collision_type: CollisionType,
    pub elasticity: f32,
    pub friction: f32,
    /// Overrides the world damping when set
    pub damping: Option<f32>,
    pub max_velocity: f32,
    /// Sensors report contacts but never receive a physical response
    pub sensor: bool,
    pub entity: Option<EntityId>,
}

impl Body {
    pub fn dynamic(shape: Shape, mass: f32, collision_type: CollisionType) -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            force: Vec2::ZERO,
            mass,
            kind: BodyKind::Dynamic,
            shape,
            collision_type,
            elasticity: 0.0,
            friction: 0.0,
            damping: None,
            max_velocity: f32::INFINITY,
            sensor: false,
            entity: None,
        }
    }

    pub fn fixed(shape: Shape, collision_type: CollisionType) -> Self {
        Self {
            kind: BodyKind::Static,
            mass: f32::INFINITY,
            ..Self::dynamic(shape, 1.0, collision_type)
        }
    }

    pub fn at(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = Some(damping);
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: f32) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    pub fn with_elasticity(mut self, elasticity: f32) -> Self {
        self.elasticity = elasticity;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    pub fn owned_by(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    fn inv_mass(&self) -> f32 {
        match self.kind {
            BodyKind::Dynamic if self.mass > 0.0 && self.mass.is_finite() => 1.0 / self.mass,
            _ => 0.0,
        }
    }
}

/// A touching pair, oriented so that `type_a` matches the registered route
#[derive(Debug, Clone)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    pub entity_a: Option<EntityId>,
    pub entity_b: Option<EntityId>,
    pub type_a: CollisionType,
    pub type_b: CollisionType,
    pub pos_a: Vec2,
    pub pos_b: Vec2,
    /// Unit normal from `a` toward `b`
    pub normal: Vec2,
    pub penetration: f32,
}

/// Whether the solver should physically separate a routed pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactResponse {
    Resolve,
    Ignore,
}

pub trait CollisionHandler {
    fn on_contact(&mut self, contact: &Contact) -> ContactResponse;
}

/// Handler that lets every contact resolve
pub struct NoHandler;

impl CollisionHandler for NoHandler {
    fn on_contact(&mut self, _contact: &Contact) -> ContactResponse {
        ContactResponse::Resolve
    }
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    body: Option<Body>,
}

/// Owns every body and steps them together
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    /// Fraction of velocity kept per second
    pub damping: f32,
    slots: Vec<Slot>,
    free: Vec<u32>,
    routes: HashSet<(CollisionType, CollisionType)>,
    grid: HashMap<(i32, i32), Vec<u32>>,
}

impl PhysicsWorld {
    pub fn new(damping: f32) -> Self {
        Self {
            damping,
            slots: Vec::new(),
            free: Vec::new(),
            routes: HashSet::new(),
            grid: HashMap::new(),
        }
    }

    /// Report contacts between these two types to the handler
    pub fn add_route(&mut self, a: CollisionType, b: CollisionType) {
        self.routes.insert((a, b));
    }

    pub fn insert(&mut self, body: Body) -> BodyHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.body = Some(body);
            return BodyHandle {
                index,
                generation: slot.generation,
            };
        }
        self.slots.push(Slot {
            generation: 0,
            body: Some(body),
        });
        BodyHandle {
            index: (self.slots.len() - 1) as u32,
            generation: 0,
        }
    }

    /// Remove a body; stale or already-removed handles return None
    pub fn remove(&mut self, handle: BodyHandle) -> Option<Body> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let body = slot.body.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        Some(body)
    }

    pub fn get(&self, handle: BodyHandle) -> Option<&Body> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_ref())
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.body.as_mut())
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.body.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn position(&self, handle: BodyHandle) -> Option<Vec2> {
        self.get(handle).map(|b| b.pos)
    }

    pub fn velocity(&self, handle: BodyHandle) -> Option<Vec2> {
        self.get(handle).map(|b| b.vel)
    }

    pub fn set_position(&mut self, handle: BodyHandle, pos: Vec2) {
        if let Some(body) = self.get_mut(handle) {
            body.pos = pos;
        }
    }

    /// Accumulate a force for the next step
    pub fn apply_force(&mut self, handle: BodyHandle, force: Vec2) {
        if let Some(body) = self.get_mut(handle) {
            body.force += force;
        }
    }

    /// Instant velocity change scaled by inverse mass
    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: Vec2) {
        if let Some(body) = self.get_mut(handle) {
            body.vel += impulse * body.inv_mass();
        }
    }

    fn handle_at(&self, index: u32) -> BodyHandle {
        BodyHandle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// Advance every body by `dt` and resolve contacts
    pub fn step(&mut self, dt: f32, handler: &mut impl CollisionHandler) {
        self.integrate(dt);
        self.rebuild_grid();

        for (ia, ib) in self.candidate_pairs() {
            self.narrow_phase(ia, ib, handler);
        }

        for slot in &mut self.slots {
            if let Some(body) = slot.body.as_mut() {
                body.force = Vec2::ZERO;
            }
        }
    }

    fn integrate(&mut self, dt: f32) {
        let world_damping = self.damping;
        for body in self.slots.iter_mut().filter_map(|s| s.body.as_mut()) {
            match body.kind {
                BodyKind::Static => continue,
                BodyKind::Kinematic => {}
                BodyKind::Dynamic => {
                    body.vel += body.force * body.inv_mass() * dt;
                    let damping = body.damping.unwrap_or(world_damping);
                    body.vel *= damping.powf(dt);
                    let speed = body.vel.length();
                    if speed > body.max_velocity {
                        body.vel *= body.max_velocity / speed;
                    }
                }
            }
            body.pos += body.vel * dt;
        }
    }

    fn cells_of(aabb: Aabb) -> impl Iterator<Item = (i32, i32)> {
        let x0 = (aabb.min.x / BROAD_CELL).floor() as i32;
        let y0 = (aabb.min.y / BROAD_CELL).floor() as i32;
        let x1 = (aabb.max.x / BROAD_CELL).floor() as i32;
        let y1 = (aabb.max.y / BROAD_CELL).floor() as i32;
        (x0..=x1).flat_map(move |x| (y0..=y1).map(move |y| (x, y)))
    }

    fn rebuild_grid(&mut self) {
        self.grid.clear();
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(body) = &slot.body {
                for cell in Self::cells_of(body.shape.aabb(body.pos)) {
                    self.grid.entry(cell).or_default().push(index as u32);
                }
            }
        }
    }

    /// Every overlapping-AABB pair involving at least one dynamic body, once
    fn candidate_pairs(&self) -> Vec<(u32, u32)> {
        let mut pairs = Vec::new();
        let mut seen = Vec::new();
        for (ia, slot) in self.slots.iter().enumerate() {
            let Some(a) = &slot.body else { continue };
            if a.kind != BodyKind::Dynamic {
                continue;
            }
            let a_box = a.shape.aabb(a.pos);
            seen.clear();
            for cell in Self::cells_of(a_box) {
                if let Some(bucket) = self.grid.get(&cell) {
                    seen.extend(bucket.iter().copied());
                }
            }
            seen.sort_unstable();
            seen.dedup();
            for &ib in &seen {
                if ib as usize == ia {
                    continue;
                }
                let Some(b) = &self.slots[ib as usize].body else { continue };
                // Dynamic pairs are visited from both sides; keep one
                if b.kind == BodyKind::Dynamic && (ib as usize) < ia {
                    continue;
                }
                if a_box.overlaps(&b.shape.aabb(b.pos)) {
                    pairs.push((ia as u32, ib));
                }
            }
        }
        pairs
    }

    fn narrow_phase(&mut self, ia: u32, ib: u32, handler: &mut impl CollisionHandler) {
        let (Some(a), Some(b)) = (
            self.slots[ia as usize].body.as_ref(),
            self.slots[ib as usize].body.as_ref(),
        ) else {
            return;
        };
        let result = collide(a.pos, &a.shape, b.pos, &b.shape);
        if !result.hit {
            return;
        }

        let (ta, tb) = (a.collision_type, b.collision_type);
        let sensor = a.sensor || b.sensor;
        let response = if self.routes.contains(&(ta, tb)) {
            handler.on_contact(&Contact {
                a: self.handle_at(ia),
                b: self.handle_at(ib),
                entity_a: a.entity,
                entity_b: b.entity,
                type_a: ta,
                type_b: tb,
                pos_a: a.pos,
                pos_b: b.pos,
                normal: result.normal,
                penetration: result.penetration,
            })
        } else if self.routes.contains(&(tb, ta)) {
            handler.on_contact(&Contact {
                a: self.handle_at(ib),
                b: self.handle_at(ia),
                entity_a: b.entity,
                entity_b: a.entity,
                type_a: tb,
                type_b: ta,
                pos_a: b.pos,
                pos_b: a.pos,
                normal: -result.normal,
                penetration: result.penetration,
            })
        } else {
            ContactResponse::Resolve
        };

        if sensor || response == ContactResponse::Ignore {
            return;
        }
        self.resolve(ia, ib, result.normal, result.penetration);
    }

    fn resolve(&mut self, ia: u32, ib: u32, normal: Vec2, penetration: f32) {
        let (Some(a), Some(b)) = (
            self.slots[ia as usize].body.as_ref(),
            self.slots[ib as usize].body.as_ref(),
        ) else {
            return;
        };
        let inv_a = a.inv_mass();
        let inv_b = b.inv_mass();
        let inv_sum = inv_a + inv_b;
        if inv_sum <= 0.0 {
            return;
        }

        let correction = normal * penetration / inv_sum;
        let rel = b.vel - a.vel;
        let vn = rel.dot(normal);
        let mut impulse = Vec2::ZERO;
        if vn < 0.0 {
            let e = a.elasticity * b.elasticity;
            let j = -(1.0 + e) * vn / inv_sum;
            impulse = normal * j;

            let tangent_vel = rel - normal * vn;
            let t_len = tangent_vel.length();
            let mu = a.friction * b.friction;
            if t_len > 1e-6 && mu > 0.0 {
                let tangent = tangent_vel / t_len;
                let jt = (-rel.dot(tangent) / inv_sum).clamp(-mu * j, mu * j);
                impulse += tangent * jt;
            }
        }

        if let Some(a) = self.slots[ia as usize].body.as_mut() {
            a.pos -= correction * inv_a;
            a.vel -= impulse * inv_a;
        }
        if let Some(b) = self.slots[ib as usize].body.as_mut() {
            b.pos += correction * inv_b;
            b.vel += impulse * inv_b;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn ball(pos: Vec2) -> Body {
        Body::dynamic(Shape::Circle { radius: 10.0 }, 1.0, CollisionType::Enemy).at(pos)
    }

    #[test]
    fn test_force_integrates_into_velocity() {
        let mut world = PhysicsWorld::new(1.0);
        let h = world.insert(ball(Vec2::ZERO));
        world.apply_force(h, Vec2::new(60.0, 0.0));
        world.step(DT, &mut NoHandler);
        let vel = world.velocity(h).unwrap();
        assert!((vel.x - 1.0).abs() < 1e-5);
        // Force accumulator is cleared
        world.step(DT, &mut NoHandler);
        assert!((world.velocity(h).unwrap().x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_damping_and_speed_cap() {
        let mut world = PhysicsWorld::new(0.01);
        let h = world.insert(ball(Vec2::ZERO).with_velocity(Vec2::new(100.0, 0.0)));
        world.step(DT, &mut NoHandler);
        let expected = 100.0 * 0.01_f32.powf(DT);
        assert!((world.velocity(h).unwrap().x - expected).abs() < 1e-3);

        let capped = world.insert(
            ball(Vec2::new(500.0, 500.0))
                .with_damping(1.0)
                .with_max_velocity(50.0)
                .with_velocity(Vec2::new(0.0, 400.0)),
        );
        world.step(DT, &mut NoHandler);
        assert!((world.velocity(capped).unwrap().length() - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_dynamic_pushed_out_of_static() {
        let mut world = PhysicsWorld::new(1.0);
        world.insert(
            Body::fixed(Shape::Box { half: Vec2::splat(15.0) }, CollisionType::Wall)
                .at(Vec2::new(0.0, 30.0)),
        );
        let h = world.insert(ball(Vec2::new(0.0, 10.0)).with_velocity(Vec2::new(0.0, 60.0)));
        world.step(DT, &mut NoHandler);
        let body = world.get(h).unwrap();
        // Bottom face of the wall is at y=15; ball radius 10
        assert!(body.pos.y <= 5.0 + 1e-3);
        assert!(body.vel.y <= 1e-3);
    }

    #[test]
    fn test_equal_masses_split_correction() {
        let mut world = PhysicsWorld::new(1.0);
        let a = world.insert(ball(Vec2::new(0.0, 0.0)));
        let b = world.insert(ball(Vec2::new(16.0, 0.0)));
        world.step(DT, &mut NoHandler);
        let pa = world.position(a).unwrap();
        let pb = world.position(b).unwrap();
        assert!((pb.x - pa.x - 20.0).abs() < 1e-3);
        assert!((pa.x + 2.0).abs() < 1e-3);
    }

    struct Recorder {
        seen: Vec<(CollisionType, CollisionType)>,
        response: ContactResponse,
    }

    impl CollisionHandler for Recorder {
        fn on_contact(&mut self, contact: &Contact) -> ContactResponse {
            self.seen.push((contact.type_a, contact.type_b));
            self.response
        }
    }

    #[test]
    fn test_routed_pair_is_oriented_and_can_be_ignored() {
        let mut world = PhysicsWorld::new(1.0);
        world.add_route(CollisionType::Bullet, CollisionType::Enemy);
        let enemy = world.insert(ball(Vec2::ZERO));
        world.insert(
            Body::dynamic(Shape::Circle { radius: 4.0 }, 0.1, CollisionType::Bullet)
                .at(Vec2::new(12.0, 0.0)),
        );
        let mut rec = Recorder {
            seen: Vec::new(),
            response: ContactResponse::Ignore,
        };
        world.step(DT, &mut rec);
        assert_eq!(rec.seen, vec![(CollisionType::Bullet, CollisionType::Enemy)]);
        // Ignored: the enemy did not move
        assert_eq!(world.position(enemy).unwrap(), Vec2::ZERO);
    }

    #[test]
    fn test_sensor_reports_without_response() {
        let mut world = PhysicsWorld::new(1.0);
        world.add_route(CollisionType::Enemy, CollisionType::Placeable);
        world.insert(
            Body::fixed(Shape::Circle { radius: 10.0 }, CollisionType::Placeable)
                .at(Vec2::new(5.0, 0.0))
                .sensor(),
        );
        let enemy = world.insert(ball(Vec2::ZERO));
        let mut rec = Recorder {
            seen: Vec::new(),
            response: ContactResponse::Resolve,
        };
        world.step(DT, &mut rec);
        assert_eq!(rec.seen.len(), 1);
        assert_eq!(world.position(enemy).unwrap(), Vec2::ZERO);
    }

    #[test]
    fn test_stale_handle_after_remove() {
        let mut world = PhysicsWorld::new(1.0);
        let h = world.insert(ball(Vec2::ZERO));
        assert!(world.remove(h).is_some());
        assert!(world.remove(h).is_none());
        let h2 = world.insert(ball(Vec2::ONE));
        assert!(!world.contains(h));
        assert!(world.contains(h2));
        assert_eq!(world.len(), 1);
    }
}
