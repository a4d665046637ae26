//! Headless stand-in for a physics engine: integrates point bodies against
//! the table's static surfaces and reports contact callbacks.

use std::collections::BTreeMap;

use flipshot_core::body::{PhysicsBody, PointBody};
use flipshot_core::ids::{BallId, SurfaceId};
use flipshot_core::math::Vec3;
use flipshot_pinball::surface::Surface;
use flipshot_pinball::{
    ContactEvent, ContactPhase, ContactTarget, SurfaceKind, SurfaceSet, SweepQuery, TableConfig,
};

/// Extra distance at which a resting ball still counts as touching.
const CONTACT_SKIN: f32 = 0.02;

/// Bounciness per surface kind.
fn restitution(kind: SurfaceKind) -> f32 {
    match kind {
        SurfaceKind::Ground => 0.0,
        SurfaceKind::Wall => 0.5,
        SurfaceKind::Bumper { .. } => 0.9,
        SurfaceKind::Paddle(_) => 0.2,
    }
}

fn contact_target(kind: SurfaceKind) -> ContactTarget {
    match kind {
        SurfaceKind::Ground => ContactTarget::Ground,
        SurfaceKind::Wall => ContactTarget::Other,
        SurfaceKind::Bumper { kick } => ContactTarget::Bumper { kick },
        SurfaceKind::Paddle(id) => ContactTarget::Paddle(id),
    }
}

#[derive(Debug, Clone, Copy)]
struct Touch {
    target: ContactTarget,
    normal: Vec3,
}

pub struct PhysicsWorld {
    gravity: Vec3,
    radius: f32,
    surfaces: SurfaceSet,
    touching: BTreeMap<BallId, BTreeMap<SurfaceId, Touch>>,
}

impl PhysicsWorld {
    pub fn new(config: &TableConfig, surfaces: SurfaceSet) -> Self {
        Self {
            gravity: config.physics.gravity,
            radius: config.ball.radius,
            surfaces,
            touching: BTreeMap::new(),
        }
    }

    /// Advance every body one tick and return the contact callbacks it
    /// produced, in ball then surface order.
    pub fn step<'a>(
        &mut self,
        dt: f32,
        bodies: impl Iterator<Item = (BallId, &'a mut PointBody)>,
    ) -> Vec<ContactEvent> {
        let mut events = Vec::new();
        let mut seen = Vec::new();
        for (ball, body) in bodies {
            seen.push(ball);
            let now = if body.is_kinematic() {
                BTreeMap::new()
            } else {
                self.advance(dt, body)
            };
            let before = self.touching.remove(&ball).unwrap_or_default();
            diff_contacts(ball, &before, &now, &mut events);
            self.touching.insert(ball, now);
        }
        self.touching.retain(|ball, _| seen.contains(ball));
        events
    }

    fn advance(&self, dt: f32, body: &mut PointBody) -> BTreeMap<SurfaceId, Touch> {
        let start = body.pose.position;
        body.integrate(dt, self.gravity);
        let motion = body.pose.position - start;
        if let Some(hit) = self.surfaces.sweep_sphere(start, self.radius, motion) {
            body.pose.position = hit.point;
        }

        let mut touching = BTreeMap::new();
        for surface in self.surfaces.iter() {
            if let Some(normal) = self.resolve(dt, body, surface) {
                touching.insert(
                    surface.id,
                    Touch {
                        target: contact_target(surface.kind),
                        normal,
                    },
                );
            }
        }
        touching
    }

    /// Push the body out of `surface` and cancel its approach velocity.
    /// Returns the contact normal when the two touch.
    fn resolve(&self, dt: f32, body: &mut PointBody, surface: &Surface) -> Option<Vec3> {
        let (distance, normal) = surface.shape.distance_and_normal(body.pose.position);
        if distance > self.radius + CONTACT_SKIN {
            return None;
        }
        if distance < self.radius {
            body.pose.position += body
                .constraints
                .filter_linear(normal * (self.radius - distance));
        }
        let approach = body.velocity.dot(normal);
        if approach < 0.0 {
            let bounce = normal * (approach * (1.0 + restitution(surface.kind)));
            body.velocity = body.constraints.filter_linear(body.velocity - bounce);
        }
        let damping = (1.0 - surface.friction * dt).clamp(0.0, 1.0);
        body.velocity = body.velocity * damping;
        Some(normal)
    }
}

fn diff_contacts(
    ball: BallId,
    before: &BTreeMap<SurfaceId, Touch>,
    now: &BTreeMap<SurfaceId, Touch>,
    events: &mut Vec<ContactEvent>,
) {
    for (surface, touch) in now {
        let phase = if before.contains_key(surface) {
            ContactPhase::Stay
        } else {
            ContactPhase::Begin
        };
        events.push(ContactEvent::new(ball, phase, touch.target, touch.normal));
    }
    for (surface, touch) in before {
        if !now.contains_key(surface) {
            events.push(ContactEvent::new(
                ball,
                ContactPhase::End,
                touch.target,
                touch.normal,
            ));
        }
    }
}
