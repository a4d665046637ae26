use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use flipshot_core::body::{Constraints, PhysicsBody, Pose};
use flipshot_core::ids::BallId;
use flipshot_core::math::Vec3;

use crate::config::BallConfig;
use crate::contact::ContactPhase;
use crate::paddle::HitReceiver;

/// Lifecycle of a ball.
///
/// `Idle` and `Held` balls are kinematic and locked; `Launched` balls are
/// dynamic. `Grounded` is a launched ball rolling on ground geometry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallState {
    #[default]
    Idle,
    Held,
    Launched,
    Grounded,
}

impl BallState {
    pub fn is_in_play(&self) -> bool {
        matches!(self, Self::Launched | Self::Grounded)
    }
}

/// One ball and the body it drives.
#[derive(Debug, Clone)]
pub struct BallAgent<B> {
    id: BallId,
    state: BallState,
    body: Option<B>,
    assist_enabled: bool,
    config: BallConfig,
}

impl<B: PhysicsBody> BallAgent<B> {
    /// Wrap `body` as an idle ball, locking it in place.
    pub fn new(id: BallId, body: B, config: BallConfig) -> Self {
        let mut agent = Self {
            id,
            state: BallState::Idle,
            body: Some(body),
            assist_enabled: false,
            config,
        };
        if let Some(body) = agent.body.as_mut() {
            body.set_kinematic(true);
            body.set_constraints(Constraints::FREEZE_ALL);
        }
        agent
    }

    /// A ball whose body has not been attached yet. Every body operation is
    /// a no-op until [`attach`](Self::attach) is called.
    pub fn detached(id: BallId, config: BallConfig) -> Self {
        Self {
            id,
            state: BallState::Idle,
            body: None,
            assist_enabled: false,
            config,
        }
    }

    pub fn attach(&mut self, body: B) {
        self.body = Some(body);
        let pose = Pose::at(self.body.as_ref().map_or(Vec3::ZERO, |b| b.position()));
        self.reset(pose);
    }

    pub fn id(&self) -> BallId {
        self.id
    }

    pub fn state(&self) -> BallState {
        self.state
    }

    pub fn assist_enabled(&self) -> bool {
        self.assist_enabled
    }

    pub fn config(&self) -> &BallConfig {
        &self.config
    }

    pub fn body(&self) -> Option<&B> {
        self.body.as_ref()
    }

    pub fn body_mut(&mut self) -> Option<&mut B> {
        self.body.as_mut()
    }

    pub fn position(&self) -> Option<Vec3> {
        self.body.as_ref().map(|b| b.position())
    }

    pub fn velocity(&self) -> Option<Vec3> {
        self.body.as_ref().map(|b| b.velocity())
    }

    pub fn mass(&self) -> f32 {
        self.body.as_ref().map_or(self.config.mass, |b| b.mass())
    }

    /// Whether the ball sits within `tolerance` of `position`.
    pub fn is_at(&self, position: Vec3, tolerance: f32) -> bool {
        self.position()
            .is_some_and(|p| p.distance(position) <= tolerance)
    }

    /// Passive knock: make the body dynamic and push it without changing the
    /// lifecycle state. Ignored for idle/held balls, which stay kinematic.
    pub fn hit(&mut self, direction: Vec3, force: f32) {
        if matches!(self.state, BallState::Idle | BallState::Held) {
            tracing::debug!(ball = %self.id, state = ?self.state, "Ignoring hit on a ball at rest");
            return;
        }
        let Some(body) = self.body.as_mut() else {
            tracing::debug!(ball = %self.id, "hit on ball without body");
            return;
        };
        release(body);
        body.apply_impulse(direction.normalize_or_zero() * force);
    }

    /// Full launch: the ball enters play and receives an impulse of `force`
    /// along `direction`.
    pub fn launch(&mut self, direction: Vec3, force: f32) {
        let Some(body) = self.body.as_mut() else {
            tracing::debug!(ball = %self.id, "launch on ball without body");
            return;
        };
        self.state = BallState::Launched;
        release(body);
        body.apply_impulse(direction.normalize_or_zero() * force);
        tracing::info!(ball = %self.id, force, "Ball launched");
    }

    /// Return to `Idle` at `pose`: stopped, kinematic and fully locked.
    pub fn reset(&mut self, pose: Pose) {
        self.state = BallState::Idle;
        self.assist_enabled = false;
        let Some(body) = self.body.as_mut() else {
            tracing::debug!(ball = %self.id, "reset on ball without body");
            return;
        };
        body.set_velocity(Vec3::ZERO);
        body.set_angular_velocity(Vec3::ZERO);
        body.set_constraints(Constraints::FREEZE_ALL);
        body.set_kinematic(true);
        body.teleport(pose);
    }

    /// Switch between planar drag constraints and a full lock. The body stays
    /// kinematic either way.
    pub fn set_drag_mode(&mut self, dragging: bool) {
        let Some(body) = self.body.as_mut() else {
            tracing::debug!(ball = %self.id, "set_drag_mode on ball without body");
            return;
        };
        body.set_kinematic(true);
        body.set_constraints(if dragging {
            Constraints::PLANAR_DRAG
        } else {
            Constraints::FREEZE_ALL
        });
    }

    /// Kinematic placement; only honoured while the ball is held.
    pub fn move_to(&mut self, position: Vec3) {
        if self.state != BallState::Held {
            tracing::debug!(ball = %self.id, state = ?self.state, "move_to outside Held");
            return;
        }
        if let Some(body) = self.body.as_mut() {
            body.move_position(position);
        }
    }

    /// `Idle -> Held`. Returns false (and changes nothing) from any other state.
    pub fn hold(&mut self) -> bool {
        if self.state != BallState::Idle || self.body.is_none() {
            return false;
        }
        self.state = BallState::Held;
        true
    }

    /// Ground geometry contact: landing grounds a launched ball, leaving the
    /// ground makes it airborne again.
    pub fn on_ground_contact(&mut self, phase: ContactPhase) {
        match (phase, self.state) {
            (ContactPhase::Begin | ContactPhase::Stay, BallState::Launched) => {
                self.state = BallState::Grounded;
                self.assist_enabled = false;
            },
            (ContactPhase::End, BallState::Grounded) => {
                self.state = BallState::Launched;
            },
            _ => {},
        }
    }

    /// Fixed-tick update: engage the assist once a launched ball drops below
    /// the altitude ceiling and push it while engaged.
    pub fn fixed_update(&mut self, dt: f32) {
        if self.state != BallState::Launched {
            return;
        }
        let Some(body) = self.body.as_mut() else {
            return;
        };
        if !self.assist_enabled && body.position().y < self.config.altitude_ceiling {
            self.assist_enabled = true;
            body.set_constraints(Constraints::FREEZE_POSITION_Y);
        }
        if self.assist_enabled {
            let impulse = self.config.assist_direction.normalize_or_zero() * (self.config.assist_force * dt);
            body.apply_impulse(impulse);
        }
    }
}

/// Make a body dynamic, unlocking it if it is fully locked.
fn release<B: PhysicsBody>(body: &mut B) {
    body.set_kinematic(false);
    if body.constraints().is_fully_locked() {
        body.set_constraints(Constraints::NONE);
    }
}

/// All balls on the table, keyed by id in spawn order.
#[derive(Debug, Clone)]
pub struct BallSet<B> {
    balls: BTreeMap<BallId, BallAgent<B>>,
    next_id: u64,
}

impl<B> Default for BallSet<B> {
    fn default() -> Self {
        Self {
            balls: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<B: PhysicsBody> BallSet<B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, body: B, config: BallConfig) -> BallId {
        let id = BallId(self.next_id);
        self.next_id += 1;
        self.balls.insert(id, BallAgent::new(id, body, config));
        id
    }

    pub fn remove(&mut self, id: BallId) -> Option<BallAgent<B>> {
        self.balls.remove(&id)
    }

    pub fn get(&self, id: BallId) -> Option<&BallAgent<B>> {
        self.balls.get(&id)
    }

    pub fn get_mut(&mut self, id: BallId) -> Option<&mut BallAgent<B>> {
        self.balls.get_mut(&id)
    }

    /// The first ball spawned that is still on the table.
    pub fn main_ball(&self) -> Option<BallId> {
        self.balls.keys().next().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BallAgent<B>> {
        self.balls.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BallAgent<B>> {
        self.balls.values_mut()
    }

    pub fn len(&self) -> usize {
        self.balls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }
}

impl<B: PhysicsBody> HitReceiver for BallSet<B> {
    fn launch_ball(&mut self, ball: BallId, direction: Vec3, force: f32) -> bool {
        match self.balls.get_mut(&ball) {
            Some(agent) => {
                agent.launch(direction, force);
                true
            },
            None => false,
        }
    }
}
