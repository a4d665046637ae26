//! Rigid-body contract consumed by the table core.
//!
//! The physics engine owns integration and collision detection; agents only
//! toggle modes, read state and push impulses through [`PhysicsBody`].
//! [`PointBody`] is a minimal in-process implementation used by the headless
//! runner and by tests.

use serde::{Deserialize, Serialize};

use crate::math::Vec3;

/// Axes locked against physics-driven change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraints {
    pub position_x: bool,
    pub position_y: bool,
    pub position_z: bool,
    pub rotation: bool,
}

impl Constraints {
    pub const NONE: Self = Self {
        position_x: false,
        position_y: false,
        position_z: false,
        rotation: false,
    };

    /// Vertical motion locked, everything else free.
    pub const FREEZE_POSITION_Y: Self = Self {
        position_y: true,
        ..Self::NONE
    };

    /// Free on the horizontal plane, locked vertically and in rotation.
    pub const PLANAR_DRAG: Self = Self {
        position_y: true,
        rotation: true,
        ..Self::NONE
    };

    pub const FREEZE_ALL: Self = Self {
        position_x: true,
        position_y: true,
        position_z: true,
        rotation: true,
    };

    pub fn is_fully_locked(&self) -> bool {
        *self == Self::FREEZE_ALL
    }

    /// Zero the components of `v` that lie on locked position axes.
    pub fn filter_linear(&self, v: Vec3) -> Vec3 {
        Vec3::new(
            if self.position_x { 0.0 } else { v.x },
            if self.position_y { 0.0 } else { v.y },
            if self.position_z { 0.0 } else { v.z },
        )
    }

    pub fn filter_angular(&self, w: Vec3) -> Vec3 {
        if self.rotation { Vec3::ZERO } else { w }
    }
}

/// Position plus orientation (Euler angles in degrees).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
}

impl Pose {
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
        }
    }
}

/// A simulated rigid body as seen by the table core.
pub trait PhysicsBody {
    fn position(&self) -> Vec3;

    /// Instantly place the body, bypassing interpolation.
    fn teleport(&mut self, pose: Pose);

    /// Kinematic move toward `position` for the next physics tick.
    fn move_position(&mut self, position: Vec3);

    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn angular_velocity(&self) -> Vec3;
    fn set_angular_velocity(&mut self, angular_velocity: Vec3);

    fn is_kinematic(&self) -> bool;
    fn set_kinematic(&mut self, kinematic: bool);

    fn constraints(&self) -> Constraints;
    fn set_constraints(&mut self, constraints: Constraints);

    /// Instantaneous change in momentum. Ignored by kinematic bodies.
    fn apply_impulse(&mut self, impulse: Vec3);

    fn mass(&self) -> f32 {
        1.0
    }
}

/// Point-mass body with explicit Euler integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointBody {
    pub pose: Pose,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub mass: f32,
    pub kinematic: bool,
    pub constraints: Constraints,
}

impl PointBody {
    pub fn new(mass: f32) -> Self {
        Self {
            pose: Pose::default(),
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: mass.max(f32::EPSILON),
            kinematic: true,
            constraints: Constraints::FREEZE_ALL,
        }
    }

    /// Advance one fixed tick under `acceleration`. Kinematic bodies hold still.
    pub fn integrate(&mut self, dt: f32, acceleration: Vec3) {
        if self.kinematic {
            return;
        }
        self.velocity = self
            .constraints
            .filter_linear(self.velocity + acceleration * dt);
        self.angular_velocity = self.constraints.filter_angular(self.angular_velocity);
        self.pose.position += self.velocity * dt;
        self.pose.rotation += self.angular_velocity * dt;
    }
}

impl PhysicsBody for PointBody {
    fn position(&self) -> Vec3 {
        self.pose.position
    }

    fn teleport(&mut self, pose: Pose) {
        self.pose = pose;
    }

    fn move_position(&mut self, position: Vec3) {
        self.pose.position = position;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        self.angular_velocity = angular_velocity;
    }

    fn is_kinematic(&self) -> bool {
        self.kinematic
    }

    fn set_kinematic(&mut self, kinematic: bool) {
        self.kinematic = kinematic;
    }

    fn constraints(&self) -> Constraints {
        self.constraints
    }

    fn set_constraints(&mut self, constraints: Constraints) {
        self.constraints = constraints;
    }

    fn apply_impulse(&mut self, impulse: Vec3) {
        if self.kinematic {
            tracing::trace!("impulse ignored on kinematic body");
            return;
        }
        self.velocity += self.constraints.filter_linear(impulse / self.mass);
    }

    fn mass(&self) -> f32 {
        self.mass
    }
}
