pub mod body;
pub mod ids;
pub mod input;
pub mod math;
pub mod notify;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::body::{Constraints, PhysicsBody, PointBody, Pose};
    use crate::ids::BallId;
    use crate::input::Pointer;
    use crate::math::{Vec2, Vec3};
    use crate::notify::ViewNotifier;

    /// Body that forwards to a [`PointBody`] and records every call the
    /// agents make against it.
    #[derive(Debug, Clone)]
    pub struct RecordingBody {
        pub inner: PointBody,
        pub impulses: Vec<Vec3>,
        pub moves: Vec<Vec3>,
        pub teleports: Vec<Pose>,
    }

    impl RecordingBody {
        pub fn new() -> Self {
            Self::with_mass(1.0)
        }

        pub fn with_mass(mass: f32) -> Self {
            Self {
                inner: PointBody::new(mass),
                impulses: Vec::new(),
                moves: Vec::new(),
                teleports: Vec::new(),
            }
        }

        pub fn total_impulse(&self) -> Vec3 {
            self.impulses
                .iter()
                .fold(Vec3::ZERO, |acc, impulse| acc + *impulse)
        }
    }

    impl Default for RecordingBody {
        fn default() -> Self {
            Self::new()
        }
    }

    impl PhysicsBody for RecordingBody {
        fn position(&self) -> Vec3 {
            self.inner.position()
        }

        fn teleport(&mut self, pose: Pose) {
            self.teleports.push(pose);
            self.inner.teleport(pose);
        }

        fn move_position(&mut self, position: Vec3) {
            self.moves.push(position);
            self.inner.move_position(position);
        }

        fn velocity(&self) -> Vec3 {
            self.inner.velocity()
        }

        fn set_velocity(&mut self, velocity: Vec3) {
            self.inner.set_velocity(velocity);
        }

        fn angular_velocity(&self) -> Vec3 {
            self.inner.angular_velocity()
        }

        fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
            self.inner.set_angular_velocity(angular_velocity);
        }

        fn is_kinematic(&self) -> bool {
            self.inner.is_kinematic()
        }

        fn set_kinematic(&mut self, kinematic: bool) {
            self.inner.set_kinematic(kinematic);
        }

        fn constraints(&self) -> Constraints {
            self.inner.constraints()
        }

        fn set_constraints(&mut self, constraints: Constraints) {
            self.inner.set_constraints(constraints);
        }

        fn apply_impulse(&mut self, impulse: Vec3) {
            self.impulses.push(impulse);
            self.inner.apply_impulse(impulse);
        }

        fn mass(&self) -> f32 {
            self.inner.mass()
        }
    }

    /// Counts view notifications.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct RecordingNotifier {
        pub action_views: u32,
        pub launch_views: u32,
    }

    impl ViewNotifier for RecordingNotifier {
        fn switch_to_action_view(&mut self) {
            self.action_views += 1;
        }

        fn switch_to_launch_view(&mut self) {
            self.launch_views += 1;
        }
    }

    /// Pointer that maps screen pixels 1:1 onto the XZ plane at `plane_y`
    /// (`screen.x -> x`, `screen.y -> z`) and picks a fixed ball.
    #[derive(Debug, Clone, Default)]
    pub struct FixedPointer {
        pub pick: Option<BallId>,
        pub plane_y: f32,
    }

    impl FixedPointer {
        pub fn picking(ball: BallId) -> Self {
            Self {
                pick: Some(ball),
                plane_y: 0.0,
            }
        }

        /// Screen point that projects onto the world position `world`.
        pub fn screen_for(world: Vec3) -> Vec2 {
            Vec2::new(world.x, world.z)
        }
    }

    impl Pointer for FixedPointer {
        fn world_point(&self, screen: Vec2) -> Option<Vec3> {
            Some(Vec3::new(screen.x, self.plane_y, screen.y))
        }

        fn pick_ball(&self, _screen: Vec2) -> Option<BallId> {
            self.pick
        }
    }

    /// Assert two vectors match within `tolerance` on every axis.
    pub fn assert_vec_near(actual: Vec3, expected: Vec3, tolerance: f32) {
        let diff = actual - expected;
        assert!(
            diff.x.abs() <= tolerance && diff.y.abs() <= tolerance && diff.z.abs() <= tolerance,
            "expected {expected:?}, got {actual:?} (tolerance {tolerance})"
        );
    }
}
