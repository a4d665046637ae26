//! Drag-to-launch: turns pointer drags into a clamped drag vector, a launch
//! impulse and a live trajectory preview.

use serde::{Deserialize, Serialize};

use flipshot_core::body::{PhysicsBody, Pose};
use flipshot_core::ids::BallId;
use flipshot_core::input::Pointer;
use flipshot_core::math::{EPSILON, Vec2, Vec3, angular_distance, clamp01, lerp, wrap_degrees};

use crate::ball::{BallSet, BallState};
use crate::config::LauncherConfig;
use crate::surface::SweepQuery;
use crate::trajectory::TrajectoryPredictor;

/// Box the ball rests on before launch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RestAnchor {
    pub position: Vec3,
    /// Unscaled box height.
    pub height: f32,
    pub scale_y: f32,
}

impl RestAnchor {
    pub fn top_center(&self) -> Vec3 {
        self.position + Vec3::Y * (self.height * 0.5 * self.scale_y)
    }

    /// Pose that puts a ball of `ball_radius` on top of the anchor.
    pub fn rest_pose_for(&self, ball_radius: f32) -> Pose {
        Pose::at(self.top_center() + Vec3::Y * ball_radius)
    }
}

/// Launch derived from a drag vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchPlan {
    /// Horizontal direction opposite the drag, tilted up by the launch angle
    /// and scaled by the force split.
    pub direction: Vec3,
    pub force: f32,
    pub ratio: f32,
}

/// Outcome of releasing the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragRelease {
    Launched {
        ball: BallId,
        direction: Vec3,
        force: f32,
    },
    /// Under the threshold; the ball went back to rest.
    Cancelled { ball: BallId },
    NotDragging,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragState {
    ball: BallId,
    offset: Vec3,
    initial_position: Vec3,
    drag_vector: Vec3,
}

#[derive(Debug, Clone)]
pub struct DragLaunchController {
    config: LauncherConfig,
    predictor: TrajectoryPredictor,
    rest_pose: Pose,
    active_ball: Option<BallId>,
    drag: Option<DragState>,
    preview: Vec<Vec3>,
}

impl DragLaunchController {
    pub fn new(config: LauncherConfig, predictor: TrajectoryPredictor) -> Self {
        Self {
            config,
            predictor,
            rest_pose: Pose::default(),
            active_ball: None,
            drag: None,
            preview: Vec::new(),
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    pub fn rest_pose(&self) -> Pose {
        self.rest_pose
    }

    pub fn set_rest_pose(&mut self, pose: Pose) {
        self.rest_pose = pose;
    }

    pub fn active_ball(&self) -> Option<BallId> {
        self.active_ball
    }

    pub fn set_active_ball(&mut self, ball: Option<BallId>) {
        self.active_ball = ball;
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn dragged_ball(&self) -> Option<BallId> {
        self.drag.map(|d| d.ball)
    }

    /// Current clamped drag offset, zero when idle.
    pub fn drag_vector(&self) -> Vec3 {
        self.drag.map_or(Vec3::ZERO, |d| d.drag_vector)
    }

    pub fn preview(&self) -> &[Vec3] {
        &self.preview
    }

    /// Begin dragging the ball under `screen`. Only the active ball, idle and
    /// sitting on the rest pose, can be picked up, and only one at a time.
    pub fn start_drag<B: PhysicsBody>(
        &mut self,
        screen: Vec2,
        pointer: &impl Pointer,
        balls: &mut BallSet<B>,
    ) -> bool {
        if self.drag.is_some() {
            tracing::debug!("Drag already in progress");
            return false;
        }
        let Some(picked) = pointer.pick_ball(screen) else {
            return false;
        };
        if self.active_ball != Some(picked) {
            tracing::debug!(ball = %picked, "Picked ball is not the active ball");
            return false;
        }
        let Some(world) = pointer.world_point(screen) else {
            tracing::debug!("Pointer does not hit the drag plane");
            return false;
        };
        let Some(ball) = balls.get_mut(picked) else {
            tracing::debug!(ball = %picked, "Active ball no longer exists");
            return false;
        };
        if ball.state() != BallState::Idle
            || !ball.is_at(self.rest_pose.position, self.config.rest_tolerance)
        {
            tracing::debug!(ball = %picked, state = ?ball.state(), "Ball is not at rest");
            return false;
        }
        let Some(position) = ball.position() else {
            return false;
        };
        if !ball.hold() {
            return false;
        }
        ball.set_drag_mode(true);
        self.drag = Some(DragState {
            ball: picked,
            offset: position - world,
            initial_position: position,
            drag_vector: Vec3::ZERO,
        });
        tracing::debug!(ball = %picked, "Drag started");
        true
    }

    /// Follow the pointer: clamp the drag, move the held ball and refresh the
    /// preview.
    pub fn update_drag<B: PhysicsBody, Q: SweepQuery + ?Sized>(
        &mut self,
        screen: Vec2,
        pointer: &impl Pointer,
        balls: &mut BallSet<B>,
        surfaces: &Q,
    ) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let Some(world) = pointer.world_point(screen) else {
            return;
        };
        let target = world + drag.offset;
        let clamped = clamp_to_sector(&self.config, (target - drag.initial_position).with_y(0.0));
        drag.drag_vector = clamped;
        let position = drag.initial_position + clamped;
        let ball_id = drag.ball;

        let Some(ball) = balls.get_mut(ball_id) else {
            tracing::debug!(ball = %ball_id, "Dragged ball vanished");
            return;
        };
        ball.move_to(position);
        let velocity = self.preview_velocity(clamped, ball.mass());
        self.preview = self.predictor.predict_points(surfaces, position, velocity);
    }

    /// Release the pointer: launch if the drag is long enough, otherwise snap
    /// the ball back to rest. Always clears the drag and the preview.
    pub fn end_drag<B: PhysicsBody>(&mut self, balls: &mut BallSet<B>) -> DragRelease {
        self.preview.clear();
        let Some(drag) = self.drag.take() else {
            return DragRelease::NotDragging;
        };
        let Some(ball) = balls.get_mut(drag.ball) else {
            tracing::debug!(ball = %drag.ball, "Dragged ball vanished before release");
            return DragRelease::NotDragging;
        };
        ball.set_drag_mode(false);

        if drag.drag_vector.length() > self.config.min_drag_threshold {
            let plan = self.launch_plan(drag.drag_vector);
            ball.launch(plan.direction, plan.force);
            DragRelease::Launched {
                ball: drag.ball,
                direction: plan.direction,
                force: plan.force,
            }
        } else {
            ball.reset(self.rest_pose);
            tracing::debug!(ball = %drag.ball, "Drag released under threshold");
            DragRelease::Cancelled { ball: drag.ball }
        }
    }

    /// Abandon the drag without launching, whatever its length, and put the
    /// ball back on rest.
    pub fn cancel_drag<B: PhysicsBody>(&mut self, balls: &mut BallSet<B>) -> DragRelease {
        self.preview.clear();
        let Some(drag) = self.drag.take() else {
            return DragRelease::NotDragging;
        };
        let Some(ball) = balls.get_mut(drag.ball) else {
            return DragRelease::NotDragging;
        };
        ball.set_drag_mode(false);
        ball.reset(self.rest_pose);
        tracing::debug!(ball = %drag.ball, "Drag abandoned");
        DragRelease::Cancelled { ball: drag.ball }
    }

    /// Force for a drag of `magnitude`, shaped by the response curve.
    pub fn launch_force(&self, magnitude: f32) -> (f32, f32) {
        let ratio = if self.config.drag_radius > 0.0 {
            clamp01(magnitude / self.config.drag_radius)
        } else {
            1.0
        };
        let shaped = self.config.force_curve.evaluate(ratio);
        (
            lerp(self.config.min_launch_force, self.config.max_launch_force, shaped),
            ratio,
        )
    }

    pub fn launch_plan(&self, drag_vector: Vec3) -> LaunchPlan {
        let (force, ratio) = self.launch_force(drag_vector.length());
        let heading = -drag_vector.with_y(0.0).normalize_or_zero();
        let angle = self.config.launch_angle.to_radians();
        let horizontal = angle.cos() * force;
        let vertical = angle.sin() * force;
        LaunchPlan {
            direction: Vec3::new(heading.x * horizontal, vertical, heading.z * horizontal),
            force,
            ratio,
        }
    }

    /// Initial velocity the launch impulse would give a ball of `mass`.
    pub fn preview_velocity(&self, drag_vector: Vec3, mass: f32) -> Vec3 {
        let plan = self.launch_plan(drag_vector);
        plan.direction.normalize_or_zero() * (plan.force / mass.max(EPSILON))
    }

    /// Arc of the permitted sector at full drag radius, `segments + 1` points.
    pub fn drag_area(&self, segments: usize) -> Vec<Vec3> {
        let segments = segments.max(1);
        let center = self.rest_pose.position;
        (0..=segments)
            .map(|i| {
                let t = i as f32 / segments as f32;
                let angle = lerp(self.config.min_angle, self.config.max_angle, t).to_radians();
                center + Vec3::new(angle.cos(), 0.0, angle.sin()) * self.config.drag_radius
            })
            .collect()
    }
}

/// Clamp a horizontal drag vector into the angular sector and the drag
/// radius. Angles outside the sector snap to the angularly closer bound,
/// ties going to `min_angle`.
pub fn clamp_to_sector(config: &LauncherConfig, drag: Vec3) -> Vec3 {
    let flat = drag.with_y(0.0);
    let length = flat.length();
    if length < EPSILON {
        return Vec3::ZERO;
    }
    let mut angle = wrap_degrees(flat.z.atan2(flat.x).to_degrees());
    if angle < config.min_angle || angle > config.max_angle {
        let to_min = angular_distance(angle, config.min_angle);
        let to_max = angular_distance(angle, config.max_angle);
        angle = if to_min <= to_max {
            config.min_angle
        } else {
            config.max_angle
        };
    }
    let distance = length.min(config.drag_radius);
    let radians = angle.to_radians();
    Vec3::new(radians.cos(), 0.0, radians.sin()) * distance
}
