//! Wires balls, paddles and the launcher to input, contacts and the clocks.

use std::collections::BTreeMap;

use flipshot_core::body::PhysicsBody;
use flipshot_core::ids::{BallId, PaddleId};
use flipshot_core::input::{InputAction, InputEvent, InputPhase, Pointer};
use flipshot_core::math::Vec2;
use flipshot_core::notify::{TableEvent, ViewNotifier};
use flipshot_core::time::FixedClock;

use crate::ball::{BallAgent, BallSet};
use crate::config::TableConfig;
use crate::contact::{ContactEvent, ContactPhase, ContactTable, ContactTarget, PaddleCommand};
use crate::launcher::{DragLaunchController, DragRelease, RestAnchor};
use crate::layout::TableLayout;
use crate::paddle::PaddleAgent;
use crate::snapshot::{
    BallSnapshot, LauncherSnapshot, PaddleSnapshot, SnapshotError, TableSnapshot,
};
use crate::surface::SurfaceSet;
use crate::trajectory::{TrajectoryParams, TrajectoryPredictor};

/// A playable table.
///
/// The host feeds it input events, the contact callbacks of each physics
/// tick (`fixed_step`/`fixed_tick`) and one `frame_step` per presented
/// frame. Collaborators are injected: `P` projects and picks pointer
/// positions, `N` receives fire-and-forget view switches.
pub struct Table<B, P, N> {
    config: TableConfig,
    layout: TableLayout,
    balls: BallSet<B>,
    paddles: BTreeMap<PaddleId, PaddleAgent>,
    launcher: DragLaunchController,
    contacts: ContactTable,
    /// Contacts handed to `fixed_step` that no tick has applied yet.
    pending_contacts: Vec<ContactEvent>,
    clock: FixedClock,
    ticks: u64,
    paused: bool,
    press_position: Vec2,
    pointer: P,
    notifier: N,
    events: Vec<TableEvent>,
}

impl<B: PhysicsBody, P: Pointer, N: ViewNotifier> Table<B, P, N> {
    pub fn new(config: TableConfig, layout: TableLayout, pointer: P, notifier: N) -> Self {
        let predictor = TrajectoryPredictor::new(TrajectoryParams::from_config(&config));
        let mut launcher = DragLaunchController::new(config.launcher.clone(), predictor);
        launcher.set_rest_pose(layout.anchor.rest_pose_for(config.ball.radius));

        let paddles = [layout.left_paddle, layout.right_paddle]
            .into_iter()
            .map(|id| (id, PaddleAgent::new(id, config.paddle.clone())))
            .collect();

        tracing::info!(layout = %layout.name, surfaces = layout.surfaces.len(), "Table ready");
        Self {
            clock: FixedClock::new(config.physics.fixed_dt, config.physics.max_frame_dt),
            ticks: 0,
            config,
            layout,
            balls: BallSet::new(),
            paddles,
            launcher,
            contacts: ContactTable::new(),
            pending_contacts: Vec::new(),
            paused: false,
            press_position: Vec2::ZERO,
            pointer,
            notifier,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn surfaces(&self) -> &SurfaceSet {
        &self.layout.surfaces
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn balls(&self) -> &BallSet<B> {
        &self.balls
    }

    pub fn ball(&self, id: BallId) -> Option<&BallAgent<B>> {
        self.balls.get(id)
    }

    pub fn paddle(&self, id: PaddleId) -> Option<&PaddleAgent> {
        self.paddles.get(&id)
    }

    pub fn paddles(&self) -> impl Iterator<Item = &PaddleAgent> {
        self.paddles.values()
    }

    pub fn launcher(&self) -> &DragLaunchController {
        &self.launcher
    }

    pub fn clock(&self) -> &FixedClock {
        &self.clock
    }

    /// Physics ticks run so far, through either stepping entry point.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pointer(&self) -> &P {
        &self.pointer
    }

    pub fn pointer_mut(&mut self) -> &mut P {
        &mut self.pointer
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Every ball body, for the host's physics integration.
    pub fn bodies_mut(&mut self) -> impl Iterator<Item = (BallId, &mut B)> {
        self.balls.iter_mut().filter_map(|ball| {
            let id = ball.id();
            ball.body_mut().map(|body| (id, body))
        })
    }

    /// Events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<TableEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether the main ball is waiting on the rest pose (idle or being
    /// dragged).
    pub fn main_ball_at_rest(&self) -> bool {
        self.balls
            .main_ball()
            .and_then(|id| self.balls.get(id))
            .is_some_and(|ball| !ball.state().is_in_play())
    }

    /// Register a ball, place it on the rest pose and make it the launcher's
    /// active ball.
    pub fn spawn_ball(&mut self, body: B) -> BallId {
        let id = self.balls.spawn(body, self.config.ball.clone());
        let rest = self.launcher.rest_pose();
        if let Some(ball) = self.balls.get_mut(id) {
            ball.reset(rest);
        }
        self.launcher.set_active_ball(Some(id));
        tracing::info!(ball = %id, "Ball spawned");
        id
    }

    /// Take a ball off the table and out of every ledger.
    pub fn remove_ball(&mut self, id: BallId) -> Option<BallAgent<B>> {
        let removed = self.balls.remove(id)?;
        self.contacts.purge_ball(id);
        self.pending_contacts.retain(|event| event.ball != id);
        for paddle in self.paddles.values_mut() {
            paddle.forget_ball(id);
        }
        if self.launcher.active_ball() == Some(id) {
            self.launcher.set_active_ball(self.balls.main_ball());
        }
        tracing::info!(ball = %id, "Ball removed");
        Some(removed)
    }

    pub fn handle_input(&mut self, event: InputEvent) {
        if self.paused && event.action != InputAction::Pause {
            return;
        }
        match (event.action, event.phase) {
            (InputAction::LeftPaddle(pressed), InputPhase::Performed) => {
                self.rotate_paddle(self.layout.left_paddle, pressed);
            },
            (InputAction::RightPaddle(pressed), InputPhase::Performed) => {
                self.rotate_paddle(self.layout.right_paddle, pressed);
            },
            (InputAction::Pause, InputPhase::Performed) => self.toggle_pause(),
            (InputAction::ResetBall, InputPhase::Performed) => {
                self.reset_main_ball();
            },
            (InputAction::DragPress, InputPhase::Started) => self.start_drag(),
            (InputAction::DragPress, InputPhase::Canceled) => self.end_drag(),
            (InputAction::DragPosition(screen), InputPhase::Performed) => {
                if self.launcher.is_dragging() {
                    self.launcher.update_drag(
                        screen,
                        &self.pointer,
                        &mut self.balls,
                        &self.layout.surfaces,
                    );
                } else {
                    self.press_position = screen;
                }
            },
            _ => {},
        }
    }

    fn rotate_paddle(&mut self, id: PaddleId, lift: bool) {
        if self.main_ball_at_rest() {
            tracing::debug!(paddle = %id, "Paddles are locked while the ball is at rest");
            return;
        }
        if let Some(paddle) = self.paddles.get_mut(&id) {
            paddle.rotate_paddle(lift);
        }
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        if self.paused {
            // A release arriving while paused is swallowed, so let go now.
            if let DragRelease::Cancelled { ball } = self.launcher.cancel_drag(&mut self.balls) {
                self.events.push(TableEvent::DragCancelled { ball });
            }
            tracing::info!("Table paused");
            self.events.push(TableEvent::Paused);
        } else {
            tracing::info!("Table resumed");
            self.events.push(TableEvent::Resumed);
        }
    }

    fn start_drag(&mut self) {
        if self
            .launcher
            .start_drag(self.press_position, &self.pointer, &mut self.balls)
            && let Some(ball) = self.launcher.dragged_ball()
        {
            self.events.push(TableEvent::DragStarted { ball });
        }
    }

    fn end_drag(&mut self) {
        match self.launcher.end_drag(&mut self.balls) {
            DragRelease::Launched { ball, force, .. } => {
                self.notifier.switch_to_action_view();
                self.events.push(TableEvent::BallLaunched { ball, force });
            },
            DragRelease::Cancelled { ball } => {
                self.events.push(TableEvent::DragCancelled { ball });
            },
            DragRelease::NotDragging => {},
        }
    }

    /// Put the main ball back on the rest pose. Returns false when it is
    /// already there or there is no ball.
    pub fn reset_main_ball(&mut self) -> bool {
        if self.main_ball_at_rest() {
            tracing::debug!("Ball already at rest");
            return false;
        }
        let Some(id) = self.balls.main_ball() else {
            return false;
        };
        let rest = self.launcher.rest_pose();
        if let Some(ball) = self.balls.get_mut(id) {
            ball.reset(rest);
        }
        self.contacts.purge_ball(id);
        self.pending_contacts.retain(|event| event.ball != id);
        for paddle in self.paddles.values_mut() {
            paddle.forget_ball(id);
        }
        self.launcher.set_active_ball(Some(id));
        self.notifier.switch_to_launch_view();
        self.events.push(TableEvent::BallReset { ball: id });
        tracing::info!(ball = %id, "Ball reset to rest pose");
        true
    }

    /// Move the rest pose to sit on a new anchor. Balls already resting are
    /// not moved.
    pub fn recompute_rest_pose(&mut self, anchor: RestAnchor) {
        self.layout.anchor = anchor;
        self.launcher
            .set_rest_pose(anchor.rest_pose_for(self.config.ball.radius));
    }

    /// Accumulate `dt` on the physics clock and run every tick that is due.
    /// `contacts` are queued and applied before the next tick that runs,
    /// which may be in a later call. Returns the number of ticks run.
    pub fn fixed_step(&mut self, dt: f32, contacts: &[ContactEvent]) -> u32 {
        self.pending_contacts.extend_from_slice(contacts);
        if self.paused {
            return 0;
        }
        let due = self.clock.advance(dt);
        for _ in 0..due {
            self.run_tick(&[]);
        }
        due
    }

    /// Run exactly one physics tick with the given contacts, for hosts that
    /// drive their own clock.
    pub fn fixed_tick(&mut self, contacts: &[ContactEvent]) {
        if self.paused {
            return;
        }
        self.run_tick(contacts);
    }

    fn run_tick(&mut self, contacts: &[ContactEvent]) {
        let queued = std::mem::take(&mut self.pending_contacts);
        for event in queued.iter().chain(contacts) {
            self.apply_contact(event);
        }
        let dt = self.clock.step();
        for ball in self.balls.iter_mut() {
            ball.fixed_update(dt);
        }
        self.ticks += 1;
    }

    fn apply_contact(&mut self, event: &ContactEvent) {
        if self.balls.get(event.ball).is_none() {
            tracing::debug!(ball = %event.ball, "Contact for unknown ball");
            return;
        }
        match event.target {
            ContactTarget::Paddle(_) => {
                if let Some(command) = self.contacts.route(event) {
                    self.apply_paddle_command(command);
                }
            },
            ContactTarget::Ground => {
                if let Some(ball) = self.balls.get_mut(event.ball) {
                    ball.on_ground_contact(event.phase);
                }
            },
            ContactTarget::Bumper { kick } => {
                if event.phase == ContactPhase::Begin
                    && let Some(ball) = self.balls.get_mut(event.ball)
                {
                    ball.hit(event.normal, kick);
                }
            },
            ContactTarget::Other => {},
        }
    }

    fn apply_paddle_command(&mut self, command: PaddleCommand) {
        let paddle_id = match command {
            PaddleCommand::Enter { paddle, .. }
            | PaddleCommand::Update { paddle, .. }
            | PaddleCommand::Exit { paddle, .. } => paddle,
        };
        let Some(paddle) = self.paddles.get_mut(&paddle_id) else {
            tracing::debug!(paddle = %paddle_id, "Contact with unknown paddle");
            return;
        };
        match command {
            PaddleCommand::Enter {
                ball, direction, ..
            } => paddle.ball_enter(ball, direction),
            PaddleCommand::Update {
                ball, direction, ..
            } => paddle.ball_update(ball, direction),
            PaddleCommand::Exit { ball, .. } => paddle.ball_exit(ball),
        }
    }

    /// Presentation tick: rotate paddles and discharge their sweeps.
    pub fn frame_step(&mut self, dt: f32) {
        if self.paused {
            return;
        }
        for paddle in self.paddles.values_mut() {
            let launched = paddle.update(dt, &mut self.balls);
            if !launched.is_empty() {
                self.events.push(TableEvent::PaddleDischarged {
                    paddle: paddle.id(),
                    balls: launched,
                });
            }
        }
    }

    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            tick: self.ticks,
            paused: self.paused,
            balls: self
                .balls
                .iter()
                .map(|ball| BallSnapshot {
                    id: ball.id(),
                    state: ball.state(),
                    position: ball.position().unwrap_or_default(),
                    velocity: ball.velocity().unwrap_or_default(),
                    assist: ball.assist_enabled(),
                })
                .collect(),
            paddles: self
                .paddles
                .values()
                .map(|paddle| PaddleSnapshot {
                    id: paddle.id(),
                    angle: paddle.current_angle(),
                    progress: paddle.rotation_progress(),
                    pending: paddle.pending_hits().len(),
                    lift: paddle.lift_requested(),
                })
                .collect(),
            launcher: LauncherSnapshot {
                dragging: self.launcher.is_dragging(),
                active_ball: self.launcher.active_ball(),
                drag_vector: self.launcher.drag_vector(),
                preview: self.launcher.preview().to_vec(),
            },
        }
    }

    /// MessagePack-encoded [`snapshot`](Self::snapshot).
    pub fn serialize_state(&self) -> Result<Vec<u8>, SnapshotError> {
        self.snapshot().encode()
    }
}
