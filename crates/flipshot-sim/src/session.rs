//! A scripted round: drag-launch the ball, flip both paddles on a timer and
//! relaunch whenever the ball drains.

use serde::Serialize;

use flipshot_core::body::PointBody;
use flipshot_core::input::{InputAction, InputEvent};
use flipshot_core::math::{Vec2, Vec3};
use flipshot_core::notify::TableEvent;
use flipshot_core::time::FixedClock;
use flipshot_pinball::layout::TABLE_HEIGHT;
use flipshot_pinball::{Table, TableConfig, TableSnapshot, default_layout};

use crate::engine::PhysicsWorld;
use crate::host::{LogNotifier, SimPointer};

const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);
const PIXELS_PER_UNIT: f32 = 32.0;

pub type SimTable = Table<PointBody, SimPointer, LogNotifier>;

#[derive(Debug, Clone, Copy)]
pub struct SimOptions {
    /// Pull-back distance as a fraction of the drag radius.
    pub drag_fraction: f32,
    pub seconds: f32,
    pub frame_dt: f32,
    /// Both paddles lift at the start of every period...
    pub flip_period: f32,
    /// ...and drop after this long.
    pub flip_hold: f32,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            drag_fraction: 0.6,
            seconds: 10.0,
            frame_dt: 1.0 / 60.0,
            flip_period: 1.5,
            flip_hold: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SimReport {
    pub frames: u64,
    pub ticks: u64,
    pub launches: u32,
    pub cancelled: u32,
    pub discharges: u32,
    pub balls_struck: u32,
    pub resets: u32,
    pub drains: u32,
    pub snapshot: TableSnapshot,
}

pub struct Session {
    table: SimTable,
    world: PhysicsWorld,
    clock: FixedClock,
    options: SimOptions,
    drain_z: f32,
    paddles_lifted: bool,
    report: SimReport,
}

impl Session {
    pub fn new(config: TableConfig, options: SimOptions) -> Self {
        let layout = default_layout();
        let world = PhysicsWorld::new(&config, layout.surfaces.clone());
        let clock = FixedClock::new(config.physics.fixed_dt, config.physics.max_frame_dt);
        let drain_z = -layout.depth / 2.0 - config.ball.radius * 2.0;
        let pointer = SimPointer::new(
            VIEWPORT,
            PIXELS_PER_UNIT,
            TABLE_HEIGHT,
            config.ball.radius * 2.0,
        );
        let mass = config.ball.mass;

        let mut table = Table::new(config, layout, pointer, LogNotifier::default());
        table.spawn_ball(PointBody::new(mass));
        Self {
            table,
            world,
            clock,
            options,
            drain_z,
            paddles_lifted: false,
            report: SimReport::default(),
        }
    }

    fn sync_pointer(&mut self) {
        let targets = self
            .table
            .balls()
            .iter()
            .filter_map(|ball| ball.position().map(|p| (ball.id(), p)))
            .collect();
        self.table.pointer_mut().track(targets);
    }

    /// Press on the resting ball, pull it straight back and let go.
    pub fn launch(&mut self) {
        self.sync_pointer();
        let rest = self.table.launcher().rest_pose().position;
        let pull = self.table.config().launcher.drag_radius * self.options.drag_fraction;
        let press = self.table.pointer().to_screen(rest);
        let target = self.table.pointer().to_screen(rest - Vec3::new(0.0, 0.0, pull));

        self.table
            .handle_input(InputEvent::performed(InputAction::DragPosition(press)));
        self.table
            .handle_input(InputEvent::started(InputAction::DragPress));
        self.table
            .handle_input(InputEvent::performed(InputAction::DragPosition(target)));
        tracing::debug!(
            points = self.table.launcher().preview().len(),
            "Trajectory preview"
        );
        self.table
            .handle_input(InputEvent::canceled(InputAction::DragPress));
    }

    /// One presented frame at `time` seconds into the round.
    pub fn advance_frame(&mut self, time: f32) {
        self.schedule_paddles(time);

        let due = self.clock.advance(self.options.frame_dt);
        for _ in 0..due {
            let contacts = self.world.step(self.clock.step(), self.table.bodies_mut());
            self.table.fixed_tick(&contacts);
        }
        self.table.frame_step(self.options.frame_dt);

        self.tally_events();
        self.check_drain();
        self.report.frames += 1;
    }

    fn schedule_paddles(&mut self, time: f32) {
        if self.options.flip_period <= 0.0 {
            return;
        }
        let lifted = time % self.options.flip_period < self.options.flip_hold;
        if lifted == self.paddles_lifted {
            return;
        }
        self.paddles_lifted = lifted;
        self.table
            .handle_input(InputEvent::performed(InputAction::LeftPaddle(lifted)));
        self.table
            .handle_input(InputEvent::performed(InputAction::RightPaddle(lifted)));
    }

    fn tally_events(&mut self) {
        for event in self.table.drain_events() {
            match event {
                TableEvent::BallLaunched { ball, force } => {
                    tracing::info!(ball = %ball, force, "Launched");
                    self.report.launches += 1;
                },
                TableEvent::DragCancelled { .. } => self.report.cancelled += 1,
                TableEvent::PaddleDischarged { paddle, balls } => {
                    tracing::info!(paddle = %paddle, struck = balls.len(), "Paddle swept");
                    self.report.discharges += 1;
                    self.report.balls_struck += balls.len() as u32;
                },
                TableEvent::BallReset { .. } => self.report.resets += 1,
                TableEvent::DragStarted { .. } | TableEvent::Paused | TableEvent::Resumed => {},
            }
        }
    }

    fn check_drain(&mut self) {
        if self.table.main_ball_at_rest() {
            return;
        }
        let drained = self
            .table
            .balls()
            .main_ball()
            .and_then(|id| self.table.ball(id))
            .and_then(|ball| ball.position())
            .is_some_and(|p| p.z < self.drain_z || p.y < TABLE_HEIGHT - 5.0);
        if drained {
            tracing::info!("Ball drained");
            self.report.drains += 1;
            self.table
                .handle_input(InputEvent::performed(InputAction::ResetBall));
            self.launch();
        }
    }

    /// Close the round and hand back the tallies.
    pub fn finish(mut self) -> SimReport {
        self.tally_events();
        self.report.ticks = self.table.ticks();
        self.report.snapshot = self.table.snapshot();
        self.report
    }
}

pub fn run(config: TableConfig, options: SimOptions) -> SimReport {
    let mut session = Session::new(config, options);
    session.launch();
    let frames = (options.seconds / options.frame_dt).round().max(0.0) as u64;
    for frame in 0..frames {
        session.advance_frame(frame as f32 * options.frame_dt);
    }
    session.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flipshot_pinball::BallState;

    fn shipped_config() -> TableConfig {
        TableConfig::from_toml_str(include_str!("../../../config/table.toml")).unwrap()
    }

    #[test]
    fn scripted_launch_leaves_the_rest_pose() {
        let mut session = Session::new(shipped_config(), SimOptions::default());
        session.launch();
        let ball = session.table.balls().main_ball().unwrap();
        assert_eq!(session.table.ball(ball).unwrap().state(), BallState::Launched);
        assert_eq!(session.table.notifier().action_views, 1);

        let before = session.table.ball(ball).unwrap().position().unwrap();
        // A 60 Hz frame is shorter than the 50 Hz tick; run a few.
        for frame in 0..3 {
            session.advance_frame(frame as f32 / 60.0);
        }
        let after = session.table.ball(ball).unwrap().position().unwrap();
        assert!(after.z > before.z, "ball did not move up-field: {after:?}");
    }

    #[test]
    fn every_drain_is_relaunched() {
        let options = SimOptions {
            seconds: 3.0,
            ..SimOptions::default()
        };
        let report = run(shipped_config(), options);
        assert_eq!(report.frames, 180);
        assert!(report.ticks > 0);
        assert_eq!(report.launches, report.drains + 1);
        assert_eq!(report.resets, report.drains);
        assert_eq!(report.snapshot.balls.len(), 1);
        assert_eq!(report.snapshot.paddles.len(), 2);
    }

    #[test]
    fn short_pull_is_cancelled_and_ball_stays_put() {
        let options = SimOptions {
            drag_fraction: 0.1,
            seconds: 1.0,
            ..SimOptions::default()
        };
        let report = run(shipped_config(), options);
        assert_eq!(report.launches, 0);
        assert_eq!(report.cancelled, 1);
        assert_eq!(report.snapshot.balls[0].state, BallState::Idle);
        assert_eq!(report.snapshot.balls[0].position, Vec3::new(0.0, 5.0, -5.0));
        // Paddles stay locked while the ball is at rest.
        assert!(report.snapshot.paddles.iter().all(|p| !p.lift));
    }

    #[test]
    fn report_serializes_to_json() {
        let options = SimOptions {
            seconds: 0.1,
            ..SimOptions::default()
        };
        let report = run(shipped_config(), options);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["launches"], 1);
        assert!(json["snapshot"]["balls"].is_array());
    }
}
