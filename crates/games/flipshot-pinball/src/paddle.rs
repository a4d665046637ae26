use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use flipshot_core::ids::{BallId, PaddleId};
use flipshot_core::math::{Vec3, angular_distance, lerp_angle};

use crate::config::{DischargePolicy, ExitPolicy, PaddleConfig};

/// Anything that can launch a ball by id. Implemented by
/// [`BallSet`](crate::ball::BallSet); returns false for unknown balls.
pub trait HitReceiver {
    fn launch_ball(&mut self, ball: BallId, direction: Vec3, force: f32) -> bool;
}

/// A hit waiting for the paddle sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingHit {
    pub direction: Vec3,
    pub force: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaddlePhase {
    Resting,
    Rotating,
    Loaded,
}

/// One paddle: timed rotation plus the ledger of balls it will strike.
#[derive(Debug, Clone)]
pub struct PaddleAgent {
    id: PaddleId,
    config: PaddleConfig,
    current_angle: f32,
    start_angle: f32,
    target_angle: f32,
    progress: f32,
    lift_requested: bool,
    discharged_this_cycle: bool,
    pending: BTreeMap<BallId, PendingHit>,
}

impl PaddleAgent {
    pub fn new(id: PaddleId, config: PaddleConfig) -> Self {
        let rest = config.rest_angle;
        Self {
            id,
            config,
            current_angle: rest,
            start_angle: rest,
            target_angle: rest,
            progress: 1.0,
            lift_requested: false,
            discharged_this_cycle: false,
            pending: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> PaddleId {
        self.id
    }

    pub fn current_angle(&self) -> f32 {
        self.current_angle
    }

    pub fn target_angle(&self) -> f32 {
        self.target_angle
    }

    pub fn rotation_progress(&self) -> f32 {
        self.progress
    }

    pub fn lift_requested(&self) -> bool {
        self.lift_requested
    }

    pub fn pending_hits(&self) -> &BTreeMap<BallId, PendingHit> {
        &self.pending
    }

    pub fn phase(&self) -> PaddlePhase {
        if self.lift_requested && self.progress >= self.config.discharge_ratio_threshold {
            PaddlePhase::Loaded
        } else if !self.lift_requested
            && angular_distance(self.current_angle, self.config.rest_angle)
                <= self.config.settle_tolerance
        {
            PaddlePhase::Resting
        } else {
            PaddlePhase::Rotating
        }
    }

    /// Command a lift (`true`) or a drop (`false`). Restarts the rotation
    /// timer; the ledger is untouched.
    pub fn rotate_paddle(&mut self, lift: bool) {
        self.start_angle = self.current_angle;
        self.target_angle = if lift {
            self.config.lifted_angle
        } else {
            self.config.rest_angle
        };
        self.progress = 0.0;
        if lift && !self.lift_requested {
            self.discharged_this_cycle = false;
        }
        self.lift_requested = lift;
        tracing::debug!(paddle = %self.id, lift, "Paddle rotation started");
    }

    /// Record a ball touching the paddle. Entering twice keeps one entry.
    pub fn ball_enter(&mut self, ball: BallId, direction: Vec3) {
        let hit = PendingHit {
            direction: direction.normalize_or_zero(),
            force: self.config.hit_force,
        };
        if self.pending.insert(ball, hit).is_none() {
            tracing::debug!(paddle = %self.id, %ball, "Ball entered paddle");
        }
    }

    /// Refresh the direction of an existing entry.
    pub fn ball_update(&mut self, ball: BallId, direction: Vec3) {
        match self.pending.get_mut(&ball) {
            Some(hit) => hit.direction = direction.normalize_or_zero(),
            None => tracing::debug!(paddle = %self.id, %ball, "Update for unknown ball"),
        }
    }

    pub fn ball_exit(&mut self, ball: BallId) {
        match self.config.exit_policy {
            ExitPolicy::ForgetOnExit => {
                self.forget_ball(ball);
            },
            ExitPolicy::KeepUntilDischarge => {},
        }
    }

    /// Drop `ball` from the ledger regardless of policy.
    pub fn forget_ball(&mut self, ball: BallId) -> bool {
        self.pending.remove(&ball).is_some()
    }

    fn sweep_condition(&self, progress: f32) -> bool {
        if !self.lift_requested || self.discharged_this_cycle {
            return false;
        }
        match self.config.discharge_policy {
            DischargePolicy::MidSweep => progress < self.config.discharge_ratio_threshold,
            DischargePolicy::FullLift => progress >= 1.0,
        }
    }

    /// Presentation tick: discharge if the paddle is in its hitting sweep
    /// (judged on the progress at the start of the frame), then advance the
    /// rotation. Returns the balls launched this frame.
    pub fn update(&mut self, dt: f32, receiver: &mut impl HitReceiver) -> Vec<BallId> {
        let launched = if self.sweep_condition(self.progress) && !self.pending.is_empty() {
            self.discharge(receiver)
        } else {
            Vec::new()
        };
        self.advance(dt);
        launched
    }

    fn advance(&mut self, dt: f32) {
        if self.progress >= 1.0 {
            return;
        }
        self.progress = if self.config.rotate_time > 0.0 {
            (self.progress + dt.max(0.0) / self.config.rotate_time).min(1.0)
        } else {
            1.0
        };
        self.current_angle = lerp_angle(self.start_angle, self.target_angle, self.progress);
    }

    /// Launch every pending ball once and clear the ledger.
    pub fn discharge(&mut self, receiver: &mut impl HitReceiver) -> Vec<BallId> {
        let ledger = std::mem::take(&mut self.pending);
        self.discharged_this_cycle = true;
        let mut launched = Vec::with_capacity(ledger.len());
        for (ball, hit) in ledger {
            if receiver.launch_ball(ball, hit.direction, hit.force) {
                launched.push(ball);
            } else {
                tracing::debug!(paddle = %self.id, %ball, "Discharge skipped missing ball");
            }
        }
        tracing::info!(paddle = %self.id, count = launched.len(), "Paddle discharged");
        launched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Launches(Vec<(BallId, Vec3, f32)>);

    impl HitReceiver for Launches {
        fn launch_ball(&mut self, ball: BallId, direction: Vec3, force: f32) -> bool {
            self.0.push((ball, direction, force));
            true
        }
    }

    fn paddle() -> PaddleAgent {
        PaddleAgent::new(PaddleId(1), PaddleConfig::default())
    }

    #[test]
    fn starts_resting_at_rest_angle() {
        let p = paddle();
        assert_eq!(p.phase(), PaddlePhase::Resting);
        assert_eq!(p.current_angle(), 0.0);
    }

    #[test]
    fn ball_enter_is_idempotent() {
        let mut p = paddle();
        p.ball_enter(BallId(1), Vec3::Y);
        p.ball_enter(BallId(1), Vec3::new(0.0, 0.0, 2.0));
        assert_eq!(p.pending_hits().len(), 1);
        assert_eq!(p.pending_hits()[&BallId(1)].direction, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(p.pending_hits()[&BallId(1)].force, 150.0);
    }

    #[test]
    fn update_never_inserts() {
        let mut p = paddle();
        p.ball_update(BallId(3), Vec3::Y);
        assert!(p.pending_hits().is_empty());
    }

    #[test]
    fn lift_discharges_both_balls_in_one_step() {
        let mut p = paddle();
        let mut receiver = Launches::default();
        p.ball_enter(BallId(1), Vec3::Y);
        p.ball_enter(BallId(2), Vec3::Y);
        p.rotate_paddle(true);

        let launched = p.update(0.016, &mut receiver);
        assert_eq!(launched, vec![BallId(1), BallId(2)]);
        assert!(p.pending_hits().is_empty());
        assert_eq!(receiver.0.len(), 2);
        assert!(receiver.0.iter().all(|(_, _, force)| *force == 150.0));
    }

    #[test]
    fn late_entry_waits_for_next_cycle() {
        let mut p = paddle();
        let mut receiver = Launches::default();
        p.ball_enter(BallId(1), Vec3::Y);
        p.rotate_paddle(true);
        p.update(0.1, &mut receiver);

        p.ball_enter(BallId(2), Vec3::Y);
        for _ in 0..20 {
            p.update(0.1, &mut receiver);
        }
        assert_eq!(receiver.0.len(), 1);
        assert_eq!(p.pending_hits().len(), 1);

        p.rotate_paddle(false);
        p.update(0.1, &mut receiver);
        p.rotate_paddle(true);
        let launched = p.update(0.1, &mut receiver);
        assert_eq!(launched, vec![BallId(2)]);
    }

    #[test]
    fn entry_during_sweep_is_struck() {
        let mut p = paddle();
        let mut receiver = Launches::default();
        p.rotate_paddle(true);
        p.update(0.3, &mut receiver);
        assert!(receiver.0.is_empty());

        p.ball_enter(BallId(4), Vec3::Y);
        let launched = p.update(0.3, &mut receiver);
        assert_eq!(launched, vec![BallId(4)]);
    }

    #[test]
    fn no_discharge_while_dropping() {
        let mut p = paddle();
        let mut receiver = Launches::default();
        p.ball_enter(BallId(1), Vec3::Y);
        p.rotate_paddle(false);
        p.update(0.1, &mut receiver);
        assert!(receiver.0.is_empty());
        assert_eq!(p.pending_hits().len(), 1);
    }

    #[test]
    fn rapid_toggle_keeps_ledger() {
        let mut p = paddle();
        let mut receiver = Launches::default();
        p.rotate_paddle(false);
        p.ball_enter(BallId(1), Vec3::Y);
        p.rotate_paddle(false);
        p.update(0.1, &mut receiver);
        assert_eq!(p.rotation_progress(), 0.1);
        p.rotate_paddle(false);
        assert_eq!(p.rotation_progress(), 0.0);
        assert_eq!(p.pending_hits().len(), 1);
    }

    #[test]
    fn rotation_reaches_lifted_angle() {
        let mut p = paddle();
        let mut receiver = Launches::default();
        p.rotate_paddle(true);
        for _ in 0..4 {
            p.update(0.25, &mut receiver);
        }
        assert_eq!(p.rotation_progress(), 1.0);
        assert!((p.current_angle() - 60.0).abs() < 1e-4);
        assert_eq!(p.phase(), PaddlePhase::Loaded);

        p.rotate_paddle(false);
        assert_eq!(p.phase(), PaddlePhase::Rotating);
        for _ in 0..4 {
            p.update(0.25, &mut receiver);
        }
        assert!(p.current_angle().abs() < 1e-4);
        assert_eq!(p.phase(), PaddlePhase::Resting);
    }

    #[test]
    fn full_lift_policy_waits_for_top() {
        let config = PaddleConfig {
            discharge_policy: DischargePolicy::FullLift,
            ..PaddleConfig::default()
        };
        let mut p = PaddleAgent::new(PaddleId(2), config);
        let mut receiver = Launches::default();
        p.ball_enter(BallId(1), Vec3::Y);
        p.rotate_paddle(true);
        for _ in 0..4 {
            p.update(0.25, &mut receiver);
        }
        assert!(receiver.0.is_empty());
        let launched = p.update(0.25, &mut receiver);
        assert_eq!(launched, vec![BallId(1)]);
    }

    #[test]
    fn exit_policy_controls_ledger_on_exit() {
        let mut forget = paddle();
        forget.ball_enter(BallId(1), Vec3::Y);
        forget.ball_exit(BallId(1));
        assert!(forget.pending_hits().is_empty());

        let config = PaddleConfig {
            exit_policy: ExitPolicy::KeepUntilDischarge,
            ..PaddleConfig::default()
        };
        let mut keep = PaddleAgent::new(PaddleId(2), config);
        keep.ball_enter(BallId(1), Vec3::Y);
        keep.ball_exit(BallId(1));
        assert_eq!(keep.pending_hits().len(), 1);
        assert!(keep.forget_ball(BallId(1)));
        assert!(keep.pending_hits().is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn repeated_enter_keeps_one_entry(
                repeats in 1usize..10,
                x in -1.0f32..1.0,
                z in -1.0f32..1.0,
            ) {
                let mut p = paddle();
                for _ in 0..repeats {
                    p.ball_enter(BallId(7), Vec3::new(x, 1.0, z));
                }
                prop_assert_eq!(p.pending_hits().len(), 1);
            }

            #[test]
            fn discharge_launches_each_ball_once(ids in proptest::collection::btree_set(1u64..100, 0..12)) {
                let mut p = paddle();
                let mut receiver = Launches::default();
                for id in &ids {
                    p.ball_enter(BallId(*id), Vec3::Y);
                }
                let launched = p.discharge(&mut receiver);
                prop_assert!(p.pending_hits().is_empty());
                prop_assert_eq!(launched.len(), ids.len());
                let got: Vec<u64> = receiver.0.iter().map(|(b, _, _)| b.0).collect();
                let expected: Vec<u64> = ids.into_iter().collect();
                prop_assert_eq!(got, expected);
            }
        }
    }
}
