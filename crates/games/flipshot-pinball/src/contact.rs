//! Turns engine contact callbacks into explicit paddle ledger commands.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use flipshot_core::ids::{BallId, PaddleId};
use flipshot_core::math::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactPhase {
    Begin,
    Stay,
    End,
}

/// What the ball touched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ContactTarget {
    Paddle(PaddleId),
    Ground,
    Bumper { kick: f32 },
    Other,
}

/// One contact callback delivered by the physics engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    pub ball: BallId,
    pub phase: ContactPhase,
    pub target: ContactTarget,
    /// Contact normal pointing from the other surface toward the ball.
    pub normal: Vec3,
}

impl ContactEvent {
    pub fn new(ball: BallId, phase: ContactPhase, target: ContactTarget, normal: Vec3) -> Self {
        Self {
            ball,
            phase,
            target,
            normal,
        }
    }
}

/// Ledger operation for one paddle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaddleCommand {
    Enter {
        ball: BallId,
        paddle: PaddleId,
        direction: Vec3,
    },
    Update {
        ball: BallId,
        paddle: PaddleId,
        direction: Vec3,
    },
    Exit {
        ball: BallId,
        paddle: PaddleId,
    },
}

/// Per `(ball, paddle)` contact state.
///
/// Only relies on begin/stay/end arriving in order for a single contact; a
/// missed begin or a stray end is tolerated.
#[derive(Debug, Clone, Default)]
pub struct ContactTable {
    pairs: BTreeSet<(BallId, PaddleId)>,
}

impl ContactTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a paddle contact. Returns `None` for non-paddle contacts and for
    /// transitions that change nothing.
    pub fn route(&mut self, event: &ContactEvent) -> Option<PaddleCommand> {
        let ContactTarget::Paddle(paddle) = event.target else {
            return None;
        };
        let key = (event.ball, paddle);
        let touching = self.pairs.contains(&key);
        let direction = event.normal;
        match (event.phase, touching) {
            (ContactPhase::Begin | ContactPhase::Stay, false) => {
                self.pairs.insert(key);
                Some(PaddleCommand::Enter {
                    ball: event.ball,
                    paddle,
                    direction,
                })
            },
            (ContactPhase::Begin | ContactPhase::Stay, true) => Some(PaddleCommand::Update {
                ball: event.ball,
                paddle,
                direction,
            }),
            (ContactPhase::End, true) => {
                self.pairs.remove(&key);
                Some(PaddleCommand::Exit {
                    ball: event.ball,
                    paddle,
                })
            },
            (ContactPhase::End, false) => {
                tracing::debug!(ball = %event.ball, %paddle, "Contact end without begin");
                None
            },
        }
    }

    pub fn is_touching(&self, ball: BallId, paddle: PaddleId) -> bool {
        self.pairs.contains(&(ball, paddle))
    }

    /// Drop every pair involving `ball`.
    pub fn purge_ball(&mut self, ball: BallId) {
        self.pairs.retain(|(b, _)| *b != ball);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
