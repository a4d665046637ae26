use serde::{Deserialize, Serialize};

use crate::ids::{BallId, PaddleId};

/// Fire-and-forget camera/UI hooks.
pub trait ViewNotifier {
    /// A ball was launched; follow the action.
    fn switch_to_action_view(&mut self);

    /// The ball went back to the launcher; show the setup view.
    fn switch_to_launch_view(&mut self);
}

/// Events emitted by the table during input handling and stepping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TableEvent {
    DragStarted { ball: BallId },
    /// Release under the drag threshold; the ball went back to rest.
    DragCancelled { ball: BallId },
    BallLaunched { ball: BallId, force: f32 },
    BallReset { ball: BallId },
    PaddleDischarged { paddle: PaddleId, balls: Vec<BallId> },
    Paused,
    Resumed,
}
