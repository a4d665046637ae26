use serde::{Deserialize, Serialize};

use crate::ids::BallId;
use crate::math::{Vec2, Vec3};

/// Lifecycle phase of an input action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPhase {
    Started,
    Performed,
    Canceled,
}

/// Discrete actions delivered by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputAction {
    /// Left paddle button; `true` while held.
    LeftPaddle(bool),
    /// Right paddle button; `true` while held.
    RightPaddle(bool),
    Pause,
    ResetBall,
    /// Pointer press: `Started` on press, `Canceled` on release.
    DragPress,
    /// Pointer position in screen space.
    DragPosition(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    pub action: InputAction,
    pub phase: InputPhase,
}

impl InputEvent {
    pub fn started(action: InputAction) -> Self {
        Self {
            action,
            phase: InputPhase::Started,
        }
    }

    pub fn performed(action: InputAction) -> Self {
        Self {
            action,
            phase: InputPhase::Performed,
        }
    }

    pub fn canceled(action: InputAction) -> Self {
        Self {
            action,
            phase: InputPhase::Canceled,
        }
    }
}

/// Screen-to-world services supplied by the camera/input layer.
pub trait Pointer {
    /// Project a screen point onto the horizontal drag plane.
    fn world_point(&self, screen: Vec2) -> Option<Vec3>;

    /// The ball under the screen point, if any.
    fn pick_ball(&self, screen: Vec2) -> Option<BallId>;
}
