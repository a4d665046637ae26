//! Host-side collaborators: a top-down camera pointer and a logging view
//! notifier.

use flipshot_core::ids::BallId;
use flipshot_core::input::Pointer;
use flipshot_core::math::{Vec2, Vec3};
use flipshot_core::notify::ViewNotifier;

/// Orthographic camera looking straight down at the table.
///
/// Screen `x` grows toward world `+x`, screen `y` grows toward world `-z`.
/// Picking compares against the last ball positions handed to [`track`].
///
/// [`track`]: SimPointer::track
#[derive(Debug, Clone)]
pub struct SimPointer {
    viewport: Vec2,
    pixels_per_unit: f32,
    plane_y: f32,
    pick_radius: f32,
    targets: Vec<(BallId, Vec3)>,
}

impl SimPointer {
    pub fn new(viewport: Vec2, pixels_per_unit: f32, plane_y: f32, pick_radius: f32) -> Self {
        Self {
            viewport,
            pixels_per_unit,
            plane_y,
            pick_radius,
            targets: Vec::new(),
        }
    }

    pub fn track(&mut self, targets: Vec<(BallId, Vec3)>) {
        self.targets = targets;
    }

    pub fn to_screen(&self, world: Vec3) -> Vec2 {
        Vec2::new(
            self.viewport.x / 2.0 + world.x * self.pixels_per_unit,
            self.viewport.y / 2.0 - world.z * self.pixels_per_unit,
        )
    }
}

impl Pointer for SimPointer {
    fn world_point(&self, screen: Vec2) -> Option<Vec3> {
        if self.pixels_per_unit <= 0.0 {
            return None;
        }
        Some(Vec3::new(
            (screen.x - self.viewport.x / 2.0) / self.pixels_per_unit,
            self.plane_y,
            (self.viewport.y / 2.0 - screen.y) / self.pixels_per_unit,
        ))
    }

    fn pick_ball(&self, screen: Vec2) -> Option<BallId> {
        let point = self.world_point(screen)?;
        self.targets
            .iter()
            .map(|(id, position)| (*id, (*position - point).with_y(0.0).length()))
            .filter(|(_, distance)| *distance <= self.pick_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

/// Logs camera switches and counts them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier {
    pub action_views: u32,
    pub launch_views: u32,
}

impl ViewNotifier for LogNotifier {
    fn switch_to_action_view(&mut self) {
        self.action_views += 1;
        tracing::info!("Camera: following the ball");
    }

    fn switch_to_launch_view(&mut self) {
        self.launch_views += 1;
        tracing::info!("Camera: back to the launcher");
    }
}
