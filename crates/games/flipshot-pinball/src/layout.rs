use flipshot_core::ids::PaddleId;
use flipshot_core::math::Vec3;

use crate::launcher::RestAnchor;
use crate::surface::{Shape, SurfaceKind, SurfaceSet};

pub const LEFT_PADDLE: PaddleId = PaddleId(1);
pub const RIGHT_PADDLE: PaddleId = PaddleId(2);

/// Height of the playfield plane in the starter table.
pub const TABLE_HEIGHT: f32 = 3.5;

/// Static geometry of a table plus where the ball rests before launch.
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub name: String,
    pub width: f32,
    pub depth: f32,
    pub surfaces: SurfaceSet,
    pub anchor: RestAnchor,
    pub left_paddle: PaddleId,
    pub right_paddle: PaddleId,
}

/// The starter table: a walled 10 x 20 field centered on the origin, a
/// launch block near the player end, one bumper up-field and two paddles
/// guarding the drain at `z = -10`. The playfield sits at [`TABLE_HEIGHT`],
/// which puts a default ball rolling on it level with the default assist
/// ceiling. The assist only engages strictly below the ceiling, so a rolling
/// ball needs a raised ceiling such as the one in `config/table.toml`.
pub fn default_layout() -> TableLayout {
    let w = 10.0_f32;
    let d = 20.0_f32;
    let h = TABLE_HEIGHT;
    let mut surfaces = SurfaceSet::new();

    surfaces.add(
        SurfaceKind::Ground,
        Shape::Plane {
            point: Vec3::new(0.0, h, 0.0),
            normal: Vec3::Y,
        },
        0.2,
    );

    // Side and far walls
    for (point, normal) in [
        (Vec3::new(-w / 2.0, h, 0.0), Vec3::new(1.0, 0.0, 0.0)),
        (Vec3::new(w / 2.0, h, 0.0), Vec3::new(-1.0, 0.0, 0.0)),
        (Vec3::new(0.0, h, d / 2.0), Vec3::new(0.0, 0.0, -1.0)),
    ] {
        surfaces.add(SurfaceKind::Wall, Shape::Plane { point, normal }, 0.1);
    }

    let anchor = RestAnchor {
        position: Vec3::new(0.0, h + 0.5, -5.0),
        height: 1.0,
        scale_y: 1.0,
    };
    surfaces.add(
        SurfaceKind::Wall,
        Shape::Box {
            center: anchor.position,
            half_extents: Vec3::new(0.5, 0.5, 0.5),
        },
        0.1,
    );

    surfaces.add(
        SurfaceKind::Bumper { kick: 12.0 },
        Shape::Sphere {
            center: Vec3::new(0.0, h + 0.5, 4.0),
            radius: 0.75,
        },
        0.0,
    );

    for (paddle, x) in [(LEFT_PADDLE, -1.5), (RIGHT_PADDLE, 1.5)] {
        surfaces.add(
            SurfaceKind::Paddle(paddle),
            Shape::Box {
                center: Vec3::new(x, h + 0.25, -8.0),
                half_extents: Vec3::new(1.2, 0.25, 0.25),
            },
            0.3,
        );
    }

    TableLayout {
        name: "Starter Table".to_string(),
        width: w,
        depth: d,
        surfaces,
        anchor,
        left_paddle: LEFT_PADDLE,
        right_paddle: RIGHT_PADDLE,
    }
}
