use flipshot_core::ids::BallId;
use flipshot_core::input::{InputAction, InputEvent};
use flipshot_core::math::Vec3;
use flipshot_core::test_helpers::{FixedPointer, RecordingBody, RecordingNotifier};
use flipshot_pinball::{Table, TableConfig, default_layout};

pub type TestTable = Table<RecordingBody, FixedPointer, RecordingNotifier>;

/// Rest pose of the default layout with the default ball radius.
pub const REST: Vec3 = Vec3::new(0.0, 5.0, -5.0);

pub fn table_with(config: TableConfig) -> (TestTable, BallId) {
    let mut table = Table::new(
        config,
        default_layout(),
        FixedPointer::default(),
        RecordingNotifier::default(),
    );
    let ball = table.spawn_ball(RecordingBody::new());
    table.pointer_mut().pick = Some(ball);
    (table, ball)
}

pub fn table_with_ball() -> (TestTable, BallId) {
    table_with(TableConfig::default())
}

/// Move the pointer over `world` and press.
pub fn press_at(table: &mut TestTable, world: Vec3) {
    table.handle_input(InputEvent::performed(InputAction::DragPosition(
        FixedPointer::screen_for(world),
    )));
    table.handle_input(InputEvent::started(InputAction::DragPress));
}

pub fn drag_to(table: &mut TestTable, world: Vec3) {
    table.handle_input(InputEvent::performed(InputAction::DragPosition(
        FixedPointer::screen_for(world),
    )));
}

pub fn release(table: &mut TestTable) {
    table.handle_input(InputEvent::canceled(InputAction::DragPress));
}

/// Press on the resting ball, pull it back by `pull` along -Z and let go.
pub fn drag_launch(table: &mut TestTable, pull: f32) {
    press_at(table, REST);
    drag_to(table, REST - Vec3::new(0.0, 0.0, pull));
    release(table);
}
