#[allow(dead_code)]
mod common;

use common::{REST, drag_launch, drag_to, press_at, release, table_with_ball};
use flipshot_core::body::{Constraints, PhysicsBody};
use flipshot_core::input::{InputAction, InputEvent};
use flipshot_core::math::Vec3;
use flipshot_core::notify::TableEvent;
use flipshot_core::test_helpers::assert_vec_near;
use flipshot_pinball::{BallState, TableSnapshot};

#[test]
fn drag_at_sixty_percent_launches_with_160() {
    let (mut table, ball) = table_with_ball();
    drag_launch(&mut table, 1.2);

    let events = table.drain_events();
    assert_eq!(events[0], TableEvent::DragStarted { ball });
    let TableEvent::BallLaunched { ball: launched, force } = events[1].clone() else {
        panic!("expected a launch, got {events:?}");
    };
    assert_eq!(launched, ball);
    assert!((force - 160.0).abs() < 1e-3, "force was {force}");

    let agent = table.ball(ball).unwrap();
    assert_eq!(agent.state(), BallState::Launched);
    let body = agent.body().unwrap();
    assert!(!body.is_kinematic());
    assert!((body.total_impulse().length() - 160.0).abs() < 1e-2);
    assert_eq!(table.notifier().action_views, 1);
    assert!(!table.main_ball_at_rest());
}

#[test]
fn launched_ball_cannot_be_dragged_again() {
    let (mut table, ball) = table_with_ball();
    drag_launch(&mut table, 1.5);
    table.drain_events();

    let position = table.ball(ball).unwrap().position().unwrap();
    press_at(&mut table, position);
    assert!(!table.launcher().is_dragging());
    assert_eq!(table.launcher().active_ball(), Some(ball));
    assert_eq!(table.ball(ball).unwrap().state(), BallState::Launched);
    assert!(table.drain_events().is_empty());
}

#[test]
fn short_release_snaps_back_without_impulse() {
    let (mut table, ball) = table_with_ball();
    press_at(&mut table, REST);
    drag_to(&mut table, REST - Vec3::new(0.0, 0.0, 0.4));
    release(&mut table);

    let events = table.drain_events();
    assert_eq!(
        events,
        vec![
            TableEvent::DragStarted { ball },
            TableEvent::DragCancelled { ball },
        ]
    );
    let agent = table.ball(ball).unwrap();
    assert_eq!(agent.state(), BallState::Idle);
    assert_eq!(agent.position(), Some(REST));
    let body = agent.body().unwrap();
    assert!(body.impulses.is_empty());
    assert!(body.is_kinematic());
    assert_eq!(body.constraints(), Constraints::FREEZE_ALL);
    assert_eq!(table.notifier().action_views, 0);
}

#[test]
fn dragging_clamps_into_sector_and_shows_preview() {
    let (mut table, ball) = table_with_ball();
    press_at(&mut table, REST);
    // Straight up-field is outside the sector; equally far from both bounds.
    drag_to(&mut table, REST + Vec3::new(0.0, 0.0, 5.0));

    let drag = table.launcher().drag_vector();
    assert!((drag.length() - 2.0).abs() < 1e-4);
    let expected = Vec3::new(210f32.to_radians().cos(), 0.0, 210f32.to_radians().sin()) * 2.0;
    assert_vec_near(drag, expected, 1e-4);
    assert_vec_near(table.ball(ball).unwrap().position().unwrap(), REST + expected, 1e-4);
    assert_eq!(table.launcher().preview().len(), 100);

    release(&mut table);
    assert!(table.launcher().preview().is_empty());
    assert!(!table.launcher().is_dragging());
}

#[test]
fn press_on_empty_space_does_not_drag() {
    let (mut table, _) = table_with_ball();
    table.pointer_mut().pick = None;
    press_at(&mut table, REST);
    assert!(!table.launcher().is_dragging());
}

#[test]
fn assist_engages_after_launch_and_reset_restores_rest() {
    let (mut table, ball) = table_with_ball();
    drag_launch(&mut table, 2.0);
    // Launched from above the 4.0 ceiling: no assist yet.
    table.fixed_step(0.02, &[]);
    assert!(!table.ball(ball).unwrap().assist_enabled());

    for (_, body) in table.bodies_mut() {
        body.move_position(Vec3::new(0.0, 3.9, 2.0));
    }
    table.fixed_step(0.02, &[]);
    let agent = table.ball(ball).unwrap();
    assert!(agent.assist_enabled());
    assert_eq!(
        agent.body().unwrap().constraints(),
        Constraints::FREEZE_POSITION_Y
    );

    table.handle_input(InputEvent::performed(InputAction::ResetBall));
    let agent = table.ball(ball).unwrap();
    assert_eq!(agent.state(), BallState::Idle);
    assert!(!agent.assist_enabled());
    assert_eq!(agent.position(), Some(REST));
    assert_eq!(agent.velocity(), Some(Vec3::ZERO));
    assert_eq!(table.notifier().launch_views, 1);

    // Ready for another drag.
    table.drain_events();
    press_at(&mut table, REST);
    assert!(table.launcher().is_dragging());
}

#[test]
fn paused_table_ignores_drags() {
    let (mut table, _) = table_with_ball();
    table.handle_input(InputEvent::performed(InputAction::Pause));
    press_at(&mut table, REST);
    assert!(!table.launcher().is_dragging());
}

#[test]
fn mid_drag_snapshot_decodes() {
    let (mut table, ball) = table_with_ball();
    press_at(&mut table, REST);
    drag_to(&mut table, REST - Vec3::new(0.0, 0.0, 1.0));

    let bytes = table.serialize_state().unwrap();
    let snapshot = TableSnapshot::decode(&bytes).unwrap();
    assert!(snapshot.launcher.dragging);
    assert_eq!(snapshot.launcher.active_ball, Some(ball));
    assert_eq!(snapshot.launcher.preview.len(), 100);
    assert_eq!(snapshot.balls[0].state, BallState::Held);
}
