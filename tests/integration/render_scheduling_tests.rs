use mockall::predicate::eq;
use oxide_flux::{Error, InputEvent, Phase};

use super::{build_integration_test, MockTransitionObserver};

#[test]
fn given_initial_state_when_started_should_render_once() {
    let test = build_integration_test().given_todos(&["milk"]).build();

    assert_eq!(test.renders.count(), 1);
    assert_eq!(test.frames.pending(), 0);
    assert_eq!(test.app.phase(), Phase::Idle);
    test.latest(|view| assert_eq!(*view.heading, "Todos (1)"));
}

#[test]
fn given_several_transitions_before_a_frame_should_render_once_with_the_latest_state() {
    let test = build_integration_test().build();

    for todo in ["milk", "eggs", "bread"] {
        test.handles.draft_changed.dispatch([("value".to_string(), todo.to_string())].into());
        test.handles.draft_submitted.dispatch(());
    }

    assert_eq!(test.frames.pending(), 1);
    assert_eq!(test.renders.count(), 1);

    test.frames.tick();

    assert_eq!(test.renders.count(), 2);
    test.latest(|view| assert_eq!(*view.heading, "Todos (3)"));
    assert_eq!(test.todos(), vec!["milk", "eggs", "bread"]);
}

#[test]
fn given_a_transition_observer_should_see_every_transition_even_unchanged_ones() {
    let mut observer = MockTransitionObserver::new();
    observer
        .expect_on_transition()
        .with(eq(0), eq(0))
        .times(2)
        .return_const(());
    observer
        .expect_on_transition()
        .with(eq(0), eq(1))
        .times(1)
        .return_const(());

    let test = build_integration_test()
        .given_a_transition_observer(observer)
        .build();

    // An empty submission keeps the snapshot, but still notifies.
    test.handles.draft_submitted.dispatch(());
    test.latest(|view| (view.on_draft_change)(&InputEvent::change("milk")));
    test.handles.draft_submitted.dispatch(());
}

#[test]
fn given_an_update_that_keeps_the_snapshot_should_not_request_a_frame() {
    let test = build_integration_test().given_todos(&["milk"]).build();

    test.handles.remove_todo.run(5);

    assert_eq!(test.frames.pending(), 0);
    assert_eq!(test.app.render_now(), Ok(false));
    assert_eq!(test.renders.count(), 1);
}

#[test]
fn given_a_change_when_rendered_now_should_render_only_once() {
    let test = build_integration_test().given_todos(&["milk"]).build();
    test.handles.remove_todo.run(0);

    assert_eq!(test.app.render_now(), Ok(true));
    assert_eq!(test.app.render_now(), Ok(false));

    // The frame requested by the change arrives with nothing left to do.
    test.frames.tick();
    assert_eq!(test.renders.count(), 2);
    test.latest(|view| assert_eq!(*view.heading, "Todos (0)"));
}

#[test]
fn given_a_forced_render_should_render_without_a_change() {
    let test = build_integration_test().build();

    test.app.render().unwrap();

    assert_eq!(test.renders.count(), 2);
}

#[test]
fn given_a_deferred_renderer_when_state_changes_mid_render_should_render_again_after_completion() {
    let test = build_integration_test().given_a_deferred_renderer().build();
    assert_eq!(test.app.phase(), Phase::Rendering);

    test.latest(|view| (view.on_draft_change)(&InputEvent::change("milk")));
    assert_eq!(test.frames.pending(), 0);

    test.renders.complete_pending();
    assert_eq!(test.app.phase(), Phase::Dirty);
    assert_eq!(test.frames.pending(), 1);

    test.frames.tick();
    test.renders.complete_pending();

    assert_eq!(test.renders.count(), 2);
    assert_eq!(test.app.phase(), Phase::Idle);
    test.latest(|view| assert_eq!(view.draft, "milk"));
}

#[test]
fn given_a_deferred_renderer_should_not_render_before_completion() {
    let test = build_integration_test().given_a_deferred_renderer().build();
    test.handles.remove_todo.run(0);
    test.handles.draft_submitted.dispatch(());
    test.latest(|view| (view.on_draft_change)(&InputEvent::change("milk")));

    assert_eq!(test.app.render_now(), Ok(false));
    test.frames.tick();

    assert_eq!(test.renders.count(), 1);
    assert_eq!(test.renders.pending(), 1);
}

#[test]
fn given_a_stopped_app_should_ignore_frames_in_flight() {
    let test = build_integration_test().build();
    test.latest(|view| (view.on_draft_change)(&InputEvent::change("milk")));
    assert_eq!(test.frames.pending(), 1);

    test.app.stop().unwrap();
    test.frames.tick();

    assert_eq!(test.renders.count(), 1);
    assert_eq!(test.app.phase(), Phase::Stopped);
    assert_eq!(test.app.store().subscriber_count(), 0);
    assert_eq!(test.app.render(), Err(Error::Stopped));
    assert_eq!(test.app.stop(), Err(Error::Stopped));
}
