use std::sync::Arc;
use std::time::Duration;

use oxide_flux::{Error, InputEvent, Kind};

use super::{build_integration_test, Params};

#[test]
fn given_a_change_callback_when_invoked_should_render_the_new_value() {
    let test = build_integration_test().build();

    test.latest(|view| (view.on_draft_change)(&InputEvent::change("milk")));
    test.frames.tick();

    test.latest(|view| assert_eq!(view.draft, "milk"));
}

#[test]
fn given_a_key_callback_should_only_submit_on_enter() {
    let test = build_integration_test().build();
    test.latest(|view| (view.on_draft_change)(&InputEvent::change("milk")));

    test.latest(|view| (view.on_draft_key)(&InputEvent::key_press("a")));
    test.latest(|view| (view.on_draft_key)(&InputEvent::key_press("Escape")));
    assert!(test.todos().is_empty());

    test.latest(|view| (view.on_draft_key)(&InputEvent::key_press("Enter")));
    assert_eq!(test.todos(), vec!["milk"]);
}

#[test]
fn given_a_clear_callback_when_invoked_twice_should_clear_each_time() {
    let test = build_integration_test().given_todos(&["milk", "eggs"]).build();

    test.latest(|view| {
        (view.on_clear)();
        (view.on_clear)();
    });
    test.frames.tick();

    assert!(test.todos().is_empty());
    test.latest(|view| assert_eq!(*view.heading, "Todos (0)"));
}

#[test]
fn given_a_delayed_dispatch_should_wait_for_the_timer() {
    let test = build_integration_test().build();
    test.handles.draft_changed.dispatch([("value".to_string(), "milk".to_string())].into());

    let handle = test
        .handles
        .draft_submitted
        .dispatch_after((), Duration::from_millis(10));
    assert!(test.todos().is_empty());
    assert_eq!(test.timers.pending(), 1);

    test.timers.run_pending();

    assert!(handle.is_finished());
    assert_eq!(test.todos(), vec!["milk"]);
}

#[test]
fn given_a_cancelled_deferred_mutation_should_leave_state_alone() {
    let test = build_integration_test().given_todos(&["milk"]).build();

    let handle = test.handles.remove_todo.run_after(0, Duration::ZERO);
    handle.cancel();
    test.timers.run_pending();

    assert_eq!(test.todos(), vec!["milk"]);
}

#[test]
fn given_a_stopped_app_should_cancel_outstanding_deferred_work() {
    let test = build_integration_test().given_todos(&["milk"]).build();
    let before = test.handles.remove_todo.run_after(0, Duration::ZERO);

    test.app.stop().unwrap();
    let after = test.handles.remove_todo.run_after(0, Duration::ZERO);
    test.timers.run_pending();

    assert!(before.is_cancelled());
    assert!(after.is_cancelled());
    assert_eq!(test.todos(), vec!["milk"]);
}

#[test]
fn given_a_handler_that_dispatches_again_should_finish_the_inner_dispatch_first() {
    let test = build_integration_test().build();
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let submitted = test.handles.draft_submitted.clone();
    let log = order.clone();
    test.handles.draft_changed.subscribe(move |params: &Params, _| {
        log.lock().unwrap().push(format!("changed {}", params["value"]));
        submitted.dispatch(());
    });
    let log = order.clone();
    test.handles
        .draft_submitted
        .subscribe(move |_: &(), name| log.lock().unwrap().push(name.to_string()));

    test.latest(|view| (view.on_draft_change)(&InputEvent::change("milk")));

    assert_eq!(
        *order.lock().unwrap(),
        vec!["changed milk".to_string(), "draftSubmitted".to_string()]
    );
    assert_eq!(test.todos(), vec!["milk"]);
}

#[test]
fn given_registered_handles_should_be_found_by_name() {
    let test = build_integration_test().given_todos(&["milk"]).build();

    let todos = test
        .app
        .query::<(), Arc<Vec<String>>>("todos")
        .unwrap()
        .run(());
    test.app.mutator::<usize>("removeTodo").unwrap().run(0);

    assert_eq!(*todos, vec!["milk"]);
    assert!(test.todos().is_empty());
    assert_eq!(
        test.app.event::<usize>("draftSubmitted").unwrap_err(),
        Error::TypeMismatch {
            kind: Kind::Event,
            name: "draftSubmitted".into()
        }
    );
    assert_eq!(
        test.app.mutator::<()>("missing").unwrap_err(),
        Error::UnknownMutator("missing".into())
    );
}

#[test]
fn given_an_unused_event_should_report_it_as_orphaned() {
    let test = build_integration_test().build();
    assert!(test.app.orphaned_events().is_empty());

    test.app.add_event::<()>("neverHeard");

    assert_eq!(test.app.orphaned_events(), vec!["neverHeard".to_string()]);
}
