use std::sync::{Arc, Mutex};

use oxide_flux::{
    InputEvent, NodeAction, Phase, TestNode, DEFAULT_ID_PREFIX, FOCUS_ATTEMPTS, MOUNT_ATTEMPTS,
};

use super::build_integration_test;

type Seen = Arc<Mutex<Vec<(String, &'static str)>>>;

fn recorder(seen: &Seen) -> impl FnOnce(&TestNode, &&'static str) + Send + 'static {
    let seen = seen.clone();
    move |node: &TestNode, tag: &&'static str| seen.lock().unwrap().push((node.id().to_string(), *tag))
}

#[test]
fn given_a_mounted_input_should_focus_and_select_it_after_the_next_render() {
    let test = build_integration_test().build();
    test.container.mount("draft-input");

    test.app.focus_after_render("draft-input", true);
    assert!(test.container.actions().is_empty());

    test.app.render().unwrap();

    assert_eq!(
        test.container.actions(),
        vec![
            NodeAction::Focused("draft-input".into()),
            NodeAction::Selected("draft-input".into())
        ]
    );
    assert_eq!(test.app.pending_hooks(), 0);
}

#[test]
fn given_a_focus_target_that_never_appears_should_give_up_silently() {
    let test = build_integration_test().build();
    test.app.focus_after_render("ghost", false);

    for _ in 0..FOCUS_ATTEMPTS {
        assert_eq!(test.app.pending_hooks(), 1);
        test.app.render().unwrap();
    }
    assert_eq!(test.app.pending_hooks(), 0);

    test.container.mount("ghost");
    test.app.render().unwrap();
    assert!(test.container.actions().is_empty());
}

#[test]
fn given_a_mount_hook_should_run_once_the_element_appears_within_its_budget() {
    let test = build_integration_test().build();
    let seen: Seen = Default::default();
    test.app.on_mount("list", "list mounted", recorder(&seen));

    for _ in 0..MOUNT_ATTEMPTS - 1 {
        test.app.render().unwrap();
    }
    assert!(seen.lock().unwrap().is_empty());

    test.container.mount("list");
    test.app.render().unwrap();
    test.app.render().unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![("list".to_string(), "list mounted")]
    );
}

#[test]
fn given_an_unmount_watch_should_fire_after_the_render_that_removes_the_node() {
    let test = build_integration_test().build();
    let seen: Seen = Default::default();
    let row = test.container.mount("row-0");
    test.app.on_unmount(row, "row removed", recorder(&seen));

    test.app.render().unwrap();
    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(test.app.watched_unmounts(), 1);

    test.container.unmount("row-0");
    test.app.render().unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![("row-0".to_string(), "row removed")]
    );
    assert_eq!(test.app.watched_unmounts(), 0);
}

#[test]
fn given_a_remounted_id_should_treat_the_old_node_as_unmounted() {
    let test = build_integration_test().build();
    let seen: Seen = Default::default();
    let row = test.container.mount("row-0");
    test.app.on_unmount(row, "replaced", recorder(&seen));

    test.container.mount("row-0");
    test.app.render().unwrap();

    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[test]
fn given_a_deferred_renderer_should_run_hooks_only_on_completion() {
    let test = build_integration_test().given_a_deferred_renderer().build();
    test.container.mount("draft-input");
    test.app.focus_after_render("draft-input", false);

    test.latest(|view| (view.on_draft_change)(&InputEvent::change("milk")));
    assert!(test.container.actions().is_empty());

    test.renders.complete_pending();

    assert_eq!(
        test.container.actions(),
        vec![NodeAction::Focused("draft-input".into())]
    );
}

#[test]
fn given_a_stopped_app_should_drop_pending_hooks() {
    let test = build_integration_test().build();
    test.app.focus_after_render("draft-input", false);
    test.app.on_unmount(test.container.mount("row-0"), (), |_: &TestNode, _: &()| {
        panic!("watch must not fire after stop")
    });

    test.app.stop().unwrap();
    test.container.unmount("row-0");

    assert_eq!(test.app.pending_hooks(), 0);
    assert_eq!(test.app.watched_unmounts(), 0);
}

#[test]
fn given_a_hook_that_stops_the_app_should_drop_the_hooks_still_pending() {
    let test = build_integration_test().build();
    test.container.mount("draft-input");
    test.container.mount("row-0");
    let app = test.app.clone();
    test.app
        .on_mount("draft-input", (), move |_: &TestNode, _: &()| app.stop().unwrap());
    test.app.focus_after_render("never", false);
    test.app.on_unmount(test.container.mount("row-1"), (), |_: &TestNode, _: &()| {
        panic!("watch must not fire after stop")
    });
    test.container.unmount("row-1");

    test.app.render().unwrap();

    assert_eq!(test.app.phase(), Phase::Stopped);
    assert_eq!(test.app.pending_hooks(), 0);
    assert_eq!(test.app.watched_unmounts(), 0);

    test.app.focus_after_render("row-0", false);
    assert_eq!(test.app.pending_hooks(), 0);
}

#[test]
fn given_only_the_draft_changes_should_reuse_the_memoized_heading() {
    let test = build_integration_test().given_todos(&["milk"]).build();
    let first = test.latest(|view| view.heading.clone());

    test.latest(|view| (view.on_draft_change)(&InputEvent::change("eggs")));
    test.frames.tick();

    let second = test.latest(|view| view.heading.clone());
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(test.handles.heading.hits(), 1);

    test.latest(|view| (view.on_draft_key)(&InputEvent::key_press("Enter")));
    test.frames.tick();

    test.latest(|view| assert_eq!(*view.heading, "Todos (2)"));
    assert_eq!(test.handles.heading.misses(), 2);
}

#[test]
fn given_element_id_requests_should_hand_out_unique_ids() {
    let test = build_integration_test().build();

    let first = test.app.next_element_id("todo-");
    let second = test.app.next_element_id("todo-");
    let fallback = test.app.next_element_id("");

    assert_ne!(first, second);
    assert!(first.starts_with("todo-"));
    assert!(fallback.starts_with(DEFAULT_ID_PREFIX));
}
