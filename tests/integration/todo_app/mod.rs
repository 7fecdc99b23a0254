use std::collections::BTreeMap;
use std::sync::Arc;

use oxide_flux::{App, AppBuilder, Event, InputEvent, Memo, Mutator, Query, TestContainer};

pub(crate) type Params = BTreeMap<String, String>;
pub(crate) type State = Arc<Model>;
pub(crate) type TodoApp = App<State, TodoView, TestContainer>;
pub(crate) type Heading = Memo<(Arc<str>, Arc<Vec<String>>), (), Arc<String>>;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Model {
    pub(crate) title: Arc<str>,
    pub(crate) draft: String,
    pub(crate) todos: Arc<Vec<String>>,
}

impl Model {
    pub(crate) fn new(title: &str, todos: Vec<String>) -> State {
        Arc::new(Model {
            title: Arc::from(title),
            draft: String::new(),
            todos: Arc::new(todos),
        })
    }
}

pub(crate) struct TodoView {
    pub(crate) heading: Arc<String>,
    pub(crate) draft: String,
    pub(crate) on_draft_change: Box<dyn Fn(&InputEvent) + Send + Sync>,
    pub(crate) on_draft_key: Box<dyn Fn(&InputEvent) + Send + Sync>,
    pub(crate) on_clear: Box<dyn Fn() + Send + Sync>,
}

#[cfg_attr(test, mockall::automock)]
pub(crate) trait TransitionObserver {
    fn on_transition(&self, todos_before: usize, todos_after: usize);
}

pub(crate) struct Handles {
    pub(crate) draft_changed: Event<Params>,
    pub(crate) draft_submitted: Event<()>,
    pub(crate) remove_todo: Mutator<State, usize>,
    pub(crate) heading: Arc<Heading>,
}

pub(crate) fn configure(builder: &mut AppBuilder<State, TodoView, TestContainer>) -> Handles {
    let draft_changed = builder.event::<Params>("draftChanged");
    let draft_submitted = builder.event::<()>("draftSubmitted");
    let cleared = builder.event::<()>("cleared");

    let set_draft = builder.mutator("setDraft", |state: &State, draft: String| {
        Arc::new(Model {
            draft,
            ..(**state).clone()
        })
    });
    let add_todo = builder.mutator("addTodo", |state: &State, ()| {
        if state.draft.is_empty() {
            return state.clone();
        }
        let mut todos = (*state.todos).clone();
        todos.push(state.draft.clone());
        Arc::new(Model {
            draft: String::new(),
            todos: Arc::new(todos),
            ..(**state).clone()
        })
    });
    let clear = builder.mutator("clear", |state: &State, ()| {
        Arc::new(Model {
            todos: Arc::new(Vec::new()),
            ..(**state).clone()
        })
    });
    let remove_todo = builder.mutator("removeTodo", |state: &State, index: usize| {
        if index >= state.todos.len() {
            return state.clone();
        }
        let mut todos = (*state.todos).clone();
        todos.remove(index);
        Arc::new(Model {
            todos: Arc::new(todos),
            ..(**state).clone()
        })
    });

    let title = builder.query("title", |state: &State, ()| state.title.clone());
    let draft = builder.query("draft", |state: &State, ()| state.draft.clone());
    let todos = builder.query("todos", |state: &State, ()| state.todos.clone());

    draft_changed.subscribe(move |params: &Params, _| {
        set_draft.run(params.get("value").cloned().unwrap_or_default())
    });
    draft_submitted.subscribe(move |_: &(), _| add_todo.run(()));
    cleared.subscribe(move |_: &(), _| clear.run(()));

    let heading: Arc<Heading> = Arc::new(Memo::new(
        "heading",
        |(title, todos): &(Arc<str>, Arc<Vec<String>>), _: &()| {
            Arc::new(format!("{title} ({})", todos.len()))
        },
    ));

    let render_heading = heading.clone();
    let on_change = draft_changed.clone();
    let on_key = draft_submitted.clone();
    builder.render(move |_app: &TodoApp| TodoView {
        heading: render_heading.call((title.run(()), todos.run(())), &()),
        draft: draft.run(()),
        on_draft_change: Box::new(on_change.dispatch_change_cb::<InputEvent>(Params::new())),
        on_draft_key: Box::new(on_key.dispatch_enter_cb::<InputEvent>(())),
        on_clear: Box::new(cleared.dispatch_cb(())),
    });

    Handles {
        draft_changed,
        draft_submitted,
        remove_todo,
        heading,
    }
}
