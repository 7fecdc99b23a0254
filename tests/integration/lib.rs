mod todo_app;

use oxide_flux::{App, ManualFrameClock, ManualTimer, TestContainer, TestRenderer};
pub(crate) use todo_app::*;

mod event_wiring_tests;
mod lifecycle_tests;
mod render_scheduling_tests;

pub(crate) struct IntegrationTest {
    pub(crate) app: TodoApp,
    pub(crate) renders: TestRenderer<TodoView>,
    pub(crate) frames: ManualFrameClock,
    pub(crate) timers: ManualTimer,
    pub(crate) container: TestContainer,
    pub(crate) handles: Handles,
}

impl IntegrationTest {
    /// Run `f` against the most recent render.
    pub(crate) fn latest<R>(&self, f: impl FnOnce(&TodoView) -> R) -> R {
        self.renders
            .with_renders(|views| f(views.last().expect("at least one render")))
    }

    pub(crate) fn todos(&self) -> Vec<String> {
        self.app.state().todos.to_vec()
    }
}

pub(crate) struct IntegrationTestBuilder {
    title: &'static str,
    todos: Vec<String>,
    deferred_renderer: bool,
    observer: Option<MockTransitionObserver>,
}

pub(crate) fn build_integration_test() -> IntegrationTestBuilder {
    IntegrationTestBuilder {
        title: "Todos",
        todos: Vec::new(),
        deferred_renderer: false,
        observer: None,
    }
}

impl IntegrationTestBuilder {
    pub(crate) fn given_todos(mut self, todos: &[&str]) -> Self {
        self.todos = todos.iter().map(|todo| todo.to_string()).collect();
        self
    }

    /// Renders wait for `renders.complete_pending()`.
    pub(crate) fn given_a_deferred_renderer(mut self) -> Self {
        self.deferred_renderer = true;
        self
    }

    pub(crate) fn given_a_transition_observer(mut self, observer: MockTransitionObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the app and start its render loop.
    pub(crate) fn build(self) -> IntegrationTest {
        let timers = ManualTimer::new();
        let frames = ManualFrameClock::new();
        let container = TestContainer::new();
        let renders = if self.deferred_renderer {
            TestRenderer::deferred()
        } else {
            TestRenderer::new()
        };

        let mut builder = App::builder(Model::new(self.title, self.todos), timers.clone());
        let handles = configure(&mut builder);
        if let Some(observer) = self.observer {
            builder.store().subscribe(move |new: &State, old: &State| {
                observer.on_transition(old.todos.len(), new.todos.len())
            });
        }

        let app = builder
            .build(renders.clone(), container.clone(), frames.clone())
            .expect("render function is configured");
        app.start_render_loop().expect("app is running");

        IntegrationTest {
            app,
            renders,
            frames,
            timers,
            container,
            handles,
        }
    }
}
