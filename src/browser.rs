use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::autocomplete::{Key, KeyAction, SearchBox};
use crate::search::{QueryMode, SearchController, SearchError};
use crate::render::MainView;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Rendered(MainView),
    /// A newer search started while this one was in flight; its result
    /// was dropped.
    Superseded,
}

/// The `main` view and the generation counter that keeps stale results
/// off the page.
struct Page {
    view: RwLock<MainView>,
    generation: AtomicU64,
}

impl Page {
    async fn install(&self, ticket: u64, view: MainView) -> bool {
        let mut current = self.view.write().await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            return false;
        }
        *current = view;
        true
    }
}

/// Application state for one page: the search box and the `main` view.
pub struct Browser {
    controller: SearchController,
    search_box: RwLock<SearchBox>,
    page: Arc<Page>,
}

impl Browser {
    pub fn new(controller: SearchController) -> Self {
        Self {
            controller,
            search_box: RwLock::new(SearchBox::default()),
            page: Arc::new(Page {
                view: RwLock::new(MainView::Empty),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn controller(&self) -> &SearchController {
        &self.controller
    }

    pub async fn search_box(&self) -> SearchBox {
        self.search_box.read().await.clone()
    }

    pub async fn view(&self) -> MainView {
        self.page.view.read().await.clone()
    }

    /// A keystroke changed the search field.
    pub async fn input(&self, text: &str) -> SearchBox {
        self.controller.ensure_genres().await;
        let genres = self.controller.genres().snapshot();

        let mut sb = self.search_box.write().await;
        sb.on_input(text, &genres);
        sb.clone()
    }

    pub async fn key(&self, key: Key) -> (KeyAction, SearchBox, Option<SearchOutcome>) {
        self.key_with_input(None, key).await
    }

    /// Optionally set the field text, then apply `key`, both under one
    /// lock of the search box. Returns the box as the key left it.
    pub async fn key_with_input(
        &self,
        text: Option<&str>,
        key: Key,
    ) -> (KeyAction, SearchBox, Option<SearchOutcome>) {
        if text.is_some() {
            self.controller.ensure_genres().await;
        }
        let genres = self.controller.genres().snapshot();

        let (action, search_box) = {
            let mut sb = self.search_box.write().await;
            if let Some(text) = text {
                sb.on_input(text, &genres);
            }
            (sb.on_key(key), sb.clone())
        };

        match action {
            KeyAction::Search => {
                let outcome = self.run(search_box.text.clone()).await;
                (action, search_box, Some(outcome))
            }
            _ => (action, search_box, None),
        }
    }

    /// Search for whatever is in the search field.
    pub async fn search(&self) -> SearchOutcome {
        let text = self.search_box.read().await.text.clone();
        self.run(text).await
    }

    /// Set the search field (clearing the ghost) and search for it.
    pub async fn search_for(&self, text: &str) -> SearchOutcome {
        {
            let mut sb = self.search_box.write().await;
            sb.text = text.to_string();
            sb.ghost.clear();
        }
        self.run(text.to_string()).await
    }

    /// The search runs in its own task so it still replaces the loading
    /// view when the caller goes away.
    async fn run(&self, text: String) -> SearchOutcome {
        let ticket = self.page.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let page = self.page.clone();
        let controller = self.controller.clone();

        let task = tokio::spawn(async move {
            page.install(ticket, MainView::Loading).await;

            let view = match controller.run(&QueryMode::parse(&text)).await {
                Ok(view) => view,
                Err(e) => {
                    error!(query = %text, "Search failed: {}", e);
                    MainView::Message(failure_message(&e))
                }
            };

            if page.install(ticket, view.clone()).await {
                SearchOutcome::Rendered(view)
            } else {
                debug!(query = %text, ticket, "Discarding superseded search result");
                SearchOutcome::Superseded
            }
        });

        match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Search task failed: {}", e);
                let view = MainView::Message("Search failed.".to_string());
                if self.page.install(ticket, view.clone()).await {
                    SearchOutcome::Rendered(view)
                } else {
                    SearchOutcome::Superseded
                }
            }
        }
    }
}

fn failure_message(err: &SearchError) -> String {
    match err {
        SearchError::Api(_) => "Could not reach the movie catalog.".to_string(),
        SearchError::MissingResults(_) => "No results.".to_string(),
    }
}
