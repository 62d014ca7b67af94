use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::genres::GenreCache;
use crate::render::{self, ImageConfig, MainView};
use crate::tmdb::{ApiError, CatalogApi, Movie, MovieList};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMode {
    Popular,
    Text(String),
    Genre(String),
}

impl QueryMode {
    pub fn parse(input: &str) -> Self {
        if let Some(genre) = input.strip_prefix(':') {
            QueryMode::Genre(genre.to_string())
        } else if input.is_empty() {
            QueryMode::Popular
        } else {
            QueryMode::Text(input.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("Response from {0} has no results")]
    MissingResults(&'static str),
}

/// Drives the catalog client and the renderer for one query.
#[derive(Clone)]
pub struct SearchController {
    api: Arc<dyn CatalogApi>,
    genres: Arc<GenreCache>,
    images: ImageConfig,
}

impl SearchController {
    pub fn new(api: Arc<dyn CatalogApi>, genres: Arc<GenreCache>, images: ImageConfig) -> Self {
        Self { api, genres, images }
    }

    pub fn genres(&self) -> &Arc<GenreCache> {
        &self.genres
    }

    pub fn api(&self) -> &Arc<dyn CatalogApi> {
        &self.api
    }

    /// Load the genre cache if needed. A failure leaves labels as "Unknown"
    /// and does not stop the search.
    pub async fn ensure_genres(&self) {
        if let Err(e) = self.genres.ensure(self.api.as_ref()).await {
            warn!("Continuing without genres: {}", e);
        }
    }

    pub async fn run(&self, mode: &QueryMode) -> Result<MainView, SearchError> {
        self.ensure_genres().await;

        match mode {
            QueryMode::Popular => {
                debug!("Loading popular movies");
                let list = self.api.popular().await?;
                Ok(self.build(results(list, "popular")?))
            }
            QueryMode::Text(query) => {
                debug!(query = %query, "Searching movies");
                let list = self.api.search(query).await?;
                Ok(self.build(results(list, "search")?))
            }
            QueryMode::Genre(text) => self.run_genre(text).await,
        }
    }

    async fn run_genre(&self, text: &str) -> Result<MainView, SearchError> {
        let genres = self.genres.snapshot();
        let Some((genre_id, name)) = genres.find_exact_ci(text) else {
            info!(genre = %text, "Genre not found");
            return Ok(MainView::Message(format!("Genre not found: {}", text)));
        };
        debug!(genre = %name, id = genre_id, "Discovering movies by genre");

        let list = self.api.discover_by_genre(genre_id).await?;
        let filtered: Vec<Movie> = results(list, "discover")?
            .into_iter()
            .filter(|m| m.first_genre() == Some(genre_id))
            .collect();

        Ok(self.build(filtered))
    }

    fn build(&self, movies: Vec<Movie>) -> MainView {
        let genres = self.genres.snapshot();
        render::build(&movies, &genres, &self.images)
    }
}

fn results(list: MovieList, what: &'static str) -> Result<Vec<Movie>, SearchError> {
    list.results.ok_or(SearchError::MissingResults(what))
}
