use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::tmdb::{ApiError, CatalogApi, Genre};

/// Genre id to display name, iterated in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreMap(BTreeMap<u64, String>);

impl GenreMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn name(&self, id: u64) -> Option<&str> {
        self.0.get(&id).map(|s| s.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.0.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Exact, case-insensitive lookup by name.
    pub fn find_exact_ci(&self, text: &str) -> Option<(u64, &str)> {
        let wanted = text.to_lowercase();
        self.iter().find(|(_, name)| name.to_lowercase() == wanted)
    }

    /// First name (by id) that starts with `prefix`. Case-sensitive.
    pub fn first_with_prefix(&self, prefix: &str) -> Option<&str> {
        self.iter()
            .find(|(_, name)| name.starts_with(prefix))
            .map(|(_, name)| name)
    }
}

impl FromIterator<Genre> for GenreMap {
    fn from_iter<I: IntoIterator<Item = Genre>>(iter: I) -> Self {
        Self(iter.into_iter().map(|g| (g.id, g.name)).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Empty,
    Loading,
    Populated,
}

impl CacheState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => CacheState::Loading,
            2 => CacheState::Populated,
            _ => CacheState::Empty,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenreError {
    #[error("Failed to fetch genre list: {0}")]
    Api(#[from] ApiError),
    #[error("Genre list response has no genres")]
    MissingGenres,
}

/// Process-wide genre cache. Filled at most once; a failed fill leaves it
/// empty so the next `ensure` retries. Loaders are serialized so concurrent
/// callers wait for the in-flight fetch instead of issuing their own.
pub struct GenreCache {
    map: ArcSwap<GenreMap>,
    state: AtomicU8,
    load_lock: Mutex<()>,
}

impl Default for GenreCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GenreCache {
    pub fn new() -> Self {
        Self {
            map: ArcSwap::from_pointee(GenreMap::new()),
            state: AtomicU8::new(CacheState::Empty as u8),
            load_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> CacheState {
        CacheState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: CacheState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn snapshot(&self) -> Arc<GenreMap> {
        self.map.load_full()
    }

    pub async fn ensure(&self, api: &dyn CatalogApi) -> Result<(), GenreError> {
        if self.state() == CacheState::Populated {
            return Ok(());
        }

        let _guard = self.load_lock.lock().await;
        if self.state() == CacheState::Populated {
            debug!("Genre list loaded by another caller");
            return Ok(());
        }

        self.set_state(CacheState::Loading);
        let result = match api.genre_list().await {
            Ok(list) => list.genres.ok_or(GenreError::MissingGenres),
            Err(e) => Err(GenreError::Api(e)),
        };

        match result {
            Ok(genres) => {
                let map: GenreMap = genres.into_iter().collect();
                info!("Loaded {} genres", map.len());
                self.map.store(Arc::new(map));
                self.set_state(CacheState::Populated);
                Ok(())
            }
            Err(e) => {
                warn!("Genre cache not populated: {}", e);
                self.set_state(CacheState::Empty);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_genres() -> GenreMap {
    vec![
        Genre { id: 28, name: "Action".to_string() },
        Genre { id: 12, name: "Adventure".to_string() },
        Genre { id: 35, name: "Comedy".to_string() },
        Genre { id: 878, name: "Science Fiction".to_string() },
    ]
    .into_iter()
    .collect()
}
