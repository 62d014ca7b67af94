use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
}

impl Movie {
    /// Backdrop if present, else the poster.
    pub fn image_path(&self) -> Option<&str> {
        self.backdrop_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.poster_path.as_deref().filter(|p| !p.is_empty()))
    }

    pub fn first_genre(&self) -> Option<u64> {
        self.genre_ids.first().copied()
    }
}

/// Response of the listing endpoints. `results` is optional because a
/// well-formed body without it is treated as a missing result set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieList {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub results: Option<Vec<Movie>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenreList {
    #[serde(default)]
    pub genres: Option<Vec<Genre>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_movie_list() {
        let body = r#"{
            "page": 1,
            "results": [
                {"id": 603, "title": "The Matrix", "backdrop_path": "/bd.jpg",
                 "poster_path": "/p.jpg", "vote_average": 8.2, "genre_ids": [28, 878]},
                {"id": 1, "title": "Bare"}
            ]
        }"#;
        let list: MovieList = serde_json::from_str(body).unwrap();
        let results = list.results.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].image_path(), Some("/bd.jpg"));
        assert_eq!(results[0].first_genre(), Some(28));
        assert_eq!(results[1].vote_average, None);
        assert!(results[1].genre_ids.is_empty());
        assert_eq!(results[1].image_path(), None);
    }

    #[test]
    fn test_null_fields() {
        let body = r#"{"id": 2, "title": "X", "backdrop_path": null, "poster_path": "/p.jpg", "vote_average": null}"#;
        let movie: Movie = serde_json::from_str(body).unwrap();
        assert_eq!(movie.image_path(), Some("/p.jpg"));
        assert_eq!(movie.vote_average, None);
    }

    #[test]
    fn test_missing_results() {
        let list: MovieList = serde_json::from_str(r#"{"status_message": "oops"}"#).unwrap();
        assert!(list.results.is_none());
    }
}
