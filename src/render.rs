use askama::Template;

use crate::autocomplete::SearchBox;
use crate::genres::GenreMap;
use crate::tmdb::Movie;

/// Where card images come from.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    pub base_url: String,
    pub placeholder: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: "https://image.tmdb.org/t/p/original".to_string(),
            placeholder: "/assets/placeholder.svg".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub id: u64,
    pub title: String,
    pub image_url: String,
    pub genre: String,
    pub rating: String,
}

impl Card {
    pub fn from_movie(movie: &Movie, genres: &GenreMap, images: &ImageConfig) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            image_url: image_url(movie, images),
            genre: genre_label(movie, genres),
            rating: rating_label(movie.vote_average),
        }
    }
}

/// Content of the `main` container.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MainView {
    #[default]
    Empty,
    Loading,
    Cards(Vec<Card>),
    Message(String),
}

#[derive(Template)]
#[template(
    source = "{% if loading %}<p class=\"loading\">Loading...</p>{% endif %}\
{% match message %}{% when Some with (msg) %}<p class=\"message\">{{ msg }}</p>{% when None %}{% endmatch %}\
{% for card in cards %}<div class=\"card\" data-id=\"{{ card.id }}\" style=\"background-image: url('{{ card.image_url }}')\">\
<div class=\"info\"><span class=\"genre\">{{ card.genre }}</span><span class=\"rating\">{{ card.rating }}</span></div>\
<div class=\"title-foreground\"><h3>{{ card.title }}</h3></div></div>{% endfor %}",
    ext = "html"
)]
struct MainTemplate<'a> {
    loading: bool,
    message: Option<&'a str>,
    cards: &'a [Card],
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Movies</title>
<link rel="stylesheet" href="/assets/style.css">
<script src="/app.js" defer></script>
</head>
<body>
<form class="search-box" method="get" action="/">
<input id="ghost" type="text" value="{{ search.ghost }}" tabindex="-1" readonly>
<input id="search" name="q" type="text" value="{{ search.text }}" autocomplete="off" autofocus>
</form>
<main>{{ main|safe }}</main>
</body>
</html>"#,
    ext = "html"
)]
struct PageTemplate<'a> {
    search: &'a SearchBox,
    main: String,
}

impl MainView {
    pub fn cards(&self) -> &[Card] {
        match self {
            MainView::Cards(cards) => cards,
            _ => &[],
        }
    }

    /// Inner HTML of `main`.
    pub fn to_html(&self) -> Result<String, askama::Error> {
        let message = match self {
            MainView::Message(msg) => Some(msg.as_str()),
            _ => None,
        };
        MainTemplate {
            loading: matches!(self, MainView::Loading),
            message,
            cards: self.cards(),
        }
        .render()
    }
}

/// Replace everything in `view` with one card per movie, in order.
pub fn render(view: &mut MainView, movies: &[Movie], genres: &GenreMap, images: &ImageConfig) {
    *view = build(movies, genres, images);
}

pub fn build(movies: &[Movie], genres: &GenreMap, images: &ImageConfig) -> MainView {
    MainView::Cards(
        movies
            .iter()
            .map(|m| Card::from_movie(m, genres, images))
            .collect(),
    )
}

/// Image URLs end up inside a CSS `url('...')`, so every path segment is
/// percent-encoded.
pub fn image_url(movie: &Movie, images: &ImageConfig) -> String {
    match movie.image_path() {
        Some(path) => format!("{}{}", images.base_url, encode_path(path)),
        None => encode_path(&images.placeholder),
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|s| urlencoding::encode(s).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// One decimal, half away from zero, or "N/A".
pub fn rating_label(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(v) if v.is_finite() => format!("{:.1}", (v * 10.0).round() / 10.0),
        _ => "N/A".to_string(),
    }
}

/// Only the first genre id is shown.
pub fn genre_label(movie: &Movie, genres: &GenreMap) -> String {
    movie
        .first_genre()
        .and_then(|id| genres.name(id))
        .unwrap_or("Unknown")
        .to_string()
}

/// Full page with the search field, the ghost field and `main`.
pub fn render_page(search: &SearchBox, view: &MainView) -> Result<String, askama::Error> {
    PageTemplate {
        search,
        main: view.to_html()?,
    }
    .render()
}
