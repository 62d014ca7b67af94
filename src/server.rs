use axum::{
    extract::{Query, Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::error;

use crate::autocomplete::{Key, KeyAction};
use crate::browser::{Browser, SearchOutcome};
use crate::config::Config;
use crate::render::{render_page, MainView};
use crate::tmdb::Genre;

/// Page script: live suggestions, Tab to accept, Enter to search.
const APP_JS: &str = include_str!("../assets/app.js");

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub browser: Arc<Browser>,
}

impl AppState {
    pub fn new(config: Config, browser: Arc<Browser>) -> Self {
        Self {
            config: Arc::new(config),
            browser,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/search", get(search_handler))
        .route("/api/suggest", get(suggest_handler))
        .route("/api/key", post(key_handler))
        .route("/api/genres", get(genres_handler));

    let mut router = Router::new()
        .route("/", get(page_handler))
        .route("/app.js", get(app_js_handler))
        .route("/robots.txt", get(robots_txt_handler))
        .merge(api_routes)
        .fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        router = router.nest_service("/assets", ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestResponse {
    pub ghost: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    pub key: Key,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeyResponse {
    pub text: String,
    pub ghost: String,
    pub action: KeyAction,
    /// Inner HTML of `main` when the key ran a search that was not superseded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
}

async fn page_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, StatusCode> {
    if let Some(q) = params.q {
        state.browser.search_for(&q).await;
    }

    let search_box = state.browser.search_box().await;
    let view = state.browser.view().await;
    let page = render_page(&search_box, &view).map_err(|e| {
        error!("Failed to render page: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Html(page))
}

async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, StatusCode> {
    let outcome = match params.q {
        Some(q) => state.browser.search_for(&q).await,
        None => state.browser.search().await,
    };

    match outcome {
        SearchOutcome::Rendered(view) => Ok(Html(main_html(&view)?).into_response()),
        SearchOutcome::Superseded => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

async fn suggest_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SuggestResponse> {
    let search_box = state.browser.input(params.q.as_deref().unwrap_or("")).await;
    Json(SuggestResponse {
        ghost: search_box.ghost,
    })
}

async fn key_handler(
    State(state): State<AppState>,
    Json(req): Json<KeyRequest>,
) -> Result<Json<KeyResponse>, StatusCode> {
    let (action, search_box, outcome) = state
        .browser
        .key_with_input(req.text.as_deref(), req.key)
        .await;

    let main = match outcome {
        Some(SearchOutcome::Rendered(view)) => Some(main_html(&view)?),
        _ => None,
    };

    Ok(Json(KeyResponse {
        text: search_box.text,
        ghost: search_box.ghost,
        action,
        main,
    }))
}

fn main_html(view: &MainView) -> Result<String, StatusCode> {
    view.to_html().map_err(|e| {
        error!("Failed to render results: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn app_js_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        APP_JS,
    )
}

async fn genres_handler(State(state): State<AppState>) -> Json<Vec<Genre>> {
    let controller = state.browser.controller();
    controller.ensure_genres().await;

    let genres = controller
        .genres()
        .snapshot()
        .iter()
        .map(|(id, name)| Genre {
            id,
            name: name.to_string(),
        })
        .collect();

    Json(genres)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request<axum::body::Body>) -> impl IntoResponse {
    // CORS preflight
    if req.method() == axum::http::Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genres::GenreCache;
    use crate::render::ImageConfig;
    use crate::search::SearchController;
    use crate::tmdb::fake::FakeApi;
    use crate::tmdb::{GENRE_LIST, POPULAR, SEARCH};
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request as HttpRequest};
    use serde_json::json;
    use tower::ServiceExt;

    fn app() -> (Arc<FakeApi>, Router) {
        let api = Arc::new(
            FakeApi::new()
                .respond(GENRE_LIST, json!({"genres": [{"id": 28, "name": "Action"}, {"id": 12, "name": "Adventure"}]}))
                .respond(POPULAR, json!({"results": [{"id": 1, "title": "Popular", "vote_average": 7.55, "genre_ids": [28]}]}))
                .respond(SEARCH, json!({"results": []})),
        );
        let controller = SearchController::new(api.clone(), Arc::new(GenreCache::new()), ImageConfig::default());
        let config: Config = serde_yaml::from_str("{}").unwrap();
        let state = AppState::new(config, Arc::new(Browser::new(controller)));
        (api, build_router(state))
    }

    async fn body_string(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_page_with_popular() {
        let (_, router) = app();
        let resp = router.oneshot(get("/?q=")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_string(resp).await;
        assert!(body.contains("<span class=\"genre\">Action</span><span class=\"rating\">7.6</span>"));
        assert!(body.contains("id=\"ghost\""));
    }

    #[tokio::test]
    async fn test_search_fragment_empty_results() {
        let (api, router) = app();
        let resp = router.oneshot(get("/api/search?q=Matrix")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, "");
        assert_eq!(api.count(SEARCH), 1);
    }

    #[tokio::test]
    async fn test_suggest() {
        let (_, router) = app();
        let resp = router.oneshot(get("/api/suggest?q=%3AAd")).await.unwrap();
        let body: SuggestResponse = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body.ghost, ":Adventure");
    }

    #[tokio::test]
    async fn test_key_tab() {
        let (_, router) = app();
        let req = HttpRequest::builder()
            .method(Method::POST)
            .uri("/api/key")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"key": "Tab", "text": ":Ac"}"#))
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        let body: KeyResponse = serde_json::from_str(&body_string(resp).await).unwrap();
        assert_eq!(body.text, ":Action");
        assert_eq!(body.ghost, "");
        assert_eq!(body.action, KeyAction::PreventDefault);
        assert!(body.main.is_none());
    }

    #[tokio::test]
    async fn test_genres_listing() {
        let (api, router) = app();
        let resp = router.oneshot(get("/api/genres")).await.unwrap();
        let genres: Vec<Genre> = serde_json::from_str(&body_string(resp).await).unwrap();
        let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Adventure", "Action"]);
        assert_eq!(api.count(GENRE_LIST), 1);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (_, router) = app();
        let resp = router.oneshot(get("/nope")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_app_js_served() {
        let (_, router) = app();
        let resp = router.oneshot(get("/app.js")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/javascript; charset=utf-8"
        );
        let body = body_string(resp).await;
        assert!(body.contains("/api/suggest"));
        assert!(body.contains("/api/key"));
    }

    #[tokio::test]
    async fn test_page_loads_script_and_keeps_ghost() {
        let (_, router) = app();
        let resp = router.clone().oneshot(get("/api/suggest?q=%3AAd")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = router.oneshot(get("/")).await.unwrap();
        let body = body_string(resp).await;
        assert!(body.contains("<script src=\"/app.js\" defer></script>"));
        assert!(body.contains("id=\"ghost\" type=\"text\" value=\":Adventure\""));
    }
}
