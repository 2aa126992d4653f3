use std::sync::Arc;

use askama::Template;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::{routing::get, Router};
use axum_macros::FromRef;
use log::{error, info};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::entities::Phrase;
use crate::error::PhrasebookError;
use crate::store::PhraseStore;
use crate::utils::normalize_phrase;

const LISTING_LIMIT: usize = 10;

pub async fn serve(config: Config, store: PhraseStore) -> anyhow::Result<()> {
    let phrase_count = store.phrase_count()?;
    info!("phrase count: {}", phrase_count);

    info!("initializing router...");
    let router = create_router(Arc::new(store));

    let listener = tokio::net::TcpListener::bind(&config.http.bind_addr).await?;
    info!("listening on {}", &config.http.bind_addr);
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn create_router(store: Arc<PhraseStore>) -> Router {
    let app_state = AppState { store };
    Router::new()
        .route("/", get(index))
        .route("/recent", get(recent))
        .route("/popular", get(popular))
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}

#[derive(Clone, FromRef)]
struct AppState {
    store: Arc<PhraseStore>,
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
    where
        T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template. Error: {}", err),
            ).into_response(),
        }
    }
}

/// Store failures surface as a generic 500; the details only go to the log.
struct AppError(PhrasebookError);

impl From<PhrasebookError> for AppError {
    fn from(err: PhrasebookError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        error!("request failed: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong".to_string()).into_response()
    }
}

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

/// A phrase prepared for rendering: formatted timestamp and a link query
/// string that is percent-encoded for characters unsafe in URLs.
struct PhraseListItem {
    text: String,
    search_count: i64,
    last_searched: String,
    encoded_query: String,
}

impl PhraseListItem {
    fn create(phrase: &Phrase) -> Self {
        Self {
            text: phrase.text.clone(),
            search_count: phrase.search_count,
            last_searched: phrase.last_searched.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            encoded_query: urlencoding::encode(&phrase.text).to_string(),
        }
    }
}

#[derive(Default, Template)]
#[template(path = "index.html")]
struct IndexTemplate {}

#[derive(Template)]
#[template(path = "results.html")]
struct ResultsTemplate {
    phrase: PhraseListItem,
}

#[derive(Template)]
#[template(path = "recent.html")]
struct RecentTemplate {
    searches: Vec<PhraseListItem>,
}

#[derive(Template)]
#[template(path = "popular.html")]
struct PopularTemplate {
    searches: Vec<PhraseListItem>,
}

/// Record one search: find-or-create the normalized phrase and, when it
/// already existed, bump its count. Returns the current record either way.
fn record_search(store: &PhraseStore, raw_text: &str) -> Result<Phrase, PhrasebookError> {
    let (phrase, created) = store.find_or_create(raw_text)?;
    if created {
        Ok(phrase)
    } else {
        store.increment(phrase.id)
    }
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Response, AppError> {
    let raw_query = query.q.unwrap_or_default();
    if normalize_phrase(&raw_query).is_empty() {
        return Ok(HtmlTemplate(IndexTemplate::default()).into_response());
    }
    let phrase = record_search(&state.store, &raw_query)?;
    let template = ResultsTemplate { phrase: PhraseListItem::create(&phrase) };
    Ok(HtmlTemplate(template).into_response())
}

async fn recent(State(state): State<AppState>) -> Result<Response, AppError> {
    let searches = state.store.list_recent(LISTING_LIMIT)?
        .iter()
        .map(PhraseListItem::create)
        .collect();
    Ok(HtmlTemplate(RecentTemplate { searches }).into_response())
}

async fn popular(State(state): State<AppState>) -> Result<Response, AppError> {
    let searches = state.store.list_popular(LISTING_LIMIT)?
        .iter()
        .map(PhraseListItem::create)
        .collect();
    Ok(HtmlTemplate(PopularTemplate { searches }).into_response())
}
