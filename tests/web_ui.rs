use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use phrasebook::store::PhraseStore;
use phrasebook::web_ui::create_router;

fn app_with_store() -> (Router, Arc<PhraseStore>) {
    let store = Arc::new(PhraseStore::open_in_memory().unwrap());
    (create_router(store.clone()), store)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn index_page_renders_without_a_query() {
    let (app, store) = app_with_store();
    let (status, body) = get(&app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("name=\"q\""));
    assert_eq!(store.phrase_count().unwrap(), 0);
}

#[tokio::test]
async fn whitespace_only_query_renders_the_landing_page() {
    let (app, store) = app_with_store();
    let (status, body) = get(&app, "/?q=%20%20").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("name=\"q\""));
    assert_eq!(store.phrase_count().unwrap(), 0);
}

#[tokio::test]
async fn searching_creates_the_phrase() {
    let (app, store) = app_with_store();
    let (status, body) = get(&app, "/?q=test%20phrase").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("test phrase"));

    let phrase = store.find_by_text("test phrase").unwrap().unwrap();
    assert_eq!(phrase.search_count, 1);
}

#[tokio::test]
async fn phrases_can_be_created_alongside_existing_ones() {
    let (app, store) = app_with_store();
    let (_, body) = get(&app, "/?q=test%20phrase").await;
    assert!(body.contains("test phrase"));
    let (_, body) = get(&app, "/?q=another%20test%20phrase").await;
    assert!(body.contains("another test phrase"));
    assert_eq!(store.phrase_count().unwrap(), 2);
}

#[tokio::test]
async fn a_similar_search_increments_instead_of_creating() {
    let (app, store) = app_with_store();
    get(&app, "/?q=test%20phrase").await;
    assert_eq!(
        store.find_by_text("test phrase").unwrap().unwrap().search_count,
        1
    );

    // Different case and trailing whitespace, same phrase.
    get(&app, "/?q=Test%20phrase%20").await;
    let phrase = store.find_by_text("test phrase").unwrap().unwrap();
    assert_eq!(phrase.search_count, 2);
    assert_eq!(store.phrase_count().unwrap(), 1);
}

#[tokio::test]
async fn results_page_shows_the_updated_count() {
    let (app, _store) = app_with_store();
    get(&app, "/?q=test%20phrase").await;
    let (_, body) = get(&app, "/?q=test%20phrase").await;
    assert!(body.contains("Searched 2 times"));
}

#[tokio::test]
async fn recent_listing_shows_an_empty_state_message() {
    let (app, _store) = app_with_store();
    let (status, body) = get(&app, "/recent").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No searches have been done."));
}

#[tokio::test]
async fn popular_listing_shows_an_empty_state_message() {
    let (app, _store) = app_with_store();
    let (status, body) = get(&app, "/popular").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No searches have been done."));
}

#[tokio::test]
async fn recent_listing_orders_by_last_search_time() {
    let (app, _store) = app_with_store();
    get(&app, "/?q=test%20one").await;
    sleep(Duration::from_millis(2));
    get(&app, "/?q=test%20two").await;

    let (_, body) = get(&app, "/recent").await;
    assert!(body.find("test two").unwrap() < body.find("test one").unwrap());

    // Searching the first phrase again makes it the most recent.
    sleep(Duration::from_millis(2));
    get(&app, "/?q=test%20one").await;
    let (_, body) = get(&app, "/recent").await;
    assert!(body.find("test one").unwrap() < body.find("test two").unwrap());
}

#[tokio::test]
async fn popular_listing_orders_by_search_count() {
    let (app, _store) = app_with_store();
    get(&app, "/?q=test%20one").await;
    get(&app, "/?q=test%20two").await;

    let (_, body) = get(&app, "/popular").await;
    assert!(body.find("test one").unwrap() < body.find("test two").unwrap());

    // A second search for the second phrase makes it the more popular one.
    get(&app, "/?q=test%20two").await;
    let (_, body) = get(&app, "/popular").await;
    assert!(body.find("test two").unwrap() < body.find("test one").unwrap());
}

#[tokio::test]
async fn listing_links_are_percent_encoded() {
    let (app, _store) = app_with_store();
    get(&app, "/?q=punctuation%3A").await;

    let (_, recent) = get(&app, "/recent").await;
    assert!(recent.contains("/?q=punctuation%3A"));
    let (_, popular) = get(&app, "/popular").await;
    assert!(popular.contains("/?q=punctuation%3A"));
}

#[tokio::test]
async fn listings_are_bounded_to_ten_entries() {
    let (app, _store) = app_with_store();
    for i in 0..12 {
        get(&app, &format!("/?q=phrase%20{i}")).await;
    }
    let (_, recent) = get(&app, "/recent").await;
    assert_eq!(recent.matches("<li>").count(), 10);
    let (_, popular) = get(&app, "/popular").await;
    assert_eq!(popular.matches("<li>").count(), 10);
}
