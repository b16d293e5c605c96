use crate::handlers::{self, books};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new().route(
        "/books",
        post(books::enrich_books).get(books::list_books),
    );

    Router::new()
        .nest("/v1", api_routes)
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryRateCache;
    use crate::catalog::CatalogApi;
    use crate::error::LookupError;
    use crate::pipeline::Pipeline;
    use crate::rates::RateApi;
    use async_trait::async_trait;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use chrono::{NaiveDate, Utc};
    use persistence::{BookStore, MemoryStore};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use types::catalog::CatalogMatch;
    use types::rate::{RateQuote, RateQuoteKey};
    use types::record::BookDraft;

    struct FixedCatalog;

    #[async_trait]
    impl CatalogApi for FixedCatalog {
        async fn search(&self, _term: &str) -> Result<CatalogMatch, LookupError> {
            Ok(CatalogMatch {
                artist_name: "Frank Herbert".to_string(),
                track_name: "Dune".to_string(),
                currency: "USD".to_string(),
                price: 9.99,
                release_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            })
        }
    }

    struct FixedRates;

    #[async_trait]
    impl RateApi for FixedRates {
        fn lookup_url(&self, key: &RateQuoteKey) -> String {
            key.lookup_url("http://rates.test/A")
        }

        async fn fetch(&self, _key: &RateQuoteKey) -> Result<RateQuote, LookupError> {
            Ok(RateQuote::new(4.0, "001/A/NBP/2024"))
        }
    }

    fn app(store: Arc<MemoryStore>) -> Router {
        let pipeline = Pipeline::new(
            Arc::new(FixedCatalog),
            Arc::new(FixedRates),
            Arc::new(MemoryRateCache::new()),
            Duration::from_secs(60),
            store,
        );
        create_router(AppState::new(pipeline))
    }

    fn post_books(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/v1/books")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let res = app(Arc::new(MemoryStore::new()))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, json!("ok"));
    }

    #[tokio::test]
    async fn test_post_books() {
        let res = app(Arc::new(MemoryStore::new()))
            .oneshot(post_books(r#"[["Dune","Herbert"]]"#))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body[0]["title"], "Dune");
        assert_eq!(body[0]["fromNBP"]["pricePLN"], 39.96);
    }

    #[tokio::test]
    async fn test_empty_array() {
        let store = Arc::new(MemoryStore::new());
        let res = app(store.clone()).oneshot(post_books("[]")).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, json!([]));
        assert!(store.list_authors().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_row_message() {
        let res = app(Arc::new(MemoryStore::new()))
            .oneshot(post_books(r#"[["Dune"]]"#))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json_body(res).await,
            json!(r#"Error for row: "["Dune"]". Please fill data."#)
        );
    }

    #[tokio::test]
    async fn test_body_must_be_array() {
        for body in [r#"{"rows":[]}"#, "not json"] {
            let res = app(Arc::new(MemoryStore::new()))
                .oneshot(post_books(body))
                .await
                .unwrap();
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            assert!(json_body(res).await.is_string());
        }
    }

    #[tokio::test]
    async fn test_list_books_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let author = store.get_or_create_author("Frank Herbert").unwrap();
        let now = Utc::now();
        let draft = |title: &str, age: i64| BookDraft {
            author_id: author.id,
            title: title.to_string(),
            currency: "USD".to_string(),
            price: 9.99,
            publish_date: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            query_date: now - chrono::Duration::minutes(age),
            rate: 4.0,
            table_no: "001/A/NBP/2024".to_string(),
        };
        store.bulk_insert(vec![draft("Older", 10)]).unwrap();
        store.bulk_insert(vec![draft("Newer", 1)]).unwrap();

        let res = app(store)
            .oneshot(Request::get("/v1/books").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;
        assert_eq!(body[0]["title"], "Newer");
        assert_eq!(body[1]["title"], "Older");
        assert_eq!(body[0]["author"]["fullName"], "Frank Herbert");
    }
}
