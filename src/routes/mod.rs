//! Route modules for the mark service

pub mod books;
pub mod health;
pub mod marks;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request, State},
    http::{header, request::Parts},
    middleware::{self, Next},
    response::Response,
    Json, Router,
};
use serde::de::DeserializeOwned;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .nest("/mark", marks::router())
        .nest("/book", books::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .merge(health::router())
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// JSON body extractor whose rejections use the service's error body
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(request: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state).await?;
        Ok(Self(value))
    }
}

/// Query string extractor, see [`AppJson`]
pub struct AppQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Reject requests without the configured bearer token
async fn require_token(State(state): State<AppState>, request: Request, next: Next) -> Result<Response> {
    if let Some(expected) = state.config().server.api_token.as_deref() {
        let provided = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        if provided != Some(expected) {
            tracing::warn!("Rejected unauthenticated {} {}", request.method(), request.uri().path());
            return Err(AppError::Unauthenticated);
        }
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::db::create_memory_pool;

    async fn test_app(token: Option<&str>) -> Router {
        let mut config = Config::default();
        config.server.api_token = token.map(str::to_string);
        let pool = create_memory_pool().await.unwrap();
        app(AppState::new(config, pool))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = axum::http::Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn new_mark() -> Value {
        json!({
            "bookId": "book-1",
            "epubcfi": "epubcfi(/6/4!/4/2,/1:0,/1:12)",
            "selectedString": "Call me Ishmael",
            "color": "red",
            "content": "",
            "type": "highlight",
            "title": "Loomings"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app(Some("secret")).await;

        let (status, body) = call(&app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn test_mark_lifecycle() {
        let app = test_app(None).await;

        let (status, body) = call(&app, Method::POST, "/api/mark/create", Some(new_mark())).await;
        assert_eq!(status, StatusCode::OK);
        let id = body["data"].as_str().unwrap().to_string();

        let (_, body) = call(&app, Method::GET, "/api/mark?bookId=book-1&type=highlight", None).await;
        let marks = body["data"].as_array().unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0]["id"], id.as_str());
        assert_eq!(marks[0]["color"], "red");
        assert_eq!(marks[0]["title"], "Loomings");

        let mut update = new_mark();
        update["id"] = json!(id);
        update["color"] = json!("blue-grey");
        update["content"] = json!("opening line");
        let (status, body) = call(&app, Method::POST, "/api/mark/update", Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], id.as_str());

        let (_, body) = call(&app, Method::GET, "/api/mark?bookId=book-1", None).await;
        assert_eq!(body["data"][0]["color"], "blue-grey");
        assert_eq!(body["data"][0]["content"], "opening line");

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/mark/destroy",
            Some(json!({ "id": id, "bookId": "book-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = call(&app, Method::GET, "/api/mark?bookId=book-1", None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_type_filter() {
        let app = test_app(None).await;
        call(&app, Method::POST, "/api/mark/create", Some(new_mark())).await;
        let mut bookmark = new_mark();
        bookmark["type"] = json!("bookmark");
        bookmark["color"] = json!("");
        bookmark["epubcfi"] = json!("epubcfi(/6/8)");
        call(&app, Method::POST, "/api/mark/create", Some(bookmark)).await;

        let (_, body) = call(&app, Method::GET, "/api/mark?bookId=book-1&type=bookmark", None).await;
        let marks = body["data"].as_array().unwrap();
        assert_eq!(marks.len(), 1);
        assert_eq!(marks[0]["type"], "bookmark");
        assert_eq!(marks[0]["color"], "");
    }

    #[tokio::test]
    async fn test_missing_mark_is_not_found() {
        let app = test_app(None).await;

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/mark/destroy",
            Some(json!({ "id": "nope", "bookId": "book-1" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_create_requires_book() {
        let app = test_app(None).await;
        let mut mark = new_mark();
        mark["bookId"] = json!("");

        let (status, body) = call(&app, Method::POST, "/api/mark/create", Some(mark)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_empty_cfi_rejected() {
        let app = test_app(None).await;
        let mut mark = new_mark();
        mark["epubcfi"] = json!("");

        let (status, body) = call(&app, Method::POST, "/api/mark/create", Some(mark)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_body() {
        let app = test_app(None).await;

        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/mark/create")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "bad_request");

        let (status, body) = call(&app, Method::GET, "/api/mark?bookId=book-1&type=scribble", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
    }

    #[tokio::test]
    async fn test_update_cannot_move_mark_to_other_book() {
        let app = test_app(None).await;
        let (_, body) = call(&app, Method::POST, "/api/mark/create", Some(new_mark())).await;
        let id = body["data"].as_str().unwrap().to_string();

        let mut update = new_mark();
        update["id"] = json!(id);
        update["bookId"] = json!("book-2");
        let (status, body) = call(&app, Method::POST, "/api/mark/update", Some(update)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        let (_, body) = call(&app, Method::GET, "/api/mark?bookId=book-1", None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_current_position() {
        let app = test_app(None).await;

        let (_, body) = call(&app, Method::GET, "/api/book/book-1", None).await;
        assert_eq!(body["data"], "");

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/book/book-1/update",
            Some(json!({ "current": "epubcfi(/6/10!/4/2/1:0)" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "epubcfi(/6/10!/4/2/1:0)");

        let (_, body) = call(&app, Method::GET, "/api/book/book-1", None).await;
        assert_eq!(body["data"], "epubcfi(/6/10!/4/2/1:0)");
    }

    #[tokio::test]
    async fn test_token_enforced() {
        let app = test_app(Some("secret")).await;

        let (status, body) = call(&app, Method::GET, "/api/mark?bookId=book-1", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthenticated");

        let request = axum::http::Request::builder()
            .uri("/api/mark?bookId=book-1")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let request = axum::http::Request::builder()
            .uri("/api/book/book-1")
            .header(header::AUTHORIZATION, "Bearer wrong")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
