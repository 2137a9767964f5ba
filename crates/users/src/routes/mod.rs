//! HTTP route handlers for the users service.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness check
//! GET    /health/ready         - Readiness check (pings the store)
//!
//! # Auth
//! POST   /auth                 - Log in, returns { token, user }
//!
//! # Clients
//! POST   /client               - Register a client
//! PUT    /client               - Update own profile (requires auth)
//! DELETE /client?pet_name=     - Drop a pet (requires auth)
//!
//! # Shops
//! POST   /shop                 - Register a shop
//! PUT    /shop                 - Update own profile (requires auth)
//! DELETE /shop?service_id=     - Drop a service (requires auth)
//! GET    /shops                - List all shops
//!
//! # Account
//! DELETE /account              - Delete own account (requires auth)
//!
//! # Files
//! GET    /pics/{reference}     - Download an uploaded picture
//! ```

pub mod account;
pub mod auth;
pub mod extract;
pub mod health;
pub mod shops;
pub mod users;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::middleware::{request_id_middleware, trace_layer};
use crate::state::AppState;

pub use extract::RequestFields;

/// Build the user routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/client",
            post(users::register_client)
                .put(users::update_client)
                .delete(users::remove_pet),
        )
        .route(
            "/shop",
            post(users::register_shop)
                .put(users::update_shop)
                .delete(users::remove_service),
        )
        .route("/shops", get(shops::list_shops))
        .route("/account", delete(account::delete_account))
}

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/auth", post(auth::login))
        .route("/pics/{reference}", get(shops::download_picture))
        .merge(user_routes())
}

/// Build the application with state, request ids and tracing applied.
///
/// Sentry layers are added by the binary.
pub fn app(state: AppState) -> Router {
    routes()
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::config::UsersConfig;
    use crate::db::MemoryStore;
    use crate::middleware::REQUEST_ID_HEADER;
    use crate::services::testing::{CNPJ, CPF};
    use crate::storage::MemoryFileStorage;

    const SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%hJ8";
    const FORM: &str = "application/x-www-form-urlencoded";

    fn test_app() -> Router {
        let vars: HashMap<String, String> = [
            ("USERS_STORE_BACKEND", "memory"),
            ("USERS_TOKEN_SECRET", SECRET),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let config = UsersConfig::from_map(&vars).unwrap();
        let state = AppState::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryFileStorage::new()),
        );
        app(state)
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn form(method: &str, uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, FORM);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn registration_body(username: &str, tax_field: &str, tax_id: &str) -> String {
        format!(
            "username={username}&password=x&name=Someone&email={username}%40example.com\
             &address=Rua+A&phone_number=5511999999999&{tax_field}={tax_id}"
        )
    }

    async fn register_and_login(app: &Router, kind: &str, username: &str) -> String {
        let (uri, field, tax_id) = match kind {
            "client" => ("/client", "cpf", CPF),
            _ => ("/shop", "cnpj", CNPJ),
        };
        let body = registration_body(username, field, tax_id);
        let response = send(app, form("POST", uri, &body, None)).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let login = format!("username={username}&password=x&type={kind}");
        let response = send(app, form("POST", "/auth", &login, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let response = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        let response = send(&app, Request::get("/health/ready").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_register_login_update_remove() {
        let app = test_app();
        let token = register_and_login(&app, "client", "ana").await;

        let pets = "pets=%7B%22name%22%3A%22Rex%22%7D&name=Ana";
        let response = send(&app, form("PUT", "/client", pets, Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let user = json_body(response).await;
        assert_eq!(user["name"], "Ana");
        assert_eq!(user["pets"][0]["name"], "Rex");
        assert!(user.get("password").is_none());

        let response = send(&app, form("DELETE", "/client?pet_name=Rex", "", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["pets"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = test_app();
        register_and_login(&app, "shop", "petz").await;
        let body = registration_body("petz", "cnpj", CNPJ);
        let response = send(&app, form("POST", "/shop", &body, None)).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_bad_credentials() {
        let app = test_app();
        let body = "username=nobody&password=x&type=client";
        let response = send(&app, form("POST", "/auth", body, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_requires_token() {
        let app = test_app();
        let response = send(&app, form("PUT", "/client", "name=Ana", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_client_cannot_update_shop() {
        let app = test_app();
        let token = register_and_login(&app, "client", "ana").await;
        let response = send(&app, form("PUT", "/shop", "hours=9-18", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_list_shops_and_delete_account() {
        let app = test_app();
        let response = send(&app, Request::get("/shops").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let token = register_and_login(&app, "shop", "petz").await;
        let response = send(&app, Request::get("/shops").body(Body::empty()).unwrap()).await;
        assert_eq!(response.status(), StatusCode::OK);
        let shops = json_body(response).await;
        assert_eq!(shops.as_array().map(Vec::len), Some(1));

        let response = send(&app, form("DELETE", "/account", "", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let response = send(&app, form("DELETE", "/account", "", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_missing_picture() {
        let app = test_app();
        let request = Request::get("/pics/nope.png").body(Body::empty()).unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
