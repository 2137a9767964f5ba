//! HTTP middleware for the users service.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. [`trace_layer`] (one span per request)
//! 3. [`request_id_middleware`] (tag the span, Sentry scope and response)
//!
//! Authentication is not a layer: handlers that need it take a
//! [`RequireAuth`] extractor.

pub mod auth;
pub mod request_id;

pub use auth::{AuthRejection, RequireAuth};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware, trace_layer};
