//! PetLife users service library.
//!
//! Accounts for pet owners (clients) and pet shops: registration, login,
//! profile updates with pet and service lists, and account deletion. The
//! binary in `main.rs` wires this library to a `MongoDB` store and an axum
//! server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod parser;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod token;
pub mod validation;
