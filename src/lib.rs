//! Userbase - user registration and login over HTTP
//!
//! This library provides the routes, middleware, services and storage
//! behind the `userbase` binary.

pub mod api;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod services;
