//! Data models
//!
//! Database entities and the request input types that map onto them.

mod user;

pub use user::{
    format_create_time, Credentials, InsertionResult, NewUser, User, CREATE_TIME_FORMAT,
};
