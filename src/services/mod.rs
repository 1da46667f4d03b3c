//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories:
//! - `user`: validation and login identity on top of the user repository
//! - `token`: session token signing and validation

pub mod token;
pub mod user;

pub use token::{Claims, TokenError, TokenService};
pub use user::{UserService, UserServiceError};
