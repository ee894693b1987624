//! Typed access to the TaskForge REST API.
//!
//! `gateway` owns request construction and error normalisation; `auth` and `tasks` are
//! thin endpoint wrappers over it.

pub mod auth;
pub mod gateway;
pub mod tasks;

pub use gateway::{ApiGateway, RequestOptions};
