#![doc = "The `taskforge_client` library crate."]
#![doc = ""]
#![doc = "Client-side session handling for the TaskForge API: token persistence behind an"]
#![doc = "injected storage backend, an authenticated request gateway with typed errors,"]
#![doc = "the session controller driving login, registration, logout and bootstrap, and the"]
#![doc = "route guard that keeps protected views hidden until a user is confirmed."]

pub mod api;
pub mod config;
pub mod error;
pub mod guard;
pub mod models;
pub mod navigation;
pub mod session;
pub mod storage;
pub mod token_store;

pub use api::ApiGateway;
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError, ErrorKind};
pub use guard::{GuardDecision, Guarded, RouteGuard};
pub use session::{Session, SessionController, SessionStatus};
pub use token_store::{TokenPair, TokenStore};
