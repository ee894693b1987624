//! Session lifecycle.
//!
//! `state` holds the session value shared with views; `controller` drives it through
//! bootstrap, login, registration, logout and token renewal.

pub mod controller;
pub mod state;

pub use controller::SessionController;
pub use state::{Activity, Session, SessionStatus};
