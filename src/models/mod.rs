pub mod task;
pub mod timestamp;
pub mod token;
pub mod user;

pub use task::{Task, TaskCreate, TaskQuery, TaskUpdate};
pub use token::{AuthTokens, RefreshRequest};
pub use user::{LoginData, RegisterData, User};
