use crate::models::User;

/// Asynchronous authentication work currently running on a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Activity {
    #[default]
    Idle,
    /// Restoring a session from stored credentials at startup.
    Bootstrapping,
    /// A login or registration request is in flight.
    Authenticating,
}

/// Externally visible phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Bootstrapping,
    Authenticating,
    Authenticated,
    /// The last operation failed; `user` is whatever it was before.
    Error,
}

/// The session shared with every view: who is signed in, whether an auth operation is
/// running, and the message of the last failed one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub error: Option<String>,
    pub activity: Activity,
}

impl Session {
    /// True exactly while bootstrap, login or registration is in flight.
    pub fn is_loading(&self) -> bool {
        self.activity != Activity::Idle
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        match self.activity {
            Activity::Bootstrapping => SessionStatus::Bootstrapping,
            Activity::Authenticating => SessionStatus::Authenticating,
            Activity::Idle if self.error.is_some() => SessionStatus::Error,
            Activity::Idle if self.user.is_some() => SessionStatus::Authenticated,
            Activity::Idle => SessionStatus::Anonymous,
        }
    }
}
