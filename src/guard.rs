//! Route guard for protected views.
//!
//! A protected view is only rendered once the session controller has confirmed a user.
//! While the session is still loading with nobody signed in, the guard reports
//! `Loading` and neither renders nor redirects. Once loading is over without a user,
//! it redirects to the public entry point.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;
use tokio::sync::watch;

use crate::models::User;
use crate::navigation::Navigator;
use crate::session::Session;

/// What a guarded view should do for a given session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Authentication is still being resolved; show a loading indicator.
    Loading,
    /// A user is signed in; render the protected content.
    Render,
    /// Nobody is signed in; leave for the given route.
    Redirect(String),
}

/// Output of a guarded render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Loading,
    Content(T),
    Redirecting,
}

impl<T> Guarded<T> {
    pub fn content(self) -> Option<T> {
        match self {
            Guarded::Content(content) => Some(content),
            _ => None,
        }
    }
}

pub struct RouteGuard {
    navigator: Arc<dyn Navigator>,
    redirect_to: String,
    redirected: AtomicBool,
}

impl RouteGuard {
    pub fn new(navigator: Arc<dyn Navigator>, redirect_to: impl Into<String>) -> Self {
        Self {
            navigator,
            redirect_to: redirect_to.into(),
            redirected: AtomicBool::new(false),
        }
    }

    pub fn decide(&self, session: &Session) -> GuardDecision {
        if session.user.is_some() {
            GuardDecision::Render
        } else if session.is_loading() {
            GuardDecision::Loading
        } else {
            GuardDecision::Redirect(self.redirect_to.clone())
        }
    }

    /// Renders `view` for the signed-in user, or reports why it was not rendered.
    ///
    /// `view` is never called unless a user is present. A redirect is pushed to the
    /// navigator once per stretch of anonymous renders: repeated renders while
    /// redirecting do not push again, but any render that loads or shows content re-arms
    /// the guard, so a later loss of the user redirects again.
    pub fn render<T, F>(&self, session: &Session, view: F) -> Guarded<T>
    where
        F: FnOnce(&User) -> T,
    {
        match (self.decide(session), session.user.as_ref()) {
            (GuardDecision::Render, Some(user)) => {
                self.redirected.store(false, Ordering::SeqCst);
                Guarded::Content(view(user))
            }
            (GuardDecision::Redirect(route), _) => {
                if !self.redirected.swap(true, Ordering::SeqCst) {
                    debug!("No authenticated user, redirecting to {}", route);
                    self.navigator.push(&route);
                }
                Guarded::Redirecting
            }
            _ => {
                self.redirected.store(false, Ordering::SeqCst);
                Guarded::Loading
            }
        }
    }

    /// Waits until the session has settled (a user is present or nothing is loading)
    /// and returns the resulting decision, performing the redirect if there is one.
    pub async fn resolve(&self, session: &mut watch::Receiver<Session>) -> GuardDecision {
        if session
            .wait_for(|s| s.user.is_some() || !s.is_loading())
            .await
            .is_err()
        {
            debug!("Session controller dropped while resolving guard");
        }
        let settled = session.borrow().clone();
        // Goes through render so the redirect is pushed at most once.
        self.render(&settled, |_| ());
        self.decide(&settled)
    }
}
