use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::{watch, Mutex, MutexGuard};
use validator::Validate;

use crate::api::{auth, ApiGateway};
use crate::error::ApiError;
use crate::models::{LoginData, RegisterData, User};
use crate::navigation::{Navigator, Routes};
use crate::session::state::{Activity, Session};
use crate::token_store::TokenStore;

/// Owns the session and every transition it goes through.
///
/// Views read the session through [`session`](Self::session) or a
/// [`subscribe`](Self::subscribe)d receiver; they never mutate it. Only the controller
/// writes to the token store in reaction to authentication outcomes.
///
/// Login and registration are not re-entrant: a call made while another one (or the
/// startup bootstrap) is in flight fails immediately with [`ApiError::in_progress`] and
/// leaves the session untouched.
pub struct SessionController {
    gateway: ApiGateway,
    tokens: TokenStore,
    navigator: Arc<dyn Navigator>,
    routes: Routes,
    state: watch::Sender<Session>,
    in_flight: Mutex<()>,
    bootstrapped: AtomicBool,
}

impl SessionController {
    /// Creates a controller without running the bootstrap.
    ///
    /// The session starts out bootstrapping when an access token is stored, anonymous
    /// otherwise. A controller built this way must be followed by a call to
    /// [`bootstrap`](Self::bootstrap): until then a stored token keeps the session
    /// loading and a [`RouteGuard`](crate::guard::RouteGuard) shows its loading state.
    /// [`start`](Self::start) does both.
    pub fn new(
        gateway: ApiGateway,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
        routes: Routes,
    ) -> Self {
        let initial = Session {
            activity: if tokens.has_access() {
                Activity::Bootstrapping
            } else {
                Activity::Idle
            },
            ..Session::default()
        };
        let (state, _) = watch::channel(initial);
        Self {
            gateway,
            tokens,
            navigator,
            routes,
            state,
            in_flight: Mutex::new(()),
            bootstrapped: AtomicBool::new(false),
        }
    }

    /// Creates a controller and restores the session from stored credentials.
    pub async fn start(
        gateway: ApiGateway,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
        routes: Routes,
    ) -> Self {
        let controller = Self::new(gateway, tokens, navigator, routes);
        controller.bootstrap().await;
        controller
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    fn update<F: FnOnce(&mut Session)>(&self, change: F) {
        self.state.send_modify(change);
    }

    fn begin(&self) -> Result<MutexGuard<'_, ()>, ApiError> {
        self.in_flight.try_lock().map_err(|_| {
            debug!("Rejecting overlapping authentication request");
            ApiError::in_progress()
        })
    }

    /// Restores the session from a stored access token.
    ///
    /// Runs once per controller; later calls return immediately. Any failure to fetch
    /// the identity means the stored token is unusable: it is cleared and the session
    /// ends up anonymous. Nothing is surfaced as an error.
    pub async fn bootstrap(&self) {
        if self.bootstrapped.swap(true, Ordering::SeqCst) {
            return;
        }
        let _guard = self.in_flight.lock().await;

        if !self.tokens.has_access() {
            debug!("No stored access token, starting anonymous");
            self.update(|s| s.activity = Activity::Idle);
            return;
        }

        self.update(|s| s.activity = Activity::Bootstrapping);
        match auth::current_user(&self.gateway).await {
            Ok(user) => {
                info!("Restored session for {}", user.username);
                self.update(|s| {
                    s.user = Some(user);
                    s.activity = Activity::Idle;
                });
            }
            Err(e) => {
                warn!("Failed to load user: {}", e);
                self.tokens.clear();
                self.update(|s| {
                    s.user = None;
                    s.activity = Activity::Idle;
                });
            }
        }
    }

    /// Logs in and loads the user.
    ///
    /// On success the token pair is stored, the user is set, and the navigator is sent to
    /// the post-login route. On failure the error message is recorded on the session,
    /// the previous user is kept, and the same error is returned.
    pub async fn login(&self, data: &LoginData) -> Result<User, ApiError> {
        let _guard = self.begin()?;
        self.start_attempt();
        let result = self.authenticate(data).await;
        self.finish_attempt(result)
    }

    /// Registers a new account, then logs in with the same credentials.
    ///
    /// A failure of the chained login is reported as the registration's failure.
    pub async fn register(&self, data: &RegisterData) -> Result<User, ApiError> {
        let _guard = self.begin()?;
        self.start_attempt();
        let result = self.create_account(data).await;
        self.finish_attempt(result)
    }

    /// Signs out locally: clears the stored tokens, drops the user and navigates to the
    /// public route. Never touches the network and cannot fail.
    pub fn logout(&self) {
        self.tokens.clear();
        self.update(|s| {
            s.user = None;
            s.error = None;
            s.activity = Activity::Idle;
        });
        info!("Logged out");
        self.navigator.push(&self.routes.public);
    }

    /// Exchanges the stored refresh token for a new access token and reloads the user.
    ///
    /// Without a refresh token, or when the server rejects it, the session is expired.
    /// Other failures (unreachable server, 5xx) leave the session as it was.
    pub async fn refresh(&self) -> Result<User, ApiError> {
        let refresh = match self.tokens.get_refresh() {
            Some(refresh) => refresh,
            None => {
                self.expire();
                return Err(ApiError::unauthenticated(
                    "Session expired, please log in again",
                ));
            }
        };

        match self.renew(&refresh).await {
            Ok(user) => {
                debug!("Access token refreshed for {}", user.username);
                self.update(|s| s.user = Some(user.clone()));
                Ok(user)
            }
            Err(e) => {
                self.observe_failure(&e);
                Err(e)
            }
        }
    }

    /// Runs an authenticated request, renewing the access token once if it is rejected.
    ///
    /// `op` receives a handle to the gateway and may be invoked twice. If the retry is
    /// rejected as well, the session is expired and the error returned.
    pub async fn authorized<T, F, Fut>(&self, op: F) -> Result<T, ApiError>
    where
        F: Fn(ApiGateway) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        match op(self.gateway.clone()).await {
            Err(e) if e.is_unauthorized() => {
                debug!("Request rejected with {:?}, refreshing access token", e.status);
                self.refresh().await?;
                let retried = op(self.gateway.clone()).await;
                if let Err(e) = &retried {
                    self.observe_failure(e);
                }
                retried
            }
            other => other,
        }
    }

    /// Reacts to an error observed on any request: an unauthorized response means the
    /// stored token is no longer accepted, so the session is expired. Anything else is
    /// ignored.
    pub fn observe_failure(&self, error: &ApiError) {
        if error.is_unauthorized() {
            warn!("Authentication failure observed: {}", error);
            self.expire();
        }
    }

    fn expire(&self) {
        self.tokens.clear();
        self.update(|s| {
            s.user = None;
            s.error = None;
        });
    }

    fn start_attempt(&self) {
        self.update(|s| {
            s.error = None;
            s.activity = Activity::Authenticating;
        });
    }

    fn finish_attempt(&self, result: Result<User, ApiError>) -> Result<User, ApiError> {
        match &result {
            Ok(_) => self.update(|s| s.activity = Activity::Idle),
            Err(e) => {
                debug!("Authentication attempt failed: {}", e);
                self.update(|s| {
                    s.error = Some(e.message.clone());
                    s.activity = Activity::Idle;
                });
            }
        }
        result
    }

    async fn authenticate(&self, data: &LoginData) -> Result<User, ApiError> {
        data.validate()?;
        let tokens = auth::login(&self.gateway, data).await?;
        self.tokens
            .store(&tokens.access_token, tokens.refresh_token.as_deref());

        let user = auth::current_user(&self.gateway).await?;
        info!("Logged in as {}", user.username);
        self.update(|s| s.user = Some(user.clone()));
        self.navigator.push(&self.routes.post_login);
        Ok(user)
    }

    async fn create_account(&self, data: &RegisterData) -> Result<User, ApiError> {
        data.validate()?;
        let created = auth::register(&self.gateway, data).await?;
        info!("Registered {}", created.username);
        self.authenticate(&data.credentials()).await
    }

    async fn renew(&self, refresh: &str) -> Result<User, ApiError> {
        let tokens = auth::refresh_token(&self.gateway, refresh).await?;
        self.tokens
            .store(&tokens.access_token, tokens.refresh_token.as_deref());
        auth::current_user(&self.gateway).await
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("base_url", &self.gateway.base_url())
            .field("session", &*self.state.borrow())
            .finish()
    }
}
