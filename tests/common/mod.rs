//! In-process stand-in for the TaskForge backend.
//!
//! Serves the `/api/v1` auth and task endpoints with the same request/response shapes
//! and error bodies as the real service, backed by in-memory state. Tokens are real
//! JWTs so expiry and tampering behave as they would against the service.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use actix_web::dev::ServerHandle;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use taskforge_client::navigation::{HistoryNavigator, Routes};
use taskforge_client::storage::MemoryStorage;
use taskforge_client::{ApiGateway, SessionController, TokenStore};

const JWT_SECRET: &str = "stub-backend-secret";

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    exp: usize,
    kind: String,
}

#[derive(Debug, Clone)]
pub struct StubUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password: String,
    pub is_active: bool,
}

impl StubUser {
    fn to_json(&self) -> Value {
        // Naive timestamps, as the service emits them.
        let now = Utc::now().naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        json!({
            "id": self.id,
            "email": self.email,
            "username": self.username,
            "is_active": self.is_active,
            "is_superuser": false,
            "created_at": now,
            "updated_at": now,
        })
    }
}

#[derive(Debug, Clone)]
struct StubTask {
    id: Uuid,
    title: String,
    description: Option<String>,
    is_completed: bool,
    owner_id: Uuid,
}

impl StubTask {
    fn to_json(&self) -> Value {
        let now = Utc::now().to_rfc3339();
        json!({
            "id": self.id,
            "title": self.title,
            "description": self.description,
            "is_completed": self.is_completed,
            "owner_id": self.owner_id,
            "created_at": now,
            "updated_at": now,
        })
    }
}

#[derive(Default)]
pub struct Backend {
    users: Mutex<HashMap<String, StubUser>>,
    tasks: Mutex<Vec<StubTask>>,
    hits: Mutex<HashMap<String, usize>>,
    failures: Mutex<HashMap<String, (u16, String)>>,
    requests: AtomicUsize,
}

impl Backend {
    fn record(&self, route: &str) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.hits.lock().unwrap().entry(route.to_string()).or_default() += 1;
    }

    /// Total number of requests served.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Number of requests served for a route label such as `"POST /auth/login"`.
    pub fn hits(&self, route: &str) -> usize {
        self.hits.lock().unwrap().get(route).copied().unwrap_or(0)
    }

    pub fn seed_user(&self, email: &str, username: &str, password: &str) -> StubUser {
        let user = StubUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            is_active: true,
        };
        self.users
            .lock()
            .unwrap()
            .insert(email.to_string(), user.clone());
        user
    }

    /// Makes every later request to `route` answer `status` with a plain-text `body`.
    pub fn fail_route(&self, route: &str, status: u16, body: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(route.to_string(), (status, body.to_string()));
    }

    fn injected_failure(&self, route: &str) -> Option<HttpResponse> {
        let failures = self.failures.lock().unwrap();
        let (status, body) = failures.get(route)?;
        let status = StatusCode::from_u16(*status).unwrap();
        Some(
            HttpResponse::build(status)
                .content_type("text/plain")
                .body(body.clone()),
        )
    }

    pub fn deactivate(&self, email: &str) {
        if let Some(user) = self.users.lock().unwrap().get_mut(email) {
            user.is_active = false;
        }
    }

    fn find_user(&self, id: &str) -> Option<StubUser> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.id.to_string() == id)
            .cloned()
    }

    fn authenticate(&self, req: &HttpRequest) -> Result<StubUser, HttpResponse> {
        let token = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        let claims = token
            .and_then(|token| verify(token, "access"))
            .ok_or_else(|| unauthorized("Could not validate credentials"))?;
        self.find_user(&claims.sub)
            .ok_or_else(|| unauthorized("Could not validate credentials"))
    }
}

pub fn mint_token(user_id: Uuid, kind: &str, ttl_secs: i64) -> String {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now().timestamp() + ttl_secs) as usize,
        kind: kind.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

/// An access token for `user_id` that expired an hour ago.
pub fn expired_access_token(user_id: Uuid) -> String {
    mint_token(user_id, "access", -3600)
}

fn verify(token: &str, kind: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(JWT_SECRET.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
    .filter(|claims| claims.kind == kind)
}

fn unauthorized(detail: &str) -> HttpResponse {
    HttpResponse::Unauthorized()
        .insert_header(("WWW-Authenticate", "Bearer"))
        .json(json!({ "detail": detail }))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "detail": "Task not found" }))
}

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RefreshBody {
    refresh_token: String,
}

#[derive(Deserialize)]
struct TaskListQuery {
    skip: Option<usize>,
    limit: Option<usize>,
    completed: Option<bool>,
}

#[derive(Deserialize)]
struct TaskBody {
    title: Option<String>,
    description: Option<String>,
    is_completed: Option<bool>,
}

async fn register(backend: web::Data<Backend>, body: web::Json<RegisterBody>) -> HttpResponse {
    backend.record("POST /auth/register");
    if body.password.len() < 8 {
        return HttpResponse::UnprocessableEntity().json(json!({
            "detail": [{
                "loc": ["body", "password"],
                "msg": "String should have at least 8 characters",
                "type": "string_too_short"
            }]
        }));
    }
    let mut users = backend.users.lock().unwrap();
    if users.contains_key(&body.email) {
        return HttpResponse::BadRequest().json(json!({ "detail": "Email already registered" }));
    }
    if users.values().any(|u| u.username == body.username) {
        return HttpResponse::BadRequest().json(json!({ "detail": "Username already taken" }));
    }
    let user = StubUser {
        id: Uuid::new_v4(),
        email: body.email.clone(),
        username: body.username.clone(),
        password: body.password.clone(),
        is_active: true,
    };
    users.insert(user.email.clone(), user.clone());
    HttpResponse::Created().json(user.to_json())
}

async fn login(backend: web::Data<Backend>, body: web::Json<LoginBody>) -> HttpResponse {
    backend.record("POST /auth/login");
    if let Some(resp) = backend.injected_failure("POST /auth/login") {
        return resp;
    }
    let user = backend.users.lock().unwrap().get(&body.email).cloned();
    match user {
        Some(user) if user.password == body.password => {
            if !user.is_active {
                return HttpResponse::BadRequest().json(json!({ "detail": "Inactive user" }));
            }
            HttpResponse::Ok().json(json!({
                "access_token": mint_token(user.id, "access", 900),
                "refresh_token": mint_token(user.id, "refresh", 86_400),
                "token_type": "bearer"
            }))
        }
        _ => unauthorized("Incorrect email or password"),
    }
}

async fn me(backend: web::Data<Backend>, req: HttpRequest) -> HttpResponse {
    backend.record("GET /auth/me");
    if let Some(resp) = backend.injected_failure("GET /auth/me") {
        return resp;
    }
    match backend.authenticate(&req) {
        Ok(user) => HttpResponse::Ok().json(user.to_json()),
        Err(resp) => resp,
    }
}

async fn refresh(backend: web::Data<Backend>, body: web::Json<RefreshBody>) -> HttpResponse {
    backend.record("POST /auth/refresh");
    let user = verify(&body.refresh_token, "refresh").and_then(|c| backend.find_user(&c.sub));
    match user {
        Some(user) if user.is_active => HttpResponse::Ok().json(json!({
            "access_token": mint_token(user.id, "access", 900),
            "token_type": "bearer"
        })),
        Some(_) => unauthorized("User not found or inactive"),
        None => unauthorized("Invalid refresh token"),
    }
}

async fn list_tasks(
    backend: web::Data<Backend>,
    req: HttpRequest,
    query: web::Query<TaskListQuery>,
) -> HttpResponse {
    backend.record("GET /tasks/");
    let user = match backend.authenticate(&req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let tasks: Vec<Value> = backend
        .tasks
        .lock()
        .unwrap()
        .iter()
        .filter(|t| t.owner_id == user.id)
        .filter(|t| query.completed.map_or(true, |c| t.is_completed == c))
        .skip(query.skip.unwrap_or(0))
        .take(query.limit.unwrap_or(100))
        .map(StubTask::to_json)
        .collect();
    HttpResponse::Ok().json(tasks)
}

async fn create_task(
    backend: web::Data<Backend>,
    req: HttpRequest,
    body: web::Json<TaskBody>,
) -> HttpResponse {
    backend.record("POST /tasks/");
    let user = match backend.authenticate(&req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let task = StubTask {
        id: Uuid::new_v4(),
        title: body.title.clone().unwrap_or_default(),
        description: body.description.clone(),
        is_completed: body.is_completed.unwrap_or(false),
        owner_id: user.id,
    };
    backend.tasks.lock().unwrap().push(task.clone());
    HttpResponse::Created().json(task.to_json())
}

async fn get_task(
    backend: web::Data<Backend>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HttpResponse {
    backend.record("GET /tasks/{id}");
    let user = match backend.authenticate(&req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let task_id = path.into_inner();
    let tasks = backend.tasks.lock().unwrap();
    match tasks.iter().find(|t| t.id == task_id && t.owner_id == user.id) {
        Some(task) => HttpResponse::Ok().json(task.to_json()),
        None => not_found(),
    }
}

async fn update_task(
    backend: web::Data<Backend>,
    req: HttpRequest,
    path: web::Path<Uuid>,
    body: web::Json<TaskBody>,
) -> HttpResponse {
    backend.record("PUT /tasks/{id}");
    let user = match backend.authenticate(&req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let task_id = path.into_inner();
    let mut tasks = backend.tasks.lock().unwrap();
    match tasks
        .iter_mut()
        .find(|t| t.id == task_id && t.owner_id == user.id)
    {
        Some(task) => {
            if let Some(title) = &body.title {
                task.title = title.clone();
            }
            if let Some(description) = &body.description {
                task.description = Some(description.clone());
            }
            if let Some(is_completed) = body.is_completed {
                task.is_completed = is_completed;
            }
            HttpResponse::Ok().json(task.to_json())
        }
        None => not_found(),
    }
}

async fn delete_task(
    backend: web::Data<Backend>,
    req: HttpRequest,
    path: web::Path<Uuid>,
) -> HttpResponse {
    backend.record("DELETE /tasks/{id}");
    let user = match backend.authenticate(&req) {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let task_id = path.into_inner();
    let mut tasks = backend.tasks.lock().unwrap();
    let before = tasks.len();
    tasks.retain(|t| !(t.id == task_id && t.owner_id == user.id));
    if tasks.len() == before {
        return not_found();
    }
    HttpResponse::NoContent().finish()
}

async fn broken(backend: web::Data<Backend>) -> HttpResponse {
    backend.record("GET /broken");
    HttpResponse::BadGateway()
        .content_type("text/plain")
        .body("upstream exploded")
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(me))
            .route("/refresh", web::post().to(refresh)),
    )
    .service(
        web::scope("/tasks")
            .route("/", web::get().to(list_tasks))
            .route("/", web::post().to(create_task))
            .route("/{id}", web::get().to(get_task))
            .route("/{id}", web::put().to(update_task))
            .route("/{id}", web::delete().to(delete_task)),
    )
    .route("/broken", web::get().to(broken));
}

pub struct TestServer {
    pub base_url: String,
    pub backend: web::Data<Backend>,
    handle: ServerHandle,
}

impl TestServer {
    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

/// Starts the stub backend on an ephemeral port.
pub async fn spawn_backend() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let backend = web::Data::new(Backend::default());
    let app_backend = backend.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_backend.clone())
            .service(web::scope("/api/v1").configure(routes))
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to listen on test port")
    .run();
    let handle = server.handle();
    actix_rt::spawn(server);

    TestServer {
        base_url: format!("http://127.0.0.1:{}/api/v1", port),
        backend,
        handle,
    }
}

/// Client-side wiring shared by the tests: an in-memory token store, a gateway pointed
/// at the stub backend, and a navigator that records where the session sent the user.
pub struct ClientHarness {
    pub tokens: TokenStore,
    pub gateway: ApiGateway,
    pub navigator: Arc<HistoryNavigator>,
}

impl ClientHarness {
    pub fn new(server: &TestServer) -> Self {
        let tokens = TokenStore::new(Arc::new(MemoryStorage::default()));
        let gateway =
            ApiGateway::with_client(reqwest::Client::new(), &server.base_url, tokens.clone());
        Self {
            tokens,
            gateway,
            navigator: Arc::new(HistoryNavigator::new()),
        }
    }

    pub fn controller(&self) -> SessionController {
        SessionController::new(
            self.gateway.clone(),
            self.tokens.clone(),
            self.navigator.clone(),
            Routes::default(),
        )
    }
}
