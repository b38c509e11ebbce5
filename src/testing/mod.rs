//! In-process stand-in for the hosted backend, used by tests.
//!
//! Emulates the subset of the data API (`/rest/v1/{table}`) and auth API
//! (`/auth/v1/token`, `/auth/v1/logout`) the site uses, and records every call
//! so tests can assert on what was sent.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::backend::Backend;
use crate::config::BackendConfig;

pub const ANON_KEY: &str = "test-anon-key";

/// One request received by the fake.
#[derive(Debug, Clone)]
pub struct Call {
    pub method: String,
    /// Table name for data calls, path for auth calls
    pub target: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

struct FakeUser {
    id: String,
    password: String,
    confirmed: bool,
}

#[derive(Default)]
struct FakeState {
    tables: HashMap<String, Vec<Value>>,
    users: HashMap<String, FakeUser>,
    tokens: HashMap<String, String>,
    refresh_tokens: HashMap<String, String>,
    calls: Vec<Call>,
    failures: HashMap<(String, String), (u16, String)>,
    delays: HashMap<(String, String), Duration>,
    next_id: u64,
    token_ttl: i64,
    rate_limited: bool,
    fail_logout: bool,
    refresh_denied: bool,
}

type Shared = Arc<Mutex<FakeState>>;

fn lock(state: &Shared) -> MutexGuard<'_, FakeState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Clone)]
pub struct FakeBackend {
    pub url: String,
    state: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(FakeState {
            token_ttl: 3600,
            ..Default::default()
        }));

        let app = Router::new()
            .route("/rest/v1/{table}", any(rest))
            .route("/auth/v1/token", post(token))
            .route("/auth/v1/logout", post(logout))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Failed to get addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    pub fn config(&self) -> BackendConfig {
        BackendConfig {
            url: self.url.clone(),
            anon_key: ANON_KEY.to_string(),
        }
    }

    pub fn backend(&self) -> Backend {
        Backend::new(&self.config()).expect("Failed to build backend client")
    }

    pub fn add_user(&self, email: &str, password: &str) {
        self.insert_user(email, password, true);
    }

    pub fn add_unconfirmed_user(&self, email: &str, password: &str) {
        self.insert_user(email, password, false);
    }

    fn insert_user(&self, email: &str, password: &str, confirmed: bool) {
        let mut state = lock(&self.state);
        let id = format!("user-{}", state.users.len() + 1);
        state.users.insert(
            email.to_string(),
            FakeUser {
                id,
                password: password.to_string(),
                confirmed,
            },
        );
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        lock(&self.state)
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        lock(&self.state)
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.state).calls.clone()
    }

    pub fn count(&self, method: &str, target: &str) -> usize {
        lock(&self.state)
            .calls
            .iter()
            .filter(|c| c.method == method && c.target == target)
            .count()
    }

    /// Answer every `method` call on `target` with an error until cleared.
    pub fn fail(&self, method: &str, target: &str, status: u16, message: &str) {
        lock(&self.state).failures.insert(
            (method.to_string(), target.to_string()),
            (status, message.to_string()),
        );
    }

    pub fn clear_failures(&self) {
        lock(&self.state).failures.clear();
    }

    /// Hold every `method` call on `target` for `delay` before answering.
    pub fn delay(&self, method: &str, target: &str, delay: Duration) {
        lock(&self.state)
            .delays
            .insert((method.to_string(), target.to_string()), delay);
    }

    pub fn set_token_ttl(&self, seconds: i64) {
        lock(&self.state).token_ttl = seconds;
    }

    pub fn set_rate_limited(&self, limited: bool) {
        lock(&self.state).rate_limited = limited;
    }

    pub fn fail_logout(&self, fail: bool) {
        lock(&self.state).fail_logout = fail;
    }

    pub fn set_refresh_allowed(&self, allowed: bool) {
        lock(&self.state).refresh_denied = !allowed;
    }
}

fn error(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn header_contains(headers: &HeaderMap, name: &str, needle: &str) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(needle))
}

fn matches(row: &Value, filters: &[(String, String)]) -> bool {
    filters.iter().all(|(column, expected)| match &row[column.as_str()] {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == *expected,
        Value::Bool(b) => b.to_string() == *expected,
        _ => false,
    })
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a.as_i64(), b.as_i64()) {
        (Some(x), Some(y)) => x.cmp(&y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

async fn rest(
    State(state): State<Shared>,
    method: Method,
    Path(table): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Option<Value> = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(e) => return error(400, json!({"code": "PGRST102", "message": e.to_string()})),
        }
    };

    let key = (method.to_string(), table.clone());
    let (delay, failure) = {
        let mut st = lock(&state);
        st.calls.push(Call {
            method: method.to_string(),
            target: table.clone(),
            query: params.clone(),
            body: body.clone(),
        });
        (st.delays.get(&key).copied(), st.failures.get(&key).cloned())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Some((status, message)) = failure {
        return error(status, json!({"code": "XX000", "message": message}));
    }

    let mut guard = lock(&state);
    let st = &mut *guard;

    let signed_in = bearer(&headers).is_some_and(|t| st.tokens.contains_key(t));
    if method != Method::GET && table != "contact_messages" && !signed_in {
        return error(
            401,
            json!({"code": "42501", "message": "new row violates row-level security policy"}),
        );
    }

    let filters: Vec<(String, String)> = params
        .iter()
        .filter(|(k, _)| k != "select" && k != "order")
        .filter_map(|(k, v)| v.strip_prefix("eq.").map(|v| (k.clone(), v.to_string())))
        .collect();
    let order = params
        .iter()
        .find(|(k, _)| k == "order")
        .map(|(_, v)| v.clone());
    let rows = st.tables.entry(table).or_default();

    match method {
        Method::GET => {
            let mut found: Vec<Value> = rows.iter().filter(|r| matches(r, &filters)).cloned().collect();
            if let Some(order) = order {
                let (column, direction) = order.split_once('.').unwrap_or((order.as_str(), "asc"));
                found.sort_by(|a, b| compare(&a[column], &b[column]));
                if direction == "desc" {
                    found.reverse();
                }
            }
            if header_contains(&headers, "accept", "vnd.pgrst.object") {
                if found.len() == 1 {
                    Json(found.remove(0)).into_response()
                } else {
                    error(
                        406,
                        json!({
                            "code": "PGRST116",
                            "details": format!("The result contains {} rows", found.len()),
                            "message": "JSON object requested, multiple (or no) rows returned"
                        }),
                    )
                }
            } else {
                Json(found).into_response()
            }
        }
        Method::POST => {
            let incoming = match body {
                Some(Value::Array(items)) => items,
                Some(item) => vec![item],
                None => return error(400, json!({"message": "Empty body"})),
            };
            let upsert = header_contains(&headers, "prefer", "resolution=merge-duplicates");
            let mut written = Vec::new();

            for mut row in incoming {
                let existing = row
                    .get("id")
                    .cloned()
                    .and_then(|id| rows.iter_mut().find(|r| r.get("id") == Some(&id)));
                match existing {
                    Some(existing) if upsert => {
                        merge(existing, &row);
                        written.push(existing.clone());
                    }
                    Some(_) => {
                        return error(
                            409,
                            json!({"code": "23505", "message": "duplicate key value violates unique constraint"}),
                        )
                    }
                    None => {
                        if row.get("id").is_none() {
                            st.next_id += 1;
                            row["id"] = json!(format!("row-{}", st.next_id));
                        }
                        if row.get("created_at").is_none() {
                            row["created_at"] = json!("2026-01-01T00:00:00Z");
                        }
                        rows.push(row.clone());
                        written.push(row);
                    }
                }
            }

            if header_contains(&headers, "prefer", "return=representation") {
                (StatusCode::CREATED, Json(written)).into_response()
            } else {
                StatusCode::CREATED.into_response()
            }
        }
        Method::PATCH => {
            let Some(patch) = body else {
                return error(400, json!({"message": "Empty body"}));
            };
            for row in rows.iter_mut().filter(|r| matches(r, &filters)) {
                merge(row, &patch);
            }
            StatusCode::NO_CONTENT.into_response()
        }
        Method::DELETE => {
            rows.retain(|r| !matches(r, &filters));
            StatusCode::NO_CONTENT.into_response()
        }
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

fn issue_tokens(st: &mut FakeState, email: &str, user_id: &str) -> Value {
    st.next_id += 1;
    let access = format!("access-{}", st.next_id);
    let refresh = format!("refresh-{}", st.next_id);
    st.tokens.insert(access.clone(), email.to_string());
    st.refresh_tokens.insert(refresh.clone(), email.to_string());

    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": st.token_ttl,
        "refresh_token": refresh,
        "user": { "id": user_id, "email": email, "aud": "authenticated" }
    })
}

async fn token(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let mut guard = lock(&state);
    let st = &mut *guard;
    st.calls.push(Call {
        method: "POST".to_string(),
        target: "/auth/v1/token".to_string(),
        query: query.clone().into_iter().collect(),
        body: Some(body.clone()),
    });

    match query.get("grant_type").map(String::as_str) {
        Some("password") => {
            if st.rate_limited {
                return error(
                    429,
                    json!({"code": 429, "error_code": "over_request_rate_limit", "msg": "Request rate limit reached"}),
                );
            }
            let email = body["email"].as_str().unwrap_or_default().to_string();
            let password = body["password"].as_str().unwrap_or_default();
            let (user_id, confirmed) = match st.users.get(&email) {
                Some(user) if user.password == password => (user.id.clone(), user.confirmed),
                _ => {
                    return error(
                        400,
                        json!({"code": 400, "error_code": "invalid_credentials", "msg": "Invalid login credentials"}),
                    )
                }
            };
            if !confirmed {
                return error(
                    400,
                    json!({"code": 400, "error_code": "email_not_confirmed", "msg": "Email not confirmed"}),
                );
            }
            Json(issue_tokens(st, &email, &user_id)).into_response()
        }
        Some("refresh_token") => {
            let presented = body["refresh_token"].as_str().unwrap_or_default();
            let email = match st.refresh_tokens.get(presented) {
                Some(email) if !st.refresh_denied => email.clone(),
                _ => {
                    return error(
                        400,
                        json!({"code": 400, "error_code": "refresh_token_not_found", "msg": "Invalid Refresh Token: Refresh Token Not Found"}),
                    )
                }
            };
            let user_id = st
                .users
                .get(&email)
                .map(|u| u.id.clone())
                .unwrap_or_default();
            Json(issue_tokens(st, &email, &user_id)).into_response()
        }
        _ => error(400, json!({"msg": "unsupported grant type"})),
    }
}

async fn logout(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut st = lock(&state);
    st.calls.push(Call {
        method: "POST".to_string(),
        target: "/auth/v1/logout".to_string(),
        query: Vec::new(),
        body: None,
    });
    if st.fail_logout {
        return error(500, json!({"msg": "Internal server error"}));
    }
    if let Some(token) = bearer(&headers) {
        st.tokens.remove(token);
    }
    StatusCode::NO_CONTENT.into_response()
}
