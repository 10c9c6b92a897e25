//! Shared fixtures: an in-process mock scheduling backend and a console
//! context pointed at it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crewboard_console::config::ConsoleConfig;
use crewboard_console::context::AppContext;

/// One request received by the mock backend.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub path: &'static str,
    pub query: HashMap<String, String>,
    pub body: Option<Value>,
}

/// Mutable backend state. Tests seed it, then inspect what was received.
pub struct MockState {
    pub teams: Mutex<Vec<Value>>,
    pub resources: Mutex<Vec<Value>>,
    pub suggestions: Mutex<Vec<Value>>,
    pub projects: Mutex<Vec<Value>>,
    /// `Some(message)` makes `POST /team/allocate` answer `success: false`.
    pub reject_allocate: Mutex<Option<String>>,
    /// Answer `GET /team` with a 500.
    pub fail_teams: AtomicBool,
    /// Answer `GET /resource` with a 500.
    pub fail_resources: AtomicBool,
    pub requests: Mutex<Vec<Recorded>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            teams: Mutex::new(Vec::new()),
            resources: Mutex::new(Vec::new()),
            suggestions: Mutex::new(Vec::new()),
            projects: Mutex::new(Vec::new()),
            reject_allocate: Mutex::new(None),
            fail_teams: AtomicBool::new(false),
            fail_resources: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl MockState {
    pub fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    pub fn last(&self, path: &str) -> Option<Recorded> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.path == path)
            .cloned()
    }

    fn record(&self, path: &'static str, query: HashMap<String, String>, body: Option<Value>) {
        self.requests
            .lock()
            .unwrap()
            .push(Recorded { path, query, body });
    }
}

type Shared = State<Arc<MockState>>;

fn paged(rows: &[Value], query: &HashMap<String, String>) -> Value {
    let number: usize = query.get("pageNumber").and_then(|v| v.parse().ok()).unwrap_or(1);
    let size: usize = query.get("pageSize").and_then(|v| v.parse().ok()).unwrap_or(20);
    let start = (number.max(1) - 1) * size;
    let results: Vec<Value> = rows.iter().skip(start).take(size).cloned().collect();
    json!({ "totalItems": rows.len(), "results": results })
}

async fn list_teams(State(state): Shared, Query(query): Query<HashMap<String, String>>) -> Response {
    state.record("/team", query.clone(), None);
    if state.fail_teams.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "database down").into_response();
    }
    let teams = state.teams.lock().unwrap();
    let active: Vec<Value> = teams
        .iter()
        .filter(|t| t["active"].as_bool().unwrap_or(true))
        .filter(|t| match query.get("name") {
            Some(name) => t["name"]
                .as_str()
                .is_some_and(|n| n.to_lowercase().contains(&name.to_lowercase())),
            None => true,
        })
        .cloned()
        .collect();
    Json(paged(&active, &query)).into_response()
}

async fn save_team(State(state): Shared, Json(body): Json<Value>) -> Json<Value> {
    state.record("POST /team", HashMap::new(), Some(body.clone()));
    let mut teams = state.teams.lock().unwrap();
    let id = match body["id"].as_str() {
        Some(id) => {
            if let Some(existing) = teams.iter_mut().find(|t| t["id"] == id) {
                *existing = body.clone();
            }
            id.to_string()
        }
        None => {
            let id = format!("T{}", teams.len() + 100);
            let mut team = body.clone();
            team["id"] = json!(id);
            teams.push(team);
            id
        }
    };
    Json(json!({ "success": true, "id": id }))
}

async fn deactivate_team(State(state): Shared, Json(body): Json<Value>) -> Json<Value> {
    state.record("/team/deactivate", HashMap::new(), Some(body.clone()));
    let mut teams = state.teams.lock().unwrap();
    for team in teams.iter_mut().filter(|t| t["id"] == body["id"]) {
        team["active"] = json!(false);
    }
    Json(json!({ "success": true, "id": body["id"] }))
}

async fn allocate(State(state): Shared, Json(body): Json<Value>) -> Json<Value> {
    state.record("/team/allocate", HashMap::new(), Some(body.clone()));
    if let Some(message) = state.reject_allocate.lock().unwrap().clone() {
        return Json(json!({ "success": false, "message": message }));
    }
    let id = apply_allocation(&mut state.teams.lock().unwrap(), &body);
    Json(json!({ "success": true, "id": id }))
}

/// Create or update the allocation described by an allocate request body.
fn apply_allocation(teams: &mut [Value], body: &Value) -> Value {
    let mut allocation = json!({
        "resourceId": body["resourceId"],
        "resourceName": body["resourceId"],
        "startDate": body["startDate"],
        "endDate": body["endDate"],
        "startTime": body["startTime"],
        "endTime": body["endTime"],
        "isTeamLeader": body["isTeamLeader"],
    });
    for team in teams.iter_mut().filter(|t| t["id"] == body["teamId"]) {
        let Some(requirements) = team["requirements"].as_array_mut() else {
            continue;
        };
        for req in requirements.iter_mut().filter(|r| r["id"] == body["requirementId"]) {
            if req["allocations"].is_null() {
                req["allocations"] = json!([]);
            }
            let Some(allocations) = req["allocations"].as_array_mut() else {
                continue;
            };
            if body["id"].is_string() {
                allocation["id"] = body["id"].clone();
                if let Some(existing) = allocations.iter_mut().find(|a| a["id"] == body["id"]) {
                    *existing = allocation.clone();
                }
            } else {
                allocation["id"] = json!(format!("NEW{}", allocations.len() + 1));
                allocations.push(allocation.clone());
            }
            return allocation["id"].clone();
        }
    }
    Value::Null
}

async fn list_resources(State(state): Shared, Query(query): Query<HashMap<String, String>>) -> Response {
    state.record("/resource", query, None);
    if state.fail_resources.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "search index down").into_response();
    }
    let resources = state.resources.lock().unwrap().clone();
    Json(json!({ "results": resources })).into_response()
}

async fn suggestions(State(state): Shared, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    state.record("/teamResource/suggestion", query, None);
    Json(Value::Array(state.suggestions.lock().unwrap().clone()))
}

async fn generic_query(State(state): Shared, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    state.record("/genericQuery", query.clone(), None);
    let name = query.get("name").cloned().unwrap_or_default();
    let kind = query.get("sObjectType").cloned().unwrap_or_default();
    Json(json!({ "results": [{ "id": format!("{kind}-1"), "name": format!("{kind} {name}") }] }))
}

async fn list_projects(State(state): Shared, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    state.record("/project", query.clone(), None);
    let projects = state.projects.lock().unwrap();
    let matching: Vec<Value> = match query.get("name") {
        Some(name) => projects
            .iter()
            .filter(|p| {
                p["name"]
                    .as_str()
                    .is_some_and(|n| n.to_lowercase().contains(&name.to_lowercase()))
            })
            .cloned()
            .collect(),
        None => projects.clone(),
    };
    Json(paged(&matching, &query))
}

async fn list_jobs(State(state): Shared, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    state.record("/job", query.clone(), None);
    Json(paged(&[], &query))
}

async fn config(State(state): Shared) -> Json<Value> {
    state.record("/config", HashMap::new(), None);
    Json(json!({
        "features": { "teamLeader": true },
        "picklists": { "jobStatus": [{ "value": "open", "label": "Open" }] }
    }))
}

/// Serve the mock backend on an ephemeral port and return its base URL.
pub async fn spawn_backend(state: Arc<MockState>) -> String {
    let app = Router::new()
        .route("/team", get(list_teams).post(save_team))
        .route("/team/deactivate", post(deactivate_team))
        .route("/team/allocate", post(allocate))
        .route("/teamResource/suggestion", get(suggestions))
        .route("/resource", get(list_resources))
        .route("/genericQuery", get(generic_query))
        .route("/project", get(list_projects))
        .route("/job", get(list_jobs))
        .route("/config", get(config))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Test configuration: 1750px viewport (200px columns for a 7-day week),
/// short debounce.
pub fn test_config(backend_url: String) -> ConsoleConfig {
    ConsoleConfig {
        backend_url,
        search_debounce: Duration::from_millis(30),
        viewport_width: 1750.0,
        ..ConsoleConfig::default()
    }
}

/// Mock backend plus a connected context.
pub async fn setup(state: MockState) -> (Arc<MockState>, AppContext) {
    let state = Arc::new(state);
    let url = spawn_backend(Arc::clone(&state)).await;
    let ctx = AppContext::connect(test_config(url)).await;
    (state, ctx)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn team_json(id: &str, name: &str, allocations: Value) -> Value {
    json!({
        "id": id,
        "name": name,
        "regionId": "R1",
        "regionName": "North",
        "requirements": [{
            "id": format!("{id}-REQ1"),
            "name": "Electrician",
            "requiredTags": [{ "id": "ELEC", "name": "Electrician" }],
            "preferredResourceId": "RES-PREF",
            "allocations": allocations
        }]
    })
}

pub fn allocation_json(id: &str, resource_id: &str, start: &str, end: &str) -> Value {
    json!({
        "id": id,
        "resourceId": resource_id,
        "resourceName": format!("Name {resource_id}"),
        "startDate": start,
        "endDate": end,
        "startTime": 800,
        "endTime": 1700
    })
}

pub fn resource_json(id: &str, tags: &[&str]) -> Value {
    let tags: Vec<Value> = tags.iter().map(|t| json!({ "id": t })).collect();
    json!({ "id": id, "name": format!("Name {id}"), "tags": tags })
}
