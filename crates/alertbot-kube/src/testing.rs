//! In-process fake of the Kubernetes API subset the crate uses.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use k8s_openapi::ByteString;
use kube::{Client, Config};
use parking_lot::Mutex;
use serde_json::{Value, json};

#[derive(Default)]
struct FakeState {
    secrets: Mutex<HashMap<(String, String), (u64, serde_json::Map<String, Value>)>>,
    lists: Mutex<HashMap<String, Value>>,
}

pub(crate) struct FakeApi {
    addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeApi {
    pub(crate) async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let app = Router::new()
            .route(
                "/api/v1/namespaces/{ns}/secrets/{name}",
                get(get_secret).patch(patch_secret),
            )
            .fallback(get_list)
            .with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state }
    }

    pub(crate) fn client(&self) -> Client {
        let url = format!("http://{}", self.addr).parse().unwrap();
        Client::try_from(Config::new(url)).unwrap()
    }

    pub(crate) fn put_secret(&self, ns: &str, name: &str, key: &str, text: &str) {
        let mut data = serde_json::Map::new();
        data.insert(key.to_string(), json!(ByteString(text.as_bytes().to_vec())));
        self.state
            .secrets
            .lock()
            .insert((ns.to_string(), name.to_string()), (1, data));
    }

    pub(crate) fn secret_text(&self, ns: &str, name: &str) -> Option<String> {
        let secrets = self.state.secrets.lock();
        let (_, data) = secrets.get(&(ns.to_string(), name.to_string()))?;
        let ByteString(bytes) = serde_json::from_value(data.get("alertmanager.yaml")?.clone()).ok()?;
        String::from_utf8(bytes).ok()
    }

    pub(crate) fn put_list(&self, path: &str, list: Value) {
        self.state.lists.lock().insert(path.to_string(), list);
    }
}

fn status(code: StatusCode, reason: &str, message: &str) -> Response {
    let body = json!({
        "apiVersion": "v1",
        "kind": "Status",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code.as_u16(),
    });
    (code, Json(body)).into_response()
}

fn secret_json(ns: &str, name: &str, revision: u64, data: &serde_json::Map<String, Value>) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": { "name": name, "namespace": ns, "resourceVersion": revision.to_string() },
        "data": data,
    })
}

async fn get_secret(
    State(state): State<Arc<FakeState>>,
    Path((ns, name)): Path<(String, String)>,
) -> Response {
    let secrets = state.secrets.lock();
    match secrets.get(&(ns.clone(), name.clone())) {
        Some((revision, data)) => Json(secret_json(&ns, &name, *revision, data)).into_response(),
        None => status(StatusCode::NOT_FOUND, "NotFound", &format!("secrets \"{name}\" not found")),
    }
}

async fn patch_secret(
    State(state): State<Arc<FakeState>>,
    Path((ns, name)): Path<(String, String)>,
    headers: HeaderMap,
    body: String,
) -> Response {
    if headers.get("content-type").and_then(|v| v.to_str().ok())
        != Some("application/merge-patch+json")
    {
        return status(StatusCode::UNSUPPORTED_MEDIA_TYPE, "UnsupportedMediaType", "bad content type");
    }
    let Ok(patch) = serde_json::from_str::<Value>(&body) else {
        return status(StatusCode::BAD_REQUEST, "BadRequest", "bad patch");
    };

    let mut secrets = state.secrets.lock();
    let Some((revision, data)) = secrets.get_mut(&(ns.clone(), name.clone())) else {
        return status(StatusCode::NOT_FOUND, "NotFound", &format!("secrets \"{name}\" not found"));
    };

    if let Some(expected) = patch.pointer("/metadata/resourceVersion").and_then(Value::as_str) {
        if expected != revision.to_string() {
            return status(
                StatusCode::CONFLICT,
                "Conflict",
                "the object has been modified; please apply your changes to the latest version",
            );
        }
    }

    if let Some(fields) = patch.get("data").and_then(Value::as_object) {
        for (key, value) in fields {
            data.insert(key.clone(), value.clone());
        }
    }
    *revision += 1;
    Json(secret_json(&ns, &name, *revision, data)).into_response()
}

async fn get_list(State(state): State<Arc<FakeState>>, uri: Uri) -> Response {
    match state.lists.lock().get(uri.path()) {
        Some(list) => Json(list.clone()).into_response(),
        None => status(
            StatusCode::NOT_FOUND,
            "NotFound",
            "the server could not find the requested resource",
        ),
    }
}
