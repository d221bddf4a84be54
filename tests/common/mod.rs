#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use stock_dashboard::{
    routes::app_router,
    utils::{
        config::Config,
        db,
        script_runner::{FetchError, RunnerConfig, ScriptExecutor, ScriptRequest, ScriptTimeouts},
        state::AppState,
        ttl_cache::TtlCache,
    },
};
use tower::ServiceExt;

type Responder = dyn Fn(&ScriptRequest) -> Result<Value, FetchError> + Send + Sync;

/// Records every request and answers from a closure.
pub struct FakeScripts {
    calls: Mutex<Vec<ScriptRequest>>,
    respond: Box<Responder>,
}

impl FakeScripts {
    pub fn new(
        respond: impl Fn(&ScriptRequest) -> Result<Value, FetchError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    pub fn calls(&self) -> Vec<ScriptRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ScriptExecutor for FakeScripts {
    async fn execute(&self, request: ScriptRequest) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(request.clone());
        (self.respond)(&request)
    }
}

pub fn test_config(listing: PathBuf) -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        database_url: "sqlite::memory:".to_string(),
        demo_user_email: "demo@example.com".to_string(),
        stock_listing_path: listing,
        quote_cache_ttl: Duration::from_secs(30),
        cache_sweep_interval: Duration::from_secs(300),
        runner: RunnerConfig {
            interpreter: "python3".into(),
            scripts_dir: "scripts".into(),
            timeouts: ScriptTimeouts::default(),
            extra_env: Vec::new(),
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

pub async fn spawn_app(scripts: Arc<FakeScripts>, listing: PathBuf) -> TestApp {
    spawn_app_with_config(scripts, test_config(listing)).await
}

pub async fn spawn_app_with_config(scripts: Arc<FakeScripts>, config: Config) -> TestApp {
    let db_pool = db::connect_in_memory().await.unwrap();
    db::migrate(&db_pool).await.unwrap();
    let demo_user_id = db::ensure_user(&db_pool, "demo@example.com").await.unwrap();

    let state = Arc::new(AppState {
        db_pool,
        config,
        scripts,
        quote_cache: Arc::new(TtlCache::new()),
        demo_user_id,
        started_at: Instant::now(),
    });
    TestApp {
        router: app_router(state.clone()),
        state,
    }
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }
}
