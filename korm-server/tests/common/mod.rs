//! 集成测试公共工具
//!
//! 每个测试使用独立的临时数据库，通过 ServerState::initialize 完整初始化。

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use korm_server::db::repository::{admin, dish, kind};
use korm_server::routes::build_app;
use korm_server::{BackgroundTasks, Config, ServerState};
use serde_json::Value;
use shared::models::{DishCreate, DishKindCreate};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_USER: &str = "chef";
pub const ADMIN_PASS: &str = "kitchen-pass-123";

/// 运行中的测试服务 (工作者已启动)
pub struct TestServer {
    pub state: ServerState,
    pub app: Router,
    pub tasks: BackgroundTasks,
    _dir: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("korm.db");
        let config = Config::for_tests(db_path.to_string_lossy());

        let (state, worker) = ServerState::initialize(&config).await.unwrap();
        let mut tasks = BackgroundTasks::new();
        state.start_background_tasks(worker, &mut tasks);

        let app = build_app(&state).with_state(state.clone());
        Self {
            state,
            app,
            tasks,
            _dir: dir,
        }
    }

    /// 创建品类和菜品，返回菜品 id
    pub async fn seed_dish(&self, name: &str, quantity: i64) -> i64 {
        let kind = kind::create(
            &self.state.pool,
            DishKindCreate {
                repr: format!("{name} kind"),
                price: 250,
            },
        )
        .await
        .unwrap();
        dish::create(
            &self.state.pool,
            DishCreate {
                name: name.to_string(),
                description: String::new(),
                quantity,
                kind: kind.id,
            },
        )
        .await
        .unwrap()
        .id
    }

    /// 创建管理员并登录，返回 Bearer token
    pub async fn admin_token(&self) -> String {
        admin::create(&self.state.pool, ADMIN_USER, ADMIN_PASS, "Head Chef")
            .await
            .unwrap();
        let (status, body) = self
            .send(json_request(
                "POST",
                "/api/auth/login",
                None,
                serde_json::json!({"username": ADMIN_USER, "password": ADMIN_PASS}),
            ))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// 发送请求，返回状态码和 JSON (非 JSON 响应体包装为字符串)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, body)
    }

    pub async fn shutdown(self) {
        self.tasks.shutdown().await;
        self.state.pool.close().await;
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}
