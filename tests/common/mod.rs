//! 测试公共模块
//! 基于内存存储构建完整路由，提供请求与数据准备辅助函数

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;
use wms_auth::{
    auth::PasswordHasher,
    config::{
        AppConfig, BootstrapConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig,
    },
    middleware::AppState,
    models::user::NewUser,
    repository::{MemoryStore, RoleStore, UserStore},
    routes,
};

pub const TEST_SECRET: &str = "test-secret-key-for-testing-only-min-32-chars";

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            graceful_shutdown_timeout_secs: 5,
        },
        database: DatabaseConfig {
            url: Secret::new("postgresql://unused".to_string()),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            jwt_secret: Secret::new(TEST_SECRET.to_string()),
            access_token_exp_hours: 24,
            refresh_token_exp_days: 28,
            password_min_length: 6,
        },
        bootstrap: BootstrapConfig::default(),
    }
}

/// 测试用低成本哈希参数
pub fn fast_hasher() -> PasswordHasher {
    PasswordHasher::with_params(1024, 1, 1).expect("valid test params")
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryStore>,
    pub router: Router,
}

/// 创建测试应用（预置标准角色）
pub fn create_test_app() -> TestApp {
    let store = Arc::new(MemoryStore::with_seeded_roles());
    let state = Arc::new(
        AppState::new(
            Arc::new(create_test_config()),
            store.clone(),
            store.clone(),
            None,
            fast_hasher(),
        )
        .expect("Failed to build app state"),
    );
    let router = routes::create_router(state.clone());

    TestApp {
        state,
        store,
        router,
    }
}

impl TestApp {
    /// 发送请求，返回状态码与 JSON 响应体
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// 直接在存储中创建用户并分配角色
    pub async fn create_user(&self, username: &str, password: &str, roles: &[&str]) -> Uuid {
        let password_hash = fast_hasher().hash(password).unwrap();
        let user = UserStore::create(
            self.store.as_ref(),
            NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                name: username.to_string(),
                password_hash,
                is_active: true,
            },
        )
        .await
        .unwrap();

        for role in roles {
            let role = RoleStore::find_by_name(self.store.as_ref(), role)
                .await
                .unwrap()
                .expect("seeded role");
            RoleStore::assign(self.store.as_ref(), user.id, role.id, None)
                .await
                .unwrap();
        }

        user.id
    }

    /// 登录并返回 (access_token, refresh_token)
    pub async fn login(&self, username: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        (
            body["data"]["access_token"].as_str().unwrap().to_string(),
            body["data"]["refresh_token"].as_str().unwrap().to_string(),
        )
    }

    /// 创建带角色的用户并登录，返回 (user_id, access_token)
    pub async fn user_with_token(&self, username: &str, roles: &[&str]) -> (Uuid, String) {
        let id = self.create_user(username, "pw123456", roles).await;
        let (access, _) = self.login(username, "pw123456").await;
        (id, access)
    }
}
