use std::net::SocketAddr;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use account_recovery::auth::password;
use account_recovery::authorization::default_user_features;
use account_recovery::config::{Config, RecoveryConfig};
use account_recovery::db;
use account_recovery::models::{RecoveryToken, User};

pub const PASSWORD: &str = "old-password-123";

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Send a JSON request, optionally authenticated, and return (body, status).
    pub async fn send(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &Value,
        token: Option<&str>,
    ) -> (Value, StatusCode) {
        let mut req = self.client.request(method, self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.expect("request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn request_recovery(&self, body: &Value, token: Option<&str>) -> (Value, StatusCode) {
        self.send(reqwest::Method::POST, "/api/v1/recovery", body, token)
            .await
    }

    pub async fn reset_password(&self, body: &Value) -> (Value, StatusCode) {
        self.send(reqwest::Method::PATCH, "/api/v1/recovery", body, None)
            .await
    }

    pub async fn login(&self, email: &str, password: &str) -> (Value, StatusCode) {
        self.send(
            reqwest::Method::POST,
            "/api/v1/sessions",
            &json!({ "email": email, "password": password }),
            None,
        )
        .await
    }

    /// Login and return the session token.
    pub async fn session_token(&self, email: &str, password: &str) -> String {
        let (body, status) = self.login(email, password).await;
        assert_eq!(status, StatusCode::CREATED, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Insert a user directly, with default features unless given.
    pub async fn seed_user(&self, username: &str, email: &str, features: Option<&[&str]>) -> User {
        let pw_hash = password::hash(PASSWORD).unwrap();
        let features = match features {
            Some(f) => f.iter().map(|s| s.to_string()).collect(),
            None => default_user_features(),
        };
        db::users::create(&self.pool, username, email, &pw_hash, &features)
            .await
            .expect("seed user failed")
    }

    pub async fn tokens_for(&self, user_id: Uuid) -> Vec<RecoveryToken> {
        sqlx::query_as::<_, RecoveryToken>(
            "SELECT * FROM recovery_tokens WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .unwrap()
    }

    pub async fn token_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recovery_tokens")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }

    pub async fn insert_token(&self, user_id: Uuid, expires_at: DateTime<Utc>) -> RecoveryToken {
        db::recovery_tokens::create(&self.pool, user_id, expires_at)
            .await
            .unwrap()
    }
}

pub fn test_config(database_url: String) -> Config {
    Config {
        database_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        base_url: "http://localhost:0".to_string(),
        max_body_size: 65_536,
        recovery: RecoveryConfig::default(),
        session_ttl_hours: 1,
        log_level: "warn".to_string(),
        smtp: None,
    }
}

fn admin_url(base_url: &str) -> String {
    base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.to_string())
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let db_name = format!("recovery_test_{}", Uuid::now_v7().simple());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let (app, _state) = account_recovery::build_app(pool.clone(), test_config(test_url));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        client: Client::new(),
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url(&base_url))
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
