// tests/common/mod.rs

#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use exam_portal::{
    config::Config,
    models::user::{Role, User},
    repositories::{MemoryStore, UserRepository},
    routes,
    state::AppState,
    utils::jwt::sign_jwt,
};
use serde_json::{Value, json};
use url::Url;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test_secret_for_integration_tests";

/// Where the submission recorder reads exams from.
pub enum Directory {
    /// Over HTTP, through this app's own privileged read.
    SelfHttp,
    /// In-process, straight from the store.
    Local,
    /// Over HTTP, to a port nobody listens on.
    Unreachable,
}

pub struct TestApp {
    pub address: String,
    pub store: Arc<MemoryStore>,
    pub client: reqwest::Client,
    /// Id of the admin account seeded into the store.
    pub admin_id: Uuid,
}

fn test_config(exam_service_url: Option<Url>) -> Config {
    Config {
        database_url: None,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        exam_service_url,
        upstream_timeout: Duration::from_secs(2),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        rust_log: "error".to_string(),
        admin_email: None,
        admin_password: None,
    }
}

/// Spawns the app on a random port, backed by a fresh in-memory store.
pub async fn spawn_app(directory: Directory) -> TestApp {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let exam_service_url = match directory {
        Directory::SelfHttp => Some(Url::parse(&format!("{}/api/admin/exams", address)).unwrap()),
        Directory::Local => None,
        Directory::Unreachable => {
            let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let dead_port = dead.local_addr().unwrap().port();
            drop(dead);
            Some(Url::parse(&format!("http://127.0.0.1:{}/api/admin/exams", dead_port)).unwrap())
        }
    };

    let store = Arc::new(MemoryStore::new());
    let admin_id = Uuid::new_v4();
    store
        .insert_user(&User {
            id: admin_id,
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            password: "unused".to_string(),
            role: Role::Admin,
            created_at: Utc::now(),
        })
        .await
        .expect("Failed to seed admin");

    let state = AppState::new(test_config(exam_service_url), store.clone())
        .expect("Failed to build app state");
    let app = routes::create_router(state);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        store,
        client: reqwest::Client::new(),
        admin_id,
    }
}

pub fn token_for(subject: &str, role: Role) -> String {
    sign_jwt(subject, role, JWT_SECRET, 600).unwrap()
}

/// A student identity; returns (user id, token).
pub fn student() -> (Uuid, String) {
    let id = Uuid::new_v4();
    (id, token_for(&id.to_string(), Role::Student))
}

impl TestApp {
    /// Token of the seeded admin account.
    pub fn admin_token(&self) -> String {
        token_for(&self.admin_id.to_string(), Role::Admin)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Creates an exam through the admin API and returns its id.
    pub async fn create_exam(&self, title: &str) -> Uuid {
        let response = self
            .client
            .post(self.url("/api/admin/exams"))
            .bearer_auth(self.admin_token())
            .json(&json!({ "title": title, "duration_minutes": 30 }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Adds a question through the admin API and returns its id.
    pub async fn add_question(&self, exam_id: Uuid, options: &[&str], correct: Value, score: i32) -> Uuid {
        let response = self
            .client
            .post(self.url(&format!("/api/admin/exams/{}/questions", exam_id)))
            .bearer_auth(self.admin_token())
            .json(&json!({
                "text": "Which one?",
                "options": options,
                "correct_option": correct,
                "score": score,
            }))
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 201);

        let body: Value = response.json().await.unwrap();
        body["id"].as_str().unwrap().parse().unwrap()
    }

    /// Q1 worth 2 (correct "B"), Q2 worth 3 (correct "A").
    pub async fn two_question_exam(&self) -> (Uuid, Uuid, Uuid) {
        let exam_id = self.create_exam("Two questions").await;
        let q1 = self.add_question(exam_id, &["A", "B", "C", "D"], json!("B"), 2).await;
        let q2 = self.add_question(exam_id, &["A", "B", "C", "D"], json!("A"), 3).await;
        (exam_id, q1, q2)
    }

    pub async fn submit(&self, token: Option<&str>, exam_id: &str, body: &Value) -> reqwest::Response {
        let mut request = self
            .client
            .post(self.url(&format!("/api/submissions/{}", exam_id)))
            .json(body);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("Failed to execute request")
    }
}
