// tests/api_tests.rs

mod common;

use common::{Directory, spawn_app, student, token_for};
use exam_portal::{models::user::Role, services::exam_directory::SERVICE_SUBJECT};
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn unknown_route_is_404() {
    // Arrange
    let app = spawn_app(Directory::Local).await;

    // Act
    let response = app
        .client
        .get(app.url("/random_path_that_does_not_exist"))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "404 | Route not found");
    assert_eq!(body["path"], "/random_path_that_does_not_exist");
    assert_eq!(body["method"], "GET");
}

#[tokio::test]
async fn health_and_banner() {
    let app = spawn_app(Directory::Local).await;

    let response = app.client.get(app.url("/health")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "exam-portal");

    let banner = app.client.get(app.url("/")).send().await.unwrap();
    assert_eq!(banner.status().as_u16(), 200);
    assert!(!banner.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn register_login_and_profile_flow() {
    // Arrange
    let app = spawn_app(Directory::Local).await;
    let email = format!("user_{}@example.com", &Uuid::new_v4().simple().to_string()[..8]);
    let password = "Password123!";

    // Register
    let response = app
        .client
        .post(app.url("/api/users/register"))
        .json(&json!({ "name": "Ada", "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "student");
    assert!(body["user"].get("password").is_none());

    // Same email again, different case
    let response = app
        .client
        .post(app.url("/api/users/register"))
        .json(&json!({ "name": "Ada", "email": email.to_uppercase(), "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    // Login
    let response = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["type"], "Bearer");
    let token = body["token"].as_str().expect("Token not found").to_string();

    // Token verification
    let response = app
        .client
        .get(app.url("/api/users/auth"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let auth: Value = response.json().await.unwrap();
    assert_eq!(auth["role"], "student");

    // Profile
    let response = app
        .client
        .get(app.url("/api/users/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["email"], email);
    assert_eq!(profile["name"], "Ada");
    assert_eq!(auth["subject"], profile["id"]);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = spawn_app(Directory::Local).await;
    let email = "wrong.password@example.com";

    let response = app
        .client
        .post(app.url("/api/users/register"))
        .json(&json!({ "name": "Bob", "email": email, "password": "Password123!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let response = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": email, "password": "Password123?" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Unauthorized");

    let response = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": "nobody@example.com", "password": "Password123!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn register_rejects_invalid_input() {
    let app = spawn_app(Directory::Local).await;

    let bad_bodies = [
        json!({ "name": "Eve", "email": "not-an-email", "password": "Password123!" }),
        json!({ "name": "Eve", "email": "eve@example.com", "password": "short" }),
        json!({ "name": "Eve", "email": "eve@example.com", "password": "password123!" }),
        json!({ "name": "", "email": "eve@example.com", "password": "Password123!" }),
        json!({ "email": "eve@example.com" }),
    ];

    for body in bad_bodies.iter() {
        let response = app
            .client
            .post(app.url("/api/users/register"))
            .json(body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400, "body: {}", body);
    }
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let app = spawn_app(Directory::Local).await;
    let email = "changer@example.com";

    app.client
        .post(app.url("/api/users/register"))
        .json(&json!({ "name": "Cy", "email": email, "password": "Password123!" }))
        .send()
        .await
        .unwrap();
    let login: Value = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": email, "password": "Password123!" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_string();

    let response = app
        .client
        .patch(app.url("/api/users/change_password"))
        .bearer_auth(&token)
        .json(&json!({ "current_password": "Nope123!x", "new_password": "NewPassword456!" }))
        .send()
        .await
        .unwrap();
    // the session stays valid: no bearer challenge
    assert_eq!(response.status().as_u16(), 400);
    assert!(response.headers().get("www-authenticate").is_none());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Current password is incorrect");

    let response = app
        .client
        .patch(app.url("/api/users/change_password"))
        .bearer_auth(&token)
        .json(&json!({ "current_password": "Password123!", "new_password": "NewPassword456!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": email, "password": "NewPassword456!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn admin_can_switch_roles() {
    let app = spawn_app(Directory::Local).await;
    let email = "promoted@example.com";

    app.client
        .post(app.url("/api/users/register"))
        .json(&json!({ "name": "Dee", "email": email, "password": "Password123!" }))
        .send()
        .await
        .unwrap();

    let (_, student_token) = student();
    let response = app
        .client
        .patch(app.url("/api/users/switch_role"))
        .bearer_auth(&student_token)
        .json(&json!({ "email": email, "new_role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .patch(app.url("/api/users/switch_role"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "email": email, "new_role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["role"], "admin");

    let users: Value = app
        .client
        .get(app.url("/api/users"))
        .bearer_auth(app.admin_token())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    // the seeded admin and the promoted user
    assert_eq!(users["users"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn demoted_admin_token_loses_admin_rights() {
    let app = spawn_app(Directory::Local).await;
    let email = "short.reign@example.com";

    app.client
        .post(app.url("/api/users/register"))
        .json(&json!({ "name": "Kai", "email": email, "password": "Password123!" }))
        .send()
        .await
        .unwrap();
    let response = app
        .client
        .patch(app.url("/api/users/switch_role"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "email": email, "new_role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let login: Value = app
        .client
        .post(app.url("/api/users/login"))
        .json(&json!({ "email": email, "password": "Password123!" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_string();

    let response = app
        .client
        .get(app.url("/api/admin/exams"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = app
        .client
        .patch(app.url("/api/users/switch_role"))
        .bearer_auth(app.admin_token())
        .json(&json!({ "email": email, "new_role": "student" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // same token, still unexpired, now refused
    let response = app
        .client
        .get(app.url("/api/admin/exams"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn admin_token_without_account_is_forbidden() {
    let app = spawn_app(Directory::Local).await;
    let ghost = token_for(&Uuid::new_v4().to_string(), Role::Admin);

    let response = app
        .client
        .post(app.url("/api/admin/exams"))
        .bearer_auth(&ghost)
        .json(&json!({ "title": "Ghost", "duration_minutes": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn exam_admin_crud_keeps_total_score() {
    let app = spawn_app(Directory::Local).await;
    let (exam_id, q1, _q2) = app.two_question_exam().await;
    let admin = app.admin_token();

    let exam: Value = app
        .client
        .get(app.url(&format!("/api/admin/exams/{}", exam_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(exam["total_score"], 5);
    assert_eq!(exam["questions"].as_array().unwrap().len(), 2);
    assert_eq!(exam["questions"][0]["correct_option"], "B");

    // Update a question's score
    let response = app
        .client
        .put(app.url(&format!("/api/admin/exams/{}/questions/{}", exam_id, q1)))
        .bearer_auth(&admin)
        .json(&json!({
            "text": "Which one, again?",
            "options": ["A", "B", "C", "D"],
            "correct_option": "D",
            "score": 4
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let question: Value = response.json().await.unwrap();
    assert_eq!(question["correct_option"], "D");

    let exam: Value = app
        .client
        .get(app.url(&format!("/api/admin/exams/{}", exam_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(exam["total_score"], 7);

    // Delete it
    let response = app
        .client
        .delete(app.url(&format!("/api/admin/exams/{}/questions/{}", exam_id, q1)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = app
        .client
        .get(app.url(&format!("/api/admin/exams/{}/questions/{}", exam_id, q1)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // Update metadata
    let response = app
        .client
        .put(app.url(&format!("/api/admin/exams/{}", exam_id)))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Renamed", "duration_minutes": 45 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["total_score"], 3);

    // Delete the exam
    let response = app
        .client
        .delete(app.url(&format!("/api/admin/exams/{}", exam_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = app
        .client
        .get(app.url(&format!("/api/exams/{}", exam_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn bulk_questions_are_all_or_nothing() {
    let app = spawn_app(Directory::Local).await;
    let exam_id = app.create_exam("Bulk").await;
    let admin = app.admin_token();
    let url = app.url(&format!("/api/admin/exams/{}/questions/bulk", exam_id));

    let response = app
        .client
        .post(&url)
        .bearer_auth(&admin)
        .json(&json!({ "questions": [
            { "text": "ok", "options": ["x", "y"], "correct_option": "x", "score": 2 },
            { "text": "bad", "options": ["x", "y"], "correct_option": "z", "score": 2 }
        ] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let questions: Value = app
        .client
        .get(app.url(&format!("/api/admin/exams/{}/questions", exam_id)))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(questions.as_array().unwrap().is_empty());

    let response = app
        .client
        .post(&url)
        .bearer_auth(&admin)
        .json(&json!({ "questions": [
            { "text": "one", "options": ["x", "y"], "correct_option": "x", "score": 2 },
            { "question_text": "two", "options": ["x", "y"], "correctOption": "B" }
        ] }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["questions"].as_array().unwrap().len(), 2);
    assert_eq!(body["questions"][1]["correct_option"], "y");
    assert_eq!(body["questions"][1]["score"], 1);

    let exam: Value = app
        .client
        .get(app.url(&format!("/api/exams/{}", exam_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(exam["total_score"], 3);
}

#[tokio::test]
async fn question_for_unknown_exam_is_not_found() {
    let app = spawn_app(Directory::Local).await;

    let response = app
        .client
        .post(app.url(&format!("/api/admin/exams/{}/questions", Uuid::new_v4())))
        .bearer_auth(app.admin_token())
        .json(&json!({ "text": "?", "options": ["x", "y"], "correct_option": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn public_exam_read_hides_correct_options() {
    let app = spawn_app(Directory::Local).await;
    let (exam_id, _, _) = app.two_question_exam().await;

    let exams: Value = app
        .client
        .get(app.url("/api/exams"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(exams.as_array().unwrap().len(), 1);
    assert!(exams[0]["questions"][0].get("correct_option").is_none());

    let exam: Value = app
        .client
        .get(app.url(&format!("/api/exams/{}", exam_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(exam["total_score"], 5);
    for question in exam["questions"].as_array().unwrap() {
        assert!(question.get("correct_option").is_none());
        assert_eq!(question["options"].as_array().unwrap().len(), 4);
    }

    let questions: Value = app
        .client
        .get(app.url(&format!("/api/exams/{}/questions", exam_id)))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(questions.as_array().unwrap().len(), 2);
    assert!(questions[1].get("correct_option").is_none());

    let response = app
        .client
        .get(app.url("/api/exams/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn students_cannot_use_admin_routes() {
    let app = spawn_app(Directory::Local).await;
    let (exam_id, _, _) = app.two_question_exam().await;
    let (_, token) = student();

    let response = app
        .client
        .get(app.url(&format!("/api/admin/exams/{}", exam_id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .post(app.url("/api/admin/exams"))
        .bearer_auth(&token)
        .json(&json!({ "title": "Mine", "duration_minutes": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = app
        .client
        .get(app.url("/api/admin/exams"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn service_principal_is_read_only() {
    let app = spawn_app(Directory::Local).await;
    let (exam_id, _, _) = app.two_question_exam().await;
    let service = token_for(SERVICE_SUBJECT, Role::Service);

    let response = app
        .client
        .get(app.url(&format!("/api/admin/exams/{}", exam_id)))
        .bearer_auth(&service)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let exam: Value = response.json().await.unwrap();
    assert_eq!(exam["questions"][1]["correct_option"], "A");

    let response = app
        .client
        .delete(app.url(&format!("/api/admin/exams/{}", exam_id)))
        .bearer_auth(&service)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // a service principal is not a user and cannot submit
    let response = app
        .submit(
            Some(&service),
            &exam_id.to_string(),
            &json!({ "answers": [{ "question_id": Uuid::new_v4(), "selected_option": "A" }] }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 401);
}
