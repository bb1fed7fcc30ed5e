// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    handlers::{auth, exam, question, submission, system},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

/// Assembles the main application router.
///
/// * `/api/users`: identity (register, login, profile, roles).
/// * `/api/exams`, `/api/admin/exams`: the exam directory.
/// * `/api/submissions`, `/api/admin/submissions`: the submission recorder.
pub fn create_router(state: AppState) -> Router {
    let user_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/auth", get(auth::authenticate))
                .route("/profile", get(auth::profile))
                .route("/change_password", patch(auth::change_password))
                .merge(
                    Router::new()
                        .route("/", get(auth::list_users))
                        .route("/switch_role", patch(auth::switch_role))
                        .route_layer(middleware::from_fn_with_state(
                            state.clone(),
                            admin_middleware,
                        )),
                )
                .route_layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let exam_routes = Router::new()
        .route("/", get(exam::list_exams))
        .route("/{exam_id}", get(exam::get_exam))
        .route("/{exam_id}/questions", get(exam::list_exam_questions));

    let submission_routes = Router::new()
        .route("/me", get(submission::list_my_submissions))
        .route("/user/{user_id}", get(submission::list_user_submissions))
        .route("/{exam_id}", post(submission::submit_exam))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route(
            "/exams",
            get(exam::list_exams_with_answers).post(exam::create_exam),
        )
        .route(
            "/exams/{exam_id}",
            get(exam::get_exam_with_answers)
                .put(exam::update_exam)
                .delete(exam::delete_exam),
        )
        .route(
            "/exams/{exam_id}/questions",
            get(question::list_questions).post(question::create_question),
        )
        .route(
            "/exams/{exam_id}/questions/bulk",
            post(question::create_questions_bulk),
        )
        .route(
            "/exams/{exam_id}/questions/{question_id}",
            get(question::get_question)
                .put(question::update_question)
                .delete(question::delete_question),
        )
        .route(
            "/submissions/user/{user_id}",
            get(submission::admin_list_user_submissions),
        )
        .route(
            "/submissions/exam/{exam_id}",
            get(submission::list_exam_submissions),
        )
        // Auth first, then the admin check
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .nest("/api/users", user_routes)
        .nest("/api/exams", exam_routes)
        .nest("/api/submissions", submission_routes)
        .nest("/api/admin", admin_routes)
        .fallback(system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
