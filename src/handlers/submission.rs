// src/handlers/submission.rs

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{SubsecRound, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::parse_id,
    models::submission::{SubmitExamRequest, SubmitExamResponse, Submission},
    repositories::{DynSubmissionRepository, duplicate_submission},
    services::{exam_directory::DynExamDirectory, grading::grade},
    utils::jwt::Claims,
};

/// Records a student's answer sheet for an exam.
///
/// The exam, with its correct options, is read from the exam directory and
/// every entry is graded against it. Nothing is stored unless grading
/// succeeds. One submission per student and exam.
pub async fn submit_exam(
    State(submissions): State<DynSubmissionRepository>,
    State(directory): State<DynExamDirectory>,
    Extension(claims): Extension<Claims>,
    Path(exam_id): Path<String>,
    payload: Result<Json<SubmitExamRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let exam_id = parse_id(&exam_id, "Exam")?;
    let Json(payload) = payload?;
    payload.validate()?;

    if submissions.submission_exists(user_id, exam_id).await? {
        return Err(duplicate_submission());
    }

    let exam = directory.fetch_exam(exam_id).await?;
    let outcome = grade(&exam, &payload.answers);

    let submission = Submission {
        id: Uuid::new_v4(),
        user_id,
        exam_id,
        started_at: payload.start_time,
        answers: outcome.answers,
        score: outcome.total_score,
        // Postgres keeps microseconds
        submitted_at: Utc::now().trunc_subsecs(6),
    };
    submissions.insert_submission(&submission).await?;

    tracing::info!(
        submission_id = %submission.id,
        user_id = %user_id,
        exam_id = %exam_id,
        score = submission.score,
        max_score = outcome.max_score,
        "exam submitted"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitExamResponse {
            message: "Exam submitted successfully".to_string(),
            submission,
            max_score: outcome.max_score,
        }),
    ))
}

/// Submissions of one user. Students may only read their own.
pub async fn list_user_submissions(
    State(submissions): State<DynSubmissionRepository>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_id(&user_id, "User")?;

    if !claims.is_admin() && claims.user_id()? != user_id {
        return Err(AppError::Forbidden(
            "You can only view your own submissions".to_string(),
        ));
    }

    Ok(Json(submissions.list_by_user(user_id).await?))
}

/// Submissions of the calling user.
pub async fn list_my_submissions(
    State(submissions): State<DynSubmissionRepository>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(submissions.list_by_user(claims.user_id()?).await?))
}

/// Admin only.
pub async fn admin_list_user_submissions(
    State(submissions): State<DynSubmissionRepository>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_id(&user_id, "User")?;
    Ok(Json(submissions.list_by_user(user_id).await?))
}

/// Every submission recorded for one exam.
/// Admin only.
pub async fn list_exam_submissions(
    State(submissions): State<DynSubmissionRepository>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exam_id = parse_id(&exam_id, "Exam")?;
    Ok(Json(submissions.list_by_exam(exam_id).await?))
}
