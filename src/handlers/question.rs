// src/handlers/question.rs

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::parse_id,
    models::question::{BulkQuestionRequest, Question, QuestionRequest},
    repositories::DynExamRepository,
};

fn question_not_found() -> AppError {
    AppError::NotFound("Question not found".to_string())
}

/// Admin only.
pub async fn list_questions(
    State(exams): State<DynExamRepository>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exam_id = parse_id(&exam_id, "Exam")?;
    if exams.find_exam(exam_id).await?.is_none() {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }
    Ok(Json(exams.list_questions(exam_id).await?))
}

/// Admin only.
pub async fn get_question(
    State(exams): State<DynExamRepository>,
    Path((exam_id, question_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let exam_id = parse_id(&exam_id, "Exam")?;
    let question_id = parse_id(&question_id, "Question")?;

    let question = exams
        .find_question(exam_id, question_id)
        .await?
        .ok_or_else(question_not_found)?;
    Ok(Json(question))
}

/// Adds one question; the exam's total score grows by its points.
/// Admin only.
pub async fn create_question(
    State(exams): State<DynExamRepository>,
    Path(exam_id): Path<String>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let exam_id = parse_id(&exam_id, "Exam")?;
    let Json(payload) = payload?;

    let question = payload.into_question(exam_id)?;
    exams.insert_questions(exam_id, std::slice::from_ref(&question)).await?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Adds several questions at once, all or none.
/// Admin only.
pub async fn create_questions_bulk(
    State(exams): State<DynExamRepository>,
    Path(exam_id): Path<String>,
    payload: Result<Json<BulkQuestionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let exam_id = parse_id(&exam_id, "Exam")?;
    let Json(payload) = payload?;
    payload.validate()?;

    let questions = payload
        .questions
        .into_iter()
        .enumerate()
        .map(|(idx, req)| {
            req.into_question(exam_id).map_err(|e| match e {
                AppError::Validation(msg) => AppError::Validation(format!("question {idx}: {msg}")),
                other => other,
            })
        })
        .collect::<Result<Vec<Question>, AppError>>()?;

    exams.insert_questions(exam_id, &questions).await?;

    tracing::info!(exam_id = %exam_id, count = questions.len(), "questions added");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Questions added successfully",
            "questions": questions,
        })),
    ))
}

/// Replaces a question's text, options and correct option.
/// Admin only.
pub async fn update_question(
    State(exams): State<DynExamRepository>,
    Path((exam_id, question_id)): Path<(String, String)>,
    payload: Result<Json<QuestionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let exam_id = parse_id(&exam_id, "Exam")?;
    let question_id = parse_id(&question_id, "Question")?;
    let Json(payload) = payload?;

    let mut question = exams
        .find_question(exam_id, question_id)
        .await?
        .ok_or_else(question_not_found)?;

    payload.apply_to(&mut question)?;

    if !exams.update_question(&question).await? {
        return Err(question_not_found());
    }

    Ok(Json(question))
}

/// Admin only.
pub async fn delete_question(
    State(exams): State<DynExamRepository>,
    Path((exam_id, question_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let exam_id = parse_id(&exam_id, "Exam")?;
    let question_id = parse_id(&question_id, "Question")?;

    if !exams.delete_question(exam_id, question_id).await? {
        return Err(question_not_found());
    }

    Ok(Json(json!({ "message": "Question deleted successfully" })))
}
