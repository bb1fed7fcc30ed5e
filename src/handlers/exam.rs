// src/handlers/exam.rs

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
    models::{
        exam::{ExamDraft, ExamRequest, ExamWithQuestions, PublicExam},
        question::PublicQuestion,
    },
    repositories::DynExamRepository,
};

async fn load_exam(exams: &DynExamRepository, raw_id: &str) -> Result<ExamWithQuestions, AppError> {
    let id = parse_id(raw_id, "Exam")?;
    exams
        .find_exam(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))
}

/// Lists exams for students; correct options are hidden.
pub async fn list_exams(
    State(exams): State<DynExamRepository>,
) -> Result<impl IntoResponse, AppError> {
    let public: Vec<PublicExam> = exams
        .list_exams()
        .await?
        .into_iter()
        .map(PublicExam::from)
        .collect();
    Ok(Json(public))
}

/// One exam for students; correct options are hidden.
pub async fn get_exam(
    State(exams): State<DynExamRepository>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exam = load_exam(&exams, &exam_id).await?;
    Ok(Json(PublicExam::from(exam)))
}

/// Questions of one exam for students.
pub async fn list_exam_questions(
    State(exams): State<DynExamRepository>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let exam = load_exam(&exams, &exam_id).await?;
    let questions: Vec<PublicQuestion> = exam.questions.into_iter().map(PublicQuestion::from).collect();
    Ok(Json(questions))
}

/// Lists exams including correct options.
/// Admin only.
pub async fn list_exams_with_answers(
    State(exams): State<DynExamRepository>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(exams.list_exams().await?))
}

/// The privileged exam read the submission recorder grades against.
/// Admin or service principal.
pub async fn get_exam_with_answers(
    State(exams): State<DynExamRepository>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(load_exam(&exams, &exam_id).await?))
}

/// Creates an exam without questions.
/// Admin only.
pub async fn create_exam(
    State(exams): State<DynExamRepository>,
    payload: Result<Json<ExamRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let exam = ExamDraft::from(payload).into_exam();
    exams.insert_exam(&exam).await?;

    tracing::info!(exam_id = %exam.id, title = %exam.title, "exam created");

    Ok((
        StatusCode::CREATED,
        Json(ExamWithQuestions {
            exam,
            questions: Vec::new(),
        }),
    ))
}

/// Updates exam metadata. Questions and total score are untouched.
/// Admin only.
pub async fn update_exam(
    State(exams): State<DynExamRepository>,
    Path(exam_id): Path<String>,
    payload: Result<Json<ExamRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&exam_id, "Exam")?;
    let Json(payload) = payload?;
    payload.validate()?;

    let exam = exams
        .update_exam(id, &ExamDraft::from(payload))
        .await?
        .ok_or_else(|| AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(exam))
}

/// Deletes an exam and its questions. Submissions keep their copies.
/// Admin only.
pub async fn delete_exam(
    State(exams): State<DynExamRepository>,
    Path(exam_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&exam_id, "Exam")?;

    if !exams.delete_exam(id).await? {
        return Err(AppError::NotFound("Exam not found".to_string()));
    }

    tracing::info!(exam_id = %id, "exam deleted");
    Ok(Json(json!({ "message": "Exam deleted successfully" })))
}
