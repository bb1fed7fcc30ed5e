// src/repositories/mod.rs

//! Storage seams. Every handler reaches the database through these traits,
//! so the same router runs on Postgres in production and on the
//! in-memory store in tests and local runs.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamDraft, ExamWithQuestions},
        question::Question,
        submission::Submission,
        user::{Role, User},
    },
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: &User) -> Result<(), AppError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError>;
    async fn update_role(&self, email: &str, role: Role) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait ExamRepository: Send + Sync {
    async fn list_exams(&self) -> Result<Vec<ExamWithQuestions>, AppError>;
    async fn find_exam(&self, id: Uuid) -> Result<Option<ExamWithQuestions>, AppError>;
    async fn insert_exam(&self, exam: &Exam) -> Result<(), AppError>;
    async fn update_exam(&self, id: Uuid, draft: &ExamDraft) -> Result<Option<Exam>, AppError>;
    /// Deletes the exam and its questions.
    async fn delete_exam(&self, id: Uuid) -> Result<bool, AppError>;

    async fn list_questions(&self, exam_id: Uuid) -> Result<Vec<Question>, AppError>;
    async fn find_question(&self, exam_id: Uuid, id: Uuid) -> Result<Option<Question>, AppError>;
    /// Appends questions to an exam, all or none, and refreshes the exam's
    /// total score. Fails with `NotFound` when the exam does not exist.
    async fn insert_questions(&self, exam_id: Uuid, questions: &[Question]) -> Result<(), AppError>;
    async fn update_question(&self, question: &Question) -> Result<bool, AppError>;
    async fn delete_question(&self, exam_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    /// Fails with `Conflict` when the user already has a submission for the exam.
    async fn insert_submission(&self, submission: &Submission) -> Result<(), AppError>;
    async fn submission_exists(&self, user_id: Uuid, exam_id: Uuid) -> Result<bool, AppError>;
    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Submission>, AppError>;
    async fn list_by_exam(&self, exam_id: Uuid) -> Result<Vec<Submission>, AppError>;
}

pub type DynUserRepository = Arc<dyn UserRepository>;
pub type DynExamRepository = Arc<dyn ExamRepository>;
pub type DynSubmissionRepository = Arc<dyn SubmissionRepository>;

pub(crate) fn duplicate_submission() -> AppError {
    AppError::Conflict("Exam already submitted".to_string())
}

pub(crate) fn duplicate_email(email: &str) -> AppError {
    AppError::Conflict(format!("Email '{email}' already in use"))
}
