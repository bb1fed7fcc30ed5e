// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::question::{PublicQuestion, Question},
    utils::html::clean_html,
};

/// Represents the 'exams' table.
///
/// `total_score` is the sum of the point values of the exam's questions;
/// stores recompute it in the same write that changes a question.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub start_time: Option<DateTime<Utc>>,
    pub total_score: i64,
    pub created_at: DateTime<Utc>,
}

/// An exam with its questions in question order, correct options included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamWithQuestions {
    #[serde(flatten)]
    pub exam: Exam,
    pub questions: Vec<Question>,
}

/// Student view of an exam.
#[derive(Debug, Serialize)]
pub struct PublicExam {
    #[serde(flatten)]
    pub exam: Exam,
    pub questions: Vec<PublicQuestion>,
}

impl From<ExamWithQuestions> for PublicExam {
    fn from(full: ExamWithQuestions) -> Self {
        Self {
            exam: full.exam,
            questions: full.questions.into_iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// DTO for creating or updating exam metadata.
#[derive(Debug, Deserialize, Validate)]
pub struct ExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    #[validate(range(min = 1, max = 1440))]
    pub duration_minutes: i32,
    pub start_time: Option<DateTime<Utc>>,
}

/// Sanitized exam metadata, ready to be written.
#[derive(Debug, Clone)]
pub struct ExamDraft {
    pub title: String,
    pub description: String,
    pub duration_minutes: i32,
    pub start_time: Option<DateTime<Utc>>,
}

impl From<ExamRequest> for ExamDraft {
    fn from(req: ExamRequest) -> Self {
        Self {
            title: req.title.trim().to_string(),
            description: clean_html(req.description.as_deref().unwrap_or_default()),
            duration_minutes: req.duration_minutes,
            start_time: req.start_time,
        }
    }
}

impl ExamDraft {
    pub fn into_exam(self) -> Exam {
        Exam {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            duration_minutes: self.duration_minutes,
            start_time: self.start_time,
            total_score: 0,
            created_at: Utc::now(),
        }
    }

    pub fn apply_to(&self, exam: &mut Exam) {
        exam.title = self.title.clone();
        exam.description = self.description.clone();
        exam.duration_minutes = self.duration_minutes;
        exam.start_time = self.start_time;
    }
}
