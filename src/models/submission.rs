// src/models/submission.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::question::OptionDesignator;

/// One graded answer, embedded in a submission.
///
/// `correct_option` and `question_mark` are copied from the question at
/// grading time and stay null when the question is not part of the exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    pub selected_option: Option<String>,
    pub correct_option: Option<String>,
    pub question_mark: Option<i32>,
}

/// Represents the 'submissions' table. Written once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub exam_id: Uuid,
    pub started_at: Option<DateTime<Utc>>,
    pub answers: Vec<Answer>,
    pub score: i64,
    pub submitted_at: DateTime<Utc>,
}

/// One entry of a student's answer sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_id: Uuid,
    #[serde(default)]
    pub selected_option: Option<OptionDesignator>,
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitExamRequest {
    #[validate(
        length(min = 1, message = "answers must be a non-empty list"),
        custom(function = validate_unique_questions)
    )]
    pub answers: Vec<AnswerEntry>,

    /// When the student opened the exam. Audit only.
    #[serde(default, alias = "started_at")]
    pub start_time: Option<DateTime<Utc>>,
}

/// Each question may be answered once per submission, otherwise a
/// repeated entry would be credited twice.
fn validate_unique_questions(answers: &[AnswerEntry]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for entry in answers {
        if !seen.insert(entry.question_id) {
            return Err(ValidationError::new("duplicate_question")
                .with_message(format!("question {} answered more than once", entry.question_id).into()));
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SubmitExamResponse {
    pub message: String,
    pub submission: Submission,
    #[serde(rename = "maxScore")]
    pub max_score: i64,
}
