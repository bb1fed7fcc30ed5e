// src/services/grading.rs

use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    models::submission::{Answer, AnswerEntry},
    services::exam_directory::{DirectoryExam, DirectoryQuestion},
};

/// Result of reconciling one answer sheet against an exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeOutcome {
    /// One record per submitted entry, in submitted order.
    pub answers: Vec<Answer>,
    pub total_score: i64,
    /// Sum of the points of every question of the exam, answered or not.
    pub max_score: i64,
}

/// Grades `entries` against the authoritative questions of `exam`.
///
/// * Entries for questions outside the exam are kept with a null correct
///   option and null mark, and score nothing.
/// * Correct and selected options are both resolved to the literal option
///   value before comparison; a value that resolves to nothing never scores.
/// * Questions without an entry are not filled in.
pub fn grade(exam: &DirectoryExam, entries: &[AnswerEntry]) -> GradeOutcome {
    // points come from another service; saturate rather than overflow
    let max_score = exam
        .questions
        .iter()
        .map(DirectoryQuestion::points)
        .fold(0i64, i64::saturating_add);

    let key: HashMap<Uuid, &DirectoryQuestion> =
        exam.questions.iter().map(|q| (q.id, q)).collect();

    let mut total_score: i64 = 0;
    let mut answers = Vec::with_capacity(entries.len());

    for entry in entries {
        let raw_selected = entry.selected_option.as_ref().and_then(|d| d.raw());

        let Some(question) = key.get(&entry.question_id) else {
            answers.push(Answer {
                question_id: entry.question_id,
                selected_option: raw_selected,
                correct_option: None,
                question_mark: None,
            });
            continue;
        };

        let correct = question
            .correct_option
            .as_ref()
            .and_then(|d| d.resolve(&question.options));
        let selected = entry
            .selected_option
            .as_ref()
            .and_then(|d| d.resolve(&question.options));

        if correct.is_none() {
            tracing::warn!(
                exam_id = %exam.id,
                question_id = %question.id,
                "correct option does not resolve to any option; question cannot be credited"
            );
        }

        let is_correct = matches!((correct, selected), (Some(c), Some(s)) if c == s);
        if is_correct {
            total_score = total_score.saturating_add(question.points());
        }

        answers.push(Answer {
            question_id: entry.question_id,
            selected_option: selected.map(str::to_string).or(raw_selected),
            correct_option: correct.map(str::to_string).or_else(|| {
                question.correct_option.as_ref().and_then(|d| d.raw())
            }),
            question_mark: Some(question.points().clamp(0, i64::from(i32::MAX)) as i32),
        });
    }

    GradeOutcome {
        answers,
        total_score,
        max_score,
    }
}
