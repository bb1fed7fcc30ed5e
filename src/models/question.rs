// src/models/question.rs

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{error::AppError, utils::html::clean_html};

/// Default point value of a question.
pub const DEFAULT_QUESTION_SCORE: i32 = 1;

/// A stored multiple-choice question.
///
/// `correct_option` always holds the literal text of one of `options`;
/// other designators are normalized on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub correct_option: String,
    pub score: i32,
}

/// DTO for sending a question to students (excludes the correct option).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: Uuid,
    pub exam_id: Uuid,
    pub text: String,
    pub options: Vec<String>,
    pub score: i32,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            exam_id: q.exam_id,
            text: q.text,
            options: q.options,
            score: q.score,
        }
    }
}

/// A reference to one option of a question, as clients and legacy rows
/// express it: a 0-based index, or text that is either the literal
/// option value, a letter (`"A"` is the first option) or a numeric index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionDesignator {
    Index(u64),
    Text(String),
}

impl OptionDesignator {
    /// Position of the designated option.
    ///
    /// Literal matches win over letters, letters over numeric strings, so an
    /// option list of `["A", "B"]` resolves `"B"` to the literal `"B"`.
    pub fn position(&self, options: &[String]) -> Option<usize> {
        match self {
            OptionDesignator::Index(idx) => {
                usize::try_from(*idx).ok().filter(|i| *i < options.len())
            }
            OptionDesignator::Text(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return None;
                }
                options
                    .iter()
                    .position(|o| o == raw)
                    .or_else(|| options.iter().position(|o| o.trim() == trimmed))
                    .or_else(|| letter_index(trimmed).filter(|i| *i < options.len()))
                    .or_else(|| trimmed.parse::<usize>().ok().filter(|i| *i < options.len()))
            }
        }
    }

    /// The literal option value this designator points at.
    pub fn resolve<'a>(&self, options: &'a [String]) -> Option<&'a str> {
        self.position(options).map(|i| options[i].as_str())
    }

    /// The designator as submitted, for audit when it resolves to nothing.
    /// Blank text counts as no selection.
    pub fn raw(&self) -> Option<String> {
        match self {
            OptionDesignator::Index(idx) => Some(idx.to_string()),
            OptionDesignator::Text(text) if text.trim().is_empty() => None,
            OptionDesignator::Text(text) => Some(text.clone()),
        }
    }
}

fn letter_index(s: &str) -> Option<usize> {
    let mut chars = s.chars();
    let c = chars.next()?;
    if chars.next().is_some() || !c.is_ascii_alphabetic() {
        return None;
    }
    Some((c.to_ascii_uppercase() as u8 - b'A') as usize)
}

/// DTO for creating or replacing a question.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct QuestionRequest {
    #[serde(alias = "question_text")]
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    #[validate(length(min = 2, max = 10), custom(function = validate_options))]
    pub options: Vec<String>,
    #[serde(alias = "correctOption")]
    pub correct_option: OptionDesignator,
    #[validate(range(min = 0, max = 1000))]
    pub score: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct BulkQuestionRequest {
    #[validate(length(min = 1, max = 200), nested)]
    pub questions: Vec<QuestionRequest>,
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    let mut seen = HashSet::new();
    for opt in options {
        if opt.trim().is_empty() {
            return Err(validator::ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(validator::ValidationError::new("option_too_long"));
        }
        if !seen.insert(opt.trim()) {
            return Err(validator::ValidationError::new("duplicate_option"));
        }
    }
    Ok(())
}

impl QuestionRequest {
    /// Builds a new question owned by `exam_id`.
    pub fn into_question(self, exam_id: Uuid) -> Result<Question, AppError> {
        let mut question = Question {
            id: Uuid::new_v4(),
            exam_id,
            text: String::new(),
            options: Vec::new(),
            correct_option: String::new(),
            score: DEFAULT_QUESTION_SCORE,
        };
        self.apply_to(&mut question)?;
        Ok(question)
    }

    /// Overwrites `question` with this request. An omitted score keeps
    /// the current one.
    pub fn apply_to(self, question: &mut Question) -> Result<(), AppError> {
        self.validate()?;

        let correct = self
            .correct_option
            .resolve(&self.options)
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "correct_option '{}' does not match any option",
                    self.correct_option.raw().unwrap_or_default()
                ))
            })?
            .to_string();

        question.text = clean_html(&self.text);
        question.options = self.options;
        question.correct_option = correct;
        if let Some(score) = self.score {
            question.score = score;
        }
        Ok(())
    }
}
