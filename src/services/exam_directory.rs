// src/services/exam_directory.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;
use uuid::Uuid;

use crate::{
    config::Config,
    error::AppError,
    models::{exam::ExamWithQuestions, question::OptionDesignator, user::Role},
    repositories::DynExamRepository,
    utils::jwt::sign_jwt,
};

/// Token subject the recorder uses when reading the directory over HTTP.
pub const SERVICE_SUBJECT: &str = "submission-recorder";

/// Lifetime of the per-call service token.
const SERVICE_TOKEN_TTL_SECS: u64 = 60;

/// The authoritative answer sheet of an exam, as the privileged read returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryExam {
    pub id: Uuid,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration_minutes: Option<i32>,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_score: Option<i64>,
    pub questions: Vec<DirectoryQuestion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryQuestion {
    pub id: Uuid,
    #[serde(default, alias = "question_text")]
    pub text: String,
    pub options: Vec<String>,
    /// Older exam services sent `correctOption`, sometimes as a letter or index.
    #[serde(default, alias = "correctOption")]
    pub correct_option: Option<OptionDesignator>,
    #[serde(default = "default_points")]
    pub score: i64,
}

fn default_points() -> i64 {
    1
}

impl DirectoryQuestion {
    /// Point value, never negative.
    pub fn points(&self) -> i64 {
        self.score.max(0)
    }
}

impl From<ExamWithQuestions> for DirectoryExam {
    fn from(full: ExamWithQuestions) -> Self {
        Self {
            id: full.exam.id,
            title: full.exam.title,
            duration_minutes: Some(full.exam.duration_minutes),
            start_time: full.exam.start_time,
            total_score: Some(full.exam.total_score),
            questions: full
                .questions
                .into_iter()
                .map(|q| DirectoryQuestion {
                    id: q.id,
                    text: q.text,
                    options: q.options,
                    correct_option: Some(OptionDesignator::Text(q.correct_option)),
                    score: i64::from(q.score),
                })
                .collect(),
        }
    }
}

/// Read access to exams with their correct options, for grading.
#[async_trait]
pub trait ExamDirectory: Send + Sync {
    /// `NotFound` when the exam does not exist, `Upstream` for any other failure.
    async fn fetch_exam(&self, exam_id: Uuid) -> Result<DirectoryExam, AppError>;
}

pub type DynExamDirectory = Arc<dyn ExamDirectory>;

/// Reads exams from a (possibly remote) exam service over HTTP.
pub struct HttpExamDirectory {
    client: reqwest::Client,
    base_url: Url,
    jwt_secret: String,
}

impl HttpExamDirectory {
    pub fn new(base_url: Url, config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            jwt_secret: config.jwt_secret.clone(),
        })
    }

    fn exam_url(&self, exam_id: Uuid) -> Result<Url, AppError> {
        let raw = format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), exam_id);
        Url::parse(&raw).map_err(|e| AppError::Upstream(format!("bad exam url '{raw}': {e}")))
    }
}

#[async_trait]
impl ExamDirectory for HttpExamDirectory {
    async fn fetch_exam(&self, exam_id: Uuid) -> Result<DirectoryExam, AppError> {
        let url = self.exam_url(exam_id)?;
        let token = sign_jwt(
            SERVICE_SUBJECT,
            Role::Service,
            &self.jwt_secret,
            SERVICE_TOKEN_TTL_SECS,
        )?;

        tracing::debug!(%url, "fetching exam from directory");
        let response = self.client.get(url).bearer_auth(token).send().await?;

        match response.status() {
            status if status.is_success() => {
                let exam = response.json::<DirectoryExam>().await.map_err(|e| {
                    AppError::Upstream(format!("malformed exam payload for {exam_id}: {e}"))
                })?;
                if exam.id != exam_id {
                    return Err(AppError::Upstream(format!(
                        "directory answered exam {} for {exam_id}",
                        exam.id
                    )));
                }
                Ok(exam)
            }
            StatusCode::NOT_FOUND => Err(AppError::NotFound(format!("Exam {exam_id} not found"))),
            status => Err(AppError::Upstream(format!(
                "exam directory answered {status} for {exam_id}"
            ))),
        }
    }
}

/// Reads exams straight from the exam repository of this process.
pub struct LocalExamDirectory {
    exams: DynExamRepository,
}

impl LocalExamDirectory {
    pub fn new(exams: DynExamRepository) -> Self {
        Self { exams }
    }
}

#[async_trait]
impl ExamDirectory for LocalExamDirectory {
    async fn fetch_exam(&self, exam_id: Uuid) -> Result<DirectoryExam, AppError> {
        match self.exams.find_exam(exam_id).await {
            Ok(Some(full)) => Ok(full.into()),
            Ok(None) => Err(AppError::NotFound(format!("Exam {exam_id} not found"))),
            Err(AppError::Persistence(detail)) => Err(AppError::Upstream(detail)),
            Err(other) => Err(other),
        }
    }
}
