// src/repositories/memory.rs

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamDraft, ExamWithQuestions},
        question::Question,
        submission::Submission,
        user::{Role, User},
    },
    repositories::{
        ExamRepository, SubmissionRepository, UserRepository, duplicate_email,
        duplicate_submission,
    },
};

/// Process-local store used when no `DATABASE_URL` is configured.
///
/// One lock guards everything, which gives question writes and the
/// total score refresh the same all-or-nothing behavior as a transaction.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    exams: Vec<Exam>,
    /// Global insertion order doubles as question order.
    questions: Vec<Question>,
    submissions: Vec<Submission>,
}

impl Inner {
    fn questions_of(&self, exam_id: Uuid) -> Vec<Question> {
        self.questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .cloned()
            .collect()
    }

    fn with_questions(&self, exam: &Exam) -> ExamWithQuestions {
        ExamWithQuestions {
            exam: exam.clone(),
            questions: self.questions_of(exam.id),
        }
    }

    fn refresh_total_score(&mut self, exam_id: Uuid) {
        let total: i64 = self
            .questions
            .iter()
            .filter(|q| q.exam_id == exam_id)
            .map(|q| i64::from(q.score))
            .sum();
        if let Some(exam) = self.exams.iter_mut().find(|e| e.id == exam_id) {
            exam.total_score = total;
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(duplicate_email(&user.email));
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().rev().cloned().collect())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        match inner.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_role(&self, email: &str, role: Role) -> Result<Option<User>, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .users
            .iter_mut()
            .find(|u| u.email == email)
            .map(|user| {
                user.role = role;
                user.clone()
            }))
    }
}

#[async_trait]
impl ExamRepository for MemoryStore {
    async fn list_exams(&self) -> Result<Vec<ExamWithQuestions>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.exams.iter().map(|e| inner.with_questions(e)).collect())
    }

    async fn find_exam(&self, id: Uuid) -> Result<Option<ExamWithQuestions>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .exams
            .iter()
            .find(|e| e.id == id)
            .map(|e| inner.with_questions(e)))
    }

    async fn insert_exam(&self, exam: &Exam) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        inner.exams.push(exam.clone());
        Ok(())
    }

    async fn update_exam(&self, id: Uuid, draft: &ExamDraft) -> Result<Option<Exam>, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.exams.iter_mut().find(|e| e.id == id).map(|exam| {
            draft.apply_to(exam);
            exam.clone()
        }))
    }

    async fn delete_exam(&self, id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        let before = inner.exams.len();
        inner.exams.retain(|e| e.id != id);
        if inner.exams.len() == before {
            return Ok(false);
        }
        inner.questions.retain(|q| q.exam_id != id);
        Ok(true)
    }

    async fn list_questions(&self, exam_id: Uuid) -> Result<Vec<Question>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.questions_of(exam_id))
    }

    async fn find_question(&self, exam_id: Uuid, id: Uuid) -> Result<Option<Question>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .questions
            .iter()
            .find(|q| q.exam_id == exam_id && q.id == id)
            .cloned())
    }

    async fn insert_questions(&self, exam_id: Uuid, questions: &[Question]) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if !inner.exams.iter().any(|e| e.id == exam_id) {
            return Err(AppError::NotFound("Exam not found".to_string()));
        }
        inner.questions.extend(questions.iter().cloned().map(|mut q| {
            q.exam_id = exam_id;
            q
        }));
        inner.refresh_total_score(exam_id);
        Ok(())
    }

    async fn update_question(&self, question: &Question) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        let Some(slot) = inner
            .questions
            .iter_mut()
            .find(|q| q.id == question.id && q.exam_id == question.exam_id)
        else {
            return Ok(false);
        };
        *slot = question.clone();
        inner.refresh_total_score(question.exam_id);
        Ok(true)
    }

    async fn delete_question(&self, exam_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut inner = self.inner.write().await;
        let before = inner.questions.len();
        inner.questions.retain(|q| !(q.exam_id == exam_id && q.id == id));
        if inner.questions.len() == before {
            return Ok(false);
        }
        inner.refresh_total_score(exam_id);
        Ok(true)
    }
}

#[async_trait]
impl SubmissionRepository for MemoryStore {
    async fn insert_submission(&self, submission: &Submission) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if inner
            .submissions
            .iter()
            .any(|s| s.user_id == submission.user_id && s.exam_id == submission.exam_id)
        {
            return Err(duplicate_submission());
        }
        inner.submissions.push(submission.clone());
        Ok(())
    }

    async fn submission_exists(&self, user_id: Uuid, exam_id: Uuid) -> Result<bool, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .submissions
            .iter()
            .any(|s| s.user_id == user_id && s.exam_id == exam_id))
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Submission>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .submissions
            .iter()
            .rev()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_by_exam(&self, exam_id: Uuid) -> Result<Vec<Submission>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .submissions
            .iter()
            .rev()
            .filter(|s| s.exam_id == exam_id)
            .cloned()
            .collect())
    }
}
