// src/repositories/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool, types::Json};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        exam::{Exam, ExamDraft, ExamWithQuestions},
        question::Question,
        submission::{Answer, Submission},
        user::{Role, User},
    },
    repositories::{
        ExamRepository, SubmissionRepository, UserRepository, duplicate_email,
        duplicate_submission,
    },
};

/// Postgres-backed store over a shared connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password: row.password,
            role: row.role.parse().map_err(AppError::Persistence)?,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: Uuid,
    exam_id: Uuid,
    text: String,
    options: Json<Vec<String>>,
    correct_option: String,
    score: i32,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            exam_id: row.exam_id,
            text: row.text,
            options: row.options.0,
            correct_option: row.correct_option,
            score: row.score,
        }
    }
}

#[derive(FromRow)]
struct SubmissionRow {
    id: Uuid,
    user_id: Uuid,
    exam_id: Uuid,
    started_at: Option<DateTime<Utc>>,
    answers: Json<Vec<Answer>>,
    score: i64,
    submitted_at: DateTime<Utc>,
}

impl From<SubmissionRow> for Submission {
    fn from(row: SubmissionRow) -> Self {
        Submission {
            id: row.id,
            user_id: row.user_id,
            exam_id: row.exam_id,
            started_at: row.started_at,
            answers: row.answers.0,
            score: row.score,
            submitted_at: row.submitted_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password, role, created_at";
const EXAM_COLUMNS: &str =
    "id, title, description, duration_minutes, start_time, total_score, created_at";
const QUESTION_COLUMNS: &str = "id, exam_id, text, options, correct_option, score";
const SUBMISSION_COLUMNS: &str =
    "id, user_id, exam_id, started_at, answers, score, submitted_at";

/// Keeps `exams.total_score` equal to the sum of its question scores.
async fn refresh_total_score(conn: &mut PgConnection, exam_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE exams
        SET total_score = (SELECT COALESCE(SUM(score), 0) FROM questions WHERE exam_id = $1)
        WHERE id = $1
        "#,
    )
    .bind(exam_id)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password, role, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => duplicate_email(&user.email),
            other => other,
        })?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_role(&self, email: &str, role: Role) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET role = $1 WHERE email = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(role.as_str())
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }
}

#[async_trait]
impl ExamRepository for PgStore {
    async fn list_exams(&self) -> Result<Vec<ExamWithQuestions>, AppError> {
        let exams = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = exams.iter().map(|e| e.id).collect();
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE exam_id = ANY($1) ORDER BY seq"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_exam: HashMap<Uuid, Vec<Question>> = HashMap::new();
        for row in rows {
            by_exam.entry(row.exam_id).or_default().push(row.into());
        }

        Ok(exams
            .into_iter()
            .map(|exam| ExamWithQuestions {
                questions: by_exam.remove(&exam.id).unwrap_or_default(),
                exam,
            })
            .collect())
    }

    async fn find_exam(&self, id: Uuid) -> Result<Option<ExamWithQuestions>, AppError> {
        let exam = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(exam) = exam else {
            return Ok(None);
        };

        let questions = self.list_questions(id).await?;
        Ok(Some(ExamWithQuestions { exam, questions }))
    }

    async fn insert_exam(&self, exam: &Exam) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO exams (id, title, description, duration_minutes, start_time, total_score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(exam.id)
        .bind(&exam.title)
        .bind(&exam.description)
        .bind(exam.duration_minutes)
        .bind(exam.start_time)
        .bind(exam.total_score)
        .bind(exam.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_exam(&self, id: Uuid, draft: &ExamDraft) -> Result<Option<Exam>, AppError> {
        let exam = sqlx::query_as::<_, Exam>(&format!(
            r#"
            UPDATE exams
            SET title = $1, description = $2, duration_minutes = $3, start_time = $4
            WHERE id = $5
            RETURNING {EXAM_COLUMNS}
            "#
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.duration_minutes)
        .bind(draft.start_time)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(exam)
    }

    async fn delete_exam(&self, id: Uuid) -> Result<bool, AppError> {
        // questions go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM exams WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_questions(&self, exam_id: Uuid) -> Result<Vec<Question>, AppError> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE exam_id = $1 ORDER BY seq"
        ))
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    async fn find_question(&self, exam_id: Uuid, id: Uuid) -> Result<Option<Question>, AppError> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {QUESTION_COLUMNS} FROM questions WHERE exam_id = $1 AND id = $2"
        ))
        .bind(exam_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Question::from))
    }

    async fn insert_questions(&self, exam_id: Uuid, questions: &[Question]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        // lock the exam row so concurrent writers serialize on the total
        let exists = sqlx::query("SELECT id FROM exams WHERE id = $1 FOR UPDATE")
            .bind(exam_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(AppError::NotFound("Exam not found".to_string()));
        }

        for question in questions {
            sqlx::query(
                r#"
                INSERT INTO questions (id, exam_id, text, options, correct_option, score)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(question.id)
            .bind(exam_id)
            .bind(&question.text)
            .bind(Json(&question.options))
            .bind(&question.correct_option)
            .bind(question.score)
            .execute(&mut *tx)
            .await?;
        }

        refresh_total_score(&mut *tx, exam_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn update_question(&self, question: &Question) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE questions
            SET text = $1, options = $2, correct_option = $3, score = $4
            WHERE id = $5 AND exam_id = $6
            "#,
        )
        .bind(&question.text)
        .bind(Json(&question.options))
        .bind(&question.correct_option)
        .bind(question.score)
        .bind(question.id)
        .bind(question.exam_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        refresh_total_score(&mut *tx, question.exam_id).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn delete_question(&self, exam_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM questions WHERE id = $1 AND exam_id = $2")
            .bind(id)
            .bind(exam_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        refresh_total_score(&mut *tx, exam_id).await?;
        tx.commit().await?;
        Ok(true)
    }
}

#[async_trait]
impl SubmissionRepository for PgStore {
    async fn insert_submission(&self, submission: &Submission) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO submissions (id, user_id, exam_id, started_at, answers, score, submitted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(submission.id)
        .bind(submission.user_id)
        .bind(submission.exam_id)
        .bind(submission.started_at)
        .bind(Json(&submission.answers))
        .bind(submission.score)
        .bind(submission.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => duplicate_submission(),
            other => other,
        })?;
        Ok(())
    }

    async fn submission_exists(&self, user_id: Uuid, exam_id: Uuid) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 FROM submissions WHERE user_id = $1 AND exam_id = $2")
            .bind(user_id)
            .bind(exam_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Submission>, AppError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE user_id = $1 ORDER BY submitted_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Submission::from).collect())
    }

    async fn list_by_exam(&self, exam_id: Uuid) -> Result<Vec<Submission>, AppError> {
        let rows = sqlx::query_as::<_, SubmissionRow>(&format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE exam_id = $1 ORDER BY submitted_at DESC"
        ))
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Submission::from).collect())
    }
}
