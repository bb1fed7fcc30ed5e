// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config,
    error::AppError,
    repositories::{
        DynExamRepository, DynSubmissionRepository, DynUserRepository, ExamRepository,
        SubmissionRepository, UserRepository,
    },
    services::exam_directory::{DynExamDirectory, HttpExamDirectory, LocalExamDirectory},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: DynUserRepository,
    pub exams: DynExamRepository,
    pub submissions: DynSubmissionRepository,
    pub exam_directory: DynExamDirectory,
}

impl AppState {
    /// Wires every repository to `store` and picks the exam directory:
    /// HTTP when `EXAM_SERVICE_URL` is configured, in-process otherwise.
    pub fn new<S>(config: Config, store: Arc<S>) -> Result<Self, AppError>
    where
        S: UserRepository + ExamRepository + SubmissionRepository + 'static,
    {
        let exams: DynExamRepository = store.clone();
        let exam_directory: DynExamDirectory = match &config.exam_service_url {
            Some(url) => Arc::new(HttpExamDirectory::new(url.clone(), &config)?),
            None => Arc::new(LocalExamDirectory::new(exams.clone())),
        };

        Ok(Self {
            users: store.clone(),
            submissions: store,
            exams,
            exam_directory,
            config,
        })
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for DynUserRepository {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for DynExamRepository {
    fn from_ref(state: &AppState) -> Self {
        state.exams.clone()
    }
}

impl FromRef<AppState> for DynSubmissionRepository {
    fn from_ref(state: &AppState) -> Self {
        state.submissions.clone()
    }
}

impl FromRef<AppState> for DynExamDirectory {
    fn from_ref(state: &AppState) -> Self {
        state.exam_directory.clone()
    }
}
