// src/services/mod.rs

pub mod exam_directory;
pub mod grading;
