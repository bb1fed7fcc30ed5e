// src/utils/html.rs

/// Clean admin-authored text with the ammonia whitelist sanitizer.
///
/// Safe formatting tags (<b>, <p>) survive; <script>, <iframe> and event
/// handler attributes are stripped. Exam descriptions and question texts
/// go through this before they are stored, since the student frontend
/// renders them.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
