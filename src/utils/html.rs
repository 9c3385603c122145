// src/utils/html.rs

/// Sanitizes admin-entered rich text (question bodies, syllabus
/// descriptions) before storage.
///
/// Whitelist-based: safe formatting tags survive, `<script>`/`<iframe>`
/// and event-handler attributes are stripped. Tests are rendered to
/// students verbatim, so stored markup must be inert.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
