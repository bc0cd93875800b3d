use crate::domain::model::ParsedPrompt;

const SEPARATOR: &str = " in ";
const SCHOOL_MARKER: &str = "At the school ";

/// Pulls the school name and location out of a prompt shaped like
/// `"At the school <name> in <location>, ..."`.
///
/// Prompts without `" in "` yield empty fields rather than an error.
pub fn extract_prompt_info(prompt: &str) -> ParsedPrompt {
    let mut parts = prompt.split(SEPARATOR);
    let (Some(head), Some(tail)) = (parts.next(), parts.next()) else {
        return ParsedPrompt::default();
    };

    let head = head.trim_start();
    let subject_name = head.strip_prefix(SCHOOL_MARKER).unwrap_or(head).trim();

    // 只取第一個逗號之前的地點
    let location = tail.split(',').next().unwrap_or_default().trim();

    ParsedPrompt {
        subject_name: subject_name.to_string(),
        location: location.to_string(),
    }
}

/// Search query used to find a school's staff directory.
pub fn build_search_query(parsed: &ParsedPrompt) -> String {
    format!("{} {} staff directory", parsed.subject_name, parsed.location)
}
