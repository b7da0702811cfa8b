//! Instruction prompt and question construction

use localizer::FileKind;

/// Build the instruction prompt for one translation request
///
/// # Arguments
///
/// * `file_kind` - Kind of the file the fragment comes from
/// * `from` - Source locale
/// * `to` - Target locale
/// * `context` - Optional free-text context; blank context is omitted
pub fn system_prompt(file_kind: FileKind, from: &str, to: &str, context: Option<&str>) -> String {
    let context = match context.map(str::trim).filter(|c| !c.is_empty()) {
        Some(context) => format!("Context:\n\"\"\"\n{}\n\"\"\"\n\n", context),
        None => String::new(),
    };

    format!(
        "You are a professional translator. Translate the following text from a {} file from {} to {} with high accuracy.\n\n\
         {}Requirements:\n\
         - Keep the original format of the text. For Markdown, keep lists, emphasis, links and other markup exactly as they are\n\
         - Keep the tone, style and level of formality of the original\n\
         - Leave special characters and placeholders untouched\n\
         - Make the result culturally appropriate for the target language\n\
         - Translate technical terms consistently\n\n\
         Answer with the translation only, in the same format as the original, without any added text, quotes or blank lines.",
        file_kind.label(),
        from,
        to,
        context
    )
}

/// Wrap a fragment into the user question
pub fn question(fragment: &str) -> String {
    format!("Text to translate:\n\"\"\"\n{}\n\"\"\"", fragment)
}

/// Fragment carried by a question built with [`question`]
pub fn fragment_of(question: &str) -> &str {
    question
        .strip_prefix("Text to translate:\n\"\"\"\n")
        .and_then(|rest| rest.strip_suffix("\n\"\"\""))
        .unwrap_or(question)
}

/// Target locale named in a prompt built with [`system_prompt`]
pub fn target_of(system_prompt: &str) -> Option<&str> {
    let start = system_prompt.find(" file from ")? + " file from ".len();
    let rest = &system_prompt[start..];
    let to = rest.find(" to ")? + " to ".len();
    rest[to..].split_whitespace().next()
}
