//! Session label cleaning
//!
//! Media filenames arrive as release-style strings
//! (`The.Matrix.1999.1080p.BluRay.x264.mkv`); the label stored with log
//! records keeps the title and year and drops the rest.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn extension_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.[^.]+$").expect("static pattern"))
}

fn separators_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[._]+").expect("static pattern"))
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(19|20)\d{2}").expect("static pattern"))
}

fn trailing_punct_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]+$").expect("static pattern"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

/// Normalize a media path or filename into a display label.
///
/// Extension stripped, dot/underscore separators collapsed to spaces, text
/// truncated after the first 19xx/20xx year, trailing punctuation removed,
/// title-cased. An empty result becomes "Unknown".
pub fn clean_session_label(filename: &str) -> String {
    let base = Path::new(filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut name = extension_re().replace(&base, "").into_owned();
    name = separators_re().replace_all(&name, " ").into_owned();

    if let Some(m) = year_re().find(&name) {
        name.truncate(m.end());
    }

    name = trailing_punct_re().replace(&name, "").into_owned();
    name = whitespace_re().replace_all(&name, " ").trim().to_string();

    if name.is_empty() {
        return "Unknown".to_string();
    }
    title_case(&name)
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
