use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for the audio track language tag
///
/// Containers tag audio streams with ISO 639-2 codes, while users usually
/// type ISO 639-1 codes ("de") or bibliographic variants ("ger").
/// Everything here resolves to ISO 639-2/T.

// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Resolve a 2- or 3-letter code to a language
fn lookup(code: &str) -> Option<Language> {
    let code = code.trim().to_lowercase();
    match code.len() {
        2 => Language::from_639_1(&code),
        3 => {
            let terminological = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(b, _)| *b == code)
                .map_or(code.as_str(), |(_, t)| t);
            Language::from_639_3(terminological)
        }
        _ => None,
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    lookup(code)
        .map(|lang| lang.to_639_3().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (lookup(code1), lookup(code2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name from a code
pub fn get_language_name(code: &str) -> Result<String> {
    lookup(code)
        .map(|lang| lang.to_name().to_string())
        .ok_or_else(|| anyhow!("Invalid language code: {}", code))
}
