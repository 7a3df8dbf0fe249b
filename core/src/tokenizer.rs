use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[^\p{L}\p{N}]+").expect("valid regex");
}

/// Normalize text for matching: NFKC, lowercase, currency symbols spelled out
/// as `rs` / `usd`, and every run of non-letter/non-number characters
/// collapsed to a single space.
pub fn normalize(text: &str) -> String {
    let lowered = text.nfkc().collect::<String>().to_lowercase();
    let spelled = lowered.replace('\u{20b9}', " rs ").replace('$', " usd ");
    NON_WORD.replace_all(&spelled, " ").trim().to_string()
}

/// Normalize, then split on whitespace. Shared by query analysis and indexing
/// so both sides produce the same tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
