//! Query understanding: normalization, spelling correction and heuristic
//! intent extraction (price bounds, color, storage, model, brand).
//!
//! Everything here is a pure function of the query text. Garbled input
//! degrades to empty tokens and `None` intent fields, never to an error.

use crate::tokenizer::normalize;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Comparison words that introduce an upper price bound.
pub const UPPER_BOUND_WORDS: &[&str] = &["under", "below", "upto", "less", "max"];
/// Comparison words that introduce a lower price bound.
pub const LOWER_BOUND_WORDS: &[&str] = &["above", "over", "more", "min"];
pub const INR_WORDS: &[&str] = &["rs", "inr", "rupees"];
pub const USD_WORDS: &[&str] = &["usd", "dollar"];

pub const BRANDS: &[&str] = &[
    "iphone", "apple", "samsung", "pixel", "google", "oneplus", "xiaomi", "redmi", "oppo", "vivo", "nokia",
];

lazy_static! {
    static ref SPELLINGS: HashMap<&'static str, &'static str> = [
        ("ifone", "iphone"),
        ("aifone", "iphone"),
        ("iphne", "iphone"),
        ("iphon", "iphone"),
        ("samsng", "samsung"),
        ("samasung", "samsung"),
        ("samusng", "samsung"),
        // already canonical, still logged as a correction
        ("pixel", "pixel"),
        ("oppo", "oppo"),
        ("xiaomi", "xiaomi"),
        ("redmi", "redmi"),
        ("onepluus", "oneplus"),
        ("oneplu", "oneplus"),
        ("nokiaa", "nokia"),
    ]
    .into_iter()
    .collect();
    static ref COLORS: HashMap<&'static str, &'static str> = [
        ("black", "black"),
        ("blue", "blue"),
        ("red", "red"),
        ("white", "white"),
        ("green", "green"),
        ("silver", "silver"),
        ("gold", "gold"),
        ("pink", "pink"),
        ("purple", "purple"),
        ("yellow", "yellow"),
        ("graphite", "graphite"),
        ("obsidian", "obsidian"),
        ("midnight", "midnight"),
        ("starlight", "starlight"),
        // colloquial Hindi
        ("kaala", "black"),
        ("neela", "blue"),
        ("lal", "red"),
        ("safed", "white"),
        ("hara", "green"),
    ]
    .into_iter()
    .collect();
    static ref SENTIMENTS: HashMap<&'static str, Sentiment> = [
        ("sasta", Sentiment::Cheap),
        ("budget", Sentiment::Cheap),
        ("mehenga", Sentiment::Expensive),
        ("mehnga", Sentiment::Expensive),
    ]
    .into_iter()
    .collect();
    static ref MAGNITUDE: Regex = Regex::new(r"^(\d+(?:\.\d+)?)(k|lakh|lac|m)?$").expect("valid regex");
    static ref FUSED_STORAGE: Regex = Regex::new(r"^(\d+)(gb|tb)$").expect("valid regex");
    static ref DIGITS: Regex = Regex::new(r"^\d+$").expect("valid regex");
    static ref MODEL_CODE: Regex = Regex::new(r"^[a-z]*\d+[a-z]*$").expect("valid regex");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Cheap,
    Expensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "INR")]
    Inr,
    #[serde(rename = "USD")]
    Usd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageUnit {
    #[serde(rename = "GB")]
    Gb,
    #[serde(rename = "TB")]
    Tb,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceIntent {
    pub min: Option<u64>,
    pub max: Option<u64>,
    pub currency: Option<Currency>,
    pub sentiment: Option<Sentiment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageIntent {
    pub value: Option<u64>,
    pub unit: Option<StorageUnit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub price: PriceIntent,
    pub color: Option<String>,
    pub storage: StorageIntent,
    pub model: Option<String>,
    pub brand: Option<String>,
}

/// Colloquial Hindi price markers spotted in the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HinglishFlags {
    pub sasta: bool,
    pub mehenga: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFlags {
    pub hinglish: HinglishFlags,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryAnalysis {
    pub normalized_query: String,
    pub tokens: Vec<String>,
    pub corrections_applied: Vec<Correction>,
    pub intent: Intent,
    pub flags: QueryFlags,
}

/// Run the full analysis pipeline over a raw query.
pub fn analyze(query: &str) -> QueryAnalysis {
    let normalized_query = normalize(query);
    let base: Vec<&str> = normalized_query.split_whitespace().collect();
    let (tokens, corrections_applied) = correct_spelling(&base);

    let flags = QueryFlags {
        hinglish: HinglishFlags {
            sasta: tokens.iter().any(|t| t == "sasta"),
            mehenga: tokens.iter().any(|t| t == "mehenga" || t == "mehnga"),
        },
    };
    let intent = Intent {
        price: extract_price(&tokens),
        color: extract_color(&tokens),
        storage: extract_storage(&tokens),
        model: extract_model(&tokens),
        brand: extract_brand(&tokens),
    };

    QueryAnalysis { normalized_query, tokens, corrections_applied, intent, flags }
}

/// Replace known misspellings with their canonical token, logging each substitution in order.
pub fn correct_spelling<S: AsRef<str>>(tokens: &[S]) -> (Vec<String>, Vec<Correction>) {
    let mut out = Vec::with_capacity(tokens.len());
    let mut corrections = Vec::new();
    for t in tokens {
        let t = t.as_ref();
        let key: String = t.chars().filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit()).collect();
        match SPELLINGS.get(key.as_str()) {
            Some(&canonical) => {
                out.push(canonical.to_string());
                corrections.push(Correction { from: t.to_string(), to: canonical.to_string() });
            }
            None => out.push(t.to_string()),
        }
    }
    (out, corrections)
}

/// Parse `20000`, `20k`, `1.5lakh`, `2m` into a whole amount.
pub fn parse_magnitude(s: &str) -> Option<u64> {
    let caps = MAGNITUDE.captures(s)?;
    let n: f64 = caps.get(1)?.as_str().parse().ok()?;
    let mult = caps.get(2).map_or(1.0, |m| multiplier(m.as_str()));
    Some((n * mult).round() as u64)
}

fn multiplier(suffix: &str) -> f64 {
    match suffix {
        "k" => 1_000.0,
        "lakh" | "lac" => 100_000.0,
        "m" => 1_000_000.0,
        _ => 1.0,
    }
}

/// Magnitude at `i`, picking up a multiplier written as its own token ("1 lakh").
fn magnitude_at<S: AsRef<str>>(tokens: &[S], i: usize) -> Option<u64> {
    let t = tokens.get(i)?.as_ref();
    let value = parse_magnitude(t)?;
    if !DIGITS.is_match(t) {
        return Some(value);
    }
    match tokens.get(i + 1).map(|s| s.as_ref()) {
        Some(next @ ("k" | "lakh" | "lac" | "m")) => Some((value as f64 * multiplier(next)).round() as u64),
        _ => Some(value),
    }
}

/// Scan for currency, sentiment and comparison-bounded amounts.
///
/// Bounds are read twice: from the token after a comparison word, and again
/// when a number is seen whose predecessor is a comparison word. Whichever
/// assignment happens last wins.
pub fn extract_price<S: AsRef<str>>(tokens: &[S]) -> PriceIntent {
    let mut price = PriceIntent::default();
    for (i, t) in tokens.iter().enumerate() {
        let t = t.as_ref();
        if INR_WORDS.contains(&t) {
            price.currency = Some(Currency::Inr);
        }
        if USD_WORDS.contains(&t) {
            price.currency = Some(Currency::Usd);
        }
        if let Some(&s) = SENTIMENTS.get(t) {
            price.sentiment = Some(s);
        }
        if UPPER_BOUND_WORDS.contains(&t) {
            if let Some(v) = magnitude_at(tokens, i + 1) {
                price.max = Some(v);
            }
        }
        if LOWER_BOUND_WORDS.contains(&t) {
            if let Some(v) = magnitude_at(tokens, i + 1) {
                price.min = Some(v);
            }
        }
        if let (Some(v), Some(prev)) = (magnitude_at(tokens, i), i.checked_sub(1).map(|p| tokens[p].as_ref())) {
            if UPPER_BOUND_WORDS.contains(&prev) {
                price.max = Some(v);
            } else if LOWER_BOUND_WORDS.contains(&prev) {
                price.min = Some(v);
            }
        }
    }
    price
}

pub fn extract_color<S: AsRef<str>>(tokens: &[S]) -> Option<String> {
    tokens.iter().find_map(|t| COLORS.get(t.as_ref()).map(|c| c.to_string()))
}

pub fn extract_storage<S: AsRef<str>>(tokens: &[S]) -> StorageIntent {
    for (i, t) in tokens.iter().enumerate() {
        let t = t.as_ref();
        if let Some(caps) = FUSED_STORAGE.captures(t) {
            if let Ok(value) = caps[1].parse() {
                return StorageIntent { value: Some(value), unit: storage_unit(&caps[2]) };
            }
        }
        if DIGITS.is_match(t) {
            let unit = tokens.get(i + 1).and_then(|u| storage_unit(u.as_ref()));
            if let (Some(unit), Ok(value)) = (unit, t.parse()) {
                return StorageIntent { value: Some(value), unit: Some(unit) };
            }
        }
    }
    StorageIntent::default()
}

fn storage_unit(s: &str) -> Option<StorageUnit> {
    match s {
        "gb" => Some(StorageUnit::Gb),
        "tb" => Some(StorageUnit::Tb),
        _ => None,
    }
}

/// `"<brand> <code>"` when a model code follows a brand within two tokens,
/// otherwise the first token shaped like a model code.
pub fn extract_model<S: AsRef<str>>(tokens: &[S]) -> Option<String> {
    for (i, t) in tokens.iter().enumerate() {
        let t = t.as_ref();
        if !BRANDS.contains(&t) {
            continue;
        }
        let code = tokens[i + 1..]
            .iter()
            .take(2)
            .map(|s| s.as_ref())
            .find(|s| MODEL_CODE.is_match(s));
        if let Some(code) = code {
            return Some(format!("{t} {code}"));
        }
    }
    tokens
        .iter()
        .map(|s| s.as_ref())
        .find(|s| MODEL_CODE.is_match(s))
        .map(str::to_string)
}

pub fn extract_brand<S: AsRef<str>>(tokens: &[S]) -> Option<String> {
    tokens.iter().map(|s| s.as_ref()).find(|t| BRANDS.contains(t)).map(str::to_string)
}
