use crate::lenient;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub type ProductId = String;

/// Read-only view of a catalog product as handed to the search core.
///
/// The catalog owns validation; every field falls back to a default, and
/// `null` or mistyped values read as that default, so partially populated
/// records can still be indexed and ranked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductSnapshot {
    #[serde(deserialize_with = "lenient::string")]
    pub id: ProductId,
    #[serde(deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(deserialize_with = "lenient::string")]
    pub brand: String,
    #[serde(deserialize_with = "lenient::string")]
    pub model: String,
    #[serde(deserialize_with = "lenient::string")]
    pub category: String,
    #[serde(deserialize_with = "lenient::string")]
    pub currency: String,
    #[serde(deserialize_with = "lenient::float")]
    pub list_price: f64,
    #[serde(deserialize_with = "lenient::float")]
    pub discount_percent: f64,
    #[serde(deserialize_with = "lenient::float")]
    pub sale_price: f64,
    #[serde(deserialize_with = "lenient::string")]
    pub sku: String,
    #[serde(deserialize_with = "lenient::count")]
    pub stock: u64,
    #[serde(deserialize_with = "lenient::flag")]
    pub is_available: bool,
    #[serde(deserialize_with = "lenient::float")]
    pub average_rating: f64,
    #[serde(deserialize_with = "lenient::count")]
    pub rating_count: u64,
    #[serde(deserialize_with = "lenient::count")]
    pub sales_count: u64,
    #[serde(deserialize_with = "lenient::string")]
    pub ram: String,
    #[serde(deserialize_with = "lenient::string")]
    pub storage: String,
    #[serde(deserialize_with = "lenient::string")]
    pub color: String,
    #[serde(deserialize_with = "lenient::string")]
    pub screen_size: String,
    #[serde(serialize_with = "time::serde::rfc3339::option::serialize", deserialize_with = "lenient::timestamp")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(serialize_with = "time::serde::rfc3339::option::serialize", deserialize_with = "lenient::timestamp")]
    pub updated_at: Option<OffsetDateTime>,
}

impl ProductSnapshot {
    /// Fields that feed the inverted index, in indexing order.
    pub fn indexed_fields(&self) -> [&str; 6] {
        [&self.name, &self.brand, &self.model, &self.description, &self.color, &self.storage]
    }

    /// Lowercased name + brand + model + description, used for substring relevance.
    pub fn haystack(&self) -> String {
        [&self.name, &self.brand, &self.model, &self.description]
            .iter()
            .map(|s| s.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn price(&self) -> f64 { finite_or_zero(self.sale_price) }

    pub fn rating(&self) -> f64 { finite_or_zero(self.average_rating) }

    /// Whole days since the last update, never negative. A missing timestamp counts as fresh.
    pub fn age_days(&self, now: OffsetDateTime) -> f64 {
        match self.updated_at {
            Some(updated) => ((now - updated).as_seconds_f64() / 86_400.0).max(0.0),
            None => 0.0,
        }
    }
}

#[inline]
pub(crate) fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() { x } else { 0.0 }
}
