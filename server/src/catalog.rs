//! In-memory product catalog. Validates incoming drafts, derives pricing and
//! availability, and hands finished snapshots to the search engine.

use crate::error::ApiError;
use parking_lot::RwLock;
use serde::Deserialize;
use shopsearch_core::lenient;
use shopsearch_core::{ProductId, ProductSnapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use time::OffsetDateTime;

/// Product as submitted by a client. Required fields are checked by [`ProductDraft::validate`].
///
/// A text field that is not a JSON string reads as absent. A numeric field
/// that is present but not a JSON number reads as NaN, which validation
/// reports by field name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
    #[serde(deserialize_with = "lenient::text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub brand: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub model: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub currency: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub list_price: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub discount_percent: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub sale_price: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub sku: Option<String>,
    #[serde(deserialize_with = "lenient::number")]
    pub stock: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub average_rating: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub rating_count: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub sales_count: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub ram: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub storage: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub color: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub screen_size: Option<String>,
}

/// Editable descriptive fields. Pricing and inventory are not touched by metadata updates.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataUpdate {
    #[serde(deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub brand: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub model: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub ram: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub storage: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub color: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub screen_size: Option<String>,
}

fn non_empty(v: &Option<String>) -> bool {
    v.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn finite(v: Option<f64>) -> bool {
    v.is_some_and(f64::is_finite)
}

fn count(v: Option<f64>) -> u64 {
    v.filter(|n| n.is_finite()).map_or(0, |n| n.max(0.0) as u64)
}

impl ProductDraft {
    pub fn validate(&self) -> Result<(), ApiError> {
        let required = [
            ("name", &self.name),
            ("brand", &self.brand),
            ("category", &self.category),
            ("currency", &self.currency),
            ("sku", &self.sku),
        ];
        for (field, value) in required {
            if !non_empty(value) {
                return Err(ApiError::BadRequest(format!("Invalid {field}")));
            }
        }
        if !finite(self.list_price) {
            return Err(ApiError::BadRequest("Invalid listPrice".into()));
        }
        if self.discount_percent.is_some() && !finite(self.discount_percent) {
            return Err(ApiError::BadRequest("Invalid discountPercent".into()));
        }
        if !finite(self.stock) {
            return Err(ApiError::BadRequest("Invalid stock".into()));
        }
        Ok(())
    }

    /// Derive the stored snapshot: clamped discount and rating, computed sale price, availability.
    pub fn into_snapshot(self, id: ProductId, now: OffsetDateTime) -> ProductSnapshot {
        let list_price = self.list_price.filter(|n| n.is_finite()).unwrap_or(0.0);
        let discount_percent = self.discount_percent.filter(|n| n.is_finite()).unwrap_or(0.0).clamp(0.0, 100.0);
        let sale_price = self
            .sale_price
            .filter(|n| n.is_finite())
            .unwrap_or_else(|| (list_price - list_price * discount_percent / 100.0).max(0.0));
        let stock = count(self.stock);
        ProductSnapshot {
            id,
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            brand: self.brand.unwrap_or_default(),
            model: self.model.unwrap_or_default(),
            category: self.category.unwrap_or_else(|| "electronics".into()),
            currency: self.currency.unwrap_or_else(|| "USD".into()),
            list_price,
            discount_percent,
            sale_price,
            sku: self.sku.unwrap_or_default(),
            stock,
            is_available: stock > 0,
            average_rating: self.average_rating.filter(|n| n.is_finite()).unwrap_or(0.0).clamp(0.0, 5.0),
            rating_count: count(self.rating_count),
            sales_count: count(self.sales_count),
            ram: self.ram.unwrap_or_default(),
            storage: self.storage.unwrap_or_default(),
            color: self.color.unwrap_or_default(),
            screen_size: self.screen_size.unwrap_or_default(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }
}

impl MetadataUpdate {
    pub fn apply(self, product: &mut ProductSnapshot, now: OffsetDateTime) {
        let fields = [
            (self.name, &mut product.name),
            (self.description, &mut product.description),
            (self.brand, &mut product.brand),
            (self.model, &mut product.model),
            (self.category, &mut product.category),
            (self.ram, &mut product.ram),
            (self.storage, &mut product.storage),
            (self.color, &mut product.color),
            (self.screen_size, &mut product.screen_size),
        ];
        for (value, slot) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }
        product.updated_at = Some(now);
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    products: RwLock<HashMap<ProductId, ProductSnapshot>>,
    next_seq: AtomicU64,
}

impl Catalog {
    pub fn new() -> Self { Self::default() }

    pub fn seed(&self, products: Vec<ProductSnapshot>) {
        let mut store = self.products.write();
        for p in products {
            store.insert(p.id.clone(), p);
        }
    }

    pub fn add(&self, draft: ProductDraft) -> Result<ProductSnapshot, ApiError> {
        draft.validate()?;
        let now = OffsetDateTime::now_utc();
        let id = match draft.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.generate_id(now),
        };
        let product = draft.into_snapshot(id, now);
        self.products.write().insert(product.id.clone(), product.clone());
        Ok(product)
    }

    pub fn update_metadata(&self, id: &str, update: MetadataUpdate) -> Result<ProductSnapshot, ApiError> {
        let mut store = self.products.write();
        let product = store.get_mut(id).ok_or_else(|| ApiError::NotFound("Product not found".into()))?;
        update.apply(product, OffsetDateTime::now_utc());
        Ok(product.clone())
    }

    pub fn get(&self, id: &str) -> Option<ProductSnapshot> { self.products.read().get(id).cloned() }

    pub fn all(&self) -> Vec<ProductSnapshot> {
        let mut products: Vec<_> = self.products.read().values().cloned().collect();
        products.sort_by(|a, b| a.id.cmp(&b.id));
        products
    }

    pub fn len(&self) -> usize { self.products.read().len() }

    pub fn is_empty(&self) -> bool { self.products.read().is_empty() }

    fn generate_id(&self, now: OffsetDateTime) -> ProductId {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let millis = (now.unix_timestamp_nanos() / 1_000_000) as u64;
        format!("prod_{millis:x}{seq:04x}")
    }
}
