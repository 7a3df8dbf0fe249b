//! Multi-factor relevance model.
//!
//! A query-independent baseline (rating, sales, stock, recency) is computed
//! when products are registered. At query time it is combined with text
//! relevance and price fit over the candidate set.

use crate::analyzer::{Intent, Sentiment};
use crate::product::{finite_or_zero, ProductId, ProductSnapshot};
use serde::Serialize;
use std::collections::HashMap;
use time::OffsetDateTime;

const W_RATING: f64 = 0.20;
const W_SALES: f64 = 0.15;
const W_STOCK: f64 = 0.05;
const W_RECENCY: f64 = 0.05;

const W_TEXT: f64 = 0.40;
const W_PRICE: f64 = 0.15;
const W_BASELINE: f64 = 1.00;

/// Rating count at which the rating is fully trusted.
const RATING_CONFIDENCE_COUNT: f64 = 50.0;
/// Units in stock at which the stock signal saturates.
const STOCK_SATURATION: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub text: f64,
    pub price: f64,
    pub baseline: f64,
}

#[derive(Debug, Clone)]
pub struct RankedProduct<'a> {
    pub product: &'a ProductSnapshot,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

#[derive(Debug, Default, Clone)]
pub struct RankingEngine {
    baselines: HashMap<ProductId, f64>,
}

impl RankingEngine {
    pub fn new() -> Self { Self::default() }

    /// Recompute baselines for this batch; ids outside the batch keep their old score.
    pub fn register_products(&mut self, products: &[ProductSnapshot]) {
        self.register_products_at(products, OffsetDateTime::now_utc());
    }

    pub fn register_products_at(&mut self, products: &[ProductSnapshot], now: OffsetDateTime) {
        let max_sales = max_sales(products);
        for p in products {
            self.baselines.insert(p.id.clone(), baseline_score(p, max_sales, now));
        }
    }

    pub fn baseline(&self, id: &str) -> Option<f64> { self.baselines.get(id).copied() }

    /// Score and order every candidate, best first. Equal scores fall back to ascending id.
    pub fn rank_products<'a>(&self, candidates: &'a [ProductSnapshot], tokens: &[String], intent: &Intent) -> Vec<RankedProduct<'a>> {
        self.rank_products_at(candidates, tokens, intent, OffsetDateTime::now_utc())
    }

    pub fn rank_products_at<'a>(
        &self,
        candidates: &'a [ProductSnapshot],
        tokens: &[String],
        intent: &Intent,
        now: OffsetDateTime,
    ) -> Vec<RankedProduct<'a>> {
        let (min_price, max_price) = price_range(candidates);
        let max_sales = max_sales(candidates);
        let sentiment = intent.price.sentiment;

        let mut ranked: Vec<RankedProduct<'a>> = candidates
            .iter()
            .map(|p| {
                let breakdown = ScoreBreakdown {
                    text: text_relevance(p, tokens),
                    price: price_fit(p.price(), min_price, max_price, sentiment),
                    baseline: self
                        .baseline(&p.id)
                        .unwrap_or_else(|| baseline_score(p, max_sales, now)),
                };
                let score = W_TEXT * breakdown.text + W_PRICE * breakdown.price + W_BASELINE * breakdown.baseline;
                RankedProduct { product: p, score, breakdown }
            })
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.product.id.cmp(&b.product.id)));
        ranked
    }
}

fn max_sales(products: &[ProductSnapshot]) -> u64 {
    products.iter().map(|p| p.sales_count).max().unwrap_or(0)
}

fn price_range(products: &[ProductSnapshot]) -> (f64, f64) {
    let mut prices = products.iter().map(ProductSnapshot::price);
    let Some(first) = prices.next() else { return (0.0, 0.0) };
    prices.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)))
}

/// Fraction of query tokens found as substrings of name, brand, model and description.
pub fn text_relevance(product: &ProductSnapshot, tokens: &[String]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let hay = product.haystack();
    let hits = tokens
        .iter()
        .filter(|t| !t.is_empty() && hay.contains(t.to_lowercase().as_str()))
        .count();
    hits as f64 / tokens.len() as f64
}

/// Where the price sits in the candidate range, shaped by sentiment.
pub fn price_fit(price: f64, min: f64, max: f64, sentiment: Option<Sentiment>) -> f64 {
    if max <= min {
        return 0.0;
    }
    let pos = ((price - min) / (max - min)).clamp(0.0, 1.0);
    match sentiment {
        Some(Sentiment::Cheap) => 1.0 - pos,
        Some(Sentiment::Expensive) => pos,
        None => 1.0 - (pos - 0.5).abs() * 2.0,
    }
}

pub fn rating_score(p: &ProductSnapshot) -> f64 {
    let base = (p.rating() / 5.0).clamp(0.0, 1.0);
    let confidence = (p.rating_count as f64 / RATING_CONFIDENCE_COUNT).clamp(0.0, 1.0);
    base * (0.5 + 0.5 * confidence)
}

pub fn sales_score(p: &ProductSnapshot, max_sales: u64) -> f64 {
    if max_sales == 0 {
        return 0.0;
    }
    ((p.sales_count as f64).ln_1p() / (max_sales as f64).ln_1p()).clamp(0.0, 1.0)
}

pub fn stock_score(p: &ProductSnapshot) -> f64 {
    if !p.is_available {
        return 0.0;
    }
    (p.stock as f64 / STOCK_SATURATION).clamp(0.0, 1.0)
}

pub fn recency_score(p: &ProductSnapshot, now: OffsetDateTime) -> f64 {
    1.0 / (1.0 + p.age_days(now))
}

/// Weighted quality score in `[0, 0.45]`.
pub fn baseline_score(p: &ProductSnapshot, max_sales: u64, now: OffsetDateTime) -> f64 {
    finite_or_zero(
        W_RATING * rating_score(p)
            + W_SALES * sales_score(p, max_sales)
            + W_STOCK * stock_score(p)
            + W_RECENCY * recency_score(p, now),
    )
}
