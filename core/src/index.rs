use crate::analyzer::{INR_WORDS, LOWER_BOUND_WORDS, UPPER_BOUND_WORDS, USD_WORDS};
use crate::config::MAX_CANDIDATES;
use crate::product::{ProductId, ProductSnapshot};
use crate::tokenizer::tokenize;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Comparison and currency words carry intent, not product content; they never select candidates.
fn is_stopword(token: &str) -> bool {
    UPPER_BOUND_WORDS.contains(&token)
        || LOWER_BOUND_WORDS.contains(&token)
        || INR_WORDS.contains(&token)
        || USD_WORDS.contains(&token)
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenFrequency {
    pub token: String,
    pub doc_freq: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub products: usize,
    pub tokens: usize,
    pub top_tokens: Vec<TokenFrequency>,
}

/// Token → product-id postings over the weighted product fields, plus the
/// latest snapshot seen for every indexed product.
#[derive(Debug, Default, Clone)]
pub struct InvertedIndex {
    pub postings: HashMap<String, BTreeSet<ProductId>>,
    pub doc_freq: HashMap<String, u32>,
    /// Ordered by id so that full-catalog fallbacks and candidate lists are deterministic.
    pub products: BTreeMap<ProductId, ProductSnapshot>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Fresh index over `products`. Nothing from a previous index survives.
    pub fn build<'a, I>(products: I) -> Self
    where
        I: IntoIterator<Item = &'a ProductSnapshot>,
    {
        let mut index = Self::new();
        for p in products {
            index.index_product(p);
        }
        index
    }

    pub fn index_product(&mut self, product: &ProductSnapshot) {
        let mut seen_in_doc: HashSet<String> = HashSet::new();
        for field in product.indexed_fields() {
            for token in tokenize(field) {
                if seen_in_doc.contains(&token) { continue; }
                if self.postings.entry(token.clone()).or_default().insert(product.id.clone()) {
                    *self.doc_freq.entry(token.clone()).or_insert(0) += 1;
                }
                seen_in_doc.insert(token);
            }
        }
        self.products.insert(product.id.clone(), product.clone());
    }

    /// Additive re-index. Postings from the product's previous field values are kept.
    pub fn update_product(&mut self, product: &ProductSnapshot) {
        self.index_product(product);
    }

    /// Product ids ranked by how many query tokens they contain, ties by ascending id,
    /// capped at [`MAX_CANDIDATES`]. Empty when no non-stopword token is left.
    pub fn query_tokens<S: AsRef<str>>(&self, tokens: &[S]) -> Vec<ProductId> {
        let mut tally: HashMap<&ProductId, u32> = HashMap::new();
        for t in tokens.iter().map(|t| t.as_ref()) {
            if t.is_empty() || is_stopword(t) { continue; }
            if let Some(ids) = self.postings.get(t) {
                for id in ids {
                    *tally.entry(id).or_insert(0) += 1;
                }
            }
        }
        let mut scored: Vec<(&ProductId, u32)> = tally.into_iter().collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        scored.into_iter().take(MAX_CANDIDATES).map(|(id, _)| id.clone()).collect()
    }

    pub fn doc_frequency(&self, token: &str) -> u32 {
        self.doc_freq.get(token).copied().unwrap_or(0)
    }

    pub fn get(&self, id: &str) -> Option<&ProductSnapshot> { self.products.get(id) }

    pub fn num_products(&self) -> usize { self.products.len() }

    pub fn stats(&self, top: usize) -> IndexStats {
        let mut freqs: Vec<TokenFrequency> = self
            .doc_freq
            .iter()
            .map(|(token, &doc_freq)| TokenFrequency { token: token.clone(), doc_freq })
            .collect();
        freqs.sort_by(|a, b| b.doc_freq.cmp(&a.doc_freq).then_with(|| a.token.cmp(&b.token)));
        freqs.truncate(top);
        IndexStats { products: self.products.len(), tokens: self.postings.len(), top_tokens: freqs }
    }
}
