use crate::analyzer::{analyze, Correction};
use crate::cache::ResultCache;
use crate::config::{CacheConfig, MAX_RESULTS};
use crate::index::{IndexStats, InvertedIndex};
use crate::product::ProductSnapshot;
use crate::ranking::RankingEngine;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    #[serde(flatten)]
    pub product: ProductSnapshot,
    #[serde(rename = "_score")]
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMeta {
    pub normalized_query: String,
    pub tokens: Vec<String>,
    pub corrections_applied: Vec<Correction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub data: Vec<ScoredProduct>,
    pub meta: SearchMeta,
}

impl SearchResponse {
    fn empty_query() -> Self {
        Self { data: vec![], meta: SearchMeta { message: Some("empty query".into()), ..Default::default() } }
    }
}

#[derive(Debug, Default)]
struct SearchState {
    index: InvertedIndex,
    ranking: RankingEngine,
}

/// Owner of the index, baseline scores and result cache.
///
/// Catalog hand-offs take the state write lock, so a search sees either the
/// catalog before a change or after it, never in between. Locks are always
/// taken state first, cache second.
#[derive(Debug)]
pub struct SearchEngine {
    state: RwLock<SearchState>,
    cache: Mutex<ResultCache<Arc<SearchResponse>>>,
}

impl Default for SearchEngine {
    fn default() -> Self { Self::new(CacheConfig::default()) }
}

impl SearchEngine {
    pub fn new(cache_config: CacheConfig) -> Self {
        Self { state: RwLock::new(SearchState::default()), cache: Mutex::new(ResultCache::new(cache_config)) }
    }

    /// Bulk hand-off: replace the whole index and re-score the batch.
    pub fn load_catalog(&self, products: &[ProductSnapshot]) {
        let fresh = InvertedIndex::build(products);
        let tokens = fresh.postings.len();
        let mut state = self.state.write();
        state.index = fresh;
        state.ranking.register_products(products);
        self.cache.lock().invalidate_all();
        tracing::info!(products = products.len(), tokens, "catalog indexed");
    }

    /// Single-product hand-off after a create or update.
    pub fn upsert_product(&self, product: &ProductSnapshot) {
        let mut state = self.state.write();
        state.index.update_product(product);
        state.ranking.register_products(std::slice::from_ref(product));
        self.cache.lock().invalidate_all();
        tracing::debug!(id = %product.id, "product reindexed");
    }

    pub fn search(&self, query: &str) -> Arc<SearchResponse> {
        if query.trim().is_empty() {
            return Arc::new(SearchResponse::empty_query());
        }
        let analysis = analyze(query);
        let key = analysis.normalized_query.clone();
        if let Some(hit) = self.cache.lock().get(&key) {
            tracing::debug!(query = %key, "cache hit");
            return hit;
        }

        let state = self.state.read();
        let meta = SearchMeta {
            normalized_query: analysis.normalized_query,
            tokens: analysis.tokens,
            corrections_applied: analysis.corrections_applied,
            message: None,
        };
        if state.index.num_products() == 0 {
            return Arc::new(SearchResponse { data: vec![], meta });
        }

        let candidate_ids: HashSet<String> = state.index.query_tokens(&meta.tokens).into_iter().collect();
        let candidates: Vec<ProductSnapshot> = state
            .index
            .products
            .values()
            .filter(|p| candidate_ids.is_empty() || candidate_ids.contains(&p.id))
            .cloned()
            .collect();
        tracing::debug!(query = %key, matched = candidate_ids.len(), candidates = candidates.len(), "cache miss");

        let data = state
            .ranking
            .rank_products(&candidates, &meta.tokens, &analysis.intent)
            .into_iter()
            .take(MAX_RESULTS)
            .map(|r| ScoredProduct { product: r.product.clone(), score: r.score })
            .collect();
        let response = Arc::new(SearchResponse { data, meta });
        self.cache.lock().set(key, Arc::clone(&response));
        response
    }

    pub fn configure_cache(&self, config: CacheConfig) {
        self.cache.lock().configure(config);
    }

    pub fn invalidate_cache(&self) {
        self.cache.lock().invalidate_all();
    }

    pub fn cached_queries(&self) -> usize { self.cache.lock().len() }

    pub fn stats(&self, top: usize) -> IndexStats { self.state.read().index.stats(top) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, price: f64) -> ProductSnapshot {
        ProductSnapshot { id: id.into(), name: name.into(), sale_price: price, ..Default::default() }
    }

    #[test]
    fn whitespace_query_short_circuits() {
        let engine = SearchEngine::default();
        engine.load_catalog(&[product("a", "iPhone 16", 1.0)]);
        let res = engine.search("   ");
        assert!(res.data.is_empty());
        assert_eq!(res.meta.message.as_deref(), Some("empty query"));
        assert_eq!(engine.cached_queries(), 0);
    }

    #[test]
    fn empty_catalog_returns_meta_without_caching() {
        let engine = SearchEngine::default();
        let res = engine.search("Ifone");
        assert!(res.data.is_empty());
        assert_eq!(res.meta.tokens, vec!["iphone"]);
        assert_eq!(engine.cached_queries(), 0);
    }

    #[test]
    fn repeated_query_is_served_from_cache() {
        let engine = SearchEngine::default();
        engine.load_catalog(&[product("a", "iPhone 16", 1.0)]);
        let first = engine.search("iphone");
        let second = engine.search("  IPHONE!! ");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn upsert_invalidates_cache() {
        let engine = SearchEngine::default();
        engine.load_catalog(&[product("a", "iPhone 16", 1.0)]);
        engine.search("iphone");
        assert_eq!(engine.cached_queries(), 1);
        engine.upsert_product(&product("b", "iPhone 15", 1.0));
        assert_eq!(engine.cached_queries(), 0);
        assert_eq!(engine.search("iphone").data.len(), 2);
    }
}
