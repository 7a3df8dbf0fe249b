//! Product search core: query analysis, token index, relevance ranking and
//! a TTL result cache, tied together by [`SearchEngine`].

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod engine;
pub mod index;
pub mod lenient;
pub mod loader;
pub mod product;
pub mod ranking;
pub mod tokenizer;

pub use analyzer::{analyze, QueryAnalysis};
pub use config::CacheConfig;
pub use engine::{ScoredProduct, SearchEngine, SearchMeta, SearchResponse};
pub use index::{IndexStats, InvertedIndex};
pub use product::{ProductId, ProductSnapshot};
pub use ranking::RankingEngine;
