use ladle::api::EnumValue;
use ladle::recipe_json::CatalogIngredient;
use quick_cache::sync::Cache;
use quick_cache::Weighter;
use std::sync::Arc;

pub type LadleCache = Arc<Cache<CacheQuery, CacheValue, ValueWeighter>>;

pub fn new_cache() -> LadleCache {
    Arc::new(Cache::with_weighter(16, 1 << 20, ValueWeighter))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheQuery {
    Catalog,
    EnumList { category: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum CacheValue {
    Catalog(Vec<CatalogIngredient>),
    EnumList(Vec<EnumValue>),
}

#[derive(Clone)]
pub struct ValueWeighter;

impl Weighter<CacheQuery, CacheValue> for ValueWeighter {
    fn weight(&self, _key: &CacheQuery, val: &CacheValue) -> u64 {
        // Rough per-entry cost; these lists are small and read-mostly.
        match val {
            CacheValue::Catalog(items) => (items.len() as u64 + 1) * 64,
            CacheValue::EnumList(values) => (values.len() as u64 + 1) * 16,
        }
    }
}
