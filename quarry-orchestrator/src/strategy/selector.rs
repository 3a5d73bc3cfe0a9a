//! Strategy selector
//!
//! Maps a variant to a constructor. Instances are never pooled: every call to
//! [`StrategySelector::select`] builds a fresh one.

use std::collections::HashMap;
use std::sync::Arc;

use quarry_core::domain::variant::{UnsupportedVariant, Variant};

use super::{
    BoundedStrategy, ConcurrentStrategy, SequentialStrategy, Strategy, StrategyError,
    StrategySettings,
};
use crate::source::ArticleSource;

type Factory = Arc<dyn Fn() -> Arc<dyn Strategy> + Send + Sync>;

#[derive(Clone, Default)]
pub struct StrategySelector {
    factories: HashMap<Variant, Factory>,
}

impl StrategySelector {
    /// A selector with no variants registered
    pub fn empty() -> Self {
        Self::default()
    }

    /// All three variants driving the same source
    pub fn standard(source: Arc<dyn ArticleSource>, settings: StrategySettings) -> Self {
        let sequential = Arc::clone(&source);
        let bounded = Arc::clone(&source);
        let concurrent = source;
        let pool_size = settings.pool_size;
        let grace = settings.cancel_grace;
        let cap = settings.concurrency_cap;

        Self::empty()
            .register(Variant::Sequential, move || -> Arc<dyn Strategy> {
                Arc::new(SequentialStrategy::new(Arc::clone(&sequential)))
            })
            .register(Variant::Bounded, move || -> Arc<dyn Strategy> {
                Arc::new(BoundedStrategy::new(Arc::clone(&bounded), pool_size, grace))
            })
            .register(Variant::Concurrent, move || -> Arc<dyn Strategy> {
                Arc::new(ConcurrentStrategy::new(Arc::clone(&concurrent), cap))
            })
    }

    pub fn register<F>(mut self, variant: Variant, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Strategy> + Send + Sync + 'static,
    {
        self.factories.insert(variant, Arc::new(factory));
        self
    }

    /// Build a new strategy for `variant`
    pub fn select(&self, variant: Variant) -> Result<Arc<dyn Strategy>, StrategyError> {
        let factory = self
            .factories
            .get(&variant)
            .ok_or_else(|| UnsupportedVariant(variant.to_string()))?;
        Ok(factory())
    }

    /// Registered variants in display order
    pub fn variants(&self) -> Vec<Variant> {
        Variant::ALL
            .into_iter()
            .filter(|v| self.factories.contains_key(v))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedSource;
    use std::time::Duration;

    fn selector() -> StrategySelector {
        let source = Arc::new(ScriptedSource::new(1, Duration::ZERO));
        StrategySelector::standard(source, StrategySettings::default())
    }

    #[test]
    fn test_select_known_variants() {
        let selector = selector();
        for variant in Variant::ALL {
            assert_eq!(selector.select(variant).unwrap().variant(), variant);
        }
        assert_eq!(selector.variants(), Variant::ALL.to_vec());
    }

    #[test]
    fn test_unregistered_variant_fails_closed() {
        let source = Arc::new(ScriptedSource::new(1, Duration::ZERO));
        let selector = StrategySelector::empty().register(
            Variant::Sequential,
            move || -> Arc<dyn Strategy> { Arc::new(SequentialStrategy::new(source.clone())) },
        );

        let err = selector.select(Variant::Bounded).err().unwrap();
        assert!(matches!(err, StrategyError::Unsupported(_)));
        assert_eq!(selector.variants(), vec![Variant::Sequential]);
    }

    #[tokio::test]
    async fn test_instances_are_fresh() {
        let selector = selector();
        let first = selector.select(Variant::Sequential).unwrap();
        first
            .run("pymes", tokio_util::sync::CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(first.partial().len(), 1);

        let second = selector.select(Variant::Sequential).unwrap();
        assert!(second.partial().is_empty());
    }
}
