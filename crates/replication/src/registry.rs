//! Name -> factory lookup for replication strategies.
//!
//! Persisted schema refers to strategies by name, either the fully qualified
//! one (`org.apache.cassandra.locator.SimpleStrategy`) or the short one
//! (`SimpleStrategy`). Both resolve to the same factory.
//!
//! The process-wide table is initialized in one step: either explicitly with
//! [`install`] at startup, or implicitly with the built-in strategies on the
//! first call to [`global`]. After that it is read-only.

use once_cell::sync::OnceCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use corelib::TokenMetadata;

use crate::error::{ReplicationError, Result};
use crate::options::ReplicationOptions;
use crate::strategy::{
    EverywhereStrategy, LocalStrategy, NetworkTopologyStrategy, ReplicationStrategy,
    ReplicationStrategyType, SimpleStrategy,
};

/// Builds a strategy instance from its options.
pub type StrategyFactory =
    Arc<dyn Fn(ReplicationOptions) -> Result<Arc<dyn ReplicationStrategy>> + Send + Sync>;

/// Collects factories before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    factories: BTreeMap<String, StrategyFactory>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder holding every built-in strategy.
    pub fn with_defaults() -> Result<Self> {
        Self::new()
            .register_type(ReplicationStrategyType::Local, |options| {
                Ok(Arc::new(LocalStrategy::new(options)))
            })?
            .register_type(ReplicationStrategyType::Simple, |options| {
                Ok(Arc::new(SimpleStrategy::new(options)?))
            })?
            .register_type(ReplicationStrategyType::NetworkTopology, |options| {
                Ok(Arc::new(NetworkTopologyStrategy::new(options)?))
            })?
            .register_type(ReplicationStrategyType::Everywhere, |options| {
                Ok(Arc::new(EverywhereStrategy::new(options)))
            })
    }

    /// Register `factory` under a qualified and a short name.
    ///
    /// Fails if either name is already taken; nothing is registered then.
    pub fn register<F>(mut self, qualified_name: &str, short_name: &str, factory: F) -> Result<Self>
    where
        F: Fn(ReplicationOptions) -> Result<Arc<dyn ReplicationStrategy>> + Send + Sync + 'static,
    {
        for name in [qualified_name, short_name] {
            if self.factories.contains_key(name) {
                return Err(ReplicationError::DuplicateStrategy(name.to_string()));
            }
        }
        if qualified_name == short_name {
            return Err(ReplicationError::DuplicateStrategy(short_name.to_string()));
        }

        let factory: StrategyFactory = Arc::new(factory);
        self.factories
            .insert(qualified_name.to_string(), Arc::clone(&factory));
        self.factories.insert(short_name.to_string(), factory);
        Ok(self)
    }

    /// Register under the names of a built-in type tag.
    pub fn register_type<F>(self, strategy_type: ReplicationStrategyType, factory: F) -> Result<Self>
    where
        F: Fn(ReplicationOptions) -> Result<Arc<dyn ReplicationStrategy>> + Send + Sync + 'static,
    {
        self.register(
            &strategy_type.qualified_name(),
            strategy_type.short_name(),
            factory,
        )
    }

    pub fn build(self) -> StrategyRegistry {
        StrategyRegistry {
            factories: self.factories,
        }
    }
}

/// Immutable name -> factory table.
pub struct StrategyRegistry {
    factories: BTreeMap<String, StrategyFactory>,
}

impl StrategyRegistry {
    /// Registry with the built-in strategies.
    pub fn with_defaults() -> Result<Self> {
        Ok(RegistryBuilder::with_defaults()?.build())
    }

    /// Construct and validate the strategy registered under `name`.
    pub fn create(
        &self,
        name: &str,
        options: ReplicationOptions,
    ) -> Result<Arc<dyn ReplicationStrategy>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ReplicationError::UnknownStrategy(name.to_string()))?;

        let strategy = factory(options)?;
        strategy.validate_options()?;

        tracing::trace!(name, strategy = strategy.name(), "created replication strategy");
        Ok(strategy)
    }

    /// Schema-definition-time check: create the strategy, reject options it
    /// does not recognize on the given topology, then check its replication
    /// factors against that topology.
    pub fn validate(
        &self,
        name: &str,
        options: ReplicationOptions,
        metadata: &TokenMetadata,
    ) -> Result<Arc<dyn ReplicationStrategy>> {
        let strategy = self.create(name, options)?;

        if let Some(recognized) = strategy.recognized_options(metadata.topology()) {
            if let Some(unknown) = strategy.options().keys().find(|k| !recognized.contains(*k)) {
                return Err(ReplicationError::UnrecognizedOption {
                    strategy: strategy.name().to_string(),
                    option: unknown.to_string(),
                });
            }
        }
        strategy.validate_for_topology(metadata.topology())?;
        Ok(strategy)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

static GLOBAL: OnceCell<StrategyRegistry> = OnceCell::new();

/// Install the process-wide registry. Must happen before the first read.
pub fn install(registry: StrategyRegistry) -> Result<()> {
    GLOBAL
        .set(registry)
        .map_err(|_| ReplicationError::RegistryFrozen)?;
    tracing::debug!("installed strategy registry");
    Ok(())
}

/// The process-wide registry, initialized with the built-in strategies if
/// nothing was installed.
pub fn global() -> Result<&'static StrategyRegistry> {
    GLOBAL.get_or_try_init(|| {
        tracing::debug!("initializing default strategy registry");
        StrategyRegistry::with_defaults()
    })
}

/// [`StrategyRegistry::create`] on the process-wide registry.
pub fn create(name: &str, options: ReplicationOptions) -> Result<Arc<dyn ReplicationStrategy>> {
    global()?.create(name, options)
}

/// [`StrategyRegistry::validate`] on the process-wide registry.
pub fn validate_replication_strategy(
    name: &str,
    options: ReplicationOptions,
    metadata: &TokenMetadata,
) -> Result<Arc<dyn ReplicationStrategy>> {
    global()?.validate(name, options, metadata)
}
