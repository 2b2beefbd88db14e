//! Process-wide capability registry.
//!
//! # Responsibility
//! - Accept registration/deregistration of capability providers at any time.
//! - Answer discovery queries with a point-in-time snapshot.
//!
//! # Invariants
//! - Provider ids are unique, non-empty, lowercase ascii/digits/`._-`.
//! - Discovery never holds the registry lock while calling into providers.
//! - A provider panic fails the whole discovery call; it never escapes it.

use crate::action::descriptor::{ActionDescriptor, SelectorContext};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

static GLOBAL_REGISTRY: Lazy<CapabilityRegistry> = Lazy::new(CapabilityRegistry::new);

/// A component that can act on notes matching its own criterion.
pub trait CapabilityProvider: Send + Sync {
    fn provider_id(&self) -> &str;
    fn matches(&self, context: &SelectorContext) -> bool;
    fn describe(&self) -> ActionDescriptor;
}

/// Discovery contract consumed by the resolver.
///
/// Must be cheap, repeatable, and must not mutate provider state.
pub trait CapabilityDiscovery {
    fn discover(&self, context: &SelectorContext) -> Result<Vec<ActionDescriptor>, DiscoveryError>;
}

/// Discovery failure. Recovered by the resolver, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    RegistryPoisoned,
    ProviderPanicked(String),
}

impl Display for DiscoveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegistryPoisoned => write!(f, "capability registry is poisoned"),
            Self::ProviderPanicked(id) => {
                write!(f, "capability provider panicked during discovery: {id}")
            }
        }
    }
}

impl Error for DiscoveryError {}

/// Registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    InvalidProviderId(String),
    DuplicateProviderId(String),
    RegistryPoisoned,
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidProviderId(value) => write!(f, "provider id is invalid: {value}"),
            Self::DuplicateProviderId(value) => {
                write!(f, "provider id already registered: {value}")
            }
            Self::RegistryPoisoned => write!(f, "capability registry is poisoned"),
        }
    }
}

impl Error for RegistryError {}

/// Thread-safe registry of capability providers.
#[derive(Default)]
pub struct CapabilityRegistry {
    providers: RwLock<BTreeMap<String, Arc<dyn CapabilityProvider>>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared registry any component can register with.
    pub fn global() -> &'static CapabilityRegistry {
        &GLOBAL_REGISTRY
    }

    pub fn register(&self, provider: Arc<dyn CapabilityProvider>) -> Result<(), RegistryError> {
        let provider_id = provider.provider_id().trim().to_string();
        if !is_valid_provider_id(&provider_id) {
            return Err(RegistryError::InvalidProviderId(provider_id));
        }

        let mut providers = self
            .providers
            .write()
            .map_err(|_| RegistryError::RegistryPoisoned)?;
        if providers.contains_key(provider_id.as_str()) {
            return Err(RegistryError::DuplicateProviderId(provider_id));
        }
        providers.insert(provider_id, provider);
        Ok(())
    }

    /// Removes a provider; returns whether it was registered.
    pub fn unregister(&self, provider_id: &str) -> Result<bool, RegistryError> {
        let mut providers = self
            .providers
            .write()
            .map_err(|_| RegistryError::RegistryPoisoned)?;
        Ok(providers.remove(provider_id.trim()).is_some())
    }

    /// Sorted ids of currently registered providers.
    pub fn provider_ids(&self) -> Vec<String> {
        self.providers
            .read()
            .map(|providers| providers.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.providers
            .read()
            .map(|providers| providers.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Result<Vec<Arc<dyn CapabilityProvider>>, DiscoveryError> {
        let providers = self
            .providers
            .read()
            .map_err(|_| DiscoveryError::RegistryPoisoned)?;
        Ok(providers.values().cloned().collect())
    }
}

impl CapabilityDiscovery for CapabilityRegistry {
    fn discover(&self, context: &SelectorContext) -> Result<Vec<ActionDescriptor>, DiscoveryError> {
        let mut found = Vec::new();
        for provider in self.snapshot()? {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                provider.matches(context).then(|| provider.describe())
            }));
            match outcome {
                Ok(Some(descriptor)) => found.push(descriptor),
                Ok(None) => {}
                Err(_) => {
                    return Err(DiscoveryError::ProviderPanicked(
                        provider.provider_id().to_string(),
                    ))
                }
            }
        }
        Ok(found)
    }
}

impl<D: CapabilityDiscovery + ?Sized> CapabilityDiscovery for &D {
    fn discover(&self, context: &SelectorContext) -> Result<Vec<ActionDescriptor>, DiscoveryError> {
        (**self).discover(context)
    }
}

impl<D: CapabilityDiscovery + ?Sized> CapabilityDiscovery for Arc<D> {
    fn discover(&self, context: &SelectorContext) -> Result<Vec<ActionDescriptor>, DiscoveryError> {
        (**self).discover(context)
    }
}

/// Criterion a `StaticCapability` matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchCriterion {
    /// Any single selected note.
    AnyNote,
    /// A single note in the given category.
    Category(String),
    /// The whole collection (no selection).
    Collection,
}

impl MatchCriterion {
    pub fn matches(&self, context: &SelectorContext) -> bool {
        match (self, context) {
            (Self::AnyNote, SelectorContext::Single(_)) => true,
            (Self::Category(name), SelectorContext::Single(note)) => {
                note.category.as_deref() == Some(name.as_str())
            }
            (Self::Collection, SelectorContext::NoSelection) => true,
            _ => false,
        }
    }
}

/// Provider offering one fixed descriptor under one criterion.
#[derive(Debug, Clone)]
pub struct StaticCapability {
    provider_id: String,
    criterion: MatchCriterion,
    descriptor: ActionDescriptor,
}

impl StaticCapability {
    pub fn new(
        provider_id: impl Into<String>,
        criterion: MatchCriterion,
        descriptor: ActionDescriptor,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            criterion,
            descriptor,
        }
    }
}

impl CapabilityProvider for StaticCapability {
    fn provider_id(&self) -> &str {
        &self.provider_id
    }

    fn matches(&self, context: &SelectorContext) -> bool {
        self.criterion.matches(context)
    }

    fn describe(&self) -> ActionDescriptor {
        self.descriptor.clone()
    }
}

fn is_valid_provider_id(value: &str) -> bool {
    !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-')
        })
}
