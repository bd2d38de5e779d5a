//! Registry - The collection of fixtures known to a process
//!
//! Fixtures are registered explicitly, once each, usually from a startup
//! routine that walks a fixed list of factories. Registration order is
//! execution order. Identifiers (`group/name`) are unique.

use std::collections::HashMap;

use thiserror::Error;
use tracing::trace;

use crate::error_log::DEFAULT_MESSAGE_SPACE;
use crate::fixture::{Fixture, FixtureId, TestCase};

/// Errors that can occur while registering fixtures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A fixture with the same group and name is already registered
    #[error("fixture '{id}' is already registered")]
    Duplicate { id: FixtureId },

    /// The test reported an empty name
    #[error("fixture in group '{group}' has an empty name")]
    EmptyName { group: String },
}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Builds one test instance.
pub type FixtureFactory = fn() -> Box<dyn TestCase>;

/// Every registered fixture, in registration order.
#[derive(Debug)]
pub struct Registry {
    fixtures: Vec<Fixture>,
    index: HashMap<FixtureId, usize>,
    message_space: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry with the default per-fixture message space
    pub fn new() -> Self {
        Self {
            fixtures: Vec::new(),
            index: HashMap::new(),
            message_space: DEFAULT_MESSAGE_SPACE,
        }
    }

    /// Set the message space given to fixtures registered from now on
    pub fn with_message_space(mut self, bytes: usize) -> Self {
        self.message_space = bytes;
        self
    }

    /// Build a registry from a fixed list of factories
    pub fn from_factories(factories: &[FixtureFactory]) -> RegistryResult<Self> {
        let mut registry = Self::new();
        registry.register_factories(factories)?;
        Ok(registry)
    }

    /// Register every factory in order, stopping at the first error
    pub fn register_factories(&mut self, factories: &[FixtureFactory]) -> RegistryResult<()> {
        for factory in factories {
            self.register_boxed(factory())?;
        }
        Ok(())
    }

    /// Register a test
    pub fn register<T: TestCase + 'static>(&mut self, case: T) -> RegistryResult<&mut Fixture> {
        self.register_boxed(Box::new(case))
    }

    /// Register an already boxed test
    pub fn register_boxed(&mut self, case: Box<dyn TestCase>) -> RegistryResult<&mut Fixture> {
        if case.name().is_empty() {
            return Err(RegistryError::EmptyName {
                group: case.group().to_string(),
            });
        }
        let fixture = Fixture::from_boxed(case, self.message_space);
        if self.index.contains_key(fixture.id()) {
            return Err(RegistryError::Duplicate {
                id: fixture.id().clone(),
            });
        }

        trace!(fixture = %fixture.id(), "registered fixture");
        let position = self.fixtures.len();
        self.index.insert(fixture.id().clone(), position);
        self.fixtures.push(fixture);
        Ok(&mut self.fixtures[position])
    }

    /// Number of registered fixtures
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    /// Message space given to newly registered fixtures
    pub fn message_space(&self) -> usize {
        self.message_space
    }

    /// Look up a fixture by group and name
    pub fn get(&self, group: &str, name: &str) -> Option<&Fixture> {
        let position = *self.index.get(&FixtureId::new(group, name))?;
        self.fixtures.get(position)
    }

    /// Look up a fixture by group and name, mutably
    pub fn get_mut(&mut self, group: &str, name: &str) -> Option<&mut Fixture> {
        let position = *self.index.get(&FixtureId::new(group, name))?;
        self.fixtures.get_mut(position)
    }

    /// Iterate fixtures in registration order
    pub fn iter(&self) -> std::slice::Iter<'_, Fixture> {
        self.fixtures.iter()
    }

    /// Iterate fixtures mutably in registration order
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Fixture> {
        self.fixtures.iter_mut()
    }

    /// All fixtures as a slice, e.g. to hand disjoint parts to other threads
    pub fn fixtures_mut(&mut self) -> &mut [Fixture] {
        &mut self.fixtures
    }

    /// Identifiers in registration order
    pub fn ids(&self) -> impl Iterator<Item = &FixtureId> {
        self.fixtures.iter().map(Fixture::id)
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = &'a Fixture;
    type IntoIter = std::slice::Iter<'a, Fixture>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut Registry {
    type Item = &'a mut Fixture;
    type IntoIter = std::slice::IterMut<'a, Fixture>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
