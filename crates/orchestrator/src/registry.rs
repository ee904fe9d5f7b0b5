//! Ordered registry of provisioning phases.

use std::collections::HashSet;

use thiserror::Error;

use crate::core::Phase;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate phase selector '{0}'")]
    Duplicate(String),
}

/// Phases in execution order. Names and checkpoint aliases share one
/// namespace, so every selector resolves to exactly one phase.
pub struct PhaseRegistry {
    phases: Vec<Box<dyn Phase>>,
}

impl PhaseRegistry {
    pub fn builder() -> PhaseRegistryBuilder {
        PhaseRegistryBuilder::default()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Phase> {
        self.phases.iter().map(|p| p.as_ref() as &dyn Phase)
    }

    pub fn get(&self, index: usize) -> Option<&dyn Phase> {
        self.phases.get(index).map(|p| p.as_ref())
    }

    /// Index of the phase a name or checkpoint alias refers to.
    pub fn position(&self, selector: &str) -> Option<usize> {
        self.phases.iter().position(|p| p.matches(selector))
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.position(selector).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        self.phases.iter().map(|p| p.name()).collect()
    }

    /// Every accepted selector, in registry order.
    pub fn selectors(&self) -> Vec<String> {
        self.phases
            .iter()
            .flat_map(|p| std::iter::once(p.name()).chain(p.checkpoint()))
            .map(str::to_string)
            .collect()
    }

    /// Just the checkpoint aliases, in registry order.
    pub fn checkpoints(&self) -> Vec<&str> {
        self.phases.iter().filter_map(|p| p.checkpoint()).collect()
    }
}

impl std::fmt::Debug for PhaseRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[derive(Default)]
pub struct PhaseRegistryBuilder {
    phases: Vec<Box<dyn Phase>>,
}

impl PhaseRegistryBuilder {
    pub fn phase(mut self, phase: impl Phase + 'static) -> Self {
        self.phases.push(Box::new(phase));
        self
    }

    pub fn boxed(mut self, phase: Box<dyn Phase>) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn build(self) -> Result<PhaseRegistry, RegistryError> {
        let mut seen = HashSet::new();
        for phase in &self.phases {
            for selector in std::iter::once(phase.name()).chain(phase.checkpoint()) {
                if !seen.insert(selector.to_string()) {
                    return Err(RegistryError::Duplicate(selector.to_string()));
                }
            }
        }
        Ok(PhaseRegistry {
            phases: self.phases,
        })
    }
}
