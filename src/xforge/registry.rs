//! The Rule Registry (spec §4.A): two name-keyed maps, no ordering. This
//! replaces the original's two process-global `dict`s (`sources`,
//! `targets`) with a value owned by a [`crate::context::BuildContext`] so
//! tests can construct an isolated registry per case instead of sharing
//! mutable module state.

use crate::model::{Source, Target};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct Registry {
    sources: HashMap<String, Source>,
    targets: HashMap<String, Target>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Registers a source, silently replacing any prior entry with the
    /// same name (spec §4.A: "registering a Source with an existing name
    /// replaces it silently").
    pub fn define_source(&mut self, source: Source) {
        self.sources.insert(source.name.clone(), source);
    }

    /// Registers a target, replacing any prior entry with the same name
    /// and logging the override (spec §4.A / §7 `TargetOverride`).
    pub fn define_target(&mut self, target: Target) {
        if self.targets.contains_key(&target.name) {
            log::warn!("overriding target `{}`", target.name);
        }
        self.targets.insert(target.name.clone(), target);
    }

    pub fn source(&self, name: &str) -> Option<&Source> {
        self.sources.get(name)
    }

    pub fn source_mut(&mut self, name: &str) -> Option<&mut Source> {
        self.sources.get_mut(name)
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn target_mut(&mut self, name: &str) -> Option<&mut Target> {
        self.targets.get_mut(name)
    }

    pub fn has_source(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn has_target(&self, name: &str) -> bool {
        self.targets.contains_key(name)
    }

    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.sources.values()
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}
