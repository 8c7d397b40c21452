//! Strategy registry - stable names mapped to negotiator factories
//!
//! Competitors are referred to by type name in descriptors; plugins
//! register a factory under that name at startup. Lookup of an unknown
//! name is an explicit error, never reflective resolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::error::CoreError;
use crate::negotiator::{Negotiator, RandomNegotiator, TimeConceder};

/// Parameter map handed to a strategy factory.
///
/// Ordered keys keep serialized forms and identity hashes stable.
pub type ParamMap = BTreeMap<String, serde_json::Value>;

/// Builds a negotiator from a parameter map
pub type NegotiatorFactory =
    Arc<dyn Fn(&ParamMap) -> anyhow::Result<Box<dyn Negotiator>> + Send + Sync>;

fn param_f64(params: &ParamMap, key: &str) -> Option<f64> {
    params.get(key).and_then(serde_json::Value::as_f64)
}

/// Registry mapping strategy names to factories
#[derive(Clone, Default)]
pub struct Registry {
    factories: FxHashMap<String, NegotiatorFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in strategies
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("boulware", |params: &ParamMap| {
            let exponent = param_f64(params, "exponent").unwrap_or(4.0);
            Ok(Box::new(TimeConceder::with_exponent(exponent)) as Box<dyn Negotiator>)
        });
        registry.register("linear", |params: &ParamMap| {
            let exponent = param_f64(params, "exponent").unwrap_or(1.0);
            Ok(Box::new(TimeConceder::with_exponent(exponent)) as Box<dyn Negotiator>)
        });
        registry.register("conceder", |params: &ParamMap| {
            let exponent = param_f64(params, "exponent").unwrap_or(0.25);
            Ok(Box::new(TimeConceder::with_exponent(exponent)) as Box<dyn Negotiator>)
        });
        registry.register("random", |params: &ParamMap| {
            let p_end = param_f64(params, "p_end").unwrap_or(0.0005);
            let p_reject = param_f64(params, "p_reject").unwrap_or(0.9);
            Ok(Box::new(RandomNegotiator::new(p_end, p_reject)) as Box<dyn Negotiator>)
        });
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&ParamMap) -> anyhow::Result<Box<dyn Negotiator>> + Send + Sync + 'static,
    ) {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted for stable listings
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Instantiate a strategy by name.
    pub fn create(&self, name: &str, params: &ParamMap) -> anyhow::Result<Box<dyn Negotiator>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| CoreError::NotRegistered(name.to_string()))?;
        factory(params)
    }
}
