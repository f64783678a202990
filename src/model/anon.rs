//! Synthetic display names for anonymous types.
//!
//! Two anonymous shapes with the same property names share one name. Names
//! are stable for the lifetime of the table and reset at the start of each
//! generation epoch by the driver, the documented reset point.

use super::types::Ty;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

#[derive(Debug, Default)]
pub struct AnonNames {
    names: FxHashMap<Vec<SmolStr>, SmolStr>,
}

impl AnonNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// The display name for an anonymous shape, assigned on first
    /// observation and reused for the session.
    pub fn name_for(&mut self, props: &[(SmolStr, Ty)]) -> SmolStr {
        let key: Vec<SmolStr> = props.iter().map(|(n, _)| n.clone()).collect();
        if let Some(name) = self.names.get(&key) {
            return name.clone();
        }
        let name: SmolStr = format!("${}", self.names.len() + 1).into();
        self.names.insert(key, name.clone());
        name
    }

    /// Clears all assigned names. Called once per generation epoch.
    pub fn reset(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
