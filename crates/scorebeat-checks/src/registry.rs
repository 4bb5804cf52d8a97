//! Check registry - index of all configured checks

use scorebeat_core::{Check, Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of all configured checks, indexed by check id
pub struct CheckRegistry {
    checks: HashMap<String, Arc<dyn Check>>,
}

impl CheckRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            checks: HashMap::new(),
        }
    }

    /// Register a check; ids must be unique
    pub fn register(&mut self, check: Arc<dyn Check>) -> Result<()> {
        let id = check.id().to_string();
        if self.checks.contains_key(&id) {
            return Err(Error::DuplicateCheck { check_id: id });
        }
        self.checks.insert(id, check);
        Ok(())
    }

    /// Get a check by ID
    pub fn get(&self, id: &str) -> Option<Arc<dyn Check>> {
        self.checks.get(id).cloned()
    }

    /// Get all check IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.checks.keys().map(|s| s.as_str())
    }

    /// Get all checks
    pub fn all(&self) -> impl Iterator<Item = Arc<dyn Check>> + '_ {
        self.checks.values().cloned()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Checks owned by a group
    pub fn by_group(&self, group: &str) -> Vec<Arc<dyn Check>> {
        self.checks
            .values()
            .filter(|c| c.config().metadata.group == group)
            .cloned()
            .collect()
    }

    /// Checks of one type ("tcp", "udp")
    pub fn by_type(&self, check_type: &str) -> Vec<Arc<dyn Check>> {
        self.checks
            .values()
            .filter(|c| c.config().metadata.check_type.eq_ignore_ascii_case(check_type))
            .cloned()
            .collect()
    }
}

impl Default for CheckRegistry {
    fn default() -> Self {
        Self::new()
    }
}
