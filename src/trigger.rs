//! Post-execution triggers.
//!
//! A trigger is a synchronous hook on a (table, method) pair, applied to the
//! result value after reshaping and before the envelope is built. Triggers are
//! registered at startup on the registry the engine is constructed with; the
//! registry is not mutated while the server runs.

use serde_json::Value;
use std::collections::HashMap;

pub type TriggerFn = Box<dyn Fn(Value) -> Value + Send + Sync>;

#[derive(Default)]
pub struct TriggerRegistry {
    // Keyed by lower-cased "table.method".
    triggers: HashMap<String, TriggerFn>,
}

impl TriggerRegistry {
    fn key(table: &str, method: &str) -> String {
        format!("{}.{}", table, method).to_lowercase()
    }

    pub fn register<F>(&mut self, table: &str, method: &str, f: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.triggers.insert(Self::key(table, method), Box::new(f));
    }

    /// Apply the matching trigger, if any, to the result.
    pub fn apply(&self, table: &str, method: &str, result: Value) -> Value {
        match self.triggers.get(&Self::key(table, method)) {
            Some(f) => f(result),
            None => result,
        }
    }
}

impl std::fmt::Debug for TriggerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerRegistry")
            .field("count", &self.triggers.len())
            .finish()
    }
}
