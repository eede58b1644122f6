//! Handler registry
//!
//! Insertion-ordered, immutable mapping from simulator name to handler.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{RegistryError, Result};

/// A runnable simulator entry point.
///
/// `args` are the pending arguments: every command-line token that followed
/// the simulator name, unmodified and in order.
pub trait Handler: Send + Sync {
    /// Run the handler to completion.
    fn run(&self, args: Vec<String>) -> anyhow::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(Vec<String>) -> anyhow::Result<()> + Send + Sync,
{
    fn run(&self, args: Vec<String>) -> anyhow::Result<()> {
        self(args)
    }
}

/// Read-only mapping from simulator name to handler
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: IndexMap<String, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Start building a new registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Look up the handler registered under `name`
    pub fn get(&self, name: &str) -> Option<&dyn Handler> {
        self.handlers.get(name).map(|handler| &**handler)
    }

    /// Whether a handler is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("names", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`HandlerRegistry`]
#[derive(Default)]
pub struct RegistryBuilder {
    handlers: IndexMap<String, Arc<dyn Handler>>,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("names", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl RegistryBuilder {
    /// Register `handler` under `name`.
    ///
    /// Fails if the name is empty, contains whitespace, starts with `-`
    /// (it would be parsed as a flag), or is already taken.
    pub fn register(
        mut self,
        name: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> Result<Self> {
        let name = name.into();
        validate_name(&name)?;

        if self.handlers.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        debug!(simulator = %name, "Registered simulator handler");
        self.handlers.insert(name, Arc::new(handler));
        Ok(self)
    }

    /// Freeze the registry
    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') || name.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::Mutex;

    fn noop(_: Vec<String>) -> anyhow::Result<()> {
        Ok(())
    }

    #[test]
    fn names_keep_registration_order() {
        let registry = HandlerRegistry::builder()
            .register("voltmeter", noop)
            .unwrap()
            .register("fungen", noop)
            .unwrap()
            .register("osci", noop)
            .unwrap()
            .build();

        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, ["voltmeter", "fungen", "osci"]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = HandlerRegistry::builder()
            .register("fungen", noop)
            .unwrap()
            .register("fungen", noop);

        assert_matches!(result, Err(RegistryError::DuplicateName(name)) if name == "fungen");
    }

    #[test]
    fn unselectable_names_are_rejected() {
        for name in ["", "-h", "two words", "tab\tname"] {
            let result = HandlerRegistry::builder().register(name, noop);
            assert_matches!(result, Err(RegistryError::InvalidName(_)), "name {name:?}");
        }
    }

    #[test]
    fn lookup_runs_the_registered_closure() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let registry = HandlerRegistry::builder()
            .register("wrapper", move |args: Vec<String>| -> anyhow::Result<()> {
                sink.lock().unwrap().extend(args);
                Ok(())
            })
            .unwrap()
            .build();

        assert!(registry.contains("wrapper"));
        assert!(!registry.contains("bogus"));
        assert!(registry.get("bogus").is_none());

        let handler = registry.get("wrapper").unwrap();
        handler.run(vec!["--port".into(), "5".into()]).unwrap();

        assert_eq!(*seen.lock().unwrap(), ["--port", "5"]);
    }

    #[test]
    fn empty_registry() {
        let registry = HandlerRegistry::builder().build();
        assert!(registry.is_empty());
        assert_eq!(registry.names().count(), 0);
        assert_eq!(format!("{registry:?}"), "HandlerRegistry { names: [] }");
    }
}
