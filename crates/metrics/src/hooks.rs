//! Hooks run right before each scrape.

use std::{fmt, sync::Arc};

/// A closure executed before metrics are rendered.
pub trait Hook: Fn() + Send + Sync + 'static {}
impl<T: Fn() + Send + Sync + 'static> Hook for T {}

/// A builder for creating hooks
#[derive(Clone, Default)]
pub struct HooksBuilder {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HooksBuilder {
    /// Create a new hooks builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook to the builder
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Hook,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Build the hooks
    pub fn build(self) -> Hooks {
        Hooks { hooks: self.hooks }
    }
}

impl fmt::Debug for HooksBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HooksBuilder").field("hooks", &self.hooks.len()).finish()
    }
}

/// Collection of metrics hooks
#[derive(Clone, Default)]
pub struct Hooks {
    hooks: Vec<Arc<dyn Hook>>,
}

impl Hooks {
    /// Create a new hooks builder
    pub fn builder() -> HooksBuilder {
        HooksBuilder::new()
    }

    /// Add a hook
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Hook,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Execute all hooks
    pub fn execute_all(&self) {
        for hook in &self.hooks {
            hook();
        }
    }

    /// Returns the number of hooks
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns true if there are no hooks
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("hooks", &self.hooks.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_execute_all_runs_every_hook() {
        let calls = Arc::new(AtomicUsize::new(0));
        let first = calls.clone();
        let second = calls.clone();

        let hooks = Hooks::builder()
            .with_hook(move || {
                first.fetch_add(1, Ordering::Relaxed);
            })
            .build()
            .with_hook(move || {
                second.fetch_add(10, Ordering::Relaxed);
            });

        assert_eq!(hooks.len(), 2);
        hooks.execute_all();
        hooks.execute_all();
        assert_eq!(calls.load(Ordering::Relaxed), 22);
    }
}
