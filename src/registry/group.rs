use std::sync::Arc;

use crate::harness::{Failure, TestOutcome};

/// A bound, ready-to-run test callable.
pub type UnitFn = Box<dyn FnOnce() -> TestOutcome + Send>;

type Factory<S> = Arc<dyn Fn() -> Result<S, Failure> + Send + Sync>;
type Method<S> = fn(&mut S) -> TestOutcome;

/// Type-erased view of a test group, as stored in a [`Namespace`](super::Namespace).
pub trait GroupEntry: Send + Sync {
    /// Group name, e.g. `TestTempRow`.
    fn name(&self) -> &str;

    /// Method names in registration order.
    fn methods(&self) -> Vec<&str>;

    /// Bind the method at `index` (as listed by [`methods`](Self::methods)) to
    /// fresh group state.
    ///
    /// The returned callable builds the state when it is invoked, immediately
    /// before the method runs. Returns `None` for an index out of range.
    fn bind(&self, index: usize) -> Option<UnitFn>;
}

/// A group of test methods sharing setup through a state factory.
///
/// Every method runs against its own state value; nothing is shared between
/// methods of the same group.
pub struct TestGroup<S> {
    name: String,
    factory: Factory<S>,
    methods: Vec<(String, Method<S>)>,
}

impl<S: 'static> TestGroup<S> {
    /// Create a group whose state is built by `factory`.
    ///
    /// A factory error fails the method it was building state for.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<S, Failure> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
            methods: Vec::new(),
        }
    }

    /// Create a group whose state is `S::default()`.
    pub fn with_default(name: impl Into<String>) -> Self
    where
        S: Default,
    {
        Self::new(name, || Ok(S::default()))
    }

    /// Register a method.
    pub fn method(mut self, name: impl Into<String>, method: Method<S>) -> Self {
        self.methods.push((name.into(), method));
        self
    }
}

impl<S: 'static> GroupEntry for TestGroup<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn methods(&self) -> Vec<&str> {
        self.methods.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn bind(&self, index: usize) -> Option<UnitFn> {
        let (_, func) = self.methods.get(index)?;
        let func = *func;
        let factory = Arc::clone(&self.factory);
        Some(Box::new(move || {
            let mut state = factory()?;
            func(&mut state)
        }))
    }
}
