//! Named predicates deciding whether a discovered type is gathered.

use std::fmt;
use std::sync::Arc;

use crate::model::{Capability, TypeDescriptor};

type Predicate = dyn Fn(&TypeDescriptor) -> bool + Send + Sync;

struct Inner {
    name: String,
    predicate: Box<Predicate>,
}

/// A condition to check before gathering a type.
///
/// Cloning a `Condition` yields a handle to the *same* condition. Equality is
/// identity: two conditions built from identical names and closures are not
/// equal, while a clone is equal to its source. `Gatherer::without_condition`
/// relies on this.
#[derive(Clone)]
pub struct Condition {
    inner: Arc<Inner>,
}

impl Condition {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&TypeDescriptor) -> bool + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                predicate: Box::new(predicate),
            }),
        }
    }

    /// Built-in condition: the type declares the per-type marker.
    pub fn gathered_type() -> Self {
        Self::new("Gathered", |t| t.gathered)
    }

    /// Accepts types that declare `capability`.
    pub fn implements(capability: Capability) -> Self {
        Self::new(format!("Type {capability}"), move |t| t.implements(&capability))
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn accepts(&self, candidate: &TypeDescriptor) -> bool {
        (self.inner.predicate)(candidate)
    }

    pub fn same_as(&self, other: &Condition) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Condition {}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}
