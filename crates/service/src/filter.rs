//! Filter extension point for list operations.
//!
//! Each service is given a `FilterBuilder` whose output type matches what its
//! repository consumes: composable `Predicate`s for in-process stores, query
//! conditions for SQL-backed ones.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Builds the repository filter for a list input.
pub trait FilterBuilder<L: ?Sized>: Send + Sync {
    type Filter: Send;

    fn build_filter(&self, input: &L) -> Self::Filter;
}

/// Filters that have a "match everything" value.
pub trait MatchAllFilter {
    fn match_all() -> Self;
}

/// Builder that never restricts results.
pub struct MatchAll<T>(PhantomData<fn() -> T>);

impl<T> MatchAll<T> {
    pub fn new() -> Self { Self(PhantomData) }
}

impl<T> Default for MatchAll<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Clone for MatchAll<T> {
    fn clone(&self) -> Self { Self::new() }
}

impl<L: ?Sized, T: MatchAllFilter + Send> FilterBuilder<L> for MatchAll<T> {
    type Filter = T;

    fn build_filter(&self, _input: &L) -> T { T::match_all() }
}

/// Adapts a closure into a `FilterBuilder`.
#[derive(Clone)]
pub struct FilterFn<F>(pub F);

impl<L: ?Sized, T: Send, F> FilterBuilder<L> for FilterFn<F>
where
    F: Fn(&L) -> T + Send + Sync,
{
    type Filter = T;

    fn build_filter(&self, input: &L) -> T { (self.0)(input) }
}

/// Boolean test over an entity, cheap to clone and combine.
pub struct Predicate<E> {
    test: Arc<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E: 'static> Predicate<E> {
    pub fn new(test: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self { test: Arc::new(test) }
    }

    pub fn all() -> Self { Self::new(|_| true) }

    pub fn test(&self, entity: &E) -> bool { (self.test)(entity) }

    pub fn and(self, other: Predicate<E>) -> Self {
        Self::new(move |e| self.test(e) && other.test(e))
    }

    pub fn or(self, other: Predicate<E>) -> Self {
        Self::new(move |e| self.test(e) || other.test(e))
    }

    pub fn not(self) -> Self {
        Self::new(move |e| !self.test(e))
    }

    /// `and` with a predicate only when one is given.
    pub fn and_option(self, other: Option<Predicate<E>>) -> Self {
        match other {
            Some(p) => self.and(p),
            None => self,
        }
    }
}

impl<E> Clone for Predicate<E> {
    fn clone(&self) -> Self { Self { test: Arc::clone(&self.test) } }
}

impl<E> fmt::Debug for Predicate<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("Predicate") }
}

impl<E: 'static> MatchAllFilter for Predicate<E> {
    fn match_all() -> Self { Self::all() }
}

impl MatchAllFilter for sea_orm::Condition {
    fn match_all() -> Self { sea_orm::Condition::all() }
}
