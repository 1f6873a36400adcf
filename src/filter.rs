//! Accept/reject predicates and their boolean composition. A `Filter` is a tree of combinators over
//! leaf predicates; `reduce` simplifies the tree without changing what it accepts.
use crate::corpus::{Ann, KindTag, SetSelector};
use crate::pairing::Pair;
use ahash::AHashSet;
use std::fmt::Debug;

/// Leaf test over items of type `T`.
pub trait Predicate<T: ?Sized>: Send + Sync {
    fn test(&self, item: &T) -> bool;
}

impl<T: ?Sized, P: Predicate<T> + ?Sized> Predicate<T> for Box<P> {
    fn test(&self, item: &T) -> bool {
        (**self).test(item)
    }
}

/// Leaf predicates that may simplify themselves into a constant filter.
pub trait Reduce: Sized {
    fn reduce(self) -> Filter<Self> {
        Filter::Leaf(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter<L> {
    AcceptAll,
    RejectAll,
    Not(Box<Filter<L>>),
    /// Conjunction.
    All(Vec<Filter<L>>),
    /// Disjunction.
    Any(Vec<Filter<L>>),
    Leaf(L),
}

impl<L> Filter<L> {
    pub fn not(filter: Filter<L>) -> Self {
        Self::Not(Box::new(filter))
    }

    pub fn accept<T: ?Sized>(&self, item: &T) -> bool
    where
        L: Predicate<T>,
    {
        match self {
            Self::AcceptAll => true,
            Self::RejectAll => false,
            Self::Not(inner) => !inner.accept(item),
            Self::All(filters) => filters.iter().all(|f| f.accept(item)),
            Self::Any(filters) => filters.iter().any(|f| f.accept(item)),
            Self::Leaf(leaf) => leaf.test(item),
        }
    }

    pub fn is_accept_all(&self) -> bool {
        matches!(self, Self::AcceptAll)
    }

    pub fn is_reject_all(&self) -> bool {
        matches!(self, Self::RejectAll)
    }
}

impl<L: Reduce> Filter<L> {
    /// Equivalent filter with constant members folded away.
    pub fn reduce(self) -> Self {
        match self {
            Self::AcceptAll | Self::RejectAll => self,
            Self::Leaf(leaf) => leaf.reduce(),
            Self::Not(inner) => match inner.reduce() {
                Self::AcceptAll => Self::RejectAll,
                Self::RejectAll => Self::AcceptAll,
                reduced => Self::not(reduced),
            },
            Self::All(filters) => {
                let mut kept = Vec::with_capacity(filters.len());
                for filter in filters {
                    match filter.reduce() {
                        Self::AcceptAll => continue,
                        Self::RejectAll => return Self::RejectAll,
                        reduced => kept.push(reduced),
                    }
                }
                collapse(kept, Self::AcceptAll, Self::All)
            }
            Self::Any(filters) => {
                let mut kept = Vec::with_capacity(filters.len());
                for filter in filters {
                    match filter.reduce() {
                        Self::RejectAll => continue,
                        Self::AcceptAll => return Self::AcceptAll,
                        reduced => kept.push(reduced),
                    }
                }
                collapse(kept, Self::RejectAll, Self::Any)
            }
        }
    }
}

fn collapse<L>(
    mut kept: Vec<Filter<L>>,
    empty: Filter<L>,
    wrap: fn(Vec<Filter<L>>) -> Filter<L>,
) -> Filter<L> {
    match kept.len() {
        0 => empty,
        1 => kept.remove(0),
        _ => wrap(kept),
    }
}

impl<T: ?Sized, L: Predicate<T>> Predicate<T> for Filter<L> {
    fn test(&self, item: &T) -> bool {
        self.accept(item)
    }
}

/// Wraps a closure as a predicate.
pub struct FnPredicate<F>(F);

impl<F> FnPredicate<F> {
    pub fn new(function: F) -> Self {
        Self(function)
    }
}

impl<T: ?Sized, F> Predicate<T> for FnPredicate<F>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn test(&self, item: &T) -> bool {
        (self.0)(item)
    }
}

impl<F> Reduce for FnPredicate<F> {}

/// Predicates over annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationPredicate {
    /// Annotation type is one of the given types.
    HasType(AHashSet<String>),
    OfKind(KindTag),
    InSet(SetSelector),
}

impl AnnotationPredicate {
    pub fn has_type<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::HasType(types.into_iter().map(Into::into).collect())
    }
}

impl Predicate<Ann> for AnnotationPredicate {
    fn test(&self, item: &Ann) -> bool {
        match self {
            Self::HasType(types) => types.contains(item.annotation_type()),
            Self::OfKind(kind) => item.kind_tag() == *kind,
            Self::InSet(selector) => item.set() == *selector,
        }
    }
}

impl Reduce for AnnotationPredicate {
    fn reduce(self) -> Filter<Self> {
        match self {
            Self::HasType(types) if types.is_empty() => Filter::RejectAll,
            other => Filter::Leaf(other),
        }
    }
}

/// Predicates over pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum PairPredicate<L> {
    /// Accepts a pair if either of its present sides passes the filter.
    EitherSide(Filter<L>),
    HasReference,
    HasPrediction,
    HasBoth,
}

impl<T, L: Predicate<T>> Predicate<Pair<T>> for PairPredicate<L> {
    fn test(&self, item: &Pair<T>) -> bool {
        match self {
            Self::EitherSide(filter) => {
                item.reference().is_some_and(|r| filter.accept(r))
                    || item.prediction().is_some_and(|p| filter.accept(p))
            }
            Self::HasReference => item.has_reference(),
            Self::HasPrediction => item.has_prediction(),
            Self::HasBoth => item.has_both(),
        }
    }
}

impl<L: Reduce + Debug> Reduce for PairPredicate<L> {
    fn reduce(self) -> Filter<Self> {
        match self {
            Self::EitherSide(filter) => match filter.reduce() {
                Filter::AcceptAll => Filter::AcceptAll,
                Filter::RejectAll => Filter::RejectAll,
                reduced => Filter::Leaf(Self::EitherSide(reduced)),
            },
            other => Filter::Leaf(other),
        }
    }
}
