//! Composable comparators. A `Similarity` maps two items to a score in `[0, 1]` and can explain how
//! that score was obtained. Leaf similarities over annotations live in the submodules; this module
//! holds the generic combinators.
mod annotation;
mod normalization;
mod seedev;

pub use annotation::{
    AnnotationKindSimilarity, AnnotationTypeSimilarity, ConversionParsingError,
    DuplicateSimilarity, MaxFromEquivalence, RelationArgumentSimilarity, SameTypeAndArguments,
    SingleReferenceSimilarity, TextBoundJaccard, TextBoundOverlap, TypeConversion, TypeDispatch,
    TypeTable,
};
pub use normalization::{
    HierarchyParsingError, NormalizationJaccard, NormalizationSimilarity, WangSimilarity,
};
pub use seedev::SeeDevEventSimilarity;

use std::fmt::Display;
use std::sync::Arc;

/// Scalar comparison of two items.
pub trait Similarity<T: ?Sized>: Send + Sync {
    /// Score in `[0, 1]`; some leaf similarities may yield NaN on degenerate inputs.
    fn compute(&self, a: &T, b: &T) -> f64;

    /// Human readable account of `compute(a, b)`.
    fn explain(&self, a: &T, b: &T) -> String;
}

impl<T: ?Sized, S: Similarity<T> + ?Sized> Similarity<T> for Box<S> {
    fn compute(&self, a: &T, b: &T) -> f64 {
        (**self).compute(a, b)
    }
    fn explain(&self, a: &T, b: &T) -> String {
        (**self).explain(a, b)
    }
}

impl<T: ?Sized, S: Similarity<T> + ?Sized> Similarity<T> for Arc<S> {
    fn compute(&self, a: &T, b: &T) -> f64 {
        (**self).compute(a, b)
    }
    fn explain(&self, a: &T, b: &T) -> String {
        (**self).explain(a, b)
    }
}

/// Same score for every couple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub f64);

impl Default for Constant {
    fn default() -> Self {
        Self(1.0)
    }
}

impl<T: ?Sized> Similarity<T> for Constant {
    fn compute(&self, _a: &T, _b: &T) -> f64 {
        self.0
    }
    fn explain(&self, _a: &T, _b: &T) -> String {
        self.0.to_string()
    }
}

/// 1 for equal items, 0 otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity;

impl<T: PartialEq + ?Sized> Similarity<T> for Identity {
    fn compute(&self, a: &T, b: &T) -> f64 {
        if a == b {
            1.0
        } else {
            0.0
        }
    }
    fn explain(&self, a: &T, b: &T) -> String {
        String::from(if a == b { "eq = 1" } else { "neq = 0" })
    }
}

fn explain_all<T: ?Sized>(
    similarities: &[Box<dyn Similarity<T>>],
    a: &T,
    b: &T,
    separator: &str,
) -> String {
    similarities
        .iter()
        .map(|s| s.explain(a, b))
        .collect::<Vec<_>>()
        .join(separator)
}

macro_rules! composite {
    ($name:ident) => {
        impl<T: ?Sized> $name<T> {
            pub fn new() -> Self {
                Self {
                    similarities: Vec::new(),
                }
            }

            /// Appends a constituent similarity.
            pub fn with<S: Similarity<T> + 'static>(mut self, similarity: S) -> Self {
                self.similarities.push(Box::new(similarity));
                self
            }

            pub fn push(&mut self, similarity: Box<dyn Similarity<T>>) {
                self.similarities.push(similarity);
            }

            pub fn len(&self) -> usize {
                self.similarities.len()
            }

            pub fn is_empty(&self) -> bool {
                self.similarities.is_empty()
            }
        }

        impl<T: ?Sized> Default for $name<T> {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T: ?Sized> From<Vec<Box<dyn Similarity<T>>>> for $name<T> {
            fn from(similarities: Vec<Box<dyn Similarity<T>>>) -> Self {
                Self { similarities }
            }
        }
    };
}

/// Product of the constituents, 0 as soon as one of them is 0.
pub struct Product<T: ?Sized> {
    similarities: Vec<Box<dyn Similarity<T>>>,
}

composite!(Product);

impl<T: ?Sized> Similarity<T> for Product<T> {
    fn compute(&self, a: &T, b: &T) -> f64 {
        let mut result = 1.0;
        for sim in self.similarities.iter() {
            let s = sim.compute(a, b);
            if s == 0.0 {
                return 0.0;
            }
            result *= s;
        }
        result
    }

    fn explain(&self, a: &T, b: &T) -> String {
        format!(
            "({}) = {}",
            explain_all(&self.similarities, a, b, " . "),
            self.compute(a, b)
        )
    }
}

/// Minimum of the constituents, 0 as soon as one of them is 0.
pub struct Min<T: ?Sized> {
    similarities: Vec<Box<dyn Similarity<T>>>,
}

composite!(Min);

impl<T: ?Sized> Similarity<T> for Min<T> {
    fn compute(&self, a: &T, b: &T) -> f64 {
        let mut result: f64 = 1.0;
        for sim in self.similarities.iter() {
            let s = sim.compute(a, b);
            if s == 0.0 {
                return 0.0;
            }
            result = result.min(s);
        }
        result
    }

    fn explain(&self, a: &T, b: &T) -> String {
        format!(
            "MIN({}) = {}",
            explain_all(&self.similarities, a, b, ", "),
            self.compute(a, b)
        )
    }
}

/// Maximum of the constituents, 1 as soon as one of them is 1.
pub struct Max<T: ?Sized> {
    similarities: Vec<Box<dyn Similarity<T>>>,
}

composite!(Max);

impl<T: ?Sized> Similarity<T> for Max<T> {
    fn compute(&self, a: &T, b: &T) -> f64 {
        let mut result: f64 = 0.0;
        for sim in self.similarities.iter() {
            let s = sim.compute(a, b);
            if s == 1.0 {
                return 1.0;
            }
            result = result.max(s);
        }
        result
    }

    fn explain(&self, a: &T, b: &T) -> String {
        format!(
            "MAX({}) = {}",
            explain_all(&self.similarities, a, b, ", "),
            self.compute(a, b)
        )
    }
}

/// Binarizes an inner similarity at `threshold`. A score equal to the threshold yields 0 when
/// `strict`, 1 otherwise.
pub struct Cutoff<S> {
    similarity: S,
    threshold: f64,
    strict: bool,
}

impl<S> Cutoff<S> {
    pub fn new(similarity: S, threshold: f64, strict: bool) -> Self {
        Self {
            similarity,
            threshold,
            strict,
        }
    }

    /// Any strictly positive score yields 1.
    pub fn positive(similarity: S) -> Self {
        Self::new(similarity, 0.0, true)
    }

    fn binarize(&self, s: f64) -> f64 {
        if s > self.threshold {
            1.0
        } else if s < self.threshold || self.strict {
            0.0
        } else {
            1.0
        }
    }
}

impl<T: ?Sized, S: Similarity<T>> Similarity<T> for Cutoff<S> {
    fn compute(&self, a: &T, b: &T) -> f64 {
        self.binarize(self.similarity.compute(a, b))
    }

    fn explain(&self, a: &T, b: &T) -> String {
        let s = self.similarity.compute(a, b);
        let comparison = if s > self.threshold {
            ">"
        } else if s < self.threshold {
            "<"
        } else {
            ""
        };
        let equal = if self.strict { "" } else { "=" };
        format!(
            "{} {}{} {} -> {}",
            self.similarity.explain(a, b),
            comparison,
            equal,
            self.threshold,
            self.binarize(s)
        )
    }
}

/// Wraps a closure, mostly useful for tests and ad hoc comparisons.
pub struct FnSimilarity<F> {
    name: String,
    function: F,
}

impl<F> FnSimilarity<F> {
    pub fn new<N: Display>(name: N, function: F) -> Self {
        Self {
            name: name.to_string(),
            function,
        }
    }
}

impl<T: ?Sized, F> Similarity<T> for FnSimilarity<F>
where
    F: Fn(&T, &T) -> f64 + Send + Sync,
{
    fn compute(&self, a: &T, b: &T) -> f64 {
        (self.function)(a, b)
    }
    fn explain(&self, a: &T, b: &T) -> String {
        format!("{} = {}", self.name, self.compute(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn closeness() -> FnSimilarity<impl Fn(&f64, &f64) -> f64 + Send + Sync> {
        FnSimilarity::new("closeness", |a: &f64, b: &f64| 1.0 - (a - b).abs().min(1.0))
    }

    #[rstest]
    #[case(0.5, true, 0.0)]
    #[case(0.5, false, 1.0)]
    #[case(0.50001, true, 1.0)]
    #[case(0.49999, false, 0.0)]
    fn test_cutoff(#[case] score: f64, #[case] strict: bool, #[case] expected: f64) {
        let cutoff = Cutoff::new(Constant(score), 0.5, strict);
        assert_eq!(cutoff.compute(&(), &()), expected);
    }

    #[test]
    fn test_product_short_circuits() {
        let product: Product<f64> = Product::new()
            .with(Constant(0.5))
            .with(Constant(0.0))
            .with(FnSimilarity::new("boom", |_: &f64, _: &f64| -> f64 {
                panic!("should not be evaluated")
            }));
        assert_eq!(product.compute(&1.0, &2.0), 0.0);
        let product: Product<f64> = Product::new().with(Constant(0.5)).with(closeness());
        assert_eq!(product.compute(&1.0, &1.5), 0.25);
        assert_eq!(product.explain(&1.0, &1.5), "(0.5 . closeness = 0.5) = 0.25");
    }

    #[test]
    fn test_min_and_max() {
        let min: Min<f64> = Min::new().with(Constant(0.7)).with(closeness());
        assert_eq!(min.compute(&0.0, &0.5), 0.5);
        assert_eq!(Min::<f64>::new().compute(&0.0, &0.0), 1.0);
        let max: Max<f64> = Max::new().with(Constant(0.7)).with(closeness());
        assert_eq!(max.compute(&0.0, &0.5), 0.7);
        assert_eq!(max.compute(&0.5, &0.5), 1.0);
        assert_eq!(Max::<f64>::new().compute(&0.0, &0.0), 0.0);
        assert!(max.explain(&0.0, &0.5).starts_with("MAX(0.7, closeness = 0.5)"));
    }

    #[test]
    fn test_identity() {
        assert_eq!(Identity.compute("abc", "abc"), 1.0);
        assert_eq!(Identity.compute("abc", "abd"), 0.0);
        assert_eq!(Similarity::<str>::explain(&Identity, "a", "b"), "neq = 0");
    }

    #[test]
    fn test_boxed_similarity() {
        let boxed: Box<dyn Similarity<f64>> = Box::new(Constant(0.3));
        let arc: Arc<dyn Similarity<f64>> = Arc::new(closeness());
        assert_eq!(boxed.compute(&0.0, &1.0), 0.3);
        assert_eq!(arc.compute(&0.0, &0.25), 0.75);
    }
}
