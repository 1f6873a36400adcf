//! Alignment of reference items with predicted items. A pairing algorithm returns a list of
//! `Pair`s where every pair has at least one side: both sides for a match, the reference alone for
//! a false negative and the prediction alone for a false positive.
mod heuristic;
mod saturation;
mod threshold;

pub use heuristic::HeuristicPairing;
pub use saturation::SaturatedEventPairing;
pub use threshold::{PredictionPairing, ReferencePairing};

use crate::similarity::Similarity;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairError;

impl Display for PairError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A pair needs at least a reference or a prediction")
    }
}
impl Error for PairError {}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair<T> {
    reference: Option<T>,
    prediction: Option<T>,
}

impl<T> Pair<T> {
    /// Fails if both sides are absent.
    pub fn new(reference: Option<T>, prediction: Option<T>) -> Result<Self, PairError> {
        if reference.is_none() && prediction.is_none() {
            return Err(PairError);
        }
        Ok(Self {
            reference,
            prediction,
        })
    }

    pub fn matched(reference: T, prediction: T) -> Self {
        Self {
            reference: Some(reference),
            prediction: Some(prediction),
        }
    }

    pub fn false_negative(reference: T) -> Self {
        Self {
            reference: Some(reference),
            prediction: None,
        }
    }

    pub fn false_positive(prediction: T) -> Self {
        Self {
            reference: None,
            prediction: Some(prediction),
        }
    }

    pub fn reference(&self) -> Option<&T> {
        self.reference.as_ref()
    }

    pub fn prediction(&self) -> Option<&T> {
        self.prediction.as_ref()
    }

    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    pub fn has_prediction(&self) -> bool {
        self.prediction.is_some()
    }

    pub fn has_both(&self) -> bool {
        self.has_reference() && self.has_prediction()
    }

    pub fn get(&self, selector: Selector) -> Option<&T> {
        match selector {
            Selector::Reference => self.reference(),
            Selector::Prediction => self.prediction(),
        }
    }

    /// Similarity between both sides, `None` if one of them is absent.
    pub fn compute<S: Similarity<T> + ?Sized>(&self, similarity: &S) -> Option<f64> {
        match (&self.reference, &self.prediction) {
            (Some(r), Some(p)) => Some(similarity.compute(r, p)),
            _ => None,
        }
    }

    pub fn explain<S: Similarity<T> + ?Sized>(&self, similarity: &S) -> Option<String> {
        match (&self.reference, &self.prediction) {
            (Some(r), Some(p)) => Some(similarity.explain(r, p)),
            _ => None,
        }
    }
}

impl<T: Display> Display for Pair<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |s: &Option<T>| s.as_ref().map_or(String::from("-"), |x| x.to_string());
        write!(f, "({}, {})", side(&self.reference), side(&self.prediction))
    }
}

/// One side of a pair.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Sequence,
)]
pub enum Selector {
    Reference,
    Prediction,
}

impl Selector {
    pub fn get<T>(self, pair: &Pair<T>) -> Option<&T> {
        pair.get(self)
    }

    pub fn other(self) -> Selector {
        match self {
            Self::Reference => Self::Prediction,
            Self::Prediction => Self::Reference,
        }
    }

    pub fn has<T>(self, pair: &Pair<T>) -> bool {
        self.get(pair).is_some()
    }

    pub fn has_other<T>(self, pair: &Pair<T>) -> bool {
        self.other().has(pair)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference => write!(f, "reference"),
            Self::Prediction => write!(f, "prediction"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorParsingError(String);

impl Display for SelectorParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Impossible to parse the string ({}) into a pair selector", self.0)
    }
}
impl Error for SelectorParsingError {}

impl FromStr for Selector {
    type Err = SelectorParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reference" | "ref" => Ok(Self::Reference),
            "prediction" | "pred" => Ok(Self::Prediction),
            _ => Err(SelectorParsingError(String::from(s))),
        }
    }
}

/// Failure of a pairing algorithm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingError {
    /// The greedy matcher stopped with items neither paired nor declared unmatched.
    NonConvergent {
        references: usize,
        predictions: usize,
    },
}

impl Display for PairingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonConvergent {
                references,
                predictions,
            } => write!(
                f,
                "Pairing did not converge: {} references and {} predictions left unpaired",
                references, predictions
            ),
        }
    }
}
impl Error for PairingError {}

pub trait PairingAlgorithm<T>: Send + Sync {
    /// Aligns `reference` with `prediction`. Every input item appears in exactly one pair,
    /// except for the one-directional algorithms that may pair an item several times.
    fn best_pairing(
        &self,
        reference: &[T],
        prediction: &[T],
        similarity: &dyn Similarity<T>,
    ) -> Result<Vec<Pair<T>>, PairingError>;
}

impl<T, A: PairingAlgorithm<T> + ?Sized> PairingAlgorithm<T> for Box<A> {
    fn best_pairing(
        &self,
        reference: &[T],
        prediction: &[T],
        similarity: &dyn Similarity<T>,
    ) -> Result<Vec<Pair<T>>, PairingError> {
        (**self).best_pairing(reference, prediction, similarity)
    }
}
