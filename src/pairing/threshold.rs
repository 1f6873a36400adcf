use crate::pairing::{Pair, PairingAlgorithm, PairingError, Selector};
use crate::similarity::Similarity;

/// Index and score of the first best candidate strictly above `threshold`.
fn best_candidate<T>(
    threshold: f64,
    candidates: &[T],
    score: impl Fn(&T) -> f64,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let s = score(candidate);
        if s <= threshold {
            continue;
        }
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((i, s));
        }
    }
    best
}

/// One-directional pairing: every item of the `driver` side independently picks its best
/// candidate on the other side, so a candidate may be picked several times.
fn one_directional<T: Clone>(
    driver: Selector,
    threshold: f64,
    unpaired: bool,
    reference: &[T],
    prediction: &[T],
    similarity: &dyn Similarity<T>,
) -> Vec<Pair<T>> {
    let (items, candidates) = match driver {
        Selector::Prediction => (prediction, reference),
        Selector::Reference => (reference, prediction),
    };
    let mut claimed = vec![false; candidates.len()];
    let mut result = Vec::with_capacity(items.len());
    for item in items.iter() {
        let best = best_candidate(threshold, candidates, |c| match driver {
            Selector::Prediction => similarity.compute(c, item),
            Selector::Reference => similarity.compute(item, c),
        });
        if let Some((i, _)) = best {
            claimed[i] = true;
        }
        let candidate = best.map(|(i, _)| candidates[i].clone());
        let item = Some(item.clone());
        result.push(match driver {
            Selector::Prediction => Pair {
                reference: candidate,
                prediction: item,
            },
            Selector::Reference => Pair {
                reference: item,
                prediction: candidate,
            },
        });
    }
    if unpaired {
        let lonely = candidates
            .iter()
            .zip(claimed.iter())
            .filter(|(_, c)| !**c)
            .map(|(candidate, _)| candidate.clone());
        match driver {
            Selector::Prediction => result.extend(lonely.map(Pair::false_negative)),
            Selector::Reference => result.extend(lonely.map(Pair::false_positive)),
        }
    }
    tracing::debug!(
        driver = %driver,
        threshold,
        pairs = result.len(),
        "one-directional pairing"
    );
    result
}

/// Pairs every prediction with its most similar reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePairing {
    threshold: f64,
    false_negative_pairs: bool,
}

impl ReferencePairing {
    /// * `threshold`: scores must be strictly above this value to pair.
    /// * `false_negative_pairs`: also emit references no prediction picked.
    pub fn new(threshold: f64, false_negative_pairs: bool) -> Self {
        Self {
            threshold,
            false_negative_pairs,
        }
    }
}

impl Default for ReferencePairing {
    fn default() -> Self {
        Self::new(0.0, true)
    }
}

impl<T: Clone> PairingAlgorithm<T> for ReferencePairing {
    fn best_pairing(
        &self,
        reference: &[T],
        prediction: &[T],
        similarity: &dyn Similarity<T>,
    ) -> Result<Vec<Pair<T>>, PairingError> {
        Ok(one_directional(
            Selector::Prediction,
            self.threshold,
            self.false_negative_pairs,
            reference,
            prediction,
            similarity,
        ))
    }
}

/// Pairs every reference with its most similar prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionPairing {
    threshold: f64,
    false_positive_pairs: bool,
}

impl PredictionPairing {
    /// * `threshold`: scores must be strictly above this value to pair.
    /// * `false_positive_pairs`: also emit predictions no reference picked.
    pub fn new(threshold: f64, false_positive_pairs: bool) -> Self {
        Self {
            threshold,
            false_positive_pairs,
        }
    }
}

impl Default for PredictionPairing {
    fn default() -> Self {
        Self::new(0.0, true)
    }
}

impl<T: Clone> PairingAlgorithm<T> for PredictionPairing {
    fn best_pairing(
        &self,
        reference: &[T],
        prediction: &[T],
        similarity: &dyn Similarity<T>,
    ) -> Result<Vec<Pair<T>>, PairingError> {
        Ok(one_directional(
            Selector::Reference,
            self.threshold,
            self.false_positive_pairs,
            reference,
            prediction,
            similarity,
        ))
    }
}
