use crate::pairing::{Pair, PairingAlgorithm, PairingError};
use crate::similarity::Similarity;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Total order over similarity values.
#[derive(Debug, Clone, Copy)]
struct Score(f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Candidates of one item grouped by score.
type Matches = BTreeMap<Score, BTreeSet<usize>>;

/// For every item of one side, its candidates on the other side with a positive score.
#[derive(Debug, Clone, Default)]
struct MatchIndex {
    entries: BTreeMap<usize, Matches>,
}

impl MatchIndex {
    fn with_keys(n: usize) -> Self {
        Self {
            entries: (0..n).map(|k| (k, Matches::new())).collect(),
        }
    }

    fn add(&mut self, key: usize, value: usize, score: f64) {
        self.entries
            .entry(key)
            .or_default()
            .entry(Score(score))
            .or_default()
            .insert(value);
    }

    fn best(&self, key: usize) -> Option<&BTreeSet<usize>> {
        self.entries
            .get(&key)
            .and_then(|m| m.last_key_value())
            .map(|(_, v)| v)
    }

    /// Best candidate of `matches` that also ranks `value` among its best candidates in `self`.
    fn reciprocal(&self, value: usize, matches: &Matches) -> Option<usize> {
        let (_, best) = matches.last_key_value()?;
        best.iter()
            .copied()
            .find(|candidate| self.best(*candidate).is_some_and(|back| back.contains(&value)))
    }

    fn remove_keys(&mut self, keys: &BTreeSet<usize>) {
        self.entries.retain(|k, _| !keys.contains(k));
    }

    fn remove_values(&mut self, values: &BTreeSet<usize>) {
        for matches in self.entries.values_mut() {
            matches.retain(|_, candidates| {
                candidates.retain(|c| !values.contains(c));
                !candidates.is_empty()
            });
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type IndexPair = (Option<usize>, Option<usize>);

/// Rounds of reciprocal best matches until nothing moves.
fn pair_indices(
    mut ref2pred: MatchIndex,
    mut pred2ref: MatchIndex,
) -> Result<Vec<IndexPair>, PairingError> {
    let mut result = Vec::new();
    let mut round = 0;
    loop {
        round += 1;
        let mut ref_seen = BTreeSet::new();
        let mut pred_seen = BTreeSet::new();
        for (r, matches) in ref2pred.entries.iter() {
            if matches.is_empty() {
                result.push((Some(*r), None));
                ref_seen.insert(*r);
                continue;
            }
            if let Some(p) = pred2ref.reciprocal(*r, matches) {
                result.push((Some(*r), Some(p)));
                ref_seen.insert(*r);
                pred_seen.insert(p);
                break;
            }
        }
        for (p, matches) in pred2ref.entries.iter() {
            if matches.is_empty() {
                result.push((None, Some(*p)));
                pred_seen.insert(*p);
            }
        }
        tracing::trace!(
            round,
            references = ref_seen.len(),
            predictions = pred_seen.len(),
            "heuristic pairing round"
        );
        if ref_seen.is_empty() && pred_seen.is_empty() {
            break;
        }
        ref2pred.remove_keys(&ref_seen);
        ref2pred.remove_values(&pred_seen);
        pred2ref.remove_keys(&pred_seen);
        pred2ref.remove_values(&ref_seen);
    }
    if !ref2pred.is_empty() || !pred2ref.is_empty() {
        return Err(PairingError::NonConvergent {
            references: ref2pred.len(),
            predictions: pred2ref.len(),
        });
    }
    Ok(result)
}

/// Greedy approximation of the best one-to-one alignment. Each round pairs the first reference,
/// in input order, that is the best candidate of one of its own best candidates; items left
/// without candidates are emitted alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPairing;

impl<T: Clone> PairingAlgorithm<T> for HeuristicPairing {
    fn best_pairing(
        &self,
        reference: &[T],
        prediction: &[T],
        similarity: &dyn Similarity<T>,
    ) -> Result<Vec<Pair<T>>, PairingError> {
        let mut ref2pred = MatchIndex::with_keys(reference.len());
        let mut pred2ref = MatchIndex::with_keys(prediction.len());
        for (r, ref_item) in reference.iter().enumerate() {
            for (p, pred_item) in prediction.iter().enumerate() {
                let s = similarity.compute(ref_item, pred_item);
                if s > 0.0 {
                    ref2pred.add(r, p, s);
                    pred2ref.add(p, r, s);
                }
            }
        }
        let indices = pair_indices(ref2pred, pred2ref)?;
        tracing::debug!(
            references = reference.len(),
            predictions = prediction.len(),
            pairs = indices.len(),
            "heuristic pairing"
        );
        Ok(indices
            .into_iter()
            .map(|(r, p)| Pair {
                reference: r.map(|i| reference[i].clone()),
                prediction: p.map(|i| prediction[i].clone()),
            })
            .collect())
    }
}
