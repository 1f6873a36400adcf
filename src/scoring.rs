//! A scoring applies a post-filter to pairs, then computes a list of measures with a similarity. It
//! can optionally recompute every measure on bootstrap resamples of the filtered pairs.
use crate::config::BootstrapConfig;
use crate::filter::Predicate;
use crate::metrics::{Measure, MeasureDirection};
use crate::pairing::Pair;
use crate::similarity::Similarity;
use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};

/// Interval holding a proportion `p` of the resampled values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub p: f64,
    pub low: f64,
    pub high: f64,
}

/// Value of one measure, with its bootstrap resamples if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureResult {
    pub name: String,
    pub direction: MeasureDirection,
    pub value: f64,
    pub resamples: Vec<f64>,
}

impl MeasureResult {
    /// Percentile interval over the resamples, `None` without resamples.
    ///
    /// * `p`: proportion of resampled values the interval should hold, within `[0, 1]`.
    pub fn confidence_interval(&self, p: f64) -> Option<ConfidenceInterval> {
        if self.resamples.is_empty() {
            return None;
        }
        let mut sorted = self.resamples.clone();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let confidence_n = ((p * n as f64).round() as usize).min(n);
        let low = (n - confidence_n) / 2;
        let high = (low + confidence_n).min(n - 1);
        Some(ConfidenceInterval {
            p,
            low: sorted[low],
            high: sorted[high],
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub name: String,
    pub measures: Vec<MeasureResult>,
}

impl ScoringResult {
    /// First measure result with the given name.
    pub fn get(&self, name: &str) -> Option<&MeasureResult> {
        self.measures.iter().find(|m| m.name == name)
    }
}

pub struct Scoring<T> {
    name: String,
    post_filter: Option<Box<dyn Predicate<Pair<T>>>>,
    similarity: Box<dyn Similarity<T>>,
    measures: Vec<Box<dyn Measure<T>>>,
}

impl<T> Scoring<T> {
    pub fn new<S, Sim>(name: S, similarity: Sim) -> Self
    where
        S: Into<String>,
        Sim: Similarity<T> + 'static,
    {
        Self {
            name: name.into(),
            post_filter: None,
            similarity: Box::new(similarity),
            measures: Vec::new(),
        }
    }

    /// Only pairs accepted by `filter` are scored.
    pub fn post_filter<F: Predicate<Pair<T>> + 'static>(mut self, filter: F) -> Self {
        self.post_filter = Some(Box::new(filter));
        self
    }

    pub fn measure<M: Measure<T> + 'static>(mut self, measure: M) -> Self {
        self.measures.push(Box::new(measure));
        self
    }

    pub fn measures<I, M>(mut self, measures: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Measure<T> + 'static,
    {
        self.measures
            .extend(measures.into_iter().map(|m| Box::new(m) as Box<dyn Measure<T>>));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn similarity(&self) -> &dyn Similarity<T> {
        self.similarity.as_ref()
    }

    pub fn measure_names(&self) -> Vec<String> {
        self.measures.iter().map(|m| m.name()).collect()
    }

    pub fn filter_pairs<'a>(&self, pairs: &'a [Pair<T>]) -> Vec<&'a Pair<T>> {
        pairs
            .iter()
            .filter(|p| self.post_filter.as_ref().map_or(true, |f| f.test(p)))
            .collect()
    }

    fn compute_all(&self, pairs: &[&Pair<T>]) -> Vec<f64> {
        self.measures
            .iter()
            .map(|m| m.compute(self.similarity.as_ref(), pairs))
            .collect()
    }

    fn compute_resample(&self, filtered: &[&Pair<T>], indices: ArrayView1<'_, usize>) -> Vec<f64> {
        let sample: Vec<&Pair<T>> = indices.iter().map(|i| filtered[*i]).collect();
        self.compute_all(&sample)
    }
}

impl<T: Sync> Scoring<T> {
    /// Measures over the filtered pairs.
    ///
    /// * `pairs`: output of a pairing algorithm.
    /// * `bootstrap`: if given, every measure is also computed on each resample. The resample
    ///   indices are drawn before any computation, so parallel and sequential runs agree.
    pub fn result(
        &self,
        pairs: &[Pair<T>],
        bootstrap: Option<&mut BootstrapConfig>,
    ) -> ScoringResult {
        let filtered = self.filter_pairs(pairs);
        let values = self.compute_all(&filtered);
        let mut measures: Vec<MeasureResult> = self
            .measures
            .iter()
            .zip(values)
            .map(|(m, value)| MeasureResult {
                name: m.name(),
                direction: m.direction(),
                value,
                resamples: Vec::new(),
            })
            .collect();
        if let Some(config) = bootstrap {
            let indices = config.draw_indices(filtered.len());
            let rows = Zip::from(indices.rows());
            let resampled: Array1<Vec<f64>> = if config.parallel() {
                rows.par_map_collect(|row| self.compute_resample(&filtered, row))
            } else {
                rows.map_collect(|row| self.compute_resample(&filtered, row))
            };
            for (j, measure) in measures.iter_mut().enumerate() {
                measure.resamples = resampled.iter().map(|row| row[j]).collect();
            }
            tracing::debug!(
                scoring = %self.name,
                resamples = config.resamples(),
                pairs = filtered.len(),
                parallel = config.parallel(),
                "bootstrap"
            );
        }
        ScoringResult {
            name: self.name.clone(),
            measures,
        }
    }
}
