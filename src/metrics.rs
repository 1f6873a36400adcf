//! Measures computed over a list of pairs. Counts and sums are plain `f64`; an empty denominator
//! yields NaN or infinity, never a substituted value.
use crate::pairing::{Pair, Selector};
use crate::similarity::Similarity;
use ahash::AHashMap;
use enum_iterator::{all, Sequence};
use ndarray::Array1;
use ndarray_stats::QuantileExt;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Display};
use std::hash::Hash;
use std::str::FromStr;

/// Whether a larger value of a measure means a better prediction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Sequence,
)]
pub enum MeasureDirection {
    HigherIsBetter,
    LowerIsBetter,
    None,
}

impl Display for MeasureDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HigherIsBetter => write!(f, "higher"),
            Self::LowerIsBetter => write!(f, "lower"),
            Self::None => write!(f, "none"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingMeasureDirectionError(String);

impl Display for ParsingMeasureDirectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Could not parse {} into a `MeasureDirection`", self.0)
    }
}
impl Error for ParsingMeasureDirectionError {}

impl FromStr for MeasureDirection {
    type Err = ParsingMeasureDirectionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "higher" | "higherisbetter" | "higher_is_better" => Ok(Self::HigherIsBetter),
            "lower" | "lowerisbetter" | "lower_is_better" => Ok(Self::LowerIsBetter),
            "none" => Ok(Self::None),
            _ => Err(ParsingMeasureDirectionError(String::from(s))),
        }
    }
}

/// A statistic over pairs.
pub trait Measure<T>: Send + Sync {
    fn name(&self) -> String;
    fn direction(&self) -> MeasureDirection;
    /// * `similarity`: similarity between the sides of a pair.
    /// * `pairs`: the pairs to summarize, possibly with repetitions.
    fn compute(&self, similarity: &dyn Similarity<T>, pairs: &[&Pair<T>]) -> f64;
}

impl<T, M: Measure<T> + ?Sized> Measure<T> for Box<M> {
    fn name(&self) -> String {
        (**self).name()
    }
    fn direction(&self) -> MeasureDirection {
        (**self).direction()
    }
    fn compute(&self, similarity: &dyn Similarity<T>, pairs: &[&Pair<T>]) -> f64 {
        (**self).compute(similarity, pairs)
    }
}

fn count<T>(pairs: &[&Pair<T>], predicate: impl Fn(&Pair<T>) -> bool) -> f64 {
    pairs.iter().filter(|p| predicate(**p)).count() as f64
}

fn matches<T>(similarity: &dyn Similarity<T>, pairs: &[&Pair<T>]) -> f64 {
    pairs.iter().filter_map(|p| p.compute(similarity)).sum()
}

fn mismatches<T>(similarity: &dyn Similarity<T>, pairs: &[&Pair<T>]) -> f64 {
    pairs
        .iter()
        .filter_map(|p| p.compute(similarity))
        .map(|s| 1.0 - s)
        .sum()
}

fn recall<T>(similarity: &dyn Similarity<T>, pairs: &[&Pair<T>]) -> f64 {
    matches(similarity, pairs) / count(pairs, Pair::has_reference)
}

fn precision<T>(similarity: &dyn Similarity<T>, pairs: &[&Pair<T>]) -> f64 {
    matches(similarity, pairs) / count(pairs, Pair::has_prediction)
}

fn f_beta(beta: f64, recall: f64, precision: f64) -> f64 {
    let beta2 = beta * beta;
    (1.0 + beta2) * recall * precision / (recall + beta2 * precision)
}

fn slot_error_rate<T>(similarity: &dyn Similarity<T>, pairs: &[&Pair<T>]) -> f64 {
    let substitutions = mismatches(similarity, pairs);
    let insertions = count(pairs, |p| !p.has_reference());
    let deletions = count(pairs, |p| !p.has_prediction());
    (substitutions + insertions + deletions) / count(pairs, Pair::has_reference)
}

/// Standard counts and rates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Sequence,
)]
pub enum StandardMeasure {
    References,
    Predictions,
    Matches,
    Mismatches,
    FalsePositives,
    FalseNegatives,
    Insertions,
    Deletions,
    Substitutions,
    Recall,
    Precision,
    MatchAccuracy,
    SlotErrorRate,
    InvertedSlotErrorRate,
    F1,
}

impl StandardMeasure {
    /// F1, recall and precision.
    pub fn f1_group() -> Vec<Self> {
        vec![Self::F1, Self::Recall, Self::Precision]
    }

    /// SER and the counts it is made of.
    pub fn ser_group() -> Vec<Self> {
        vec![
            Self::SlotErrorRate,
            Self::InvertedSlotErrorRate,
            Self::Mismatches,
            Self::Matches,
            Self::Insertions,
            Self::Deletions,
        ]
    }

    pub fn count_group() -> Vec<Self> {
        vec![Self::Predictions, Self::References]
    }

    /// Every standard measure, in declaration order.
    pub fn every() -> Vec<Self> {
        all::<Self>().collect()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::References => "References",
            Self::Predictions => "Predictions",
            Self::Matches => "Matches",
            Self::Mismatches => "Mismatches",
            Self::FalsePositives => "False Positives",
            Self::FalseNegatives => "False Negatives",
            Self::Insertions => "Insertions",
            Self::Deletions => "Deletions",
            Self::Substitutions => "Substitutions",
            Self::Recall => "Recall",
            Self::Precision => "Precision",
            Self::MatchAccuracy => "Match accuracy",
            Self::SlotErrorRate => "SER",
            Self::InvertedSlotErrorRate => "ISER",
            Self::F1 => "F1",
        }
    }
}

impl Display for StandardMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingStandardMeasureError(String);

impl Display for ParsingStandardMeasureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown measure: {}", self.0)
    }
}
impl Error for ParsingStandardMeasureError {}

impl FromStr for StandardMeasure {
    type Err = ParsingStandardMeasureError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all::<Self>()
            .find(|m| m.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParsingStandardMeasureError(String::from(s)))
    }
}

impl<T> Measure<T> for StandardMeasure {
    fn name(&self) -> String {
        self.to_string()
    }

    fn direction(&self) -> MeasureDirection {
        match self {
            Self::References | Self::Predictions => MeasureDirection::None,
            Self::Matches
            | Self::Recall
            | Self::Precision
            | Self::MatchAccuracy
            | Self::InvertedSlotErrorRate
            | Self::F1 => MeasureDirection::HigherIsBetter,
            Self::Mismatches
            | Self::FalsePositives
            | Self::FalseNegatives
            | Self::Insertions
            | Self::Deletions
            | Self::Substitutions
            | Self::SlotErrorRate => MeasureDirection::LowerIsBetter,
        }
    }

    fn compute(&self, similarity: &dyn Similarity<T>, pairs: &[&Pair<T>]) -> f64 {
        match self {
            Self::References => count(pairs, Pair::has_reference),
            Self::Predictions => count(pairs, Pair::has_prediction),
            Self::Matches => matches(similarity, pairs),
            Self::Mismatches | Self::Substitutions => mismatches(similarity, pairs),
            Self::FalsePositives | Self::Insertions => count(pairs, |p| !p.has_reference()),
            Self::FalseNegatives | Self::Deletions => count(pairs, |p| !p.has_prediction()),
            Self::Recall => recall(similarity, pairs),
            Self::Precision => precision(similarity, pairs),
            Self::MatchAccuracy => matches(similarity, pairs) / count(pairs, Pair::has_both),
            Self::SlotErrorRate => slot_error_rate(similarity, pairs),
            Self::InvertedSlotErrorRate => 1.0 / (slot_error_rate(similarity, pairs) + 1.0),
            Self::F1 => f_beta(1.0, recall(similarity, pairs), precision(similarity, pairs)),
        }
    }
}

/// Weighted harmonic mean of recall and precision. `beta > 1` favours recall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FScore {
    pub beta: f64,
}

impl FScore {
    pub fn new(beta: f64) -> Self {
        Self { beta }
    }
}

impl<T> Measure<T> for FScore {
    fn name(&self) -> String {
        format!("F-{:.2}", self.beta)
    }

    fn direction(&self) -> MeasureDirection {
        MeasureDirection::HigherIsBetter
    }

    fn compute(&self, similarity: &dyn Similarity<T>, pairs: &[&Pair<T>]) -> f64 {
        f_beta(
            self.beta,
            recall(similarity, pairs),
            precision(similarity, pairs),
        )
    }
}

/// How the similarities of one item against its several counterparts are summarized.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Sequence,
)]
pub enum AggregateFunction {
    Mean,
    Median,
    Min,
    Max,
}

impl AggregateFunction {
    /// Summary of the scores, 0 if there is none.
    pub fn aggregate(&self, scores: Vec<f64>) -> f64 {
        if scores.is_empty() {
            return 0.0;
        }
        match self {
            Self::Mean => scores.iter().sum::<f64>() / scores.len() as f64,
            Self::Median => {
                let mut sorted = scores;
                sorted.sort_by(f64::total_cmp);
                sorted[sorted.len() / 2]
            }
            Self::Min => *Array1::from_vec(scores).min_skipnan(),
            Self::Max => *Array1::from_vec(scores).max_skipnan(),
        }
    }

    pub fn compute<T>(&self, similarity: &dyn Similarity<T>, key: &T, values: &[&T]) -> f64 {
        self.aggregate(
            values
                .iter()
                .map(|value| similarity.compute(key, value))
                .collect(),
        )
    }
}

impl Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => write!(f, "mean"),
            Self::Median => write!(f, "median"),
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsingAggregateFunctionError(String);

impl Display for ParsingAggregateFunctionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown aggregate function: {}", self.0)
    }
}
impl Error for ParsingAggregateFunctionError {}

impl FromStr for AggregateFunction {
    type Err = ParsingAggregateFunctionError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            _ => Err(ParsingAggregateFunctionError(String::from(s))),
        }
    }
}

/// Groups the pairs by one side and averages, over the groups, the aggregated similarity of the
/// key against the other side. Meant for pairings where an item may be paired several times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateMeasure {
    function: AggregateFunction,
    selector: Selector,
}

impl AggregateMeasure {
    pub fn new(function: AggregateFunction, selector: Selector) -> Self {
        Self { function, selector }
    }

    /// Present items of the selected side, in first-seen order, with their counterparts.
    fn groups<'a, T: Hash + Eq>(&self, pairs: &[&'a Pair<T>]) -> Vec<(&'a T, Vec<&'a T>)> {
        let mut positions: AHashMap<&T, usize> = AHashMap::new();
        let mut groups: Vec<(&T, Vec<&T>)> = Vec::new();
        for pair in pairs.iter().copied() {
            let Some(key) = pair.get(self.selector) else {
                continue;
            };
            let position = *positions.entry(key).or_insert_with(|| {
                groups.push((key, Vec::new()));
                groups.len() - 1
            });
            if let Some(value) = pair.get(self.selector.other()) {
                groups[position].1.push(value);
            }
        }
        groups
    }
}

impl<T: Hash + Eq> Measure<T> for AggregateMeasure {
    fn name(&self) -> String {
        format!("{}-{}s", self.function, self.selector)
    }

    fn direction(&self) -> MeasureDirection {
        MeasureDirection::HigherIsBetter
    }

    fn compute(&self, similarity: &dyn Similarity<T>, pairs: &[&Pair<T>]) -> f64 {
        let groups = self.groups(pairs);
        let total: f64 = groups
            .iter()
            .map(|(key, values)| match self.selector {
                Selector::Reference => self.function.compute(similarity, *key, values.as_slice()),
                Selector::Prediction => self.function.aggregate(
                    values
                        .iter()
                        .map(|value| similarity.compute(*value, *key))
                        .collect(),
                ),
            })
            .sum();
        total / groups.len() as f64
    }
}
