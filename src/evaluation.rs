//! An evaluation pairs reference items with predicted items, then runs its scorings on the pairs.
//! `AnnotationEvaluation` does so document by document over a resolved corpus.
use crate::config::BootstrapConfig;
use crate::corpus::{Ann, Corpus, CorpusError, Document, InvalidFragment, Resolved, SetSelector};
use crate::filter::{AnnotationPredicate, Filter};
use crate::pairing::{Pair, PairError, PairingAlgorithm, PairingError};
use crate::scoring::{Scoring, ScoringResult};
use crate::similarity::{
    ConversionParsingError, DuplicateSimilarity, HierarchyParsingError, Similarity,
};
use std::error::Error;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Every failure the crate can report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// The main result was requested from an evaluation without scoring.
    NoScoring(String),
    Pairing(PairingError),
    Pair(PairError),
    Corpus(CorpusError),
    Fragment(InvalidFragment),
    DuplicateSimilarity(DuplicateSimilarity),
    Hierarchy(HierarchyParsingError),
    Conversion(ConversionParsingError),
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoScoring(name) => write!(f, "Evaluation {} has no scoring", name),
            Self::Pairing(e) => write!(f, "{}", e),
            Self::Pair(e) => write!(f, "{}", e),
            Self::Corpus(e) => write!(f, "{}", e),
            Self::Fragment(e) => write!(f, "{}", e),
            Self::DuplicateSimilarity(e) => write!(f, "{}", e),
            Self::Hierarchy(e) => write!(f, "{}", e),
            Self::Conversion(e) => write!(f, "{}", e),
        }
    }
}

impl Error for EvaluationError {}

impl From<PairingError> for EvaluationError {
    fn from(value: PairingError) -> Self {
        Self::Pairing(value)
    }
}

impl From<PairError> for EvaluationError {
    fn from(value: PairError) -> Self {
        Self::Pair(value)
    }
}

impl From<CorpusError> for EvaluationError {
    fn from(value: CorpusError) -> Self {
        Self::Corpus(value)
    }
}

impl From<InvalidFragment> for EvaluationError {
    fn from(value: InvalidFragment) -> Self {
        Self::Fragment(value)
    }
}

impl From<DuplicateSimilarity> for EvaluationError {
    fn from(value: DuplicateSimilarity) -> Self {
        Self::DuplicateSimilarity(value)
    }
}

impl From<HierarchyParsingError> for EvaluationError {
    fn from(value: HierarchyParsingError) -> Self {
        Self::Hierarchy(value)
    }
}

impl From<ConversionParsingError> for EvaluationError {
    fn from(value: ConversionParsingError) -> Self {
        Self::Conversion(value)
    }
}

/// Scoring results of one evaluation, with the pairs they were computed on if asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationResult<T> {
    pub name: String,
    pub pairs: Option<Vec<Pair<T>>>,
    pub scorings: Vec<ScoringResult>,
}

impl<T> EvaluationResult<T> {
    /// Result of the first scoring.
    pub fn main(&self) -> Option<&ScoringResult> {
        self.scorings.first()
    }

    pub fn scoring(&self, name: &str) -> Option<&ScoringResult> {
        self.scorings.iter().find(|s| s.name == name)
    }
}

pub struct Evaluation<T> {
    name: String,
    pairing: Box<dyn PairingAlgorithm<T>>,
    matching_similarity: Box<dyn Similarity<T>>,
    scorings: Vec<Scoring<T>>,
}

impl<T> Evaluation<T> {
    /// * `name`: name of the evaluation.
    /// * `pairing`: algorithm aligning references with predictions.
    /// * `matching_similarity`: similarity the pairing algorithm maximizes.
    pub fn new<S, A, Sim>(name: S, pairing: A, matching_similarity: Sim) -> Self
    where
        S: Into<String>,
        A: PairingAlgorithm<T> + 'static,
        Sim: Similarity<T> + 'static,
    {
        Self {
            name: name.into(),
            pairing: Box::new(pairing),
            matching_similarity: Box::new(matching_similarity),
            scorings: Vec::new(),
        }
    }

    pub fn scoring(mut self, scoring: Scoring<T>) -> Self {
        self.scorings.push(scoring);
        self
    }

    pub fn add_scoring(&mut self, scoring: Scoring<T>) {
        self.scorings.push(scoring);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn scorings(&self) -> &[Scoring<T>] {
        &self.scorings
    }

    pub fn matching_similarity(&self) -> &dyn Similarity<T> {
        self.matching_similarity.as_ref()
    }

    pub fn pairs(&self, reference: &[T], prediction: &[T]) -> Result<Vec<Pair<T>>, EvaluationError> {
        Ok(self
            .pairing
            .best_pairing(reference, prediction, self.matching_similarity.as_ref())?)
    }
}

impl<T: Sync> Evaluation<T> {
    /// Runs every scoring on `pairs`. The bootstrap configuration, if any, is shared by the
    /// scorings in order.
    pub fn result(
        &self,
        pairs: Vec<Pair<T>>,
        keep_pairs: bool,
        mut bootstrap: Option<&mut BootstrapConfig>,
    ) -> EvaluationResult<T> {
        let scorings = self
            .scorings
            .iter()
            .map(|s| s.result(&pairs, bootstrap.as_deref_mut()))
            .collect();
        EvaluationResult {
            name: self.name.clone(),
            pairs: keep_pairs.then_some(pairs),
            scorings,
        }
    }

    /// Runs the first scoring only.
    pub fn main_result(
        &self,
        pairs: Vec<Pair<T>>,
        keep_pairs: bool,
        bootstrap: Option<&mut BootstrapConfig>,
    ) -> Result<EvaluationResult<T>, EvaluationError> {
        let main = self
            .scorings
            .first()
            .ok_or_else(|| EvaluationError::NoScoring(self.name.clone()))?;
        let result = main.result(&pairs, bootstrap);
        Ok(EvaluationResult {
            name: self.name.clone(),
            pairs: keep_pairs.then_some(pairs),
            scorings: vec![result],
        })
    }
}

/// Evaluation of the annotations of a resolved corpus.
pub struct AnnotationEvaluation {
    evaluation: Evaluation<Ann>,
    pre_filter: Filter<AnnotationPredicate>,
    input_iteration: bool,
}

impl AnnotationEvaluation {
    pub fn new(evaluation: Evaluation<Ann>) -> Self {
        Self {
            evaluation,
            pre_filter: Filter::AcceptAll,
            input_iteration: false,
        }
    }

    /// Only annotations accepted by `filter` are paired.
    pub fn pre_filter(mut self, filter: Filter<AnnotationPredicate>) -> Self {
        self.pre_filter = filter.reduce();
        self
    }

    /// Pair every input annotation with itself instead of pairing references with predictions.
    pub fn input_iteration(mut self, input_iteration: bool) -> Self {
        self.input_iteration = input_iteration;
        self
    }

    pub fn evaluation(&self) -> &Evaluation<Ann> {
        &self.evaluation
    }

    pub fn evaluation_mut(&mut self) -> &mut Evaluation<Ann> {
        &mut self.evaluation
    }

    fn annotations(&self, document: &Arc<Document<Resolved>>, selector: SetSelector) -> Vec<Ann> {
        Ann::all_in(document, selector)
            .into_iter()
            .filter(|ann| self.pre_filter.accept(ann))
            .collect()
    }

    pub fn document_pairs(
        &self,
        document: &Arc<Document<Resolved>>,
    ) -> Result<Vec<Pair<Ann>>, EvaluationError> {
        if self.input_iteration {
            return Ok(self
                .annotations(document, SetSelector::Input)
                .into_iter()
                .map(|ann| Pair::matched(ann.clone(), ann))
                .collect());
        }
        let reference = self.annotations(document, SetSelector::Reference);
        let prediction = self.annotations(document, SetSelector::Prediction);
        let pairs = self.evaluation.pairs(&reference, &prediction)?;
        tracing::debug!(
            evaluation = %self.evaluation.name(),
            document = %document.id(),
            references = reference.len(),
            predictions = prediction.len(),
            pairs = pairs.len(),
            "document pairing"
        );
        Ok(pairs)
    }

    /// Pairs of every document, in document identifier order.
    pub fn pairs(&self, corpus: &Corpus<Resolved>) -> Result<Vec<Pair<Ann>>, EvaluationError> {
        let mut result = Vec::new();
        for document in corpus.documents() {
            result.extend(self.document_pairs(document)?);
        }
        Ok(result)
    }

    pub fn result(
        &self,
        corpus: &Corpus<Resolved>,
        keep_pairs: bool,
        bootstrap: Option<&mut BootstrapConfig>,
    ) -> Result<EvaluationResult<Ann>, EvaluationError> {
        let pairs = self.pairs(corpus)?;
        Ok(self.evaluation.result(pairs, keep_pairs, bootstrap))
    }

    pub fn main_result(
        &self,
        corpus: &Corpus<Resolved>,
        keep_pairs: bool,
        bootstrap: Option<&mut BootstrapConfig>,
    ) -> Result<EvaluationResult<Ann>, EvaluationError> {
        let pairs = self.pairs(corpus)?;
        self.evaluation.main_result(pairs, keep_pairs, bootstrap)
    }
}
