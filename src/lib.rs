//! Evaluation of predicted text annotations against reference annotations, in the manner of the
//! BioNLP shared tasks. The library is built with a focus on performance and soundness.
//!
//! # Pipeline
//! * A collaborator parses documents into a `Corpus<Unresolved>`: text-bound spans, relations,
//!     normalizations, modifiers and equivalences, each in the input, reference or prediction set.
//!     Data-quality problems are reported to a `CheckLogger` and never abort the build.
//! * `resolve_references` turns it into a `Corpus<Resolved>`, where every reference is an
//!     `AnnotationKey` and back-references and equivalences are indexed. Unresolvable references
//!     become dummy annotations.
//! * Similarities are composed once: type dispatch, span Jaccard, argument matching, hierarchy-aware
//!     normalization scores, cutoffs, products.
//! * A pairing algorithm aligns references with predictions. `HeuristicPairing` is a greedy
//!     approximation of the best one-to-one alignment.
//! * Each `Scoring` filters the pairs and computes its measures (recall, precision, F1, SER, ...),
//!     optionally with bootstrap confidence intervals.
//!
//! # Terminology
//! * A reference annotation is a gold-standard annotation; a prediction is produced by the
//!     system under evaluation.
//! * A pair aligns a reference with a prediction. Either side may be absent, but not both: a
//!     reference alone is a false negative, a prediction alone a false positive.
//! * An equivalence is a group of reference annotations that are interchangeable.
//!
//! # Example
//! ```rust
//! use steval::{
//!     AnnotationEvaluation, CheckLogger, Corpus, Evaluation, Fragment, HeuristicPairing,
//!     Location, ResolveReferences, Scoring, SetSelector, StandardMeasure, TextBoundJaccard,
//!     Unresolved, Annotation,
//! };
//!
//! let mut logger = CheckLogger::new();
//! let mut corpus: Corpus<Unresolved> = Corpus::new();
//! let doc = corpus.new_document("D1", "Bacillus subtilis lives in soil").unwrap();
//! let location = Location::new("D1.a2", 1);
//! let span = |start, end| vec![Fragment::new(start, end).unwrap()];
//! doc.add_annotation(
//!     &mut logger,
//!     SetSelector::Reference,
//!     Annotation::text_bound(location.clone(), "T1", "Microorganism", span(0, 17)),
//! );
//! doc.add_annotation(
//!     &mut logger,
//!     SetSelector::Prediction,
//!     Annotation::text_bound(location, "T1", "Microorganism", span(0, 17)),
//! );
//! let corpus = corpus.resolve_references(&mut logger);
//! assert!(logger.is_empty());
//!
//! let scoring = Scoring::new("main", TextBoundJaccard).measures(StandardMeasure::f1_group());
//! let evaluation = AnnotationEvaluation::new(
//!     Evaluation::new("entities", HeuristicPairing, TextBoundJaccard).scoring(scoring),
//! );
//! let result = evaluation.main_result(&corpus, false, None).unwrap();
//! assert_eq!(result.main().unwrap().get("F1").unwrap().value, 1.0);
//! ```

mod config;
mod corpus;
mod evaluation;
mod filter;
mod logger;
mod metrics;
mod pairing;
mod reporter;
mod scoring;
mod similarity;

// The public api starts here
pub use logger::{CheckLevel, CheckLevelParsingError, CheckLogger, CheckMessage, Location};

pub use corpus::{
    Ann, Annotation, AnnotationKey, AnnotationKind, AnnotationSet, Corpus, CorpusError, Document,
    Equivalence, Fragment, InvalidFragment, KindTag, Modifier, Normalization, Phase, Relation,
    ResolveReferences, Resolved, SetSelector, SetSelectorParsingError, TextBound, Unresolved,
    DUMMY_TYPE,
};

pub use filter::{AnnotationPredicate, Filter, FnPredicate, PairPredicate, Predicate, Reduce};

pub use similarity::{
    AnnotationKindSimilarity, AnnotationTypeSimilarity, Constant, ConversionParsingError, Cutoff,
    DuplicateSimilarity, FnSimilarity, HierarchyParsingError, Identity, Max, MaxFromEquivalence,
    Min, NormalizationJaccard, NormalizationSimilarity, Product, RelationArgumentSimilarity,
    SameTypeAndArguments, SeeDevEventSimilarity, Similarity, SingleReferenceSimilarity,
    TextBoundJaccard, TextBoundOverlap, TypeConversion, TypeDispatch, TypeTable, WangSimilarity,
};

pub use pairing::{
    HeuristicPairing, Pair, PairError, PairingAlgorithm, PairingError, PredictionPairing,
    ReferencePairing, SaturatedEventPairing, Selector, SelectorParsingError,
};

pub use metrics::{
    AggregateFunction, AggregateMeasure, FScore, Measure, MeasureDirection,
    ParsingAggregateFunctionError, ParsingMeasureDirectionError, ParsingStandardMeasureError,
    StandardMeasure,
};

pub use scoring::{ConfidenceInterval, MeasureResult, Scoring, ScoringResult};

pub use config::{BootstrapConfig, BootstrapConfigBuilder, DEFAULT_RESAMPLES};

pub use evaluation::{AnnotationEvaluation, Evaluation, EvaluationError, EvaluationResult};

pub use reporter::{ReportRow, Reporter, DEFAULT_CONFIDENCE};
