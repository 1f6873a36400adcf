use serde::Deserialize;
use serde_jsonlines::json_lines;
use steval::{
    Annotation, AnnotationEvaluation, AnnotationPredicate, BootstrapConfigBuilder, CheckLevel,
    CheckLogger, Corpus, Evaluation, EvaluationResult, Filter, Fragment, HeuristicPairing,
    KindTag, Location, MeasureResult, Reporter, ResolveReferences, Resolved,
    SameTypeAndArguments, SaturatedEventPairing, Scoring, SetSelector, StandardMeasure,
    TextBoundJaccard, Unresolved,
};

pub trait CloseEnough {
    fn are_close(&self, other: &Self, eps: f64) -> bool;
}

impl CloseEnough for f64 {
    fn are_close(&self, other: &Self, eps: f64) -> bool {
        f64::abs(self - other) < eps
    }
}

// Resamples are not compared, only the name and value.
impl CloseEnough for MeasureResult {
    fn are_close(&self, other: &Self, eps: f64) -> bool {
        self.name == other.name && self.value.are_close(&other.value, eps)
    }
}

#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Entry {
    TextBound {
        id: String,
        #[serde(rename = "type")]
        annotation_type: String,
        fragments: Vec<(usize, usize)>,
    },
    Relation {
        id: String,
        #[serde(rename = "type")]
        annotation_type: String,
        arguments: Vec<(String, String)>,
    },
}

impl Entry {
    fn into_annotation(self, location: Location) -> Annotation<Unresolved> {
        match self {
            Entry::TextBound {
                id,
                annotation_type,
                fragments,
            } => {
                let fragments = fragments
                    .into_iter()
                    .map(|(s, e)| Fragment::new(s, e).unwrap())
                    .collect();
                Annotation::text_bound(location, id, annotation_type, fragments)
            }
            Entry::Relation {
                id,
                annotation_type,
                arguments,
            } => Annotation::relation(location, id, annotation_type, arguments),
        }
    }
}

#[derive(Deserialize)]
struct Example {
    id: String,
    text: String,
    #[serde(default)]
    input: Vec<Entry>,
    #[serde(default)]
    reference: Vec<Entry>,
    #[serde(default)]
    prediction: Vec<Entry>,
    #[serde(default)]
    equivalences: Vec<Vec<String>>,
}

fn load_corpus(logger: &mut CheckLogger) -> Corpus<Resolved> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let examples = json_lines::<Example, _>("tests/data/corpus.jsonl")
        .expect("file corpus.jsonl not found in test data directory")
        .map(|r| r.unwrap());
    let mut corpus: Corpus<Unresolved> = Corpus::new();
    for (lineno, example) in examples.enumerate() {
        let location = Location::new("corpus.jsonl", lineno as i64 + 1);
        let doc = corpus.new_document(example.id, example.text).unwrap();
        for (selector, entries) in [
            (SetSelector::Input, example.input),
            (SetSelector::Reference, example.reference),
            (SetSelector::Prediction, example.prediction),
        ] {
            for entry in entries {
                doc.add_annotation(logger, selector, entry.into_annotation(location.clone()));
            }
        }
        for ids in example.equivalences {
            doc.add_equivalence(logger, location.clone(), ids);
        }
    }
    corpus.resolve_references(logger)
}

fn entity_evaluation() -> AnnotationEvaluation {
    let main = Scoring::new("entities", TextBoundJaccard)
        .measures(StandardMeasure::f1_group())
        .measures(StandardMeasure::count_group());
    AnnotationEvaluation::new(
        Evaluation::new("entities", HeuristicPairing, TextBoundJaccard).scoring(main),
    )
    .pre_filter(Filter::Leaf(AnnotationPredicate::OfKind(KindTag::TextBound)))
}

fn relation_evaluation() -> AnnotationEvaluation {
    let similarity = || SameTypeAndArguments::new(Vec::<String>::new(), false);
    let main = Scoring::new("relations", similarity()).measures(StandardMeasure::f1_group());
    AnnotationEvaluation::new(
        Evaluation::new("relations", SaturatedEventPairing::new(), similarity()).scoring(main),
    )
    .pre_filter(Filter::Leaf(AnnotationPredicate::OfKind(KindTag::Relation)))
}

fn value(result: &EvaluationResult<steval::Ann>, measure: &str) -> f64 {
    result.main().unwrap().get(measure).unwrap().value
}

#[test]
fn unresolved_reference_is_reported() {
    let mut logger = CheckLogger::new();
    let corpus = load_corpus(&mut logger);
    assert_eq!(corpus.len(), 3);
    assert_eq!(logger.highest_level(), Some(CheckLevel::Serious));
    assert_eq!(logger.count(CheckLevel::Serious), 1);
    assert!(logger.messages()[0]
        .complete_message()
        .contains("cannot resolve annotation reference T4"));
}

#[test]
fn entity_scores() {
    let mut logger = CheckLogger::new();
    let corpus = load_corpus(&mut logger);
    let result = entity_evaluation().main_result(&corpus, true, None).unwrap();
    assert_eq!(result.pairs.as_ref().map(Vec::len), Some(6));
    assert!(value(&result, "Recall").are_close(&0.35, 1e-9));
    assert!(value(&result, "Precision").are_close(&0.4375, 1e-9));
    assert!(value(&result, "F1").are_close(&(7.0 / 18.0), 1e-9));
    assert_eq!(value(&result, "References"), 5.0);
    assert_eq!(value(&result, "Predictions"), 4.0);
}

#[test]
fn saturated_relation_scores() {
    let mut logger = CheckLogger::new();
    let corpus = load_corpus(&mut logger);
    let result = relation_evaluation().result(&corpus, true, None).unwrap();
    let pairs: Vec<String> = result
        .pairs
        .as_ref()
        .unwrap()
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(pairs, vec!["(-, R2:Lives_In)", "(R1:Lives_In, R1:Lives_In)"]);
    let expected = MeasureResult {
        name: String::from("Recall"),
        direction: steval::MeasureDirection::HigherIsBetter,
        value: 1.0,
        resamples: Vec::new(),
    };
    let main = result.main().unwrap();
    assert!(main.get("Recall").unwrap().are_close(&expected, 1e-9));
    assert!(value(&result, "Precision").are_close(&0.5, 1e-9));
}

#[test]
fn seeded_bootstrap_is_reproducible() {
    let mut logger = CheckLogger::new();
    let corpus = load_corpus(&mut logger);
    let evaluation = entity_evaluation();
    let mut sequential = BootstrapConfigBuilder::new().seed(2019).resamples(200).build();
    let mut parallel = BootstrapConfigBuilder::new()
        .seed(2019)
        .resamples(200)
        .parallel(true)
        .build();
    let a = evaluation
        .main_result(&corpus, false, Some(&mut sequential))
        .unwrap();
    let b = evaluation
        .main_result(&corpus, false, Some(&mut parallel))
        .unwrap();
    // Empty denominators make NaN resamples, so compare bit patterns.
    let bits = |r: &EvaluationResult<steval::Ann>| -> Vec<Vec<u64>> {
        r.main()
            .unwrap()
            .measures
            .iter()
            .map(|m| m.resamples.iter().map(|v| v.to_bits()).collect())
            .collect()
    };
    assert_eq!(bits(&a), bits(&b));
    let recall = a.main().unwrap().get("Recall").unwrap();
    assert_eq!(recall.resamples.len(), 200);
    let interval = recall.confidence_interval(0.95).unwrap();
    assert!(interval.low.total_cmp(&interval.high).is_le());

    let report = Reporter::from(a.main().unwrap()).to_string();
    assert!(report.starts_with("Measure, Value, Low, High\nF1, "));
    assert_eq!(report.lines().count(), 6);
}
