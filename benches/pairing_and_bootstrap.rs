use criterion::{criterion_group, criterion_main, Criterion};
use pprof::criterion::{Output, PProfProfiler};
use serde::Deserialize;
use serde_jsonlines::json_lines;
use std::path::Path;
use steval::{
    Annotation, AnnotationEvaluation, AnnotationPredicate, BootstrapConfigBuilder, CheckLogger,
    Corpus, Evaluation, Filter, Fragment, HeuristicPairing, KindTag, Location, ResolveReferences,
    Resolved, Scoring, SetSelector, StandardMeasure, TextBoundJaccard, Unresolved,
};

#[derive(Deserialize, Clone)]
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

#[derive(Deserialize, Clone)]
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

/// Builds a corpus where every example of `path` is repeated `copies` times.
fn build_corpus<P: AsRef<Path>>(path: P, copies: usize) -> Corpus<Resolved> {
    let examples = json_lines::<Example, P>(path)
        .unwrap()
        .map(|r| r.unwrap())
        .collect::<Vec<_>>();
    let mut logger = CheckLogger::new();
    let mut corpus: Corpus<Unresolved> = Corpus::new();
    for copy in 0..copies {
        for (lineno, example) in examples.iter().cloned().enumerate() {
            let location = Location::new("corpus.jsonl", lineno as i64 + 1);
            let doc = corpus
                .new_document(format!("{}-{}", example.id, copy), example.text)
                .unwrap();
            for (selector, entries) in [
                (SetSelector::Input, example.input),
                (SetSelector::Reference, example.reference),
                (SetSelector::Prediction, example.prediction),
            ] {
                for entry in entries {
                    doc.add_annotation(&mut logger, selector, entry.into_annotation(location.clone()));
                }
            }
            for ids in example.equivalences {
                doc.add_equivalence(&mut logger, location.clone(), ids);
            }
        }
    }
    corpus.resolve_references(&mut logger)
}

fn entity_evaluation() -> AnnotationEvaluation {
    let main = Scoring::new("entities", TextBoundJaccard)
        .measures(StandardMeasure::f1_group())
        .measures(StandardMeasure::ser_group());
    AnnotationEvaluation::new(
        Evaluation::new("entities", HeuristicPairing, TextBoundJaccard).scoring(main),
    )
    .pre_filter(Filter::Leaf(AnnotationPredicate::OfKind(KindTag::TextBound)))
}

fn benchmark_pairing(c: &mut Criterion) {
    let corpus = build_corpus("./tests/data/corpus.jsonl", 500);
    let evaluation = entity_evaluation();
    c.bench_function("heuristic_pairing", |b| {
        b.iter(|| evaluation.pairs(&corpus).unwrap())
    });
}

fn benchmark_evaluation(c: &mut Criterion) {
    let corpus = build_corpus("./tests/data/corpus.jsonl", 500);
    let evaluation = entity_evaluation();
    c.bench_function("evaluation", |b| {
        b.iter(|| evaluation.main_result(&corpus, false, None).unwrap())
    });
}

fn benchmark_bootstrap(c: &mut Criterion) {
    let corpus = build_corpus("./tests/data/corpus.jsonl", 500);
    let evaluation = entity_evaluation();
    c.bench_function("sequential_bootstrap", |b| {
        b.iter(|| {
            let mut config = BootstrapConfigBuilder::new().seed(2019).build();
            evaluation
                .main_result(&corpus, false, Some(&mut config))
                .unwrap()
        })
    });
    c.bench_function("parallel_bootstrap", |b| {
        b.iter(|| {
            let mut config = BootstrapConfigBuilder::new().seed(2019).parallel(true).build();
            evaluation
                .main_result(&corpus, false, Some(&mut config))
                .unwrap()
        })
    });
}

criterion_group!(
    name=evaluation_benches;
    config = Criterion::default().sample_size(20).with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = benchmark_pairing,
    benchmark_evaluation,
    benchmark_bootstrap
);
criterion_main!(evaluation_benches);
