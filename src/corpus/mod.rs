//! The annotation graph. A `Corpus` is populated in the `Unresolved` phase, where annotations refer
//! to each other by identifier, then converted once into the `Resolved` phase where every reference
//! is an `AnnotationKey` into the arenas of the same document. The resolved graph also carries the
//! back-references and equivalence indexes, and is shared read-only through `Arc`.
mod annotation;
mod fragment;
mod handle;

pub use annotation::{
    Annotation, AnnotationKey, AnnotationKind, AnnotationSet, KindTag, Modifier, Normalization,
    Phase, Relation, Resolved, SetSelector, SetSelectorParsingError, TextBound, Unresolved,
    DUMMY_TYPE,
};
pub use fragment::{Fragment, InvalidFragment};
pub use handle::Ann;

use crate::logger::{CheckLogger, Location};
use ahash::AHashMap;
use fragment::normalize_fragments;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Reference annotations declared interchangeable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Equivalence<P: Phase> {
    location: Location,
    members: BTreeSet<P::Ref>,
}

impl<P: Phase> Equivalence<P> {
    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn members(&self) -> &BTreeSet<P::Ref> {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A text with its input, reference and prediction annotation sets.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<P: Phase> {
    id: String,
    contents: String,
    contents_len: usize,
    sets: [AnnotationSet<P>; 3],
    equivalences: Vec<Equivalence<P>>,
    back_references: BTreeMap<AnnotationKey, BTreeSet<AnnotationKey>>,
    equivalence_of: BTreeMap<AnnotationKey, usize>,
    synthetic_ids: usize,
}

impl<P: Phase> Document<P> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Length of the contents in characters.
    pub fn contents_len(&self) -> usize {
        self.contents_len
    }

    pub fn set(&self, selector: SetSelector) -> &AnnotationSet<P> {
        &self.sets[selector.index()]
    }

    pub fn annotation(&self, key: AnnotationKey) -> Option<&Annotation<P>> {
        self.sets[key.set.index()].get(key.index)
    }

    /// Finds the annotation with identifier `id` in the set `selector` or its ancestors.
    pub fn lookup(&self, selector: SetSelector, id: &str) -> Option<AnnotationKey> {
        let mut current = Some(selector);
        while let Some(sel) = current {
            if let Some(index) = self.sets[sel.index()].position(id) {
                return Some(AnnotationKey::new(sel, index));
            }
            current = sel.parent();
        }
        None
    }

    pub fn equivalences(&self) -> &[Equivalence<P>] {
        &self.equivalences
    }
}

impl Document<Unresolved> {
    pub fn new<I: Into<String>, C: Into<String>>(id: I, contents: C) -> Self {
        let contents = contents.into();
        Self {
            id: id.into(),
            contents_len: contents.chars().count(),
            contents,
            sets: [
                AnnotationSet::new(SetSelector::Input),
                AnnotationSet::new(SetSelector::Reference),
                AnnotationSet::new(SetSelector::Prediction),
            ],
            equivalences: Vec::new(),
            back_references: BTreeMap::new(),
            equivalence_of: BTreeMap::new(),
            synthetic_ids: 0,
        }
    }

    /// Inserts `annotation` in the set `selector` and returns its key.
    ///
    /// Text-bound fragments are sorted and cleaned. An identifier already used in the set or its
    /// ancestors is replaced by a fresh one; both alterations are reported to `logger`.
    ///
    /// * `logger`: Receives the data-quality diagnostics.
    /// * `selector`: Set receiving the annotation.
    /// * `annotation`: The annotation, built with one of the `Annotation` constructors.
    pub fn add_annotation(
        &mut self,
        logger: &mut CheckLogger,
        selector: SetSelector,
        mut annotation: Annotation<Unresolved>,
    ) -> AnnotationKey {
        if let AnnotationKind::TextBound(tb) = &mut annotation.kind {
            let fragments = std::mem::take(&mut tb.fragments);
            tb.fragments =
                normalize_fragments(logger, &annotation.location, fragments, self.contents_len);
        }
        if self.lookup(selector, &annotation.id).is_some() {
            let fresh = self.fresh_id(selector, &annotation.id);
            logger.serious(
                &annotation.location,
                format!(
                    "duplicate annotation identifier: {} (in {} set) -- we assign a fresh identifier {}",
                    annotation.id, selector, fresh
                ),
            );
            annotation.id = fresh;
        }
        self.sets[selector.index()].push(annotation)
    }

    fn fresh_id(&mut self, selector: SetSelector, id: &str) -> String {
        loop {
            self.synthetic_ids += 1;
            let candidate = format!("{}-{}", id, self.synthetic_ids);
            if self.lookup(selector, &candidate).is_none() {
                return candidate;
            }
        }
    }

    /// Declares the reference annotations `ids` interchangeable. Existing equivalences sharing an
    /// identifier are merged into this one.
    pub fn add_equivalence<I, S>(&mut self, logger: &mut CheckLogger, location: Location, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut members: BTreeSet<String> = ids.into_iter().map(Into::into).collect();
        if members.is_empty() {
            logger.suspicious(&location, "empty equivalence");
            return;
        }
        let (overlapping, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.equivalences)
            .into_iter()
            .partition(|eq| !eq.members.is_disjoint(&members));
        self.equivalences = kept;
        for eq in overlapping {
            logger.suspicious(
                &location,
                format!(
                    "overlapping equivalences ({}) and ({})",
                    join_ids(&members),
                    join_ids(&eq.members)
                ),
            );
            members.extend(eq.members);
        }
        self.equivalences.push(Equivalence { location, members });
    }
}

fn join_ids(ids: &BTreeSet<String>) -> String {
    ids.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}

impl Document<Resolved> {
    /// Annotations referring to `key`, by key order.
    pub fn back_references(&self, key: AnnotationKey) -> impl Iterator<Item = AnnotationKey> + '_ {
        self.back_references
            .get(&key)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// The equivalence containing `key`, if any.
    pub fn equivalence_of(&self, key: AnnotationKey) -> Option<&Equivalence<Resolved>> {
        self.equivalence_of
            .get(&key)
            .and_then(|i| self.equivalences.get(*i))
    }

    /// Members of the equivalence containing `key`, or `key` alone.
    pub fn equivalents(&self, key: AnnotationKey) -> Vec<AnnotationKey> {
        match self.equivalence_of(key) {
            Some(eq) => eq.members.iter().copied().collect(),
            None => vec![key],
        }
    }

    fn rebuild_indexes(&mut self) {
        let mut back_references: BTreeMap<AnnotationKey, BTreeSet<AnnotationKey>> =
            BTreeMap::new();
        for set in self.sets.iter() {
            for (referrer, annotation) in set.keys().zip(set.iter()) {
                for target in annotation.kind.references() {
                    back_references.entry(*target).or_default().insert(referrer);
                }
            }
        }
        self.back_references = back_references;
        self.equivalence_of = index_equivalences(&self.equivalences);
    }
}

fn index_equivalences(equivalences: &[Equivalence<Resolved>]) -> BTreeMap<AnnotationKey, usize> {
    equivalences
        .iter()
        .enumerate()
        .flat_map(|(i, eq)| eq.members.iter().map(move |key| (*key, i)))
        .collect()
}

/// Conversion of identifiers into keys. Missing targets are replaced by dummies appended at
/// the end of the referrer's set.
struct Resolver {
    ids: [AHashMap<String, usize>; 3],
    lens: [usize; 3],
    dummies: [Vec<Annotation<Resolved>>; 3],
    back_references: BTreeMap<AnnotationKey, BTreeSet<AnnotationKey>>,
}

impl Resolver {
    fn new(sets: &[AnnotationSet<Unresolved>; 3]) -> Self {
        Self {
            ids: [sets[0].ids.clone(), sets[1].ids.clone(), sets[2].ids.clone()],
            lens: [sets[0].len(), sets[1].len(), sets[2].len()],
            dummies: [Vec::new(), Vec::new(), Vec::new()],
            back_references: BTreeMap::new(),
        }
    }

    fn lookup(&self, selector: SetSelector, id: &str) -> Option<AnnotationKey> {
        let mut current = Some(selector);
        while let Some(sel) = current {
            if let Some(index) = self.ids[sel.index()].get(id) {
                return Some(AnnotationKey::new(sel, *index));
            }
            current = sel.parent();
        }
        None
    }

    fn resolve(
        &mut self,
        logger: &mut CheckLogger,
        location: &Location,
        referrer: AnnotationKey,
        id: &str,
    ) -> AnnotationKey {
        let target = match self.lookup(referrer.set, id) {
            Some(key) => key,
            None => {
                logger.serious(
                    location,
                    format!("cannot resolve annotation reference {}", id),
                );
                let set = referrer.set.index();
                let index = self.lens[set];
                self.lens[set] += 1;
                self.ids[set].insert(id.to_string(), index);
                self.dummies[set].push(Annotation {
                    id: id.to_string(),
                    annotation_type: DUMMY_TYPE.to_string(),
                    location: location.clone(),
                    kind: AnnotationKind::Dummy,
                });
                AnnotationKey::new(referrer.set, index)
            }
        };
        self.back_references
            .entry(target)
            .or_default()
            .insert(referrer);
        target
    }

    fn resolve_kind(
        &mut self,
        logger: &mut CheckLogger,
        location: &Location,
        referrer: AnnotationKey,
        kind: AnnotationKind<Unresolved>,
    ) -> AnnotationKind<Resolved> {
        match kind {
            AnnotationKind::TextBound(tb) => AnnotationKind::TextBound(tb),
            AnnotationKind::Dummy => AnnotationKind::Dummy,
            AnnotationKind::Relation(rel) => {
                let arguments = rel
                    .arguments
                    .into_iter()
                    .map(|(role, id)| {
                        let key = self.resolve(logger, location, referrer, &id);
                        (role, key)
                    })
                    .collect();
                AnnotationKind::Relation(Relation { arguments })
            }
            AnnotationKind::Normalization(norm) => AnnotationKind::Normalization(Normalization {
                annotation: self.resolve(logger, location, referrer, &norm.annotation),
                referent: norm.referent,
            }),
            AnnotationKind::Modifier(modifier) => AnnotationKind::Modifier(Modifier {
                annotation: self.resolve(logger, location, referrer, &modifier.annotation),
            }),
        }
    }

    fn resolve_set(
        &mut self,
        logger: &mut CheckLogger,
        set: AnnotationSet<Unresolved>,
    ) -> Vec<Annotation<Resolved>> {
        let selector = set.selector;
        set.annotations
            .into_iter()
            .enumerate()
            .map(|(index, annotation)| {
                let referrer = AnnotationKey::new(selector, index);
                let kind =
                    self.resolve_kind(logger, &annotation.location, referrer, annotation.kind);
                Annotation {
                    id: annotation.id,
                    annotation_type: annotation.annotation_type,
                    location: annotation.location,
                    kind,
                }
            })
            .collect()
    }

    fn resolve_equivalence(
        &self,
        logger: &mut CheckLogger,
        equivalence: Equivalence<Unresolved>,
    ) -> Option<Equivalence<Resolved>> {
        let mut members = BTreeSet::new();
        for id in equivalence.members.iter() {
            match self.lookup(SetSelector::Reference, id) {
                Some(key) => {
                    members.insert(key);
                }
                None => logger.serious(
                    &equivalence.location,
                    format!("cannot resolve equivalent annotation {}", id),
                ),
            }
        }
        if members.is_empty() {
            logger.suspicious(&equivalence.location, "equivalence with no resolvable annotation");
            return None;
        }
        Some(Equivalence {
            location: equivalence.location,
            members,
        })
    }

    fn into_set(
        &mut self,
        selector: SetSelector,
        mut annotations: Vec<Annotation<Resolved>>,
    ) -> AnnotationSet<Resolved> {
        let i = selector.index();
        annotations.append(&mut self.dummies[i]);
        AnnotationSet {
            selector,
            annotations,
            ids: std::mem::take(&mut self.ids[i]),
        }
    }
}

/// Conversion of string references into annotation keys.
pub trait ResolveReferences {
    type Output;

    /// Resolves every reference and builds the back-reference and equivalence indexes.
    /// Unresolvable references are reported to `logger` and replaced by dummy annotations.
    fn resolve_references(self, logger: &mut CheckLogger) -> Self::Output;
}

impl ResolveReferences for Document<Unresolved> {
    type Output = Document<Resolved>;

    fn resolve_references(self, logger: &mut CheckLogger) -> Document<Resolved> {
        let Document {
            id,
            contents,
            contents_len,
            sets,
            equivalences,
            synthetic_ids,
            ..
        } = self;
        let mut resolver = Resolver::new(&sets);
        let [input, reference, prediction] = sets;
        let input = resolver.resolve_set(logger, input);
        let reference = resolver.resolve_set(logger, reference);
        let prediction = resolver.resolve_set(logger, prediction);
        let equivalences: Vec<Equivalence<Resolved>> = equivalences
            .into_iter()
            .filter_map(|eq| resolver.resolve_equivalence(logger, eq))
            .collect();
        let sets = [
            resolver.into_set(SetSelector::Input, input),
            resolver.into_set(SetSelector::Reference, reference),
            resolver.into_set(SetSelector::Prediction, prediction),
        ];
        let equivalence_of = index_equivalences(&equivalences);
        tracing::debug!(document = %id, "resolved annotation references");
        Document {
            id,
            contents,
            contents_len,
            sets,
            equivalences,
            back_references: resolver.back_references,
            equivalence_of,
            synthetic_ids,
        }
    }
}

impl ResolveReferences for Document<Resolved> {
    type Output = Document<Resolved>;

    fn resolve_references(mut self, _logger: &mut CheckLogger) -> Document<Resolved> {
        self.rebuild_indexes();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusError {
    DuplicateDocument(String),
}

impl Display for CorpusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateDocument(id) => write!(f, "Duplicate document identifier: {}", id),
        }
    }
}
impl Error for CorpusError {}

/// Documents ordered by identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus<P: Phase> {
    documents: BTreeMap<String, Arc<Document<P>>>,
}

impl<P: Phase> Default for Corpus<P> {
    fn default() -> Self {
        Self {
            documents: BTreeMap::new(),
        }
    }
}

impl<P: Phase> Corpus<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, id: &str) -> Option<&Arc<Document<P>>> {
        self.documents.get(id)
    }

    pub fn documents(&self) -> impl Iterator<Item = &Arc<Document<P>>> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl Corpus<Unresolved> {
    /// Adds a document. Its identifier must be new to the corpus.
    pub fn add_document(&mut self, document: Document<Unresolved>) -> Result<(), CorpusError> {
        if self.documents.contains_key(&document.id) {
            return Err(CorpusError::DuplicateDocument(document.id));
        }
        self.documents
            .insert(document.id.clone(), Arc::new(document));
        Ok(())
    }

    /// Creates an empty document and returns it for population.
    pub fn new_document<I: Into<String>, C: Into<String>>(
        &mut self,
        id: I,
        contents: C,
    ) -> Result<&mut Document<Unresolved>, CorpusError> {
        let document = Document::new(id, contents);
        let id = document.id.clone();
        self.add_document(document)?;
        self.document_mut(&id)
            .ok_or(CorpusError::DuplicateDocument(id))
    }

    pub fn document_mut(&mut self, id: &str) -> Option<&mut Document<Unresolved>> {
        self.documents.get_mut(id).map(Arc::make_mut)
    }
}

fn resolve_documents<P>(
    documents: BTreeMap<String, Arc<Document<P>>>,
    logger: &mut CheckLogger,
) -> BTreeMap<String, Arc<Document<Resolved>>>
where
    P: Phase,
    Document<P>: ResolveReferences<Output = Document<Resolved>>,
{
    documents
        .into_iter()
        .map(|(id, doc)| {
            let doc = Arc::try_unwrap(doc).unwrap_or_else(|shared| (*shared).clone());
            (id, Arc::new(doc.resolve_references(logger)))
        })
        .collect()
}

impl ResolveReferences for Corpus<Unresolved> {
    type Output = Corpus<Resolved>;

    fn resolve_references(self, logger: &mut CheckLogger) -> Corpus<Resolved> {
        Corpus {
            documents: resolve_documents(self.documents, logger),
        }
    }
}

impl ResolveReferences for Corpus<Resolved> {
    type Output = Corpus<Resolved>;

    fn resolve_references(self, logger: &mut CheckLogger) -> Corpus<Resolved> {
        Corpus {
            documents: resolve_documents(self.documents, logger),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::CheckLevel;

    fn loc(line: i64) -> Location {
        Location::new("doc.a2", line)
    }

    fn span(start: usize, end: usize) -> Vec<Fragment> {
        vec![Fragment::new(start, end).unwrap()]
    }

    fn sample_document(logger: &mut CheckLogger) -> Document<Unresolved> {
        let mut doc = Document::new("D1", "Bacillus subtilis lives in the soil of the garden.");
        doc.add_annotation(
            logger,
            SetSelector::Reference,
            Annotation::text_bound(loc(1), "T1", "Microorganism", span(0, 17)),
        );
        doc.add_annotation(
            logger,
            SetSelector::Reference,
            Annotation::text_bound(loc(2), "T2", "Habitat", span(31, 35)),
        );
        doc.add_annotation(
            logger,
            SetSelector::Reference,
            Annotation::relation(
                loc(3),
                "R1",
                "Lives_In",
                vec![("Microorganism", "T1"), ("Location", "T2")],
            ),
        );
        doc.add_annotation(
            logger,
            SetSelector::Reference,
            Annotation::normalization(loc(4), "N1", "OntoBiotope", "T2", "OBT:000427"),
        );
        doc
    }

    #[test]
    fn test_resolution_and_back_references() {
        let mut logger = CheckLogger::new();
        let doc = sample_document(&mut logger).resolve_references(&mut logger);
        assert!(logger.is_empty());
        let t2 = doc.lookup(SetSelector::Reference, "T2").unwrap();
        let r1 = doc.lookup(SetSelector::Reference, "R1").unwrap();
        let n1 = doc.lookup(SetSelector::Reference, "N1").unwrap();
        let refs: Vec<AnnotationKey> = doc.back_references(t2).collect();
        assert_eq!(refs, vec![r1, n1]);
        let rel = doc.annotation(r1).unwrap().as_relation().unwrap();
        assert_eq!(rel.argument("Location"), Some(&t2));
        assert_eq!(doc.equivalents(t2), vec![t2]);
    }

    #[test]
    fn test_unresolved_reference_becomes_dummy() {
        let mut logger = CheckLogger::new();
        let mut doc = Document::new("D1", "some text");
        doc.add_annotation(
            &mut logger,
            SetSelector::Prediction,
            Annotation::relation(loc(1), "R1", "Lives_In", vec![("Microorganism", "T9")]),
        );
        doc.add_annotation(
            &mut logger,
            SetSelector::Prediction,
            Annotation::modifier(loc(2), "M1", "Negation", "T9"),
        );
        let doc = doc.resolve_references(&mut logger);
        assert_eq!(logger.count(CheckLevel::Serious), 1);
        assert_eq!(
            logger.messages()[0].body,
            "cannot resolve annotation reference T9"
        );
        let dummy = doc.lookup(SetSelector::Prediction, "T9").unwrap();
        assert_eq!(dummy, AnnotationKey::new(SetSelector::Prediction, 2));
        let annotation = doc.annotation(dummy).unwrap();
        assert_eq!(annotation.kind().tag(), KindTag::Dummy);
        assert_eq!(annotation.annotation_type(), DUMMY_TYPE);
        assert_eq!(doc.back_references(dummy).count(), 2);
    }

    #[test]
    fn test_prediction_resolves_through_input() {
        let mut logger = CheckLogger::new();
        let mut doc = Document::new("D1", "some text here");
        doc.add_annotation(
            &mut logger,
            SetSelector::Input,
            Annotation::text_bound(loc(1), "T1", "Gene", span(0, 4)),
        );
        doc.add_annotation(
            &mut logger,
            SetSelector::Prediction,
            Annotation::modifier(loc(2), "M1", "Negation", "T1"),
        );
        let doc = doc.resolve_references(&mut logger);
        assert!(logger.is_empty());
        let m1 = doc.lookup(SetSelector::Prediction, "M1").unwrap();
        let target = doc.annotation(m1).unwrap().single_reference().copied();
        assert_eq!(target, Some(AnnotationKey::new(SetSelector::Input, 0)));
    }

    #[test]
    fn test_duplicate_identifier_gets_fresh_id() {
        let mut logger = CheckLogger::new();
        let mut doc = Document::new("D1", "some text here");
        doc.add_annotation(
            &mut logger,
            SetSelector::Input,
            Annotation::text_bound(loc(1), "T1", "Gene", span(0, 4)),
        );
        let key = doc.add_annotation(
            &mut logger,
            SetSelector::Reference,
            Annotation::text_bound(loc(2), "T1", "Gene", span(5, 9)),
        );
        assert_eq!(logger.highest_level(), Some(CheckLevel::Serious));
        assert_eq!(doc.annotation(key).unwrap().id(), "T1-1");
        assert_eq!(doc.lookup(SetSelector::Reference, "T1-1"), Some(key));
    }

    #[test]
    fn test_equivalences_merge() {
        let mut logger = CheckLogger::new();
        let mut doc = Document::new("D1", "");
        doc.add_equivalence(&mut logger, loc(1), vec!["T1", "T2"]);
        doc.add_equivalence(&mut logger, loc(2), vec!["T2", "T3"]);
        assert_eq!(doc.equivalences().len(), 1);
        let members: Vec<&str> = doc.equivalences()[0]
            .members()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(members, vec!["T1", "T2", "T3"]);
        assert_eq!(logger.count(CheckLevel::Suspicious), 1);
        doc.add_equivalence(&mut logger, loc(3), Vec::<String>::new());
        assert_eq!(doc.equivalences().len(), 1);
        assert_eq!(logger.messages()[1].body, "empty equivalence");
    }

    #[test]
    fn test_equivalence_resolution() {
        let mut logger = CheckLogger::new();
        let mut doc = Document::new("D1", "Bacillus subtilis and B. subtilis");
        doc.add_annotation(
            &mut logger,
            SetSelector::Reference,
            Annotation::text_bound(loc(1), "T1", "Microorganism", span(0, 17)),
        );
        doc.add_annotation(
            &mut logger,
            SetSelector::Reference,
            Annotation::text_bound(loc(2), "T2", "Microorganism", span(22, 33)),
        );
        doc.add_equivalence(&mut logger, loc(3), vec!["T1", "T2", "T7"]);
        doc.add_equivalence(&mut logger, loc(4), vec!["T8"]);
        let doc = doc.resolve_references(&mut logger);
        assert_eq!(logger.count(CheckLevel::Serious), 2);
        assert_eq!(logger.count(CheckLevel::Suspicious), 1);
        assert_eq!(doc.equivalences().len(), 1);
        let t1 = doc.lookup(SetSelector::Reference, "T1").unwrap();
        let t2 = doc.lookup(SetSelector::Reference, "T2").unwrap();
        assert_eq!(doc.equivalents(t1), vec![t1, t2]);
        assert_eq!(doc.equivalents(t2), vec![t1, t2]);
    }

    #[test]
    fn test_resolving_twice_changes_nothing() {
        let mut logger = CheckLogger::new();
        let mut corpus = Corpus::new();
        let doc = sample_document(&mut logger);
        corpus.add_document(doc).unwrap();
        let once = corpus.resolve_references(&mut logger);
        let twice = once.clone().resolve_references(&mut logger);
        assert_eq!(once, twice);
        assert!(logger.is_empty());
    }

    #[test]
    fn test_duplicate_document() {
        let mut corpus = Corpus::new();
        corpus.new_document("D1", "text").unwrap();
        assert_eq!(
            corpus.add_document(Document::new("D1", "other")),
            Err(CorpusError::DuplicateDocument(String::from("D1")))
        );
        assert_eq!(corpus.len(), 1);
    }
}
