use crate::corpus::{Ann, Fragment};
use crate::similarity::{Constant, Similarity};
use ahash::{AHashMap, AHashSet};
use std::error::Error;
use std::fmt::{self, Display};

// Dummies stand in for unresolved references and never match anything.
fn either_is_dummy(a: &Ann, b: &Ann) -> bool {
    a.is_dummy() || b.is_dummy()
}

fn dummy_explanation(a: &Ann, b: &Ann) -> String {
    let id = if a.is_dummy() { a.id() } else { b.id() };
    format!("{} unresolved -> 0", id)
}

/// 1 if both annotations are of the same kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationKindSimilarity;

impl Similarity<Ann> for AnnotationKindSimilarity {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        if !either_is_dummy(a, b) && a.kind_tag() == b.kind_tag() {
            1.0
        } else {
            0.0
        }
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        if either_is_dummy(a, b) {
            return dummy_explanation(a, b);
        }
        format!("{}/{} = {}", a.kind_tag(), b.kind_tag(), self.compute(a, b))
    }
}

/// Fallback value for couples of different types, looked up by `(reference, prediction)`.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    values: Vec<(String, String, f64)>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<R: Into<String>, P: Into<String>>(mut self, reference: R, prediction: P, value: f64) -> Self {
        self.values.push((reference.into(), prediction.into(), value));
        self
    }
}

impl Similarity<str> for TypeTable {
    fn compute(&self, a: &str, b: &str) -> f64 {
        self.values
            .iter()
            .find(|(r, p, _)| r == a && p == b)
            .map_or(0.0, |(_, _, v)| *v)
    }

    fn explain(&self, a: &str, b: &str) -> String {
        format!("{}/{} = {}", a, b, self.compute(a, b))
    }
}

/// 1 for annotations of the same type, otherwise the score of the type similarity.
pub struct AnnotationTypeSimilarity {
    type_similarity: Box<dyn Similarity<str>>,
}

impl AnnotationTypeSimilarity {
    pub fn new<S: Similarity<str> + 'static>(type_similarity: S) -> Self {
        Self {
            type_similarity: Box::new(type_similarity),
        }
    }

    /// Different types score `value`.
    pub fn with_constant(value: f64) -> Self {
        Self::new(Constant(value))
    }
}

impl Default for AnnotationTypeSimilarity {
    fn default() -> Self {
        Self::with_constant(0.0)
    }
}

impl Similarity<Ann> for AnnotationTypeSimilarity {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        if either_is_dummy(a, b) {
            return 0.0;
        }
        if a.annotation_type() == b.annotation_type() {
            return 1.0;
        }
        self.type_similarity
            .compute(a.annotation_type(), b.annotation_type())
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        if either_is_dummy(a, b) {
            return dummy_explanation(a, b);
        }
        if a.annotation_type() == b.annotation_type() {
            return String::from("Type: = 1");
        }
        format!(
            "Type: {}",
            self.type_similarity
                .explain(a.annotation_type(), b.annotation_type())
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateSimilarity(pub String);

impl Display for DuplicateSimilarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "A similarity is already registered for type {}", self.0)
    }
}
impl Error for DuplicateSimilarity {}

/// Routes the comparison to the similarity registered for the common type of both annotations.
pub struct TypeDispatch {
    similarities: AHashMap<String, Box<dyn Similarity<Ann>>>,
    default_similarity: Box<dyn Similarity<Ann>>,
    different_similarity: Box<dyn Similarity<Ann>>,
}

impl TypeDispatch {
    /// * `default_similarity`: Used when both types are equal and nothing is registered for it.
    /// * `different_similarity`: Used when the types differ.
    pub fn new<D, F>(default_similarity: D, different_similarity: F) -> Self
    where
        D: Similarity<Ann> + 'static,
        F: Similarity<Ann> + 'static,
    {
        Self {
            similarities: AHashMap::new(),
            default_similarity: Box::new(default_similarity),
            different_similarity: Box::new(different_similarity),
        }
    }

    /// Registers `similarity` for `annotation_type`. Fails if a similarity is already registered
    /// for that type.
    pub fn add<T, S>(&mut self, annotation_type: T, similarity: S) -> Result<(), DuplicateSimilarity>
    where
        T: Into<String>,
        S: Similarity<Ann> + 'static,
    {
        let annotation_type = annotation_type.into();
        if self.similarities.contains_key(&annotation_type) {
            return Err(DuplicateSimilarity(annotation_type));
        }
        self.similarities
            .insert(annotation_type, Box::new(similarity));
        Ok(())
    }

    fn select(&self, a: &Ann, b: &Ann) -> &dyn Similarity<Ann> {
        if a.annotation_type() != b.annotation_type() {
            return self.different_similarity.as_ref();
        }
        match self.similarities.get(a.annotation_type()) {
            Some(sim) => sim.as_ref(),
            None => self.default_similarity.as_ref(),
        }
    }
}

impl Similarity<Ann> for TypeDispatch {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        if either_is_dummy(a, b) {
            return 0.0;
        }
        self.select(a, b).compute(a, b)
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        if either_is_dummy(a, b) {
            return dummy_explanation(a, b);
        }
        let explanation = self.select(a, b).explain(a, b);
        if a.annotation_type() == b.annotation_type() {
            format!("Type {}: {}", a.annotation_type(), explanation)
        } else {
            format!(
                "Type {}/{}: {}",
                a.annotation_type(),
                b.annotation_type(),
                explanation
            )
        }
    }
}

/// Best score of the inner similarity over the equivalents of the first annotation.
pub struct MaxFromEquivalence<S> {
    similarity: S,
}

impl<S: Similarity<Ann>> MaxFromEquivalence<S> {
    pub fn new(similarity: S) -> Self {
        Self { similarity }
    }

    fn best(&self, a: &Ann, b: &Ann) -> (Ann, f64) {
        let mut best = (a.clone(), 0.0);
        for equivalent in a.equivalents() {
            let s = self.similarity.compute(&equivalent, b);
            if s == 1.0 {
                return (equivalent, s);
            }
            if s > best.1 {
                best = (equivalent, s);
            }
        }
        best
    }
}

impl<S: Similarity<Ann>> Similarity<Ann> for MaxFromEquivalence<S> {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        self.best(a, b).1
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        let (best, _) = self.best(a, b);
        format!(
            "MAX EQUIV {}: {}",
            best.id(),
            self.similarity.explain(&best, b)
        )
    }
}

/// Inner similarity applied to the arguments of both relations with the same role.
pub struct RelationArgumentSimilarity<S> {
    role: String,
    similarity: S,
}

impl<S: Similarity<Ann>> RelationArgumentSimilarity<S> {
    pub fn new<R: Into<String>>(role: R, similarity: S) -> Self {
        Self {
            role: role.into(),
            similarity,
        }
    }
}

impl<S: Similarity<Ann>> Similarity<Ann> for RelationArgumentSimilarity<S> {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        match (a.argument(&self.role), b.argument(&self.role)) {
            (Some(arg_a), Some(arg_b)) => self.similarity.compute(&arg_a, &arg_b),
            _ => 0.0,
        }
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        if !a.is_relation() || !b.is_relation() {
            return String::from("No Arguments");
        }
        match (a.argument(&self.role), b.argument(&self.role)) {
            (Some(arg_a), Some(arg_b)) => format!(
                "Argument {}: {}",
                self.role,
                self.similarity.explain(&arg_a, &arg_b)
            ),
            _ => format!("No Argument {}", self.role),
        }
    }
}

/// Inner similarity applied to the targets of two normalizations or modifiers.
pub struct SingleReferenceSimilarity<S> {
    similarity: S,
}

impl<S: Similarity<Ann>> SingleReferenceSimilarity<S> {
    pub fn new(similarity: S) -> Self {
        Self { similarity }
    }
}

impl<S: Similarity<Ann>> Similarity<Ann> for SingleReferenceSimilarity<S> {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        match (a.referenced(), b.referenced()) {
            (Some(ra), Some(rb)) => self.similarity.compute(&ra, &rb),
            _ => 0.0,
        }
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        match (a.referenced(), b.referenced()) {
            (Some(ra), Some(rb)) => format!("Annotation: {}", self.similarity.explain(&ra, &rb)),
            _ => String::from("No Annotation"),
        }
    }
}

fn fragments_intersection(a: &[Fragment], b: &[Fragment]) -> usize {
    let mut result = 0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        result += a[i].intersection_len(&b[j]);
        if a[i].end() >= b[j].end() {
            j += 1;
        } else {
            i += 1;
        }
    }
    result
}

/// Covered characters in common over covered characters in total.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBoundJaccard;

impl Similarity<Ann> for TextBoundJaccard {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        let (Some(ta), Some(tb)) = (a.text_bound(), b.text_bound()) else {
            return 0.0;
        };
        let intersection = fragments_intersection(ta.fragments(), tb.fragments()) as f64;
        let union = (ta.length() + tb.length()) as f64 - intersection;
        intersection / union
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        format!("jaccard = {}", self.compute(a, b))
    }
}

/// 1 for identical boundaries, 0 for disjoint spans, `overlap_value` otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextBoundOverlap {
    overlap_value: f64,
}

impl TextBoundOverlap {
    pub fn new(overlap_value: f64) -> Self {
        Self { overlap_value }
    }
}

impl Similarity<Ann> for TextBoundOverlap {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        let (Some(ta), Some(tb)) = (a.text_bound(), b.text_bound()) else {
            return 0.0;
        };
        if ta.start() == tb.start() && ta.end() == tb.end() {
            return 1.0;
        }
        if ta.start() >= tb.end() || tb.start() >= ta.end() {
            return 0.0;
        }
        self.overlap_value
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        format!("overlap = {}", self.compute(a, b))
    }
}

/// Renaming of a relation type and of its roles into another schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeConversion {
    new_type: String,
    role_conversion: AHashMap<String, String>,
    role_deconversion: AHashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionParsingError {
    pub lineno: usize,
    pub line: String,
}

impl Display for ConversionParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Malformed type conversion at line {}: expected `type<TAB>new_type(<TAB>role<TAB>new_role)*`, got `{}`",
            self.lineno, self.line
        )
    }
}
impl Error for ConversionParsingError {}

impl TypeConversion {
    pub fn new<T, I, R, N>(new_type: T, roles: I) -> Self
    where
        T: Into<String>,
        I: IntoIterator<Item = (R, N)>,
        R: Into<String>,
        N: Into<String>,
    {
        let role_conversion: AHashMap<String, String> = roles
            .into_iter()
            .map(|(r, n)| (r.into(), n.into()))
            .collect();
        let role_deconversion = role_conversion
            .iter()
            .map(|(r, n)| (n.clone(), r.clone()))
            .collect();
        Self {
            new_type: new_type.into(),
            role_conversion,
            role_deconversion,
        }
    }

    /// Reads one conversion per line. Blank lines are skipped.
    pub fn parse_table(text: &str) -> Result<AHashMap<String, TypeConversion>, ConversionParsingError> {
        let mut result = AHashMap::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 2 || columns.len() % 2 != 0 {
                return Err(ConversionParsingError {
                    lineno: i + 1,
                    line: String::from(line),
                });
            }
            let roles = columns[2..].chunks(2).map(|c| (c[0], c[1]));
            result.insert(String::from(columns[0]), TypeConversion::new(columns[1], roles));
        }
        Ok(result)
    }

    fn convert_role<'a>(conversion: Option<&'a TypeConversion>, role: &'a str) -> &'a str {
        conversion
            .and_then(|c| c.role_conversion.get(role))
            .map_or(role, String::as_str)
    }

    fn concrete_role<'a>(conversion: Option<&'a TypeConversion>, role: &'a str) -> &'a str {
        conversion
            .and_then(|c| c.role_deconversion.get(role))
            .map_or(role, String::as_str)
    }
}

/// 1 if both relations have the same type and the same arguments, after an optional schema
/// conversion. Commutative types ignore roles.
#[derive(Debug, Clone, Default)]
pub struct SameTypeAndArguments {
    commutative_types: AHashSet<String>,
    resolve_equivalences: bool,
    conversions: AHashMap<String, TypeConversion>,
}

impl SameTypeAndArguments {
    pub fn new<I, S>(commutative_types: I, resolve_equivalences: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commutative_types: commutative_types.into_iter().map(Into::into).collect(),
            resolve_equivalences,
            conversions: AHashMap::new(),
        }
    }

    pub fn with_conversions(mut self, conversions: AHashMap<String, TypeConversion>) -> Self {
        self.conversions = conversions;
        self
    }

    fn converted_type<'a>(&'a self, ann: &'a Ann) -> (&'a str, Option<&'a TypeConversion>) {
        let conversion = self.conversions.get(ann.annotation_type());
        let new_type = conversion.map_or(ann.annotation_type(), |c| c.new_type.as_str());
        (new_type, conversion)
    }

    fn is_equivalent(&self, a: &Ann, b: &Ann) -> bool {
        if self.resolve_equivalences {
            a.equivalents().contains(b)
        } else {
            a == b
        }
    }

    fn same_commutative_arguments(&self, a: &Ann, b: &Ann) -> bool {
        let mut args_b: Vec<Ann> = b.arguments().into_iter().map(|(_, arg)| arg).collect();
        for (_, arg_a) in a.arguments() {
            match args_b.iter().position(|arg_b| self.is_equivalent(&arg_a, arg_b)) {
                Some(i) => {
                    args_b.remove(i);
                }
                None => return false,
            }
        }
        args_b.is_empty()
    }

    fn same_arguments(
        &self,
        a: &Ann,
        b: &Ann,
        conv_a: Option<&TypeConversion>,
        conv_b: Option<&TypeConversion>,
    ) -> bool {
        let mut roles: AHashSet<&str> = AHashSet::new();
        roles.extend(a.roles().into_iter().map(|r| TypeConversion::convert_role(conv_a, r)));
        roles.extend(b.roles().into_iter().map(|r| TypeConversion::convert_role(conv_b, r)));
        roles.into_iter().all(|role| {
            let arg_a = a.argument(TypeConversion::concrete_role(conv_a, role));
            let arg_b = b.argument(TypeConversion::concrete_role(conv_b, role));
            match (arg_a, arg_b) {
                (Some(arg_a), Some(arg_b)) => self.is_equivalent(&arg_a, &arg_b),
                _ => false,
            }
        })
    }

    fn matches(&self, a: &Ann, b: &Ann) -> Result<bool, String> {
        let (type_a, conv_a) = self.converted_type(a);
        let (type_b, conv_b) = self.converted_type(b);
        if type_a != type_b {
            return Err(format!("{} != {}", a.annotation_type(), b.annotation_type()));
        }
        if !a.is_relation() {
            return Err(format!("{} not relation", a.id()));
        }
        if !b.is_relation() {
            return Err(format!("{} not relation", b.id()));
        }
        if self.commutative_types.contains(type_a) {
            Ok(self.same_commutative_arguments(a, b))
        } else {
            Ok(self.same_arguments(a, b, conv_a, conv_b))
        }
    }
}

impl Similarity<Ann> for SameTypeAndArguments {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        match self.matches(a, b) {
            Ok(true) => 1.0,
            _ => 0.0,
        }
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        let (type_a, _) = self.converted_type(a);
        let comm = if self.commutative_types.contains(type_a) {
            " (commutative)"
        } else {
            ""
        };
        match self.matches(a, b) {
            Ok(true) => format!("same args{} -> 1", comm),
            Ok(false) => format!("different args{} -> 0", comm),
            Err(reason) => format!("{} -> 0", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{
        Annotation, Document, ResolveReferences, Resolved, SetSelector, Unresolved,
    };
    use crate::logger::{CheckLogger, Location};
    use rstest::rstest;
    use std::sync::Arc;

    fn frag(s: usize, e: usize) -> Vec<Fragment> {
        vec![Fragment::new(s, e).unwrap()]
    }

    /// Reference: T1 [0,10) Bacteria, T2 [20,30) Habitat, T3 [40,50) Habitat, R1 Lives_In(T1, T2),
    /// T2 ~ T3. Prediction: T1 [0,10) Bacteria, T2 [25,30) Habitat, T3 [40,50) Habitat,
    /// R1 Lives_In(T1, T3), R2 Localization(Bacterium: T1, Place: T2), N1 Negation on T2.
    fn document() -> Arc<Document<Resolved>> {
        let mut logger = CheckLogger::new();
        let mut doc: Document<Unresolved> = Document::new("D", "x".repeat(60));
        let loc = Location::new("D", 1);
        for (sel, spans) in [
            (SetSelector::Reference, [(0, 10), (20, 30), (40, 50)]),
            (SetSelector::Prediction, [(0, 10), (25, 30), (40, 50)]),
        ] {
            let types = ["Bacteria", "Habitat", "Habitat"];
            for (i, ((s, e), t)) in spans.iter().zip(types).enumerate() {
                doc.add_annotation(
                    &mut logger,
                    sel,
                    Annotation::text_bound(loc.clone(), format!("T{}", i + 1), t, frag(*s, *e)),
                );
            }
        }
        doc.add_annotation(
            &mut logger,
            SetSelector::Reference,
            Annotation::relation(
                loc.clone(),
                "R1",
                "Lives_In",
                vec![("Bacterium", "T1"), ("Location", "T2")],
            ),
        );
        doc.add_annotation(
            &mut logger,
            SetSelector::Prediction,
            Annotation::relation(
                loc.clone(),
                "R1",
                "Lives_In",
                vec![("Bacterium", "T1"), ("Location", "T3")],
            ),
        );
        doc.add_annotation(
            &mut logger,
            SetSelector::Prediction,
            Annotation::relation(
                loc.clone(),
                "R2",
                "Localization",
                vec![("Bacterium", "T1"), ("Place", "T2")],
            ),
        );
        doc.add_annotation(
            &mut logger,
            SetSelector::Prediction,
            Annotation::modifier(loc.clone(), "M1", "Negation", "T2"),
        );
        doc.add_equivalence(&mut logger, loc, vec!["T2", "T3"]);
        Arc::new(doc.resolve_references(&mut logger))
    }

    fn get(doc: &Arc<Document<Resolved>>, sel: SetSelector, id: &str) -> Ann {
        Ann::new(Arc::clone(doc), doc.lookup(sel, id).unwrap()).unwrap()
    }

    #[rstest]
    #[case("T1", "T1", 1.0)]
    #[case("T2", "T2", 0.5)]
    #[case("T2", "T3", 0.0)]
    #[case("R1", "R1", 0.0)]
    fn test_text_bound_jaccard(#[case] r: &str, #[case] p: &str, #[case] expected: f64) {
        let doc = document();
        let a = get(&doc, SetSelector::Reference, r);
        let b = get(&doc, SetSelector::Prediction, p);
        assert_eq!(TextBoundJaccard.compute(&a, &b), expected);
    }

    #[test]
    fn test_jaccard_multi_fragment_intersection() {
        let a = vec![Fragment::new(0, 5).unwrap(), Fragment::new(10, 20).unwrap()];
        let b = vec![Fragment::new(3, 12).unwrap(), Fragment::new(15, 30).unwrap()];
        assert_eq!(fragments_intersection(&a, &b), 2 + 2 + 5);
    }

    #[rstest]
    #[case(0.0, "T2", 0.0)]
    #[case(0.5, "T2", 0.5)]
    #[case(0.5, "T1", 1.0)]
    fn test_text_bound_overlap(#[case] value: f64, #[case] id: &str, #[case] expected: f64) {
        let doc = document();
        let a = get(&doc, SetSelector::Reference, id);
        let b = get(&doc, SetSelector::Prediction, id);
        assert_eq!(TextBoundOverlap::new(value).compute(&a, &b), expected);
    }

    #[test]
    fn test_max_from_equivalence() {
        let doc = document();
        let t2 = get(&doc, SetSelector::Reference, "T2");
        let p3 = get(&doc, SetSelector::Prediction, "T3");
        assert_eq!(TextBoundJaccard.compute(&t2, &p3), 0.0);
        let sim = MaxFromEquivalence::new(TextBoundJaccard);
        assert_eq!(sim.compute(&t2, &p3), 1.0);
        assert_eq!(sim.explain(&t2, &p3), "MAX EQUIV T3: jaccard = 1");
    }

    #[test]
    fn test_type_dispatch() {
        let doc = document();
        let mut dispatch = TypeDispatch::new(TextBoundOverlap::new(0.0), Constant(0.1));
        dispatch.add("Habitat", TextBoundJaccard).unwrap();
        assert_eq!(
            dispatch.add("Habitat", TextBoundJaccard),
            Err(DuplicateSimilarity(String::from("Habitat")))
        );
        let r1 = get(&doc, SetSelector::Reference, "T1");
        let r2 = get(&doc, SetSelector::Reference, "T2");
        let p2 = get(&doc, SetSelector::Prediction, "T2");
        assert_eq!(dispatch.compute(&r2, &p2), 0.5);
        assert_eq!(dispatch.compute(&r1, &p2), 0.1);
        assert_eq!(dispatch.compute(&r1, &r1), 1.0);
        assert_eq!(dispatch.explain(&r1, &p2), "Type Bacteria/Habitat: 0.1");
    }

    #[test]
    fn test_type_similarity_with_table() {
        let doc = document();
        let sim = AnnotationTypeSimilarity::new(TypeTable::new().with("Bacteria", "Habitat", 0.3));
        let t1 = get(&doc, SetSelector::Reference, "T1");
        let t2 = get(&doc, SetSelector::Prediction, "T2");
        assert_eq!(sim.compute(&t1, &t2), 0.3);
        assert_eq!(sim.compute(&t2, &t1), 0.0);
        assert_eq!(AnnotationTypeSimilarity::default().compute(&t1, &t1), 1.0);
    }

    #[test]
    fn test_unresolved_placeholders_never_match() {
        let mut logger = CheckLogger::new();
        let mut doc: Document<Unresolved> = Document::new("D", "x".repeat(10));
        let loc = Location::new("D", 1);
        for (sel, target) in [(SetSelector::Reference, "T9"), (SetSelector::Prediction, "T8")] {
            doc.add_annotation(
                &mut logger,
                sel,
                Annotation::relation(loc.clone(), "R1", "Lives_In", vec![("Location", target)]),
            );
        }
        let doc = Arc::new(doc.resolve_references(&mut logger));
        let r = get(&doc, SetSelector::Reference, "T9");
        let p = get(&doc, SetSelector::Prediction, "T8");
        assert_eq!(r.kind_tag(), p.kind_tag());
        assert_eq!(r.annotation_type(), p.annotation_type());

        let mut dispatch = TypeDispatch::new(Constant(1.0), Constant(1.0));
        dispatch.add("Lives_In", Constant(1.0)).unwrap();
        let similarities: Vec<Box<dyn Similarity<Ann>>> = vec![
            Box::new(AnnotationKindSimilarity),
            Box::new(AnnotationTypeSimilarity::with_constant(1.0)),
            Box::new(dispatch),
        ];
        let r1 = get(&doc, SetSelector::Reference, "R1");
        for sim in similarities.iter() {
            assert_eq!(sim.compute(&r, &p), 0.0);
            assert_eq!(sim.compute(&r, &r), 0.0);
            assert_eq!(sim.compute(&r1, &p), 0.0);
            assert_eq!(sim.explain(&r, &p), "T9 unresolved -> 0");
        }
        assert_eq!(AnnotationKindSimilarity.compute(&r1, &r1), 1.0);
    }

    #[test]
    fn test_relation_argument_and_kind() {
        let doc = document();
        let r1 = get(&doc, SetSelector::Reference, "R1");
        let p1 = get(&doc, SetSelector::Prediction, "R1");
        let t1 = get(&doc, SetSelector::Reference, "T1");
        let sim = RelationArgumentSimilarity::new("Bacterium", TextBoundJaccard);
        assert_eq!(sim.compute(&r1, &p1), 1.0);
        let missing = RelationArgumentSimilarity::new("Site", TextBoundJaccard);
        assert_eq!(missing.compute(&r1, &p1), 0.0);
        assert_eq!(missing.explain(&r1, &t1), "No Arguments");
        assert_eq!(AnnotationKindSimilarity.compute(&r1, &p1), 1.0);
        assert_eq!(AnnotationKindSimilarity.compute(&r1, &t1), 0.0);
    }

    #[test]
    fn test_single_reference() {
        let doc = document();
        let m1 = get(&doc, SetSelector::Prediction, "M1");
        let sim = SingleReferenceSimilarity::new(TextBoundOverlap::default());
        assert_eq!(sim.compute(&m1, &m1), 1.0);
        let t1 = get(&doc, SetSelector::Prediction, "T1");
        assert_eq!(sim.compute(&m1, &t1), 0.0);
    }

    #[test]
    fn test_parse_conversions() {
        let table = TypeConversion::parse_table(
            "Localization\tLives_In\tBacterium\tBacterium\tPlace\tLocation\n\nFoo\tBar\n",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            TypeConversion::parse_table("Foo\tBar\tdangling"),
            Err(ConversionParsingError {
                lineno: 1,
                line: String::from("Foo\tBar\tdangling")
            })
        );
        assert!(TypeConversion::parse_table("Foo").is_err());
    }

    #[test]
    fn test_same_type_and_arguments() {
        let doc = document();
        let r1 = get(&doc, SetSelector::Reference, "R1");
        let p1 = get(&doc, SetSelector::Prediction, "R1");
        let p2 = get(&doc, SetSelector::Prediction, "R2");
        let strict = SameTypeAndArguments::new(Vec::<String>::new(), false);
        assert_eq!(strict.compute(&r1, &r1), 1.0);
        assert_eq!(strict.compute(&r1, &p1), 0.0);
        assert_eq!(strict.compute(&r1, &p2), 0.0);
        let table = TypeConversion::parse_table(
            "Localization\tLives_In\tBacterium\tBacterium\tPlace\tLocation",
        )
        .unwrap();
        let converted = SameTypeAndArguments::new(Vec::<String>::new(), false).with_conversions(table);
        assert_eq!(converted.compute(&p1, &p2), 0.0);
        assert_eq!(converted.explain(&p1, &p2), "different args -> 0");
        let t1 = get(&doc, SetSelector::Reference, "T1");
        assert_eq!(converted.explain(&t1, &t1), "T1 not relation -> 0");
    }

    #[test]
    fn test_same_arguments_through_equivalence_and_commutation() {
        let doc = document();
        let r1 = get(&doc, SetSelector::Reference, "R1");
        let t1 = get(&doc, SetSelector::Reference, "T1");
        let t3 = get(&doc, SetSelector::Reference, "T3");
        let swapped = r1.virtual_relation(
            String::from("R1~1"),
            vec![
                (String::from("Bacterium"), t3.key()),
                (String::from("Location"), t1.key()),
            ],
        );
        let with_equiv = SameTypeAndArguments::new(vec!["Lives_In"], true);
        assert_eq!(with_equiv.compute(&r1, &swapped), 1.0);
        let no_equiv = SameTypeAndArguments::new(vec!["Lives_In"], false);
        assert_eq!(no_equiv.compute(&r1, &swapped), 0.0);
        let ordered = SameTypeAndArguments::new(Vec::<String>::new(), true);
        assert_eq!(ordered.compute(&r1, &swapped), 0.0);
    }
}
