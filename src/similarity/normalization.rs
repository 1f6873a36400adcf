use crate::corpus::{Ann, KindTag, SetSelector};
use crate::filter::Predicate;
use crate::similarity::Similarity;
use ahash::AHashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{self, Display};
use std::sync::RwLock;

/// Compares the referents of the normalizations pointing to two annotations. The referents of
/// the first annotation are collected from the reference set, those of the second from the
/// prediction set.
pub struct NormalizationSimilarity {
    normalization_type: String,
    accepted_referents: Option<Box<dyn Predicate<str>>>,
    similarity: Box<dyn Similarity<BTreeSet<String>>>,
    referent_map: AHashMap<String, String>,
}

impl NormalizationSimilarity {
    pub fn new<T, S>(normalization_type: T, similarity: S) -> Self
    where
        T: Into<String>,
        S: Similarity<BTreeSet<String>> + 'static,
    {
        Self {
            normalization_type: normalization_type.into(),
            accepted_referents: None,
            similarity: Box::new(similarity),
            referent_map: AHashMap::new(),
        }
    }

    /// Only referents accepted by `filter` are compared. Applied after the referent map.
    pub fn accepted_referents<F: Predicate<str> + 'static>(mut self, filter: F) -> Self {
        self.accepted_referents = Some(Box::new(filter));
        self
    }

    /// Referents found in `map` are replaced by the associated value before comparison.
    pub fn referent_map(mut self, map: AHashMap<String, String>) -> Self {
        self.referent_map = map;
        self
    }

    fn normalizations(&self, ann: &Ann, selector: SetSelector) -> BTreeSet<String> {
        ann.back_references()
            .into_iter()
            .filter(|bref| {
                bref.kind_tag() == KindTag::Normalization
                    && bref.set() == selector
                    && bref.annotation_type() == self.normalization_type
            })
            .filter_map(|bref| bref.referent().map(String::from))
            .map(|referent| match self.referent_map.get(&referent) {
                Some(mapped) => mapped.clone(),
                None => referent,
            })
            .filter(|referent| {
                self.accepted_referents
                    .as_ref()
                    .map_or(true, |f| f.test(referent.as_str()))
            })
            .collect()
    }
}

impl Similarity<Ann> for NormalizationSimilarity {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        let norms_a = self.normalizations(a, SetSelector::Reference);
        let norms_b = self.normalizations(b, SetSelector::Prediction);
        self.similarity.compute(&norms_a, &norms_b)
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        let norms_a = self.normalizations(a, SetSelector::Reference);
        let norms_b = self.normalizations(b, SetSelector::Prediction);
        self.similarity.explain(&norms_a, &norms_b)
    }
}

/// `|A ∩ B| / (|A| + |B \ A|)`. Two empty sets yield NaN.
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizationJaccard;

impl Similarity<BTreeSet<String>> for NormalizationJaccard {
    fn compute(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
        let inter = a.intersection(b).count() as f64;
        let union = (a.len() + b.difference(a).count()) as f64;
        inter / union
    }

    fn explain(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> String {
        format!("norm jaccard = {}", self.compute(a, b))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyParsingError {
    pub lineno: usize,
    pub line: String,
}

impl Display for HierarchyParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Missing tab in hierarchy at line {}: `{}`",
            self.lineno, self.line
        )
    }
}
impl Error for HierarchyParsingError {}

/// Semantic similarity of concepts in a hierarchy (Wang et al., 2007). Each concept gets a
/// semantic value for itself and each of its ancestors, decaying by `weight` at each step up.
pub struct WangSimilarity {
    s_values: AHashMap<String, BTreeMap<String, f64>>,
    weight: f64,
    cache: RwLock<AHashMap<(String, String), f64>>,
}

impl WangSimilarity {
    /// * `s_values`: For each concept, the semantic value of itself and its ancestors.
    /// * `weight`: Decay factor, only used in explanations.
    pub fn new(s_values: AHashMap<String, BTreeMap<String, f64>>, weight: f64) -> Self {
        Self {
            s_values,
            weight,
            cache: RwLock::new(AHashMap::new()),
        }
    }

    /// Builds the hierarchy from `child<TAB>parent` lines. Blank lines are skipped.
    pub fn from_parents(text: &str, weight: f64) -> Result<Self, HierarchyParsingError> {
        let mut parents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let Some((child, parent)) = line.split_once('\t') else {
                return Err(HierarchyParsingError {
                    lineno: i + 1,
                    line: String::from(line),
                });
            };
            parents.entry(parent.to_string()).or_default();
            parents
                .entry(child.to_string())
                .or_default()
                .insert(parent.to_string());
        }
        let s_values = parents
            .keys()
            .map(|id| (id.clone(), propagate(&parents, id, weight)))
            .collect();
        Ok(Self::new(s_values, weight))
    }

    fn cached(&self, a: &str, b: &str) -> Option<f64> {
        let cache = self.cache.read().ok()?;
        cache.get(&(a.to_string(), b.to_string())).copied()
    }

    fn store(&self, a: &str, b: &str, value: f64) {
        if let Ok(mut cache) = self.cache.write() {
            cache.insert((a.to_string(), b.to_string()), value);
            cache.insert((b.to_string(), a.to_string()), value);
        }
    }

    fn node_similarity(&self, a: &str, b: &str) -> f64 {
        if let Some(value) = self.cached(a, b) {
            return value;
        }
        let (Some(sv_a), Some(sv_b)) = (self.s_values.get(a), self.s_values.get(b)) else {
            return 0.0;
        };
        let inter_sum: f64 = sv_a
            .iter()
            .filter_map(|(id, va)| sv_b.get(id).map(|vb| va + vb))
            .sum();
        let total: f64 = sv_a.values().sum::<f64>() + sv_b.values().sum::<f64>();
        let result = inter_sum / total;
        self.store(a, b, result);
        result
    }

    fn best_sum(&self, from: &BTreeSet<String>, to: &BTreeSet<String>) -> f64 {
        from.iter()
            .map(|a| {
                to.iter()
                    .map(|b| self.node_similarity(a, b))
                    .fold(0.0, f64::max)
            })
            .sum()
    }
}

/// Semantic values of `id` and its ancestors: the maximum over all paths of `weight^depth`.
fn propagate(
    parents: &BTreeMap<String, BTreeSet<String>>,
    id: &str,
    weight: f64,
) -> BTreeMap<String, f64> {
    let mut result: BTreeMap<String, f64> = BTreeMap::new();
    let mut stack: Vec<(&str, f64)> = vec![(id, 1.0)];
    while let Some((node, value)) = stack.pop() {
        match result.get(node) {
            Some(prev) if *prev >= value => continue,
            _ => {
                result.insert(node.to_string(), value);
            }
        }
        if let Some(ps) = parents.get(node) {
            stack.extend(ps.iter().map(|p| (p.as_str(), value * weight)));
        }
    }
    result
}

impl Similarity<BTreeSet<String>> for WangSimilarity {
    fn compute(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
        (self.best_sum(a, b) + self.best_sum(b, a)) / (a.len() + b.len()) as f64
    }

    fn explain(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> String {
        let mut lines = vec![format!("wang({}):", self.weight)];
        for x in a.iter() {
            for y in b.iter() {
                lines.push(format!("sim({},{}) = {}", x, y, self.node_similarity(x, y)));
            }
        }
        lines.push(format!(" = {}", self.compute(a, b)));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{
        Annotation, Document, Fragment, ResolveReferences, Resolved, Unresolved,
    };
    use crate::filter::FnPredicate;
    use crate::logger::{CheckLogger, Location};
    use std::sync::Arc;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    const HIERARCHY: &str = "B\tA\nC\tA\nD\tB\nD\tC\nE\tC\n";

    #[test]
    fn test_normalization_jaccard() {
        assert_eq!(
            NormalizationJaccard.compute(&set(&["a", "b"]), &set(&["b", "c"])),
            1.0 / 3.0
        );
        assert_eq!(NormalizationJaccard.compute(&set(&["a"]), &set(&[])), 0.0);
        assert!(NormalizationJaccard.compute(&set(&[]), &set(&[])).is_nan());
    }

    #[test]
    fn test_wang_s_values() {
        let wang = WangSimilarity::from_parents(HIERARCHY, 0.5).unwrap();
        let d = &wang.s_values["D"];
        assert_eq!(d["D"], 1.0);
        assert_eq!(d["B"], 0.5);
        assert_eq!(d["C"], 0.5);
        assert_eq!(d["A"], 0.25);
        assert_eq!(wang.s_values["A"].len(), 1);
    }

    #[test]
    fn test_wang_node_similarity() {
        let wang = WangSimilarity::from_parents(HIERARCHY, 0.5).unwrap();
        assert_eq!(wang.node_similarity("B", "B"), 1.0);
        // B: {B: 1, A: 0.5}; C: {C: 1, A: 0.5}
        assert_eq!(wang.node_similarity("B", "C"), 1.0 / 3.0);
        assert_eq!(wang.node_similarity("C", "B"), 1.0 / 3.0);
        assert_eq!(wang.node_similarity("B", "unknown"), 0.0);
        let s = wang.compute(&set(&["B"]), &set(&["B", "C"]));
        assert_eq!(s, (1.0 + (1.0 + 1.0 / 3.0)) / 3.0);
    }

    #[test]
    fn test_wang_missing_tab() {
        assert_eq!(
            WangSimilarity::from_parents("B\tA\nC A\n", 0.5).err(),
            Some(HierarchyParsingError {
                lineno: 2,
                line: String::from("C A")
            })
        );
    }

    fn document() -> Arc<Document<Resolved>> {
        let mut logger = CheckLogger::new();
        let loc = Location::new("D", 1);
        let mut doc: Document<Unresolved> = Document::new("D", "Escherichia coli");
        doc.add_annotation(
            &mut logger,
            SetSelector::Input,
            Annotation::text_bound(
                loc.clone(),
                "T1",
                "Microorganism",
                vec![Fragment::new(0, 16).unwrap()],
            ),
        );
        for (sel, id, norm_type, referent) in [
            (SetSelector::Reference, "N1", "NCBI_Taxonomy", "562"),
            (SetSelector::Reference, "N2", "NCBI_Taxonomy", "561"),
            (SetSelector::Reference, "N3", "OntoBiotope", "OBT:1"),
            (SetSelector::Prediction, "N1", "NCBI_Taxonomy", "562"),
            (SetSelector::Prediction, "N2", "NCBI_Taxonomy", "old-562"),
        ] {
            doc.add_annotation(
                &mut logger,
                sel,
                Annotation::normalization(loc.clone(), id, norm_type, "T1", referent),
            );
        }
        Arc::new(doc.resolve_references(&mut logger))
    }

    #[test]
    fn test_normalization_similarity() {
        let doc = document();
        let t1 = Ann::new(Arc::clone(&doc), doc.lookup(SetSelector::Input, "T1").unwrap()).unwrap();
        let sim = NormalizationSimilarity::new("NCBI_Taxonomy", NormalizationJaccard);
        assert_eq!(sim.normalizations(&t1, SetSelector::Reference), set(&["561", "562"]));
        assert_eq!(sim.compute(&t1, &t1), 1.0 / 3.0);
        let mut map = AHashMap::new();
        map.insert(String::from("old-562"), String::from("562"));
        let sim = NormalizationSimilarity::new("NCBI_Taxonomy", NormalizationJaccard)
            .referent_map(map)
            .accepted_referents(FnPredicate::new(|r: &str| r != "561"));
        assert_eq!(sim.compute(&t1, &t1), 1.0);
        assert_eq!(sim.explain(&t1, &t1), "norm jaccard = 1");
    }
}
