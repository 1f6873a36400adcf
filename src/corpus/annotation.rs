use crate::corpus::fragment::Fragment;
use crate::logger::Location;
use ahash::AHashMap;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

/// Type given to dummy annotations when nothing better is known.
pub const DUMMY_TYPE: &str = "DUMMY";

/// Build/resolve discipline of the annotation graph. `Ref` is how an annotation designates
/// another one: a raw identifier before resolution, an arena key after.
pub trait Phase: Debug + Clone + PartialEq + Send + Sync + 'static {
    type Ref: Debug + Clone + PartialEq + Eq + Hash + Ord + Send + Sync;
}

/// Phase of a corpus being populated. References are identifiers that may not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unresolved;

/// Phase of a corpus whose references all point to an annotation of the same document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Resolved;

impl Phase for Unresolved {
    type Ref = String;
}

impl Phase for Resolved {
    type Ref = AnnotationKey;
}

/// The three annotation sets of a document.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Sequence,
)]
pub enum SetSelector {
    Input,
    Reference,
    Prediction,
}

impl SetSelector {
    /// Set in which identifiers are searched when not found in this one.
    pub fn parent(self) -> Option<SetSelector> {
        match self {
            Self::Input => None,
            Self::Reference | Self::Prediction => Some(Self::Input),
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Input => 0,
            Self::Reference => 1,
            Self::Prediction => 2,
        }
    }
}

impl Display for SetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Reference => "reference",
            Self::Prediction => "prediction",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSelectorParsingError(String);

impl Display for SetSelectorParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into an annotation set selector",
            self.0
        )
    }
}
impl Error for SetSelectorParsingError {}

impl FromStr for SetSelector {
    type Err = SetSelectorParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "input" => Ok(Self::Input),
            "reference" | "gold" => Ok(Self::Reference),
            "prediction" | "predicted" => Ok(Self::Prediction),
            _ => Err(SetSelectorParsingError(String::from(s))),
        }
    }
}

/// Position of an annotation in the arenas of its document.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct AnnotationKey {
    pub set: SetSelector,
    pub index: usize,
}

impl AnnotationKey {
    pub fn new(set: SetSelector, index: usize) -> Self {
        Self { set, index }
    }
}

impl Display for AnnotationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.set, self.index)
    }
}

/// Discriminant of `AnnotationKind`, without the payload.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Sequence,
)]
pub enum KindTag {
    TextBound,
    Relation,
    Normalization,
    Modifier,
    Dummy,
}

impl Display for KindTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TextBound => "TEXT_BOUND",
            Self::Relation => "RELATION",
            Self::Normalization => "NORMALIZATION",
            Self::Modifier => "MODIFIER",
            Self::Dummy => "DUMMY",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBound {
    pub(crate) fragments: Vec<Fragment>,
}

impl TextBound {
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Start of the first fragment.
    pub fn start(&self) -> usize {
        self.fragments.first().map_or(0, |f| f.start())
    }

    /// End of the last fragment.
    pub fn end(&self) -> usize {
        self.fragments.last().map_or(0, |f| f.end())
    }

    /// Number of covered characters.
    pub fn length(&self) -> usize {
        self.fragments.iter().map(|f| f.len()).sum()
    }

    /// Covered text, fragments joined with `separator`.
    ///
    /// * `contents`: Text of the document owning the annotation.
    /// * `separator`: Inserted between two consecutive fragments.
    pub fn form(&self, contents: &str, separator: &str) -> String {
        self.fragments
            .iter()
            .map(|f| {
                contents
                    .chars()
                    .skip(f.start())
                    .take(f.len())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Arguments of a relation, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation<P: Phase> {
    pub(crate) arguments: Vec<(String, P::Ref)>,
}

impl<P: Phase> Relation<P> {
    pub(crate) fn new<I, R, A>(arguments: I) -> Self
    where
        I: IntoIterator<Item = (R, A)>,
        R: Into<String>,
        A: Into<P::Ref>,
    {
        let mut args: Vec<(String, P::Ref)> = Vec::new();
        for (role, arg) in arguments {
            let role = role.into();
            let arg = arg.into();
            match args.iter_mut().find(|(r, _)| *r == role) {
                Some(slot) => slot.1 = arg,
                None => args.push((role, arg)),
            }
        }
        Self { arguments: args }
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.arguments.iter().map(|(r, _)| r.as_str())
    }

    pub fn has_argument(&self, role: &str) -> bool {
        self.arguments.iter().any(|(r, _)| r == role)
    }

    pub fn argument(&self, role: &str) -> Option<&P::Ref> {
        self.arguments
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, a)| a)
    }

    pub fn arguments(&self) -> impl Iterator<Item = (&str, &P::Ref)> {
        self.arguments.iter().map(|(r, a)| (r.as_str(), a))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalization<P: Phase> {
    pub(crate) annotation: P::Ref,
    pub(crate) referent: String,
}

impl<P: Phase> Normalization<P> {
    pub fn annotation(&self) -> &P::Ref {
        &self.annotation
    }
    pub fn referent(&self) -> &str {
        &self.referent
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier<P: Phase> {
    pub(crate) annotation: P::Ref,
}

impl<P: Phase> Modifier<P> {
    pub fn annotation(&self) -> &P::Ref {
        &self.annotation
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationKind<P: Phase> {
    TextBound(TextBound),
    Relation(Relation<P>),
    Normalization(Normalization<P>),
    Modifier(Modifier<P>),
    Dummy,
}

impl<P: Phase> AnnotationKind<P> {
    pub fn tag(&self) -> KindTag {
        match self {
            Self::TextBound(_) => KindTag::TextBound,
            Self::Relation(_) => KindTag::Relation,
            Self::Normalization(_) => KindTag::Normalization,
            Self::Modifier(_) => KindTag::Modifier,
            Self::Dummy => KindTag::Dummy,
        }
    }

    /// Every reference held by this annotation, relations first by role order.
    pub fn references(&self) -> Vec<&P::Ref> {
        match self {
            Self::Relation(rel) => rel.arguments.iter().map(|(_, a)| a).collect(),
            Self::Normalization(norm) => vec![&norm.annotation],
            Self::Modifier(modifier) => vec![&modifier.annotation],
            Self::TextBound(_) | Self::Dummy => vec![],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation<P: Phase> {
    pub(crate) id: String,
    pub(crate) annotation_type: String,
    pub(crate) location: Location,
    pub(crate) kind: AnnotationKind<P>,
}

impl<P: Phase> Annotation<P> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn annotation_type(&self) -> &str {
        &self.annotation_type
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn kind(&self) -> &AnnotationKind<P> {
        &self.kind
    }

    pub fn as_text_bound(&self) -> Option<&TextBound> {
        match &self.kind {
            AnnotationKind::TextBound(tb) => Some(tb),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&Relation<P>> {
        match &self.kind {
            AnnotationKind::Relation(rel) => Some(rel),
            _ => None,
        }
    }

    pub fn as_normalization(&self) -> Option<&Normalization<P>> {
        match &self.kind {
            AnnotationKind::Normalization(norm) => Some(norm),
            _ => None,
        }
    }

    /// Target of a normalization or a modifier.
    pub fn single_reference(&self) -> Option<&P::Ref> {
        match &self.kind {
            AnnotationKind::Normalization(norm) => Some(&norm.annotation),
            AnnotationKind::Modifier(modifier) => Some(&modifier.annotation),
            _ => None,
        }
    }
}

/// Constructors used by collaborators populating a corpus. Nothing is validated here: checks
/// happen when the annotation is added to a document.
impl Annotation<Unresolved> {
    pub fn text_bound<I: Into<String>, T: Into<String>>(
        location: Location,
        id: I,
        annotation_type: T,
        fragments: Vec<Fragment>,
    ) -> Self {
        Self {
            id: id.into(),
            annotation_type: annotation_type.into(),
            location,
            kind: AnnotationKind::TextBound(TextBound { fragments }),
        }
    }

    pub fn relation<I, T, A, R, S>(location: Location, id: I, annotation_type: T, args: A) -> Self
    where
        I: Into<String>,
        T: Into<String>,
        A: IntoIterator<Item = (R, S)>,
        R: Into<String>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            annotation_type: annotation_type.into(),
            location,
            kind: AnnotationKind::Relation(Relation::new(args)),
        }
    }

    pub fn normalization<I, T, A, R>(
        location: Location,
        id: I,
        annotation_type: T,
        annotation: A,
        referent: R,
    ) -> Self
    where
        I: Into<String>,
        T: Into<String>,
        A: Into<String>,
        R: Into<String>,
    {
        Self {
            id: id.into(),
            annotation_type: annotation_type.into(),
            location,
            kind: AnnotationKind::Normalization(Normalization {
                annotation: annotation.into(),
                referent: referent.into(),
            }),
        }
    }

    pub fn modifier<I: Into<String>, T: Into<String>, A: Into<String>>(
        location: Location,
        id: I,
        annotation_type: T,
        annotation: A,
    ) -> Self {
        Self {
            id: id.into(),
            annotation_type: annotation_type.into(),
            location,
            kind: AnnotationKind::Modifier(Modifier {
                annotation: annotation.into(),
            }),
        }
    }

    /// Placeholder for a line that could not be classified. Its type defaults to
    /// `DUMMY_TYPE`.
    pub fn dummy<I: Into<String>>(location: Location, id: I, annotation_type: Option<&str>) -> Self {
        Self {
            id: id.into(),
            annotation_type: annotation_type.unwrap_or(DUMMY_TYPE).to_string(),
            location,
            kind: AnnotationKind::Dummy,
        }
    }
}

/// Arena of the annotations of one set of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationSet<P: Phase> {
    pub(crate) selector: SetSelector,
    pub(crate) annotations: Vec<Annotation<P>>,
    pub(crate) ids: AHashMap<String, usize>,
}

impl<P: Phase> AnnotationSet<P> {
    pub(crate) fn new(selector: SetSelector) -> Self {
        Self {
            selector,
            annotations: Vec::new(),
            ids: AHashMap::new(),
        }
    }

    pub fn selector(&self) -> SetSelector {
        self.selector
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Index of the annotation with identifier `id` in this set only.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.ids.get(id).copied()
    }

    pub fn get(&self, index: usize) -> Option<&Annotation<P>> {
        self.annotations.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation<P>> {
        self.annotations.iter()
    }

    /// Keys of the annotations of this set, in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = AnnotationKey> + '_ {
        (0..self.annotations.len()).map(|i| AnnotationKey::new(self.selector, i))
    }

    pub(crate) fn push(&mut self, annotation: Annotation<P>) -> AnnotationKey {
        let index = self.annotations.len();
        self.ids.insert(annotation.id.clone(), index);
        self.annotations.push(annotation);
        AnnotationKey::new(self.selector, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("input", SetSelector::Input)]
    #[case("Reference", SetSelector::Reference)]
    #[case("gold", SetSelector::Reference)]
    #[case("PREDICTION", SetSelector::Prediction)]
    fn test_selector_from_str(#[case] input: &str, #[case] expected: SetSelector) {
        assert_eq!(SetSelector::from_str(input).unwrap(), expected)
    }

    #[test]
    fn test_selector_parents() {
        assert_eq!(SetSelector::Input.parent(), None);
        assert_eq!(SetSelector::Reference.parent(), Some(SetSelector::Input));
        assert_eq!(SetSelector::Prediction.parent(), Some(SetSelector::Input));
    }

    #[test]
    fn test_relation_keeps_role_order_and_last_duplicate() {
        let rel: Relation<Unresolved> =
            Relation::new(vec![("Agent", "T1"), ("Target", "T2"), ("Agent", "T3")]);
        let roles: Vec<&str> = rel.roles().collect();
        assert_eq!(roles, vec!["Agent", "Target"]);
        assert_eq!(rel.argument("Agent"), Some(&String::from("T3")));
        assert!(!rel.has_argument("Site"));
    }

    #[test]
    fn test_text_bound_accessors() {
        let tb = TextBound {
            fragments: vec![Fragment::new(0, 5).unwrap(), Fragment::new(10, 13).unwrap()],
        };
        assert_eq!(tb.start(), 0);
        assert_eq!(tb.end(), 13);
        assert_eq!(tb.length(), 8);
        assert_eq!(tb.form("Hello big world", " "), "Hello wor");
    }

    #[test]
    fn test_dummy_type() {
        let loc = Location::new("a", 1);
        assert_eq!(Annotation::dummy(loc.clone(), "X1", None).annotation_type(), DUMMY_TYPE);
        assert_eq!(
            Annotation::dummy(loc, "X1", Some("Bacteria")).annotation_type(),
            "Bacteria"
        );
    }
}
