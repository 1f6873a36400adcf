use crate::corpus::annotation::{
    Annotation, AnnotationKey, AnnotationKind, KindTag, Resolved, SetSelector, TextBound,
};
use crate::corpus::Document;
use std::fmt::{self, Debug, Display};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A relation that exists only for the duration of a pairing: it shares the type and location of
/// the annotation it derives from but has its own arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct VirtualRelation {
    pub(crate) id: String,
    pub(crate) arguments: Vec<(String, AnnotationKey)>,
}

/// Handle on a resolved annotation. Cloning is cheap: the document is shared.
#[derive(Clone)]
pub struct Ann {
    doc: Arc<Document<Resolved>>,
    key: AnnotationKey,
    overlay: Option<Arc<VirtualRelation>>,
}

impl Ann {
    /// Returns `None` if `key` does not designate an annotation of `doc`.
    pub fn new(doc: Arc<Document<Resolved>>, key: AnnotationKey) -> Option<Self> {
        doc.annotation(key)?;
        Some(Self {
            doc,
            key,
            overlay: None,
        })
    }

    /// Handles on every annotation of a set, in insertion order.
    pub fn all_in(doc: &Arc<Document<Resolved>>, selector: SetSelector) -> Vec<Ann> {
        doc.set(selector)
            .keys()
            .map(|key| Self {
                doc: Arc::clone(doc),
                key,
                overlay: None,
            })
            .collect()
    }

    pub(crate) fn virtual_relation(&self, id: String, arguments: Vec<(String, AnnotationKey)>) -> Ann {
        Self {
            doc: Arc::clone(&self.doc),
            key: self.key,
            overlay: Some(Arc::new(VirtualRelation { id, arguments })),
        }
    }

    /// Handle on another annotation of the same document.
    pub fn sibling(&self, key: AnnotationKey) -> Ann {
        Self {
            doc: Arc::clone(&self.doc),
            key,
            overlay: None,
        }
    }

    /// The handle without its virtual arguments.
    pub fn original(&self) -> Ann {
        self.sibling(self.key)
    }

    pub fn document(&self) -> &Arc<Document<Resolved>> {
        &self.doc
    }

    pub fn key(&self) -> AnnotationKey {
        self.key
    }

    pub fn set(&self) -> SetSelector {
        self.key.set
    }

    pub fn is_virtual(&self) -> bool {
        self.overlay.is_some()
    }

    /// The stored annotation. Virtual handles return the annotation they derive from.
    pub fn annotation(&self) -> &Annotation<Resolved> {
        // Handles are only built from keys checked against their document.
        &self.doc.set(self.key.set).annotations[self.key.index]
    }

    pub fn id(&self) -> &str {
        match &self.overlay {
            Some(overlay) => &overlay.id,
            None => self.annotation().id(),
        }
    }

    pub fn annotation_type(&self) -> &str {
        self.annotation().annotation_type()
    }

    pub fn kind_tag(&self) -> KindTag {
        match &self.overlay {
            Some(_) => KindTag::Relation,
            None => self.annotation().kind().tag(),
        }
    }

    pub fn text_bound(&self) -> Option<&TextBound> {
        self.annotation().as_text_bound()
    }

    pub fn is_relation(&self) -> bool {
        self.kind_tag() == KindTag::Relation
    }

    fn argument_list(&self) -> Option<&[(String, AnnotationKey)]> {
        match &self.overlay {
            Some(overlay) => Some(&overlay.arguments),
            None => self.annotation().as_relation().map(|rel| rel.arguments.as_slice()),
        }
    }

    /// Roles of a relation in insertion order, empty for other kinds.
    pub fn roles(&self) -> Vec<&str> {
        self.argument_list()
            .map(|args| args.iter().map(|(r, _)| r.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn has_argument(&self, role: &str) -> bool {
        self.argument_list()
            .is_some_and(|args| args.iter().any(|(r, _)| r == role))
    }

    pub fn argument(&self, role: &str) -> Option<Ann> {
        self.argument_list()?
            .iter()
            .find(|(r, _)| r == role)
            .map(|(_, key)| self.sibling(*key))
    }

    pub fn arguments(&self) -> Vec<(String, Ann)> {
        self.argument_list()
            .map(|args| {
                args.iter()
                    .map(|(r, key)| (r.clone(), self.sibling(*key)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Target of a normalization or a modifier.
    pub fn referenced(&self) -> Option<Ann> {
        if self.overlay.is_some() {
            return None;
        }
        self.annotation()
            .single_reference()
            .map(|key| self.sibling(*key))
    }

    pub fn referent(&self) -> Option<&str> {
        self.annotation().as_normalization().map(|n| n.referent())
    }

    /// Annotations pointing to this one.
    pub fn back_references(&self) -> Vec<Ann> {
        self.doc
            .back_references(self.key)
            .map(|key| self.sibling(key))
            .collect()
    }

    /// Members of this annotation's equivalence, or the annotation itself.
    pub fn equivalents(&self) -> Vec<Ann> {
        if self.overlay.is_some() {
            return vec![self.clone()];
        }
        self.doc
            .equivalents(self.key)
            .into_iter()
            .map(|key| self.sibling(key))
            .collect()
    }

    pub fn is_equivalent(&self, other: &Ann) -> bool {
        self == other || self.equivalents().iter().any(|e| e == other)
    }

    pub(crate) fn is_dummy(&self) -> bool {
        matches!(self.annotation().kind(), AnnotationKind::Dummy)
    }
}

impl PartialEq for Ann {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.doc, &other.doc)
            && self.key == other.key
            && self.overlay.as_ref().map(|o| &o.id) == other.overlay.as_ref().map(|o| &o.id)
    }
}

impl Eq for Ann {}

impl Hash for Ann {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.doc.id().hash(state);
        self.key.hash(state);
        self.overlay.as_ref().map(|o| &o.id).hash(state);
    }
}

impl Debug for Ann {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.doc.id(), self.id(), self.annotation_type())
    }
}

impl Display for Ann {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id(), self.annotation_type())
    }
}
