use crate::corpus::Ann;
use crate::similarity::Similarity;

/// Mandatory roles of each event type. With three roles, the first argument is either of the
/// first two roles.
const MANDATORY_ROLES: &[(&str, &[&str])] = &[
    ("Binding", &["Functional_Molecule", "Molecule"]),
    ("Primary_Structure_Composition", &["DNA_Part", "DNA"]),
    ("Protein_Complex_Composition", &["Amino_Acid_Sequence", "Protein_Complex"]),
    ("Presence_At_Stage", &["Functional_Molecule", "Development"]),
    ("Presence_In_Genotype", &["Molecule", "Element", "Genotype"]),
    ("Sequence_Identity", &["Element1", "Element2"]),
    ("Interaction", &["Agent", "Target"]),
    ("Functional_Equivalence", &["Element1", "Element2"]),
    ("Involvement_In_Process", &["Participant", "Process"]),
    ("Localization", &["Functional_Molecule", "Process", "Target_Tissue"]),
    ("Family_Membership", &["Element", "Family"]),
    ("Protein_Domain_Composition", &["Domain", "Product"]),
    ("Occurrence_During", &["Process", "Development"]),
    ("Occurrence_In_Genotype", &["Process", "Genotype"]),
    ("Regulation_Of_Accumulation", &["Agent", "Functional_Molecule"]),
    ("Regulation_Of_Development_Phase", &["Agent", "Development"]),
    ("Regulation_Of_Expression", &["Agent", "DNA"]),
    ("Regulation_Of_Molecule_Activity", &["Agent", "Molecule"]),
    ("Regulation_Of_Process", &["Agent", "Process"]),
    ("Regulation_Of_Tissue_Development", &["Agent", "Target_Tissue"]),
    ("Transcription_Or_Translation", &["Source", "Product"]),
];

const COMMUTATIVE_TYPES: &[&str] = &["Sequence_Identity", "Functional_Equivalence"];

const OPTIONAL_ROLES: &[&str] = &[
    "Tissue",
    "Developmental_Stage",
    "Organism_Genotype",
    "Environmental_Factor",
    "Hormone",
    "Prerequisite_Event",
];

const NEGATION_TYPE: &str = "Negation";

const NEGATION_PENALTY: f64 = 0.5;

/// Event similarity of the SeeDev task. Both events must have the same type and the same
/// mandatory arguments. A negation mismatch halves the score and each optional argument error
/// lowers it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeeDevEventSimilarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionalMatch {
    Match,
    Wrong,
    Missing,
    Extra,
    Absent,
}

impl OptionalMatch {
    fn errors(self) -> usize {
        match self {
            Self::Wrong => 2,
            Self::Missing | Self::Extra => 1,
            Self::Match | Self::Absent => 0,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Wrong => "wrong (2 errors)",
            Self::Missing => "missing (1 error)",
            Self::Extra => "extra (1 error)",
            Self::Absent => "none",
        }
    }
}

fn mandatory_roles(event_type: &str) -> Option<&'static [&'static str]> {
    MANDATORY_ROLES
        .iter()
        .find(|(t, _)| *t == event_type)
        .map(|(_, roles)| *roles)
}

fn both_have(a: &Ann, b: &Ann, role: &str) -> bool {
    a.has_argument(role) && b.has_argument(role)
}

fn same_mandatory_arguments(a: &Ann, b: &Ann) -> bool {
    let Some(roles) = mandatory_roles(a.annotation_type()) else {
        return false;
    };
    let (role1, role2) = match roles {
        [first, second, third] => {
            if both_have(a, b, first) {
                (*first, *third)
            } else if both_have(a, b, second) {
                (*second, *third)
            } else {
                return false;
            }
        }
        [first, second] => (*first, *second),
        _ => return false,
    };
    let (Some(a1), Some(b1), Some(a2), Some(b2)) = (
        a.argument(role1),
        b.argument(role1),
        a.argument(role2),
        b.argument(role2),
    ) else {
        return false;
    };
    if COMMUTATIVE_TYPES.iter().any(|t| *t == a.annotation_type()) {
        return (a1 == b1 && a2 == b2) || (a1 == b2 && a2 == b1);
    }
    a1 == b1 && a2 == b2
}

fn minimally_equivalent(a: &Ann, b: &Ann) -> bool {
    a.is_relation()
        && b.is_relation()
        && a.annotation_type() == b.annotation_type()
        && same_mandatory_arguments(a, b)
}

fn has_negation(ann: &Ann) -> bool {
    ann.back_references()
        .iter()
        .any(|bref| bref.annotation_type() == NEGATION_TYPE)
}

fn optional_match(a: &Ann, b: &Ann, role: &str) -> OptionalMatch {
    match (a.argument(role), b.argument(role)) {
        (Some(arg_a), Some(arg_b)) => {
            if arg_a == arg_b || minimally_equivalent(&arg_a, &arg_b) {
                OptionalMatch::Match
            } else {
                OptionalMatch::Wrong
            }
        }
        (Some(_), None) => OptionalMatch::Missing,
        (None, Some(_)) => OptionalMatch::Extra,
        (None, None) => OptionalMatch::Absent,
    }
}

fn optional_arguments_similarity(a: &Ann, b: &Ann) -> f64 {
    let mut errors = 0;
    let mut all: Vec<Ann> = Vec::new();
    for role in OPTIONAL_ROLES {
        errors += optional_match(a, b, role).errors();
        for arg in [a.argument(role), b.argument(role)].into_iter().flatten() {
            if !all.contains(&arg) {
                all.push(arg);
            }
        }
    }
    if all.is_empty() {
        return 1.0;
    }
    1.0 - (errors as f64 / all.len() as f64)
}

impl Similarity<Ann> for SeeDevEventSimilarity {
    fn compute(&self, a: &Ann, b: &Ann) -> f64 {
        if !minimally_equivalent(a, b) {
            return 0.0;
        }
        let negation = if has_negation(a) == has_negation(b) {
            1.0
        } else {
            NEGATION_PENALTY
        };
        negation * optional_arguments_similarity(a, b)
    }

    fn explain(&self, a: &Ann, b: &Ann) -> String {
        if !a.is_relation() || !b.is_relation() {
            return String::from("not an event");
        }
        if a.annotation_type() != b.annotation_type() {
            return String::from("type mismatch");
        }
        if !same_mandatory_arguments(a, b) {
            return String::from("wrong mandatory arguments");
        }
        let negation = match (has_negation(a), has_negation(b)) {
            (true, true) => "ok (negated)",
            (true, false) => "missed (half score)",
            (false, true) => "extra (half score)",
            (false, false) => "ok (not negated)",
        };
        let optional = OPTIONAL_ROLES
            .iter()
            .map(|role| format!("{}: {}", role, optional_match(a, b, role).describe()))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "negation: {} and optional arguments: [{}] = {}",
            negation,
            optional,
            optional_arguments_similarity(a, b)
        )
    }
}
