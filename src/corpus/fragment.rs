use crate::logger::{CheckLogger, Location};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{self, Display};

/// A contiguous span of the document text, in character offsets. `end` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fragment {
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidFragment {
    pub start: usize,
    pub end: usize,
}

impl Display for InvalidFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid fragment: end ({}) is before start ({})",
            self.end, self.start
        )
    }
}
impl Error for InvalidFragment {}

impl Fragment {
    pub fn new(start: usize, end: usize) -> Result<Self, InvalidFragment> {
        if end < start {
            return Err(InvalidFragment { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Number of characters shared by both fragments.
    pub fn intersection_len(&self, other: &Fragment) -> usize {
        if self.start >= other.end || other.start >= self.end {
            return 0;
        }
        self.end.min(other.end) - self.start.max(other.start)
    }

    /// Order by start, longest first when starts are equal.
    pub(crate) fn cmp_start_inverse_end(&self, other: &Fragment) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| other.end.cmp(&self.end))
    }
}

impl Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Sorts and cleans the fragments of a text-bound annotation. Fragments beyond the end of the
/// document or overlapping a previous fragment are dropped; every alteration is reported to
/// `logger`.
pub(crate) fn normalize_fragments(
    logger: &mut CheckLogger,
    location: &Location,
    mut fragments: Vec<Fragment>,
    document_len: usize,
) -> Vec<Fragment> {
    if fragments.is_empty() {
        logger.serious(location, "no fragments");
        return vec![Fragment { start: 0, end: 0 }];
    }
    let in_order = fragments.windows(2).all(|w| w[0].start <= w[1].start);
    if !in_order {
        logger.suspicious(location, "fragments not in order");
    }
    fragments.sort_by(Fragment::cmp_start_inverse_end);
    let listing = fragments
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let mut result = Vec::with_capacity(fragments.len());
    let mut reach: Option<usize> = None;
    for frag in fragments {
        if frag.end > document_len {
            logger.serious(location, "overreaching fragment");
            continue;
        }
        if reach.is_some_and(|r| frag.start <= r) {
            logger.serious(location, format!("overlapping fragments: [{}]", listing));
            continue;
        }
        reach = Some(reach.map_or(frag.end, |r| r.max(frag.end)));
        result.push(frag);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::CheckLevel;
    use quickcheck::{self, TestResult};
    use rstest::rstest;

    fn frags(spans: &[(usize, usize)]) -> Vec<Fragment> {
        spans
            .iter()
            .map(|(s, e)| Fragment::new(*s, *e).unwrap())
            .collect()
    }

    #[test]
    fn test_invalid_fragment() {
        assert_eq!(
            Fragment::new(5, 3),
            Err(InvalidFragment { start: 5, end: 3 })
        );
        assert!(Fragment::new(3, 3).unwrap().is_empty());
    }

    #[rstest]
    #[case((0, 5), (3, 8), 2)]
    #[case((0, 5), (5, 8), 0)]
    #[case((2, 4), (0, 10), 2)]
    #[case((6, 9), (0, 3), 0)]
    fn test_intersection_len(
        #[case] a: (usize, usize),
        #[case] b: (usize, usize),
        #[case] expected: usize,
    ) {
        let a = Fragment::new(a.0, a.1).unwrap();
        let b = Fragment::new(b.0, b.1).unwrap();
        assert_eq!(a.intersection_len(&b), expected);
        assert_eq!(b.intersection_len(&a), expected);
    }

    #[test]
    fn test_overlapping_fragment_is_dropped() {
        let mut logger = CheckLogger::new();
        let loc = Location::new("doc.a1", 4);
        let actual = normalize_fragments(&mut logger, &loc, frags(&[(5, 10), (8, 12)]), 100);
        assert_eq!(actual, frags(&[(5, 10)]));
        assert_eq!(logger.highest_level(), Some(CheckLevel::Serious));
        assert!(logger.messages()[0].body.starts_with("overlapping fragments"));
    }

    #[test]
    fn test_no_fragments() {
        let mut logger = CheckLogger::new();
        let loc = Location::new("doc.a1", 4);
        let actual = normalize_fragments(&mut logger, &loc, vec![], 100);
        assert_eq!(actual, frags(&[(0, 0)]));
        assert_eq!(logger.messages()[0].body, "no fragments");
    }

    #[test]
    fn test_unordered_and_overreaching() {
        let mut logger = CheckLogger::new();
        let loc = Location::new("doc.a1", 4);
        let actual = normalize_fragments(
            &mut logger,
            &loc,
            frags(&[(20, 25), (0, 4), (30, 120)]),
            100,
        );
        assert_eq!(actual, frags(&[(0, 4), (20, 25)]));
        let levels: Vec<CheckLevel> = logger.messages().iter().map(|m| m.level).collect();
        assert_eq!(levels, vec![CheckLevel::Suspicious, CheckLevel::Serious]);
    }

    #[test]
    fn test_same_start_keeps_longest() {
        let mut logger = CheckLogger::new();
        let loc = Location::new("doc.a1", 1);
        let actual = normalize_fragments(&mut logger, &loc, frags(&[(3, 5), (3, 9)]), 100);
        assert_eq!(actual, frags(&[(3, 9)]));
    }

    #[test]
    fn test_property_normalized_fragments_are_sorted_and_disjoint() {
        fn prop(spans: Vec<(u8, u8)>, doc_len: u8) -> TestResult {
            let fragments: Vec<Fragment> = spans
                .into_iter()
                .map(|(a, b)| Fragment::new(a.min(b) as usize, a.max(b) as usize).unwrap())
                .collect();
            if fragments.is_empty() {
                return TestResult::discard();
            }
            let mut logger = CheckLogger::new();
            let loc = Location::new("prop", 1);
            let result = normalize_fragments(&mut logger, &loc, fragments, doc_len as usize);
            for frag in result.iter() {
                if frag.end() > doc_len as usize {
                    return TestResult::failed();
                }
            }
            for w in result.windows(2) {
                if w[1].start() <= w[0].end() {
                    return TestResult::failed();
                }
            }
            TestResult::passed()
        }
        let mut qc = quickcheck::QuickCheck::new().tests(2000);
        qc.quickcheck(prop as fn(Vec<(u8, u8)>, u8) -> TestResult);
    }
}
