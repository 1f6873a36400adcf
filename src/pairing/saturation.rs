use crate::corpus::Ann;
use crate::pairing::{HeuristicPairing, Pair, PairingAlgorithm, PairingError};
use crate::similarity::Similarity;
use ahash::{AHashMap, AHashSet};
use itertools::iproduct;

const AGENT_ROLE: &str = "Microorganism";

/// Events whose arguments are expanded over equivalences, with their second role.
const SATURATED_EVENTS: [(&str, &str); 2] = [("Lives_In", "Location"), ("Exhibits", "Phenotype")];

/// Second role of a reference event that takes part in saturation.
fn saturable_role(ann: &Ann) -> Option<&'static str> {
    if !ann.is_relation() || ann.is_virtual() || !ann.has_argument(AGENT_ROLE) {
        return None;
    }
    SATURATED_EVENTS
        .iter()
        .find(|(event, role)| ann.annotation_type() == *event && ann.has_argument(role))
        .map(|(_, role)| *role)
}

/// The event followed by one virtual copy per combination of argument equivalents, or `None`
/// if neither argument has an equivalent.
fn saturate(event: &Ann, second_role: &str) -> Option<Vec<Ann>> {
    let agent = event.argument(AGENT_ROLE)?;
    let second = event.argument(second_role)?;
    let agents = agent.equivalents();
    let seconds = second.equivalents();
    if agents.len() == 1 && seconds.len() == 1 {
        return None;
    }
    let mut family = Vec::with_capacity(agents.len() * seconds.len());
    family.push(event.clone());
    let combinations = iproduct!(agents.iter(), seconds.iter())
        .filter(|(a, s)| !(**a == agent && **s == second));
    for (n, (a, s)) in combinations.enumerate() {
        let arguments = event
            .arguments()
            .into_iter()
            .map(|(role, arg)| {
                let key = match role.as_str() {
                    AGENT_ROLE => a.key(),
                    r if r == second_role => s.key(),
                    _ => arg.key(),
                };
                (role, key)
            })
            .collect();
        family.push(event.virtual_relation(format!("{}~{}", event.id(), n + 1), arguments));
    }
    Some(family)
}

/// Heuristic pairing where `Lives_In` and `Exhibits` reference events also match predictions
/// that use equivalent arguments. Each saturated event is paired with the prediction that best
/// matches any member of its virtual family.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaturatedEventPairing {
    inner: HeuristicPairing,
}

impl SaturatedEventPairing {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PairingAlgorithm<Ann> for SaturatedEventPairing {
    fn best_pairing(
        &self,
        reference: &[Ann],
        prediction: &[Ann],
        similarity: &dyn Similarity<Ann>,
    ) -> Result<Vec<Pair<Ann>>, PairingError> {
        let families: Vec<Vec<Ann>> = reference
            .iter()
            .filter_map(|ann| saturate(ann, saturable_role(ann)?))
            .collect();
        if families.is_empty() {
            return self.inner.best_pairing(reference, prediction, similarity);
        }
        let mut extended = reference.to_vec();
        extended.extend(families.iter().flat_map(|f| f.iter().skip(1).cloned()));
        tracing::debug!(
            events = families.len(),
            virtuals = extended.len() - reference.len(),
            "saturated reference events"
        );
        let pairs = self.inner.best_pairing(&extended, prediction, similarity)?;

        let matched: AHashMap<&Ann, &Ann> = pairs
            .iter()
            .filter_map(|p| Some((p.reference()?, p.prediction()?)))
            .collect();
        let mut replacements = Vec::with_capacity(families.len());
        for family in families.iter() {
            let mut best: Option<(&Ann, f64)> = None;
            for member in family.iter() {
                let Some(pred) = matched.get(member) else {
                    continue;
                };
                let score = similarity.compute(member, pred);
                if score > 0.0 && best.map_or(true, |(_, b)| score > b) {
                    best = Some((*pred, score));
                }
            }
            replacements.push(Pair {
                reference: Some(family[0].clone()),
                prediction: best.map(|(p, _)| p.clone()),
            });
        }

        let saturated: AHashSet<&Ann> = families.iter().flatten().collect();
        let mut result: Vec<Pair<Ann>> = pairs
            .iter()
            .filter(|p| p.reference().map_or(true, |r| !saturated.contains(r)))
            .cloned()
            .collect();
        result.extend(replacements);
        Ok(result)
    }
}
