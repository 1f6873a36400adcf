/**
This module gives a few tools to prettyprint scoring results as a table and to serialize them.
*/
use crate::metrics::MeasureDirection;
use crate::scoring::{ConfidenceInterval, MeasureResult, ScoringResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;

/// Confidence used by `Reporter::from`.
pub const DEFAULT_CONFIDENCE: f64 = 0.95;

/// The reporter holds the rows of a scoring result. It can be displayed as if it were a
/// dataframe, one line per measure, and serialized with serde. In the serialized form, NaN and
/// infinite values become `null`.
///
/// # Example
///
/// ```rust
/// use steval::{Identity, Pair, Reporter, Scoring, StandardMeasure};
///
/// let pairs = vec![Pair::matched(1, 1), Pair::matched(2, 3), Pair::false_negative(4)];
/// let scoring = Scoring::new("main", Identity).measures(StandardMeasure::f1_group());
/// let reporter = Reporter::new(&scoring.result(&pairs, None), 0.95);
///
/// let expected_report =
/// "Measure, Value, Low, High
/// F1, 0.4, -, -
/// Recall, 0.3333333333333333, -, -
/// Precision, 0.5, -, -\n";
///
/// assert_eq!(expected_report, reporter.to_string());
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Reporter {
    pub name: String,
    pub confidence: f64,
    pub rows: Vec<ReportRow>,
}

impl Reporter {
    /// * `result`: the scoring result to present.
    /// * `confidence`: proportion of the resamples the intervals hold.
    pub fn new(result: &ScoringResult, confidence: f64) -> Self {
        Self {
            name: result.name.clone(),
            confidence,
            rows: result
                .measures
                .iter()
                .map(|m| ReportRow::new(m, confidence))
                .collect(),
        }
    }
}

impl From<&ScoringResult> for Reporter {
    fn from(value: &ScoringResult) -> Self {
        Self::new(value, DEFAULT_CONFIDENCE)
    }
}

/// The Reporter struct acts as a dataframe when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Measure, Value, Low, High")?;
        for row in self.rows.iter() {
            writeln!(f, "{}", row)?
        }
        Ok(())
    }
}

/// One measure of a report.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReportRow {
    pub measure: String,
    pub direction: MeasureDirection,
    #[serde(serialize_with = "finite", deserialize_with = "nan_if_null")]
    pub value: f64,
    #[serde(serialize_with = "finite_opt")]
    pub low: Option<f64>,
    #[serde(serialize_with = "finite_opt")]
    pub high: Option<f64>,
}

impl ReportRow {
    fn new(result: &MeasureResult, confidence: f64) -> Self {
        let interval = result.confidence_interval(confidence);
        Self {
            measure: result.name.clone(),
            direction: result.direction,
            value: result.value,
            low: interval.map(|ConfidenceInterval { low, .. }| low),
            high: interval.map(|ConfidenceInterval { high, .. }| high),
        }
    }
}

/// The row acts as a line in a dataframe when displayed.
impl Display for ReportRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = |b: Option<f64>| b.map_or(String::from("-"), |v| v.to_string());
        write!(
            f,
            "{}, {}, {}, {}",
            self.measure,
            self.value,
            bound(self.low),
            bound(self.high)
        )
    }
}

fn finite<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    value.is_finite().then_some(*value).serialize(serializer)
}

fn finite_opt<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    value.filter(|v| v.is_finite()).serialize(serializer)
}

fn nan_if_null<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_jsonlines::JsonLinesWriter;

    fn result() -> ScoringResult {
        ScoringResult {
            name: String::from("main"),
            measures: vec![
                MeasureResult {
                    name: String::from("Recall"),
                    direction: MeasureDirection::HigherIsBetter,
                    value: 0.5,
                    resamples: vec![0.25, 0.75, 0.5, 0.5],
                },
                MeasureResult {
                    name: String::from("SER"),
                    direction: MeasureDirection::LowerIsBetter,
                    value: f64::INFINITY,
                    resamples: Vec::new(),
                },
            ],
        }
    }

    #[test]
    fn test_display() {
        let reporter = Reporter::new(&result(), 0.5);
        let expected = "Measure, Value, Low, High\nRecall, 0.5, 0.5, 0.75\nSER, inf, -, -\n";
        assert_eq!(reporter.to_string(), expected);
    }

    fn to_json_line(row: &ReportRow) -> String {
        let mut writer = JsonLinesWriter::new(Vec::new());
        writer.write(row).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_serialize_non_finite_as_null() {
        let reporter = Reporter::from(&result());
        assert_eq!(
            to_json_line(&reporter.rows[1]),
            "{\"measure\":\"SER\",\"direction\":\"LowerIsBetter\",\"value\":null,\"low\":null,\"high\":null}\n"
        );
        assert!(to_json_line(&reporter.rows[0]).contains("\"value\":0.5"));
    }
}
