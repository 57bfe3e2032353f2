//! Contamination levels and per-example tags.
//!
//! Scan outcomes can be turned into [`ContaminationTag`]s and used to drop
//! contaminated examples from an evaluation with
//! [`filter_by_contamination`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{ContaminationReport, ExampleOutcome, MatchType};

/// Contamination risk, ordered from none to exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContaminationLevel {
    None,
    Low,
    Medium,
    High,
    Exact,
}

impl ContaminationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            ContaminationLevel::None => "none",
            ContaminationLevel::Low => "low",
            ContaminationLevel::Medium => "medium",
            ContaminationLevel::High => "high",
            ContaminationLevel::Exact => "exact",
        }
    }
}

impl fmt::Display for ContaminationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a match score to a level: `>= 1.0` exact, `>= 0.9` high, `>= 0.7`
/// medium, `>= 0.5` low, otherwise none. NaN maps to none.
pub fn level_for_score(score: f64) -> ContaminationLevel {
    if score >= 1.0 {
        ContaminationLevel::Exact
    } else if score >= 0.9 {
        ContaminationLevel::High
    } else if score >= 0.7 {
        ContaminationLevel::Medium
    } else if score >= 0.5 {
        ContaminationLevel::Low
    } else {
        ContaminationLevel::None
    }
}

/// Contamination tag for one benchmark example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContaminationTag {
    pub example_id: String,
    pub level: ContaminationLevel,
    /// `None` when the example was clean.
    pub match_type: Option<MatchType>,
    pub match_score: f64,
    /// Best matching training sample, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_source: Option<String>,
}

impl ContaminationTag {
    pub fn from_outcome(outcome: &ExampleOutcome) -> Self {
        match outcome {
            ExampleOutcome::Contaminated(m) => Self {
                example_id: m.example_id.clone(),
                level: match m.match_type {
                    MatchType::Exact => ContaminationLevel::Exact,
                    MatchType::Near => level_for_score(m.similarity),
                },
                match_type: Some(m.match_type),
                match_score: m.similarity,
                matched_source: m.matched_samples.first().cloned(),
            },
            ExampleOutcome::Clean { example_id } => Self {
                example_id: example_id.clone(),
                level: ContaminationLevel::None,
                match_type: None,
                match_score: 0.0,
                matched_source: None,
            },
        }
    }
}

/// Tag every outcome, keyed by example id.
pub fn tag_outcomes(outcomes: &[ExampleOutcome]) -> BTreeMap<String, ContaminationTag> {
    outcomes
        .iter()
        .map(|o| (o.example_id().to_string(), ContaminationTag::from_outcome(o)))
        .collect()
}

/// Tag the examples listed in a report's detail lists. Examples past the
/// detail cap are not tagged; use [`tag_outcomes`] for complete coverage.
pub fn tag_report(report: &ContaminationReport) -> BTreeMap<String, ContaminationTag> {
    report
        .exact_match_details
        .iter()
        .chain(report.near_match_details.iter())
        .map(|m| {
            let tag = ContaminationTag::from_outcome(&ExampleOutcome::Contaminated(m.clone()));
            (m.example_id.clone(), tag)
        })
        .collect()
}

/// Keep items whose tag level is at most `max_level`. Untagged items are
/// kept.
pub fn filter_by_contamination<T, F>(
    items: impl IntoIterator<Item = T>,
    example_id: F,
    tags: &BTreeMap<String, ContaminationTag>,
    max_level: ContaminationLevel,
) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    items
        .into_iter()
        .filter(|item| {
            tags.get(example_id(item))
                .map_or(true, |tag| tag.level <= max_level)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContaminationMatch;

    fn near(id: &str, similarity: f64) -> ExampleOutcome {
        ExampleOutcome::Contaminated(ContaminationMatch {
            example_id: id.into(),
            matched_samples: vec![format!("train-{id}"), "other".into()],
            match_type: MatchType::Near,
            similarity,
        })
    }

    #[test]
    fn score_thresholds() {
        assert_eq!(level_for_score(1.0), ContaminationLevel::Exact);
        assert_eq!(level_for_score(0.95), ContaminationLevel::High);
        assert_eq!(level_for_score(0.9), ContaminationLevel::High);
        assert_eq!(level_for_score(0.75), ContaminationLevel::Medium);
        assert_eq!(level_for_score(0.5), ContaminationLevel::Low);
        assert_eq!(level_for_score(0.49), ContaminationLevel::None);
        assert_eq!(level_for_score(f64::NAN), ContaminationLevel::None);
    }

    #[test]
    fn levels_are_ordered() {
        assert!(ContaminationLevel::None < ContaminationLevel::Low);
        assert!(ContaminationLevel::High < ContaminationLevel::Exact);
        assert_eq!(
            serde_json::to_string(&ContaminationLevel::Medium).unwrap(),
            "\"medium\""
        );
    }

    #[test]
    fn tags_from_outcomes() {
        let outcomes = vec![
            near("n", 0.92),
            ExampleOutcome::Clean {
                example_id: "c".into(),
            },
        ];
        let tags = tag_outcomes(&outcomes);
        assert_eq!(tags["n"].level, ContaminationLevel::High);
        assert_eq!(tags["n"].matched_source.as_deref(), Some("train-n"));
        assert_eq!(tags["c"].level, ContaminationLevel::None);
        assert_eq!(tags["c"].match_type, None);
    }

    #[test]
    fn filter_keeps_low_and_untagged() {
        let outcomes = vec![near("hi", 0.95), near("med", 0.72), near("lo", 0.55)];
        let tags = tag_outcomes(&outcomes);
        let predictions = vec!["hi", "med", "lo", "untagged"];
        let kept = filter_by_contamination(predictions, |p| *p, &tags, ContaminationLevel::Low);
        assert_eq!(kept, vec!["lo", "untagged"]);

        let kept = filter_by_contamination(
            vec!["hi", "med"],
            |p| *p,
            &tags,
            ContaminationLevel::Exact,
        );
        assert_eq!(kept.len(), 2);
    }
}
