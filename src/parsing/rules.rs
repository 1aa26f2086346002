use chrono::{DateTime, Utc};

use super::{label_value, parse_confidence};
use crate::store::RuleRecord;

/// Enumerated-list markers that open a new rule. Deeper numbering is not recognised.
const RULE_MARKERS: [&str; 4] = ["1.", "2.", "3.", "4."];

/// Extract rules from a numbered list, stamped with the current time.
pub fn parse_rules(text: &str) -> Vec<RuleRecord> {
    parse_rules_at(text, Utc::now())
}

/// Extract rules from a numbered list.
///
/// A rule starts at every line beginning with `1.`-`4.` and collects
/// `description:`, `pattern:`/`rule:` and `confidence:` lines (labels are
/// matched case-insensitively anywhere in the line) until the next marker.
/// A repeated label overwrites the earlier value. Unparseable confidences
/// keep the default of 0.8. Labels seen before any marker open an implicit
/// first rule; text with neither markers nor labels yields no rules.
pub fn parse_rules_at(text: &str, now: DateTime<Utc>) -> Vec<RuleRecord> {
    let mut rules = Vec::new();
    let mut current: Option<RuleRecord> = None;

    for raw in text.lines() {
        let line = raw.trim();

        let body = match strip_marker(line) {
            Some(rest) => {
                if let Some(rule) = current.take() {
                    rules.push(rule);
                }
                current = Some(RuleRecord::new(rules.len(), now));
                rest
            }
            None => line,
        };

        let Some(field) = RuleField::detect(body) else {
            continue;
        };
        let rule = current.get_or_insert_with(|| RuleRecord::new(rules.len(), now));
        let value = label_value(body);
        match field {
            RuleField::Description => rule.description = value.to_string(),
            RuleField::Pattern => rule.pattern = value.to_string(),
            RuleField::Confidence => {
                if let Some(confidence) = parse_confidence(value) {
                    rule.confidence = confidence;
                }
            }
        }
    }

    if let Some(rule) = current {
        rules.push(rule);
    }

    rules
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleField {
    Description,
    Pattern,
    Confidence,
}

impl RuleField {
    fn detect(line: &str) -> Option<Self> {
        let lower = line.to_lowercase();
        if lower.contains("description:") {
            Some(Self::Description)
        } else if lower.contains("pattern:") || lower.contains("rule:") {
            Some(Self::Pattern)
        } else if lower.contains("confidence:") {
            Some(Self::Confidence)
        } else {
            None
        }
    }
}

fn strip_marker(line: &str) -> Option<&str> {
    RULE_MARKERS
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FOUR_RULES: &str = "\
Here are the rules I found:

1. Symmetry
   Description: Shapes are mirrored
   Pattern: Reflect the grid across the vertical axis
   Confidence: 0.9
2. Colour
   Description: Colours map one to one
   Pattern: Replace colour 1 with colour 2
   Confidence: 0.75
3. Counting
   Description: Output size follows object count
   Rule: Output has one row per object
   Confidence: 0.6
4. Borders
   Description: Borders are preserved
   Pattern: Keep the outer ring unchanged
   Confidence: 0.85
";

    fn fields(rules: &[RuleRecord]) -> Vec<(&str, &str, f64)> {
        rules
            .iter()
            .map(|r| (r.description.as_str(), r.pattern.as_str(), r.confidence))
            .collect()
    }

    #[test]
    fn test_four_numbered_rules() {
        let rules = parse_rules(FOUR_RULES);
        assert_eq!(
            fields(&rules),
            vec![
                ("Shapes are mirrored", "Reflect the grid across the vertical axis", 0.9),
                ("Colours map one to one", "Replace colour 1 with colour 2", 0.75),
                ("Output size follows object count", "Output has one row per object", 0.6),
                ("Borders are preserved", "Keep the outer ring unchanged", 0.85),
            ]
        );
    }

    #[test]
    fn test_rules_have_unique_ids_and_bookkeeping() {
        let rules = parse_rules(FOUR_RULES);
        assert!(rules[0].rule_id.starts_with("rule_0_"));
        assert!(rules[3].rule_id.starts_with("rule_3_"));
        for rule in &rules {
            assert_eq!(rule.usage_count, 1);
            assert_eq!(rule.success_rate, 0.8);
        }
        let mut ids: Vec<_> = rules.iter().map(|r| r.rule_id.clone()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn test_unlabeled_paragraph_yields_no_rules() {
        let rules = parse_rules("The grid seems to rotate.\nNothing else stands out.");
        assert!(rules.is_empty());
    }

    #[test]
    fn test_labels_without_marker_yield_one_default_rule() {
        let rules = parse_rules("Pattern: fill enclosed regions\nconfidence: maybe");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].description, "");
        assert_eq!(rules[0].pattern, "fill enclosed regions");
        assert_eq!(rules[0].confidence, 0.8);
    }

    #[test]
    fn test_marker_only_yields_empty_rule() {
        let rules = parse_rules("1. Something general");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].description, "");
        assert_eq!(rules[0].pattern, "");
        assert_eq!(rules[0].confidence, 0.8);
    }

    #[test]
    fn test_malformed_confidence_keeps_default() {
        let rules = parse_rules("1. A\nconfidence: high\n2. B\nConfidence: 0.3");
        assert_eq!(rules[0].confidence, 0.8);
        assert_eq!(rules[1].confidence, 0.3);
    }

    #[test]
    fn test_duplicate_label_overwrites() {
        let rules = parse_rules("1. A\nDescription: first\nDescription: second");
        assert_eq!(rules[0].description, "second");
    }

    #[test]
    fn test_label_on_marker_line() {
        let rules = parse_rules("1. **Description:** diagonal lines\n   **Pattern:** extend them");
        assert_eq!(rules[0].description, "diagonal lines");
        assert_eq!(rules[0].pattern, "extend them");
    }

    #[test]
    fn test_fifth_marker_is_not_a_rule_boundary() {
        let rules = parse_rules("1. A\nPattern: a\n5. E\nPattern: e");
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern, "e");
    }

    #[test]
    fn test_labels_case_insensitive() {
        let rules = parse_rules("2. X\nDESCRIPTION: loud\nRULE: shout");
        assert_eq!(rules[0].description, "loud");
        assert_eq!(rules[0].pattern, "shout");
    }

    #[test]
    fn test_timestamps_use_given_time() {
        let now = Utc::now();
        let rules = parse_rules_at("1. A", now);
        assert_eq!(rules[0].created_at, now);
        assert_eq!(rules[0].last_used, now);
    }
}
