use serde::{Deserialize, Serialize};

use super::{label_value, parse_confidence};

/// Two candidate answers with independent confidences and a recommendation.
///
/// Confidences are not required to sum to 1. By convention the recommendation
/// repeats one of the two answers, but nothing enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualAnswerBundle {
    pub primary_answer: String,
    pub alternative_answer: String,
    pub primary_confidence: f64,
    pub alternative_confidence: f64,
    pub reasoning_comparison: String,
    pub recommended_answer: String,
}

/// Placeholder values for fields the completion never mentions.
impl Default for DualAnswerBundle {
    fn default() -> Self {
        Self {
            primary_answer: "Primary answer not found".to_string(),
            alternative_answer: "Alternative answer not found".to_string(),
            primary_confidence: 0.8,
            alternative_confidence: 0.7,
            reasoning_comparison: "Reasoning comparison not found".to_string(),
            recommended_answer: "Recommended answer not found".to_string(),
        }
    }
}

/// Extract a dual-answer bundle from labelled lines.
///
/// Recognised labels (case-insensitive, anywhere in the line):
/// `primary answer:`, `alternative answer:`, `primary confidence:`,
/// `alternative confidence:`, `reasoning comparison:`, `recommended answer:`.
/// Later lines win. Unmatched fields keep the [`Default`] placeholders and
/// invalid confidences leave the running value untouched.
pub fn parse_dual_answer(text: &str) -> DualAnswerBundle {
    let mut bundle = DualAnswerBundle::default();

    for raw in text.lines() {
        let line = raw.trim();
        let lower = line.to_lowercase();
        let value = label_value(line);

        if lower.contains("primary answer:") {
            bundle.primary_answer = value.to_string();
        } else if lower.contains("alternative answer:") {
            bundle.alternative_answer = value.to_string();
        } else if lower.contains("primary confidence:") {
            if let Some(confidence) = parse_confidence(value) {
                bundle.primary_confidence = confidence;
            }
        } else if lower.contains("alternative confidence:") {
            if let Some(confidence) = parse_confidence(value) {
                bundle.alternative_confidence = confidence;
            }
        } else if lower.contains("reasoning comparison:") {
            bundle.reasoning_comparison = value.to_string();
        } else if lower.contains("recommended answer:") {
            bundle.recommended_answer = value.to_string();
        }
    }

    bundle
}
