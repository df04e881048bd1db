/**
 * Moderation Verdicts
 *
 * Moderation services disagree on their response shape. This module turns
 * any decoded JSON response into a single flagged/clean verdict using an
 * ordered decision table. The first rule that recognises the shape decides;
 * a response no rule recognises counts as clean.
 *
 * | Rule         | Shape                                                        |
 * |--------------|--------------------------------------------------------------|
 * | `boolean`    | bare `true` / `false`                                        |
 * | `flag_key`   | boolean `profanity`, `isProfane`, `flagged`, `contains_profanity` |
 * | `reason`     | non-empty string `reason`                                    |
 * | `label`      | `label`, `result` or `prediction` mentioning profanity       |
 * | `labels`     | array `labels` with an entry mentioning profanity            |
 * | `score`      | numeric `score` above the threshold                          |
 * | `nested_score` | `scores`, `probabilities` or `confidence` map with a profanity key above the threshold |
 */

use serde_json::Value;

/// Boolean keys checked in order; the first one present decides
pub const FLAG_KEYS: [&str; 4] = ["profanity", "isProfane", "flagged", "contains_profanity"];

/// Keys that may hold a classifier label
pub const LABEL_KEYS: [&str; 3] = ["label", "result", "prediction"];

/// Keys that may hold a map of per-label scores
pub const SCORE_MAP_KEYS: [&str; 3] = ["scores", "probabilities", "confidence"];

/// Scores strictly above this value count as flagged
pub const SCORE_THRESHOLD: f64 = 0.8;

const PROFANITY_MARKER: &str = "profan";

/// One row of the decision table
pub struct VerdictRule {
    pub name: &'static str,
    /// `Some(flagged)` if the rule recognises the response
    pub evaluate: fn(&Value) -> Option<bool>,
}

/// The decision table, in priority order
pub const RULES: &[VerdictRule] = &[
    VerdictRule { name: "boolean", evaluate: bare_boolean },
    VerdictRule { name: "flag_key", evaluate: flag_key },
    VerdictRule { name: "reason", evaluate: reason },
    VerdictRule { name: "label", evaluate: label },
    VerdictRule { name: "labels", evaluate: labels },
    VerdictRule { name: "score", evaluate: top_level_score },
    VerdictRule { name: "nested_score", evaluate: nested_score },
];

/// Outcome of the decision table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub flagged: bool,
    /// Name of the deciding rule, `None` when no rule matched
    pub rule: Option<&'static str>,
}

/// Run the decision table over a decoded response
pub fn evaluate(response: &Value) -> Verdict {
    RULES
        .iter()
        .find_map(|rule| {
            (rule.evaluate)(response).map(|flagged| Verdict {
                flagged,
                rule: Some(rule.name),
            })
        })
        .unwrap_or(Verdict {
            flagged: false,
            rule: None,
        })
}

pub fn is_flagged(response: &Value) -> bool {
    evaluate(response).flagged
}

fn mentions_profanity(text: &str) -> bool {
    text.to_lowercase().contains(PROFANITY_MARKER)
}

fn as_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn bare_boolean(response: &Value) -> Option<bool> {
    response.as_bool()
}

fn flag_key(response: &Value) -> Option<bool> {
    FLAG_KEYS.iter().find_map(|key| response.get(key).and_then(Value::as_bool))
}

fn reason(response: &Value) -> Option<bool> {
    match response.get("reason").and_then(Value::as_str) {
        Some(reason) if !reason.is_empty() => Some(true),
        _ => None,
    }
}

fn label(response: &Value) -> Option<bool> {
    LABEL_KEYS
        .iter()
        .filter_map(|key| response.get(key).and_then(Value::as_str))
        .any(mentions_profanity)
        .then_some(true)
}

fn labels(response: &Value) -> Option<bool> {
    response
        .get("labels")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(Value::as_str)
        .any(mentions_profanity)
        .then_some(true)
}

fn top_level_score(response: &Value) -> Option<bool> {
    let score = response.get("score").and_then(as_score)?;
    (score > SCORE_THRESHOLD).then_some(true)
}

fn nested_score(response: &Value) -> Option<bool> {
    SCORE_MAP_KEYS
        .iter()
        .filter_map(|key| response.get(key).and_then(Value::as_object))
        .flat_map(|scores| scores.iter())
        .any(|(label, score)| {
            mentions_profanity(label) && as_score(score).is_some_and(|score| score > SCORE_THRESHOLD)
        })
        .then_some(true)
}
