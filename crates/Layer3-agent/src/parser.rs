//! Tolerant decision parser
//!
//! Models return near-JSON: fenced, single-quoted, bare-keyed, trailing
//! commas, or wrapped in prose. The repair pipeline is best-effort and
//! lossy, and its order matters: quote normalization must run before
//! trailing-comma removal so a repaired comma is not re-introduced by a
//! later pass. Failure is a `None`, never an error.

use lazy_static::lazy_static;
use railbird_foundation::game::{ActionKind, Decision};
use serde_json::Value;

lazy_static! {
    static ref CODE_FENCE: regex::Regex =
        regex::Regex::new(r"```(?:[A-Za-z]+)?\s*([\s\S]*?)```").unwrap();
    static ref BARE_KEY: regex::Regex =
        regex::Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_\-]*)\s*:"#).unwrap();
    static ref TRAILING_COMMA: regex::Regex = regex::Regex::new(r",\s*([}\]])").unwrap();
}

/// Extract a structured decision from a raw model reply.
///
/// Accepts only the five engine actions; `amount` defaults to 0 when
/// absent. Anything unparseable after repair is "no decision extracted"
/// and the caller applies its own fallback.
pub fn parse_decision(raw: &str) -> Option<Decision> {
    let unfenced = strip_code_fences(raw);
    let block = extract_object(&unfenced)?;
    let repaired = repair_json(block);

    let value: Value = serde_json::from_str(&repaired).ok()?;
    decision_from_value(&value)
}

/// Strip a Markdown code-fence wrapper when present.
fn strip_code_fences(raw: &str) -> String {
    match CODE_FENCE.captures(raw) {
        Some(caps) => caps[1].to_string(),
        None => raw.to_string(),
    }
}

/// Cut out the first `{ ... }` block; replies often wrap the object in
/// commentary.
fn extract_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// The repair pipeline: single quotes to double quotes, quote bare keys,
/// drop trailing commas.
fn repair_json(block: &str) -> String {
    let quoted = block.replace('\'', "\"");
    let keyed = BARE_KEY.replace_all(&quoted, "${1}\"${2}\":");
    TRAILING_COMMA.replace_all(&keyed, "${1}").into_owned()
}

fn decision_from_value(value: &Value) -> Option<Decision> {
    let action = ActionKind::parse(value.get("action")?.as_str()?)?;

    let amount = value
        .get("amount")
        .map(|v| {
            v.as_u64()
                .or_else(|| v.as_f64().map(|f| f.max(0.0) as u64))
                .unwrap_or(0)
        })
        .unwrap_or(0);

    let confidence = value.get("confidence").and_then(Value::as_f64);
    let reasoning = value
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(Decision {
        action,
        amount,
        confidence,
        reasoning,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_json() {
        let decision = parse_decision(r#"{"action": "call", "amount": 20}"#).unwrap();
        assert_eq!(decision.action, ActionKind::Call);
        assert_eq!(decision.amount, 20);
    }

    #[test]
    fn test_fenced_single_quoted_bare_keys_trailing_comma() {
        let raw = "```json\n{action: 'call', amount: 20,}\n```";
        let decision = parse_decision(raw).unwrap();
        assert_eq!(decision.action, ActionKind::Call);
        assert_eq!(decision.amount, 20);
    }

    #[test]
    fn test_object_wrapped_in_prose() {
        let raw = "I think the best play here is:\n{\"action\": \"raise\", \"amount\": 120}\nGood luck!";
        let decision = parse_decision(raw).unwrap();
        assert_eq!(decision.action, ActionKind::Raise);
        assert_eq!(decision.amount, 120);
    }

    #[test]
    fn test_amount_defaults_to_zero() {
        let decision = parse_decision(r#"{"action": "fold"}"#).unwrap();
        assert_eq!(decision.amount, 0);
    }

    #[test]
    fn test_fractional_amount_is_floored() {
        let decision = parse_decision(r#"{"action": "raise", "amount": 45.7}"#).unwrap();
        assert_eq!(decision.amount, 45);
    }

    #[test]
    fn test_invalid_action_is_rejected() {
        assert!(parse_decision(r#"{"action": "bet", "amount": 20}"#).is_none());
        assert!(parse_decision(r#"{"action": "limp"}"#).is_none());
    }

    #[test]
    fn test_all_in_accepted() {
        let decision = parse_decision(r#"{"action": "all-in", "amount": 740}"#).unwrap();
        assert_eq!(decision.action, ActionKind::AllIn);
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(parse_decision("I fold.").is_none());
        assert!(parse_decision("").is_none());
        assert!(parse_decision("{{{").is_none());
    }

    #[test]
    fn test_confidence_and_reasoning_pass_through() {
        let raw = r#"{"action": "call", "amount": 20, "confidence": 0.8, "reasoning": "pot odds"}"#;
        let decision = parse_decision(raw).unwrap();
        assert_eq!(decision.confidence, Some(0.8));
        assert_eq!(decision.reasoning.as_deref(), Some("pot odds"));
    }

    #[test]
    fn test_nested_trailing_commas() {
        let raw = r#"{"action": "check", "amount": 0, "reasoning": "free card",}"#;
        let decision = parse_decision(raw).unwrap();
        assert_eq!(decision.action, ActionKind::Check);
    }
}
