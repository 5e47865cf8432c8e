//! Prompt construction
//!
//! Builders for every message the session layer sends: the warm-up primer,
//! the identity confirmation, out-of-band status updates, and the two
//! decision-prompt strategies (compressed full state, incremental delta).

use railbird_foundation::game::GameSnapshot;

/// Appended to every decision prompt so replies stay machine-parseable.
pub const DECISION_FORMAT_HINT: &str = "Respond with JSON only: \
{\"action\": \"fold|check|call|raise|all-in\", \"amount\": <chips>, \
\"confidence\": <0.0-1.0>, \"reasoning\": \"<one sentence>\"}";

/// The expertise primer. Sent once per session; its tokens are paid once
/// and reused through the remote side's context cache.
pub fn primer(entity_name: &str) -> String {
    format!(
        "You are {entity_name}, a professional no-limit hold'em player. \
You evaluate pot odds, position, stack depth, and opponent tendencies \
before every action. You never explain the rules, never break character, \
and always answer decision prompts with a single JSON object. \
{DECISION_FORMAT_HINT}"
    )
}

/// Identity-confirmation message for the warm-up exchange. No decision
/// payload; it exists to prime the remote context.
pub fn identity_confirmation(entity_name: &str) -> String {
    format!(
        "You are seated at the table as {entity_name}. \
Confirm you are ready to receive game states."
    )
}

/// Out-of-band seating/stack update between hands.
pub fn status_update(update: &crate::session::StatusUpdate) -> String {
    let mut text = format!(
        "Table update: you are in {} (seat {} of {}) with {} chips.",
        update.position, update.seat_index, update.total_seats, update.chips
    );
    if let Some(dealer) = update.dealer_position {
        text.push_str(&format!(" The dealer button is at seat {}.", dealer));
    }
    text.push_str(" Acknowledge briefly; no decision is needed.");
    text
}

/// Placeholder assistant turn used by the incremental strategy so the
/// outbound sequence stays role-alternating.
pub fn acknowledgement() -> &'static str {
    "Understood. Ready for the next decision."
}

/// Fully self-contained state prompt. Used for the first turn of a hand or
/// whenever the context cache is cold.
pub fn compressed_state(snapshot: &GameSnapshot) -> String {
    let mut text = format!(
        "Street: {}. Pot: {}. Current bet: {}. To call: {}. \
Your stack: {}. Position: {} (seat index {}).",
        snapshot.phase,
        snapshot.pot,
        snapshot.current_bet,
        snapshot.to_call,
        snapshot.chips,
        snapshot.position,
        snapshot.position_index,
    );

    text.push_str(&format!(
        " Hole cards: {}. Board: {}.",
        join_cards(&snapshot.hole_cards),
        join_cards(&snapshot.community_cards)
    ));

    if !snapshot.action_sequence.is_empty() {
        text.push_str(&format!(
            " Action so far: {}.",
            snapshot.action_sequence.join(", ")
        ));
    }

    if let Some(ref reads) = snapshot.opponent_reads {
        for read in reads {
            text.push_str(&format!(
                " Read on {}: aggression {:.2}, tightness {:.2}, bluffs {:.2}.",
                read.entity_id,
                read.tendencies.aggression,
                read.tendencies.tightness,
                read.tendencies.bluff_frequency
            ));
        }
    }

    if let Some(ref math) = snapshot.math {
        if let Some(win) = math.win_probability {
            text.push_str(&format!(" Win probability: {:.2}.", win));
        }
        if let Some(odds) = math.pot_odds {
            text.push_str(&format!(" Pot odds: {:.2}.", odds));
        }
    }

    text.push(' ');
    text.push_str(DECISION_FORMAT_HINT);
    text
}

/// Delta-only prompt describing the current turn, relying on previously
/// cached context for everything else.
pub fn incremental_delta(snapshot: &GameSnapshot) -> String {
    let mut text = format!(
        "Next to act. Street: {}. Pot: {}. Bet to you: {} (to call: {}).",
        snapshot.phase, snapshot.pot, snapshot.current_bet, snapshot.to_call
    );

    if !snapshot.community_cards.is_empty() {
        text.push_str(&format!(" Board: {}.", join_cards(&snapshot.community_cards)));
    }

    if let Some(last) = snapshot.action_sequence.last() {
        text.push_str(&format!(" Last action: {}.", last));
    }

    text.push(' ');
    text.push_str(DECISION_FORMAT_HINT);
    text
}

fn join_cards(cards: &[String]) -> String {
    if cards.is_empty() {
        "none".to_string()
    } else {
        cards.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railbird_foundation::game::{GameSnapshot, Phase};

    fn snapshot() -> GameSnapshot {
        GameSnapshot {
            phase: Phase::Turn,
            pot: 200,
            current_bet: 60,
            hole_cards: vec!["Ah".into(), "Kd".into()],
            community_cards: vec!["2c".into(), "7h".into(), "Jd".into(), "Qs".into()],
            chips: 740,
            position: "cutoff".into(),
            position_index: 4,
            to_call: 60,
            action_sequence: vec!["p2 bet 60".into()],
            opponent_reads: None,
            math: None,
        }
    }

    #[test]
    fn test_primer_mentions_entity_and_format() {
        let text = primer("Alice");
        assert!(text.contains("Alice"));
        assert!(text.contains("JSON"));
    }

    #[test]
    fn test_compressed_state_is_self_contained() {
        let text = compressed_state(&snapshot());
        assert!(text.contains("turn"));
        assert!(text.contains("Pot: 200"));
        assert!(text.contains("Ah Kd"));
        assert!(text.contains("cutoff"));
        assert!(text.contains(DECISION_FORMAT_HINT));
    }

    #[test]
    fn test_incremental_delta_omits_hole_cards() {
        let text = incremental_delta(&snapshot());
        assert!(!text.contains("Ah"));
        assert!(text.contains("Pot: 200"));
        assert!(text.contains(DECISION_FORMAT_HINT));
    }

    #[test]
    fn test_incremental_is_shorter_than_compressed() {
        assert!(incremental_delta(&snapshot()).len() < compressed_state(&snapshot()).len());
    }
}
