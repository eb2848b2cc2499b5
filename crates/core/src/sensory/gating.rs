use chrono::{DateTime, Utc};

use super::relevance::mentions_handle;
use crate::config::LurkerCfg;
use crate::entropy::Entropy;
use crate::state::ChannelState;
use crate::types::{DecisionReason, EligibilityDecision, RelationshipLevel, seconds_since};

/// Lines starting with this prefix are chat commands.
pub const COMMAND_PREFIX: char = '!';

pub fn is_command(text: &str) -> bool {
    text.trim_start().starts_with(COMMAND_PREFIX)
}

/// Decide whether to attempt a reply to `text` from `author`.
///
/// Reads state only; expired away flags are cleared by the caller.
pub fn decide(
    st: &ChannelState,
    author: &str,
    text: &str,
    nick: &str,
    now: DateTime<Utc>,
    cfg: &LurkerCfg,
    entropy: &mut dyn Entropy,
) -> EligibilityDecision {
    if author.eq_ignore_ascii_case(nick) {
        return EligibilityDecision::decline(DecisionReason::SelfAuthored);
    }
    if is_command(text) {
        return EligibilityDecision::decline(DecisionReason::Command);
    }

    let mentioned = mentions_handle(text, nick);
    if st.is_away(now) {
        if !mentioned {
            return EligibilityDecision::decline(DecisionReason::Away);
        }
        if entropy.chance(cfg.away_ignore_chance) {
            return EligibilityDecision::decline(DecisionReason::AwayIgnoredMention);
        }
        return EligibilityDecision::accept(DecisionReason::Mentioned);
    }
    if mentioned {
        return EligibilityDecision::accept(DecisionReason::Mentioned);
    }

    let elapsed = seconds_since(st.last_response_at, now);
    if elapsed < min_cooldown(st, now, cfg) {
        return EligibilityDecision::decline(DecisionReason::Cooldown);
    }
    if st.messages_since_response < cfg.min_messages_between {
        return EligibilityDecision::decline(DecisionReason::TooFewMessages);
    }
    if elapsed > cfg.max_cooldown_secs {
        return EligibilityDecision::accept(DecisionReason::MaxCooldownElapsed);
    }

    let level = st.relationship(author).level();
    let p = response_probability(level, st.energy, cfg);
    EligibilityDecision {
        accept: entropy.unit() < p,
        reason: DecisionReason::Chance,
        probability: p,
    }
}

/// Minimum cooldown in seconds, inflated while chat is busy.
pub fn min_cooldown(st: &ChannelState, now: DateTime<Utc>, cfg: &LurkerCfg) -> i64 {
    let base = cfg.min_cooldown_secs as f64;
    if st.messages_per_minute(now) > cfg.high_activity_per_min {
        (base * cfg.activity_fatigue_mult) as i64
    } else {
        base as i64
    }
}

pub fn relationship_bonus(level: RelationshipLevel, cfg: &LurkerCfg) -> f64 {
    match level {
        RelationshipLevel::Stranger => cfg.bonus_stranger,
        RelationshipLevel::Acquaintance => cfg.bonus_acquaintance,
        RelationshipLevel::Friend => cfg.bonus_friend,
        RelationshipLevel::Favorite => cfg.bonus_favorite,
        RelationshipLevel::Toxic => cfg.bonus_toxic,
    }
}

pub fn energy_multiplier(energy: f64, cfg: &LurkerCfg) -> f64 {
    if energy < cfg.low_energy {
        cfg.low_energy_mult
    } else if energy > cfg.high_energy {
        cfg.high_energy_mult
    } else {
        1.0
    }
}

pub fn response_probability(level: RelationshipLevel, energy: f64, cfg: &LurkerCfg) -> f64 {
    let p = (cfg.base_probability + relationship_bonus(level, cfg)) * energy_multiplier(energy, cfg);
    p.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::ScriptedEntropy;
    use crate::types::Message;
    use chrono::Duration;

    const NICK: &str = "lurker";

    fn st() -> ChannelState {
        ChannelState::new("#g", &LurkerCfg::default())
    }

    fn ready_state(now: DateTime<Utc>, since_response_secs: i64) -> ChannelState {
        let mut s = st();
        s.last_response_at = Some(now - Duration::seconds(since_response_secs));
        s.messages_since_response = 5;
        s
    }

    #[test]
    fn self_authored_never_accepted() {
        let cfg = LurkerCfg::default();
        let now = Utc::now();
        let s = ready_state(now, 10_000);
        for v in [0.0, 0.5, 0.99] {
            let mut e = ScriptedEntropy::constant(v);
            let d = decide(&s, "Lurker", "@lurker talking to myself", NICK, now, &cfg, &mut e);
            assert!(!d.accept);
            assert_eq!(d.reason, DecisionReason::SelfAuthored);
        }
    }

    #[test]
    fn mention_accepted_even_in_cooldown() {
        let cfg = LurkerCfg::default();
        let now = Utc::now();
        let s = ready_state(now, 1);
        let mut e = ScriptedEntropy::constant(0.99);
        let d = decide(&s, "bob", "hey @lurker", NICK, now, &cfg, &mut e);
        assert!(d.accept);
        assert_eq!(d.reason, DecisionReason::Mentioned);
    }

    #[test]
    fn commands_never_pass() {
        let cfg = LurkerCfg::default();
        let now = Utc::now();
        let s = ready_state(now, 10_000);
        let mut e = ScriptedEntropy::constant(0.0);
        let d = decide(&s, "bob", "!ping lurker", NICK, now, &cfg, &mut e);
        assert!(!d.accept);
        assert_eq!(d.reason, DecisionReason::Command);
    }

    #[test]
    fn away_ignores_chat_and_sometimes_mentions() {
        let cfg = LurkerCfg::default();
        let now = Utc::now();
        let mut s = ready_state(now, 10_000);
        s.afk_until = Some(now + Duration::minutes(10));

        let mut e = ScriptedEntropy::constant(0.9);
        assert_eq!(decide(&s, "bob", "hello chat", NICK, now, &cfg, &mut e).reason, DecisionReason::Away);

        let mut ignore = ScriptedEntropy::constant(0.1);
        let d = decide(&s, "bob", "@lurker wake up", NICK, now, &cfg, &mut ignore);
        assert!(!d.accept);
        assert_eq!(d.reason, DecisionReason::AwayIgnoredMention);

        let mut answer = ScriptedEntropy::constant(0.9);
        assert!(decide(&s, "bob", "@lurker wake up", NICK, now, &cfg, &mut answer).accept);
    }

    #[test]
    fn expired_away_behaves_normally() {
        let cfg = LurkerCfg::default();
        let now = Utc::now();
        let mut s = ready_state(now, 10_000);
        s.busy_until = Some(now - Duration::seconds(1));
        let mut e = ScriptedEntropy::constant(0.99);
        let d = decide(&s, "bob", "hello chat", NICK, now, &cfg, &mut e);
        assert_eq!(d.reason, DecisionReason::MaxCooldownElapsed);
    }

    #[test]
    fn cooldown_and_message_count_block() {
        let cfg = LurkerCfg::default();
        let now = Utc::now();
        let mut e = ScriptedEntropy::constant(0.0);

        let s = ready_state(now, 30);
        assert_eq!(decide(&s, "bob", "hello", NICK, now, &cfg, &mut e).reason, DecisionReason::Cooldown);

        let mut s = ready_state(now, 300);
        s.messages_since_response = 2;
        assert_eq!(
            decide(&s, "bob", "hello", NICK, now, &cfg, &mut e).reason,
            DecisionReason::TooFewMessages
        );
    }

    #[test]
    fn busy_chat_doubles_cooldown() {
        let cfg = LurkerCfg::default();
        let now = Utc::now();
        let mut s = ready_state(now, 90);
        for i in 0..13 {
            s.record_inbound(
                Message::at("#g", "spam", format!("line {i}"), false, now - Duration::seconds(i)),
                NICK,
            );
        }
        assert_eq!(min_cooldown(&s, now, &cfg), 120);
        let mut e = ScriptedEntropy::constant(0.0);
        assert_eq!(decide(&s, "bob", "hello", NICK, now, &cfg, &mut e).reason, DecisionReason::Cooldown);
    }

    #[test]
    fn max_cooldown_accepts_for_any_seed() {
        let cfg = LurkerCfg::default();
        let now = Utc::now();
        let s = ready_state(now, cfg.max_cooldown_secs + 1);
        for v in [0.0, 0.3, 0.7, 0.999] {
            let mut e = ScriptedEntropy::constant(v);
            let d = decide(&s, "bob", "hello", NICK, now, &cfg, &mut e);
            assert!(d.accept);
            assert_eq!(d.reason, DecisionReason::MaxCooldownElapsed);
        }
    }

    #[test]
    fn never_responded_counts_as_long_ago() {
        let cfg = LurkerCfg::default();
        let now = Utc::now();
        let mut s = st();
        s.messages_since_response = 3;
        let mut e = ScriptedEntropy::constant(0.99);
        assert!(decide(&s, "bob", "hello", NICK, now, &cfg, &mut e).accept);
    }

    #[test]
    fn chance_rule_uses_probability() {
        let cfg = LurkerCfg::default();
        let now = Utc::now();
        let mut s = ready_state(now, 300);
        s.energy = 50.0;
        let mut low = ScriptedEntropy::constant(0.1);
        let d = decide(&s, "bob", "hello", NICK, now, &cfg, &mut low);
        assert!(d.accept);
        assert!((d.probability - 0.15).abs() < 1e-9);
        let mut high = ScriptedEntropy::constant(0.2);
        assert!(!decide(&s, "bob", "hello", NICK, now, &cfg, &mut high).accept);
    }

    #[test]
    fn probability_is_clamped() {
        let cfg = LurkerCfg::default();
        assert_eq!(response_probability(RelationshipLevel::Toxic, 10.0, &cfg), 0.0);
        let p = response_probability(RelationshipLevel::Favorite, 90.0, &cfg);
        assert!((p - 0.52).abs() < 1e-9);
        let generous = LurkerCfg { base_probability: 0.95, ..LurkerCfg::default() };
        assert_eq!(response_probability(RelationshipLevel::Favorite, 90.0, &generous), 1.0);
    }
}
