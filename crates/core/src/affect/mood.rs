use chrono::{DateTime, Duration, Utc};

use crate::config::LurkerCfg;
use crate::state::ChannelState;
use crate::types::clamp_scalar;

/// Occurrences of positive and negative indicators in `text` (case-insensitive substrings).
pub fn indicator_counts(text: &str, cfg: &LurkerCfg) -> (usize, usize) {
    let lower = text.to_lowercase();
    let count = |list: &[String]| -> usize {
        list.iter()
            .filter(|w| !w.is_empty())
            .map(|w| lower.matches(w.to_lowercase().as_str()).count())
            .sum()
    };
    (count(&cfg.positive_indicators), count(&cfg.negative_indicators))
}

/// True when a line carries more negative than positive indicators.
pub fn is_hostile(text: &str, cfg: &LurkerCfg) -> bool {
    let (pos, neg) = indicator_counts(text, cfg);
    neg > pos
}

/// Reaction term for the bot's last line, resolved at most once per line.
///
/// Two or more reactions add the delta as soon as they arrive; zero reactions
/// once the window has passed subtract it. Anything else is still pending.
pub fn settle_reactions(st: &mut ChannelState, now: DateTime<Utc>, cfg: &LurkerCfg) -> f64 {
    let Some(sent_at) = st.awaiting_reactions else {
        return 0.0;
    };
    let window_over = now - sent_at > Duration::seconds(cfg.reaction_window_secs);
    let term = if st.reactions >= 2 {
        cfg.reaction_delta
    } else if window_over && st.reactions == 0 {
        -cfg.reaction_delta
    } else {
        0.0
    };
    if term != 0.0 || window_over {
        st.awaiting_reactions = None;
        st.reactions = 0;
    }
    term
}

/// Asymmetric exponential smoothing toward `target`. Never snaps.
pub fn smooth(current: f64, target: f64, cfg: &LurkerCfg) -> f64 {
    let target = clamp_scalar(target);
    let inertia = if target > current { cfg.inertia_rising } else { cfg.inertia_falling };
    clamp_scalar(current * inertia + target * (1.0 - inertia))
}

/// Mood target for an inbound chat line.
pub fn target_for(st: &ChannelState, text: &str, reaction: f64, cfg: &LurkerCfg) -> f64 {
    let (pos, neg) = indicator_counts(text, cfg);
    st.mood + pos as f64 * cfg.mood_positive_delta - neg as f64 * cfg.mood_negative_delta + reaction
}

/// React to one inbound chat line. Returns the new mood.
pub fn on_message(st: &mut ChannelState, text: &str, now: DateTime<Utc>, cfg: &LurkerCfg) -> f64 {
    let reaction = settle_reactions(st, now, cfg);
    let target = target_for(st, text, reaction, cfg);
    let mood = smooth(st.mood, target, cfg);
    st.set_mood(mood);
    st.mood
}

/// Periodic drift toward neutral, still honouring pending reactions.
pub fn drift(st: &mut ChannelState, now: DateTime<Utc>, cfg: &LurkerCfg) -> f64 {
    let reaction = settle_reactions(st, now, cfg);
    let mood = smooth(st.mood, cfg.mood_neutral + reaction, cfg);
    st.set_mood(mood);
    st.mood
}

/// Mood in words, for the prompt.
pub fn describe(mood: f64) -> &'static str {
    match mood {
        m if m >= 80.0 => "in a great mood, playful",
        m if m >= 60.0 => "in a good mood",
        m if m >= 40.0 => "calm",
        m if m >= 20.0 => "a bit grumpy",
        _ => "annoyed and curt",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MAX, MIN, Message};

    fn st() -> ChannelState {
        ChannelState::new("#t", &LurkerCfg::default())
    }

    #[test]
    fn positive_message_moves_partway() {
        let cfg = LurkerCfg::default();
        let mut s = st();
        s.mood = 70.0;
        let target = target_for(&s, "haha nice one", 0.0, &cfg);
        assert_eq!(target, 86.0);
        let mood = on_message(&mut s, "haha nice one", Utc::now(), &cfg);
        assert!(mood > 70.0 && mood < target);
        assert!((mood - 76.4).abs() < 1e-9);
    }

    #[test]
    fn drops_land_faster_than_rises() {
        let cfg = LurkerCfg::default();
        let up = smooth(50.0, 60.0, &cfg) - 50.0;
        let down = 50.0 - smooth(50.0, 40.0, &cfg);
        assert!(down > up);
    }

    #[test]
    fn mood_stays_bounded() {
        let cfg = LurkerCfg::default();
        let mut s = st();
        let spam = "hate ".repeat(200);
        for _ in 0..50 {
            on_message(&mut s, &spam, Utc::now(), &cfg);
            assert!(s.mood >= MIN && s.mood <= MAX);
        }
        let praise = "love ".repeat(200);
        for _ in 0..50 {
            on_message(&mut s, &praise, Utc::now(), &cfg);
            assert!(s.mood >= MIN && s.mood <= MAX);
        }
        assert!(s.mood > 90.0);
    }

    #[test]
    fn ignored_line_lowers_mood() {
        let cfg = LurkerCfg::default();
        let mut s = st();
        let sent = Utc::now() - Duration::seconds(300);
        s.record_outbound(Message::at("#t", "lurker", "hello?", true, sent), &[]);
        let term = settle_reactions(&mut s, Utc::now(), &cfg);
        assert_eq!(term, -cfg.reaction_delta);
        assert!(s.awaiting_reactions.is_none());
        // resolved once
        assert_eq!(settle_reactions(&mut s, Utc::now(), &cfg), 0.0);
    }

    #[test]
    fn two_reactions_raise_mood_term() {
        let cfg = LurkerCfg::default();
        let mut s = st();
        s.record_outbound(Message::bot("#t", "lurker", "gm"), &[]);
        s.record_inbound(Message::chat("#t", "a", "gm @lurker"), "lurker");
        assert_eq!(settle_reactions(&mut s, Utc::now(), &cfg), 0.0);
        assert!(s.awaiting_reactions.is_some());
        s.record_inbound(Message::chat("#t", "b", "lurker gm"), "lurker");
        assert_eq!(settle_reactions(&mut s, Utc::now(), &cfg), cfg.reaction_delta);
    }

    #[test]
    fn drift_returns_toward_neutral() {
        let cfg = LurkerCfg::default();
        let mut s = st();
        s.mood = 10.0;
        let m = drift(&mut s, Utc::now(), &cfg);
        assert!(m > 10.0 && m < 50.0);
    }

    #[test]
    fn hostility_compares_counts() {
        let cfg = LurkerCfg::default();
        assert!(is_hostile("this is boring trash", &cfg));
        assert!(!is_hostile("boring but lol nice", &cfg));
    }
}
