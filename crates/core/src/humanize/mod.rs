//! Post-processing of generated text before it reaches chat.
//!
//! Stages run in a fixed order: cleanup, unknown-emote removal, repetition
//! check, length enforcement, then the optional interjection, typo and emote
//! steps. The optional steps never push the text past the length limit.

pub mod clean;
pub mod emote;
pub mod interject;
pub mod repetition;
pub mod truncate;
pub mod typo;

use crate::config::LurkerCfg;
use crate::entropy::Entropy;
use crate::sensory::filter::is_forbidden;
use crate::state::ChannelState;
use crate::types::{HumanizationResult, Humanized, Rejection, ReplyKind};

pub struct Humanizer<'a> {
    cfg: &'a LurkerCfg,
    /// Names a model may echo as a `name:` prefix.
    names: [&'a str; 2],
}

impl<'a> Humanizer<'a> {
    pub fn new(cfg: &'a LurkerCfg, nick: &'a str, persona_name: &'a str) -> Self {
        Self { cfg, names: [nick, persona_name] }
    }

    pub fn limit(&self, kind: ReplyKind) -> usize {
        match kind {
            ReplyKind::Mention => self.cfg.mention_max_len,
            ReplyKind::Ambient => self.cfg.ambient_max_len,
        }
    }

    /// Turn a raw candidate into sendable text, or say why it must be dropped.
    ///
    /// May release part of the emote cooldown buffer; the chosen emote is
    /// recorded by the caller once the line is sent.
    pub fn humanize(
        &self,
        raw: &str,
        kind: ReplyKind,
        st: &mut ChannelState,
        entropy: &mut dyn Entropy,
    ) -> HumanizationResult {
        let cfg = self.cfg;
        let limit = self.limit(kind);

        let text = clean::strip_artifacts(raw, &self.names);
        let text = clean::drop_unknown_emotes(&text, &st.known_emotes);
        if text.is_empty() {
            return Err(Rejection::Empty);
        }
        if is_forbidden(&text, cfg) {
            return Err(Rejection::Forbidden);
        }
        if repetition::is_repetitive(&text, st.recent_responses.iter(), cfg.repetition_threshold) {
            return Err(Rejection::Repetitive);
        }

        let text = truncate::truncate(&text, limit)?;

        let (text, interjection) = interject::maybe_interject(&text, limit, cfg, entropy);

        let (text, correction) =
            match typo::maybe_typo(&text, st.mood, limit, &st.known_emotes, cfg, entropy) {
                Some(t) => {
                    let correction = typo::maybe_correction(&t, cfg, entropy);
                    (t.text, correction)
                }
                None => (text, None),
            };

        let (text, emote) = emote::maybe_attach(
            &text,
            limit,
            &st.known_emotes,
            &st.popular_emotes,
            &mut st.recent_used_emotes,
            cfg,
            entropy,
        );

        Ok(Humanized { text, correction, emote, interjection })
    }
}
