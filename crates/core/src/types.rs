use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Lower bound of mood and energy.
pub const MIN: f64 = 0.0;
/// Upper bound of mood and energy.
pub const MAX: f64 = 100.0;

/// Clamp a mood/energy value into `[MIN, MAX]`. NaN collapses to `MIN`.
pub fn clamp_scalar(v: f64) -> f64 {
    if v.is_nan() { MIN } else { v.clamp(MIN, MAX) }
}

/// Whole seconds since `t`; `i64::MAX` when it never happened.
pub fn seconds_since(t: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    t.map(|t| (now - t).num_seconds()).unwrap_or(i64::MAX)
}

/// One chat line, as seen by the pipeline. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub channel: String,
    pub author: String,
    pub content: String,
    pub is_bot: bool,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn chat(channel: impl Into<String>, author: impl Into<String>, content: impl Into<String>) -> Self {
        Self::at(channel, author, content, false, Utc::now())
    }

    pub fn bot(channel: impl Into<String>, author: impl Into<String>, content: impl Into<String>) -> Self {
        Self::at(channel, author, content, true, Utc::now())
    }

    pub fn at(
        channel: impl Into<String>,
        author: impl Into<String>,
        content: impl Into<String>,
        is_bot: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
            author: author.into(),
            content: content.into(),
            is_bot,
            timestamp,
        }
    }
}

/// Discrete relationship level derived from interaction counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipLevel {
    Stranger,
    Acquaintance,
    Friend,
    Favorite,
    Toxic,
}

impl RelationshipLevel {
    pub fn from_counts(positive: i64, negative: i64) -> Self {
        if negative >= 3 && negative > positive {
            Self::Toxic
        } else if positive >= 40 {
            Self::Favorite
        } else if positive >= 15 {
            Self::Friend
        } else if positive >= 3 {
            Self::Acquaintance
        } else {
            Self::Stranger
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stranger => "stranger",
            Self::Acquaintance => "acquaintance",
            Self::Friend => "friend",
            Self::Favorite => "favorite",
            Self::Toxic => "toxic",
        }
    }
}

/// Per (channel, user) interaction counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub positive: i64,
    pub negative: i64,
}

impl Relationship {
    pub fn level(&self) -> RelationshipLevel {
        RelationshipLevel::from_counts(self.positive, self.negative)
    }

    pub fn record(&mut self, positive: bool) {
        if positive {
            self.positive += 1;
        } else {
            self.negative += 1;
        }
    }
}

/// Which gate rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecisionReason {
    SelfAuthored,
    Command,
    Away,
    AwayIgnoredMention,
    Mentioned,
    Cooldown,
    TooFewMessages,
    MaxCooldownElapsed,
    Chance,
}

/// Outcome of the eligibility gate. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EligibilityDecision {
    pub accept: bool,
    pub reason: DecisionReason,
    /// Acceptance probability used by the chance rule; 1.0/0.0 for deterministic rules.
    pub probability: f64,
}

impl EligibilityDecision {
    pub fn accept(reason: DecisionReason) -> Self {
        Self { accept: true, reason, probability: 1.0 }
    }

    pub fn decline(reason: DecisionReason) -> Self {
        Self { accept: false, reason, probability: 0.0 }
    }
}

/// Whether a reply answers a direct mention or is an ambient remark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Mention,
    Ambient,
}

/// Follow-up line fixing an injected typo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub text: String,
    pub delay: Duration,
}

/// Text ready to send plus what the humanizer added to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Humanized {
    pub text: String,
    pub correction: Option<Correction>,
    pub emote: Option<String>,
    pub interjection: Option<String>,
}

/// Why a candidate was suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("nothing left after cleanup")]
    Empty,
    #[error("too similar to a recent response")]
    Repetitive,
    #[error("contains a filtered word")]
    Forbidden,
    #[error("single word longer than the length limit")]
    Unbreakable,
}

pub type HumanizationResult = Result<Humanized, Rejection>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp_scalar(-5.0), MIN);
        assert_eq!(clamp_scalar(250.0), MAX);
        assert_eq!(clamp_scalar(f64::NAN), MIN);
        assert_eq!(clamp_scalar(42.0), 42.0);
    }

    #[test]
    fn relationship_thresholds() {
        assert_eq!(RelationshipLevel::from_counts(0, 0), RelationshipLevel::Stranger);
        assert_eq!(RelationshipLevel::from_counts(3, 0), RelationshipLevel::Acquaintance);
        assert_eq!(RelationshipLevel::from_counts(15, 2), RelationshipLevel::Friend);
        assert_eq!(RelationshipLevel::from_counts(40, 5), RelationshipLevel::Favorite);
        assert_eq!(RelationshipLevel::from_counts(2, 3), RelationshipLevel::Toxic);
        // more good than bad is never toxic
        assert_eq!(RelationshipLevel::from_counts(20, 10), RelationshipLevel::Friend);
    }

    #[test]
    fn relationship_record() {
        let mut r = Relationship::default();
        for _ in 0..3 {
            r.record(true);
        }
        r.record(false);
        assert_eq!(r.level(), RelationshipLevel::Acquaintance);
        assert_eq!(r.negative, 1);
    }
}
