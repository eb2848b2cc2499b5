use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;

/// All lurker tunables. Loaded from the `lurker_config` table at startup when
/// a database is configured; first boot writes defaults, later boots read the
/// stored values. Without a database the defaults are used as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LurkerCfg {
    // channel state
    pub history_cap: usize,
    pub recent_responses_cap: usize,
    pub emote_cooldown_cap: usize,

    // mood
    pub mood_neutral: f64,
    pub mood_positive_delta: f64,
    pub mood_negative_delta: f64,
    pub reaction_delta: f64,
    pub reaction_window_secs: i64,
    pub inertia_rising: f64,
    pub inertia_falling: f64,

    // energy
    pub energy_night: f64,
    pub energy_morning: f64,
    pub energy_day: f64,
    pub energy_evening: f64,
    pub energy_late: f64,
    pub fatigue_reset_secs: i64,
    pub recovery_per_min: f64,
    pub recovery_cap: f64,

    // relevance
    pub mention_topic_window: usize,
    pub mention_window: usize,
    pub relevance_scan: usize,

    // eligibility
    pub min_cooldown_secs: i64,
    pub max_cooldown_secs: i64,
    pub min_messages_between: u32,
    pub high_activity_per_min: usize,
    pub activity_fatigue_mult: f64,
    pub base_probability: f64,
    pub bonus_stranger: f64,
    pub bonus_acquaintance: f64,
    pub bonus_friend: f64,
    pub bonus_favorite: f64,
    pub bonus_toxic: f64,
    pub low_energy: f64,
    pub high_energy: f64,
    pub low_energy_mult: f64,
    pub high_energy_mult: f64,
    pub away_ignore_chance: f64,

    // humanizer
    pub mention_max_len: usize,
    pub ambient_max_len: usize,
    pub repetition_threshold: f64,
    pub interjection_chance: f64,
    pub interjection_min_len: usize,
    pub typo_base_chance: f64,
    pub typo_word_swap_chance: f64,
    pub correction_chance: f64,
    pub correction_min_delay_ms: u64,
    pub correction_max_delay_ms: u64,
    pub emote_chance: f64,

    // generation
    pub max_tokens: u32,
    pub temperature: f32,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub serialize_generation: bool,
    pub prompt_emote_count: usize,

    // background tasks
    pub affect_refresh_secs: u64,
    pub trend_refresh_secs: u64,
    pub trend_top_n: usize,
    pub trend_scan: i64,
    pub silence_check_secs: u64,
    pub silence_threshold_secs: i64,
    pub silence_cooldown_secs: i64,
    pub away_check_secs: u64,
    pub afk_energy: f64,
    pub afk_chance: f64,
    pub busy_chance: f64,
    pub afk_min_mins: i64,
    pub afk_max_mins: i64,
    pub busy_min_mins: i64,
    pub busy_max_mins: i64,
    pub catalog_refresh_secs: u64,
    pub popular_seed_count: usize,

    // transport
    pub transport_max_len: usize,
    pub chunk_delay_ms: u64,
    pub layout_repair: bool,

    // facts
    pub facts_per_user: usize,
    pub facts_in_prompt: usize,

    // lexicons
    pub positive_indicators: Vec<String>,
    pub negative_indicators: Vec<String>,
    pub topic_change_keywords: Vec<String>,
    pub forbidden_words: Vec<String>,
    pub interjections: Vec<String>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| (*w).to_owned()).collect()
}

impl Default for LurkerCfg {
    fn default() -> Self {
        Self {
            history_cap: 50,
            recent_responses_cap: 5,
            emote_cooldown_cap: 8,
            mood_neutral: 50.0,
            mood_positive_delta: 8.0,
            mood_negative_delta: 10.0,
            reaction_delta: 6.0,
            reaction_window_secs: 120,
            inertia_rising: 0.6,
            inertia_falling: 0.4,
            energy_night: 30.0,
            energy_morning: 55.0,
            energy_day: 75.0,
            energy_evening: 90.0,
            energy_late: 60.0,
            fatigue_reset_secs: 1800,
            recovery_per_min: 0.5,
            recovery_cap: 20.0,
            mention_topic_window: 2,
            mention_window: 6,
            relevance_scan: 6,
            min_cooldown_secs: 60,
            max_cooldown_secs: 900,
            min_messages_between: 3,
            high_activity_per_min: 12,
            activity_fatigue_mult: 2.0,
            base_probability: 0.15,
            bonus_stranger: 0.0,
            bonus_acquaintance: 0.05,
            bonus_friend: 0.12,
            bonus_favorite: 0.25,
            bonus_toxic: -0.20,
            low_energy: 30.0,
            high_energy: 70.0,
            low_energy_mult: 0.5,
            high_energy_mult: 1.3,
            away_ignore_chance: 0.25,
            mention_max_len: 300,
            ambient_max_len: 160,
            repetition_threshold: 0.6,
            interjection_chance: 0.12,
            interjection_min_len: 12,
            typo_base_chance: 0.08,
            typo_word_swap_chance: 0.5,
            correction_chance: 0.35,
            correction_min_delay_ms: 2000,
            correction_max_delay_ms: 5000,
            emote_chance: 0.3,
            max_tokens: 200,
            temperature: 0.9,
            retry_max_attempts: 3,
            retry_base_delay_ms: 2000,
            serialize_generation: true,
            prompt_emote_count: 15,
            affect_refresh_secs: 60,
            trend_refresh_secs: 1800,
            trend_top_n: 8,
            trend_scan: 500,
            silence_check_secs: 30,
            silence_threshold_secs: 400,
            silence_cooldown_secs: 1200,
            away_check_secs: 60,
            afk_energy: 25.0,
            afk_chance: 0.05,
            busy_chance: 0.01,
            afk_min_mins: 10,
            afk_max_mins: 30,
            busy_min_mins: 3,
            busy_max_mins: 8,
            catalog_refresh_secs: 21600,
            popular_seed_count: 20,
            transport_max_len: 450,
            chunk_delay_ms: 1500,
            layout_repair: false,
            facts_per_user: 10,
            facts_in_prompt: 3,
            positive_indicators: words(&[
                "lol", "haha", "love", "nice", "cool", "thanks", "thank you", "pog", "kekw",
                "хаха", "спасибо", "круто", "люблю", "класс", "лол",
            ]),
            negative_indicators: words(&[
                "hate", "stupid", "boring", "shut up", "trash", "cringe", "annoying",
                "скучно", "ненавижу", "отстой", "заткнись", "тупая",
            ]),
            topic_change_keywords: words(&[
                "btw", "by the way", "anyway", "question", "tell me", "what do you think",
                "кстати", "а вот", "слушай", "вопрос", "тема", "другое", "забыл сказать",
                "расскажи", "что думаешь",
            ]),
            forbidden_words: Vec::new(),
            interjections: words(&["hmm", "well,", "oh", "ngl", "honestly", "ну", "хм", "короче"]),
        }
    }
}

impl LurkerCfg {
    /// Load config from `lurker_config`. If the table is empty, seed it with defaults.
    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM lurker_config")
                .fetch_all(pool)
                .await?;

        if rows.is_empty() {
            let cfg = Self::default();
            cfg.seed(pool).await?;
            return Ok(cfg);
        }

        let map: HashMap<String, String> = rows.into_iter().collect();
        Ok(Self::from_map(&map))
    }

    /// Write all default values into `lurker_config`.
    async fn seed(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        for (key, value, desc) in &self.to_entries() {
            sqlx::query(
                "INSERT INTO lurker_config (key, value, description) VALUES ($1, $2, $3) \
                 ON CONFLICT (key) DO NOTHING",
            )
            .bind(key)
            .bind(value)
            .bind(desc)
            .execute(pool)
            .await?;
        }
        Ok(())
    }

    pub fn from_map(m: &HashMap<String, String>) -> Self {
        let d = Self::default();
        Self {
            history_cap: get_or(m, "history_cap", d.history_cap),
            recent_responses_cap: get_or(m, "recent_responses_cap", d.recent_responses_cap),
            emote_cooldown_cap: get_or(m, "emote_cooldown_cap", d.emote_cooldown_cap),
            mood_neutral: get_or(m, "mood_neutral", d.mood_neutral),
            mood_positive_delta: get_or(m, "mood_positive_delta", d.mood_positive_delta),
            mood_negative_delta: get_or(m, "mood_negative_delta", d.mood_negative_delta),
            reaction_delta: get_or(m, "reaction_delta", d.reaction_delta),
            reaction_window_secs: get_or(m, "reaction_window_secs", d.reaction_window_secs),
            inertia_rising: get_or(m, "inertia_rising", d.inertia_rising),
            inertia_falling: get_or(m, "inertia_falling", d.inertia_falling),
            energy_night: get_or(m, "energy_night", d.energy_night),
            energy_morning: get_or(m, "energy_morning", d.energy_morning),
            energy_day: get_or(m, "energy_day", d.energy_day),
            energy_evening: get_or(m, "energy_evening", d.energy_evening),
            energy_late: get_or(m, "energy_late", d.energy_late),
            fatigue_reset_secs: get_or(m, "fatigue_reset_secs", d.fatigue_reset_secs),
            recovery_per_min: get_or(m, "recovery_per_min", d.recovery_per_min),
            recovery_cap: get_or(m, "recovery_cap", d.recovery_cap),
            mention_topic_window: get_or(m, "mention_topic_window", d.mention_topic_window),
            mention_window: get_or(m, "mention_window", d.mention_window),
            relevance_scan: get_or(m, "relevance_scan", d.relevance_scan),
            min_cooldown_secs: get_or(m, "min_cooldown_secs", d.min_cooldown_secs),
            max_cooldown_secs: get_or(m, "max_cooldown_secs", d.max_cooldown_secs),
            min_messages_between: get_or(m, "min_messages_between", d.min_messages_between),
            high_activity_per_min: get_or(m, "high_activity_per_min", d.high_activity_per_min),
            activity_fatigue_mult: get_or(m, "activity_fatigue_mult", d.activity_fatigue_mult),
            base_probability: get_or(m, "base_probability", d.base_probability),
            bonus_stranger: get_or(m, "bonus_stranger", d.bonus_stranger),
            bonus_acquaintance: get_or(m, "bonus_acquaintance", d.bonus_acquaintance),
            bonus_friend: get_or(m, "bonus_friend", d.bonus_friend),
            bonus_favorite: get_or(m, "bonus_favorite", d.bonus_favorite),
            bonus_toxic: get_or(m, "bonus_toxic", d.bonus_toxic),
            low_energy: get_or(m, "low_energy", d.low_energy),
            high_energy: get_or(m, "high_energy", d.high_energy),
            low_energy_mult: get_or(m, "low_energy_mult", d.low_energy_mult),
            high_energy_mult: get_or(m, "high_energy_mult", d.high_energy_mult),
            away_ignore_chance: get_or(m, "away_ignore_chance", d.away_ignore_chance),
            mention_max_len: get_or(m, "mention_max_len", d.mention_max_len),
            ambient_max_len: get_or(m, "ambient_max_len", d.ambient_max_len),
            repetition_threshold: get_or(m, "repetition_threshold", d.repetition_threshold),
            interjection_chance: get_or(m, "interjection_chance", d.interjection_chance),
            interjection_min_len: get_or(m, "interjection_min_len", d.interjection_min_len),
            typo_base_chance: get_or(m, "typo_base_chance", d.typo_base_chance),
            typo_word_swap_chance: get_or(m, "typo_word_swap_chance", d.typo_word_swap_chance),
            correction_chance: get_or(m, "correction_chance", d.correction_chance),
            correction_min_delay_ms: get_or(m, "correction_min_delay_ms", d.correction_min_delay_ms),
            correction_max_delay_ms: get_or(m, "correction_max_delay_ms", d.correction_max_delay_ms),
            emote_chance: get_or(m, "emote_chance", d.emote_chance),
            max_tokens: get_or(m, "max_tokens", d.max_tokens),
            temperature: get_or(m, "temperature", d.temperature),
            retry_max_attempts: get_or(m, "retry_max_attempts", d.retry_max_attempts),
            retry_base_delay_ms: get_or(m, "retry_base_delay_ms", d.retry_base_delay_ms),
            serialize_generation: get_or(m, "serialize_generation", d.serialize_generation),
            prompt_emote_count: get_or(m, "prompt_emote_count", d.prompt_emote_count),
            affect_refresh_secs: get_or(m, "affect_refresh_secs", d.affect_refresh_secs),
            trend_refresh_secs: get_or(m, "trend_refresh_secs", d.trend_refresh_secs),
            trend_top_n: get_or(m, "trend_top_n", d.trend_top_n),
            trend_scan: get_or(m, "trend_scan", d.trend_scan),
            silence_check_secs: get_or(m, "silence_check_secs", d.silence_check_secs),
            silence_threshold_secs: get_or(m, "silence_threshold_secs", d.silence_threshold_secs),
            silence_cooldown_secs: get_or(m, "silence_cooldown_secs", d.silence_cooldown_secs),
            away_check_secs: get_or(m, "away_check_secs", d.away_check_secs),
            afk_energy: get_or(m, "afk_energy", d.afk_energy),
            afk_chance: get_or(m, "afk_chance", d.afk_chance),
            busy_chance: get_or(m, "busy_chance", d.busy_chance),
            afk_min_mins: get_or(m, "afk_min_mins", d.afk_min_mins),
            afk_max_mins: get_or(m, "afk_max_mins", d.afk_max_mins),
            busy_min_mins: get_or(m, "busy_min_mins", d.busy_min_mins),
            busy_max_mins: get_or(m, "busy_max_mins", d.busy_max_mins),
            catalog_refresh_secs: get_or(m, "catalog_refresh_secs", d.catalog_refresh_secs),
            popular_seed_count: get_or(m, "popular_seed_count", d.popular_seed_count),
            transport_max_len: get_or(m, "transport_max_len", d.transport_max_len),
            chunk_delay_ms: get_or(m, "chunk_delay_ms", d.chunk_delay_ms),
            layout_repair: get_or(m, "layout_repair", d.layout_repair),
            facts_per_user: get_or(m, "facts_per_user", d.facts_per_user),
            facts_in_prompt: get_or(m, "facts_in_prompt", d.facts_in_prompt),
            positive_indicators: get_list_or(m, "positive_indicators", d.positive_indicators),
            negative_indicators: get_list_or(m, "negative_indicators", d.negative_indicators),
            topic_change_keywords: get_list_or(m, "topic_change_keywords", d.topic_change_keywords),
            forbidden_words: get_list_or(m, "forbidden_words", d.forbidden_words),
            interjections: get_list_or(m, "interjections", d.interjections),
        }
    }

    fn to_entries(&self) -> Vec<(&str, String, &str)> {
        vec![
            ("history_cap", self.history_cap.to_string(), "Per-channel message history capacity"),
            ("recent_responses_cap", self.recent_responses_cap.to_string(), "Responses kept for repetition checks"),
            ("emote_cooldown_cap", self.emote_cooldown_cap.to_string(), "Emote cooldown ring capacity"),
            ("mood_neutral", self.mood_neutral.to_string(), "Mood resting point"),
            ("mood_positive_delta", self.mood_positive_delta.to_string(), "Mood delta per positive indicator"),
            ("mood_negative_delta", self.mood_negative_delta.to_string(), "Mood delta per negative indicator"),
            ("reaction_delta", self.reaction_delta.to_string(), "Mood delta for chat reactions"),
            ("reaction_window_secs", self.reaction_window_secs.to_string(), "Window for counting reactions"),
            ("inertia_rising", self.inertia_rising.to_string(), "Mood inertia when moving up"),
            ("inertia_falling", self.inertia_falling.to_string(), "Mood inertia when moving down"),
            ("energy_night", self.energy_night.to_string(), "Energy baseline 00-06"),
            ("energy_morning", self.energy_morning.to_string(), "Energy baseline 07-09"),
            ("energy_day", self.energy_day.to_string(), "Energy baseline 10-17"),
            ("energy_evening", self.energy_evening.to_string(), "Energy baseline 18-22"),
            ("energy_late", self.energy_late.to_string(), "Energy baseline 23"),
            ("fatigue_reset_secs", self.fatigue_reset_secs.to_string(), "Idle seconds that reset fatigue"),
            ("recovery_per_min", self.recovery_per_min.to_string(), "Energy recovered per idle minute"),
            ("recovery_cap", self.recovery_cap.to_string(), "Maximum idle recovery"),
            ("mention_topic_window", self.mention_topic_window.to_string(), "Context size on mention with topic change"),
            ("mention_window", self.mention_window.to_string(), "Context size on mention"),
            ("relevance_scan", self.relevance_scan.to_string(), "History scanned for word overlap"),
            ("min_cooldown_secs", self.min_cooldown_secs.to_string(), "Minimum seconds between responses"),
            ("max_cooldown_secs", self.max_cooldown_secs.to_string(), "Seconds after which a response is forced"),
            ("min_messages_between", self.min_messages_between.to_string(), "Chat messages required between responses"),
            ("high_activity_per_min", self.high_activity_per_min.to_string(), "Messages per minute counted as busy chat"),
            ("activity_fatigue_mult", self.activity_fatigue_mult.to_string(), "Cooldown multiplier in busy chat"),
            ("base_probability", self.base_probability.to_string(), "Base ambient response probability"),
            ("bonus_stranger", self.bonus_stranger.to_string(), "Probability bonus for strangers"),
            ("bonus_acquaintance", self.bonus_acquaintance.to_string(), "Probability bonus for acquaintances"),
            ("bonus_friend", self.bonus_friend.to_string(), "Probability bonus for friends"),
            ("bonus_favorite", self.bonus_favorite.to_string(), "Probability bonus for favorites"),
            ("bonus_toxic", self.bonus_toxic.to_string(), "Probability bonus for toxic users"),
            ("low_energy", self.low_energy.to_string(), "Energy below which responses thin out"),
            ("high_energy", self.high_energy.to_string(), "Energy above which responses pick up"),
            ("low_energy_mult", self.low_energy_mult.to_string(), "Probability multiplier at low energy"),
            ("high_energy_mult", self.high_energy_mult.to_string(), "Probability multiplier at high energy"),
            ("away_ignore_chance", self.away_ignore_chance.to_string(), "Chance to ignore a mention while away"),
            ("mention_max_len", self.mention_max_len.to_string(), "Max reply length when mentioned"),
            ("ambient_max_len", self.ambient_max_len.to_string(), "Max reply length otherwise"),
            ("repetition_threshold", self.repetition_threshold.to_string(), "Word overlap that counts as repetition"),
            ("interjection_chance", self.interjection_chance.to_string(), "Chance to prefix an interjection"),
            ("interjection_min_len", self.interjection_min_len.to_string(), "Minimum text length for interjections"),
            ("typo_base_chance", self.typo_base_chance.to_string(), "Base typo chance at neutral mood"),
            ("typo_word_swap_chance", self.typo_word_swap_chance.to_string(), "Chance a typo uses the word table"),
            ("correction_chance", self.correction_chance.to_string(), "Chance to correct a typo"),
            ("correction_min_delay_ms", self.correction_min_delay_ms.to_string(), "Minimum correction delay ms"),
            ("correction_max_delay_ms", self.correction_max_delay_ms.to_string(), "Maximum correction delay ms"),
            ("emote_chance", self.emote_chance.to_string(), "Chance to append an emote"),
            ("max_tokens", self.max_tokens.to_string(), "Generation token limit"),
            ("temperature", self.temperature.to_string(), "Generation temperature"),
            ("retry_max_attempts", self.retry_max_attempts.to_string(), "Attempts on quota errors"),
            ("retry_base_delay_ms", self.retry_base_delay_ms.to_string(), "Base backoff on quota errors"),
            ("serialize_generation", self.serialize_generation.to_string(), "Serialize generation calls globally"),
            ("prompt_emote_count", self.prompt_emote_count.to_string(), "Emotes listed in the prompt"),
            ("affect_refresh_secs", self.affect_refresh_secs.to_string(), "Mood/energy refresh interval"),
            ("trend_refresh_secs", self.trend_refresh_secs.to_string(), "Popular emote refresh interval"),
            ("trend_top_n", self.trend_top_n.to_string(), "Popular emotes kept"),
            ("trend_scan", self.trend_scan.to_string(), "Messages scanned for trends"),
            ("silence_check_secs", self.silence_check_secs.to_string(), "Silence check interval"),
            ("silence_threshold_secs", self.silence_threshold_secs.to_string(), "Chat silence before speaking up"),
            ("silence_cooldown_secs", self.silence_cooldown_secs.to_string(), "Minimum gap between silence breaks"),
            ("away_check_secs", self.away_check_secs.to_string(), "AFK/busy check interval"),
            ("afk_energy", self.afk_energy.to_string(), "Energy below which AFK can start"),
            ("afk_chance", self.afk_chance.to_string(), "Chance per check to go AFK"),
            ("busy_chance", self.busy_chance.to_string(), "Chance per check to become busy"),
            ("afk_min_mins", self.afk_min_mins.to_string(), "Shortest AFK minutes"),
            ("afk_max_mins", self.afk_max_mins.to_string(), "Longest AFK minutes"),
            ("busy_min_mins", self.busy_min_mins.to_string(), "Shortest busy minutes"),
            ("busy_max_mins", self.busy_max_mins.to_string(), "Longest busy minutes"),
            ("catalog_refresh_secs", self.catalog_refresh_secs.to_string(), "Emote catalog refresh interval"),
            ("popular_seed_count", self.popular_seed_count.to_string(), "Popular emotes seeded from catalog"),
            ("transport_max_len", self.transport_max_len.to_string(), "Hard transport line limit"),
            ("chunk_delay_ms", self.chunk_delay_ms.to_string(), "Delay between outbound chunks ms"),
            ("layout_repair", self.layout_repair.to_string(), "Repair wrong keyboard layout input"),
            ("facts_per_user", self.facts_per_user.to_string(), "Facts kept per user"),
            ("facts_in_prompt", self.facts_in_prompt.to_string(), "Facts shown in the prompt"),
            ("positive_indicators", list_value(&self.positive_indicators), "Positive mood indicators"),
            ("negative_indicators", list_value(&self.negative_indicators), "Negative mood indicators"),
            ("topic_change_keywords", list_value(&self.topic_change_keywords), "Topic change keywords"),
            ("forbidden_words", list_value(&self.forbidden_words), "Filtered words"),
            ("interjections", list_value(&self.interjections), "Interjection markers"),
        ]
    }
}

/// Who the bot is. Read from the environment, never from the config table.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    /// Chat handle; used for mention detection and self-message filtering.
    pub nick: String,
    /// Display name used in the persona prompt.
    pub persona_name: String,
    pub channels: Vec<String>,
}

impl BotIdentity {
    /// Reads `LURKER_NICK`, `LURKER_PERSONA_NAME` and `LURKER_CHANNELS` (comma separated).
    pub fn from_env() -> Self {
        let nick = std::env::var("LURKER_NICK").unwrap_or_else(|_| "lurker".to_owned());
        let persona_name = std::env::var("LURKER_PERSONA_NAME").unwrap_or_else(|_| nick.clone());
        let channels = std::env::var("LURKER_CHANNELS")
            .map(|v| split_list(&v))
            .unwrap_or_default();
        Self { nick, persona_name, channels }
    }
}

fn get_or<T: std::str::FromStr>(map: &HashMap<String, String>, key: &str, default: T) -> T {
    map.get(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Lists are stored as JSON arrays so entries may contain commas. A plain
/// comma-separated value (hand-edited row) is still accepted.
fn get_list_or(map: &HashMap<String, String>, key: &str, default: Vec<String>) -> Vec<String> {
    match map.get(key) {
        Some(raw) if raw.trim_start().starts_with('[') => match serde_json::from_str::<Vec<String>>(raw) {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!(key, error = %e, "malformed list tunable, using default");
                default
            }
        },
        Some(raw) => split_list(raw),
        None => default,
    }
}

fn list_value(list: &[String]) -> String {
    serde_json::Value::from(list.to_vec()).to_string()
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_map_yields_defaults() {
        let cfg = LurkerCfg::from_map(&HashMap::new());
        let d = LurkerCfg::default();
        assert_eq!(cfg.min_cooldown_secs, d.min_cooldown_secs);
        assert_eq!(cfg.topic_change_keywords, d.topic_change_keywords);
    }

    #[test]
    fn stored_values_override_defaults() {
        let mut m = HashMap::new();
        m.insert("min_cooldown_secs".to_owned(), "90".to_owned());
        m.insert("serialize_generation".to_owned(), "false".to_owned());
        m.insert("forbidden_words".to_owned(), "foo, bar ,,baz".to_owned());
        let cfg = LurkerCfg::from_map(&m);
        assert_eq!(cfg.min_cooldown_secs, 90);
        assert!(!cfg.serialize_generation);
        assert_eq!(cfg.forbidden_words, vec!["foo", "bar", "baz"]);
    }

    #[test]
    fn list_entries_may_contain_commas() {
        let cfg = LurkerCfg {
            interjections: vec!["well,".into(), "so, like".into()],
            ..LurkerCfg::default()
        };
        let map: HashMap<String, String> = cfg
            .to_entries()
            .into_iter()
            .map(|(k, v, _)| (k.to_owned(), v))
            .collect();
        assert_eq!(map["interjections"], r#"["well,","so, like"]"#);
        assert_eq!(LurkerCfg::from_map(&map).interjections, vec!["well,", "so, like"]);
    }

    #[test]
    fn malformed_list_falls_back_to_default() {
        let mut m = HashMap::new();
        m.insert("interjections".to_owned(), "[\"oops".to_owned());
        assert_eq!(LurkerCfg::from_map(&m).interjections, LurkerCfg::default().interjections);
    }

    #[test]
    fn unparsable_value_falls_back() {
        let mut m = HashMap::new();
        m.insert("emote_chance".to_owned(), "lots".to_owned());
        let cfg = LurkerCfg::from_map(&m);
        assert!((cfg.emote_chance - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn entries_roundtrip_through_map() {
        let d = LurkerCfg::default();
        let map: HashMap<String, String> = d
            .to_entries()
            .into_iter()
            .map(|(k, v, _)| (k.to_owned(), v))
            .collect();
        let cfg = LurkerCfg::from_map(&map);
        assert_eq!(cfg.interjections, d.interjections);
        assert!(cfg.interjections.iter().any(|i| i.ends_with(',')));
        assert_eq!(cfg.mention_max_len, d.mention_max_len);
        assert!((cfg.inertia_rising - d.inertia_rising).abs() < f64::EPSILON);
    }
}
