use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::services::Services;
use crate::affect::{self, mood};
use crate::cognition::response::{self, AuthorContext, SILENCE_MARKER, SILENCE_TASKS};
use crate::emotes::trends;
use crate::humanize::Humanizer;
use crate::io::{InboundLine, chunker};
use crate::memory::facts;
use crate::sensory::{filter, gating, layout, relevance};
use crate::state::ChannelHandle;
use crate::types::{Correction, Humanized, Message, ReplyKind, seconds_since};

/// How far back chat history is reloaded when a worker starts.
const WARM_HISTORY_SECS: i64 = 3600;

/// Single writer for one channel: runs the message pipeline and the
/// channel's periodic tasks.
pub struct ChannelWorker {
    services: Arc<Services>,
    channel: String,
    state: ChannelHandle,
    cancel: CancellationToken,
}

fn every(secs: u64) -> Interval {
    let period = Duration::from_secs(secs.max(1));
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

impl ChannelWorker {
    pub fn new(services: Arc<Services>, channel: impl Into<String>, cancel: CancellationToken) -> Self {
        let channel = channel.into();
        let state = services.store.get(&channel);
        Self { services, channel, state, cancel }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn state(&self) -> ChannelHandle {
        Arc::clone(&self.state)
    }

    /// Drive the worker until cancelled or the inbound queue closes.
    pub async fn run(self, mut inbound: mpsc::Receiver<InboundLine>) {
        self.start(Utc::now()).await;

        let cfg = Arc::clone(&self.services.cfg);
        let mut affect_tick = every(cfg.affect_refresh_secs);
        let mut trend_tick = every(cfg.trend_refresh_secs);
        let mut silence_tick = every(cfg.silence_check_secs);
        let mut away_tick = every(cfg.away_check_secs);
        let mut catalog_tick = every(cfg.catalog_refresh_secs);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(channel = %self.channel, "channel worker shutting down");
                    break;
                }
                line = inbound.recv() => {
                    let Some(line) = line else {
                        tracing::debug!(channel = %self.channel, "inbound queue closed");
                        break;
                    };
                    self.handle(line).await;
                }
                _ = affect_tick.tick() => self.refresh_affect(Utc::now()).await,
                _ = trend_tick.tick() => self.refresh_trends().await,
                _ = silence_tick.tick() => {
                    self.break_silence(Utc::now()).await;
                }
                _ = away_tick.tick() => self.away_cycle(Utc::now()).await,
                _ = catalog_tick.tick() => self.refresh_catalog().await,
            }
        }
    }

    /// Warm state from persistence and load the emote catalog.
    pub async fn start(&self, now: DateTime<Utc>) {
        let svc = &*self.services;

        match svc.persistence.relationships(&self.channel).await {
            Ok(rels) => {
                let count = rels.len();
                self.state.lock().await.relationships.extend(rels);
                tracing::debug!(channel = %self.channel, count, "relationships loaded");
            }
            Err(e) => tracing::warn!(channel = %self.channel, error = %e, "failed to load relationships"),
        }

        let since = now - chrono::Duration::seconds(WARM_HISTORY_SECS);
        match svc.persistence.messages_after(&self.channel, since).await {
            Ok(recent) => {
                let mut st = self.state.lock().await;
                for msg in recent {
                    st.history.push(msg);
                }
            }
            Err(e) => tracing::warn!(channel = %self.channel, error = %e, "failed to load recent history"),
        }

        {
            let mut st = self.state.lock().await;
            // a fresh worker counts as "chat just spoke", not as long silence
            if st.last_message_at.is_none() {
                st.last_message_at = Some(now);
            }
        }

        self.refresh_catalog().await;
        self.refresh_trends().await;
        tracing::info!(channel = %self.channel, "channel worker started");
    }

    /// Run one inbound line through the pipeline. Returns the text sent, if any.
    pub async fn handle(&self, line: InboundLine) -> Option<String> {
        let span = tracing::info_span!("message", channel = %self.channel, author = %line.author);
        self.process(line).instrument(span).await
    }

    async fn process(&self, line: InboundLine) -> Option<String> {
        let svc = &*self.services;
        let cfg = &*svc.cfg;
        let nick = svc.identity.nick.as_str();
        let now = line.timestamp;
        let from_self = line.author.eq_ignore_ascii_case(nick);

        let text = if cfg.layout_repair && !from_self {
            let known = self.state.lock().await.known_emotes.clone();
            layout::repair(&line.text, &known)
        } else {
            line.text.clone()
        };

        if !from_self && filter::is_forbidden(&text, cfg) {
            tracing::warn!("forbidden message dropped");
            return None;
        }

        let msg = Message::at(
            self.channel.as_str(),
            line.author.as_str(),
            filter::scrub_urls(&text),
            from_self,
            now,
        );
        if let Err(e) = svc.persistence.append_message(&msg).await {
            tracing::warn!(error = %e, "failed to persist message");
        }
        svc.store.record_inbound(&self.channel, msg.clone()).await;

        if !from_self {
            self.remember_facts(&line.author, &text).await;
        }

        if let Some(reply) = filter::command_reply(&line.author, &text) {
            return match svc.transport.send(&self.channel, &reply).await {
                Ok(()) => Some(reply),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to answer command");
                    None
                }
            };
        }

        let decision = {
            let mut st = self.state.lock().await;
            if !from_self {
                affect::on_inbound(&mut st, &text, now, cfg);
            }
            if st.clear_expired_away(now) {
                tracing::info!("away period over");
            }
            let mut entropy = svc.entropy();
            gating::decide(&st, &line.author, &text, nick, now, cfg, &mut **entropy)
        };
        tracing::debug!(
            accept = decision.accept,
            reason = ?decision.reason,
            probability = decision.probability,
            "eligibility decided"
        );
        if !decision.accept {
            return None;
        }

        let Some(requester) = svc.requester.as_ref() else {
            tracing::debug!("no generator configured, staying quiet");
            return None;
        };

        let kind = if relevance::mentions_handle(&text, nick) {
            ReplyKind::Mention
        } else {
            ReplyKind::Ambient
        };

        let known_facts = match svc
            .persistence
            .facts(&self.channel, &line.author, cfg.facts_in_prompt as i64)
            .await
        {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load user facts");
                Vec::new()
            }
        };

        let permit = svc.generation_permit().await;
        let messages = {
            let st = self.state.lock().await;
            let prior: Vec<Message> = st.history.iter().filter(|m| m.id != msg.id).cloned().collect();
            let context = relevance::select(&msg.content, nick, &prior, cfg);
            tracing::debug!(context = context.len(), "relevant context selected");
            let author = AuthorContext {
                name: line.author.clone(),
                level: Some(st.relationship(&line.author).level()),
                facts: known_facts,
            };
            let system = response::build_system_prompt(
                &svc.identity.persona_name,
                &st,
                Some(&author),
                None,
                cfg,
            );
            response::build_messages(system, &context, &format!("{}: {}", line.author, msg.content))
        };
        let raw = requester.request(messages).await?;
        let humanized = self.humanize(&raw, kind).await;
        drop(permit);

        let positive = !mood::is_hostile(&text, cfg);
        self.deliver(humanized?, Some((line.author.as_str(), positive))).await
    }

    async fn remember_facts(&self, author: &str, text: &str) {
        let svc = &*self.services;
        for fact in facts::extract(text) {
            tracing::debug!(fact = %fact, "fact noted");
            if let Err(e) = svc
                .persistence
                .add_fact(&self.channel, author, &fact, svc.cfg.facts_per_user)
                .await
            {
                tracing::warn!(error = %e, "failed to store fact");
            }
        }
    }

    async fn humanize(&self, raw: &str, kind: ReplyKind) -> Option<Humanized> {
        let svc = &*self.services;
        let humanizer = Humanizer::new(&svc.cfg, &svc.identity.nick, &svc.identity.persona_name);
        let result = {
            let mut st = self.state.lock().await;
            let mut entropy = svc.entropy();
            humanizer.humanize(raw, kind, &mut st, &mut **entropy)
        };
        match result {
            Ok(h) => Some(h),
            Err(reason) => {
                tracing::info!(channel = %self.channel, reason = %reason, "candidate suppressed");
                None
            }
        }
    }

    /// Send a humanized line and do the post-send bookkeeping.
    async fn deliver(&self, h: Humanized, author: Option<(&str, bool)>) -> Option<String> {
        let svc = &*self.services;
        let cfg = &*svc.cfg;

        if let Err(e) = chunker::deliver(
            svc.transport.as_ref(),
            &self.channel,
            &h.text,
            cfg.transport_max_len,
            Duration::from_millis(cfg.chunk_delay_ms),
        )
        .await
        {
            tracing::warn!(channel = %self.channel, error = %e, "send failed");
            return None;
        }

        let emotes: Vec<String> = h.emote.iter().cloned().collect();
        let sent = svc.store.record_outbound(&self.channel, &h.text, &emotes).await;
        affect::on_sent(&mut *self.state.lock().await, sent.timestamp, cfg);

        let stored = Message { content: filter::scrub_urls(&sent.content), ..sent };
        if let Err(e) = svc.persistence.append_message(&stored).await {
            tracing::warn!(error = %e, "failed to persist reply");
        }
        for emote in &emotes {
            if let Err(e) = svc.persistence.record_emote_usage(&self.channel, emote).await {
                tracing::warn!(error = %e, "failed to record emote usage");
            }
        }
        if let Some((user, positive)) = author {
            match svc.persistence.record_interaction(&self.channel, user, positive).await {
                Ok(rel) => *self.state.lock().await.relationship_mut(user) = rel,
                Err(e) => {
                    tracing::warn!(error = %e, "failed to record interaction");
                    self.state.lock().await.relationship_mut(user).record(positive);
                }
            }
        }

        if let Some(correction) = h.correction {
            self.schedule_correction(correction);
        }

        tracing::info!(
            channel = %self.channel,
            text = %h.text,
            emote = ?h.emote,
            interjection = ?h.interjection,
            "sent"
        );
        Some(h.text)
    }

    fn schedule_correction(&self, correction: Correction) {
        let services = Arc::clone(&self.services);
        let channel = self.channel.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(correction.delay) => {}
            }
            if let Err(e) = services.transport.send(&channel, &correction.text).await {
                tracing::warn!(channel = %channel, error = %e, "failed to send correction");
                return;
            }
            let msg = Message::at(
                channel.as_str(),
                services.identity.nick.as_str(),
                correction.text.as_str(),
                true,
                Utc::now(),
            );
            services.store.get(&channel).lock().await.record_followup(msg.clone());
            if let Err(e) = services.persistence.append_message(&msg).await {
                tracing::warn!(error = %e, "failed to persist correction");
            }
            tracing::debug!(channel = %channel, text = %correction.text, "correction sent");
        });
    }

    pub async fn refresh_affect(&self, now: DateTime<Utc>) {
        affect::refresh(&mut *self.state.lock().await, now, &self.services.cfg);
    }

    /// Recount emote and word use over recent persisted chat.
    pub async fn refresh_trends(&self) {
        let svc = &*self.services;
        let cfg = &*svc.cfg;
        let recent = match svc.persistence.last_messages(&self.channel, cfg.trend_scan).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(channel = %self.channel, error = %e, "failed to load messages for trends");
                return;
            }
        };

        let mut st = self.state.lock().await;
        let counted = trends::compute(
            recent.iter().filter(|m| !m.is_bot).map(|m| m.content.as_str()),
            &st.known_emotes,
            &cfg.forbidden_words,
            cfg.trend_top_n,
        );
        if !counted.emotes.is_empty() {
            st.popular_emotes = counted.emotes;
        }
        if !counted.words.is_empty() {
            st.trending_words = counted.words;
        }
        tracing::info!(
            channel = %self.channel,
            popular = ?st.popular_emotes.iter().take(5).collect::<Vec<_>>(),
            "trends refreshed"
        );
    }

    /// Reload the known emote set; seed popular emotes when there are none.
    pub async fn refresh_catalog(&self) {
        let svc = &*self.services;
        let cfg = &*svc.cfg;
        let names = match svc.catalog.load(&self.channel).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(channel = %self.channel, error = %e, "emote catalog unavailable");
                return;
            }
        };

        let needs_seed = self.state.lock().await.popular_emotes.is_empty();
        let used = if needs_seed {
            svc.persistence
                .top_emotes(&self.channel, cfg.popular_seed_count as i64)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "failed to load emote usage");
                    Vec::new()
                })
        } else {
            Vec::new()
        };

        let mut st = self.state.lock().await;
        st.known_emotes = names.iter().cloned().collect();
        if st.popular_emotes.is_empty() {
            let mut seeded: Vec<String> = Vec::new();
            let mut seen: HashSet<&str> = HashSet::new();
            let candidates = used.iter().map(|(e, _)| e).chain(names.iter());
            for emote in candidates {
                if seeded.len() >= cfg.popular_seed_count {
                    break;
                }
                if st.known_emotes.contains(emote) && seen.insert(emote.as_str()) {
                    seeded.push(emote.clone());
                }
            }
            st.popular_emotes = seeded;
        }
        tracing::info!(channel = %self.channel, known = st.known_emotes.len(), "emote catalog loaded");
    }

    /// Post an ambient line when chat has been quiet long enough.
    pub async fn break_silence(&self, now: DateTime<Utc>) -> Option<String> {
        let svc = &*self.services;
        let cfg = &*svc.cfg;
        let requester = svc.requester.as_ref()?;

        let task = {
            let st = self.state.lock().await;
            let quiet_for = seconds_since(st.last_message_at, now);
            let since_break = seconds_since(st.last_silence_break_at, now);
            if st.is_away(now)
                || quiet_for <= cfg.silence_threshold_secs
                || since_break <= cfg.silence_cooldown_secs
            {
                return None;
            }
            let mut entropy = svc.entropy();
            SILENCE_TASKS[entropy.index(SILENCE_TASKS.len())]
        };
        tracing::info!(channel = %self.channel, "chat is quiet, breaking the silence");

        let permit = svc.generation_permit().await;
        let messages = {
            let mut st = self.state.lock().await;
            // stamped on attempt so a failing generator is not hit every check
            st.last_silence_break_at = Some(now);
            let system = response::build_system_prompt(&svc.identity.persona_name, &st, None, Some(task), cfg);
            response::build_messages(system, &[], SILENCE_MARKER)
        };
        let raw = requester.request(messages).await?;
        let humanized = self.humanize(&raw, ReplyKind::Ambient).await;
        drop(permit);

        self.deliver(humanized?, None).await
    }

    /// Expire away flags and maybe start a new AFK or busy stretch.
    pub async fn away_cycle(&self, now: DateTime<Utc>) {
        let svc = &*self.services;
        let cfg = &*svc.cfg;
        let mut st = self.state.lock().await;
        if st.clear_expired_away(now) {
            tracing::info!(channel = %self.channel, "back from away");
        }
        if st.is_away(now) {
            return;
        }

        let mut entropy = svc.entropy();
        if st.energy < cfg.afk_energy && entropy.chance(cfg.afk_chance) {
            let mins = entropy.between(cfg.afk_min_mins, cfg.afk_max_mins);
            st.afk_until = Some(now + chrono::Duration::minutes(mins));
            tracing::info!(channel = %self.channel, minutes = mins, "going afk");
        } else if entropy.chance(cfg.busy_chance) {
            let mins = entropy.between(cfg.busy_min_mins, cfg.busy_max_mins);
            st.busy_until = Some(now + chrono::Duration::minutes(mins));
            tracing::info!(channel = %self.channel, minutes = mins, "busy for a while");
        }
    }
}
