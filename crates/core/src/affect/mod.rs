pub mod energy;
pub mod mood;

use chrono::{DateTime, Local, Timelike, Utc};

use crate::config::LurkerCfg;
use crate::state::ChannelState;

/// Local hour used for the energy baseline.
pub fn local_hour(now: DateTime<Utc>) -> u32 {
    now.with_timezone(&Local).hour()
}

/// Per-message update: mood reacts to the line, energy is recomputed.
pub fn on_inbound(st: &mut ChannelState, text: &str, now: DateTime<Utc>, cfg: &LurkerCfg) {
    mood::on_message(st, text, now, cfg);
    energy::recompute(st, local_hour(now), now, cfg);
}

/// Post-send update.
pub fn on_sent(st: &mut ChannelState, now: DateTime<Utc>, cfg: &LurkerCfg) {
    energy::recompute(st, local_hour(now), now, cfg);
}

/// Periodic refresh: mood drifts toward neutral, energy is recomputed.
pub fn refresh(st: &mut ChannelState, now: DateTime<Utc>, cfg: &LurkerCfg) {
    mood::drift(st, now, cfg);
    energy::recompute(st, local_hour(now), now, cfg);
    tracing::trace!(channel = %st.name, mood = st.mood, energy = st.energy, "affect refreshed");
}
