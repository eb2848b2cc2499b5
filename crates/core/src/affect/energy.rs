use chrono::{DateTime, Utc};

use crate::config::LurkerCfg;
use crate::state::ChannelState;
use crate::types::{clamp_scalar, seconds_since};

/// (minimum sent count, fatigue) steps, highest first.
const FATIGUE_STEPS: [(u32, f64); 3] = [(10, 40.0), (6, 25.0), (3, 10.0)];

/// Time-of-day baseline for a local hour (0..=23).
pub fn baseline(hour: u32, cfg: &LurkerCfg) -> f64 {
    match hour {
        0..=6 => cfg.energy_night,
        7..=9 => cfg.energy_morning,
        10..=17 => cfg.energy_day,
        18..=22 => cfg.energy_evening,
        _ => cfg.energy_late,
    }
}

pub fn fatigue(recent_sent: u32) -> f64 {
    FATIGUE_STEPS
        .iter()
        .find(|(min, _)| recent_sent >= *min)
        .map(|(_, f)| *f)
        .unwrap_or(0.0)
}

pub fn recovery(idle_secs: i64, cfg: &LurkerCfg) -> f64 {
    let idle_mins = idle_secs.max(0) as f64 / 60.0;
    (idle_mins * cfg.recovery_per_min).min(cfg.recovery_cap)
}

/// Recompute energy from scratch. Resets the fatigue counter after a long
/// enough pause in sending.
pub fn recompute(st: &mut ChannelState, hour: u32, now: DateTime<Utc>, cfg: &LurkerCfg) -> f64 {
    let idle_secs = seconds_since(st.last_sent_at, now);
    if idle_secs >= cfg.fatigue_reset_secs {
        st.recent_sent = 0;
    }
    let energy = baseline(hour, cfg) - fatigue(st.recent_sent) + recovery(idle_secs, cfg);
    st.set_energy(clamp_scalar(energy));
    st.energy
}

/// Energy in words, for the prompt.
pub fn describe(energy: f64) -> &'static str {
    match energy {
        e if e >= 75.0 => "full of energy",
        e if e >= 50.0 => "awake",
        e if e >= 30.0 => "a little tired",
        _ => "sleepy",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::types::{MAX, MIN};

    fn st() -> ChannelState {
        ChannelState::new("#t", &LurkerCfg::default())
    }

    #[test]
    fn baseline_buckets() {
        let cfg = LurkerCfg::default();
        assert_eq!(baseline(3, &cfg), 30.0);
        assert_eq!(baseline(8, &cfg), 55.0);
        assert_eq!(baseline(12, &cfg), 75.0);
        assert_eq!(baseline(20, &cfg), 90.0);
        assert_eq!(baseline(23, &cfg), 60.0);
    }

    #[test]
    fn fatigue_steps() {
        assert_eq!(fatigue(0), 0.0);
        assert_eq!(fatigue(2), 0.0);
        assert_eq!(fatigue(3), 10.0);
        assert_eq!(fatigue(7), 25.0);
        assert_eq!(fatigue(50), 40.0);
    }

    #[test]
    fn recovery_is_capped() {
        let cfg = LurkerCfg::default();
        assert_eq!(recovery(0, &cfg), 0.0);
        assert_eq!(recovery(600, &cfg), 5.0);
        assert_eq!(recovery(1_000_000, &cfg), cfg.recovery_cap);
        assert_eq!(recovery(-5, &cfg), 0.0);
    }

    #[test]
    fn busy_bot_gets_tired() {
        let cfg = LurkerCfg::default();
        let mut s = st();
        let now = Utc::now();
        s.recent_sent = 6;
        s.last_sent_at = Some(now);
        let e = recompute(&mut s, 12, now, &cfg);
        assert_eq!(e, 75.0 - 25.0);
    }

    #[test]
    fn long_pause_resets_fatigue() {
        let cfg = LurkerCfg::default();
        let mut s = st();
        let now = Utc::now();
        s.recent_sent = 12;
        s.last_sent_at = Some(now - Duration::hours(1));
        let e = recompute(&mut s, 12, now, &cfg);
        assert_eq!(s.recent_sent, 0);
        assert_eq!(e, 75.0 + 20.0);
    }

    #[test]
    fn energy_stays_bounded() {
        let cfg = LurkerCfg { energy_evening: 500.0, energy_night: -500.0, ..LurkerCfg::default() };
        let mut s = st();
        let now = Utc::now();
        for hour in 0..24 {
            let e = recompute(&mut s, hour, now, &cfg);
            assert!(e >= MIN && e <= MAX);
        }
    }
}
