//! The fishing simulation loop.
//!
//! A timer-driven placeholder: it casts on a configurable interval,
//! rolls for a bite and a catch, and keeps session statistics. There is
//! no real sensing here; the detection method only changes what the log
//! says. The loop exists so the control panel (and the self-updater
//! underneath it) has something to control.

use rand::Rng;
use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::info;

use crate::config::BotSettings;

/// Chance per cycle that a cast line registers a bite.
const BITE_CHANCE: f64 = 0.3;

/// Chance that a registered bite turns into a landed fish.
const CATCH_CHANCE: f64 = 0.8;

/// Snapshot of one fishing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStats {
    pub fish_caught: u64,
    pub session_secs: f64,
    pub fish_per_hour: f64,
}

/// The simulation state machine.
pub struct FishingBot {
    settings: BotSettings,
    last_cast: Option<Instant>,
    session_start: Option<Instant>,
    fish_caught: u64,
}

impl FishingBot {
    pub fn new(settings: BotSettings) -> Self {
        Self {
            settings,
            last_cast: None,
            session_start: None,
            fish_caught: 0,
        }
    }

    /// Run one cycle: cast if the interval elapsed, otherwise roll for a
    /// bite and possibly reel a fish in.
    pub fn execute_cycle(&mut self) {
        let now = Instant::now();
        self.session_start.get_or_insert(now);

        let cast_due = match self.last_cast {
            None => true,
            Some(at) => now.duration_since(at) > Duration::from_secs(self.settings.cast_interval_secs),
        };
        if cast_due {
            info!("casting fishing line");
            self.last_cast = Some(now);
            return;
        }

        let mut rng = rand::thread_rng();
        if rng.gen_bool(BITE_CHANCE) {
            info!(
                "fish bite detected using {} detection",
                self.settings.detection_method.as_str()
            );
            if rng.gen_bool(CATCH_CHANCE) {
                self.fish_caught += 1;
                info!("fish caught! total: {}", self.fish_caught);
                // Cast again right away on the next cycle.
                self.last_cast = None;
            }
        }
    }

    /// Current session statistics.
    pub fn stats(&self) -> SessionStats {
        let session_secs = self
            .session_start
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let hours = session_secs / 3600.0;
        let fish_per_hour = if hours > 0.0 {
            self.fish_caught as f64 / hours
        } else {
            0.0
        };
        SessionStats {
            fish_caught: self.fish_caught,
            session_secs,
            fish_per_hour,
        }
    }
}

/// Drive the bot on a one-second tick until Ctrl-C.
pub async fn run_until_interrupt(mut bot: FishingBot) -> SessionStats {
    let mut ticker = interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = ticker.tick() => bot.execute_cycle(),
            _ = tokio::signal::ctrl_c() => {
                info!("stop requested");
                return bot.stats();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotSettings;

    #[test]
    fn first_cycle_always_casts() {
        let mut bot = FishingBot::new(BotSettings::default());
        assert!(bot.last_cast.is_none());
        bot.execute_cycle();
        assert!(bot.last_cast.is_some());
        assert!(bot.session_start.is_some());
    }

    #[test]
    fn stats_start_at_zero() {
        let bot = FishingBot::new(BotSettings::default());
        let stats = bot.stats();
        assert_eq!(stats.fish_caught, 0);
        assert_eq!(stats.session_secs, 0.0);
        assert_eq!(stats.fish_per_hour, 0.0);
    }

    #[test]
    fn fish_per_hour_scales_with_session_length() {
        // Monotonic clocks near boot cannot be rewound half an hour.
        let Some(half_hour_ago) = Instant::now().checked_sub(Duration::from_secs(1800)) else {
            return;
        };
        let mut bot = FishingBot::new(BotSettings::default());
        bot.session_start = Some(half_hour_ago);
        bot.fish_caught = 10;

        let stats = bot.stats();
        assert_eq!(stats.fish_caught, 10);
        // Half an hour in, ten fish is a rate of about twenty per hour.
        assert!((stats.fish_per_hour - 20.0).abs() < 0.1);
    }
}
