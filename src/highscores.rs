//! Local best-score tracking
//!
//! One value per game under a single storage key. Absent, unreadable or
//! garbled values all read as "no high score"; a storage failure never
//! interrupts play.

use serde::{Deserialize, Serialize};

use crate::persistence::KeyValueStore;

/// Best score for one game
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HighScore {
    key: String,
    best: u64,
}

impl HighScore {
    /// Start with no recorded score
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            best: 0,
        }
    }

    /// Read the stored value, defaulting to 0 on any failure
    pub fn load(store: &dyn KeyValueStore, key: &str) -> Self {
        let best = match store.get(key) {
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(best) => {
                    log::info!("Loaded high score {} from '{}'", best, key);
                    best
                }
                Err(_) => {
                    log::warn!("Ignoring unparsable high score '{}' under '{}'", raw, key);
                    0
                }
            },
            Ok(None) => {
                log::info!("No high score under '{}', starting fresh", key);
                0
            }
            Err(e) => {
                log::warn!("High score unavailable: {}", e);
                0
            }
        };
        Self {
            key: key.to_string(),
            best,
        }
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Record a score. Returns true (and persists) only on a new best.
    pub fn observe(&mut self, score: u64, store: &mut dyn KeyValueStore) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        if let Err(e) = store.set(&self.key, &score.to_string()) {
            log::warn!("Could not persist high score {}: {}", score, e);
        }
        true
    }
}

/// Medal tier awarded at the end of a Flappy Bird run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Medal {
    Bronze,
    Silver,
    Gold,
}

impl Medal {
    pub fn for_score(score: u64) -> Option<Self> {
        match score {
            40.. => Some(Medal::Gold),
            20.. => Some(Medal::Silver),
            10.. => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Medal::Bronze => "bronze",
            Medal::Silver => "silver",
            Medal::Gold => "gold",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{MemoryStore, UnavailableStore};

    const KEY: &str = "flappyBirdHighScore";

    #[test]
    fn test_load_missing_is_zero() {
        let store = MemoryStore::new();
        assert_eq!(HighScore::load(&store, KEY).best(), 0);
    }

    #[test]
    fn test_load_existing() {
        let store = MemoryStore::with_item(KEY, "17");
        assert_eq!(HighScore::load(&store, KEY).best(), 17);
    }

    #[test]
    fn test_load_garbage_is_zero() {
        let store = MemoryStore::with_item(KEY, "seventeen");
        assert_eq!(HighScore::load(&store, KEY).best(), 0);
    }

    #[test]
    fn test_load_unavailable_is_zero() {
        assert_eq!(HighScore::load(&UnavailableStore, KEY).best(), 0);
    }

    #[test]
    fn test_observe_writes_only_new_best() {
        let mut store = MemoryStore::with_item(KEY, "5");
        let mut hs = HighScore::load(&store, KEY);

        assert!(!hs.observe(3, &mut store));
        assert!(!hs.observe(5, &mut store));
        assert_eq!(store.writes, 0);

        assert!(hs.observe(8, &mut store));
        assert_eq!(store.writes, 1);
        assert_eq!(store.get(KEY).unwrap().as_deref(), Some("8"));
    }

    #[test]
    fn test_observe_survives_write_failure() {
        let mut hs = HighScore::new(KEY);
        assert!(hs.observe(12, &mut UnavailableStore));
        assert_eq!(hs.best(), 12);
    }

    #[test]
    fn test_medal_tiers() {
        assert_eq!(Medal::for_score(9), None);
        assert_eq!(Medal::for_score(10), Some(Medal::Bronze));
        assert_eq!(Medal::for_score(20), Some(Medal::Silver));
        assert_eq!(Medal::for_score(39), Some(Medal::Silver));
        assert_eq!(Medal::for_score(40), Some(Medal::Gold));
    }
}
