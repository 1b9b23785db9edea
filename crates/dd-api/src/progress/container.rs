use chrono::{DateTime, FixedOffset, Utc};
use dd_db::{models::UserStats, store::StatsStore};
use dd_srs::streak;

use super::aggregator::Completion;

/// Owner of the user's progress.
///
/// Holds the only copy of [`UserStats`] and writes it back after every
/// transition. Store failures are logged; the in-memory value stays
/// authoritative.
pub struct StatsContainer {
    stats: UserStats,
    store: Box<dyn StatsStore>,
    offset: FixedOffset,
}

impl std::fmt::Debug for StatsContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsContainer")
            .field("stats", &self.stats)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl StatsContainer {
    /// Load saved progress and run the passive streak check once.
    pub fn load(store: Box<dyn StatsStore>, now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let mut stats = dd_db::load_stats(store.as_ref());

        let decayed = streak::decay_on_load(stats.streak, stats.last_activity_date, now, &offset);
        if decayed != stats.streak {
            tracing::info!(previous = stats.streak, "Streak lapsed since last visit");
            stats.streak = decayed;
        }

        let container = Self {
            stats,
            store,
            offset,
        };
        container.persist();
        container
    }

    pub fn stats(&self) -> &UserStats {
        &self.stats
    }

    /// Calendar used for streak days
    pub fn offset(&self) -> &FixedOffset {
        &self.offset
    }

    /// Replace the stats with the result of `transition` and persist.
    pub fn apply<F>(&mut self, transition: F) -> &UserStats
    where
        F: FnOnce(&UserStats) -> UserStats,
    {
        self.stats = transition(&self.stats);
        self.persist();
        &self.stats
    }

    /// Like [`apply`](Self::apply), leaving the stats untouched on error.
    pub fn try_apply<F, E>(&mut self, transition: F) -> Result<&UserStats, E>
    where
        F: FnOnce(&UserStats) -> Result<UserStats, E>,
    {
        self.stats = transition(&self.stats)?;
        self.persist();
        Ok(&self.stats)
    }

    /// Apply a session completion; returns it with the stored snapshot.
    pub fn complete<F>(&mut self, transition: F) -> Completion
    where
        F: FnOnce(&UserStats, &FixedOffset) -> Completion,
    {
        let completion = transition(&self.stats, &self.offset);
        self.stats = completion.stats.clone();
        self.persist();
        completion
    }

    fn persist(&self) {
        if let Err(e) = dd_db::save_stats(self.store.as_ref(), &self.stats) {
            tracing::error!("Failed to save progress: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dd_db::{STATS_KEY, models::Difficulty, store::MemoryStore};
    use std::sync::Arc;

    type Shared = Arc<MemoryStore>;

    struct Broken;

    impl StatsStore for Broken {
        fn get(&self, _: &str) -> anyhow::Result<Option<String>> {
            anyhow::bail!("unreadable")
        }

        fn set(&self, _: &str, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("read-only")
        }
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn saved(store: &Shared) -> UserStats {
        dd_db::load_stats(store)
    }

    #[test]
    fn test_load_decays_lapsed_streak() {
        let now = Utc::now();
        let store = Shared::default();
        let prior = UserStats {
            streak: 6,
            last_activity_date: Some(now - Duration::days(3)),
            ..Default::default()
        };
        dd_db::save_stats(&store, &prior).unwrap();

        let container = StatsContainer::load(Box::new(store.clone()), now, utc());
        assert_eq!(container.stats().streak, 0);
        // Decay does not count as activity
        assert_eq!(container.stats().last_activity_date, prior.last_activity_date);
        assert_eq!(saved(&store).streak, 0);
    }

    #[test]
    fn test_load_keeps_recent_streak() {
        let now = Utc::now();
        let store = Shared::default();
        let prior = UserStats {
            streak: 6,
            last_activity_date: Some(now - Duration::hours(1)),
            ..Default::default()
        };
        dd_db::save_stats(&store, &prior).unwrap();

        let container = StatsContainer::load(Box::new(store), now, utc());
        assert_eq!(container.stats().streak, 6);
    }

    #[test]
    fn test_apply_persists() {
        let store = Shared::default();
        let mut container = StatsContainer::load(Box::new(store.clone()), Utc::now(), utc());

        container.apply(|stats| UserStats {
            preferred_difficulty: Difficulty::Advanced,
            ..stats.clone()
        });

        assert_eq!(saved(&store).preferred_difficulty, Difficulty::Advanced);
        assert!(store.get(STATS_KEY).unwrap().is_some());
    }

    #[test]
    fn test_try_apply_error_leaves_stats() {
        let mut container = StatsContainer::load(Box::new(Shared::default()), Utc::now(), utc());
        let result: Result<_, &str> = container.try_apply(|_| Err("nope"));
        assert!(result.is_err());
        assert_eq!(container.stats(), &UserStats::default());
    }

    #[test]
    fn test_broken_store_is_not_fatal() {
        let mut container = StatsContainer::load(Box::new(Broken), Utc::now(), utc());
        let stats = container.apply(|stats| UserStats {
            points: stats.points + 20,
            ..stats.clone()
        });
        assert_eq!(stats.points, 20);
    }
}
