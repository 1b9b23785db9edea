pub mod catalog;
pub mod models;
pub mod store;

use anyhow::Context;

use crate::{models::UserStats, store::StatsStore};

/// Storage key of the user progress aggregate.
pub const STATS_KEY: &str = "dough_drills_stats";

/// Load user progress, falling back to defaults.
///
/// Missing or unreadable data yields default stats; older saves are migrated by
/// field defaults and queue repair. Never fails.
pub fn load_stats(store: &dyn StatsStore) -> UserStats {
    let raw = match store.get(STATS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::info!("No saved progress found, starting fresh");
            return UserStats::default();
        }
        Err(e) => {
            tracing::warn!("Failed to read saved progress, starting fresh: {e:#}");
            return UserStats::default();
        }
    };

    match serde_json::from_str::<UserStats>(&raw) {
        Ok(mut stats) => {
            if stats.repair() {
                tracing::warn!("Repaired inconsistent review queue in saved progress");
            }
            stats
        }
        Err(e) => {
            tracing::warn!("Saved progress is corrupt, starting fresh: {e}");
            UserStats::default()
        }
    }
}

/// Serialize and write user progress.
pub fn save_stats(store: &dyn StatsStore, stats: &UserStats) -> anyhow::Result<()> {
    let payload = serde_json::to_string(stats).context("failed to serialize progress")?;
    store
        .set(STATS_KEY, &payload)
        .context("failed to persist progress")
}
