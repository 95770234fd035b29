// ── Fieldmind: Memory Maintenance ──────────────────────────────────────────
//
// Periodic upkeep of the memory store. Phase order is fixed:
//
//   1. consolidate — merge near-duplicates (max-importance merge can rescue
//      an entry that forgetting would otherwise evict)
//   2. forget      — evict stale, weak, untouched entries
//   3. decay       — fade association edges, prune the weakest
//
// Each phase takes and releases the store lock independently so a recall can
// interleave between phases.

use crate::atoms::error::EngineResult;
use crate::engine::memory::store::MemoryStore;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of one maintenance pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaintenanceReport {
    pub consolidated: usize,
    pub forgotten: usize,
    pub pruned_edges: usize,
}

/// Run one synchronous maintenance pass over the store.
pub fn run_maintenance(store: &MemoryStore) -> EngineResult<MaintenanceReport> {
    let config = store.config().clone();
    let report = MaintenanceReport {
        consolidated: store.consolidate_memories(config.consolidation_threshold)?,
        forgotten: store.forget_old_memories(config.forget_age_secs)?,
        pruned_edges: store.decay_associations()?,
    };
    info!(
        "[memory] Maintenance pass: {} consolidated, {} forgotten, {} edges pruned",
        report.consolidated, report.forgotten, report.pruned_edges
    );
    Ok(report)
}

/// Spawn the background maintenance loop. The task sleeps for the store's
/// configured interval between passes; a failing pass is logged and the loop
/// keeps going.
pub fn spawn_maintenance(store: Arc<MemoryStore>) -> tokio::task::JoinHandle<()> {
    let interval_secs = store.config().maintenance_interval_secs;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        // First tick fires immediately; skip it so a fresh store is not
        // maintained before it has anything to maintain.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = run_maintenance(&store) {
                warn!("[memory] Maintenance pass failed: {}", e);
            }
        }
    })
}
