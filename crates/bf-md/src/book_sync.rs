//! Order-book consistency engine.
//!
//! Binance futures publishes the book as a sequence-numbered diff stream:
//! each `depthUpdate` carries a first update id `U`, a final update id `u`,
//! and — once a symbol is in sync — the previous message's final id `pu`.
//! A REST snapshot carries its own `lastUpdateId`. Diffs arrive continuously
//! while the snapshot is fetched asynchronously, so the engine must discard
//! diffs that predate the snapshot and find the one diff whose `[U, u]` range
//! brackets the snapshot boundary, without blocking on arrival order.
//!
//! Per symbol the engine is a two-state machine:
//!
//! | State    | Condition           | Action            | Next     | Outcome  |
//! |----------|---------------------|-------------------|----------|----------|
//! | Unsynced | `u < last`          | none              | Unsynced | `Skip`   |
//! | Unsynced | `U ≤ last ≤ u`      | `last ← u`        | Synced   | `Apply`  |
//! | Unsynced | otherwise           | reset             | Unsynced | `Resync` |
//! | Synced   | `pu == last`        | `last ← u`        | Synced   | `Apply`  |
//! | Synced   | `pu != last`        | reset             | Unsynced | `Resync` |
//!
//! `pu == last` is the ongoing continuity guarantee: any break means level
//! changes were provably lost and only a fresh snapshot can recover the book.
//! The engine keeps no transport affinity — a WebSocket reconnect does not
//! reset it; only a detected gap or an explicit re-seed does.

use ahash::AHashMap;
use tracing::warn;

/// Sync status of one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    /// Snapshot boundary not yet bracketed by a diff.
    Unsynced,
    /// Diffs are being applied continuously.
    Synced,
}

/// Consistency state for one symbol.
#[derive(Debug, Clone, Copy)]
struct SymbolSync {
    /// Final update id of the last accepted diff (or the snapshot seed).
    last_update_id: u64,
    state: SyncState,
}

/// Verdict for one incoming diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Forward the diff. `initial` is `true` when the symbol was unsynced at
    /// call time — the diff straddles the snapshot boundary and must be
    /// treated as a full level set by book materialization.
    Apply { initial: bool },
    /// Drop the diff silently (stale, predates the snapshot).
    Skip,
    /// Drop the diff; continuity is broken and the caller must signal a
    /// snapshot re-fetch. The engine has already reset the symbol.
    Resync,
}

/// Per-symbol book consistency engine.
///
/// Owned exclusively by the dispatcher task; state survives transport
/// reconnects and is only reset by [`check`](Self::check) detecting a gap or
/// by a fresh [`seed`](Self::seed).
#[derive(Debug, Default)]
pub struct BookSyncEngine {
    symbols: AHashMap<String, SymbolSync>,
}

impl BookSyncEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the symbol has been seeded by a snapshot.
    ///
    /// Diffs for unseeded symbols must not reach [`check`](Self::check) —
    /// there is no boundary to bracket yet.
    pub fn is_seeded(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    /// Seed (or re-seed) a symbol from a snapshot's `lastUpdateId`.
    ///
    /// The symbol starts unsynced: the next accepted diff must bracket the
    /// seed id.
    pub fn seed(&mut self, symbol: &str, last_update_id: u64) {
        self.symbols.insert(
            symbol.to_string(),
            SymbolSync { last_update_id, state: SyncState::Unsynced },
        );
    }

    /// Run one diff through the state machine.
    ///
    /// `prev_final` (`pu`) is absent on pre-sync messages from some endpoints;
    /// while synced its absence counts as a continuity break.
    pub fn check(
        &mut self,
        symbol: &str,
        first: u64,
        last: u64,
        prev_final: Option<u64>,
    ) -> DiffOutcome {
        let entry = self
            .symbols
            .entry(symbol.to_string())
            .or_insert(SymbolSync { last_update_id: 0, state: SyncState::Unsynced });

        match entry.state {
            SyncState::Unsynced => {
                if last < entry.last_update_id {
                    // Predates the snapshot.
                    DiffOutcome::Skip
                } else if first <= entry.last_update_id && entry.last_update_id <= last {
                    // The snapshot boundary lies inside this diff's range.
                    entry.last_update_id = last;
                    entry.state = SyncState::Synced;
                    DiffOutcome::Apply { initial: true }
                } else {
                    warn!("{symbol}: diff [{first}, {last}] does not bracket snapshot id {}, resetting book", entry.last_update_id);
                    entry.state = SyncState::Unsynced;
                    DiffOutcome::Resync
                }
            }
            SyncState::Synced => {
                if prev_final == Some(entry.last_update_id) {
                    entry.last_update_id = last;
                    DiffOutcome::Apply { initial: false }
                } else {
                    warn!("{symbol}: missing book update detected (pu={prev_final:?}, expected {}), resetting book", entry.last_update_id);
                    entry.state = SyncState::Unsynced;
                    DiffOutcome::Resync
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_diff_is_skipped_while_unsynced() {
        let mut engine = BookSyncEngine::new();
        engine.seed("BTCUSDT", 100);
        assert_eq!(engine.check("BTCUSDT", 90, 95, None), DiffOutcome::Skip);
        // State unchanged: the bracketing diff is still accepted afterwards.
        assert_eq!(engine.check("BTCUSDT", 95, 101, None), DiffOutcome::Apply { initial: true });
    }

    #[test]
    fn bracketing_diff_syncs() {
        let mut engine = BookSyncEngine::new();
        engine.seed("BTCUSDT", 100);
        assert_eq!(engine.check("BTCUSDT", 95, 101, None), DiffOutcome::Apply { initial: true });
        // Now synced: continuity rule takes over.
        assert_eq!(
            engine.check("BTCUSDT", 102, 103, Some(101)),
            DiffOutcome::Apply { initial: false }
        );
    }

    #[test]
    fn boundary_bracketing_is_inclusive() {
        let mut engine = BookSyncEngine::new();
        engine.seed("BTCUSDT", 100);
        // U == lastUpdateId == u
        assert_eq!(engine.check("BTCUSDT", 100, 100, None), DiffOutcome::Apply { initial: true });
    }

    #[test]
    fn continuity_gap_triggers_resync() {
        let mut engine = BookSyncEngine::new();
        engine.seed("BTCUSDT", 100);
        assert_eq!(engine.check("BTCUSDT", 95, 101, None), DiffOutcome::Apply { initial: true });
        assert_eq!(
            engine.check("BTCUSDT", 102, 103, Some(101)),
            DiffOutcome::Apply { initial: false }
        );
        // pu=104 != 103 — intermediate updates were lost.
        assert_eq!(engine.check("BTCUSDT", 105, 106, Some(104)), DiffOutcome::Resync);
    }

    #[test]
    fn missing_pu_while_synced_is_a_gap() {
        let mut engine = BookSyncEngine::new();
        engine.seed("BTCUSDT", 100);
        engine.check("BTCUSDT", 95, 101, None);
        assert_eq!(engine.check("BTCUSDT", 102, 103, None), DiffOutcome::Resync);
    }

    #[test]
    fn resync_requires_rebracketing() {
        let mut engine = BookSyncEngine::new();
        engine.seed("BTCUSDT", 100);
        engine.check("BTCUSDT", 95, 101, None);
        assert_eq!(engine.check("BTCUSDT", 105, 106, Some(104)), DiffOutcome::Resync);
        // A continuity-only diff after the reset must not re-enter Synced.
        assert_ne!(
            engine.check("BTCUSDT", 107, 108, Some(106)),
            DiffOutcome::Apply { initial: false }
        );
        // Re-seed and bracket again.
        engine.seed("BTCUSDT", 110);
        assert_eq!(engine.check("BTCUSDT", 108, 111, None), DiffOutcome::Apply { initial: true });
    }

    #[test]
    fn symbols_are_independent() {
        let mut engine = BookSyncEngine::new();
        engine.seed("BTCUSDT", 100);
        engine.seed("ETHUSDT", 500);
        assert_eq!(engine.check("BTCUSDT", 95, 101, None), DiffOutcome::Apply { initial: true });
        // A gap on one symbol leaves the other synced.
        assert_eq!(engine.check("ETHUSDT", 600, 601, None), DiffOutcome::Resync);
        assert_eq!(
            engine.check("BTCUSDT", 102, 103, Some(101)),
            DiffOutcome::Apply { initial: false }
        );
    }

    #[test]
    fn unseeded_symbol() {
        let engine = BookSyncEngine::new();
        assert!(!engine.is_seeded("BTCUSDT"));
    }

    #[test]
    fn documented_scenario() {
        // Snapshot seeds lastUpdateId=100. A: U=95,u=101 → apply, synced.
        // B: U=102,u=103,pu=101 → apply. C: U=105,u=106,pu=104 → gap → resync.
        let mut engine = BookSyncEngine::new();
        engine.seed("BTCUSDT", 100);
        assert_eq!(engine.check("BTCUSDT", 95, 101, None), DiffOutcome::Apply { initial: true });
        assert_eq!(
            engine.check("BTCUSDT", 102, 103, Some(101)),
            DiffOutcome::Apply { initial: false }
        );
        assert_eq!(engine.check("BTCUSDT", 105, 106, Some(104)), DiffOutcome::Resync);
    }
}
