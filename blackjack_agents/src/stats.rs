use crate::SimulationError;
use blackjack_lib::Chips;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Chip balance of every participant at every global round index, shared by all table threads.
/// A slot is `None` until some thread records it.
pub struct GameStats {
    total_rounds: usize,
    chips_history: Mutex<HashMap<String, Vec<Option<Chips>>>>,
}

impl GameStats {
    pub fn new(total_rounds: usize) -> GameStats {
        GameStats {
            total_rounds,
            chips_history: Mutex::new(HashMap::new()),
        }
    }

    pub fn total_rounds(&self) -> usize {
        self.total_rounds
    }

    /// Records `chips` for `name` at global round index `round`. Writing the same slot twice
    /// keeps the last value.
    pub fn record(&self, name: &str, chips: Chips, round: usize) -> Result<(), SimulationError> {
        if round >= self.total_rounds {
            return Err(SimulationError::RoundOutOfRange {
                round,
                total: self.total_rounds,
            });
        }
        let mut history = self.lock();
        let slots = history
            .entry(name.to_string())
            .or_insert_with(|| vec![None; self.total_rounds]);
        slots[round] = Some(chips);
        Ok(())
    }

    /// Snapshot of the history, ordered by participant name.
    pub fn history(&self) -> BTreeMap<String, Vec<Option<Chips>>> {
        self.lock()
            .iter()
            .map(|(name, slots)| (name.clone(), slots.clone()))
            .collect()
    }

    // A panicking table thread never leaves a slot half written, so a poisoned lock is still
    // safe to read.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Option<Chips>>>> {
        self.chips_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn unrecorded_rounds_are_empty() {
        let stats = GameStats::new(3);
        stats.record("Alice", 1000, 1).unwrap();
        assert_eq!(stats.history()["Alice"], vec![None, Some(1000), None]);
    }

    #[test]
    fn last_write_wins() {
        let stats = GameStats::new(2);
        stats.record("Alice", 1000, 0).unwrap();
        stats.record("Alice", 850, 0).unwrap();
        assert_eq!(stats.history()["Alice"][0], Some(850));
    }

    #[test]
    fn round_past_the_end_is_rejected() {
        let stats = GameStats::new(2);
        match stats.record("Alice", 1000, 2) {
            Err(SimulationError::RoundOutOfRange { round, total }) => {
                assert_eq!((round, total), (2, 2));
            }
            other => panic!("expected RoundOutOfRange, got {:?}", other),
        }
        assert!(stats.history().is_empty());
    }

    #[test]
    fn concurrent_writers_fill_disjoint_slots() {
        let stats = Arc::new(GameStats::new(40));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let stats = Arc::clone(&stats);
                thread::spawn(move || {
                    for round in t * 10..(t + 1) * 10 {
                        stats.record("Dealer", round as Chips, round).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let history = stats.history();
        let dealer = &history["Dealer"];
        assert_eq!(dealer.len(), 40);
        for (round, slot) in dealer.iter().enumerate() {
            assert_eq!(*slot, Some(round as Chips));
        }
    }
}
