//! Strategy arena
//!
//! Adapters are registered once and addressed by a stable [`StrategyId`] for
//! the life of the engine. An adapter serves at most one pair at a time;
//! detaching it keeps its slot so the handle stays valid for snapshots and
//! logs.

use crate::adapters::StrategyAdapter;
use router_types::{PairId, StrategyId};
use std::sync::Arc;

struct StrategySlot {
    adapter: Arc<dyn StrategyAdapter>,
    pair: Option<PairId>,
}

#[derive(Default)]
pub struct StrategyRegistry {
    slots: Vec<StrategySlot>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Handle of an already registered adapter, compared by identity
    pub fn find(&self, adapter: &Arc<dyn StrategyAdapter>) -> Option<StrategyId> {
        let target = Arc::as_ptr(adapter) as *const ();
        self.slots
            .iter()
            .position(|slot| Arc::as_ptr(&slot.adapter) as *const () == target)
            .map(|index| StrategyId::new(index as u32))
    }

    /// Register `adapter` if it is new and return its handle
    pub fn insert(&mut self, adapter: Arc<dyn StrategyAdapter>) -> StrategyId {
        if let Some(id) = self.find(&adapter) {
            return id;
        }
        self.slots.push(StrategySlot { adapter, pair: None });
        StrategyId::new((self.slots.len() - 1) as u32)
    }

    pub fn get(&self, id: StrategyId) -> Option<&Arc<dyn StrategyAdapter>> {
        self.slots.get(id.index()).map(|slot| &slot.adapter)
    }

    /// Pair the strategy is currently attached to
    pub fn pair_of(&self, id: StrategyId) -> Option<PairId> {
        self.slots.get(id.index()).and_then(|slot| slot.pair)
    }

    pub fn attach(&mut self, id: StrategyId, pair: PairId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            slot.pair = Some(pair);
        }
    }

    pub fn detach(&mut self, id: StrategyId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            slot.pair = None;
        }
    }

    pub fn detach_all(&mut self) {
        for slot in &mut self.slots {
            slot.pair = None;
        }
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(
                self.slots
                    .iter()
                    .map(|slot| (slot.adapter.name(), slot.pair)),
            )
            .finish()
    }
}
