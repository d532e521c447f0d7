// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Partition-local sparse connection store
//!
//! One store per worker partition, indexed directly by source node id
//! (ids are 1-based, slot 0 stays unused). Empty slots are explicit `None`;
//! capacity only grows, and growth preserves every existing entry. Each
//! partition owns its store exclusively, so no locking happens here.

use axograph_neural::types::NeuronId;

use crate::connector::Connector;

/// Growable id-indexed mapping from source node to connector
#[derive(Debug, Default)]
pub struct SparseStore {
    slots: Vec<Option<Connector>>,
}

impl SparseStore {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Current bound (exclusive): ids below this are in range
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True iff no slot holds a connector. Unlike the usual `len`/`is_empty`
    /// pairing this is about occupancy, not capacity: after `ensure_capacity`
    /// a store can have `len() > 0` and still be empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// True iff `id` is within bounds and the slot is occupied
    pub fn exists(&self, id: NeuronId) -> bool {
        self.slots.get(id.index()).is_some_and(Option::is_some)
    }

    /// Grow the backing storage to cover `id`; never truncates
    pub fn ensure_capacity(&mut self, id: NeuronId) {
        if self.slots.len() <= id.index() {
            self.slots.resize_with(id.index() + 1, || None);
        }
    }

    pub fn get(&self, id: NeuronId) -> Option<&Connector> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NeuronId) -> Option<&mut Connector> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Take ownership of the connector at `id`, leaving the slot empty.
    /// First half of the take → append → set growth protocol.
    pub fn take(&mut self, id: NeuronId) -> Option<Connector> {
        self.slots.get_mut(id.index()).and_then(Option::take)
    }

    /// Install (or overwrite) the connector at `id`, taking ownership.
    /// Grows the store if needed.
    pub fn set(&mut self, id: NeuronId, connector: Connector) {
        self.ensure_capacity(id);
        self.slots[id.index()] = Some(connector);
    }

    /// Occupied slots in ascending id order
    pub fn nonempty_iter(&self) -> impl Iterator<Item = (NeuronId, &Connector)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (NeuronId(i as u32), c)))
    }

    pub fn nonempty_iter_mut(&mut self) -> impl Iterator<Item = (NeuronId, &mut Connector)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|c| (NeuronId(i as u32), c)))
    }

    /// Release every connector and clear to zero size
    pub fn reset(&mut self) {
        self.slots.clear();
        self.slots.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axograph_neural::synapse::{PlasticityState, Synapse};
    use axograph_neural::types::{Delay, SynapseTypeId};

    fn connector(target: u32) -> Connector {
        Connector::new(
            SynapseTypeId(0),
            Synapse::new(
                NeuronId(target),
                1.0,
                Delay::from_ms(1.0),
                PlasticityState::Static,
            ),
        )
    }

    #[test]
    fn test_growth_preserves_entries() {
        let mut store = SparseStore::new();
        store.set(NeuronId(3), connector(9));
        assert_eq!(store.len(), 4);
        store.ensure_capacity(NeuronId(100));
        assert_eq!(store.len(), 101);
        assert!(store.exists(NeuronId(3)));
        // ensure_capacity never truncates
        store.ensure_capacity(NeuronId(1));
        assert_eq!(store.len(), 101);
    }

    #[test]
    fn test_exists_out_of_bounds_and_empty() {
        let mut store = SparseStore::new();
        assert!(!store.exists(NeuronId(5)));
        store.ensure_capacity(NeuronId(5));
        assert!(!store.exists(NeuronId(5)));
        assert!(store.get(NeuronId(5)).is_none());
        // Capacity without occupants still counts as empty
        assert_eq!(store.len(), 6);
        assert!(store.is_empty());
    }

    #[test]
    fn test_take_set_round_trip() {
        let mut store = SparseStore::new();
        store.set(NeuronId(5), connector(9));
        let conn = store.take(NeuronId(5)).unwrap();
        assert!(!store.exists(NeuronId(5)));
        let conn = conn.append(
            SynapseTypeId(0),
            Synapse::new(
                NeuronId(12),
                1.0,
                Delay::from_ms(1.0),
                PlasticityState::Static,
            ),
        );
        store.set(NeuronId(5), conn);
        assert_eq!(store.get(NeuronId(5)).unwrap().num_connections(), 2);
    }

    #[test]
    fn test_nonempty_iter_ascending_and_sparse() {
        let mut store = SparseStore::new();
        store.set(NeuronId(7), connector(1));
        store.set(NeuronId(2), connector(2));
        store.set(NeuronId(5), connector(3));
        let ids: Vec<u32> = store.nonempty_iter().map(|(id, _)| id.0).collect();
        assert_eq!(ids, vec![2, 5, 7]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut store = SparseStore::new();
        store.set(NeuronId(5), connector(9));
        store.reset();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.nonempty_iter().count(), 0);
    }
}
