// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connection manager: orchestrates the per-partition sparse stores
//!
//! A fixed number of worker partitions is chosen at construction; each
//! partition owns its store exclusively, and a source id belongs to exactly
//! one partition. Connect calls follow the take → append → set protocol so
//! that a grown connector always replaces its predecessor in the slot it was
//! taken from. Cross-partition operations are read-only aggregations merged
//! from per-partition result vectors.
//!
//! Aggregate metrics (connection counts, observed delay extrema) are
//! maintained live here, updated by the same operation that installs a new
//! or grown connector.

use ahash::AHashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, trace};

use axograph_neural::synapse::Synapse;
use axograph_neural::types::{
    ConnectivityError, Delay, ModulatorEvent, ModulatorId, NeuronId, Result, SimTime, SpikeEvent,
    SynapseTypeId,
};

use crate::connector::ConnectionDescriptor;
use crate::registry::SynapseRegistry;
use crate::sparse_store::SparseStore;
use crate::traits::{EventSink, NodeRegistry};

/// One element of a batch connect call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub source: NeuronId,
    pub target: NeuronId,

    /// Synapse model name; the registry default when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synapse_model: Option<String>,

    /// Per-synapse parameter overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

/// Query result group: all matching connections of one synapse type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGroup {
    pub synapse_type: SynapseTypeId,
    pub connections: Vec<ConnectionDescriptor>,
}

/// Owner of all partition stores and the synapse model registry
#[derive(Debug)]
pub struct ConnectionManager {
    registry: SynapseRegistry,
    partitions: Vec<SparseStore>,
    /// Live connection counts, per partition then per synapse type
    counts: Vec<Vec<u64>>,
    /// Observed (min, max) delay per synapse type; high-water marks until reset
    delay_extrema: Vec<Option<(Delay, Delay)>>,
}

impl ConnectionManager {
    /// Manager with the built-in synapse models
    pub fn new(num_partitions: usize) -> Self {
        Self::with_registry(num_partitions, SynapseRegistry::default())
    }

    pub fn with_registry(num_partitions: usize, registry: SynapseRegistry) -> Self {
        Self {
            registry,
            partitions: (0..num_partitions).map(|_| SparseStore::new()).collect(),
            counts: vec![Vec::new(); num_partitions],
            delay_extrema: Vec::new(),
        }
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn registry(&self) -> &SynapseRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SynapseRegistry {
        &mut self.registry
    }

    /// Read access to one partition's store
    pub fn partition(&self, partition: usize) -> Option<&SparseStore> {
        self.partitions.get(partition)
    }

    pub fn partition_mut(&mut self, partition: usize) -> Option<&mut SparseStore> {
        self.partitions.get_mut(partition)
    }

    /// Disjoint mutable access to every partition's store, for fork-join
    /// phases where each worker mutates only its own partition
    pub fn partitions_mut(&mut self) -> impl Iterator<Item = &mut SparseStore> {
        self.partitions.iter_mut()
    }

    /// Create one connection. The synapse is validated and fully built
    /// before any slot is touched, so a failed connect leaves the store
    /// unchanged.
    ///
    /// # Panics
    /// Panics if `partition` is out of range; partition ids come from the
    /// scheduler and are trusted.
    pub fn connect(
        &mut self,
        source: NeuronId,
        target: NeuronId,
        partition: usize,
        synapse_type: SynapseTypeId,
        delay_ms: Option<f64>,
        weight: Option<f64>,
    ) -> Result<()> {
        self.registry.validate_type(synapse_type)?;
        let synapse = self
            .registry
            .make_synapse(synapse_type, target, delay_ms, weight)?;
        self.install(partition, source, synapse_type, synapse);
        Ok(())
    }

    /// Dictionary-parameterized connect
    ///
    /// # Panics
    /// Panics if `partition` is out of range.
    pub fn connect_with_params(
        &mut self,
        source: NeuronId,
        target: NeuronId,
        partition: usize,
        synapse_type: SynapseTypeId,
        params: &Map<String, Value>,
    ) -> Result<()> {
        self.registry.validate_type(synapse_type)?;
        let synapse = self
            .registry
            .make_synapse_from_params(synapse_type, target, params)?;
        self.install(partition, source, synapse_type, synapse);
        Ok(())
    }

    /// Batch connect. Each element is routed to the partition owning its
    /// target; elements landing on the same partition apply in input order.
    ///
    /// Best-effort with first-error propagation: elements applied before a
    /// failing one stay committed.
    pub fn connect_batch(
        &mut self,
        requests: &[ConnectRequest],
        nodes: &dyn NodeRegistry,
    ) -> Result<()> {
        debug!(requests = requests.len(), "applying batch connect");
        for request in requests {
            let partition = nodes.owning_partition(request.target)?;
            let synapse_type = match &request.synapse_model {
                Some(name) => self.registry.resolve_name(name)?,
                None => self.registry.default_type(),
            };
            match &request.params {
                Some(params) => self.connect_with_params(
                    request.source,
                    request.target,
                    partition,
                    synapse_type,
                    params,
                )?,
                None => self.connect(
                    request.source,
                    request.target,
                    partition,
                    synapse_type,
                    None,
                    None,
                )?,
            }
        }
        Ok(())
    }

    fn install(
        &mut self,
        partition: usize,
        source: NeuronId,
        synapse_type: SynapseTypeId,
        synapse: Synapse,
    ) {
        let delay = synapse.delay;
        let store = &mut self.partitions[partition];
        store.ensure_capacity(source);
        let connector = self.registry.append(store.take(source), synapse_type, synapse);
        store.set(source, connector);
        self.record_append(partition, synapse_type, delay);
    }

    fn record_append(&mut self, partition: usize, synapse_type: SynapseTypeId, delay: Delay) {
        let counts = &mut self.counts[partition];
        if counts.len() <= synapse_type.index() {
            counts.resize(synapse_type.index() + 1, 0);
        }
        counts[synapse_type.index()] += 1;

        if self.delay_extrema.len() <= synapse_type.index() {
            self.delay_extrema.resize(synapse_type.index() + 1, None);
        }
        let entry = &mut self.delay_extrema[synapse_type.index()];
        *entry = Some(match *entry {
            Some((lo, hi)) => (lo.min(delay), hi.max(delay)),
            None => (delay, delay),
        });
    }

    /// Enumerate connections, filtered by optional source id set, target id
    /// set and synapse type.
    ///
    /// With an explicit type the result is a single group; without one there
    /// is one group per type with matches (empty groups omitted). No ordering
    /// is guaranteed across partitions; within a partition results follow
    /// ascending source id, then insertion order. Source ids beyond a store's
    /// bounds are skipped silently.
    pub fn get_connections(
        &self,
        source: Option<&[NeuronId]>,
        target: Option<&[NeuronId]>,
        synapse_type: Option<SynapseTypeId>,
    ) -> Result<Vec<ConnectionGroup>> {
        let target_set: Option<AHashSet<NeuronId>> =
            target.map(|ids| ids.iter().copied().collect());
        match synapse_type {
            Some(kind) => {
                self.registry.validate_type(kind)?;
                Ok(vec![ConnectionGroup {
                    synapse_type: kind,
                    connections: self.collect_kind(kind, source, target_set.as_ref()),
                }])
            }
            None => {
                let mut groups = Vec::new();
                for idx in 0..self.registry.len() {
                    let kind = SynapseTypeId(idx);
                    let connections = self.collect_kind(kind, source, target_set.as_ref());
                    if !connections.is_empty() {
                        groups.push(ConnectionGroup {
                            synapse_type: kind,
                            connections,
                        });
                    }
                }
                Ok(groups)
            }
        }
    }

    /// Per-partition gather with a lock-free merge: every partition fills its
    /// own output vector, rayon concatenates them afterwards.
    fn collect_kind(
        &self,
        kind: SynapseTypeId,
        source: Option<&[NeuronId]>,
        targets: Option<&AHashSet<NeuronId>>,
    ) -> Vec<ConnectionDescriptor> {
        self.partitions
            .par_iter()
            .enumerate()
            .flat_map_iter(|(partition, store)| {
                let mut out = Vec::new();
                match source {
                    None => {
                        for (source_id, connector) in store.nonempty_iter() {
                            connector.collect_connections(source_id, targets, partition, kind, &mut out);
                        }
                    }
                    Some(ids) => {
                        for &source_id in ids {
                            if let Some(connector) = store.get(source_id) {
                                connector
                                    .collect_connections(source_id, targets, partition, kind, &mut out);
                            }
                        }
                    }
                }
                out
            })
            .collect()
    }

    /// Status of one synapse, addressed by (partition, source, type, port).
    /// The map gains `source` and `synapse_model` on top of the connector's
    /// own fields.
    ///
    /// # Panics
    /// Panics if `partition` is out of range.
    pub fn get_synapse_status(
        &self,
        source: NeuronId,
        synapse_type: SynapseTypeId,
        port: usize,
        partition: usize,
    ) -> Result<Map<String, Value>> {
        self.registry.validate_type(synapse_type)?;
        let connector = self.partitions[partition].get(source).ok_or(
            // No connector: no port is addressable for this source
            ConnectivityError::InvalidSynapseIndex { port, available: 0 },
        )?;
        let mut dict = connector.get_status(synapse_type, port)?;
        dict.insert("source".to_string(), json!(source.0));
        dict.insert(
            "synapse_model".to_string(),
            json!(self.registry.name_of(synapse_type)?),
        );
        Ok(dict)
    }

    /// Set one synapse's properties. Validation failures are re-wrapped with
    /// the synapse model, source and port so the caller gets an actionable
    /// message.
    ///
    /// # Panics
    /// Panics if `partition` is out of range.
    pub fn set_synapse_status(
        &mut self,
        source: NeuronId,
        synapse_type: SynapseTypeId,
        port: usize,
        partition: usize,
        dict: &Map<String, Value>,
    ) -> Result<()> {
        self.registry.validate_type(synapse_type)?;
        let prototype = self.registry.get(synapse_type)?;
        let connector = self.partitions[partition]
            .get_mut(source)
            .ok_or(ConnectivityError::InvalidSynapseIndex { port, available: 0 })?;
        connector
            .set_status(synapse_type, port, dict, prototype)
            .map_err(|err| match err {
                ConnectivityError::BadProperty(msg) => ConnectivityError::BadProperty(format!(
                    "Setting status of '{}' connecting from {} at port {}: {}",
                    prototype.name(),
                    source,
                    port,
                    msg
                )),
                other => other,
            })
    }

    /// Route a spike through the source's connector. A source that is out of
    /// range or has no outgoing connections is a silent no-op — "neuron
    /// fired, has no outgoing synapses" is a normal condition.
    ///
    /// # Panics
    /// Panics if `partition` is out of range.
    pub fn send(
        &self,
        partition: usize,
        source: NeuronId,
        event: &SpikeEvent,
        sink: &mut dyn EventSink,
    ) {
        if let Some(connector) = self.partitions[partition].get(source) {
            trace!(partition, source = source.0, "routing spike");
            connector.send(event, sink);
        }
    }

    /// Apply a modulated weight update across every partition and every
    /// non-empty slot; called once per simulation step while the modulatory
    /// source is active.
    pub fn trigger_update_weight(
        &mut self,
        vt_id: ModulatorId,
        events: &[ModulatorEvent],
        t_trig: SimTime,
    ) {
        let registry = &self.registry;
        for (partition, store) in self.partitions.iter_mut().enumerate() {
            for (_, connector) in store.nonempty_iter_mut() {
                connector.trigger_update_weight(vt_id, partition, events, t_trig, registry);
            }
        }
    }

    /// Remove the synapses from `source` onto `target` (all types, or one).
    /// Returns the number removed; clears the slot when the connector
    /// becomes empty.
    ///
    /// # Panics
    /// Panics if `partition` is out of range.
    pub fn disconnect(
        &mut self,
        source: NeuronId,
        target: NeuronId,
        partition: usize,
        synapse_type: Option<SynapseTypeId>,
    ) -> Result<usize> {
        if let Some(kind) = synapse_type {
            self.registry.validate_type(kind)?;
        }
        let store = &mut self.partitions[partition];
        let mut removed_per_kind = Vec::new();
        let mut now_empty = false;
        if let Some(connector) = store.get_mut(source) {
            let kinds: Vec<SynapseTypeId> = connector
                .kinds()
                .filter(|k| synapse_type.map_or(true, |s| s == *k))
                .collect();
            for kind in kinds {
                let removed = connector.remove_matching(target, Some(kind));
                if removed > 0 {
                    removed_per_kind.push((kind, removed));
                }
            }
            now_empty = connector.is_empty();
        }
        if now_empty {
            store.take(source);
        }

        let mut total = 0;
        for (kind, removed) in removed_per_kind {
            let counts = &mut self.counts[partition];
            if let Some(count) = counts.get_mut(kind.index()) {
                *count = count.saturating_sub(removed as u64);
            }
            total += removed;
        }
        Ok(total)
    }

    /// Release every partition's store and zero all aggregates. Idempotent:
    /// the post-reset state is indistinguishable from initial construction.
    pub fn reset(&mut self) {
        debug!("resetting connection stores");
        for store in &mut self.partitions {
            store.reset();
        }
        for counts in &mut self.counts {
            counts.clear();
        }
        self.delay_extrema.clear();
    }

    /// Live aggregate synapse count across all partitions and types
    pub fn get_num_connections(&self) -> usize {
        self.counts
            .iter()
            .flat_map(|per_kind| per_kind.iter())
            .sum::<u64>() as usize
    }

    pub fn num_connections_of(&self, synapse_type: SynapseTypeId) -> usize {
        self.counts
            .iter()
            .filter_map(|per_kind| per_kind.get(synapse_type.index()))
            .sum::<u64>() as usize
    }

    /// Smallest observed delay over types with at least one connection
    pub fn get_min_delay(&self) -> Option<Delay> {
        self.delay_extrema
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.num_connections_of(SynapseTypeId(*idx)) > 0)
            .filter_map(|(_, extrema)| extrema.map(|(lo, _)| lo))
            .min()
    }

    /// Largest observed delay over types with at least one connection
    pub fn get_max_delay(&self) -> Option<Delay> {
        self.delay_extrema
            .iter()
            .enumerate()
            .filter(|(idx, _)| self.num_connections_of(SynapseTypeId(*idx)) > 0)
            .filter_map(|(_, extrema)| extrema.map(|(_, hi)| hi))
            .max()
    }

    /// True iff any model with connections carries user-provided delay bounds
    pub fn get_user_set_delay_extrema(&self) -> bool {
        (0..self.registry.len()).any(|idx| {
            let kind = SynapseTypeId(idx);
            self.num_connections_of(kind) > 0
                && self
                    .registry
                    .get(kind)
                    .map(|p| p.user_set_delay_extrema())
                    .unwrap_or(false)
        })
    }

    /// Manager-level status introspection
    pub fn get_status(&self) -> Map<String, Value> {
        let mut dict = Map::new();
        dict.insert(
            "num_connections".to_string(),
            json!(self.get_num_connections()),
        );
        dict
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_type(manager: &ConnectionManager) -> SynapseTypeId {
        manager.registry().resolve_name("static_synapse").unwrap()
    }

    #[test]
    fn test_connect_maintains_live_count() {
        let mut manager = ConnectionManager::new(2);
        let kind = static_type(&manager);
        manager
            .connect(NeuronId(5), NeuronId(9), 0, kind, None, None)
            .unwrap();
        manager
            .connect(NeuronId(5), NeuronId(12), 0, kind, None, None)
            .unwrap();
        manager
            .connect(NeuronId(7), NeuronId(9), 1, kind, None, None)
            .unwrap();
        assert_eq!(manager.get_num_connections(), 3);
        assert_eq!(manager.num_connections_of(kind), 3);
        assert_eq!(manager.get_status()["num_connections"], json!(3));
    }

    #[test]
    fn test_connect_unknown_type_leaves_store_unchanged() {
        let mut manager = ConnectionManager::new(1);
        let err = manager
            .connect(NeuronId(5), NeuronId(9), 0, SynapseTypeId(99), None, None)
            .unwrap_err();
        assert_eq!(err, ConnectivityError::UnknownSynapseType(99));
        assert_eq!(manager.get_num_connections(), 0);
        assert!(!manager.partition(0).unwrap().exists(NeuronId(5)));
    }

    #[test]
    fn test_delay_extrema_track_observed_values() {
        let mut manager = ConnectionManager::new(1);
        let kind = static_type(&manager);
        assert_eq!(manager.get_min_delay(), None);
        manager
            .connect(NeuronId(1), NeuronId(2), 0, kind, Some(1.5), None)
            .unwrap();
        manager
            .connect(NeuronId(1), NeuronId(3), 0, kind, Some(4.0), None)
            .unwrap();
        assert_eq!(manager.get_min_delay(), Some(Delay::from_ms(1.5)));
        assert_eq!(manager.get_max_delay(), Some(Delay::from_ms(4.0)));
    }

    #[test]
    fn test_user_set_delay_extrema_requires_connections() {
        let mut manager = ConnectionManager::new(1);
        let kind = static_type(&manager);
        manager
            .registry_mut()
            .set_delay_bounds(kind, Delay::from_ms(0.5), Delay::from_ms(10.0))
            .unwrap();
        assert!(!manager.get_user_set_delay_extrema());
        manager
            .connect(NeuronId(1), NeuronId(2), 0, kind, Some(1.0), None)
            .unwrap();
        assert!(manager.get_user_set_delay_extrema());
    }

    #[test]
    fn test_disconnect_decrements_and_clears_slot() {
        let mut manager = ConnectionManager::new(1);
        let kind = static_type(&manager);
        manager
            .connect(NeuronId(5), NeuronId(9), 0, kind, None, None)
            .unwrap();
        manager
            .connect(NeuronId(5), NeuronId(12), 0, kind, None, None)
            .unwrap();

        assert_eq!(
            manager.disconnect(NeuronId(5), NeuronId(9), 0, Some(kind)).unwrap(),
            1
        );
        assert_eq!(manager.get_num_connections(), 1);
        assert!(manager.partition(0).unwrap().exists(NeuronId(5)));

        assert_eq!(manager.disconnect(NeuronId(5), NeuronId(12), 0, None).unwrap(), 1);
        assert_eq!(manager.get_num_connections(), 0);
        assert!(!manager.partition(0).unwrap().exists(NeuronId(5)));

        // Disconnecting an absent pair is a no-op
        assert_eq!(manager.disconnect(NeuronId(5), NeuronId(9), 0, None).unwrap(), 0);
    }
}
