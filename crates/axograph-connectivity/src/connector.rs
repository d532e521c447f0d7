// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connector: all outgoing synapses of one source on one partition
//!
//! Synapses are grouped by synapse type; the common case is a single group.
//! A synapse's port is its position within the group of its type, assigned
//! at insertion and stable across later appends.
//!
//! Growth contract: `append` consumes the connector and returns the (possibly
//! regrouped) value. The caller must reinstall the return value into the
//! store slot the connector was taken from; move semantics make skipping the
//! reinstall a compile error rather than a dangling slot.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use axograph_neural::synapse::{PlasticityState, Synapse};
use axograph_neural::types::{
    ConnectivityError, Delay, ModulatorEvent, ModulatorId, NeuronId, Result, SimTime, SpikeDelivery,
    SpikeEvent, SynapseTypeId,
};

use crate::registry::{modulator_property, SynapsePrototype, SynapseRegistry};
use crate::traits::EventSink;

/// Descriptor of one stored synapse, as returned by connection queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionDescriptor {
    pub source: NeuronId,
    pub target: NeuronId,
    pub partition: usize,
    pub synapse_type: SynapseTypeId,
    pub port: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct SynapseGroup {
    kind: SynapseTypeId,
    synapses: Vec<Synapse>,
}

/// Owned container of one source's outgoing synapses
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    groups: Vec<SynapseGroup>,
}

impl Connector {
    /// A connector is created with its first synapse; it is never empty
    pub fn new(kind: SynapseTypeId, synapse: Synapse) -> Self {
        Self {
            groups: vec![SynapseGroup {
                kind,
                synapses: vec![synapse],
            }],
        }
    }

    /// Add one synapse, growing a new type group on first heterogeneous use.
    ///
    /// The returned value is the slot's new owner.
    #[must_use]
    pub fn append(mut self, kind: SynapseTypeId, synapse: Synapse) -> Self {
        match self.groups.iter_mut().find(|g| g.kind == kind) {
            Some(group) => group.synapses.push(synapse),
            None => self.groups.push(SynapseGroup {
                kind,
                synapses: vec![synapse],
            }),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total synapse count across all type groups
    pub fn num_connections(&self) -> usize {
        self.groups.iter().map(|g| g.synapses.len()).sum()
    }

    pub fn num_connections_of(&self, kind: SynapseTypeId) -> usize {
        self.group(kind).map_or(0, |g| g.synapses.len())
    }

    /// Synapse types stored here, in first-use order
    pub fn kinds(&self) -> impl Iterator<Item = SynapseTypeId> + '_ {
        self.groups.iter().map(|g| g.kind)
    }

    fn group(&self, kind: SynapseTypeId) -> Option<&SynapseGroup> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    fn group_mut(&mut self, kind: SynapseTypeId) -> Option<&mut SynapseGroup> {
        self.groups.iter_mut().find(|g| g.kind == kind)
    }

    /// Positional access; `TypeMismatch` when no synapse of `kind` is stored,
    /// `InvalidSynapseIndex` when `port` is out of range for that type
    pub fn synapse(&self, kind: SynapseTypeId, port: usize) -> Result<&Synapse> {
        let group = self
            .group(kind)
            .ok_or(ConnectivityError::TypeMismatch {
                requested: kind.index(),
            })?;
        group
            .synapses
            .get(port)
            .ok_or(ConnectivityError::InvalidSynapseIndex {
                port,
                available: group.synapses.len(),
            })
    }

    fn synapse_mut(&mut self, kind: SynapseTypeId, port: usize) -> Result<&mut Synapse> {
        let group = self
            .group_mut(kind)
            .ok_or(ConnectivityError::TypeMismatch {
                requested: kind.index(),
            })?;
        let available = group.synapses.len();
        group
            .synapses
            .get_mut(port)
            .ok_or(ConnectivityError::InvalidSynapseIndex { port, available })
    }

    /// Property map of one synapse's tunable parameters
    pub fn get_status(&self, kind: SynapseTypeId, port: usize) -> Result<Map<String, Value>> {
        let synapse = self.synapse(kind, port)?;
        let mut dict = Map::new();
        dict.insert("target".to_string(), json!(synapse.target.0));
        dict.insert("weight".to_string(), json!(synapse.weight));
        dict.insert("delay".to_string(), json!(synapse.delay.as_ms()));
        dict.insert("port".to_string(), json!(port));
        match &synapse.state {
            PlasticityState::Static => {}
            PlasticityState::Stdp { trace } => {
                dict.insert("trace".to_string(), json!(trace));
            }
            PlasticityState::Modulated {
                modulator,
                eligibility,
                ..
            } => {
                dict.insert("modulator".to_string(), json!(modulator.0));
                dict.insert("eligibility".to_string(), json!(eligibility));
            }
        }
        Ok(dict)
    }

    /// Apply a property map to one synapse.
    ///
    /// `weight`, `delay` (bounds-checked against the model), and the
    /// state-specific keys are settable; `target`/`port` are read-only; any
    /// other key is rejected. Validation runs before any field is written,
    /// so a rejected map leaves the synapse untouched.
    pub fn set_status(
        &mut self,
        kind: SynapseTypeId,
        port: usize,
        dict: &Map<String, Value>,
        prototype: &SynapsePrototype,
    ) -> Result<()> {
        // Validation pass
        let synapse = self.synapse(kind, port)?;
        for (key, value) in dict {
            match key.as_str() {
                "weight" => {
                    settable_number(value, key, prototype)?;
                }
                "delay" => {
                    let ms = settable_number(value, key, prototype)?;
                    let delay = Delay::from_ms(ms);
                    if delay < prototype.min_delay() || delay > prototype.max_delay() {
                        return Err(ConnectivityError::BadProperty(format!(
                            "Delay {} outside the bounds [{}, {}] of synapse model '{}'",
                            delay,
                            prototype.min_delay(),
                            prototype.max_delay(),
                            prototype.name()
                        )));
                    }
                }
                "trace" if matches!(synapse.state, PlasticityState::Stdp { .. }) => {
                    settable_number(value, key, prototype)?;
                }
                "eligibility" if matches!(synapse.state, PlasticityState::Modulated { .. }) => {
                    settable_number(value, key, prototype)?;
                }
                "modulator" if matches!(synapse.state, PlasticityState::Modulated { .. }) => {
                    modulator_property(value, prototype.name())?;
                }
                "target" | "port" => {
                    return Err(ConnectivityError::BadProperty(format!(
                        "Property '{}' is read-only",
                        key
                    )))
                }
                other => {
                    return Err(ConnectivityError::BadProperty(format!(
                        "Unknown property '{}' for synapse model '{}'",
                        other,
                        prototype.name()
                    )))
                }
            }
        }

        // Write pass (infallible after validation)
        let synapse = self.synapse_mut(kind, port)?;
        for (key, value) in dict {
            match key.as_str() {
                "weight" => synapse.weight = value.as_f64().unwrap_or(synapse.weight),
                "delay" => {
                    if let Some(ms) = value.as_f64() {
                        synapse.delay = Delay::from_ms(ms);
                    }
                }
                "trace" => {
                    if let PlasticityState::Stdp { trace } = &mut synapse.state {
                        *trace = value.as_f64().unwrap_or(*trace);
                    }
                }
                "eligibility" => {
                    if let PlasticityState::Modulated { eligibility, .. } = &mut synapse.state {
                        *eligibility = value.as_f64().unwrap_or(*eligibility);
                    }
                }
                "modulator" => {
                    if let PlasticityState::Modulated { modulator, .. } = &mut synapse.state {
                        if let Ok(id) = modulator_property(value, prototype.name()) {
                            *modulator = id;
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Fan one spike out into per-synapse deliveries.
    ///
    /// Every stored synapse is deliverable; the only side effect is the
    /// `deliver` call into the sink.
    pub fn send(&self, event: &SpikeEvent, sink: &mut dyn EventSink) {
        for group in &self.groups {
            for synapse in &group.synapses {
                sink.deliver(SpikeDelivery {
                    source: event.source,
                    target: synapse.target,
                    weight: synapse.weight,
                    delay: synapse.delay,
                    multiplicity: event.multiplicity,
                    stamp: event.stamp,
                });
            }
        }
    }

    /// Eligibility-trace weight update for every modulated synapse listening
    /// to `vt_id`. Returns the number of synapses updated (0 = no-op).
    pub fn trigger_update_weight(
        &mut self,
        vt_id: ModulatorId,
        partition: usize,
        events: &[ModulatorEvent],
        t_trig: SimTime,
        registry: &SynapseRegistry,
    ) -> usize {
        let activity: f64 = events.iter().map(|e| e.multiplicity).sum();
        let mut updated = 0;
        for group in &mut self.groups {
            let modulation = match registry.get(group.kind) {
                Ok(prototype) => *prototype.modulation(),
                Err(_) => continue,
            };
            for synapse in &mut group.synapses {
                let Synapse { weight, state, .. } = synapse;
                if let PlasticityState::Modulated {
                    modulator,
                    eligibility,
                    last_update,
                } = state
                {
                    if *modulator != vt_id {
                        continue;
                    }
                    let dt = t_trig - *last_update;
                    if dt > 0.0 {
                        *eligibility *= (-dt / modulation.tau_eligibility).exp();
                    }
                    *weight = (*weight + modulation.learning_rate * *eligibility * activity)
                        .max(0.0);
                    *last_update = t_trig;
                    updated += 1;
                }
            }
        }
        if updated > 0 {
            tracing::trace!(
                partition,
                modulator = vt_id.0,
                updated,
                "applied modulated weight update"
            );
        }
        updated
    }

    /// Append descriptors for synapses of `kind` (optionally restricted to a
    /// target set) in storage order
    pub fn collect_connections(
        &self,
        source: NeuronId,
        targets: Option<&ahash::AHashSet<NeuronId>>,
        partition: usize,
        kind: SynapseTypeId,
        out: &mut Vec<ConnectionDescriptor>,
    ) {
        let Some(group) = self.group(kind) else {
            return;
        };
        for (port, synapse) in group.synapses.iter().enumerate() {
            if targets.is_some_and(|set| !set.contains(&synapse.target)) {
                continue;
            }
            out.push(ConnectionDescriptor {
                source,
                target: synapse.target,
                partition,
                synapse_type: kind,
                port,
            });
        }
    }

    /// Remove synapses onto `target`, restricted to `kind` when given.
    /// Empty groups are dropped; the caller clears the slot when the whole
    /// connector becomes empty. Returns the number removed.
    pub fn remove_matching(&mut self, target: NeuronId, kind: Option<SynapseTypeId>) -> usize {
        let mut removed = 0;
        for group in &mut self.groups {
            if kind.is_some_and(|k| k != group.kind) {
                continue;
            }
            let before = group.synapses.len();
            group.synapses.retain(|s| s.target != target);
            removed += before - group.synapses.len();
        }
        self.groups.retain(|g| !g.synapses.is_empty());
        removed
    }
}

fn settable_number(value: &Value, key: &str, prototype: &SynapsePrototype) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        ConnectivityError::BadProperty(format!(
            "Property '{}' of synapse model '{}' must be a number",
            key,
            prototype.name()
        ))
    })
}
