// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Synapse prototype registry
//!
//! One prototype per synapse model: name, kind, parameter defaults and the
//! model-wide delay bounds. The registry owns synapse construction (which is
//! where all validation happens) and the allocate-or-grow step that turns an
//! optional existing connector plus one new synapse into the connector the
//! caller must reinstall.

use ahash::AHashMap;
use serde_json::{Map, Value};

use axograph_neural::synapse::{PlasticityState, Synapse};
use axograph_neural::types::{
    ConnectivityError, Delay, ModulatorId, NeuronId, Result, SynapseTypeId,
};

use crate::connector::Connector;

/// Closed set of synapse kinds supported by the core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynapseKind {
    /// Fixed weight
    Static,
    /// Spike-timing-dependent plasticity
    Stdp,
    /// Neuromodulated plasticity (volume-transmitter driven)
    Modulated,
}

/// Model-wide parameters of the modulated weight-update rule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModulationParams {
    /// Eligibility trace decay time constant in milliseconds
    pub tau_eligibility: f64,
    /// Weight change per unit eligibility and unit modulator activity
    pub learning_rate: f64,
}

impl Default for ModulationParams {
    fn default() -> Self {
        Self {
            tau_eligibility: 1000.0,
            learning_rate: 1.0,
        }
    }
}

/// Per-model factory object and shared parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SynapsePrototype {
    name: String,
    kind: SynapseKind,
    default_weight: f64,
    default_delay: Delay,
    min_delay: Delay,
    max_delay: Delay,
    user_set_delay_extrema: bool,
    modulation: ModulationParams,
}

impl SynapsePrototype {
    pub fn new(name: impl Into<String>, kind: SynapseKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default_weight: 1.0,
            default_delay: Delay::from_ms(1.0),
            min_delay: Delay::resolution(),
            max_delay: Delay::from_ms(100.0),
            user_set_delay_extrema: false,
            modulation: ModulationParams::default(),
        }
    }

    pub fn with_defaults(mut self, weight: f64, delay: Delay) -> Self {
        self.default_weight = weight;
        self.default_delay = delay;
        self
    }

    pub fn with_modulation(mut self, modulation: ModulationParams) -> Self {
        self.modulation = modulation;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SynapseKind {
        self.kind
    }

    pub fn min_delay(&self) -> Delay {
        self.min_delay
    }

    pub fn max_delay(&self) -> Delay {
        self.max_delay
    }

    pub fn user_set_delay_extrema(&self) -> bool {
        self.user_set_delay_extrema
    }

    pub fn modulation(&self) -> &ModulationParams {
        &self.modulation
    }
}

/// Registry of all synapse models known to one connection manager
#[derive(Debug, Clone)]
pub struct SynapseRegistry {
    prototypes: Vec<SynapsePrototype>,
    by_name: AHashMap<String, SynapseTypeId>,
}

impl Default for SynapseRegistry {
    fn default() -> Self {
        Self::with_builtin_models()
    }
}

impl SynapseRegistry {
    /// Registry with no models (extend via `register`)
    pub fn empty() -> Self {
        Self {
            prototypes: Vec::new(),
            by_name: AHashMap::new(),
        }
    }

    /// Registry preloaded with the built-in models:
    /// `static_synapse`, `stdp_synapse`, `stdp_dopamine_synapse`
    pub fn with_builtin_models() -> Self {
        let mut registry = Self::empty();
        registry
            .register(SynapsePrototype::new("static_synapse", SynapseKind::Static))
            .expect("Builtin model names are unique");
        registry
            .register(SynapsePrototype::new("stdp_synapse", SynapseKind::Stdp))
            .expect("Builtin model names are unique");
        registry
            .register(SynapsePrototype::new(
                "stdp_dopamine_synapse",
                SynapseKind::Modulated,
            ))
            .expect("Builtin model names are unique");
        registry
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    /// The model used when a connect call does not name one
    /// (the first registered model)
    pub fn default_type(&self) -> SynapseTypeId {
        SynapseTypeId(0)
    }

    /// Add a model; errors with `BadProperty` on a duplicate name
    pub fn register(&mut self, prototype: SynapsePrototype) -> Result<SynapseTypeId> {
        if self.by_name.contains_key(prototype.name()) {
            return Err(ConnectivityError::BadProperty(format!(
                "Synapse model '{}' is already registered",
                prototype.name()
            )));
        }
        let id = SynapseTypeId(self.prototypes.len());
        self.by_name.insert(prototype.name().to_string(), id);
        self.prototypes.push(prototype);
        Ok(id)
    }

    pub fn validate_type(&self, id: SynapseTypeId) -> Result<()> {
        if id.index() < self.prototypes.len() {
            Ok(())
        } else {
            Err(ConnectivityError::UnknownSynapseType(id.index()))
        }
    }

    pub fn get(&self, id: SynapseTypeId) -> Result<&SynapsePrototype> {
        self.prototypes
            .get(id.index())
            .ok_or(ConnectivityError::UnknownSynapseType(id.index()))
    }

    pub fn name_of(&self, id: SynapseTypeId) -> Result<&str> {
        self.get(id).map(SynapsePrototype::name)
    }

    pub fn resolve_name(&self, name: &str) -> Result<SynapseTypeId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ConnectivityError::UnknownModelName(name.to_string()))
    }

    /// Set a model's delay bounds and mark them user-provided
    pub fn set_delay_bounds(&mut self, id: SynapseTypeId, min: Delay, max: Delay) -> Result<()> {
        self.validate_type(id)?;
        if min > max {
            return Err(ConnectivityError::BadProperty(format!(
                "Delay bounds [{}, {}] are inverted",
                min, max
            )));
        }
        let prototype = &mut self.prototypes[id.index()];
        prototype.min_delay = min;
        prototype.max_delay = max;
        prototype.user_set_delay_extrema = true;
        Ok(())
    }

    /// Build one synapse record, applying model defaults for omitted
    /// parameters and validating the delay against the model bounds.
    ///
    /// All fallible work of a connect call happens here, before any store
    /// slot is touched; a rejected connect therefore leaves the store
    /// unchanged.
    pub fn make_synapse(
        &self,
        id: SynapseTypeId,
        target: NeuronId,
        delay_ms: Option<f64>,
        weight: Option<f64>,
    ) -> Result<Synapse> {
        let prototype = self.get(id)?;
        let delay = delay_ms.map(Delay::from_ms).unwrap_or(prototype.default_delay);
        if delay < prototype.min_delay || delay > prototype.max_delay {
            return Err(ConnectivityError::BadProperty(format!(
                "Delay {} outside the bounds [{}, {}] of synapse model '{}'",
                delay,
                prototype.min_delay,
                prototype.max_delay,
                prototype.name()
            )));
        }
        let weight = weight.unwrap_or(prototype.default_weight);
        let state = match prototype.kind {
            SynapseKind::Static => PlasticityState::Static,
            SynapseKind::Stdp => PlasticityState::Stdp { trace: 0.0 },
            SynapseKind::Modulated => PlasticityState::Modulated {
                modulator: ModulatorId(0),
                eligibility: 0.0,
                last_update: 0.0,
            },
        };
        Ok(Synapse::new(target, weight, delay, state))
    }

    /// Dictionary-parameterized synapse construction.
    ///
    /// Recognized keys: `weight`, `delay` (ms), `trace` (STDP models),
    /// `modulator` and `eligibility` (modulated models). Any other key is
    /// rejected with `BadProperty` naming the key and the model.
    pub fn make_synapse_from_params(
        &self,
        id: SynapseTypeId,
        target: NeuronId,
        params: &Map<String, Value>,
    ) -> Result<Synapse> {
        let prototype = self.get(id)?;
        let mut weight = None;
        let mut delay = None;
        let mut trace = None;
        let mut modulator = None;
        let mut eligibility = None;

        for (key, value) in params {
            match key.as_str() {
                "weight" => weight = Some(number_property(value, key, prototype.name())?),
                "delay" => delay = Some(number_property(value, key, prototype.name())?),
                "trace" if prototype.kind == SynapseKind::Stdp => {
                    trace = Some(number_property(value, key, prototype.name())?)
                }
                "modulator" if prototype.kind == SynapseKind::Modulated => {
                    modulator = Some(modulator_property(value, prototype.name())?);
                }
                "eligibility" if prototype.kind == SynapseKind::Modulated => {
                    eligibility = Some(number_property(value, key, prototype.name())?)
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

        let mut synapse = self.make_synapse(id, target, delay, weight)?;
        match &mut synapse.state {
            PlasticityState::Static => {}
            PlasticityState::Stdp { trace: t } => {
                if let Some(v) = trace {
                    *t = v;
                }
            }
            PlasticityState::Modulated {
                modulator: m,
                eligibility: e,
                ..
            } => {
                if let Some(v) = modulator {
                    *m = v;
                }
                if let Some(v) = eligibility {
                    *e = v;
                }
            }
        }
        Ok(synapse)
    }

    /// Allocate-or-grow: install one synapse into an existing connector, or
    /// create a fresh connector when the source had none.
    ///
    /// Infallible by construction: the synapse was validated by
    /// `make_synapse`. The returned connector is the slot's new owner and
    /// must be reinstalled by the caller.
    #[must_use]
    pub fn append(
        &self,
        existing: Option<Connector>,
        id: SynapseTypeId,
        synapse: Synapse,
    ) -> Connector {
        match existing {
            Some(connector) => connector.append(id, synapse),
            None => Connector::new(id, synapse),
        }
    }
}

fn number_property(value: &Value, key: &str, model: &str) -> Result<f64> {
    value.as_f64().ok_or_else(|| {
        ConnectivityError::BadProperty(format!(
            "Property '{}' of synapse model '{}' must be a number",
            key, model
        ))
    })
}

/// Modulator ids are 32-bit; out-of-range values are rejected, never wrapped
pub(crate) fn modulator_property(value: &Value, model: &str) -> Result<ModulatorId> {
    value
        .as_u64()
        .and_then(|raw| u32::try_from(raw).ok())
        .map(ModulatorId)
        .ok_or_else(|| {
            ConnectivityError::BadProperty(format!(
                "Property 'modulator' of synapse model '{}' must be an unsigned 32-bit integer",
                model
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_models() {
        let registry = SynapseRegistry::with_builtin_models();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.resolve_name("static_synapse").unwrap(),
            registry.default_type()
        );
        assert_eq!(
            registry.resolve_name("stdp_dopamine_synapse").unwrap(),
            SynapseTypeId(2)
        );
    }

    #[test]
    fn test_unknown_model_name() {
        let registry = SynapseRegistry::with_builtin_models();
        assert_eq!(
            registry.resolve_name("quantal_synapse"),
            Err(ConnectivityError::UnknownModelName(
                "quantal_synapse".to_string()
            ))
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = SynapseRegistry::with_builtin_models();
        let err = registry
            .register(SynapsePrototype::new("static_synapse", SynapseKind::Static))
            .unwrap_err();
        assert!(matches!(err, ConnectivityError::BadProperty(_)));
    }

    #[test]
    fn test_make_synapse_applies_defaults() {
        let registry = SynapseRegistry::with_builtin_models();
        let syn = registry
            .make_synapse(registry.default_type(), NeuronId(9), None, None)
            .unwrap();
        assert_eq!(syn.weight, 1.0);
        assert_eq!(syn.delay, Delay::from_ms(1.0));
    }

    #[test]
    fn test_make_synapse_rejects_out_of_bounds_delay() {
        let registry = SynapseRegistry::with_builtin_models();
        let err = registry
            .make_synapse(registry.default_type(), NeuronId(9), Some(1e6), None)
            .unwrap_err();
        assert!(matches!(err, ConnectivityError::BadProperty(_)));
    }

    #[test]
    fn test_set_delay_bounds_marks_user_set() {
        let mut registry = SynapseRegistry::with_builtin_models();
        let id = registry.default_type();
        assert!(!registry.get(id).unwrap().user_set_delay_extrema());
        registry
            .set_delay_bounds(id, Delay::from_ms(0.5), Delay::from_ms(5.0))
            .unwrap();
        assert!(registry.get(id).unwrap().user_set_delay_extrema());
        assert!(registry
            .make_synapse(id, NeuronId(1), Some(10.0), None)
            .is_err());
    }

    #[test]
    fn test_params_unknown_key_rejected() {
        let registry = SynapseRegistry::with_builtin_models();
        let mut params = Map::new();
        params.insert("colour".to_string(), json!(1.0));
        let err = registry
            .make_synapse_from_params(registry.default_type(), NeuronId(2), &params)
            .unwrap_err();
        assert_eq!(
            err,
            ConnectivityError::BadProperty(
                "Unknown property 'colour' for synapse model 'static_synapse'".to_string()
            )
        );
    }

    #[test]
    fn test_params_modulator_only_on_modulated_models() {
        let registry = SynapseRegistry::with_builtin_models();
        let mut params = Map::new();
        params.insert("modulator".to_string(), json!(7));

        // Accepted on the dopamine model
        let modulated = registry.resolve_name("stdp_dopamine_synapse").unwrap();
        let syn = registry
            .make_synapse_from_params(modulated, NeuronId(2), &params)
            .unwrap();
        assert!(matches!(
            syn.state,
            PlasticityState::Modulated {
                modulator: ModulatorId(7),
                ..
            }
        ));

        // Rejected on the static model
        assert!(registry
            .make_synapse_from_params(registry.default_type(), NeuronId(2), &params)
            .is_err());
    }

    #[test]
    fn test_params_modulator_beyond_u32_rejected() {
        let registry = SynapseRegistry::with_builtin_models();
        let modulated = registry.resolve_name("stdp_dopamine_synapse").unwrap();
        let mut params = Map::new();
        // Would wrap to ModulatorId(7) if narrowed blindly
        params.insert("modulator".to_string(), json!(u32::MAX as u64 + 8));
        let err = registry
            .make_synapse_from_params(modulated, NeuronId(2), &params)
            .unwrap_err();
        assert_eq!(
            err,
            ConnectivityError::BadProperty(
                "Property 'modulator' of synapse model 'stdp_dopamine_synapse' \
                 must be an unsigned 32-bit integer"
                    .to_string()
            )
        );
    }
}
