use crate::types::{DEFAULT_GATE_INPUTS, DEFAULT_MAX_PROPAGATION_DEPTH};

/// Tunables of a [`BCircuit`](crate::circuit::BCircuit).
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// Nested pin updates allowed in one propagation before it is
    /// reported as a divergence.
    pub max_propagation_depth: usize,
    /// Input count of AND/OR gates added through `add_component`.
    pub default_gate_inputs: u16,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            max_propagation_depth: DEFAULT_MAX_PROPAGATION_DEPTH,
            default_gate_inputs: DEFAULT_GATE_INPUTS,
        }
    }
}

impl SimConfig {
    pub fn with_max_propagation_depth(mut self, depth: usize) -> Self {
        self.max_propagation_depth = depth;
        self
    }
    pub fn with_default_gate_inputs(mut self, n: u16) -> Self {
        self.default_gate_inputs = n;
        self
    }
}
