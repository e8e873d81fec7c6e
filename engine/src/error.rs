use crate::{
    components::GateKind,
    types::{LineId, PinId, ID},
};

/// Everything that can go wrong while building or driving a circuit.
///
/// All variants except [`SimError::Divergence`] and
/// [`SimError::TruthTableMismatch`] are configuration errors: the caller
/// asked for something the circuit cannot represent, and nothing was
/// mutated.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("no gate with id {0}")]
    UnknownGate(ID),

    #[error("no pin {0}")]
    UnknownPin(PinId),

    #[error("no line with id {0}")]
    UnknownLine(LineId),

    #[error("{kind} gate needs {expected} inputs, got {got}")]
    InputCount {
        kind: GateKind,
        expected: &'static str,
        got: usize,
    },

    #[error("pin {0} is not an output pin")]
    NotAnOutput(PinId),

    #[error("pin {0} is not an input pin")]
    NotAnInput(PinId),

    #[error("line from {from} to {to} loops back into its own gate")]
    SelfLoop { from: PinId, to: PinId },

    #[error("pin {pin} already carries line {line}")]
    AlreadyConnected { pin: PinId, line: LineId },

    #[error("gate {0} is not a source and cannot be forced")]
    NotASource(ID),

    #[error("pin {0} is driven by a line and cannot be set directly")]
    DrivenInput(PinId),

    #[error("gate {gate} has {inputs} inputs, truth tables are limited to {limit}")]
    TooManyInputs { gate: ID, inputs: usize, limit: usize },

    #[error("propagation did not settle within {limit} steps (last pin {pin})")]
    Divergence { limit: usize, pin: PinId },

    #[error("truth table row {row} with inputs {inputs:?}: expected {expected:?}, got {actual:?}")]
    TruthTableMismatch {
        row: usize,
        inputs: Vec<bool>,
        expected: Vec<bool>,
        actual: Vec<bool>,
    },
}
