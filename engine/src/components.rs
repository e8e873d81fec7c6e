use std::fmt;

use crate::{
    error::SimError,
    pin::{Pin, Reaction},
    types::{Direction, PinId, ID},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GateKind {
    And,
    Or,
    /// circuit boundary: no inputs, one externally forced output
    Source,
    /// circuit boundary: one input, no outputs
    Sink,
}

impl GateKind {
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::And => "AND",
            GateKind::Or => "OR",
            GateKind::Source => "SOURCE",
            GateKind::Sink => "SINK",
        }
    }
    pub fn symbol(&self) -> &'static str {
        match self {
            GateKind::And => ".",
            GateKind::Or => "+",
            GateKind::Source => ">",
            GateKind::Sink => "<",
        }
    }
    pub fn n_outputs(&self) -> usize {
        match self {
            GateKind::Sink => 0,
            _ => 1,
        }
    }

    fn check_inputs(&self, n_inp: usize) -> Result<(), SimError> {
        let expected = match self {
            GateKind::And | GateKind::Or if n_inp == 0 => "at least 1",
            GateKind::Source if n_inp != 0 => "exactly 0",
            GateKind::Sink if n_inp != 1 => "exactly 1",
            _ => return Ok(()),
        };
        Err(SimError::InputCount {
            kind: *self,
            expected,
            got: n_inp,
        })
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug)]
pub struct Gate {
    id: ID,
    kind: GateKind,
    pub label: String,
    // forced level, only read by sources
    level: bool,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
}

impl Gate {
    /// Builds the gate with all pins low and registers the gate's
    /// reactions on every pin.
    pub(crate) fn new(id: ID, kind: GateKind, n_inp: usize, label: &str) -> Result<Gate, SimError> {
        kind.check_inputs(n_inp)?;
        let mut g = Gate {
            id,
            kind,
            label: label.to_owned(),
            level: false,
            inputs: (0..n_inp).map(|i| Pin::new(PinId::input(id, i))).collect(),
            outputs: (0..kind.n_outputs())
                .map(|i| Pin::new(PinId::output(id, i)))
                .collect(),
        };
        for p in g.inputs.iter_mut() {
            p.subscribe_value(Reaction::Refresh);
            p.subscribe_line(Reaction::ReloadFromLine);
        }
        for p in g.outputs.iter_mut() {
            p.subscribe_value(Reaction::ForwardAlongLine);
        }
        Ok(g)
    }

    pub fn id(&self) -> ID {
        self.id
    }
    pub fn kind(&self) -> GateKind {
        self.kind
    }
    /// The forced level of a source; meaningless for other kinds.
    pub fn level(&self) -> bool {
        self.level
    }
    pub(crate) fn set_level(&mut self, level: bool) {
        self.level = level;
    }
    pub fn inputs(&self) -> &[Pin] {
        &self.inputs
    }
    pub fn outputs(&self) -> &[Pin] {
        &self.outputs
    }
    pub fn n_inputs(&self) -> usize {
        self.inputs.len()
    }
    pub fn n_outputs(&self) -> usize {
        self.outputs.len()
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        if id.gate != self.id {
            return None;
        }
        match id.direction {
            Direction::Input => self.inputs.get(id.index),
            Direction::Output => self.outputs.get(id.index),
        }
    }
    pub(crate) fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        if id.gate != self.id {
            return None;
        }
        match id.direction {
            Direction::Input => self.inputs.get_mut(id.index),
            Direction::Output => self.outputs.get_mut(id.index),
        }
    }

    pub fn input_states(&self) -> Vec<bool> {
        self.inputs.iter().map(Pin::state).collect()
    }
    pub fn output_states(&self) -> Vec<bool> {
        self.outputs.iter().map(Pin::state).collect()
    }

    /// Pure evaluation over an arbitrary input vector. Never looks at
    /// the live pins.
    pub fn evaluate(&self, inputs: &[bool]) -> Vec<bool> {
        match self.kind {
            GateKind::And => vec![inputs.iter().all(|v| *v)],
            GateKind::Or => vec![inputs.iter().any(|v| *v)],
            GateKind::Source => vec![self.level],
            GateKind::Sink => Vec::new(),
        }
    }

    pub fn evaluate_self(&self) -> Vec<bool> {
        self.evaluate(&self.input_states())
    }

    /// Unregisters every reaction the gate put on its pins.
    pub(crate) fn release(&mut self) {
        for p in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            p.release();
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = |pins: &[Pin]| {
            pins.iter()
                .map(|p| if p.state() { '1' } else { '0' })
                .collect::<String>()
        };
        let state_str = match self.outputs.first() {
            Some(p) if p.state() => "\x1b[32mON\x1b[0m", // Green text for ON
            Some(_) => "\x1b[31mOFF\x1b[0m",            // Red text for OFF
            None => "-",
        };
        write!(
            f,
            "{} {} ({} input{}) - Symbol: \x1b[33m{}\x1b[0m - In: [{}] - State: {}",
            self.kind,
            self.label,
            self.inputs.len(),
            if self.inputs.len() == 1 { "" } else { "s" },
            self.kind.symbol(),
            bits(self.inputs.as_slice()),
            state_str,
        )
    }
}
