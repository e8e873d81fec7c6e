use std::fmt;

pub type ID = u32;
pub type LineId = u32;
pub type ObserverId = u32;

pub const DEFAULT_GATE_INPUTS: u16 = 2;
pub const DEFAULT_MAX_PROPAGATION_DEPTH: usize = 4096;
// 2^16 rows is already far beyond anything worth displaying
pub const MAX_TRUTH_TABLE_INPUTS: usize = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Input,
    Output,
}

/// Addresses one pin of one gate. Pins never own their gate; the circuit
/// resolves this back to the pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinId {
    pub gate: ID,
    pub direction: Direction,
    pub index: usize,
}

impl PinId {
    pub fn input(gate: ID, index: usize) -> PinId {
        PinId {
            gate,
            direction: Direction::Input,
            index,
        }
    }
    pub fn output(gate: ID, index: usize) -> PinId {
        PinId {
            gate,
            direction: Direction::Output,
            index,
        }
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.direction {
            Direction::Input => "in",
            Direction::Output => "out",
        };
        write!(f, "#{}.{}{}", self.gate, side, self.index)
    }
}
