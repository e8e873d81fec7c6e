use crate::{
    error::SimError,
    types::{Direction, LineId, PinId},
};

/// A wire from one output pin to one input pin of another gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Line {
    pub id: LineId,
    pub from: PinId,
    pub to: PinId,
}

impl Line {
    /// Checks the endpoint directions only; whether the pins exist or are
    /// free is the circuit's business.
    pub fn new(id: LineId, from: PinId, to: PinId) -> Result<Line, SimError> {
        if from.direction != Direction::Output {
            return Err(SimError::NotAnOutput(from));
        }
        if to.direction != Direction::Input {
            return Err(SimError::NotAnInput(to));
        }
        if from.gate == to.gate {
            return Err(SimError::SelfLoop { from, to });
        }
        Ok(Line { id, from, to })
    }

    /// Level seen at the destination: an absent line reads low.
    pub fn carry(line: Option<&Line>, source_state: bool) -> bool {
        line.is_some() && source_state
    }
}
