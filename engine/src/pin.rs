use std::fmt;

use crate::{
    error::SimError,
    types::{Direction, LineId, ObserverId, PinId, ID},
};

/// Raised by a pin whenever its level or its line changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PinEvent {
    ValueChanged { pin: PinId, value: bool },
    LineChanged { pin: PinId, line: Option<LineId> },
}

impl PinEvent {
    pub fn pin(&self) -> PinId {
        match self {
            PinEvent::ValueChanged { pin, .. } | PinEvent::LineChanged { pin, .. } => *pin,
        }
    }
}

/// What the owning gate does when one of its pins raises an event. The
/// circuit dispatches these; pins only store them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reaction {
    /// re-evaluate the owning gate
    Refresh,
    /// recompute an input level from its line
    ReloadFromLine,
    /// push an output level to the far end of its line
    ForwardAlongLine,
}

pub type Observer = Box<dyn FnMut(&PinEvent)>;

pub struct Pin {
    id: PinId,
    state: bool,
    // incoming line for inputs, outgoing line for outputs
    line: Option<LineId>,
    on_value: Vec<Reaction>,
    on_line: Vec<Reaction>,
    observers: Vec<(ObserverId, Observer)>,
}

impl Pin {
    pub(crate) fn new(id: PinId) -> Pin {
        Pin {
            id,
            state: false,
            line: None,
            on_value: Vec::new(),
            on_line: Vec::new(),
            observers: Vec::new(),
        }
    }

    pub fn id(&self) -> PinId {
        self.id
    }
    pub fn state(&self) -> bool {
        self.state
    }
    pub fn direction(&self) -> Direction {
        self.id.direction
    }
    pub fn owner(&self) -> ID {
        self.id.gate
    }
    pub fn line(&self) -> Option<LineId> {
        self.line
    }

    /// Edge-triggered: only a real change produces an event.
    pub(crate) fn set_state(&mut self, value: bool) -> Option<PinEvent> {
        if self.state == value {
            return None;
        }
        self.state = value;
        Some(PinEvent::ValueChanged {
            pin: self.id,
            value,
        })
    }

    pub(crate) fn attach_line(&mut self, line: LineId) -> Result<PinEvent, SimError> {
        if self.direction() != Direction::Input {
            return Err(SimError::NotAnInput(self.id));
        }
        if let Some(existing) = self.line {
            return Err(SimError::AlreadyConnected {
                pin: self.id,
                line: existing,
            });
        }
        self.line = Some(line);
        Ok(PinEvent::LineChanged {
            pin: self.id,
            line: Some(line),
        })
    }

    pub(crate) fn detach_line(&mut self) -> Result<PinEvent, SimError> {
        if self.direction() != Direction::Input {
            return Err(SimError::NotAnInput(self.id));
        }
        self.line = None;
        Ok(PinEvent::LineChanged {
            pin: self.id,
            line: None,
        })
    }

    /// Outputs only remember their outgoing line; nobody listens for it.
    pub(crate) fn set_outgoing(&mut self, line: Option<LineId>) -> Result<(), SimError> {
        if self.direction() != Direction::Output {
            return Err(SimError::NotAnOutput(self.id));
        }
        self.line = line;
        Ok(())
    }

    pub(crate) fn subscribe_value(&mut self, r: Reaction) {
        self.on_value.push(r);
    }
    pub(crate) fn subscribe_line(&mut self, r: Reaction) {
        self.on_line.push(r);
    }
    pub(crate) fn release(&mut self) {
        self.on_value.clear();
        self.on_line.clear();
    }

    pub(crate) fn reactions(&self, ev: &PinEvent) -> Vec<Reaction> {
        match ev {
            PinEvent::ValueChanged { .. } => self.on_value.clone(),
            PinEvent::LineChanged { .. } => self.on_line.clone(),
        }
    }

    pub(crate) fn add_observer(&mut self, id: ObserverId, cb: Observer) {
        self.observers.push((id, cb));
    }
    pub(crate) fn remove_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }
    pub(crate) fn notify(&mut self, ev: &PinEvent) {
        for (_, cb) in self.observers.iter_mut() {
            cb(ev);
        }
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pin")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("line", &self.line)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_state_is_edge_triggered() {
        let mut p = Pin::new(PinId::input(1, 0));
        assert_eq!(p.set_state(false), None);
        assert_eq!(
            p.set_state(true),
            Some(PinEvent::ValueChanged {
                pin: PinId::input(1, 0),
                value: true
            })
        );
        assert_eq!(p.set_state(true), None);
        assert!(p.state());
    }

    #[test]
    fn only_inputs_take_lines() {
        let mut out = Pin::new(PinId::output(1, 0));
        assert_eq!(
            out.attach_line(3),
            Err(SimError::NotAnInput(PinId::output(1, 0)))
        );
        assert_eq!(out.line(), None);

        let mut inp = Pin::new(PinId::input(2, 1));
        assert!(inp.attach_line(3).is_ok());
        assert_eq!(
            inp.attach_line(4),
            Err(SimError::AlreadyConnected {
                pin: PinId::input(2, 1),
                line: 3
            })
        );
        assert_eq!(
            inp.detach_line(),
            Ok(PinEvent::LineChanged {
                pin: PinId::input(2, 1),
                line: None
            })
        );
    }

    #[test]
    fn release_drops_reactions_but_not_observers() {
        let mut p = Pin::new(PinId::input(1, 0));
        p.subscribe_value(Reaction::Refresh);
        p.subscribe_line(Reaction::ReloadFromLine);
        p.add_observer(7, Box::new(|_| {}));
        let ev = p.set_state(true).unwrap();
        assert_eq!(p.reactions(&ev), vec![Reaction::Refresh]);
        p.release();
        assert!(p.reactions(&ev).is_empty());
        assert!(p.remove_observer(7));
        assert!(!p.remove_observer(7));
    }
}
