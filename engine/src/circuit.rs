use std::collections::HashMap;

use log::{debug, trace, warn};

use crate::{
    components::{Gate, GateKind},
    config::SimConfig,
    error::SimError,
    line::Line,
    pin::{Pin, PinEvent, Reaction},
    truth_table::{generate_truth_table, verify_truth_table, TruthTableRow},
    types::{Direction, LineId, ObserverId, PinId, ID},
};

/// Owns every gate (and through them every pin) and every line.
///
/// Every mutation runs its propagation to completion before returning.
/// Propagation is depth-first: a pin change is handled by the reactions
/// its gate registered, which may set further pins, each one level
/// deeper. Going past [`SimConfig::max_propagation_depth`] aborts with
/// [`SimError::Divergence`]; pins updated before the abort keep their
/// new levels.
pub struct BCircuit {
    config: SimConfig,
    components: HashMap<ID, Gate>,
    lines: HashMap<LineId, Line>,
    last_id: ID,
    last_line: LineId,
    last_observer: ObserverId,
}

impl Default for BCircuit {
    fn default() -> Self {
        BCircuit::new()
    }
}

impl BCircuit {
    pub fn new() -> BCircuit {
        BCircuit::with_config(SimConfig::default())
    }
    pub fn with_config(config: SimConfig) -> BCircuit {
        BCircuit {
            config,
            components: HashMap::new(),
            lines: HashMap::new(),
            last_id: 0,
            last_line: 0,
            last_observer: 0,
        }
    }
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn add_gate(&mut self, kind: GateKind, n_inp: usize, label: &str) -> Result<ID, SimError> {
        let gate = Gate::new(self.last_id + 1, kind, n_inp, label)?;
        let id = self.new_id();
        self.components.insert(id, gate);
        debug!("added {} gate {} '{}' with {} inputs", kind, id, label, n_inp);
        // outputs start consistent with the all-low inputs
        self.refresh(id)?;
        Ok(id)
    }

    /// Adds a gate with the default pin layout of its kind.
    pub fn add_component(&mut self, kind: GateKind, label: &str) -> Result<ID, SimError> {
        let n_inp = match kind {
            GateKind::And | GateKind::Or => self.config.default_gate_inputs as usize,
            GateKind::Source => 0,
            GateKind::Sink => 1,
        };
        self.add_gate(kind, n_inp, label)
    }

    pub fn add_source(&mut self, label: &str, level: bool) -> Result<ID, SimError> {
        let id = self.add_gate(GateKind::Source, 0, label)?;
        self.force(id, level)?;
        Ok(id)
    }

    pub fn add_sink(&mut self, label: &str) -> Result<ID, SimError> {
        self.add_gate(GateKind::Sink, 1, label)
    }

    /// Disconnects every line touching the gate, then drops it together
    /// with its pins and their subscriptions.
    pub fn remove_gate(&mut self, id: ID) -> Result<(), SimError> {
        if !self.components.contains_key(&id) {
            return Err(SimError::UnknownGate(id));
        }
        // outgoing lines go first so the dying gate cannot push a last
        // transient level downstream while its inputs are detached
        let mut attached: Vec<(bool, LineId)> = self
            .lines_of(id)
            .iter()
            .map(|l| (l.from.gate != id, l.id))
            .collect();
        attached.sort();
        for (_, line) in attached {
            self.disconnect(line)?;
        }
        if let Some(mut gate) = self.components.remove(&id) {
            gate.release();
        }
        debug!("removed gate {}", id);
        Ok(())
    }

    /// Wires `from` (an output) to `to` (an input of another gate). The
    /// input takes the output's level immediately.
    pub fn connect(&mut self, from: PinId, to: PinId) -> Result<LineId, SimError> {
        let line = Line::new(self.last_line + 1, from, to)?;
        if let Some(existing) = self.pin(from)?.line() {
            return Err(SimError::AlreadyConnected {
                pin: from,
                line: existing,
            });
        }
        if let Some(existing) = self.pin(to)?.line() {
            return Err(SimError::AlreadyConnected {
                pin: to,
                line: existing,
            });
        }

        self.last_line = line.id;
        self.lines.insert(line.id, line);
        self.pin_mut(from)?.set_outgoing(Some(line.id))?;
        let ev = self.pin_mut(to)?.attach_line(line.id)?;
        debug!("line {}: {} -> {}", line.id, from, to);
        self.dispatch(ev, 0)?;
        Ok(line.id)
    }

    /// Removes the line; its destination input falls back to low.
    pub fn disconnect(&mut self, line: LineId) -> Result<(), SimError> {
        let l = self.lines.remove(&line).ok_or(SimError::UnknownLine(line))?;
        self.pin_mut(l.from)?.set_outgoing(None)?;
        let ev = self.pin_mut(l.to)?.detach_line()?;
        debug!("line {} removed: {} -/-> {}", line, l.from, l.to);
        self.dispatch(ev, 0)
    }

    /// Drives a source gate's output. This is the only way to inject a
    /// signal into a wired circuit.
    pub fn force(&mut self, source: ID, level: bool) -> Result<(), SimError> {
        let gate = self
            .components
            .get_mut(&source)
            .ok_or(SimError::UnknownGate(source))?;
        if gate.kind() != GateKind::Source {
            return Err(SimError::NotASource(source));
        }
        gate.set_level(level);
        debug!("forced source {} to {}", source, level);
        self.refresh_at(source, 0)
    }

    /// Sets an unconnected input pin explicitly.
    pub fn set_input(&mut self, pin: PinId, level: bool) -> Result<(), SimError> {
        let p = self.pin(pin)?;
        if p.direction() != Direction::Input {
            return Err(SimError::NotAnInput(pin));
        }
        if p.line().is_some() {
            return Err(SimError::DrivenInput(pin));
        }
        self.set_pin_state(pin, level, 0)
    }

    /// Re-evaluates the gate from its current inputs. Outputs that do not
    /// change raise nothing.
    pub fn refresh(&mut self, id: ID) -> Result<(), SimError> {
        self.refresh_at(id, 0)
    }

    pub fn gate(&self, id: ID) -> Option<&Gate> {
        self.components.get(&id)
    }
    pub fn gate_ids(&self) -> Vec<ID> {
        let mut ids: Vec<ID> = self.components.keys().copied().collect();
        ids.sort();
        ids
    }
    pub fn pin(&self, pin: PinId) -> Result<&Pin, SimError> {
        self.components
            .get(&pin.gate)
            .ok_or(SimError::UnknownGate(pin.gate))?
            .pin(pin)
            .ok_or(SimError::UnknownPin(pin))
    }
    pub fn pin_state(&self, pin: PinId) -> Result<bool, SimError> {
        Ok(self.pin(pin)?.state())
    }
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.get(&id)
    }
    pub fn lines_of(&self, gate: ID) -> Vec<&Line> {
        self.lines
            .values()
            .filter(|l| l.from.gate == gate || l.to.gate == gate)
            .collect()
    }
    pub fn is_connected(&self, gate: ID) -> bool {
        self.lines
            .values()
            .any(|l| l.from.gate == gate || l.to.gate == gate)
    }

    pub fn truth_table(&self, id: ID) -> Result<Vec<TruthTableRow>, SimError> {
        generate_truth_table(self.gate(id).ok_or(SimError::UnknownGate(id))?)
    }
    pub fn verify_truth_table<F>(&self, id: ID, expected: F) -> Result<(), SimError>
    where
        F: Fn(&[bool]) -> Vec<bool>,
    {
        verify_truth_table(self.gate(id).ok_or(SimError::UnknownGate(id))?, expected)
    }

    /// Registers a callback receiving every event the pin raises.
    pub fn subscribe<F>(&mut self, pin: PinId, cb: F) -> Result<ObserverId, SimError>
    where
        F: FnMut(&PinEvent) + 'static,
    {
        let id = self.last_observer + 1;
        self.pin_mut(pin)?.add_observer(id, Box::new(cb));
        self.last_observer = id;
        Ok(id)
    }
    pub fn unsubscribe(&mut self, pin: PinId, id: ObserverId) -> Result<bool, SimError> {
        Ok(self.pin_mut(pin)?.remove_observer(id))
    }

    fn new_id(&mut self) -> ID {
        self.last_id += 1;
        self.last_id
    }

    fn pin_mut(&mut self, pin: PinId) -> Result<&mut Pin, SimError> {
        self.components
            .get_mut(&pin.gate)
            .ok_or(SimError::UnknownGate(pin.gate))?
            .pin_mut(pin)
            .ok_or(SimError::UnknownPin(pin))
    }

    fn guard(&self, pin: PinId, depth: usize) -> Result<(), SimError> {
        if depth > self.config.max_propagation_depth {
            warn!(
                "propagation exceeded depth {} at {}, aborting",
                self.config.max_propagation_depth, pin
            );
            return Err(SimError::Divergence {
                limit: self.config.max_propagation_depth,
                pin,
            });
        }
        Ok(())
    }

    fn set_pin_state(&mut self, pin: PinId, value: bool, depth: usize) -> Result<(), SimError> {
        self.propagate(Step::Set(pin, value), depth)
    }
    fn dispatch(&mut self, ev: PinEvent, depth: usize) -> Result<(), SimError> {
        self.propagate(Step::Raised(ev), depth)
    }
    fn refresh_at(&mut self, id: ID, depth: usize) -> Result<(), SimError> {
        self.propagate(Step::Refresh(id), depth)
    }

    // Runs a propagation to completion on an explicit LIFO stack, so the
    // call stack stays flat however deep the circuit is. Children are
    // pushed in reverse so they pop in their natural order, which keeps
    // the traversal depth-first along the edge that just changed.
    fn propagate(&mut self, start: Step, depth: usize) -> Result<(), SimError> {
        let mut exec_stack: Vec<(Step, usize)> = vec![(start, depth)];
        while let Some((step, depth)) = exec_stack.pop() {
            match step {
                Step::Set(pin, value) => {
                    self.guard(pin, depth)?;
                    if let Some(ev) = self.pin_mut(pin)?.set_state(value) {
                        trace!("{} = {} (depth {})", pin, value, depth);
                        self.raise(ev, depth, &mut exec_stack)?;
                    }
                }
                Step::Raised(ev) => self.raise(ev, depth, &mut exec_stack)?,
                Step::Refresh(id) => {
                    let gate = self.components.get(&id).ok_or(SimError::UnknownGate(id))?;
                    let outs = gate.evaluate_self();
                    assert_eq!(
                        outs.len(),
                        gate.n_outputs(),
                        "{} gate {} evaluated to {} values for {} output pins",
                        gate.kind(),
                        id,
                        outs.len(),
                        gate.n_outputs()
                    );
                    for (i, v) in outs.into_iter().enumerate().rev() {
                        exec_stack.push((Step::Set(PinId::output(id, i), v), depth + 1));
                    }
                }
            }
        }
        Ok(())
    }

    // notifies observers and schedules the owning gate's reactions
    fn raise(
        &mut self,
        ev: PinEvent,
        depth: usize,
        exec_stack: &mut Vec<(Step, usize)>,
    ) -> Result<(), SimError> {
        let pin = ev.pin();
        let p = self.pin_mut(pin)?;
        p.notify(&ev);
        for r in p.reactions(&ev).into_iter().rev() {
            let step = match r {
                Reaction::Refresh => Step::Refresh(pin.gate),
                Reaction::ReloadFromLine => Step::Set(pin, self.line_level(pin)?),
                Reaction::ForwardAlongLine => {
                    let src = self.pin(pin)?;
                    let Some(line) = src.line() else {
                        continue;
                    };
                    let value = src.state();
                    let to = self.lines.get(&line).ok_or(SimError::UnknownLine(line))?.to;
                    Step::Set(to, value)
                }
            };
            exec_stack.push((step, depth + 1));
        }
        Ok(())
    }

    // level an input should show given its line
    fn line_level(&self, pin: PinId) -> Result<bool, SimError> {
        let line = match self.pin(pin)?.line() {
            Some(id) => Some(self.lines.get(&id).ok_or(SimError::UnknownLine(id))?),
            None => None,
        };
        let source_state = match line {
            Some(l) => self.pin(l.from)?.state(),
            None => false,
        };
        Ok(Line::carry(line, source_state))
    }
}

/// A pending unit of propagation work.
enum Step {
    Set(PinId, bool),
    Raised(PinEvent),
    Refresh(ID),
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::types::DEFAULT_MAX_PROPAGATION_DEPTH;

    fn out(g: ID) -> PinId {
        PinId::output(g, 0)
    }
    fn inp(g: ID, i: usize) -> PinId {
        PinId::input(g, i)
    }

    fn record(c: &mut BCircuit, pin: PinId) -> Rc<RefCell<Vec<PinEvent>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        c.subscribe(pin, move |ev| sink.borrow_mut().push(*ev)).unwrap();
        log
    }

    #[test]
    fn source_and_sink_cascade() {
        let mut c = BCircuit::new();
        let s = c.add_source("S", false).unwrap();
        let s2 = c.add_source("S2", false).unwrap();
        let and = c.add_component(GateKind::And, "AB").unwrap();
        let sink = c.add_sink("F").unwrap();
        c.connect(out(s), inp(and, 0)).unwrap();
        c.connect(out(s2), inp(and, 1)).unwrap();
        c.connect(out(and), inp(sink, 0)).unwrap();

        c.force(s, true).unwrap();
        c.force(s2, false).unwrap();
        assert!(!c.pin_state(inp(sink, 0)).unwrap());

        c.force(s2, true).unwrap();
        assert!(c.pin_state(inp(sink, 0)).unwrap());

        c.force(s, false).unwrap();
        assert!(!c.pin_state(inp(sink, 0)).unwrap());
        assert_eq!(c.gate(and).unwrap().input_states(), vec![false, true]);
    }

    #[test]
    fn connect_copies_level_and_disconnect_resets() {
        let mut c = BCircuit::new();
        let a = c.add_source("A", true).unwrap();
        let b = c.add_component(GateKind::Or, "B").unwrap();
        let line = c.connect(out(a), inp(b, 1)).unwrap();
        assert!(c.pin_state(inp(b, 1)).unwrap());
        assert!(c.pin_state(out(b)).unwrap());
        assert!(c.is_connected(a) && c.is_connected(b));

        c.disconnect(line).unwrap();
        assert!(!c.pin_state(inp(b, 1)).unwrap());
        assert!(!c.pin_state(out(b)).unwrap());
        assert!(!c.is_connected(a));
        assert_eq!(c.pin(out(a)).unwrap().line(), None);
        assert_eq!(c.disconnect(line), Err(SimError::UnknownLine(line)));
    }

    #[test]
    fn refresh_twice_raises_nothing() {
        let mut c = BCircuit::new();
        let and = c.add_component(GateKind::And, "").unwrap();
        c.set_input(inp(and, 0), true).unwrap();
        c.set_input(inp(and, 1), true).unwrap();
        let events = record(&mut c, out(and));
        c.refresh(and).unwrap();
        c.refresh(and).unwrap();
        assert!(events.borrow().is_empty());
        assert!(c.pin_state(out(and)).unwrap());

        c.set_input(inp(and, 1), false).unwrap();
        assert_eq!(
            *events.borrow(),
            vec![PinEvent::ValueChanged {
                pin: out(and),
                value: false
            }]
        );
    }

    #[test]
    fn observers_see_line_changes() {
        let mut c = BCircuit::new();
        let a = c.add_source("A", true).unwrap();
        let k = c.add_sink("K").unwrap();
        let events = record(&mut c, inp(k, 0));
        let line = c.connect(out(a), inp(k, 0)).unwrap();
        assert_eq!(
            *events.borrow(),
            vec![
                PinEvent::LineChanged {
                    pin: inp(k, 0),
                    line: Some(line)
                },
                PinEvent::ValueChanged {
                    pin: inp(k, 0),
                    value: true
                },
            ]
        );
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut c = BCircuit::new();
        let a = c.add_source("A", false).unwrap();
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let obs = c.subscribe(out(a), move |_| *h.borrow_mut() += 1).unwrap();
        c.force(a, true).unwrap();
        assert_eq!(c.unsubscribe(out(a), obs), Ok(true));
        c.force(a, false).unwrap();
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(c.unsubscribe(out(a), obs), Ok(false));
    }

    #[test]
    fn configuration_errors_leave_circuit_untouched() {
        let mut c = BCircuit::new();
        let a = c.add_source("A", true).unwrap();
        let b = c.add_component(GateKind::And, "B").unwrap();
        let d = c.add_component(GateKind::Or, "D").unwrap();

        assert_eq!(
            c.connect(inp(b, 0), inp(d, 0)),
            Err(SimError::NotAnOutput(inp(b, 0)))
        );
        assert_eq!(
            c.connect(out(a), out(b)),
            Err(SimError::NotAnInput(out(b)))
        );
        assert!(matches!(
            c.connect(out(b), inp(b, 0)),
            Err(SimError::SelfLoop { .. })
        ));
        assert_eq!(
            c.connect(out(a), inp(b, 5)),
            Err(SimError::UnknownPin(inp(b, 5)))
        );
        assert_eq!(
            c.connect(out(a), inp(99, 0)),
            Err(SimError::UnknownGate(99))
        );
        assert!(c.lines_of(b).is_empty());

        let first = c.connect(out(b), inp(d, 0)).unwrap();
        assert_eq!(
            c.connect(out(a), inp(d, 0)),
            Err(SimError::AlreadyConnected {
                pin: inp(d, 0),
                line: first
            })
        );
        assert_eq!(
            c.connect(out(b), inp(d, 1)),
            Err(SimError::AlreadyConnected {
                pin: out(b),
                line: first
            })
        );
        assert!(!c.pin_state(inp(d, 0)).unwrap());

        assert_eq!(c.force(b, true), Err(SimError::NotASource(b)));
        assert_eq!(
            c.set_input(inp(d, 0), true),
            Err(SimError::DrivenInput(inp(d, 0)))
        );
        assert_eq!(
            c.set_input(out(d), true),
            Err(SimError::NotAnInput(out(d)))
        );
        assert!(matches!(
            c.add_gate(GateKind::And, 0, "empty"),
            Err(SimError::InputCount { .. })
        ));
    }

    // source followed by `n` one-input OR gates in series
    fn or_chain(c: &mut BCircuit, n: usize) -> (ID, Vec<ID>) {
        let s = c.add_source("S", false).unwrap();
        let mut prev = s;
        let mut chain = Vec::new();
        for _ in 0..n {
            let g = c.add_gate(GateKind::Or, 1, "").unwrap();
            c.connect(out(prev), inp(g, 0)).unwrap();
            chain.push(g);
            prev = g;
        }
        (s, chain)
    }

    #[test]
    fn deep_chain_hits_depth_guard() {
        let mut c = BCircuit::with_config(SimConfig::default().with_max_propagation_depth(10));
        let (s, chain) = or_chain(&mut c, 4);
        assert_eq!(
            c.force(s, true),
            Err(SimError::Divergence {
                limit: 10,
                pin: inp(chain[3], 0)
            })
        );
        // everything before the abort point already switched
        assert!(c.pin_state(out(chain[2])).unwrap());
        assert!(!c.pin_state(inp(chain[3], 0)).unwrap());
    }

    #[test]
    fn long_chains_stay_off_the_call_stack() {
        // a small thread stack: propagation must not recurse per gate
        let run = std::thread::Builder::new()
            .stack_size(256 * 1024)
            .spawn(|| {
                let mut c = BCircuit::new();
                let (s, chain) = or_chain(&mut c, 1000);
                assert_eq!(c.force(s, true), Ok(()));
                assert!(c.pin_state(out(chain[999])).unwrap());

                // three levels per gate: 2000 gates is past the default limit
                let mut c = BCircuit::new();
                let (s, _) = or_chain(&mut c, 2000);
                assert!(matches!(
                    c.force(s, true),
                    Err(SimError::Divergence {
                        limit: DEFAULT_MAX_PROPAGATION_DEPTH,
                        ..
                    })
                ));
            })
            .unwrap();
        run.join().unwrap();
    }

    #[test]
    fn converging_feedback_latches() {
        let mut c = BCircuit::new();
        let s = c.add_source("S", false).unwrap();
        let a = c.add_component(GateKind::Or, "A").unwrap();
        let b = c.add_component(GateKind::Or, "B").unwrap();
        c.connect(out(s), inp(a, 0)).unwrap();
        c.connect(out(a), inp(b, 0)).unwrap();
        c.connect(out(b), inp(a, 1)).unwrap();

        c.force(s, true).unwrap();
        assert!(c.pin_state(out(a)).unwrap());
        assert!(c.pin_state(out(b)).unwrap());

        // the loop holds itself high once set
        c.force(s, false).unwrap();
        assert!(c.pin_state(out(a)).unwrap());
        assert_eq!(c.gate(a).unwrap().input_states(), vec![false, true]);
    }

    #[test]
    fn remove_gate_resets_downstream_and_drops_observers() {
        let mut c = BCircuit::new();
        let s = c.add_source("S", true).unwrap();
        let or = c.add_component(GateKind::Or, "O").unwrap();
        let k = c.add_sink("K").unwrap();
        c.connect(out(s), inp(or, 0)).unwrap();
        c.connect(out(or), inp(k, 0)).unwrap();
        assert!(c.pin_state(inp(k, 0)).unwrap());

        let witness = Rc::new(());
        let held = witness.clone();
        c.subscribe(out(s), move |_| {
            let _ = Rc::strong_count(&held);
        })
        .unwrap();
        assert_eq!(Rc::strong_count(&witness), 2);

        c.remove_gate(s).unwrap();
        assert_eq!(Rc::strong_count(&witness), 1);
        assert!(c.gate(s).is_none());
        assert!(!c.pin_state(inp(or, 0)).unwrap());
        assert!(!c.pin_state(inp(k, 0)).unwrap());
        assert_eq!(c.lines_of(or).len(), 1);
        assert_eq!(c.pin(out(s)).unwrap_err(), SimError::UnknownGate(s));
        assert_eq!(c.remove_gate(s), Err(SimError::UnknownGate(s)));
        assert_eq!(c.gate_ids(), vec![or, k]);
    }

    #[test]
    fn removing_a_gate_cuts_its_output_first() {
        let mut c = BCircuit::new();
        let s = c.add_source("S", true).unwrap();
        let or = c.add_component(GateKind::Or, "O").unwrap();
        let k = c.add_sink("K").unwrap();
        c.connect(out(s), inp(or, 0)).unwrap();
        c.connect(out(or), inp(k, 0)).unwrap();
        let events = record(&mut c, inp(k, 0));

        c.remove_gate(or).unwrap();
        assert_eq!(
            *events.borrow(),
            vec![
                PinEvent::LineChanged {
                    pin: inp(k, 0),
                    line: None
                },
                PinEvent::ValueChanged {
                    pin: inp(k, 0),
                    value: false
                },
            ]
        );
        assert!(!c.is_connected(s));
    }

    #[test]
    fn source_table_tracks_forced_level() {
        let mut c = BCircuit::new();
        let s = c.add_source("S", false).unwrap();
        let low = c.truth_table(s).unwrap();
        c.force(s, true).unwrap();
        let high = c.truth_table(s).unwrap();
        assert_eq!(low[0].outputs(), &[false]);
        assert_eq!(high[0].outputs(), &[true]);
        assert!(low.iter().all(|r| r.inputs().is_empty()));
    }

    #[test]
    fn truth_tables_ignore_live_state() {
        let mut c = BCircuit::new();
        let and = c.add_component(GateKind::And, "").unwrap();
        let before = c.truth_table(and).unwrap();
        c.set_input(inp(and, 0), true).unwrap();
        c.set_input(inp(and, 1), true).unwrap();
        let after = c.truth_table(and).unwrap();
        assert_eq!(before, after);
        assert_eq!(c.gate(and).unwrap().input_states(), vec![true, true]);
        assert!(c.verify_truth_table(and, |v| vec![v[0] && v[1]]).is_ok());
        assert_eq!(c.truth_table(42), Err(SimError::UnknownGate(42)));
    }

    #[test]
    fn ids_are_not_reused() {
        let mut c = BCircuit::new();
        let a = c.add_source("A", false).unwrap();
        assert!(c.add_gate(GateKind::Sink, 3, "bad").is_err());
        c.remove_gate(a).unwrap();
        let b = c.add_sink("B").unwrap();
        assert!(b > a);
    }
}
