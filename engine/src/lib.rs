//! Event-driven simulation of logic gate networks.
//!
//! A [`BCircuit`] owns gates and the lines between them. Changing a pin
//! pushes the new level through every connected gate before the call
//! returns, and any gate can be characterized by its truth table without
//! touching the live circuit.

pub mod circuit;
pub mod components;
pub mod config;
pub mod error;
pub mod line;
pub mod pin;
pub mod table;
pub mod truth_table;
pub mod types;

pub use circuit::BCircuit;
pub use components::{Gate, GateKind};
pub use config::SimConfig;
pub use error::SimError;
pub use line::Line;
pub use pin::{Pin, PinEvent};
pub use truth_table::{generate_truth_table, TruthTableRow};
pub use types::{Direction, LineId, ObserverId, PinId, ID};
