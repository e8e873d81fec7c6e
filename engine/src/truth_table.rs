//! Exhaustive characterization of a single gate.
//!
//! Rows are enumerated little-endian: bit `j` of row index `i` is the
//! level of input `j`, so for two inputs the order is
//! `(0,0) (1,0) (0,1) (1,1)`. Generation only calls
//! [`Gate::evaluate`] and never reads or writes live pins.
//!
//! A source has no inputs, so its table is the single row carrying its
//! forced level. That level is gate configuration rather than pin state,
//! and the row follows it across `force` calls.

use std::fmt;

use crate::{
    components::Gate, error::SimError, table::Table, types::MAX_TRUTH_TABLE_INPUTS,
};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TruthTableRow {
    inputs: Vec<bool>,
    outputs: Vec<bool>,
}

impl TruthTableRow {
    pub(crate) fn new(inputs: Vec<bool>, outputs: Vec<bool>) -> TruthTableRow {
        TruthTableRow { inputs, outputs }
    }
    pub fn inputs(&self) -> &[bool] {
        &self.inputs
    }
    pub fn outputs(&self) -> &[bool] {
        &self.outputs
    }
}

fn bit_char(v: &bool) -> char {
    if *v {
        '1'
    } else {
        '0'
    }
}

impl fmt::Display for TruthTableRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TruthTableRow: Inputs = [{}], Outputs = [{}]",
            self.inputs.iter().map(bit_char).collect::<String>(),
            self.outputs.iter().map(bit_char).collect::<String>()
        )
    }
}

/// All `2^bits` input vectors in row order. Callers stay within
/// `MAX_TRUTH_TABLE_INPUTS`.
pub(crate) fn input_combinations(bits: usize) -> impl Iterator<Item = Vec<bool>> {
    debug_assert!(bits <= MAX_TRUTH_TABLE_INPUTS);
    let total_combs: u64 = 1 << bits;
    (0..total_combs).map(move |n| (0..bits).map(|j| (n >> j) & 1 == 1).collect::<Vec<bool>>())
}

pub fn generate_truth_table(gate: &Gate) -> Result<Vec<TruthTableRow>, SimError> {
    let n = gate.n_inputs();
    if n > MAX_TRUTH_TABLE_INPUTS {
        return Err(SimError::TooManyInputs {
            gate: gate.id(),
            inputs: n,
            limit: MAX_TRUTH_TABLE_INPUTS,
        });
    }
    let rows = input_combinations(n)
        .map(|inp| {
            let out = gate.evaluate(&inp);
            TruthTableRow::new(inp, out)
        })
        .collect();
    Ok(rows)
}

/// Compares the gate against `expected` row by row and reports the first
/// row that differs.
pub fn verify_truth_table<F>(gate: &Gate, expected: F) -> Result<(), SimError>
where
    F: Fn(&[bool]) -> Vec<bool>,
{
    for (row, r) in generate_truth_table(gate)?.into_iter().enumerate() {
        let want = expected(r.inputs());
        if want != r.outputs {
            return Err(SimError::TruthTableMismatch {
                row,
                inputs: r.inputs,
                expected: want,
                actual: r.outputs,
            });
        }
    }
    Ok(())
}

/// Lays rows out as a printable grid with `I0..` and `O0..` columns.
pub fn to_table(rows: &[TruthTableRow]) -> Table<char> {
    let mut t = Table::<char>::new();
    let Some(first) = rows.first() else {
        return t;
    };
    let in_cols = (0..first.inputs.len()).map(|i| format!("I{}", i));
    let out_cols = (0..first.outputs.len()).map(|i| format!("O{}", i));
    t.set_columns(in_cols.chain(out_cols).collect());
    for r in rows {
        t.rows
            .push(r.inputs.iter().chain(r.outputs.iter()).map(bit_char).collect());
    }
    t
}
