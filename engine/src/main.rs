use gate_sim::{truth_table::to_table, BCircuit, GateKind, PinId, SimError};

fn two_source_and() -> Result<(), SimError> {
    let mut c = BCircuit::new();
    let s1 = c.add_source("S1", false)?;
    let s2 = c.add_source("S2", false)?;
    let and = c.add_component(GateKind::And, "AB")?;
    let sink = c.add_sink("F")?;

    c.connect(PinId::output(s1, 0), PinId::input(and, 0))?;
    c.connect(PinId::output(s2, 0), PinId::input(and, 1))?;
    c.connect(PinId::output(and, 0), PinId::input(sink, 0))?;

    let steps = [(s1, true), (s2, false), (s2, true), (s1, false)];
    for (src, level) in steps {
        c.force(src, level)?;
        println!(
            "force {} = {} -> F = {}",
            c.gate(src).map(|g| g.label.as_str()).unwrap_or("?"),
            level as u8,
            c.pin_state(PinId::input(sink, 0))? as u8
        );
    }
    if let Some(g) = c.gate(and) {
        println!("{}", g);
    }
    println!("{}", to_table(&c.truth_table(and)?));
    Ok(())
}

fn wide_or() -> Result<(), SimError> {
    let mut c = BCircuit::new();
    let or = c.add_gate(GateKind::Or, 3, "O3")?;
    c.verify_truth_table(or, |v| vec![v.iter().any(|b| *b)])?;
    for row in c.truth_table(or)? {
        println!("{}", row);
    }
    Ok(())
}

fn main() {
    if let Err(e) = two_source_and().and_then(|_| wide_or()) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
