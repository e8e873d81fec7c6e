use std::{collections::HashMap, fmt};

// a rudimentary text grid, used to print truth tables
pub struct Table<T> {
    cols: Vec<String>,
    col_idx: HashMap<String, usize>,
    pub rows: Vec<Vec<T>>,
}

impl<T: Default + Clone> Table<T> {
    pub fn new() -> Table<T> {
        Table {
            cols: Vec::new(),
            col_idx: HashMap::new(),
            rows: Vec::new(),
        }
    }
    pub fn columns(&self) -> &[String] {
        &self.cols
    }
    pub fn set_columns(&mut self, cols: Vec<String>) {
        self.cols = cols;
        self.col_idx.clear();
        // on duplicate names the last column wins the lookup
        for (i, c) in self.cols.iter().enumerate() {
            self.col_idx.insert(c.clone(), i);
        }
    }
    pub fn add_row(&mut self) -> usize {
        self.rows.push(vec![T::default(); self.cols.len()]);
        self.rows.len() - 1
    }
    pub fn set_val_at(&mut self, i: usize, j: &str, val: T) -> Option<()> {
        let col = *self.col_idx.get(j)?;
        *self.rows.get_mut(i)?.get_mut(col)? = val;
        Some(())
    }
    pub fn get_val_at(&self, i: usize, j: &str) -> Option<&T> {
        let col = *self.col_idx.get(j)?;
        self.rows.get(i)?.get(col)
    }
}

impl<T: Default + Clone> Default for Table<T> {
    fn default() -> Self {
        Table::new()
    }
}

impl<T: fmt::Display> fmt::Display for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pad = self
            .cols
            .iter()
            .map(|c| {
                let width = c.len() + 2 + 1; // 2 spaces left and right of the label text
                (" ".repeat(width / 2), " ".repeat(width - width / 2))
            })
            .collect::<Vec<(String, String)>>();
        let total_width = pad.iter().fold(0, |a, b| a + b.0.len() + b.1.len() + 2);

        writeln!(f, "|{}|", "¯".repeat(total_width.saturating_sub(1)))?;
        write!(f, "|")?;
        for c in &self.cols {
            write!(f, "  {}  |", c)?;
        }
        writeln!(f)?;
        writeln!(f, "|{}|", "-".repeat(total_width.saturating_sub(1)))?;
        for row in &self.rows {
            write!(f, "|")?;
            for (i, p) in pad.iter().enumerate() {
                match row.get(i) {
                    Some(v) => write!(f, "{}{}{}|", p.0, v, p.1)?,
                    None => write!(f, "{} {}|", p.0, p.1)?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "|{}|", "_".repeat(total_width.saturating_sub(1)))?;
        Ok(())
    }
}
