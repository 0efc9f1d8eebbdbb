use std::collections::{HashMap, HashSet};

use crowbook_text_processing::escape;
use serde::Serialize;
use thiserror::Error;

use super::{pretty_print::ProductionOutput, Grammar, EPSILON};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "M[{non_terminal}, {terminal}] is claimed by both {non_terminal} -> {existing} and {non_terminal} -> {candidate}"
)]
pub struct Ll1Conflict {
    pub non_terminal: String,
    pub terminal: String,
    pub existing: String,
    pub candidate: String,
}

/// Prediction table of an LL(1) grammar: one alternative per
/// (non-terminal, lookahead) cell. Construction walks alternatives in
/// declaration order and fails on the first cell two different
/// alternatives claim; a partially built table is never returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictiveTable {
    non_terminals: Vec<usize>,
    terminals: Vec<usize>,
    cells: HashMap<(usize, usize), usize>,
}

impl PredictiveTable {
    pub fn production_position(&self, non_terminal: usize, terminal: usize) -> Option<usize> {
        self.cells.get(&(non_terminal, terminal)).copied()
    }

    /// The alternative predicted for `non_terminal` when the next token
    /// spells `token`. Spellings with no column (unknown tokens, other
    /// non-terminals) yield None.
    pub fn production<'g>(
        &self,
        g: &'g Grammar,
        non_terminal: usize,
        token: &str,
    ) -> Option<&'g [usize]> {
        let t = g.get_symbol_index(token)?;
        let pos = self.production_position(non_terminal, t)?;
        Some(&g.symbols[non_terminal].non_terminal().unwrap().productions[pos])
    }

    pub fn to_output<'a>(&self, g: &'a Grammar) -> PredictiveTableOutput<'a> {
        let terminals: Vec<&str> = self.terminals.iter().map(|&t| g.get_symbol_name(t)).collect();
        let rows = self
            .non_terminals
            .iter()
            .map(|&a| {
                let left = g.get_symbol_name(a);
                let row = self
                    .terminals
                    .iter()
                    .map(|&t| {
                        self.production_position(a, t).map(|pos| {
                            let production =
                                &g.symbols[a].non_terminal().unwrap().productions[pos];
                            ProductionOutput {
                                left,
                                rights: vec![g.production_to_vec_str(production)],
                            }
                        })
                    })
                    .collect();
                (left, row)
            })
            .collect();
        PredictiveTableOutput { terminals, rows }
    }
}

#[derive(Serialize)]
pub struct PredictiveTableOutput<'a> {
    terminals: Vec<&'a str>,
    rows: Vec<(&'a str, Vec<Option<ProductionOutput<'a>>>)>,
}

impl PredictiveTableOutput<'_> {
    pub fn to_plaintext(&self) -> String {
        let mut header: Vec<String> = vec![String::new()];
        header.extend(self.terminals.iter().map(|&t| t.to_string()));
        let mut output: Vec<Vec<String>> = vec![header];
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![left.to_string()];
            line.extend(row.iter().map(|cell| match cell {
                Some(production) => production.to_plaintext(left.len(), false),
                None => String::new(),
            }));
            output.push(line);
        }

        let mut width = vec![0; self.terminals.len() + 1];
        for j in 0..output[0].len() {
            width[j] = output.iter().map(|line| line[j].len()).max().unwrap();
        }
        output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:>width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_latex(&self) -> String {
        let mut header: Vec<String> = vec![format!(
            "\\[\\begin{{array}}{{c{}}}\n",
            "|l".repeat(self.terminals.len()),
        )];
        header.extend(
            self.terminals
                .iter()
                .map(|&t| format!("\\text{{{}}}", escape::tex(t))),
        );
        let header = header.join(" & ");

        let terminal_set: HashSet<&str> = self.terminals.iter().cloned().collect();
        let mut output: Vec<String> = Vec::new();
        for (left, row) in &self.rows {
            let mut line: Vec<String> = vec![escape::tex(*left).to_string()];
            line.extend(row.iter().map(|cell| match cell {
                Some(production) => cell_to_latex(production, &terminal_set),
                None => String::new(),
            }));
            output.push(line.join(" & "));
        }
        let output = output.join("\\\\\n");

        header + "\\\\\\hline\n" + &output + "\n\\end{array}\\]"
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}

fn cell_to_latex(production: &ProductionOutput, terminal_set: &HashSet<&str>) -> String {
    let right = production.rights[0]
        .iter()
        .map(|&s| {
            if terminal_set.contains(s) {
                format!("\\text{{{}}}", escape::tex(s))
            } else {
                escape::tex(s).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" \\ ");
    format!("{} \\rightarrow {}", escape::tex(production.left), right).replace(EPSILON, "\\epsilon")
}

impl Grammar {
    /// Builds the predictive table from FIRST/FOLLOW. Expects
    /// `calculate_nullable_first_follow` to have run on this grammar.
    ///
    /// Each alternative claims its FIRST terminals, plus FOLLOW of its head
    /// if it derives ε. A cell claimed by two different alternatives makes
    /// the whole grammar non-LL(1); re-claims by the same alternative (a
    /// nullable body whose FIRST and FOLLOW overlap on a terminal already
    /// pointing at it) are idempotent.
    pub fn build_predictive_table(&self) -> Result<PredictiveTable, Ll1Conflict> {
        let non_terminals: Vec<usize> = self.non_terminal_iter().map(|nt| nt.index).collect();
        let terminals: Vec<usize> =
            (0..self.symbols.len()).filter(|&i| self.is_terminal(i)).collect();

        let mut cells: HashMap<(usize, usize), usize> = HashMap::new();
        for &a in &non_terminals {
            let nt = self.symbols[a].non_terminal().unwrap();
            for (pos, production) in nt.productions.iter().enumerate() {
                // claim in index order so a conflicting grammar always
                // reports the same cell
                let mut rule_first: Vec<usize> =
                    self.calculate_first_for_production(production).into_iter().collect();
                rule_first.sort_unstable();
                for t in rule_first {
                    self.claim_cell(&mut cells, a, t, pos)?;
                }
                if self.production_derives_epsilon(production) {
                    let mut follow: Vec<usize> = nt.follow.iter().cloned().collect();
                    follow.sort_unstable();
                    for t in follow {
                        self.claim_cell(&mut cells, a, t, pos)?;
                    }
                }
            }
        }

        Ok(PredictiveTable {
            non_terminals,
            terminals,
            cells,
        })
    }

    fn claim_cell(
        &self,
        cells: &mut HashMap<(usize, usize), usize>,
        non_terminal: usize,
        terminal: usize,
        position: usize,
    ) -> Result<(), Ll1Conflict> {
        if let Some(&held) = cells.get(&(non_terminal, terminal)) {
            if held != position {
                let productions = &self.symbols[non_terminal].non_terminal().unwrap().productions;
                return Err(Ll1Conflict {
                    non_terminal: self.get_symbol_name(non_terminal).to_string(),
                    terminal: self.get_symbol_name(terminal).to_string(),
                    existing: self.production_to_vec_str(&productions[held]).join(" "),
                    candidate: self.production_to_vec_str(&productions[position]).join(" "),
                });
            }
            return Ok(());
        }
        cells.insert((non_terminal, terminal), position);
        Ok(())
    }
}
