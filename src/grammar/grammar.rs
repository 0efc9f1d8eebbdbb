use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct NonTerminal {
    pub index: usize,
    pub name: String,
    pub first: HashSet<usize>,
    pub follow: HashSet<usize>,
    pub nullable: bool,
    pub productions: Vec<Vec<usize>>,
}

impl NonTerminal {
    pub fn new(index: usize, name: String) -> Self {
        Self {
            index,
            name,
            first: HashSet::new(),
            follow: HashSet::new(),
            nullable: false,
            productions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Symbol {
    NonTerminal(NonTerminal),
    Terminal(String),
}

impl Symbol {
    pub fn non_terminal(&self) -> Option<&NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            Symbol::Terminal(_) => None,
        }
    }

    pub fn mut_non_terminal(&mut self) -> Option<&mut NonTerminal> {
        match self {
            Symbol::NonTerminal(e) => Some(e),
            Symbol::Terminal(_) => None,
        }
    }
}

/// Symbol arena for one grammar. Index 0 is the epsilon marker, index 1 the
/// end-of-input terminal `$`; every declared head and every right-hand
/// symbol gets an index after those.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub symbols: Vec<Symbol>,
    pub symbol_table: HashMap<String, usize>,
    pub start_symbol: Option<usize>,
}

impl Grammar {
    pub fn new() -> Self {
        let mut g = Self {
            symbols: Vec::new(),
            symbol_table: HashMap::new(),
            start_symbol: None,
        };

        // Epsilon is modelled as a pre-seeded nullable non-terminal so the
        // fixed-point passes need no special case for it. `''` is the
        // spelling some grammar texts use for the empty alternative.
        let e_idx = g.add_non_terminal(super::EPSILON);
        g.symbols[e_idx].mut_non_terminal().unwrap().nullable = true;
        g.symbol_table.insert(super::EPSILON_ALIAS.to_string(), e_idx);

        g.add_terminal(super::END_MARK.to_string());

        g
    }

    pub fn epsilon_index(&self) -> usize {
        self.symbol_table[super::EPSILON]
    }

    pub fn end_mark_index(&self) -> usize {
        self.symbol_table[super::END_MARK]
    }

    pub fn terminal_iter(&self) -> impl Iterator<Item = &String> {
        self.symbols.iter().filter_map(|s| {
            if let Symbol::Terminal(name) = s {
                Some(name)
            } else {
                None
            }
        })
    }

    pub fn non_terminal_iter(&self) -> impl Iterator<Item = &NonTerminal> {
        self.symbols.iter().filter_map(|s| s.non_terminal()).skip(1)
    }

    pub fn non_terminal_iter_mut(&mut self) -> impl Iterator<Item = &mut NonTerminal> {
        self.symbols
            .iter_mut()
            .filter_map(|s| s.mut_non_terminal())
            .skip(1)
    }

    pub fn get_symbol_index(&self, name: &str) -> Option<usize> {
        self.symbol_table.get(name).cloned()
    }

    pub fn is_terminal(&self, index: usize) -> bool {
        matches!(self.symbols[index], Symbol::Terminal(_))
    }

    pub fn add_non_terminal(&mut self, name: &str) -> usize {
        let idx = self.symbols.len();
        self.symbols
            .push(Symbol::NonTerminal(NonTerminal::new(idx, name.to_string())));
        self.symbol_table.insert(name.to_string(), idx);
        idx
    }

    pub fn add_terminal(&mut self, name: String) -> usize {
        let idx = self.symbols.len();
        self.symbols.push(Symbol::Terminal(name.clone()));
        self.symbol_table.insert(name, idx);
        idx
    }

    pub fn add_production(&mut self, left: usize, right: Vec<usize>) {
        self.symbols[left]
            .mut_non_terminal()
            .unwrap()
            .productions
            .push(right);
    }

    pub fn get_symbol_name(&self, index: usize) -> &str {
        match &self.symbols[index] {
            Symbol::NonTerminal(e) => e.name.as_str(),
            Symbol::Terminal(e) => e.as_str(),
        }
    }

    /// Display form of a production body; the empty alternative shows as ε.
    pub fn production_to_vec_str(&self, production: &[usize]) -> Vec<&str> {
        if production.is_empty() {
            vec![super::EPSILON]
        } else {
            production.iter().map(|&i| self.get_symbol_name(i)).collect()
        }
    }
}
