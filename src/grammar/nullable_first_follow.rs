use std::collections::HashSet;

use super::{grammar::Symbol, Grammar, END_MARK};

impl Grammar {
    /// Runs the NULLABLE, FIRST and FOLLOW fixed points, in that order.
    /// Every pass only grows the sets and the sets are bounded by the
    /// terminal alphabet plus `$`, so each loop terminates on any finite
    /// grammar, left-recursive ones included.
    pub fn calculate_nullable_first_follow(&mut self) {
        if let Some(start_idx) = self.start_symbol {
            self.symbols[start_idx]
                .mut_non_terminal()
                .unwrap()
                .follow
                .insert(self.symbol_table[END_MARK]);
            self.calculate_nullable();
            self.calculate_first();
            self.calculate_follow();
        }
    }

    fn calculate_nullable(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..self.symbols.len() {
                let nullable: bool = match &self.symbols[i] {
                    Symbol::Terminal(_) => continue,
                    Symbol::NonTerminal(nt) => {
                        if nt.nullable {
                            continue;
                        }
                        nt.productions.iter().any(|production| {
                            production.iter().all(|s| match &self.symbols[*s] {
                                Symbol::Terminal(_) => false,
                                Symbol::NonTerminal(e) => e.nullable,
                            })
                        })
                    }
                };

                if nullable {
                    self.symbols[i].mut_non_terminal().unwrap().nullable = true;
                    changed = true;
                }
            }
        }
    }

    /// Sequential FIRST of a symbol string: each symbol contributes its
    /// FIRST, scanning stops at the first non-nullable symbol. The result
    /// holds terminal indices only; whether the whole string derives ε is
    /// the separate `nullable` question.
    pub fn calculate_first_for_production(&self, production: &[usize]) -> HashSet<usize> {
        let mut first: HashSet<usize> = HashSet::new();
        for (idx, symbol) in production.iter().map(|i| (*i, &self.symbols[*i])) {
            match symbol {
                Symbol::Terminal(_) => {
                    first.insert(idx);
                    break;
                }
                Symbol::NonTerminal(nt) => {
                    first.extend(nt.first.iter().cloned());
                    if !nt.nullable {
                        break;
                    }
                }
            }
        }
        first
    }

    /// True iff every symbol of the body can vanish. Holds vacuously for
    /// the empty alternative.
    pub fn production_derives_epsilon(&self, production: &[usize]) -> bool {
        production.iter().all(|s| match &self.symbols[*s] {
            Symbol::Terminal(_) => false,
            Symbol::NonTerminal(nt) => nt.nullable,
        })
    }

    fn calculate_first(&mut self) {
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..self.symbols.len() {
                let first: HashSet<usize> = match &self.symbols[i] {
                    Symbol::Terminal(_) => continue,
                    Symbol::NonTerminal(nt) => {
                        nt.productions
                            .iter()
                            .fold(HashSet::new(), |mut first, production| {
                                first.extend(
                                    self.calculate_first_for_production(production).into_iter(),
                                );
                                first
                            })
                    }
                };

                let nt = self.symbols[i].mut_non_terminal().unwrap();
                if nt.first.len() != first.len() {
                    changed = true;
                    nt.first = first;
                }
            }
        }
    }

    fn calculate_follow(&mut self) {
        let epsilon = self.epsilon_index();
        let mut changed = true;
        while changed {
            changed = false;
            for a in 0..self.symbols.len() {
                if a == epsilon {
                    continue;
                }
                let (a_follow, productions) = match self.symbols[a].non_terminal() {
                    Some(nt) => (nt.follow.clone(), nt.productions.clone()),
                    None => continue,
                };
                for production in &productions {
                    for (i, &b) in production.iter().enumerate() {
                        if self.symbols[b].non_terminal().is_none() || b == epsilon {
                            continue;
                        }

                        // FIRST of everything after position i; if all of it
                        // can vanish, FOLLOW(A) flows into FOLLOW(B) too.
                        let mut addition: HashSet<usize> = HashSet::new();
                        let mut rest_vanishes = true;
                        for &next in &production[i + 1..] {
                            match &self.symbols[next] {
                                Symbol::Terminal(_) => {
                                    addition.insert(next);
                                    rest_vanishes = false;
                                    break;
                                }
                                Symbol::NonTerminal(nt) => {
                                    addition.extend(nt.first.iter().cloned());
                                    if !nt.nullable {
                                        rest_vanishes = false;
                                        break;
                                    }
                                }
                            }
                        }
                        if rest_vanishes {
                            addition.extend(a_follow.iter().cloned());
                        }

                        let b_nt = self.symbols[b].mut_non_terminal().unwrap();
                        let before = b_nt.follow.len();
                        b_nt.follow.extend(addition);
                        if b_nt.follow.len() != before {
                            changed = true;
                        }
                    }
                }
            }
        }
    }
}
