use thiserror::Error;

use crate::Grammar;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GrammarParseError {
    #[error("Line {0}: too many \"->\"")]
    TooManyArrows(usize),
    #[error("Line {0}: left side contains whitespace")]
    LeftSideContainsWhitespace(usize),
    #[error("Line {0}: empty left side")]
    EmptyLeftSide(usize),
    #[error("Line {0}: cannot find left side")]
    MissingLeftSide(usize),
}

impl Grammar {
    /// Parses declarations of the form `Head -> alt1 | alt2`, one head per
    /// line; a line starting with `|` continues the previous head.
    ///
    /// Classification is total and happens in two passes: every left side
    /// becomes a non-terminal first, then any right-hand symbol that is not
    /// a declared head (and not the epsilon marker) is a terminal.
    pub fn parse(grammar: &str) -> Result<Self, GrammarParseError> {
        let mut g = Self::new();

        let mut raw_productions: Vec<(usize, &str)> = Vec::new();

        let mut previous_left: Option<usize> = None;
        for (i, line) in grammar.lines().enumerate() {
            if line.chars().all(|c| c.is_whitespace()) {
                continue;
            }
            let parts: Vec<&str> = line.split("->").collect();
            if parts.len() > 2 {
                return Err(GrammarParseError::TooManyArrows(i + 1));
            }
            let (left, rights): (usize, &str) = if parts.len() == 2 {
                let left_str = parts[0].trim();
                if left_str.is_empty() {
                    return Err(GrammarParseError::EmptyLeftSide(i + 1));
                } else if left_str.split_whitespace().count() != 1 {
                    return Err(GrammarParseError::LeftSideContainsWhitespace(i + 1));
                } else {
                    (
                        if let Some(idx) = g.get_symbol_index(left_str) {
                            idx
                        } else {
                            g.add_non_terminal(left_str)
                        },
                        parts[1].trim(),
                    )
                }
            } else {
                match (previous_left, parts[0].trim().strip_prefix('|')) {
                    (Some(idx), Some(rest)) => (idx, rest.trim()),
                    _ => return Err(GrammarParseError::MissingLeftSide(i + 1)),
                }
            };

            previous_left = Some(left);

            raw_productions.push((left, rights));
        }

        for (left, rights) in raw_productions {
            for right in rights.split('|') {
                let symbols = right
                    .split_whitespace()
                    .map(|s| {
                        if let Some(idx) = g.get_symbol_index(s) {
                            idx
                        } else {
                            g.add_terminal(s.to_string())
                        }
                    })
                    .collect();
                g.add_production(left, symbols);
            }
        }

        let start_symbol: Option<usize> = if let Some(nt) = g.non_terminal_iter().next() {
            Some(g.symbol_table[&nt.name])
        } else {
            None
        };
        g.start_symbol = start_symbol;

        Ok(g)
    }
}
