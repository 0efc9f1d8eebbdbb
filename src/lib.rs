extern crate wasm_bindgen;

use wasm_bindgen::prelude::*;

pub mod driver;
pub mod grammar;
pub mod lexer;

pub use driver::{Driver, PanicModePop, ParseOutcome, RecoveryPolicy, TraceSink, Verdict};
pub use grammar::{Grammar, Ll1Conflict, PredictiveTable};
pub use lexer::tokenize;

fn error_json(e: impl std::fmt::Display) -> String {
    serde_json::json!({ "error": e.to_string() }).to_string()
}

#[wasm_bindgen]
pub fn nullable_first_follow_to_json(grammar: &str) -> String {
    match Grammar::parse(grammar) {
        Ok(mut g) => {
            g.calculate_nullable_first_follow();
            g.to_non_terminal_output_vec().to_json()
        }
        Err(e) => error_json(e),
    }
}

#[wasm_bindgen]
pub fn predictive_table_to_json(grammar: &str) -> String {
    match Grammar::parse(grammar) {
        Ok(mut g) => {
            g.calculate_nullable_first_follow();
            match g.build_predictive_table() {
                Ok(table) => table.to_output(&g).to_json(),
                Err(e) => error_json(e),
            }
        }
        Err(e) => error_json(e),
    }
}

#[wasm_bindgen]
pub fn parse_input_to_json(grammar: &str, input: &str) -> String {
    let mut g = match Grammar::parse(grammar) {
        Ok(g) => g,
        Err(e) => return error_json(e),
    };
    g.calculate_nullable_first_follow();
    let table = match g.build_predictive_table() {
        Ok(table) => table,
        Err(e) => return error_json(e),
    };
    let tokens = match lexer::tokenize(input) {
        Ok(tokens) => tokens,
        Err(e) => return error_json(e),
    };
    Driver::new(&g, &table).run(&tokens).to_json()
}

#[cfg(test)]
fn analyzed(grammar: &str) -> Grammar {
    let mut g = Grammar::parse(grammar).unwrap();
    g.calculate_nullable_first_follow();
    g
}

#[cfg(test)]
const EXPRESSION_GRAMMAR: &str = "E -> T E'
E' -> + T E' | ε
T -> F T'
T' -> * F T' | ε
F -> ( E ) | id";

#[cfg(test)]
mod parse_tests {
    use crate::grammar::parse::GrammarParseError;
    use crate::grammar::EPSILON;

    #[test]
    fn simple_parse() {
        let g = crate::Grammar::parse("S -> a").unwrap();

        let s = g.symbol_table.get("S").unwrap().clone();
        let a = g.symbol_table.get("a").unwrap().clone();
        let epsilon = g.symbol_table.get(EPSILON).unwrap().clone();

        assert_eq!(g.get_symbol_name(s), "S");
        assert_eq!(g.get_symbol_name(a), "a");

        assert_eq!(g.symbols[epsilon].non_terminal().unwrap().nullable, true);

        assert_eq!(g.symbols[s].non_terminal().unwrap().productions[0], vec![a]);
    }

    #[test]
    fn simple_parse_with_space() {
        let g = crate::Grammar::parse("  S -> a ").unwrap();

        let s = g.symbol_table.get("S").unwrap().clone();
        let a = g.symbol_table.get("a").unwrap().clone();

        assert_eq!(g.get_symbol_name(s), "S");
        assert_eq!(g.get_symbol_name(a), "a");

        assert_eq!(g.symbols[s].non_terminal().unwrap().productions[0], vec![a]);
    }

    #[test]
    fn simple_parse_with_space_and_newline() {
        let g = crate::Grammar::parse("  S -> a \n | b c").unwrap();

        let s = g.symbol_table.get("S").unwrap().clone();
        let a = g.symbol_table.get("a").unwrap().clone();
        let b = g.symbol_table.get("b").unwrap().clone();
        let c = g.symbol_table.get("c").unwrap().clone();

        assert_eq!(g.symbols[s].non_terminal().unwrap().productions[0], vec![a]);
        assert_eq!(
            g.symbols[s].non_terminal().unwrap().productions[1],
            vec![b, c]
        );
    }

    #[test]
    fn empty_parse() {
        let g = crate::Grammar::parse("  \n  ").unwrap();
        assert_eq!(g.start_symbol, None);
    }

    #[test]
    fn epsilon_alias_parse() {
        let g = crate::Grammar::parse("S -> a | ''").unwrap();

        let s = g.symbol_table["S"];
        let epsilon = g.symbol_table[EPSILON];
        assert_eq!(g.symbols[s].non_terminal().unwrap().productions[1], vec![epsilon]);
    }

    #[test]
    fn heads_beat_naming_conventions() {
        // a lowercase head is still a non-terminal, even when it is used
        // on a right side before its own declaration
        let g = crate::Grammar::parse("S -> expr a\nexpr -> b").unwrap();

        let expr = g.symbol_table["expr"];
        assert!(g.symbols[expr].non_terminal().is_some());
        assert!(g.is_terminal(g.symbol_table["a"]));
        assert!(g.is_terminal(g.symbol_table["b"]));
    }

    #[test]
    fn first_declared_head_is_start() {
        let g = crate::Grammar::parse("A -> B\nB -> b").unwrap();
        assert_eq!(g.start_symbol, Some(g.symbol_table["A"]));
    }

    #[test]
    fn two_rightarrows_parse() {
        assert_eq!(
            crate::Grammar::parse("S -> a -> b").unwrap_err(),
            GrammarParseError::TooManyArrows(1)
        );
    }

    #[test]
    fn no_left_parse() {
        assert_eq!(
            crate::Grammar::parse("-> a").unwrap_err(),
            GrammarParseError::EmptyLeftSide(1)
        );
    }

    #[test]
    fn no_previous_left_parse() {
        assert_eq!(
            crate::Grammar::parse("| a b\n S -> a").unwrap_err(),
            GrammarParseError::MissingLeftSide(1)
        );
    }

    #[test]
    fn left_contain_space() {
        assert_eq!(
            crate::Grammar::parse("S a S -> x").unwrap_err(),
            GrammarParseError::LeftSideContainsWhitespace(1)
        );
    }
}



#[cfg(test)]
mod lexer_tests {
    use crate::lexer::{tokenize, LexError};

    #[test]
    fn id_and_operators() {
        assert_eq!(tokenize("id+id").unwrap(), ["id", "+", "id"]);
        assert_eq!(
            tokenize("(id+id)*id").unwrap(),
            ["(", "id", "+", "id", ")", "*", "id"]
        );
    }

    #[test]
    fn whitespace_is_skipped() {
        assert_eq!(tokenize("  id\t+ id \n").unwrap(), ["id", "+", "id"]);
        assert_eq!(tokenize("").unwrap(), Vec::<String>::new());
    }

    #[test]
    fn id_wins_over_bare_letters() {
        assert_eq!(tokenize("idid").unwrap(), ["id", "id"]);
        assert_eq!(tokenize("ix").unwrap(), ["i", "x"]);
        assert_eq!(tokenize("i d").unwrap(), ["i", "d"]);
    }

    #[test]
    fn bare_letters_pass_through() {
        assert_eq!(tokenize("a b E").unwrap(), ["a", "b", "E"]);
    }

    #[test]
    fn unexpected_character_reports_offset() {
        assert_eq!(
            tokenize("id # id").unwrap_err(),
            LexError::UnexpectedCharacter { ch: '#', position: 3 }
        );
        assert_eq!(
            tokenize("#").unwrap_err(),
            LexError::UnexpectedCharacter { ch: '#', position: 0 }
        );
    }
}

#[cfg(test)]
mod driver_tests {
    use crate::driver::{RejectReason, StepAction, TraceStep, TraceSink, RecoveryPolicy};
    use crate::{analyzed, tokenize, Driver, Verdict, EXPRESSION_GRAMMAR};

    fn tokens(input: &str) -> Vec<String> {
        tokenize(input).unwrap()
    }

    #[test]
    fn accepts_expression_cleanly() {
        let g = analyzed(EXPRESSION_GRAMMAR);
        let table = g.build_predictive_table().unwrap();
        let outcome = Driver::new(&g, &table).run(&tokens("id + id * id"));

        assert_eq!(outcome.verdict, Verdict::Accept);
        // 5 input tokens plus the end marker
        let matches = outcome
            .trace
            .iter()
            .filter(|s| matches!(s.action, StepAction::Match { .. }))
            .count();
        assert_eq!(matches, 6);
        assert_eq!(outcome.trace[0].stack, ["$", "E"]);
        assert_eq!(outcome.trace[0].remaining, ["id", "+", "id", "*", "id", "$"]);
    }

    #[test]
    fn missing_cell_recovers_with_one_pop() {
        let g = analyzed(EXPRESSION_GRAMMAR);
        let table = g.build_predictive_table().unwrap();
        let outcome = Driver::new(&g, &table).run(&tokens("id +"));

        assert_eq!(outcome.verdict, Verdict::AcceptWithErrorCorrection);
        let recoveries: Vec<usize> = outcome
            .trace
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s.action, StepAction::NoRuleForSymbol { .. }))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(recoveries.len(), 1);

        // pop without push: one symbol shorter, no token consumed
        let i = recoveries[0];
        assert_eq!(outcome.trace[i + 1].stack.len(), outcome.trace[i].stack.len() - 1);
        assert_eq!(outcome.trace[i + 1].remaining, outcome.trace[i].remaining);
    }

    #[test]
    fn terminal_mismatch_is_fatal() {
        let g = analyzed(EXPRESSION_GRAMMAR);
        let table = g.build_predictive_table().unwrap();
        let outcome = Driver::new(&g, &table).run(&tokens("id )"));

        assert_eq!(outcome.verdict, Verdict::Reject(RejectReason::UnexpectedSymbol));
        assert!(matches!(
            outcome.trace.last().unwrap().action,
            StepAction::UnexpectedSymbol { .. }
        ));
    }

    #[test]
    fn leftover_input_is_rejected() {
        // an explicit end-marker token empties the stack while real input
        // remains
        let g = analyzed("S -> ε");
        let table = g.build_predictive_table().unwrap();
        let outcome = Driver::new(&g, &table).run(&["$".to_string()]);

        assert_eq!(
            outcome.verdict,
            Verdict::Reject(RejectReason::InputNotFullyConsumed)
        );
    }

    #[test]
    fn empty_input_on_nullable_grammar() {
        let g = analyzed("S -> ε");
        let table = g.build_predictive_table().unwrap();
        let outcome = Driver::new(&g, &table).run(&[]);
        assert_eq!(outcome.verdict, Verdict::Accept);
    }

    #[test]
    fn stack_stays_bounded() {
        let g = analyzed(EXPRESSION_GRAMMAR);
        let table = g.build_predictive_table().unwrap();
        let input = tokens("( ( id + id ) * id ) + id");
        let outcome = Driver::new(&g, &table).run(&input);

        assert_eq!(outcome.verdict, Verdict::Accept);
        let deepest = outcome.trace.iter().map(|s| s.stack.len()).max().unwrap();
        assert!(deepest <= 4 * (input.len() + 1), "stack grew to {}", deepest);
    }

    #[test]
    fn recovery_policy_is_pluggable() {
        struct TokenSkip;
        impl RecoveryPolicy for TokenSkip {
            fn recover(&self, _stack: &mut Vec<usize>, pointer: &mut usize) {
                *pointer += 1;
            }
        }

        let g = analyzed(EXPRESSION_GRAMMAR);
        let table = g.build_predictive_table().unwrap();
        let outcome = Driver::with_recovery(&g, &table, &TokenSkip).run(&tokens("id id"));

        // the second id is skipped instead of the stack being popped
        assert_eq!(outcome.verdict, Verdict::AcceptWithErrorCorrection);
    }

    #[test]
    fn steps_reach_an_injected_sink() {
        struct Counter(usize);
        impl TraceSink for Counter {
            fn publish(&mut self, _step: TraceStep) {
                self.0 += 1;
            }
        }

        let g = analyzed(EXPRESSION_GRAMMAR);
        let table = g.build_predictive_table().unwrap();
        let driver = Driver::new(&g, &table);

        let mut counter = Counter(0);
        driver.run_with_sink(&tokens("id + id"), &mut counter);
        assert_eq!(counter.0, driver.run(&tokens("id + id")).trace.len());
    }

    #[test]
    fn verdict_strings() {
        assert_eq!(Verdict::Accept.to_string(), "accept");
        assert_eq!(
            Verdict::AcceptWithErrorCorrection.to_string(),
            "accepted with error correction"
        );
        assert_eq!(
            Verdict::Reject(RejectReason::UnexpectedSymbol).to_string(),
            "Error"
        );
    }
}

#[cfg(test)]
mod export_tests {
    #[test]
    fn nff_export_round_trips() {
        let json = crate::nullable_first_follow_to_json("S -> a");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["data"][0]["name"], "S");
    }

    #[test]
    fn table_export_reports_conflicts() {
        let json = crate::predictive_table_to_json("A -> a | a b");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["error"].as_str().unwrap().contains("M[A, a]"));
    }

    #[test]
    fn parse_export_reports_verdict() {
        let json = crate::parse_input_to_json(crate::EXPRESSION_GRAMMAR, "id + id * id");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["verdict"], "Accept");
    }

    #[test]
    fn parse_export_reports_lex_errors() {
        let json = crate::parse_input_to_json(crate::EXPRESSION_GRAMMAR, "id # id");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["error"].as_str().unwrap().contains("position 3"));
    }
}
