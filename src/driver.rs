use std::fmt;

use crowbook_text_processing::escape;
use serde::Serialize;

use crate::grammar::{parse_table::PredictiveTable, Grammar, END_MARK};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepAction {
    Match {
        token: String,
    },
    Output {
        left: String,
        production: Vec<String>,
    },
    NoRuleForSymbol {
        non_terminal: String,
        token: String,
    },
    UnexpectedSymbol {
        expected: String,
        found: String,
    },
}

impl fmt::Display for StepAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepAction::Match { .. } => write!(f, "Match"),
            StepAction::Output { left, production } => {
                write!(f, "Output {} -> {}", left, production.join(" "))
            }
            StepAction::NoRuleForSymbol { .. } => write!(f, "Error: No rule for symbol"),
            StepAction::UnexpectedSymbol { .. } => write!(f, "Error: Unexpected symbol"),
        }
    }
}

/// One row of the parse trace: the machine state as it was when the action
/// was chosen. Stack is bottom to top; remaining input includes `$`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    pub stack: Vec<String>,
    pub remaining: Vec<String>,
    pub action: StepAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectReason {
    UnexpectedSymbol,
    InputNotFullyConsumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Accept,
    AcceptWithErrorCorrection,
    Reject(RejectReason),
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accept => write!(f, "accept"),
            Verdict::AcceptWithErrorCorrection => write!(f, "accepted with error correction"),
            Verdict::Reject(_) => write!(f, "Error"),
        }
    }
}

/// Where the driver publishes its steps. `Vec<TraceStep>` collects them;
/// callers wanting live output implement this instead of scraping text.
pub trait TraceSink {
    fn publish(&mut self, step: TraceStep);
}

impl TraceSink for Vec<TraceStep> {
    fn publish(&mut self, step: TraceStep) {
        self.push(step);
    }
}

/// What to do when the top non-terminal has no table cell for the current
/// token. Implementations must make progress on the stack or the input,
/// otherwise the parse loop will not terminate.
pub trait RecoveryPolicy {
    fn recover(&self, stack: &mut Vec<usize>, pointer: &mut usize);
}

/// Panic-mode recovery: drop the unmatched non-terminal and keep the token.
/// Best effort only; a popped symbol can desynchronize later predictions.
pub struct PanicModePop;

impl RecoveryPolicy for PanicModePop {
    fn recover(&self, stack: &mut Vec<usize>, _pointer: &mut usize) {
        stack.pop();
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    pub trace: Vec<TraceStep>,
    pub verdict: Verdict,
}

/// Table-driven predictive parser. Owns nothing: borrows the analyzed
/// grammar and its conflict-free table, and is driven one token stream per
/// `run` call.
pub struct Driver<'a> {
    grammar: &'a Grammar,
    table: &'a PredictiveTable,
    recovery: &'a dyn RecoveryPolicy,
}

impl<'a> Driver<'a> {
    pub fn new(grammar: &'a Grammar, table: &'a PredictiveTable) -> Self {
        Self {
            grammar,
            table,
            recovery: &PanicModePop,
        }
    }

    pub fn with_recovery(
        grammar: &'a Grammar,
        table: &'a PredictiveTable,
        recovery: &'a dyn RecoveryPolicy,
    ) -> Self {
        Self {
            grammar,
            table,
            recovery,
        }
    }

    pub fn run(&self, tokens: &[String]) -> ParseOutcome {
        let mut trace: Vec<TraceStep> = Vec::new();
        let verdict = self.run_with_sink(tokens, &mut trace);
        ParseOutcome { trace, verdict }
    }

    /// The stack machine. Per step, with `top` the stack top and `cur` the
    /// current token: a spelling match consumes both; a mismatched terminal
    /// (or `$`) top rejects the run; a table cell expands `top`; a missing
    /// cell records the error and lets the recovery policy decide.
    pub fn run_with_sink(&self, tokens: &[String], sink: &mut dyn TraceSink) -> Verdict {
        let epsilon = self.grammar.epsilon_index();
        let mut stack: Vec<usize> = vec![self.grammar.end_mark_index()];
        if let Some(start) = self.grammar.start_symbol {
            stack.push(start);
        }
        let input: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(END_MARK))
            .collect();
        let mut pointer: usize = 0;
        let mut error_corrected = false;

        while let Some(&top) = stack.last() {
            let current = input.get(pointer).copied().unwrap_or(END_MARK);
            let top_name = self.grammar.get_symbol_name(top);
            let snapshot: Vec<String> = stack
                .iter()
                .map(|&s| self.grammar.get_symbol_name(s).to_string())
                .collect();
            let remaining: Vec<String> =
                input[pointer.min(input.len())..].iter().map(|s| s.to_string()).collect();

            if top_name == current {
                sink.publish(TraceStep {
                    stack: snapshot,
                    remaining,
                    action: StepAction::Match {
                        token: current.to_string(),
                    },
                });
                stack.pop();
                pointer += 1;
            } else if self.grammar.is_terminal(top) {
                sink.publish(TraceStep {
                    stack: snapshot,
                    remaining,
                    action: StepAction::UnexpectedSymbol {
                        expected: top_name.to_string(),
                        found: current.to_string(),
                    },
                });
                return Verdict::Reject(RejectReason::UnexpectedSymbol);
            } else if let Some(production) = self.table.production(self.grammar, top, current) {
                sink.publish(TraceStep {
                    stack: snapshot,
                    remaining,
                    action: StepAction::Output {
                        left: top_name.to_string(),
                        production: self
                            .grammar
                            .production_to_vec_str(production)
                            .iter()
                            .map(|s| s.to_string())
                            .collect(),
                    },
                });
                stack.pop();
                for &symbol in production.iter().rev() {
                    if symbol != epsilon {
                        stack.push(symbol);
                    }
                }
            } else {
                sink.publish(TraceStep {
                    stack: snapshot,
                    remaining,
                    action: StepAction::NoRuleForSymbol {
                        non_terminal: top_name.to_string(),
                        token: current.to_string(),
                    },
                });
                error_corrected = true;
                self.recovery.recover(&mut stack, &mut pointer);
            }
        }

        if pointer == input.len() {
            if error_corrected {
                Verdict::AcceptWithErrorCorrection
            } else {
                Verdict::Accept
            }
        } else {
            Verdict::Reject(RejectReason::InputNotFullyConsumed)
        }
    }
}

impl ParseOutcome {
    pub fn to_plaintext(&self) -> String {
        let mut output: Vec<Vec<String>> = vec![vec![
            "Stack".to_string(),
            "Input".to_string(),
            "Action".to_string(),
        ]];
        for step in &self.trace {
            output.push(vec![
                step.stack.join(" "),
                step.remaining.join(" "),
                step.action.to_string(),
            ]);
        }

        let width: Vec<usize> = (0..output[0].len())
            .map(|j| output.iter().map(|row| row[j].len()).max().unwrap())
            .collect();

        let table = output
            .iter()
            .map(|line| {
                line.iter()
                    .enumerate()
                    .map(|(i, s)| format!("{:<width$}", s, width = width[i]))
                    .collect::<Vec<_>>()
                    .join(" | ")
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!("{}\n{}", table, self.verdict)
    }

    pub fn to_latex(&self) -> String {
        let content = self
            .trace
            .iter()
            .map(|step| {
                format!(
                    "\\text{{{}}} & \\text{{{}}} & \\text{{{}}}",
                    escape::tex(&step.stack.join(" ")),
                    escape::tex(&step.remaining.join(" ")),
                    escape::tex(&step.action.to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("\\\\\n");

        "\\begin{tabular}{l|l|l}\n".to_string()
            + "Stack & Input & Action\\\\\\hline\n"
            + &content
            + "\\\\\\hline\n"
            + &format!("\\multicolumn{{3}}{{l}}{{{}}}\\\\\n", self.verdict)
            + "\\end{tabular}"
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap()
    }
}
