pub mod driver;
pub mod grammar;
pub mod lexer;

use std::{fs, io::BufRead};

use driver::Driver;
pub use grammar::Grammar;

fn print_help() {
    println!("Usage: ll1-parse-helper outputs [options] [grammar file]");
    println!("outputs:");
    println!("  prod: Productions");
    println!("  nff: Nullable first and follow");
    println!("  ll1: LL(1) predictive parse table");
    println!("  run: Tokenize an input string and trace the predictive parse");
    println!("options:");
    println!("  -h: Print this help");
    println!("  -l: Print in LaTeX format");
    println!("  -j: Print in JSON format");
    println!("  -i <string>: Input string for run (default: read one line from stdin)");
}

fn main() {
    let mut outputs: Vec<&str> = Vec::new();
    let args = std::env::args().skip(1).collect::<Vec<String>>();
    let mut i: usize = 0;
    while i < args.len() && ["prod", "nff", "ll1", "run"].contains(&args[i].as_str()) {
        outputs.push(args[i].as_str());
        i += 1;
    }

    enum OutputFormat {
        Plain,
        LaTeX,
        Json,
    }
    let mut output_format = OutputFormat::Plain;
    let mut input_string: Option<String> = None;

    while i < args.len() && ["-h", "--help", "-l", "-j", "-i"].contains(&args[i].as_str()) {
        if args[i] == "-h" || args[i] == "--help" {
            print_help();
            return;
        } else if args[i] == "-l" {
            output_format = OutputFormat::LaTeX;
        } else if args[i] == "-j" {
            output_format = OutputFormat::Json;
        } else if args[i] == "-i" {
            i += 1;
            if i == args.len() {
                print_help();
                return;
            }
            input_string = Some(args[i].clone());
        }
        i += 1;
    }

    if i + 1 < args.len() || outputs.is_empty() {
        print_help();
        return;
    }

    let grammar_text: String = if i == args.len() {
        std::io::stdin()
            .lock()
            .lines()
            .map(|l| l.unwrap())
            .collect::<Vec<String>>()
            .join("\n")
    } else {
        fs::read_to_string(args[i].as_str()).expect("Failed to read file")
    };

    let mut g = match Grammar::parse(&grammar_text) {
        Ok(g) => g,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    g.calculate_nullable_first_follow();

    for output in outputs {
        if output == "prod" {
            let t = g.to_production_output_vec();
            println!(
                "{}",
                match output_format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::Json => t.to_json(),
                }
            );
        }
        if output == "nff" {
            let t = g.to_non_terminal_output_vec();
            println!(
                "{}",
                match output_format {
                    OutputFormat::Plain => t.to_plaintext(),
                    OutputFormat::LaTeX => t.to_latex(),
                    OutputFormat::Json => t.to_json(),
                }
            );
        }
        if output == "ll1" {
            match g.build_predictive_table() {
                Ok(table) => {
                    let t = table.to_output(&g);
                    println!(
                        "{}",
                        match output_format {
                            OutputFormat::Plain => t.to_plaintext(),
                            OutputFormat::LaTeX => t.to_latex(),
                            OutputFormat::Json => t.to_json(),
                        }
                    );
                }
                Err(e) => {
                    eprintln!("{}", e);
                    println!("Grammar is not LL(1)");
                }
            }
        }
        if output == "run" {
            let table = match g.build_predictive_table() {
                Ok(table) => table,
                Err(e) => {
                    eprintln!("{}", e);
                    println!("Grammar is not LL(1)");
                    continue;
                }
            };
            let raw = match &input_string {
                Some(s) => s.clone(),
                None => {
                    let mut line = String::new();
                    std::io::stdin()
                        .read_line(&mut line)
                        .expect("Failed to read input string");
                    line.trim().to_string()
                }
            };
            let tokens = match lexer::tokenize(&raw) {
                Ok(tokens) => tokens,
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            };
            let outcome = Driver::new(&g, &table).run(&tokens);
            println!(
                "{}",
                match output_format {
                    OutputFormat::Plain => outcome.to_plaintext(),
                    OutputFormat::LaTeX => outcome.to_latex(),
                    OutputFormat::Json => outcome.to_json(),
                }
            );
        }
    }
}
