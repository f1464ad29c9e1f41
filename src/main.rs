use std::env as std_env;
use std::process::ExitCode;

use log::{error, info, warn};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use scheme_core::{new_global_environment, parser, value::Value};

struct Args {
    file: Option<String>,
    interactive_after_load: bool,
}

fn parse_args() -> Args {
    let mut argv = std_env::args().skip(1);
    let mut file = None;
    let mut interactive_after_load = false;
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "-load" | "-i" | "--load" => {
                if let Some(path) = argv.next() {
                    file = Some(path);
                    interactive_after_load = true;
                }
            }
            other => file = Some(other.to_string()),
        }
    }
    Args {
        file,
        interactive_after_load,
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = parse_args();
    let global_env = new_global_environment();

    if let Some(path) = &args.file {
        info!("loading {path}");
        let load_expr = format!("(load {:?})", path);
        match parser::parse_one(&load_expr).and_then(|expr| scheme_core::eval(&expr, &global_env)) {
            Ok(_) => {}
            Err(e) => {
                error!("failed to load {path}: {e}");
                eprintln!("Error: {e}");
                if !args.interactive_after_load {
                    return ExitCode::FAILURE;
                }
            }
        }
        if !args.interactive_after_load {
            return ExitCode::SUCCESS;
        }
    }

    info!("starting REPL");
    println!("scheme-repl");
    println!("Press Ctrl-D to exit");

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            error!("failed to initialize line editor: {e}");
            return ExitCode::FAILURE;
        }
    };

    loop {
        match rl.readline("scm> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                run_line(&line, &global_env);
            }
            Err(ReadlineError::Interrupted) => {
                warn!("interrupted");
                println!("Interrupted");
                continue;
            }
            Err(ReadlineError::Eof) => {
                info!("exiting on EOF");
                break;
            }
            Err(e) => {
                error!("readline error: {e}");
                break;
            }
        }
    }
    ExitCode::SUCCESS
}

// Parses zero or more top-level expressions out of one line of input and
// evaluates each in turn. Each expression is its own error-isolation unit,
// a failing expression reports its error and evaluation continues with
// whatever bindings earlier, successful expressions already established.
fn run_line(line: &str, env: &scheme_core::Env) {
    let forms = match parser::parse(line) {
        Ok(forms) => forms,
        Err(e) => {
            eprintln!("Error: {e}");
            return;
        }
    };
    for form in forms {
        match scheme_core::eval(&form, env) {
            Ok(Value::Okay) => {}
            Ok(value) => println!("{value}"),
            Err(e) => {
                warn!("evaluation error: {e}");
                eprintln!("Error: {e}");
            }
        }
    }
}
