// tamarin - A scripting language with a bytecode compiler and stack VM
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process;

use tamarin_embed::{Engine, EngineError};

const PROMPT: &str = ">>";

fn main() {
    let args: Vec<String> = env::args().collect();

    // Handle --version flag
    if args.len() == 2 && (args[1] == "--version" || args[1] == "-v") {
        println!("Tamarin v0.1.0");
        return;
    }

    let mut engine = Engine::new();

    // If files provided, evaluate them; otherwise start REPL
    if args.len() > 1 {
        run_files(&args[1..], &mut engine);
    } else {
        run_repl(&mut engine);
    }
}

/// Evaluate a sequence of source files through one session
fn run_files(files: &[String], engine: &mut Engine) {
    for file_path in files {
        if let Err(e) = eval_file(file_path, engine) {
            eprintln!("{}", e);
            process::exit(1);
        }
    }
}

/// Evaluate a single source file
fn eval_file(file_path: &str, engine: &mut Engine) -> Result<(), String> {
    let path = Path::new(file_path);

    // Validate file extension
    match path.extension().and_then(|e| e.to_str()) {
        Some("tam") => {}
        Some(ext) => {
            return Err(format!(
                "Error: unsupported file extension '.{}' for '{}'",
                ext, file_path
            ));
        }
        None => {
            return Err(format!(
                "Error: file '{}' has no extension (expected .tam)",
                file_path
            ));
        }
    }

    engine
        .eval_file(path)
        .map_err(|e| format!("Error in '{}': {}", file_path, e))?;

    Ok(())
}

/// Run the interactive REPL
fn run_repl(engine: &mut Engine) {
    println!("Tamarin v0.1.0");

    loop {
        print!("{}", PROMPT);
        io::stdout().flush().unwrap();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let input = input.trim();
                if input.is_empty() {
                    continue;
                }

                match engine.eval(input) {
                    Ok(value) => println!("{}", value.inspect()),
                    Err(EngineError::Parse(errors)) => {
                        println!("Woops! We ran into some errors here!");
                        println!("parser errors:");
                        for error in errors {
                            println!("\t{}", error);
                        }
                    }
                    Err(EngineError::Compile(e)) => {
                        println!("Compilation failed:\n {}", e);
                    }
                    Err(EngineError::Runtime(e)) => {
                        println!("Executing bytecode failed:\n {}", e);
                    }
                    Err(e) => println!("{}", e),
                }
            }
            Err(e) => {
                eprintln!("Read error: {}", e);
                break;
            }
        }
    }
}
