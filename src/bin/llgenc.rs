//! Command-line driver for the grammar compiler.
//!
//! Flag parsing, file I/O and help text are kept out of the library crate
//! on purpose: the compiler core only needs a source string and a
//! [`PipelineConfig`], so this binary is a thin translation from argv to
//! that call.

use std::fs;
use std::process::ExitCode;
use std::rc::Rc;

use llgen::pipeline::{self, PipelineConfig};
use llgen::util::Log;

struct Args {
    dump_ast: bool,
    dump_transformed: bool,
    print_sets: bool,
    suppress_output: bool,
    output: Option<String>,
    grammar_file: Option<String>,
    help: bool,
}

fn parse_args(raw: &[String]) -> Result<Args, String> {
    let mut args = Args {
        dump_ast: false,
        dump_transformed: false,
        print_sets: false,
        suppress_output: false,
        output: None,
        grammar_file: None,
        help: false,
    };
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" => args.help = true,
            "-d" => args.dump_ast = true,
            "-t" => args.dump_transformed = true,
            "-g" => args.print_sets = true,
            "-n" => args.suppress_output = true,
            "-o" => {
                let path = iter.next().ok_or_else(|| "-o requires a path".to_string())?;
                args.output = Some(path.clone());
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(format!("unknown option {}", other));
            }
            other => {
                if args.grammar_file.is_some() {
                    return Err("only one grammar file may be given".to_string());
                }
                args.grammar_file = Some(other.to_string());
            }
        }
    }
    Ok(args)
}

fn print_help() {
    println!("llgenc usage: llgenc [-h] [-d] [-t] [-g] [-n] [-o <path>] <grammar-file>");
    println!("-h          print this help message");
    println!("-d          dump the ast after parsing");
    println!("-t          dump the ast after transformation");
    println!("-g          print FIRST/FOLLOW sets");
    println!("-n          suppress emitted parser output");
    println!("-o <path>   write emitted parser to <path> instead of stdout");
}

fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{}", msg);
            print_help();
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    let path = match args.grammar_file {
        Some(p) => p,
        None => {
            eprintln!("missing grammar file");
            print_help();
            return ExitCode::FAILURE;
        }
    };

    let src = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("cannot read {}: {}", path, err);
            return ExitCode::FAILURE;
        }
    };

    let config = PipelineConfig {
        file_name: Rc::from(path.as_str()),
        log: Log::Default,
        dump_ast: args.dump_ast,
        dump_transformed: args.dump_transformed,
        print_sets: args.print_sets,
        skip_transform: false,
    };

    let out = pipeline::run(&src, config);

    for diag in &out.diagnostics {
        eprintln!("{}", diag);
    }

    if let Some(sets) = &out.sets {
        print!("{}", sets);
    }

    if !out.success {
        return ExitCode::FAILURE;
    }

    if !args.suppress_output {
        if let Some(code) = &out.code {
            match &args.output {
                Some(dest) => {
                    if let Err(err) = fs::write(dest, code) {
                        eprintln!("cannot write {}: {}", dest, err);
                        return ExitCode::FAILURE;
                    }
                }
                None => print!("{}", code),
            }
        }
    }

    ExitCode::SUCCESS
}
