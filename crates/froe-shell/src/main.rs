use std::env;
use std::io;
use std::process::ExitCode;

use froe_core::{format_error, InterpOptions, Interpreter};

mod shell;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn help() -> ! {
    println!("Usage: froe [--repl] [-e CODE] [--max-depth N] [--version] [file ?arg…?]");
    println!();
    println!("Options:");
    println!("  --repl           Start the REPL, or enter it after running a script");
    println!("  -e CODE          Evaluate CODE and exit");
    println!("  --max-depth N    Maximum call depth (default 1024)");
    println!("  --version        Show version");
    println!("  -h, --help       Show this help");
    std::process::exit(0);
}

fn unknown_option(opt: &str) -> ! {
    eprintln!("unknown option: {}", opt);
    help();
}

fn main() -> ExitCode {
    let mut args = env::args().skip(1).collect::<Vec<_>>();

    let mut want_repl = false;
    let mut code: Option<String> = None;
    let mut options = InterpOptions::default();
    let mut file: Option<String> = None;
    let mut script_args: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        let arg = args[i].clone();
        match arg.as_str() {
            "--repl" => want_repl = true,
            "-e" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("-e requires an argument");
                    return ExitCode::FAILURE;
                }
                code = Some(args[i].clone());
            }
            "--max-depth" => {
                i += 1;
                let parsed = args.get(i).and_then(|s| s.parse::<usize>().ok());
                match parsed {
                    Some(n) if n > 0 => options.max_call_depth = n,
                    _ => {
                        eprintln!("--max-depth requires a positive integer");
                        return ExitCode::FAILURE;
                    }
                }
            }
            "--version" => {
                println!("froe {}", VERSION);
                return ExitCode::SUCCESS;
            }
            "-h" | "--help" => help(),
            opt if opt.starts_with('-') && opt.len() > 1 => unknown_option(opt),
            _ => {
                file = Some(args.remove(i));
                script_args = args.split_off(i);
                break;
            }
        }
        i += 1;
    }

    let interp = Interpreter::with_options(options);
    interp.set_stdout(Box::new(io::stdout()));
    interp.set_stderr(Box::new(io::stderr()));
    interp.set_stdin(Box::new(io::stdin()));
    shell::seed_args(&interp, &script_args);

    let mut failed = false;
    if let Some(code) = &code {
        failed = run(|| interp.eval(code));
    } else if let Some(file) = &file {
        failed = run(|| interp.eval_file(file));
    }

    if want_repl || (code.is_none() && file.is_none()) {
        shell::repl(&interp);
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(f: impl FnOnce() -> froe_core::FroeResult) -> bool {
    match f() {
        Ok(_) => false,
        Err(e) => {
            eprintln!("{}", format_error(&e));
            true
        }
    }
}
