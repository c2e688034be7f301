//! The interactive shell: a line editor over one interpreter.

use std::path::PathBuf;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use froe_core::{format_error, FroeError, Interpreter, Token};

/// Expose the script's command-line arguments as the `argv` list variable.
pub fn seed_args(interp: &Interpreter, args: &[String]) {
    let toks: Vec<Token> = args.iter().map(Token::new).collect();
    let _ = interp.set_var("argv", Token::from_list(toks));
}

fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".froe_history"))
}

fn prompt(interp: &Interpreter, continuation: bool) -> String {
    if continuation {
        return "… ".to_string();
    }
    interp
        .get_var("PROMPT")
        .map(|t| t.text().to_string())
        .unwrap_or_else(|_| "? ".to_string())
}

pub fn repl(interp: &Interpreter) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("could not start line editor: {}", e);
            return;
        }
    };
    let hist_path = history_path();
    if let Some(path) = &hist_path {
        let _ = rl.load_history(path);
    }
    if interp.get_var("PROMPT").is_err() {
        let _ = interp.set_var("PROMPT", Token::new("? "));
    }
    println!("froe {}. :q to quit.", env!("CARGO_PKG_VERSION"));

    let mut pending = String::new();
    loop {
        let line = match rl.readline(&prompt(interp, !pending.is_empty())) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                pending.clear();
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("repl: {}", e);
                break;
            }
        };

        if pending.is_empty() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed == ":q" || trimmed == ":quit" {
                break;
            }
        }

        if !pending.is_empty() {
            pending.push('\n');
        }
        pending.push_str(&line);

        // keep reading while braces, brackets or quotes are open
        if !interp.is_complete(&pending) {
            continue;
        }

        let src = std::mem::take(&mut pending);
        let _ = rl.add_history_entry(src.trim());
        if let Some(path) = &hist_path {
            let _ = rl.save_history(path);
        }

        match interp.eval(&src) {
            Ok(out) => {
                if !out.text().is_empty() {
                    println!("{}", out);
                }
            }
            Err(e) => print_error(&e),
        }
    }
}

fn print_error(err: &FroeError) {
    if err.is_signal() {
        // a stray break/continue/tailcall at the top level
        eprintln!("{}", format_error(&FroeError::Message(format!(
            "{} called outside of its catcher",
            err
        ))));
        return;
    }
    eprintln!("{}", format_error(err));
}
