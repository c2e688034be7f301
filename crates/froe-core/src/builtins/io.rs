//! Output, input, and the `log::` level commands.

use std::io::{Read, Write};

use crate::error::{FroeError, FroeResult};
use crate::interp::Interp;
use crate::token::{join, Token};

pub(crate) fn install(interp: &mut Interp) {
    interp.define("print", |interp, args| print(interp, args, false));
    interp.define("println", |interp, args| print(interp, args, true));
    interp.define("readline", cmd_readline);
    for (name, label, to_stderr) in [
        ("log::debug", "DEBUG", false),
        ("log::info", "INFO", false),
        ("log::warn", "WARN", true),
        ("log::error", "ERROR", true),
    ] {
        interp.define(name, move |interp: &mut Interp, args: &[Token]| {
            let line = format!("{} {}\n", label, join(&args[1..], " "));
            let sink = if to_stderr {
                &mut interp.stderr
            } else {
                &mut interp.stdout
            };
            let _ = sink.write_all(line.as_bytes());
            Ok(Token::empty())
        });
    }
}

/// `print ARG…` / `println ARG…` — arguments joined by single spaces.
fn print(interp: &mut Interp, args: &[Token], newline: bool) -> FroeResult {
    let mut out = join(&args[1..], " ");
    if newline {
        out.push('\n');
    }
    interp
        .stdout
        .write_all(out.as_bytes())
        .map_err(|e| FroeError::message(format!("write failed: {}", e)))?;
    Ok(Token::empty())
}

/// `readline` — one line from the interpreter's stdin, without the
/// terminator; the empty token at end of input. Reads a byte at a time so
/// nothing past the newline is consumed.
fn cmd_readline(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 1 {
        return Err(FroeError::ArgCount {
            expected: 0,
            got: args.len() - 1,
        });
    }
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match interp.stdin.read(&mut byte) {
            Ok(0) => break,
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                line.push(byte[0]);
            }
            Err(e) => return Err(FroeError::message(format!("read failed: {}", e))),
        }
    }
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Ok(Token::new(String::from_utf8_lossy(&line).into_owned()))
}
