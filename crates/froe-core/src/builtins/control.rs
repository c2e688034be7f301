//! Control flow: branching, loops, and the signal-raising commands.

use crate::error::{FroeError, FroeResult};
use crate::interp::Interp;
use crate::token::Token;

pub(crate) fn install(interp: &mut Interp) {
    interp.define("if", cmd_if);
    interp.define("while", cmd_while);
    interp.define("for", cmd_for);
    interp.define("foreach", cmd_foreach);
    interp.define("do", cmd_do);
    interp.define("break", cmd_break);
    interp.define("continue", cmd_continue);
    interp.define("return", cmd_return);
    interp.define("tailcall", cmd_tailcall);
    interp.define("catch", cmd_catch);
    interp.define("throw", cmd_throw);
}

/// `if COND ?then? BODY ?elseif COND ?then? BODY …? ?else BODY?`
fn cmd_if(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 3 {
        return Err(FroeError::ArgMinimum {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }

    let mut arg = 1;
    loop {
        let cond = interp.exec_token(&args[arg])?;
        let truthy = cond.as_bool()?;
        arg += 1;
        if arg >= args.len() {
            return Err(FroeError::Syntax("if: missing body".into()));
        }
        if args[arg].text() == "then" {
            arg += 1;
            if arg >= args.len() {
                return Err(FroeError::Syntax("if: missing body after then".into()));
            }
        }
        if truthy {
            return interp.exec_token(&args[arg]);
        }
        arg += 1;
        if arg >= args.len() {
            return Ok(Token::empty());
        }
        match args[arg].text() {
            "elseif" => {
                arg += 1;
                if arg >= args.len() {
                    return Err(FroeError::Syntax("if: missing condition after elseif".into()));
                }
            }
            "else" => {
                arg += 1;
                if arg >= args.len() {
                    return Err(FroeError::Syntax("if: missing body after else".into()));
                }
                return interp.exec_token(&args[arg]);
            }
            // anything else reads as the next condition in the chain
            _ => {}
        }
    }
}

/// `while COND BODY` — evaluates COND before each pass. `break` exits the
/// loop with its value; `continue` skips to the next pass.
fn cmd_while(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 3 {
        return Err(FroeError::ArgCount {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }

    let mut ret = Token::empty();
    loop {
        let cond = interp
            .exec_token(&args[1])
            .map_err(|e| if e.is_signal() { e } else { e.context("while condition") })?;
        let truthy = cond
            .as_bool()
            .map_err(|_| FroeError::message(format!(
                "condition for while returned a non-bool value: {}",
                cond.text()
            )))?;
        if !truthy {
            return Ok(ret);
        }
        match interp.exec_token(&args[2]) {
            Ok(v) => ret = v,
            Err(FroeError::Break(v)) => return Ok(v),
            Err(FroeError::Continue) => {}
            Err(e) => return Err(e),
        }
    }
}

/// `for START COND NEXT BODY` — counted loop. `continue` still runs NEXT.
fn cmd_for(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 5 {
        return Err(FroeError::ArgCount {
            expected: 4,
            got: args.len().saturating_sub(1),
        });
    }

    interp.exec_token(&args[1])?;
    let mut ret = Token::empty();
    loop {
        let cond = interp
            .exec_token(&args[2])
            .map_err(|e| if e.is_signal() { e } else { e.context("for condition") })?;
        if !cond.as_bool()? {
            return Ok(ret);
        }
        match interp.exec_token(&args[4]) {
            Ok(v) => ret = v,
            Err(FroeError::Break(v)) => return Ok(v),
            Err(FroeError::Continue) => {}
            Err(e) => return Err(e),
        }
        interp.exec_token(&args[3])?;
    }
}

/// `foreach VAR LIST BODY` — binds each element of LIST to VAR in turn.
fn cmd_foreach(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 4 {
        return Err(FroeError::ArgCount {
            expected: 3,
            got: args.len().saturating_sub(1),
        });
    }

    let name = args[1].text().to_string();
    let mut ret = Token::empty();
    for elem in args[2].as_list() {
        interp.set_var(&name, elem)?;
        match interp.exec_token(&args[3]) {
            Ok(v) => ret = v,
            Err(FroeError::Break(v)) => return Ok(v),
            Err(FroeError::Continue) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(ret)
}

/// `do BODY ?while COND?` / `do BODY until COND` — runs BODY at least once.
fn cmd_do(interp: &mut Interp, args: &[Token]) -> FroeResult {
    let (keyword, cond) = match args.len() {
        2 => (None, None),
        4 => match args[2].text() {
            "while" | "until" => (Some(args[2].text().to_string()), Some(&args[3])),
            other => {
                return Err(FroeError::Syntax(format!(
                    "do: expected while or until, got {}",
                    other
                )))
            }
        },
        n => {
            return Err(FroeError::ArgCount {
                expected: 3,
                got: n.saturating_sub(1),
            })
        }
    };

    let mut ret = Token::empty();
    loop {
        match interp.exec_token(&args[1]) {
            Ok(v) => ret = v,
            Err(FroeError::Break(v)) => return Ok(v),
            Err(FroeError::Continue) => {}
            Err(e) => return Err(e),
        }
        let (Some(keyword), Some(cond)) = (&keyword, cond) else {
            return Ok(ret);
        };
        let truthy = interp.exec_token(cond)?.as_bool()?;
        let stop = match keyword.as_str() {
            "while" => !truthy,
            _ => truthy,
        };
        if stop {
            return Ok(ret);
        }
    }
}

fn cmd_break(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() == 2 {
        return Err(FroeError::Break(args[1].clone()));
    }
    Err(FroeError::Break(Token::empty()))
}

fn cmd_continue(_interp: &mut Interp, _args: &[Token]) -> FroeResult {
    Err(FroeError::Continue)
}

fn cmd_return(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() == 2 {
        return Err(FroeError::Return(args[1].clone()));
    }
    Err(FroeError::Return(Token::empty()))
}

/// `tailcall ARG…` — signals the enclosing procedure to rebind its
/// arguments and rerun its body without growing the call stack.
fn cmd_tailcall(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    Err(FroeError::Tailcall(Token::from_list(args.to_vec())))
}

/// `catch BODY ?resvar? ?errvar?` — evaluates BODY. Yields false and binds
/// `resvar` on success; yields true and binds `errvar` to the error text on
/// a value error. Control-flow signals pass through untouched.
fn cmd_catch(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 2 || args.len() > 4 {
        return Err(FroeError::ArgCount {
            expected: 3,
            got: args.len().saturating_sub(1),
        });
    }
    let resvar = args.get(2).map(|t| t.text().to_string());
    let errvar = args.get(3).map(|t| t.text().to_string());

    match interp.exec_token(&args[1]) {
        Ok(v) => {
            if let Some(resvar) = resvar {
                interp.set_var(&resvar, v)?;
            }
            if let Some(errvar) = errvar {
                interp.set_var(&errvar, Token::empty())?;
            }
            Ok(Token::bool(false))
        }
        Err(e) if e.is_signal() => Err(e),
        Err(e) => {
            if let Some(resvar) = resvar {
                interp.set_var(&resvar, Token::empty())?;
            }
            if let Some(errvar) = errvar {
                interp.set_var(&errvar, Token::new(e.to_string()))?;
            }
            Ok(Token::bool(true))
        }
    }
}

/// `throw TOK` — raises a value error whose text is the token's text. The
/// token itself is carried, so hosts can match thrown values by equality.
fn cmd_throw(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 2 {
        return Err(FroeError::ArgCount {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    Err(FroeError::Thrown(args[1].clone()))
}
