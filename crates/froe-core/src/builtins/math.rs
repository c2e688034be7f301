//! Comparison, boolean and arithmetic commands, plus the type-checking
//! commands (`bool`, `int`, `float`, `tuple`).

use crate::error::{FroeError, FroeResult};
use crate::interp::Interp;
use crate::proc::Procedure;
use crate::token::Token;

pub(crate) fn install(interp: &mut Interp) {
    interp.define("eq", cmd_eq);
    interp.define("==", cmd_eq);
    interp.define("ne", cmd_ne);
    interp.define("!=", cmd_ne);
    interp.define("not", cmd_not);
    interp.define("and", cmd_and);
    interp.define("or", cmd_or);
    interp.define("sum", cmd_sum);
    interp.define("+", cmd_sum);
    for name in ["lt", "<"] {
        interp.register(name, compare(|a, b| a < b));
    }
    for name in ["lte", "<="] {
        interp.register(name, compare(|a, b| a <= b));
    }
    for name in ["gt", ">"] {
        interp.register(name, compare(|a, b| a > b));
    }
    for name in ["gte", ">="] {
        interp.register(name, compare(|a, b| a >= b));
    }
    interp.define("bool", cmd_bool);
    interp.define("int", cmd_int);
    interp.define("float", cmd_float);
    interp.define("true", |_, _| Ok(Token::bool(true)));
    interp.define("false", |_, _| Ok(Token::bool(false)));
    interp.define("tuple", cmd_tuple);
}

/// `eq A B…` — true when every argument equals the first.
fn cmd_eq(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 3 {
        return Err(FroeError::ArgMinimum {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    let all = args[2..].iter().all(|t| t == &args[1]);
    Ok(Token::bool(all))
}

fn cmd_ne(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 3 {
        return Err(FroeError::ArgCount {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    Ok(Token::bool(args[1] != args[2]))
}

fn cmd_not(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 2 {
        return Err(FroeError::ArgCount {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    Ok(Token::bool(!args[1].as_bool()?))
}

fn cmd_and(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 3 {
        return Err(FroeError::ArgMinimum {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    for tok in &args[1..] {
        if !tok.as_bool()? {
            return Ok(Token::bool(false));
        }
    }
    Ok(Token::bool(true))
}

fn cmd_or(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 3 {
        return Err(FroeError::ArgMinimum {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    for tok in &args[1..] {
        if tok.as_bool()? {
            return Ok(Token::bool(true));
        }
    }
    Ok(Token::bool(false))
}

/// `sum N…` — integer sum of every argument.
fn cmd_sum(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 3 {
        return Err(FroeError::ArgMinimum {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    let mut total: i64 = 0;
    for tok in &args[1..] {
        total = total.wrapping_add(tok.as_int()?);
    }
    Ok(Token::int(total))
}

/// Build a dyadic integer comparison command.
fn compare(f: fn(i64, i64) -> bool) -> Procedure {
    Procedure::new(move |_interp, args| {
        if args.len() != 3 {
            return Err(FroeError::ArgCount {
                expected: 2,
                got: args.len().saturating_sub(1),
            });
        }
        Ok(Token::bool(f(args[1].as_int()?, args[2].as_int()?)))
    })
}

/// `bool TOK` — validate and return TOK; its bool view is now cached.
fn cmd_bool(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 2 {
        return Err(FroeError::ArgCount {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    args[1].as_bool()?;
    Ok(args[1].clone())
}

/// `int TOK…` — validate every argument as an integer; one argument comes
/// back itself, several come back as a list.
fn cmd_int(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 2 {
        return Err(FroeError::ArgMinimum {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    for tok in &args[1..] {
        tok.as_int()?;
    }
    if args.len() == 2 {
        return Ok(args[1].clone());
    }
    Ok(Token::from_list(args[1..].to_vec()))
}

fn cmd_float(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 2 {
        return Err(FroeError::ArgMinimum {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    for tok in &args[1..] {
        tok.as_float()?;
    }
    if args.len() == 2 {
        return Ok(args[1].clone());
    }
    Ok(Token::from_list(args[1..].to_vec()))
}

/// `tuple ALLOWED VALUE` — VALUE must equal one of the elements of the
/// ALLOWED list. Shaped for use as a coercer prefix.
fn cmd_tuple(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 3 {
        return Err(FroeError::ArgCount {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    args[2].as_tuple(&args[1].as_list())
}
