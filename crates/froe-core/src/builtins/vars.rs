//! Variable commands: `set`, `del`, `subst`, `var`, `trace`.

use crate::error::{FroeError, FroeResult};
use crate::interp::Interp;
use crate::token::Token;

pub(crate) fn install(interp: &mut Interp) {
    interp.define("set", cmd_set);
    interp.define("del", cmd_del);
    interp.define("subst", cmd_subst);
    interp.define("var", cmd_var);
    interp.define("trace", cmd_trace);
}

/// `set NAME VALUE` — bind and return VALUE. `set NAME` reads it back.
fn cmd_set(interp: &mut Interp, args: &[Token]) -> FroeResult {
    match args.len() {
        2 => interp.get_var(args[1].text()),
        3 => interp.set_var(args[1].text(), args[2].clone()),
        n => Err(FroeError::ArgCount {
            expected: 2,
            got: n.saturating_sub(1),
        }),
    }
}

/// `del NAME…` — remove bindings; every name must exist.
fn cmd_del(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 2 {
        return Err(FroeError::ArgMinimum {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    for tok in &args[1..] {
        interp.del_var(tok.text())?;
    }
    Ok(Token::empty())
}

/// `subst TOK` — the substitution engine, exposed directly.
fn cmd_subst(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 2 {
        return Err(FroeError::ArgCount {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    interp.subst(&args[1])
}

/// `var` — list the current frame's variables as `{name value}` pairs.
/// `var NAME` — existence as a bool. `var NAME len` / `var NAME idx {i…}`
/// treat the variable as a list.
fn cmd_var(interp: &mut Interp, args: &[Token]) -> FroeResult {
    match args.len() {
        1 => {
            let mut out: Vec<Token> = interp
                .frame_vars()
                .iter()
                .map(|(k, v)| Token::from_list(vec![Token::new(k), v.clone()]))
                .collect();
            out.sort_by(|a, b| a.text().cmp(b.text()));
            Ok(Token::from_list(out))
        }
        2 => Ok(Token::bool(interp.var_exists(args[1].text()))),
        _ => {
            let value = interp.get_var(args[1].text())?;
            match args[2].text() {
                "len" => Ok(Token::int(value.len() as i64)),
                "idx" => {
                    if args.len() != 4 {
                        return Err(FroeError::ArgCount {
                            expected: 3,
                            got: args.len() - 1,
                        });
                    }
                    let mut cur = value;
                    for idx in args[3].as_list() {
                        cur = cur.index(idx.as_int()?);
                    }
                    Ok(cur)
                }
                other => Err(FroeError::Syntax(format!(
                    "var: unknown subcommand {}",
                    other
                ))),
            }
        }
    }
}

/// `trace VAR PROC` — invoke PROC on every get/set/del of the (namespace)
/// variable, as `PROC value action ?newValue?`; its result stands in for
/// the operation's result.
fn cmd_trace(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 3 {
        return Err(FroeError::ArgCount {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    let (key, id) = interp.split_identifier(args[1].text(), true)?;
    let qualified = Interp::display_name(&key, &id);
    let proc = interp.resolve_proc(args[2].text()).ok_or_else(|| {
        FroeError::message(format!("could not find proc {}", args[2].text()))
    })?;
    interp.set_trace(qualified, proc);
    Ok(Token::empty())
}
