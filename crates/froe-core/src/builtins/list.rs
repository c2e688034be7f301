//! List commands: construction, length, slicing, indexing, and the
//! `list::` namespace family.

use crate::error::{FroeError, FroeResult};
use crate::interp::Interp;
use crate::token::Token;

pub(crate) fn install(interp: &mut Interp) {
    interp.define("list", cmd_list);
    interp.define("concat", cmd_concat);
    interp.define("len", cmd_len);
    interp.define("slice", cmd_slice);
    interp.define("sort", cmd_sort);
    interp.define("idx", cmd_idx);
    interp.define("list::append", cmd_append);
    interp.define("list::reverse", cmd_reverse);
    interp.define("list::uniq", cmd_uniq);
    interp.define("list::map", cmd_map);
    interp.define("list::find", cmd_find);
    interp.define("list::split", cmd_split);
}

/// `list ARG…` — a well-formed list, pre-parsed for later list use.
fn cmd_list(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    match args.len() {
        1 => Ok(Token::empty()),
        2 => Ok(args[1].clone()),
        _ => Ok(Token::from_list(args[1..].to_vec())),
    }
}

/// `concat LIST…` — one list holding every element of every argument.
fn cmd_concat(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    let mut out = Vec::new();
    for tok in &args[1..] {
        out.extend(tok.as_list());
    }
    Ok(Token::from_list(out))
}

fn cmd_len(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 2 {
        return Err(FroeError::ArgCount {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    Ok(Token::int(args[1].len() as i64))
}

/// `slice LIST START END` — inclusive ends; a reversed range reverses.
fn cmd_slice(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 4 {
        return Err(FroeError::ArgCount {
            expected: 3,
            got: args.len().saturating_sub(1),
        });
    }
    Ok(args[1].slice(args[2].as_int()?, args[3].as_int()?))
}

/// `sort LIST` — numeric when every element parses as an integer,
/// lexicographic otherwise.
fn cmd_sort(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 2 {
        return Err(FroeError::ArgCount {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    let mut list = args[1].as_list();
    let ints: Result<Vec<i64>, _> = list.iter().map(|t| t.as_int()).collect();
    match ints {
        Ok(mut ints) => {
            ints.sort_unstable();
            Ok(Token::from_list(ints.into_iter().map(Token::int).collect()))
        }
        Err(_) => {
            list.sort_by(|a, b| a.text().cmp(b.text()));
            Ok(Token::from_list(list))
        }
    }
}

/// `idx LIST I…` — nested indexing; each index descends one level.
fn cmd_idx(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 3 {
        return Err(FroeError::ArgMinimum {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    let mut cur = args[1].clone();
    for idx in &args[2..] {
        cur = cur.index(idx.as_int()?);
    }
    Ok(cur)
}

/// `list::append LIST ELEM…` — a new list with the elements appended.
fn cmd_append(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 2 {
        return Err(FroeError::ArgMinimum {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    Ok(args[1].append(args[2..].to_vec()))
}

fn cmd_reverse(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 2 {
        return Err(FroeError::ArgCount {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    let mut list = args[1].as_list();
    list.reverse();
    Ok(Token::from_list(list))
}

/// `list::uniq LIST` — drop duplicates, keeping first occurrences.
fn cmd_uniq(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 2 {
        return Err(FroeError::ArgCount {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    let mut seen = std::collections::HashSet::new();
    let out: Vec<Token> = args[1]
        .as_list()
        .into_iter()
        .filter(|t| seen.insert(t.text().to_string()))
        .collect();
    Ok(Token::from_list(out))
}

/// `list::map LIST CMDPREFIX` — apply a command prefix to every element and
/// collect the results.
fn cmd_map(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 3 {
        return Err(FroeError::ArgCount {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    let prefix = args[2].as_list();
    let mut out = Vec::new();
    for elem in args[1].as_list() {
        let mut cmd = prefix.clone();
        cmd.push(elem);
        out.push(interp.exec_command(&cmd)?);
    }
    Ok(Token::from_list(out))
}

/// `list::find LIST VALUE` — index of the first equal element, or -1.
fn cmd_find(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 3 {
        return Err(FroeError::ArgCount {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    let found = args[1]
        .as_list()
        .iter()
        .position(|t| t == &args[2])
        .map(|i| i as i64)
        .unwrap_or(-1);
    Ok(Token::int(found))
}

/// `list::split STR ?SEP?` — split on a separator (default a single space).
fn cmd_split(_interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 2 || args.len() > 3 {
        return Err(FroeError::ArgCount {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    let sep = args.get(2).map(|t| t.text().to_string()).unwrap_or_else(|| " ".to_string());
    if sep.is_empty() {
        return Err(FroeError::message("list::split: empty separator"));
    }
    let parts: Vec<Token> = args[1].text().split(&sep).map(Token::new).collect();
    Ok(Token::from_list(parts))
}
