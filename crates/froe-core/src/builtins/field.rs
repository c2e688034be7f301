//! `field` — extract values out of a structured token by glob-matching
//! dot-delineated key paths.

use crate::args::ArgSet;
use crate::builtins::strings::glob_match;
use crate::error::FroeResult;
use crate::interp::Interp;
use crate::token::Token;

// Flattening recursion bound. Parsed token structures are finite trees, so
// this only cuts off pathological self-similar nesting.
const MAX_DEPTH: usize = 64;

pub(crate) fn install(interp: &mut Interp) {
    interp.define("field", cmd_field);
}

/// `field ?-values BOOL? ?-keys BOOL? ?-separator SEP? ?-matchcase BOOL?
/// OBJ PATTERN…`
///
/// OBJ is flattened into `path → leaf` entries: even-length lists recurse
/// as maps, longer lists recurse by index, everything else is a leaf.
/// Entries whose path matches any PATTERN are returned; `-keys` and
/// `-values` pick which halves.
fn cmd_field(interp: &mut Interp, args: &[Token]) -> FroeResult {
    let set = ArgSet::from_proto(
        "field",
        &Token::new("{-values true} {-keys false} {-separator .} {-matchcase false} obj args"),
    )?;
    let bound = set.bind(interp, args)?;

    let sep = bound["separator"].text().to_string();
    let matchcase = bound["matchcase"].is_true();
    let want_keys = bound["keys"].is_true();
    let want_values = bound["values"].is_true();

    let mut flat = Vec::new();
    flatten(&bound["obj"], String::new(), &sep, 0, &mut flat);

    let patterns = bound["args"].as_list();
    let mut out = Vec::new();
    for (key, value) in &flat {
        let subject = if matchcase {
            key.clone()
        } else {
            key.to_lowercase()
        };
        let hit = patterns.iter().any(|p| {
            let pattern = if matchcase {
                p.text().to_string()
            } else {
                p.text().to_lowercase()
            };
            glob_match(&pattern, &subject)
        });
        if !hit {
            continue;
        }
        if want_keys {
            out.push(Token::new(key.clone()));
        }
        if want_values {
            out.push(value.clone());
        }
    }
    Ok(Token::from_list(out))
}

fn flatten(tok: &Token, path: String, sep: &str, depth: usize, out: &mut Vec<(String, Token)>) {
    if depth >= MAX_DEPTH {
        out.push((path, tok.clone()));
        return;
    }
    let list = tok.as_list();
    if list.len() > 1 && list.len() % 2 == 0 {
        if let Ok(pairs) = tok.as_map() {
            for (k, v) in pairs {
                flatten(&v, join_path(&path, k.text(), sep), sep, depth + 1, out);
            }
            return;
        }
    }
    if list.len() > 1 {
        for (i, v) in list.iter().enumerate() {
            flatten(v, join_path(&path, &i.to_string(), sep), sep, depth + 1, out);
        }
        return;
    }
    out.push((path, tok.clone()));
}

fn join_path(base: &str, elem: &str, sep: &str) -> String {
    if base.is_empty() {
        elem.to_string()
    } else if elem.is_empty() {
        base.to_string()
    } else {
        format!("{}{}{}", base, sep, elem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{Interp, InterpOptions};

    #[test]
    fn paths_flatten_and_match() {
        let mut interp = Interp::new(InterpOptions::default());
        interp
            .set_var("obj", Token::new("user {name jane id 7} tags {a b c}"))
            .unwrap();
        let out = interp.exec_source("field $obj user.name").unwrap();
        assert_eq!(out.text(), "jane");
        let out = interp.exec_source("field -keys true -values false $obj user.*").unwrap();
        let mut keys = out.as_list().iter().map(|t| t.text().to_string()).collect::<Vec<_>>();
        keys.sort();
        assert_eq!(keys, vec!["user.id", "user.name"]);
    }

    #[test]
    fn lists_flatten_by_index() {
        let mut interp = Interp::new(InterpOptions::default());
        interp.set_var("obj", Token::new("x {a b c}")).unwrap();
        let out = interp.exec_source("field $obj x.1").unwrap();
        assert_eq!(out.text(), "b");
    }
}
