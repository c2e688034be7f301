//! `namespace` and `import`.

use std::fs;

use crate::args::{ArgSet, Argument};
use crate::builtins::strings::glob_match;
use crate::error::{FroeError, FroeResult};
use crate::interp::{Frame, Interp};
use crate::token::{RefTarget, Token, TokenData, VarRef};

pub(crate) fn install(interp: &mut Interp) {
    interp.define("namespace", cmd_namespace);
    interp.define("import", cmd_import);
}

/// `namespace` — the current namespace's qualified name.
/// `namespace NAME BODY` — evaluate BODY with NAME as the current
/// namespace; unqualified `set` and `proc` inside the body target it.
fn cmd_namespace(interp: &mut Interp, args: &[Token]) -> FroeResult {
    match args.len() {
        1 => Ok(Token::new(interp.current_namespace_display())),
        3 => {
            let key = interp.ensure_namespace(args[1].text());
            interp.push_frame(Frame::for_namespace(key));
            let result = interp.exec_token(&args[2]);
            interp.pop_frame();
            result
        }
        n => Err(FroeError::ArgCount {
            expected: 2,
            got: n.saturating_sub(1),
        }),
    }
}

/// `import [-proc {glob…}] [-var {{src dst}…}] [-file {path…}]`
///
/// Files evaluate first, so a file may define what is then imported.
/// `-proc` globs must be qualified; matches are copied into the current
/// frame's proc table. `-var` installs a read-write reference under the
/// destination name; deleting it later unbinds the name without touching
/// the source.
fn cmd_import(interp: &mut Interp, args: &[Token]) -> FroeResult {
    let set = ArgSet::with_args(
        "import",
        vec![
            Argument::new("-proc")
                .with_default(Token::empty())
                .with_help("qualified globs of procedures to copy into scope"),
            Argument::new("-var")
                .with_default(Token::empty())
                .with_help("{src dst} pairs to reference under local names"),
            Argument::new("-file")
                .with_default(Token::empty())
                .with_help("files to evaluate before importing"),
        ],
    )?;
    let bound = set.bind(interp, args)?;

    for path in bound["file"].as_list() {
        let src = fs::read_to_string(path.text())
            .map_err(|e| FroeError::message(format!("{}: {}", path.text(), e)))?;
        interp
            .exec_source(&src)
            .map_err(|e| if e.is_signal() { e } else { e.context(format!("import -file {}", path.text())) })?;
    }

    for glob in bound["proc"].as_list() {
        import_procs(interp, glob.text())?;
    }

    for pair in bound["var"].as_list() {
        let pair = pair.as_list();
        if pair.len() != 2 {
            return Err(FroeError::Syntax(format!(
                "import -var expects {{src dst}} pairs, got {{{}}}",
                Token::from_list(pair).text()
            )));
        }
        import_var(interp, pair[0].text(), pair[1].text())?;
    }

    Ok(Token::empty())
}

fn import_procs(interp: &mut Interp, glob: &str) -> FroeResult<()> {
    if !glob.contains("::") {
        return Err(FroeError::Syntax(format!(
            "import -proc requires qualified globs, got {}",
            glob
        )));
    }
    let (key, pattern) = interp.split_identifier(glob, false)?;
    let matches: Vec<(String, crate::proc::Procedure)> = interp
        .namespace(&key)
        .map(|ns| {
            ns.procs
                .iter()
                .filter(|(name, _)| glob_match(&pattern, name))
                .map(|(name, p)| (name.clone(), p.clone()))
                .collect()
        })
        .unwrap_or_default();

    let frame = interp.current_frame();
    if frame.ns_root {
        let home = frame.home.clone();
        for (name, p) in matches {
            interp.namespace_mut(&home).procs.insert(name, p);
        }
    } else {
        for (name, p) in matches {
            interp.current_frame_mut().local_procs.insert(name, p);
        }
    }
    Ok(())
}

fn import_var(interp: &mut Interp, src: &str, dst: &str) -> FroeResult<()> {
    let vref = if src.contains("::") {
        let (key, id) = interp.split_identifier(src, false)?;
        VarRef {
            name: id,
            target: RefTarget::Namespace(key),
        }
    } else {
        resolve_local_source(interp, src)
            .ok_or_else(|| FroeError::NoVar(src.to_string()))?
    };
    let current = interp.read_ref(&vref).unwrap_or_else(|_| Token::empty());
    let tok = Token::with_data(current.text().to_string(), TokenData::Ref(vref));
    if dst.contains("::") {
        let (key, id) = interp.split_identifier(dst, true)?;
        interp.namespace_mut(&key).vars.insert(id, tok);
    } else {
        interp.bind_local(dst, tok);
    }
    Ok(())
}

/// Find the nearest enclosing frame holding `src`. Namespace-root frames
/// resolve to their namespace, so the reference stays valid after they
/// unwind.
fn resolve_local_source(interp: &Interp, src: &str) -> Option<VarRef> {
    for frame in interp.frames().rev() {
        if frame.ns_root {
            let has = interp
                .namespace(&frame.home)
                .map(|ns| ns.vars.contains_key(src))
                .unwrap_or(false);
            if has {
                return Some(VarRef {
                    name: src.to_string(),
                    target: RefTarget::Namespace(frame.home.clone()),
                });
            }
        } else if frame.local_vars.contains_key(src) {
            return Some(VarRef {
                name: src.to_string(),
                target: RefTarget::Frame(frame.id),
            });
        }
    }
    None
}
