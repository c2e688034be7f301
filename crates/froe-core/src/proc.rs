//! Invocable procedures and the `proc` / `macro` defining commands.

use std::fmt;
use std::sync::Arc;

use crate::args::ArgSet;
use crate::error::{FroeError, FroeResult};
use crate::interp::{Frame, Interp};
use crate::token::{Token, TokenData};

/// An invocable callback: host-provided, or compiled from a `proc` body.
/// Cloning shares the underlying closure; identity is pointer identity.
#[derive(Clone)]
pub struct Procedure {
    func: Arc<dyn Fn(&mut Interp, &[Token]) -> FroeResult + Send + Sync>,
}

impl Procedure {
    pub fn new(f: impl Fn(&mut Interp, &[Token]) -> FroeResult + Send + Sync + 'static) -> Self {
        Procedure { func: Arc::new(f) }
    }

    pub fn call(&self, interp: &mut Interp, args: &[Token]) -> FroeResult {
        (self.func)(interp, args)
    }

    pub fn ptr_eq(&self, other: &Procedure) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Procedure(..)")
    }
}

impl Token {
    /// The token as an invocable procedure: either the cached one, or the
    /// text interpreted as a two-element `{proto body}` list and compiled
    /// into an anonymous procedure.
    pub fn as_procedure(&self, interp: &mut Interp) -> FroeResult<Procedure> {
        match self.data() {
            Some(TokenData::Proc(p)) => return Ok(p.clone()),
            Some(TokenData::Host(h)) => return Ok(h.dispatcher()),
            _ => {}
        }
        let p = compile_anonymous(interp, self)
            .map_err(|e| e.context("could not create proc from token"))?;
        self.prime(TokenData::Proc(p.clone()));
        Ok(p)
    }
}

pub(crate) fn compile_anonymous(interp: &mut Interp, tok: &Token) -> FroeResult<Procedure> {
    // lex rather than going through the list view: the token's one cache
    // slot is about to hold the compiled procedure
    let list = crate::lexer::lex_list(tok.text());
    if list.len() != 2 {
        return Err(FroeError::message("list does not contain two elements"));
    }
    let ptok = define_proc(interp, None, &list[0], &list[1])?;
    match ptok.data() {
        Some(TokenData::Proc(p)) => Ok(p.clone()),
        _ => Err(FroeError::Internal("proc definition lost its body".into())),
    }
}

/// Where a newly defined procedure lands.
enum Registration {
    Namespace(String, String),
    FrameLocal(String),
    None,
}

/// `proc NAME PROTO BODY` — define a procedure. With NAME omitted (or given
/// as `_`) the procedure is anonymous: it gets a minted `proc#N` display
/// name, is registered nowhere, and is reachable only through the returned
/// token, whose cache holds the procedure itself.
pub fn cmd_proc(interp: &mut Interp, args: &[Token]) -> FroeResult {
    match args.len() {
        3 => define_proc(interp, None, &args[1], &args[2]),
        4 if args[1].text() == "_" => define_proc(interp, None, &args[2], &args[3]),
        4 => define_proc(
            interp,
            Some(args[1].text().to_string()),
            &args[2],
            &args[3],
        ),
        n => Err(FroeError::ArgCount {
            expected: 3,
            got: n.saturating_sub(1),
        }),
    }
}

pub(crate) fn define_proc(
    interp: &mut Interp,
    name: Option<String>,
    proto: &Token,
    body: &Token,
) -> FroeResult {
    let set_name = name.clone().unwrap_or_else(|| "proc".to_string());
    let argset = Arc::new(ArgSet::from_proto(&set_name, proto)?);

    let (display, registration, home) = match name {
        Some(n) if n.contains("::") => {
            let (key, id) = interp.split_identifier(&n, true)?;
            (
                Interp::display_name(&key, &id),
                Registration::Namespace(key.clone(), id),
                key,
            )
        }
        Some(n) => {
            let frame = interp.current_frame();
            if frame.ns_root {
                let key = frame.home.clone();
                (
                    Interp::display_name(&key, &n),
                    Registration::Namespace(key.clone(), n),
                    key,
                )
            } else {
                (n.clone(), Registration::FrameLocal(n), frame.home.clone())
            }
        }
        None => {
            let home = interp.current_frame().home.clone();
            (interp.mint("proc"), Registration::None, home)
        }
    };

    let procedure = body_closure(argset, body.clone(), home);

    match registration {
        Registration::Namespace(key, id) => {
            interp.namespace_mut(&key).procs.insert(id, procedure.clone());
        }
        Registration::FrameLocal(id) => {
            interp
                .current_frame_mut()
                .local_procs
                .insert(id, procedure.clone());
        }
        Registration::None => {}
    }

    Ok(Token::with_data(display, TokenData::Proc(procedure)))
}

fn body_closure(argset: Arc<ArgSet>, body: Token, home: String) -> Procedure {
    Procedure::new(move |interp, args| {
        let bound = argset.bind(interp, args)?;
        // A direct `tailcall …` re-invocation rebinds in the caller's frame
        // instead of pushing a new one.
        if args[0].text() == "tailcall" {
            interp.current_frame_mut().local_vars = bound;
            return run_body(interp, &argset, &body);
        }
        interp.push_frame(Frame::for_proc(bound, home.clone()));
        let result = run_body(interp, &argset, &body);
        interp.pop_frame();
        result
    })
}

fn run_body(interp: &mut Interp, argset: &ArgSet, body: &Token) -> FroeResult {
    loop {
        match interp.exec_token(body) {
            Err(FroeError::Return(v)) => return Ok(v),
            Err(FroeError::Tailcall(argtok)) => {
                // Rebind through the same prototype and rerun the body in
                // the same frame; the call stack does not grow.
                let targs = argtok.as_list();
                let bound = argset.bind(interp, &targs)?;
                interp.current_frame_mut().local_vars = bound;
            }
            other => return other,
        }
    }
}

/// `macro NAME BODY` — like `proc`, but the body is evaluated in the
/// caller's frame: no push, no argument binding. Used to splice literal
/// substitutions.
pub fn cmd_macro(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() != 3 {
        return Err(FroeError::ArgCount {
            expected: 2,
            got: args.len().saturating_sub(1),
        });
    }
    let name = args[1].text().to_string();
    let body = args[2].clone();
    let procedure = Procedure::new(move |interp, _args| interp.exec_token(&body));

    if name.contains("::") {
        let (key, id) = interp.split_identifier(&name, true)?;
        interp.namespace_mut(&key).procs.insert(id, procedure);
    } else {
        let frame = interp.current_frame();
        if frame.ns_root {
            let key = frame.home.clone();
            interp.namespace_mut(&key).procs.insert(name, procedure);
        } else {
            interp.current_frame_mut().local_procs.insert(name, procedure);
        }
    }

    Ok(args[1].clone())
}
