//! The interpreter: namespaces, call frames, and the evaluator.
//!
//! [`Interpreter`] is the embedding handle — a cloneable wrapper around one
//! exclusively-locked [`Interp`]. The lock is taken exactly once per
//! host-level call, so concurrent callers on different threads serialize
//! without corrupting the frame stack; everything nested runs on the
//! already-borrowed `&mut Interp` and never reacquires it.

use std::any::Any;
use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::builtins;
use crate::error::{FroeError, FroeResult};
use crate::lexer;
use crate::proc::Procedure;
use crate::token::{Command, RefTarget, Token, TokenData, VarRef};

/// A named table of variables and procedures. Namespaces form a flat
/// registry keyed by canonical path: `""` is the global namespace
/// (displayed `::`), nested ones are `a` / `a::b` (displayed `::a::b`).
pub struct Namespace {
    pub name: String,
    pub vars: HashMap<String, Token>,
    pub procs: HashMap<String, Procedure>,
}

impl Namespace {
    fn new(name: &str) -> Namespace {
        Namespace {
            name: name.to_string(),
            vars: HashMap::new(),
            procs: HashMap::new(),
        }
    }

    /// The fully-qualified display form of this namespace.
    pub fn display(&self) -> String {
        if self.name.is_empty() {
            "::".to_string()
        } else {
            format!("::{}", self.name)
        }
    }
}

/// A call-stack activation record.
pub struct Frame {
    /// Monotonic id, never reused; dangling [`VarRef`]s are detected by it.
    pub id: u64,
    pub local_vars: HashMap<String, Token>,
    pub local_procs: HashMap<String, Procedure>,
    /// Key of the namespace the running procedure was defined in.
    pub home: String,
    /// True for frames pushed by `namespace` (and the bottom frame). The
    /// variable store of such a frame is its namespace's `vars` table.
    pub ns_root: bool,
}

impl Frame {
    pub fn for_proc(local_vars: HashMap<String, Token>, home: String) -> Frame {
        Frame {
            id: 0,
            local_vars,
            local_procs: HashMap::new(),
            home,
            ns_root: false,
        }
    }

    pub fn for_namespace(home: String) -> Frame {
        Frame {
            id: 0,
            local_vars: HashMap::new(),
            local_procs: HashMap::new(),
            home,
            ns_root: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct InterpOptions {
    pub max_call_depth: usize,
}

impl Default for InterpOptions {
    fn default() -> Self {
        InterpOptions {
            max_call_depth: 1024,
        }
    }
}

enum VarScope {
    Namespace(String),
    Frame,
}

/// The working state of one interpreter instance. Commands receive this as
/// `&mut Interp`; the host reaches it through [`Interpreter`].
pub struct Interp {
    namespaces: HashMap<String, Namespace>,
    stack: Vec<Frame>,
    traces: HashMap<String, Procedure>,
    call_depth: usize,
    max_call_depth: usize,
    counters: HashMap<String, u64>,
    next_frame_id: u64,
    pub stdout: Box<dyn Write + Send>,
    pub stderr: Box<dyn Write + Send>,
    pub stdin: Box<dyn Read + Send>,
}

impl Interp {
    pub fn new(options: InterpOptions) -> Interp {
        let mut namespaces = HashMap::new();
        namespaces.insert(String::new(), Namespace::new(""));
        let mut interp = Interp {
            namespaces,
            stack: vec![Frame {
                id: 0,
                local_vars: HashMap::new(),
                local_procs: HashMap::new(),
                home: String::new(),
                ns_root: true,
            }],
            traces: HashMap::new(),
            call_depth: 0,
            max_call_depth: options.max_call_depth,
            counters: HashMap::new(),
            next_frame_id: 1,
            stdout: Box::new(io::sink()),
            stderr: Box::new(io::sink()),
            stdin: Box::new(io::empty()),
        };
        builtins::install_std(&mut interp);
        interp
    }

    // ------------------------------------------------------------------
    // Names

    /// Split an identifier into (namespace key, bare name). A name without
    /// `::` belongs to the current frame's home namespace; otherwise
    /// everything before the last `::` is the namespace path. An empty
    /// final segment is rejected.
    pub fn split_identifier(&mut self, id: &str, create: bool) -> FroeResult<(String, String)> {
        let id = id.strip_prefix('$').unwrap_or(id);
        let Some(pos) = id.rfind("::") else {
            return Ok((self.current_frame().home.clone(), id.to_string()));
        };
        let name = &id[pos + 2..];
        if name.is_empty() {
            return Err(FroeError::Syntax(format!("empty identifier in {}", id)));
        }
        let path = &id[..pos];
        let key = path.strip_prefix("::").unwrap_or(path).to_string();
        if !self.namespaces.contains_key(&key) {
            if !create {
                return Err(FroeError::NoNamespace(Self::display_key(&key)));
            }
            self.namespaces.insert(key.clone(), Namespace::new(&key));
        }
        Ok((key, name.to_string()))
    }

    fn display_key(key: &str) -> String {
        if key.is_empty() {
            "::".to_string()
        } else {
            format!("::{}", key)
        }
    }

    /// The fully-qualified display form of a name in a namespace.
    pub fn display_name(key: &str, id: &str) -> String {
        if key.is_empty() {
            format!("::{}", id)
        } else {
            format!("::{}::{}", key, id)
        }
    }

    pub fn namespace(&self, key: &str) -> Option<&Namespace> {
        self.namespaces.get(key)
    }

    pub fn namespace_mut(&mut self, key: &str) -> &mut Namespace {
        self.namespaces
            .entry(key.to_string())
            .or_insert_with(|| Namespace::new(key))
    }

    /// Ensure a namespace exists for a raw path such as `::a::b` or `b`
    /// (relative to the current frame's home) and return its key.
    pub fn ensure_namespace(&mut self, path: &str) -> String {
        let key = if let Some(stripped) = path.strip_prefix("::") {
            stripped.to_string()
        } else {
            let home = &self.current_frame().home;
            if home.is_empty() {
                path.to_string()
            } else {
                format!("{}::{}", home, path)
            }
        };
        self.namespace_mut(&key);
        key
    }

    pub fn current_namespace_display(&self) -> String {
        Self::display_key(&self.current_frame().home)
    }

    /// Mint a unique name like `proc#0`, `proc#1`, … per prefix.
    pub fn mint(&mut self, prefix: &str) -> String {
        let n = self.counters.entry(prefix.to_string()).or_insert(0);
        let name = format!("{}#{}", prefix, n);
        *n += 1;
        name
    }

    // ------------------------------------------------------------------
    // Frames

    pub fn push_frame(&mut self, mut frame: Frame) {
        frame.id = self.next_frame_id;
        self.next_frame_id += 1;
        self.stack.push(frame);
    }

    pub fn pop_frame(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    pub fn current_frame(&self) -> &Frame {
        self.stack.last().expect("frame stack is never empty")
    }

    pub fn current_frame_mut(&mut self) -> &mut Frame {
        self.stack.last_mut().expect("frame stack is never empty")
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Frames from the bottom (global) to the top (currently executing).
    pub fn frames(&self) -> std::slice::Iter<'_, Frame> {
        self.stack.iter()
    }

    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    /// The variable table the current frame reads and writes: its namespace's
    /// table for namespace-root frames, its own locals otherwise.
    pub fn frame_vars(&self) -> &HashMap<String, Token> {
        let frame = self.current_frame();
        if frame.ns_root {
            self.namespaces
                .get(&frame.home)
                .map(|ns| &ns.vars)
                .unwrap_or(&frame.local_vars)
        } else {
            &frame.local_vars
        }
    }

    /// Install a raw binding in the current frame's variable store, without
    /// reference indirection or traces. Used by `import` and `pipeline`.
    pub fn bind_local(&mut self, name: &str, tok: Token) {
        let frame = self.current_frame();
        if frame.ns_root {
            let key = frame.home.clone();
            self.namespace_mut(&key).vars.insert(name.to_string(), tok);
        } else {
            self.current_frame_mut()
                .local_vars
                .insert(name.to_string(), tok);
        }
    }

    // ------------------------------------------------------------------
    // Variables

    fn var_scope(&mut self, name: &str, create: bool) -> FroeResult<(VarScope, String)> {
        if name.contains("::") {
            let (key, id) = self.split_identifier(name, create)?;
            return Ok((VarScope::Namespace(key), id));
        }
        let frame = self.current_frame();
        if frame.ns_root {
            Ok((VarScope::Namespace(frame.home.clone()), name.to_string()))
        } else {
            Ok((VarScope::Frame, name.to_string()))
        }
    }

    fn deref(&mut self, val: Token) -> FroeResult {
        if let Some(TokenData::Ref(r)) = val.data() {
            let r = r.clone();
            return self.read_ref(&r);
        }
        Ok(val)
    }

    pub fn get_var(&mut self, name: &str) -> FroeResult {
        match self.var_scope(name, false)? {
            (VarScope::Namespace(key), id) => {
                let val = self
                    .namespaces
                    .get(&key)
                    .and_then(|ns| ns.vars.get(&id))
                    .cloned();
                let qualified = Self::display_name(&key, &id);
                if let Some(tr) = self.traces.get(&qualified).cloned() {
                    let cur = val.unwrap_or_else(Token::empty);
                    return tr.call(self, &[Token::new(qualified), cur, Token::new("get")]);
                }
                let val = val.ok_or_else(|| FroeError::NoVar(name.to_string()))?;
                self.deref(val)
            }
            (VarScope::Frame, id) => {
                let val = self
                    .current_frame()
                    .local_vars
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| FroeError::NoVar(name.to_string()))?;
                self.deref(val)
            }
        }
    }

    pub fn var_exists(&mut self, name: &str) -> bool {
        match self.var_scope(name, false) {
            Ok((VarScope::Namespace(key), id)) => self
                .namespaces
                .get(&key)
                .map(|ns| ns.vars.contains_key(&id))
                .unwrap_or(false),
            Ok((VarScope::Frame, id)) => self.current_frame().local_vars.contains_key(&id),
            Err(_) => false,
        }
    }

    pub fn set_var(&mut self, name: &str, val: Token) -> FroeResult {
        match self.var_scope(name, true)? {
            (VarScope::Namespace(key), id) => {
                let existing = self
                    .namespaces
                    .get(&key)
                    .and_then(|ns| ns.vars.get(&id))
                    .cloned();
                if let Some(ex) = &existing {
                    if let Some(TokenData::Ref(r)) = ex.data() {
                        let r = r.clone();
                        return self.write_ref(&r, val);
                    }
                }
                let qualified = Self::display_name(&key, &id);
                let stored = if let Some(tr) = self.traces.get(&qualified).cloned() {
                    let cur = existing.unwrap_or_else(Token::empty);
                    tr.call(
                        self,
                        &[Token::new(qualified), cur, Token::new("set"), val],
                    )?
                } else {
                    val
                };
                self.namespace_mut(&key).vars.insert(id, stored.clone());
                Ok(stored)
            }
            (VarScope::Frame, id) => {
                if let Some(ex) = self.current_frame().local_vars.get(&id) {
                    if let Some(TokenData::Ref(r)) = ex.data() {
                        let r = r.clone();
                        return self.write_ref(&r, val);
                    }
                }
                self.current_frame_mut().local_vars.insert(id, val.clone());
                Ok(val)
            }
        }
    }

    /// Remove a binding. A binding that holds a reference is unbound
    /// locally; the variable it points at is untouched.
    pub fn del_var(&mut self, name: &str) -> FroeResult {
        match self.var_scope(name, false)? {
            (VarScope::Namespace(key), id) => {
                let existing = self
                    .namespaces
                    .get(&key)
                    .and_then(|ns| ns.vars.get(&id))
                    .cloned()
                    .ok_or_else(|| FroeError::NoVar(name.to_string()))?;
                let qualified = Self::display_name(&key, &id);
                let result = if let Some(tr) = self.traces.get(&qualified).cloned() {
                    tr.call(
                        self,
                        &[Token::new(qualified), existing.clone(), Token::new("del")],
                    )?
                } else {
                    existing
                };
                if let Some(ns) = self.namespaces.get_mut(&key) {
                    ns.vars.remove(&id);
                }
                Ok(result)
            }
            (VarScope::Frame, id) => self
                .current_frame_mut()
                .local_vars
                .remove(&id)
                .ok_or_else(|| FroeError::NoVar(name.to_string())),
        }
    }

    pub fn set_trace(&mut self, qualified: String, proc: Procedure) {
        self.traces.insert(qualified, proc);
    }

    pub(crate) fn read_ref(&mut self, r: &VarRef) -> FroeResult {
        let dangling = || {
            FroeError::NoVar(r.name.clone()).context("could not resolve reference")
        };
        match &r.target {
            RefTarget::Frame(id) => self
                .stack
                .iter()
                .find(|f| f.id == *id)
                .and_then(|f| f.local_vars.get(&r.name))
                .cloned()
                .ok_or_else(dangling),
            RefTarget::Namespace(key) => self
                .namespaces
                .get(key)
                .and_then(|ns| ns.vars.get(&r.name))
                .cloned()
                .ok_or_else(dangling),
        }
    }

    pub(crate) fn write_ref(&mut self, r: &VarRef, val: Token) -> FroeResult {
        match &r.target {
            RefTarget::Frame(id) => {
                let frame = self
                    .stack
                    .iter_mut()
                    .find(|f| f.id == *id)
                    .ok_or_else(|| {
                        FroeError::NoVar(r.name.clone()).context("could not resolve reference")
                    })?;
                frame.local_vars.insert(r.name.clone(), val.clone());
                Ok(val)
            }
            RefTarget::Namespace(key) => {
                self.namespace_mut(key).vars.insert(r.name.clone(), val.clone());
                Ok(val)
            }
        }
    }

    // ------------------------------------------------------------------
    // Procedures

    /// Register a host procedure. Qualified names target their namespace;
    /// bare names land in the global table. The empty name `""` registers
    /// the unknown-command hook.
    pub fn register(&mut self, name: &str, proc: Procedure) {
        if name.contains("::") {
            if let Ok((key, id)) = self.split_identifier(name, true) {
                self.namespace_mut(&key).procs.insert(id, proc);
            }
        } else {
            self.namespace_mut("").procs.insert(name.to_string(), proc);
        }
    }

    pub fn define(
        &mut self,
        name: &str,
        f: impl Fn(&mut Interp, &[Token]) -> FroeResult + Send + Sync + 'static,
    ) {
        self.register(name, Procedure::new(f));
    }

    /// Resolve a procedure name: frame-local procs, then the frame's home
    /// namespace, then the global namespace. Qualified names skip the
    /// search and target exactly the named namespace.
    pub fn resolve_proc(&mut self, name: &str) -> Option<Procedure> {
        if name.contains("::") {
            let (key, id) = self.split_identifier(name, false).ok()?;
            return self.namespaces.get(&key)?.procs.get(&id).cloned();
        }
        let frame = self.current_frame();
        if let Some(p) = frame.local_procs.get(name) {
            return Some(p.clone());
        }
        if let Some(p) = self
            .namespaces
            .get(&frame.home)
            .and_then(|ns| ns.procs.get(name))
        {
            return Some(p.clone());
        }
        self.namespaces
            .get("")
            .and_then(|ns| ns.procs.get(name))
            .cloned()
    }

    fn unknown_hook(&self) -> Option<Procedure> {
        self.namespaces.get("").and_then(|ns| ns.procs.get("")).cloned()
    }

    // ------------------------------------------------------------------
    // Evaluation

    /// Execute a single command: substitute every argument, pick the
    /// procedure, invoke it. Signals pass through untouched; other errors
    /// pick up a `"<name>: "` prefix. Host panics inside a procedure become
    /// an internal-fault error instead of tearing the interpreter down.
    pub fn exec_command(&mut self, cmd: &[Token]) -> FroeResult {
        if cmd.is_empty() {
            return Ok(Token::empty());
        }
        self.call_depth += 1;
        if self.call_depth > self.max_call_depth {
            self.call_depth -= 1;
            return Err(FroeError::MaxCallDepth);
        }
        let result = self.exec_command_inner(cmd);
        self.call_depth -= 1;
        result
    }

    fn exec_command_inner(&mut self, cmd: &[Token]) -> FroeResult {
        let mut args: Vec<Token> = Vec::with_capacity(cmd.len());
        for (i, tok) in cmd.iter().enumerate() {
            match self.subst(tok) {
                Ok(t) => args.push(t),
                Err(e) if e.is_signal() => return Err(e),
                Err(e) => {
                    return Err(e.context(format!(
                        "{}: could not substitute arg {}",
                        cmd[0].text(),
                        i
                    )))
                }
            }
        }

        let proc = match args[0].data() {
            Some(TokenData::Proc(p)) => p.clone(),
            Some(TokenData::Host(h)) => h.dispatcher(),
            _ => match self.resolve_proc(args[0].text()) {
                Some(p) => p,
                None => match self.unknown_hook() {
                    Some(p) => p,
                    None => {
                        return Err(FroeError::CommandNotFound(args[0].text().to_string()))
                    }
                },
            },
        };

        let name = args[0].text().to_string();
        let result = panic::catch_unwind(AssertUnwindSafe(|| proc.call(self, &args)))
            .unwrap_or_else(|payload| Err(FroeError::Internal(panic_message(payload))));
        match result {
            // a freshly thrown value keeps its exact text; anything else
            // picks up the command name on the way out
            Err(e) if !e.is_signal() && !matches!(e, FroeError::Thrown(_)) => {
                Err(e.context(name))
            }
            other => other,
        }
    }

    /// Execute commands in order; the last command's value is the script's
    /// value. Errors from the second command onward are annotated with
    /// their line.
    pub fn exec_script(&mut self, script: &[Command]) -> FroeResult {
        let mut ret = Token::empty();
        for (line, cmd) in script.iter().enumerate() {
            match self.exec_command(cmd) {
                Ok(v) => ret = v,
                Err(e) => {
                    if !e.is_signal() && line != 0 {
                        return Err(e.context(format!("line {}", line)));
                    }
                    return Err(e);
                }
            }
        }
        Ok(ret)
    }

    /// Execute a token, reusing its cached parse when one exists.
    pub fn exec_token(&mut self, tok: &Token) -> FroeResult {
        if tok.text().is_empty() {
            return Ok(Token::empty());
        }
        match tok.data() {
            Some(TokenData::Script(s)) => {
                let s = s.clone();
                self.exec_script(&s)
            }
            Some(TokenData::List(cmd)) => {
                let cmd = cmd.clone();
                self.exec_command(&cmd)
            }
            _ => {
                let script = tok.as_script();
                self.exec_script(&script)
            }
        }
    }

    pub fn exec_source(&mut self, src: &str) -> FroeResult {
        let script = lexer::lex_script(src);
        self.exec_script(&script)
    }

    /// Run a host-level call: afterwards the call depth is back to zero and
    /// the frame stack is rewound to its pre-call length whether the call
    /// succeeded, errored, or signalled. A stray `Return` becomes a normal
    /// value so hosts see `return` at the top level as a result.
    pub fn top_level(&mut self, f: impl FnOnce(&mut Interp) -> FroeResult) -> FroeResult {
        let depth = self.stack.len();
        let result = f(self);
        self.call_depth = 0;
        self.stack.truncate(depth.max(1));
        match result {
            Err(FroeError::Return(v)) => Ok(v),
            other => other,
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in command".to_string()
    }
}

/// The embedding handle: one interpreter behind one exclusive lock.
/// Clones share the instance; independent instances run independently on
/// separate threads.
#[derive(Clone)]
pub struct Interpreter {
    core: Arc<Mutex<Interp>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Self::with_options(InterpOptions::default())
    }

    pub fn with_options(options: InterpOptions) -> Interpreter {
        Interpreter {
            core: Arc::new(Mutex::new(Interp::new(options))),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Interp> {
        // a panic barrier already turns command panics into errors; a
        // poisoned lock still holds consistent state
        self.core.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Evaluate a script and return its final value.
    pub fn eval(&self, src: &str) -> FroeResult {
        let mut interp = self.lock();
        interp.top_level(|i| i.exec_source(src))
    }

    pub fn eval_file(&self, path: impl AsRef<Path>) -> FroeResult {
        let src = std::fs::read_to_string(path.as_ref())
            .map_err(|e| FroeError::message(format!("{}: {}", path.as_ref().display(), e)))?;
        self.eval(&src)
    }

    pub fn get_var(&self, name: &str) -> FroeResult {
        self.lock().get_var(name)
    }

    pub fn set_var(&self, name: &str, val: Token) -> FroeResult {
        self.lock().set_var(name, val)
    }

    pub fn register(
        &self,
        name: &str,
        f: impl Fn(&mut Interp, &[Token]) -> FroeResult + Send + Sync + 'static,
    ) {
        self.lock().define(name, f);
    }

    pub fn set_stdout(&self, w: Box<dyn Write + Send>) {
        self.lock().stdout = w;
    }

    pub fn set_stderr(&self, w: Box<dyn Write + Send>) {
        self.lock().stderr = w;
    }

    pub fn set_stdin(&self, r: Box<dyn Read + Send>) {
        self.lock().stdin = r;
    }

    /// Whether `src` forms a complete script (used for REPL continuation).
    pub fn is_complete(&self, src: &str) -> bool {
        lexer::is_complete(src)
    }
}
