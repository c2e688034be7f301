//! froe — a small command-oriented, embeddable scripting language.
//!
//! # Overview
//!
//! Source text is a sequence of *commands*: whitespace-separated tokens on a
//! line, where the first token names the procedure to run. Every construct —
//! control flow, variable access, definition — is just a command. Values are
//! immutable strings ([`Token`]) with a lazily-cached parsed view, so a
//! token is a list, a script, a number, or a procedure exactly when it is
//! used as one.
//!
//! ```text
//! set greeting hello
//! proc shout {word} { return [print $word!] }
//! if {eq $greeting hello} { shout $greeting }
//! ```
//!
//! # Embedding
//!
//! A host program creates an [`Interpreter`], registers commands written in
//! Rust, and evaluates scripts:
//!
//! ```
//! use froe_core::{Interpreter, Token};
//!
//! let interp = Interpreter::new();
//! interp.register("double", |_interp, args| {
//!     let n = args[1].as_int()?;
//!     Ok(Token::int(n * 2))
//! });
//! let out = interp.eval("double 21").unwrap();
//! assert_eq!(out.as_int().unwrap(), 42);
//! ```
//!
//! The handle is cloneable and internally locked: concurrent callers on the
//! same interpreter serialize, and independent interpreters run
//! independently on separate threads.

pub mod args;
pub mod builtins;
pub mod error;
pub mod interp;
pub mod lexer;
pub mod proc;
pub mod subst;
pub mod token;
pub mod wrap;

pub use error::{format_error, FroeError, FroeResult, ERROR_TAG, WARN_TAG};
pub use interp::{Frame, Interp, InterpOptions, Interpreter, Namespace};
pub use proc::Procedure;
pub use token::{Command, RefTarget, Script, Token, TokenData, VarRef};
pub use wrap::{wrap_object, HostObject};

/// Evaluate a script in a fresh interpreter and return its final value.
pub fn eval_source(src: &str) -> FroeResult {
    Interpreter::new().eval(src)
}
