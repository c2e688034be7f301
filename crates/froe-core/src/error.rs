use thiserror::Error;

use crate::token::Token;

pub const ERROR_TAG: &str = "\x1b[31m[ERROR]\x1b[0m";
pub const WARN_TAG: &str = "\x1b[33m[WARN]\x1b[0m";

/// The common result type of evaluation: a token, or a `FroeError`.
pub type FroeResult<T = Token> = Result<T, FroeError>;

/// Every way evaluation can stop early.
///
/// Two disjoint families live here. The first five variants are control-flow
/// signals: they are raised by `return`, `break`, `continue` and `tailcall`
/// (and by the call-depth guard) and are intercepted only by their designated
/// catchers — procedure prologues and loop bodies. `catch` lets them pass.
/// Everything else is a value error, visible to `catch` and to the host.
#[derive(Error, Debug, Clone)]
pub enum FroeError {
    #[error("return")]
    Return(Token),

    #[error("break")]
    Break(Token),

    #[error("continue")]
    Continue,

    #[error("tailcall")]
    Tailcall(Token),

    #[error("max call depth exceeded")]
    MaxCallDepth,

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("no such variable {0}")]
    NoVar(String),

    #[error("no such namespace {0}")]
    NoNamespace(String),

    #[error("could not parse as bool value: {0}")]
    ExpectedBool(String),

    #[error("expected integer, got {0}")]
    ExpectedInt(String),

    #[error("expected float, got {0}")]
    ExpectedFloat(String),

    #[error("cannot use as map: need even number of elements")]
    OddMap,

    #[error("value {{{value}}} is not one of {{{allowed}}}")]
    Tuple { value: String, allowed: String },

    #[error("missing required arg {0}")]
    ArgMissing(String),

    #[error("unexpected extra arg {0}")]
    ArgExtra(String),

    #[error("expected {expected} args, got {got}")]
    ArgCount { expected: usize, got: usize },

    #[error("expected at least {expected} args, got {got}")]
    ArgMinimum { expected: usize, got: usize },

    #[error("expected arity to be one of {expected}, got {got}")]
    Arity { expected: String, got: usize },

    #[error("named arg {0} missing value")]
    MissingValue(String),

    #[error("{flag} is ambiguous: {first}/{second}")]
    AmbiguousFlag {
        flag: String,
        first: String,
        second: String,
    },

    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("internal fault: {0}")]
    Internal(String),

    #[error("{0}")]
    Thrown(Token),

    #[error("{0}")]
    Message(String),

    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<FroeError>,
    },
}

impl FroeError {
    pub fn message(msg: impl Into<String>) -> Self {
        FroeError::Message(msg.into())
    }

    /// Wrap with a context prefix. Kind identity survives: `root()` drills
    /// back down to the original variant no matter how many frames have
    /// prepended their name.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        FroeError::Context {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all `Context` wrapping peeled off.
    pub fn root(&self) -> &FroeError {
        match self {
            FroeError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for the control-flow family. Signals are in-band scripting
    /// constructs, not errors: `catch` must let them pass, and only their
    /// designated catchers may consume them.
    pub fn is_signal(&self) -> bool {
        matches!(
            self.root(),
            FroeError::Return(_)
                | FroeError::Break(_)
                | FroeError::Continue
                | FroeError::Tailcall(_)
                | FroeError::MaxCallDepth
        )
    }
}

/// Render an error the way the shell shows it.
pub fn format_error(err: &FroeError) -> String {
    format!("{} {}", ERROR_TAG, err)
}
