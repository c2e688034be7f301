//! The universal value.
//!
//! A [`Token`] is an immutable UTF-8 string plus a lazily-populated parse
//! cache. Scripts only ever see the string; the cache is pure memoization so
//! that a loop body, a list, or a number is parsed once rather than on every
//! use. Mutating operations (`index_set`, `append`, …) always build a new
//! token. Cloning a token is an `Arc` bump.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};

use crate::error::{FroeError, FroeResult};
use crate::lexer;
use crate::proc::Procedure;
use crate::wrap::HostObject;

/// A command is a token sequence; the first token names the procedure.
pub type Command = Vec<Token>;

/// A script is a command sequence.
pub type Script = Vec<Command>;

/// One parsed view of a token's text. At most one of these is ever cached
/// per token; a conversion that finds the slot holding a different shape
/// simply re-parses without caching.
#[derive(Clone)]
pub enum TokenData {
    List(Vec<Token>),
    Script(Script),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Ordered key/value pairs; duplicate keys are kept, the last wins on
    /// lookup.
    Map(Vec<(Token, Token)>),
    Proc(Procedure),
    Ref(VarRef),
    Host(HostObject),
}

/// An indirect handle to a variable slot somewhere else — another frame or a
/// namespace. Installed by `import -var`. The target is re-resolved at every
/// access, so a reference into a frame that has since unwound fails cleanly
/// instead of dangling.
#[derive(Clone, Debug)]
pub struct VarRef {
    pub name: String,
    pub target: RefTarget,
}

#[derive(Clone, Debug)]
pub enum RefTarget {
    /// A frame, identified by its monotonic id (never reused).
    Frame(u64),
    /// A namespace, identified by its registry key.
    Namespace(String),
}

struct Inner {
    text: String,
    cached: OnceCell<TokenData>,
}

#[derive(Clone)]
pub struct Token {
    inner: Arc<Inner>,
}

static EMPTY: Lazy<Token> = Lazy::new(|| Token::new(""));
static TRUE: Lazy<Token> = Lazy::new(|| Token::with_data("true", TokenData::Bool(true)));
static FALSE: Lazy<Token> = Lazy::new(|| Token::with_data("false", TokenData::Bool(false)));

impl Token {
    pub fn new(text: impl Into<String>) -> Token {
        Token {
            inner: Arc::new(Inner {
                text: text.into(),
                cached: OnceCell::new(),
            }),
        }
    }

    pub fn with_data(text: impl Into<String>, data: TokenData) -> Token {
        let tok = Token::new(text);
        let _ = tok.inner.cached.set(data);
        tok
    }

    /// The shared empty token.
    pub fn empty() -> Token {
        EMPTY.clone()
    }

    pub fn bool(b: bool) -> Token {
        if b {
            TRUE.clone()
        } else {
            FALSE.clone()
        }
    }

    pub fn int(i: i64) -> Token {
        Token::with_data(i.to_string(), TokenData::Int(i))
    }

    pub fn float(f: f64) -> Token {
        Token::with_data(f.to_string(), TokenData::Float(f))
    }

    /// Build a well-formed list token: the text is the elements' quoted
    /// forms joined by spaces, and the list view is pre-cached.
    pub fn from_list(elems: Vec<Token>) -> Token {
        let text = elems
            .iter()
            .map(|t| t.quoted())
            .collect::<Vec<_>>()
            .join(" ");
        Token::with_data(text, TokenData::List(elems))
    }

    pub fn text(&self) -> &str {
        &self.inner.text
    }

    pub fn data(&self) -> Option<&TokenData> {
        self.inner.cached.get()
    }

    /// Memoize a parse result. First writer wins; later calls are no-ops,
    /// which keeps the one-slot cache consistent with the text.
    pub(crate) fn prime(&self, data: TokenData) {
        let _ = self.inner.cached.set(data);
    }

    /// The token's text elided to a short display form for error messages.
    pub fn summary(&self) -> String {
        let text = self.text();
        if text.chars().count() < 20 {
            return text.to_string();
        }
        let head: String = text.chars().take(10).collect();
        let tail: String = {
            let chars: Vec<char> = text.chars().collect();
            chars[chars.len() - 9..].iter().collect()
        };
        format!("{}…{}", head, tail)
    }

    // ------------------------------------------------------------------
    // Lazy views

    pub fn as_bool(&self) -> FroeResult<bool> {
        if let Some(TokenData::Bool(b)) = self.data() {
            return Ok(*b);
        }
        let b = match self.text().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" | "yes" => true,
            "false" | "0" | "off" | "no" => false,
            _ => return Err(FroeError::ExpectedBool(self.text().to_string())),
        };
        self.prime(TokenData::Bool(b));
        Ok(b)
    }

    pub fn is_true(&self) -> bool {
        self.as_bool().unwrap_or(false)
    }

    pub fn as_int(&self) -> FroeResult<i64> {
        if let Some(TokenData::Int(i)) = self.data() {
            return Ok(*i);
        }
        let i: i64 = self
            .text()
            .parse()
            .map_err(|_| FroeError::ExpectedInt(self.text().to_string()))?;
        self.prime(TokenData::Int(i));
        Ok(i)
    }

    pub fn as_float(&self) -> FroeResult<f64> {
        match self.data() {
            Some(TokenData::Float(f)) => return Ok(*f),
            Some(TokenData::Int(i)) => return Ok(*i as f64),
            _ => {}
        }
        let f: f64 = self
            .text()
            .parse()
            .map_err(|_| FroeError::ExpectedFloat(self.text().to_string()))?;
        self.prime(TokenData::Float(f));
        Ok(f)
    }

    /// The token's elements when read as a list. Empty text is the empty
    /// list; text without structural characters is a one-element list of
    /// itself (fast path, not cached).
    pub fn as_list(&self) -> Vec<Token> {
        if let Some(TokenData::List(l)) = self.data() {
            return l.clone();
        }
        if self.text().is_empty() {
            return Vec::new();
        }
        if !self
            .text()
            .contains([' ', '\t', '\r', '\n', '\x0c', '{', '}', '[', ']', '"', '\\'])
        {
            return vec![self.clone()];
        }
        let list = lexer::lex_list(self.text());
        if self.data().is_none() && list.len() != 1 {
            self.prime(TokenData::List(list.clone()));
        }
        list
    }

    /// The token parsed as a script of commands.
    pub fn as_script(&self) -> Script {
        if let Some(TokenData::Script(s)) = self.data() {
            return s.clone();
        }
        let script = lexer::lex_script(self.text());
        if self.data().is_none() {
            self.prime(TokenData::Script(script.clone()));
        }
        script
    }

    /// Pairwise grouping of the list view. Fails on odd length.
    pub fn as_map(&self) -> FroeResult<Vec<(Token, Token)>> {
        if let Some(TokenData::Map(m)) = self.data() {
            return Ok(m.clone());
        }
        let list = self.as_list();
        if list.len() % 2 != 0 {
            return Err(FroeError::OddMap);
        }
        let pairs: Vec<(Token, Token)> = list
            .chunks(2)
            .map(|c| (c[0].clone(), c[1].clone()))
            .collect();
        if self.data().is_none() {
            self.prime(TokenData::Map(pairs.clone()));
        }
        Ok(pairs)
    }

    /// Look a key up in the map view; with duplicate keys the last wins.
    pub fn map_get(&self, key: &str) -> FroeResult<Option<Token>> {
        let pairs = self.as_map()?;
        Ok(pairs
            .iter()
            .rev()
            .find(|(k, _)| k.text() == key)
            .map(|(_, v)| v.clone()))
    }

    /// Ensure the token equals one of `allowed`, or report the expected set.
    pub fn as_tuple(&self, allowed: &[Token]) -> FroeResult<Token> {
        if allowed.is_empty() {
            return Err(FroeError::message("no value will satisfy empty tuple"));
        }
        if allowed.iter().any(|t| self == t) {
            return Ok(self.clone());
        }
        Err(FroeError::Tuple {
            value: self.text().to_string(),
            allowed: join(allowed, " | "),
        })
    }

    // ------------------------------------------------------------------
    // Indexing and slicing

    /// The idx'th element of the list view. Negative counts from the end;
    /// out of range yields the empty token.
    pub fn index(&self, idx: i64) -> Token {
        let list = self.as_list();
        let idx = if idx < 0 { list.len() as i64 + idx } else { idx };
        if idx < 0 || idx >= list.len() as i64 {
            return Token::empty();
        }
        list[idx as usize].clone()
    }

    /// A new token whose list view has position `idx` replaced, with holes
    /// filled by empty tokens.
    pub fn index_set(&self, idx: i64, value: Token) -> FroeResult<Token> {
        let mut list = self.as_list();
        let idx = if idx < 0 { list.len() as i64 + idx } else { idx };
        if idx < 0 {
            return Err(FroeError::message(format!("index {} out of range", idx)));
        }
        let idx = idx as usize;
        while list.len() < idx + 1 {
            list.push(Token::empty());
        }
        list[idx] = value;
        Ok(Token::from_list(list))
    }

    /// A new list token holding elements `start..=end`; when `start > end`
    /// the slice is reversed. Ends are clamped; negatives count backwards.
    pub fn slice(&self, start: i64, end: i64) -> Token {
        let list = self.as_list();
        let len = list.len() as i64;
        let mut start = if start < 0 { len + start } else { start };
        if start < 0 {
            start = 0;
        }
        let mut end = if end < 0 { len + end } else { end };
        if end >= len {
            end = len - 1;
        }
        if end < 0 {
            return Token::from_list(Vec::new());
        }
        if start > end {
            let mut out: Vec<Token> = list[end as usize..(start as usize + 1).min(list.len())].to_vec();
            out.reverse();
            return Token::from_list(out);
        }
        Token::from_list(list[start as usize..=end as usize].to_vec())
    }

    /// The number of elements in the list view.
    pub fn len(&self) -> usize {
        self.as_list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.text().is_empty()
    }

    /// A new list token with `elems` appended to this token's list view.
    pub fn append(&self, elems: Vec<Token>) -> Token {
        let mut list = self.as_list();
        list.extend(elems);
        Token::from_list(list)
    }

    // ------------------------------------------------------------------
    // Quoting

    /// The text wrapped in `{…}` when it needs quoting to survive re-lexing
    /// as a single list element; otherwise the text itself.
    pub fn quoted(&self) -> String {
        quote_str(self.text())
    }

    /// The converse of `quoted`: the text stripped of one level of literal
    /// brackets.
    pub fn literal(&self) -> &str {
        lexer::strip_literal_brackets(self.text())
    }
}

pub(crate) fn quote_str(s: &str) -> String {
    if s.is_empty() || s.contains(['\\', ' ', '\t', '\n', '$']) {
        format!("{{{}}}", s)
    } else {
        s.to_string()
    }
}

/// Join the tokens' texts with `sep`.
pub fn join(toks: &[Token], sep: &str) -> String {
    toks.iter()
        .map(|t| t.text())
        .collect::<Vec<_>>()
        .join(sep)
}

impl PartialEq for Token {
    /// Equal when the cached data defines an equality hook that says so, or
    /// when the texts are byte-equal.
    fn eq(&self, other: &Token) -> bool {
        match (self.data(), other.data()) {
            (Some(TokenData::Int(a)), Some(TokenData::Int(b))) if a == b => return true,
            (Some(TokenData::Float(a)), Some(TokenData::Float(b))) if a == b => return true,
            (Some(TokenData::Bool(a)), Some(TokenData::Bool(b))) if a == b => return true,
            (Some(TokenData::Proc(a)), Some(TokenData::Proc(b))) if a.ptr_eq(b) => return true,
            (Some(TokenData::Host(a)), Some(TokenData::Host(b))) if a.ptr_eq(b) => return true,
            _ => {}
        }
        self.text() == other.text()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?})", self.text())
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Token {
        Token::new(s)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Token {
        Token::new(s)
    }
}

impl From<i64> for Token {
    fn from(i: i64) -> Token {
        Token::int(i)
    }
}

impl From<bool> for Token {
    fn from(b: bool) -> Token {
        Token::bool(b)
    }
}
