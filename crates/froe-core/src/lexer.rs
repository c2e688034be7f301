//! Splits raw source into commands and tokens.
//!
//! Two splitter primitives drive everything: [`lines`] yields logical lines
//! (commands) terminated by `\n` or `;`, and [`tokens`] yields
//! whitespace-separated tokens within a line. Both honor a single escape
//! convention — a backslash removes the following byte from structural
//! interpretation — and both track one level of `{…}` / `[…]` / `"…"`
//! grouping so that terminators inside balanced groups are ignored.

use crate::token::{Command, Script, Token};

fn close_symbol(b: u8) -> u8 {
    match b {
        b'{' => b'}',
        b'[' => b']',
        b'"' => b'"',
        _ => 0,
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c')
}

fn drop_cr(s: &str) -> &str {
    s.strip_suffix('\r').unwrap_or(s)
}

/// Byte index of the closer matching an opener of `open`, counting nesting
/// and skipping escaped bytes. The scan counts from the start of `s`; the
/// first unbalanced `close` wins.
pub fn find_mate(s: &str, open: u8, close: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut count = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if b == open {
            count += 1;
        } else if b == close {
            count -= 1;
            if count == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Byte index of the second unescaped occurrence of `symbol`. Used to pair
/// double quotes, which do not nest.
pub fn find_pair(s: &str, symbol: u8) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut count = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if b == symbol {
            count += 1;
            if count > 1 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Logical lines of a script: terminated by `\n` or `;` outside any balanced
/// group, with a trailing `\r` stripped. A backslash-escaped newline is not a
/// terminator, so continuations stay within one line.
pub fn lines(src: &str) -> Lines<'_> {
    Lines { rest: src }
}

pub struct Lines<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let bytes = self.rest.as_bytes();
        let mut count = 0i32;
        let mut incr = 0u8;
        let mut decr = 0u8;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b'\n' | b';' if count == 0 => {
                    let line = drop_cr(&self.rest[..i]);
                    self.rest = &self.rest[i + 1..];
                    return Some(line);
                }
                b'"' => {
                    if count == 0 {
                        incr = b'"';
                        decr = b'"';
                        count = 1;
                    } else if bytes[i] == incr {
                        count = 0;
                    }
                }
                b'}' | b']' => {
                    if count > 0 && bytes[i] == decr {
                        count -= 1;
                    }
                }
                b'{' | b'[' => {
                    if count == 0 {
                        incr = bytes[i];
                        decr = close_symbol(bytes[i]);
                        count = 1;
                    } else if bytes[i] == incr {
                        count += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        // final non-terminated line, returned verbatim
        let line = drop_cr(self.rest);
        self.rest = "";
        Some(line)
    }
}

/// Tokens of a logical line: separated by runs of whitespace; a token that
/// opens with `{`, `[`, or `"` extends to its matching closer.
pub fn tokens(line: &str) -> Tokens<'_> {
    Tokens { rest: line }
}

pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let bytes = self.rest.as_bytes();
        let mut start = 0;
        while start < bytes.len() && is_space(bytes[start]) {
            start += 1;
        }
        if start >= bytes.len() {
            self.rest = "";
            return None;
        }
        let mut count = 0i32;
        let mut incr = 0u8;
        let mut decr = 0u8;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 1,
                b' ' | b'\t' | b'\n' if count == 0 => {
                    let tok = drop_cr(&self.rest[start..i]);
                    self.rest = &self.rest[i + 1..];
                    return Some(tok);
                }
                b'"' => {
                    if count == 0 {
                        incr = b'"';
                        decr = b'"';
                        count = 1;
                    } else if bytes[i] == incr {
                        count = 0;
                    }
                }
                b'}' | b']' => {
                    if count > 0 && bytes[i] == decr {
                        count -= 1;
                    }
                }
                b'{' | b'[' => {
                    if count == 0 {
                        incr = bytes[i];
                        decr = close_symbol(bytes[i]);
                        count = 1;
                    } else if bytes[i] == incr {
                        count += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
        // unterminated group at end of input: return it verbatim and let the
        // evaluator complain when it tries to use it
        let tok = drop_cr(&self.rest[start..]);
        self.rest = "";
        Some(tok)
    }
}

/// Strip one level of quoting from a token's literal form: `{X}` or `"X"`
/// with the closer at the very end becomes `X`; anything else is unchanged.
pub fn strip_literal_brackets(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        if bytes[0] == b'{' && find_mate(s, b'{', b'}') == Some(s.len() - 1) {
            return &s[1..s.len() - 1];
        }
        if bytes[0] == b'"' && find_pair(s, b'"') == Some(s.len() - 1) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// Lex source into a script. Empty commands and lines whose first token
/// begins with `#` are dropped here, so downstream never sees them.
pub fn lex_script(src: &str) -> Script {
    let mut script = Script::new();
    for line in lines(src) {
        let cmd: Command = tokens(line).map(Token::new).collect();
        if cmd.is_empty() || cmd[0].text().starts_with('#') {
            continue;
        }
        script.push(cmd);
    }
    script
}

/// Lex source into a flat token list, stripping the literal quoting wrapper
/// from each token. This is the parse behind a token's list view.
pub fn lex_list(src: &str) -> Vec<Token> {
    tokens(src)
        .map(|t| Token::new(strip_literal_brackets(t)))
        .collect()
}

/// Whether `src` is a complete script: every `{…}`, `[…]` and `"…"` group is
/// closed and the input does not end in a line continuation. The interactive
/// shell uses this to decide whether to keep reading.
pub fn is_complete(src: &str) -> bool {
    let bytes = src.as_bytes();
    let mut count = 0i32;
    let mut incr = 0u8;
    let mut decr = 0u8;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                if i + 1 >= bytes.len() {
                    return false;
                }
                i += 1;
            }
            b'"' => {
                if count == 0 {
                    incr = b'"';
                    decr = b'"';
                    count = 1;
                } else if bytes[i] == incr {
                    count = 0;
                }
            }
            b'}' | b']' => {
                if count > 0 && bytes[i] == decr {
                    count -= 1;
                }
            }
            b'{' | b'[' => {
                if count == 0 {
                    incr = bytes[i];
                    decr = close_symbol(bytes[i]);
                    count = 1;
                } else if bytes[i] == incr {
                    count += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    count == 0
}
