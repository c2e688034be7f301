//! The substitution engine: `\`-escapes, `$name` / `${name}` variable
//! references, and `[script]` subcommand calls inside a token.

use crate::error::{FroeError, FroeResult};
use crate::interp::Interp;
use crate::lexer::{find_mate, find_pair};
use crate::token::Token;

impl Interp {
    /// Produce the resolved form of one command argument. The input token is
    /// never modified; a new token is returned whenever anything expands.
    pub fn subst(&mut self, tok: &Token) -> FroeResult {
        let text = tok.text();
        if text.len() <= 1 {
            return Ok(tok.clone());
        }
        let bytes = text.as_bytes();

        if bytes[0] == b'{' && find_mate(text, b'{', b'}') == Some(text.len() - 1) {
            // a brace literal: strip the braces, substitute nothing inside
            return Ok(Token::new(&text[1..text.len() - 1]));
        }

        let work: &str;
        if bytes[0] == b'"' && find_pair(text, b'"') == Some(text.len() - 1) {
            // strip the quotes and run normal substitution on the interior
            work = &text[1..text.len() - 1];
        } else {
            if !text.contains(['[', '$', '\\']) {
                return Ok(tok.clone());
            }
            if bytes[0] == b'[' && find_mate(text, b'[', b']') == Some(text.len() - 1) {
                // the whole token is a subcommand
                return self.exec_source(&text[1..text.len() - 1]);
            }
            if bytes[0] == b'$' && var_end_index(text) == text.len() {
                // the whole token is a variable reference: hand back the
                // variable's token itself so cached data survives
                return self.get_var(parse_var_name(text));
            }
            work = text;
        }

        self.subst_mixed(tok, work)
    }

    fn subst_mixed(&mut self, tok: &Token, work: &str) -> FroeResult {
        let bytes = work.as_bytes();
        let mut out = String::with_capacity(work.len());
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    i += 1;
                    if i == bytes.len() {
                        out.push('\\');
                        break;
                    }
                    match bytes[i] {
                        b'0' => out.push('\0'),
                        b'a' => out.push('\x07'),
                        b'b' => out.push('\x08'),
                        b't' => out.push('\t'),
                        b'n' => out.push('\n'),
                        b'v' => out.push('\x0b'),
                        b'f' => out.push('\x0c'),
                        b'r' => out.push('\r'),
                        b'\\' => out.push('\\'),
                        b'u' => {
                            i += 1;
                            i += push_unicode_escape(&mut out, &work[i..]);
                            continue;
                        }
                        b'x' => {
                            i += 1;
                            let n = count_hex(&work[i..], 2);
                            if n > 0 {
                                if let Ok(v) = u32::from_str_radix(&work[i..i + n], 16) {
                                    if let Some(c) = char::from_u32(v) {
                                        out.push(c);
                                    }
                                }
                                i += n;
                            }
                            continue;
                        }
                        _ => {
                            // any other escaped character is emitted verbatim
                            let ch = work[i..].chars().next().unwrap_or('\\');
                            out.push(ch);
                            i += ch.len_utf8();
                            continue;
                        }
                    }
                    i += 1;
                }
                b'$' => {
                    let end = var_end_index(&work[i..]);
                    let name = parse_var_name(&work[i..i + end]);
                    let val = self.get_var(name).map_err(|e| {
                        if e.is_signal() {
                            e
                        } else {
                            e.context(format!("could not lookup var {}", name))
                        }
                    })?;
                    out.push_str(val.text());
                    i += end;
                }
                b'[' => {
                    if i + 1 < bytes.len() && bytes[i + 1] == b']' {
                        // empty subcommand inserts nothing
                        i += 2;
                        continue;
                    }
                    let mate = find_mate(&work[i..], b'[', b']').ok_or_else(|| {
                        FroeError::Syntax(format!(
                            "could not find matching ] in {}",
                            tok.summary()
                        ))
                    })?;
                    let ret = self.exec_source(&work[i + 1..i + mate]).map_err(|e| {
                        if e.is_signal() {
                            e
                        } else {
                            e.context(format!("error executing subcommand {}", tok.summary()))
                        }
                    })?;
                    out.push_str(ret.text());
                    i += mate + 1;
                }
                _ => {
                    let ch = work[i..].chars().next().unwrap();
                    out.push(ch);
                    i += ch.len_utf8();
                }
            }
        }
        Ok(Token::new(out))
    }
}

/// Consume a `\u` escape from `rest` into `out`, returning how many bytes
/// were used. Accepts the braced `\u{HEX}` form and a bare hex run, both
/// capped at six digits.
fn push_unicode_escape(out: &mut String, rest: &str) -> usize {
    let bytes = rest.as_bytes();
    if !bytes.is_empty() && bytes[0] == b'{' {
        let n = count_hex(&rest[1..], 6);
        if n > 0 && rest.as_bytes().get(1 + n) == Some(&b'}') {
            if let Ok(v) = u32::from_str_radix(&rest[1..1 + n], 16) {
                if let Some(c) = char::from_u32(v) {
                    out.push(c);
                }
            }
            return n + 2;
        }
        return 0;
    }
    let n = count_hex(rest, 6);
    if n == 0 {
        return 0;
    }
    if let Ok(v) = u32::from_str_radix(&rest[..n], 16) {
        if let Some(c) = char::from_u32(v) {
            out.push(c);
        }
    }
    n
}

fn count_hex(s: &str, max: usize) -> usize {
    s.bytes()
        .take(max)
        .take_while(|b| b.is_ascii_hexdigit())
        .count()
}

/// Index of the first byte past a variable reference at the start of `s`.
/// The leading byte is assumed to be the `$` sigil. Braced names run to the
/// matching `}`; bare names end at the next structural or whitespace byte.
pub(crate) fn var_end_index(s: &str) -> usize {
    if s.len() <= 2 {
        return s.len();
    }
    let bytes = s.as_bytes();
    if bytes[1] == b'{' {
        return match find_mate(&s[1..], b'{', b'}') {
            Some(m) => m + 2,
            None => s.len(),
        };
    }
    match s[1..].find(['[', '\\', ' ', '$', '\n', '\t']) {
        Some(idx) => idx + 1,
        None => s.len(),
    }
}

/// Strip the sigil and any quoting braces from a variable reference.
pub(crate) fn parse_var_name(name: &str) -> &str {
    name[1..].trim_matches(|c| c == '{' || c == '}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{Interp, InterpOptions};
    use crate::token::Token;

    fn test_interp() -> Interp {
        let mut interp = Interp::new(InterpOptions::default());
        interp.define("foo", |_, _| Ok(Token::new("bar")));
        interp.set_var("varname", Token::new("varvalue")).unwrap();
        interp
    }

    #[test]
    fn substitution_table() {
        let cases: &[(&str, &str)] = &[
            ("", ""),
            ("\"Hello World!\"", "Hello World!"),
            ("\\x01\\x02\\x03\\x04", "\x01\x02\x03\x04"),
            ("\\\\\\\\", "\\\\"),
            ("\\x4dcd", "\x4dcd"),
            ("\\0\\a\\b\\r\\f\\n", "\0\x07\x08\r\x0c\n"),
            ("superduper isn't it?", "superduper isn't it?"),
            ("{yes}", "yes"),
            ("a[]", "a"),
            ("[][][]", ""),
            ("[]", ""),
            ("[foo]", "bar"),
            ("[foo and this gets ignored]", "bar"),
            (
                "utilize different path[foo and this gets ignored]",
                "utilize different pathbar",
            ),
            ("\\u1f20", "\u{1f20}"),
            ("\\u{1F600}", "\u{1F600}"),
            ("$varname", "varvalue"),
            ("${varname}", "varvalue"),
            ("$varname$varname", "varvaluevarvalue"),
            ("${varname}${varname}", "varvaluevarvalue"),
            ("{}", ""),
            ("\"no space escape needed\"", "no space escape needed"),
            ("{no space escape needed}", "no space escape needed"),
            (
                "but\\ space\\ escapes\\ work\\ too",
                "but space escapes work too",
            ),
        ];
        let mut interp = test_interp();
        for (input, want) in cases {
            let out = interp.subst(&Token::new(*input)).unwrap();
            assert_eq!(out.text(), *want, "substituting {:?}", input);
        }
    }

    #[test]
    fn braced_tokens_are_identity_after_stripping() {
        let mut interp = test_interp();
        let out = interp.subst(&Token::new("{$varname [foo]}")).unwrap();
        assert_eq!(out.text(), "$varname [foo]");
    }

    #[test]
    fn plain_tokens_come_back_unchanged() {
        let mut interp = test_interp();
        let tok = Token::new("no-special-chars");
        let out = interp.subst(&tok).unwrap();
        assert_eq!(out.text(), tok.text());
    }

    #[test]
    fn whole_token_variable_keeps_cached_data() {
        let mut interp = test_interp();
        interp.set_var("n", Token::int(42)).unwrap();
        let out = interp.subst(&Token::new("$n")).unwrap();
        assert_eq!(out.as_int().unwrap(), 42);
    }

    #[test]
    fn missing_variable_reports_name() {
        let mut interp = test_interp();
        let err = interp.subst(&Token::new("pre$missing")).unwrap_err();
        assert!(err.to_string().contains("no such variable missing"));
    }

    #[test]
    fn var_end_index_cases() {
        let cases: &[(&str, usize)] = &[
            ("$a", 2),
            ("$asdf", 5),
            ("$asdf$asdf", 5),
            ("$asdf asdf", 5),
            ("${asdf} asdf", 7),
            ("${asdf asdf} asdf", 12),
            ("${asdf[asdf}", 12),
        ];
        for (input, want) in cases {
            assert_eq!(var_end_index(input), *want, "for {:?}", input);
        }
    }
}
