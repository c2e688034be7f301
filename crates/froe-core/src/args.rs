//! The argument binder: declarative argument specifications for procedures.
//!
//! An [`ArgSet`] holds one or more [`ArgGroup`]s of named flags and
//! positional slots, with defaults, coercers, variadic tails and multi-arity
//! selection. Binding a caller's raw tokens against it produces the
//! name→value map that becomes the callee's local variables.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;

use crate::error::{FroeError, FroeResult};
use crate::interp::Interp;
use crate::token::{quote_str, Token};

#[derive(Debug)]
pub struct ArgSet {
    pub cmd: String,
    pub help: String,
    pub groups: Vec<ArgGroup>,
    /// Allow unambiguous prefixes of flag names.
    pub lazy: bool,
}

#[derive(Default, Debug)]
pub struct ArgGroup {
    /// Keyed by the full flag name, including the leading `-`.
    pub named: BTreeMap<String, Argument>,
    pub pos: Vec<Argument>,
    pub pos_variadic: bool,
    pub named_variadic: bool,
}

#[derive(Clone, Default, Debug)]
pub struct Argument {
    pub name: String,
    pub default: Option<Token>,
    /// A command prefix applied to the raw value; its result is bound.
    pub coerce: Option<Token>,
    pub help: String,
}

impl Argument {
    pub fn new(name: impl Into<String>) -> Argument {
        Argument {
            name: name.into(),
            ..Argument::default()
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Argument {
        self.help = help.into();
        self
    }

    pub fn with_default(mut self, default: Token) -> Argument {
        self.default = Some(default);
        self
    }

    pub fn with_coerce(mut self, coerce: Token) -> Argument {
        self.coerce = Some(coerce);
        self
    }

    /// Resolve the final value: the provided token, else the default, else a
    /// missing-arg error; then the coercer, if any, maps it.
    pub fn get(&self, interp: &mut Interp, provided: Option<Token>) -> FroeResult {
        let val = provided
            .or_else(|| self.default.clone())
            .ok_or_else(|| FroeError::ArgMissing(self.name.clone()))?;
        let Some(coerce) = &self.coerce else {
            return Ok(val);
        };
        if coerce.text().is_empty() {
            return Ok(val);
        }
        let mut cmd = coerce.as_list();
        cmd.push(val);
        interp
            .exec_command(&cmd)
            .map_err(|e| e.context(format!("arg {}", self.name)))
    }

    /// The argument as it appears in a prototype.
    fn proto_text(&self) -> String {
        let mut out = self.name.clone();
        if self.default.is_none() && self.coerce.is_some() {
            out.push_str(" {}");
        }
        if let Some(default) = &self.default {
            out.push(' ');
            out.push_str(&default.quoted());
        }
        if let Some(coerce) = &self.coerce {
            out.push(' ');
            out.push_str(&coerce.quoted());
        }
        out
    }

    /// One help line: name, help text, coercer and default/required marker.
    fn help_line(&self) -> String {
        let mut out = format!("{}\t{}", self.name, self.help);
        if let Some(coerce) = &self.coerce {
            if !coerce.text().is_empty() {
                out.push_str(&format!(" ({})", coerce.text()));
            }
        }
        match &self.default {
            Some(d) if d.text().is_empty() && self.coerce.is_some() => {
                out.push_str(" (REQUIRED)")
            }
            Some(d) => out.push_str(&format!(" (Default: {})", quote_str(d.text()))),
            None => out.push_str(" (REQUIRED)"),
        }
        out
    }
}

impl ArgGroup {
    pub fn new(args: Vec<Argument>) -> ArgGroup {
        let mut group = ArgGroup::default();
        for arg in args {
            group.push(arg);
        }
        group
    }

    pub fn push(&mut self, arg: Argument) {
        if arg.name.starts_with('-') {
            self.named.insert(arg.name.clone(), arg);
        } else {
            self.pos.push(arg);
        }
    }

    /// Fixed positional count, or None for a variadic group.
    pub fn arity(&self) -> Option<usize> {
        if self.pos_variadic {
            None
        } else {
            Some(self.pos.len())
        }
    }

    /// Resolve a provided flag name against the declared ones: exact match
    /// wins, a unique prefix is completed, ambiguity is an error, and an
    /// unknown flag errors unless the group takes variadic named args.
    fn lazy_match(&self, name: &str) -> FroeResult<String> {
        if self.named.contains_key(name) {
            return Ok(name.to_string());
        }
        let mut found: Option<&str> = None;
        for full in self.named.keys() {
            if full.starts_with(name) {
                if let Some(first) = found {
                    return Err(FroeError::AmbiguousFlag {
                        flag: name.to_string(),
                        first: full.clone(),
                        second: first.to_string(),
                    });
                }
                found = Some(full);
            }
        }
        match found {
            Some(full) => Ok(full.to_string()),
            None if self.named_variadic => Ok(name.to_string()),
            None => Err(FroeError::ArgExtra(name.to_string())),
        }
    }

    /// The group's prototype: named args first (sorted), then positional.
    pub fn prototype(&self) -> String {
        let mut out = String::new();
        for arg in self.named.values() {
            out.push_str("  ");
            out.push_str(&quote_str(&arg.proto_text()));
        }
        for arg in &self.pos {
            out.push_str("  ");
            out.push_str(&quote_str(&arg.proto_text()));
        }
        out
    }
}

impl ArgSet {
    pub fn new(cmd: impl Into<String>) -> ArgSet {
        ArgSet {
            cmd: cmd.into(),
            help: String::new(),
            groups: Vec::new(),
            lazy: true,
        }
    }

    /// An ArgSet with one group built from `args`.
    pub fn with_args(cmd: impl Into<String>, args: Vec<Argument>) -> FroeResult<ArgSet> {
        let mut set = ArgSet::new(cmd);
        set.groups.push(ArgGroup::new(args));
        set.validate()?;
        Ok(set)
    }

    pub fn with_groups(cmd: impl Into<String>, groups: Vec<ArgGroup>) -> FroeResult<ArgSet> {
        let mut set = ArgSet::new(cmd);
        set.groups = groups;
        set.validate()?;
        Ok(set)
    }

    /// Parse a prototype token into an ArgSet. Groups are separated by `|`;
    /// each argument is `{name ?default? ?coerce? ?help?}`. A positional
    /// named `args` makes its group positionally variadic; a flag named
    /// `-args` allows unknown flags through.
    pub fn from_proto(cmd: &str, proto: &Token) -> FroeResult<ArgSet> {
        let mut set = ArgSet::new(cmd);
        let proto_list = proto.as_list();
        for sublist in split_on(&proto_list, "|") {
            let mut group = ArgGroup::default();
            for (i, spec) in sublist.iter().enumerate() {
                let arg = parse_proto_arg(spec)
                    .map_err(|e| e.context(format!("arg {}", i)))?;
                // single-character names can never be flags
                if arg.name.len() < 2 {
                    group.pos.push(arg);
                } else {
                    group.push(arg);
                }
            }
            set.groups.push(group);
        }
        set.validate()?;
        Ok(set)
    }

    /// Normalize and sanity-check the groups. Trailing `args` positionals
    /// and `-args` flags flip their variadic bits here; multi-arity sets
    /// must have unique fixed arities, no variadic positionals and no
    /// positional defaults.
    pub fn validate(&mut self) -> FroeResult<()> {
        for group in &mut self.groups {
            if group.pos.last().map(|a| a.name == "args").unwrap_or(false) {
                group.pos_variadic = true;
            }
            if group.named.remove("-args").is_some() {
                group.named_variadic = true;
            }
        }

        if self.groups.len() <= 1 {
            if let Some(group) = self.groups.first_mut() {
                if group.pos_variadic {
                    if let Some(last) = group.pos.last_mut() {
                        last.default = Some(Token::empty());
                    }
                }
            }
            return Ok(());
        }

        let mut seen = std::collections::HashSet::new();
        for (i, group) in self.groups.iter().enumerate() {
            if group.pos_variadic {
                return Err(FroeError::message(format!(
                    "{}: cannot use variadic positional with multi-arity (group {})",
                    self.cmd, i
                )));
            }
            for arg in &group.pos {
                if arg.default.is_some() {
                    return Err(FroeError::message(format!(
                        "{}: positional defaults not allowed with multi-arity (group {})",
                        self.cmd, i
                    )));
                }
            }
            let arity = group.pos.len();
            if !seen.insert(arity) {
                return Err(FroeError::message(format!(
                    "{}: duplicate fixed arity {} in multi-arity",
                    self.cmd, arity
                )));
            }
        }
        Ok(())
    }

    fn select_group(&self, positional: usize) -> Option<&ArgGroup> {
        match self.groups.len() {
            1 => self.groups.first(),
            _ => self
                .groups
                .iter()
                .find(|g| !g.pos_variadic && g.pos.len() == positional),
        }
    }

    fn arity_summary(&self) -> String {
        let mut fixed: Vec<usize> = self
            .groups
            .iter()
            .filter(|g| !g.pos_variadic)
            .map(|g| g.pos.len())
            .collect();
        fixed.sort_unstable();
        fixed
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Bind a caller's raw tokens to a name→value map suitable as a frame's
    /// local variables. Index 0 is the command name and is skipped.
    pub fn bind(&self, interp: &mut Interp, args: &[Token]) -> FroeResult<HashMap<String, Token>> {
        let mut bound = HashMap::new();

        if args.len() <= 1 && self.groups.is_empty() {
            return Ok(bound);
        }

        let (mut named_args, pos_args) = parse_args(args)?;

        if self.groups.is_empty() {
            if let Some(name) = named_args.keys().next() {
                return Err(FroeError::ArgExtra(name.clone()));
            }
            if let Some(tok) = pos_args.first() {
                return Err(FroeError::ArgExtra(tok.text().to_string()));
            }
            return Ok(bound);
        }

        let group = self.select_group(pos_args.len()).ok_or_else(|| {
            FroeError::Arity {
                expected: self.arity_summary(),
                got: pos_args.len(),
            }
        })?;

        if self.lazy {
            let provided: Vec<String> = named_args.keys().cloned().collect();
            for name in provided {
                match group.lazy_match(&name) {
                    Ok(full) => {
                        if full != name {
                            let val = named_args.remove(&name).expect("key came from the map");
                            named_args.insert(full, val);
                        }
                    }
                    Err(_) if group.named_variadic => {}
                    Err(e) => return Err(e),
                }
            }
        }

        // declared flags: provided value, default, or required
        for (name, arg) in &group.named {
            let val = arg.get(interp, named_args.get(name).cloned())?;
            bound.insert(name[1..].to_string(), val);
        }

        // provided flags nobody declared
        for (name, val) in &named_args {
            if group.named.contains_key(name) {
                continue;
            }
            if !group.named_variadic {
                return Err(FroeError::ArgExtra(name.clone()));
            }
            bound.insert(name[1..].to_string(), val.clone());
        }

        for (i, arg) in group.pos.iter().enumerate() {
            let val = arg.get(interp, pos_args.get(i).cloned())?;
            bound.insert(arg.name.clone(), val);
        }

        // positional overflow packs into `args` for a variadic group
        if pos_args.len() > group.pos.len() {
            if group.pos_variadic {
                bound.insert(
                    "args".to_string(),
                    Token::from_list(pos_args[group.pos.len() - 1..].to_vec()),
                );
                return Ok(bound);
            }
            return Err(FroeError::ArgExtra(
                pos_args[group.pos.len()].text().to_string(),
            ));
        }

        Ok(bound)
    }

    /// The command with every group's prototype, fixed arities first.
    pub fn signature(&self) -> String {
        let mut out = self.cmd.clone();
        let mut order: Vec<&ArgGroup> = self.groups.iter().collect();
        order.sort_by_key(|g| g.arity().unwrap_or(usize::MAX));
        for (i, group) in order.iter().enumerate() {
            if i > 0 {
                out.push_str("  |");
            }
            out.push_str(&group.prototype());
        }
        out
    }

    /// The full help message: signature, free-form help, and one line per
    /// argument (per group when there are several).
    pub fn help_text(&self) -> String {
        let mut out = self.signature();
        if self.help.is_empty() {
            out.push_str("\n\n");
        } else {
            out.push_str(&format!("\n\n{}\n\n", self.help));
        }
        let mini_usage = self.groups.len() > 1;
        for group in &self.groups {
            if mini_usage {
                out.push_str(&format!("\n{} {}\n", self.cmd, group.prototype()));
            }
            for arg in group.named.values() {
                out.push_str(&format!("\t{}\n", arg.help_line()));
            }
            for arg in &group.pos {
                out.push_str(&format!("\t{}\n", arg.help_line()));
            }
        }
        out
    }

    pub fn show_usage(&self, w: &mut dyn Write) {
        let _ = w.write_all(self.help_text().as_bytes());
    }
}

/// Sort a caller's raw tokens into named and positional arguments.
///
/// Index 0 is skipped (the command name). A token starting with `-` of at
/// least two characters names a flag whose value is the following token; it
/// is an error for the argument list to end right after a flag name. A bare
/// `--` switches to positional-only for the remainder.
pub fn parse_args(args: &[Token]) -> FroeResult<(HashMap<String, Token>, Vec<Token>)> {
    let mut named = HashMap::new();
    let mut pos = Vec::new();
    let mut i = 1;
    while i < args.len() {
        let text = args[i].text();
        if text == "--" {
            pos.extend(args[i + 1..].iter().cloned());
            break;
        }
        if !text.starts_with('-') || text.len() < 2 {
            pos.push(args[i].clone());
            i += 1;
            continue;
        }
        if i + 1 >= args.len() {
            return Err(FroeError::MissingValue(text.to_string()));
        }
        named.insert(text.to_string(), args[i + 1].clone());
        i += 2;
    }
    Ok((named, pos))
}

/// Parse one `{name ?default? ?coerce? ?help?}` argument spec. An explicitly
/// empty default alongside a coercer is the "no default, value required"
/// sentinel; an explicitly empty coercer alongside help means no coercion.
fn parse_proto_arg(spec: &Token) -> FroeResult<Argument> {
    let list = spec.as_list();
    if list.is_empty() {
        return Err(FroeError::message("empty arg in prototype"));
    }
    if list.len() > 4 {
        return Err(FroeError::message("too many elements in arg prototype"));
    }
    let mut arg = Argument::new(list[0].text());
    if list.len() >= 2 {
        arg.default = Some(list[1].clone());
        if list.len() > 2 && list[1].text().is_empty() {
            arg.default = None;
        }
    }
    if list.len() >= 3 {
        arg.coerce = Some(list[2].clone());
        if list.len() > 3 && list[2].text().is_empty() {
            arg.coerce = None;
        }
    }
    if list.len() == 4 {
        arg.help = list[3].text().to_string();
    }
    Ok(arg)
}

fn split_on<'a>(list: &'a [Token], separator: &str) -> Vec<&'a [Token]> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, tok) in list.iter().enumerate() {
        if tok.text() == separator {
            out.push(&list[start..i]);
            start = i + 1;
        }
    }
    out.push(&list[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interp::{Interp, InterpOptions};

    fn interp() -> Interp {
        Interp::new(InterpOptions::default())
    }

    fn raw(line: &str) -> Vec<Token> {
        Token::new(line).as_list()
    }

    #[test]
    fn raw_parse_sorts_named_and_positional() {
        let args = raw("cmd arg1 -named namedval1 arg2 -named2 namedval2 arg3 -- -arg4 -arg5 arg6");
        let (named, pos) = parse_args(&args).unwrap();
        assert_eq!(named.len(), 2);
        assert_eq!(named["-named"].text(), "namedval1");
        assert_eq!(named["-named2"].text(), "namedval2");
        let pos_texts: Vec<&str> = pos.iter().map(|t| t.text()).collect();
        assert_eq!(pos_texts, vec!["arg1", "arg2", "arg3", "-arg4", "-arg5", "arg6"]);
    }

    #[test]
    fn flag_without_value_is_an_error() {
        let err = parse_args(&raw("cmd -flag")).unwrap_err();
        assert!(err.to_string().contains("missing value"));
    }

    #[test]
    fn zero_groups_accept_only_empty_invocations() {
        let set = ArgSet::new("noargs");
        let mut i = interp();
        assert!(set.bind(&mut i, &raw("noargs")).unwrap().is_empty());
        assert!(set.bind(&mut i, &raw("noargs extra")).is_err());
    }

    #[test]
    fn positional_binding_and_missing_required() {
        let set = ArgSet::with_args(
            "two",
            vec![Argument::new("a"), Argument::new("b")],
        )
        .unwrap();
        let mut i = interp();
        let bound = set.bind(&mut i, &raw("two x y")).unwrap();
        assert_eq!(bound["a"].text(), "x");
        assert_eq!(bound["b"].text(), "y");
        let err = set.bind(&mut i, &raw("two x")).unwrap_err();
        assert!(err.to_string().contains("missing required arg b"));
    }

    #[test]
    fn defaults_fill_absent_positionals() {
        let set = ArgSet::with_args(
            "opt",
            vec![
                Argument::new("a"),
                Argument::new("b").with_default(Token::new("fallback")),
            ],
        )
        .unwrap();
        let mut i = interp();
        let bound = set.bind(&mut i, &raw("opt x")).unwrap();
        assert_eq!(bound["b"].text(), "fallback");
    }

    #[test]
    fn lazy_prefixes_resolve_or_error() {
        let set = ArgSet::with_args(
            "lazy",
            vec![
                Argument::new("-alpha").with_default(Token::new("a")),
                Argument::new("-alphabet").with_default(Token::new("b")),
            ],
        )
        .unwrap();
        let mut i = interp();
        // exact name wins over the longer flag it prefixes
        let bound = set.bind(&mut i, &raw("lazy -alpha v")).unwrap();
        assert_eq!(bound["alpha"].text(), "v");
        assert_eq!(bound["alphabet"].text(), "b");
        // a shared prefix is ambiguous
        let err = set.bind(&mut i, &raw("lazy -alp v")).unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
        // a unique prefix completes
        let bound = set.bind(&mut i, &raw("lazy -alphab v")).unwrap();
        assert_eq!(bound["alphabet"].text(), "v");
    }

    #[test]
    fn multi_arity_selects_by_positional_count() {
        let set = ArgSet::with_groups(
            "multi",
            vec![
                ArgGroup::new(vec![Argument::new("x")]),
                ArgGroup::new(vec![Argument::new("x"), Argument::new("y")]),
            ],
        )
        .unwrap();
        let mut i = interp();
        let bound = set.bind(&mut i, &raw("multi 1")).unwrap();
        assert_eq!(bound.len(), 1);
        let bound = set.bind(&mut i, &raw("multi 1 2")).unwrap();
        assert_eq!(bound["y"].text(), "2");
        let err = set.bind(&mut i, &raw("multi 1 2 3")).unwrap_err();
        assert!(err.to_string().contains("expected arity to be one of 1 | 2"));
    }

    #[test]
    fn multi_arity_rejects_variadic_and_defaults() {
        let err = ArgSet::with_groups(
            "bad",
            vec![
                ArgGroup::new(vec![Argument::new("x")]),
                ArgGroup::new(vec![Argument::new("x"), Argument::new("args")]),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("variadic"));

        let err = ArgSet::with_groups(
            "dup",
            vec![
                ArgGroup::new(vec![Argument::new("x")]),
                ArgGroup::new(vec![Argument::new("y")]),
            ],
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate fixed arity"));
    }

    #[test]
    fn variadic_tail_packs_excess() {
        let set = ArgSet::from_proto("v", &Token::new("first args")).unwrap();
        let mut i = interp();
        let bound = set.bind(&mut i, &raw("v a b c d")).unwrap();
        assert_eq!(bound["first"].text(), "a");
        assert_eq!(bound["args"].text(), "b c d");
        // absent tail defaults to empty
        let bound = set.bind(&mut i, &raw("v a")).unwrap();
        assert_eq!(bound["args"].text(), "");
    }

    #[test]
    fn proto_parsing_reads_defaults_and_coercers() {
        let set =
            ArgSet::from_proto("p", &Token::new("{-style glob} {-matchcase true} pattern str"))
                .unwrap();
        let group = &set.groups[0];
        assert_eq!(group.named["-style"].default.as_ref().unwrap().text(), "glob");
        assert_eq!(group.pos.len(), 2);

        let set = ArgSet::from_proto("c", &Token::new("{n {} int}")).unwrap();
        let arg = &set.groups[0].pos[0];
        assert!(arg.default.is_none());
        assert_eq!(arg.coerce.as_ref().unwrap().text(), "int");
    }

    #[test]
    fn coercers_run_as_command_prefixes() {
        let set = ArgSet::from_proto("c", &Token::new("{n {} int}")).unwrap();
        let mut i = interp();
        let bound = set.bind(&mut i, &raw("c 41")).unwrap();
        assert_eq!(bound["n"].as_int().unwrap(), 41);
        let err = set.bind(&mut i, &raw("c nope")).unwrap_err();
        assert!(err.to_string().contains("arg n"));
        // coerce with the {} sentinel means the value is required
        let err = set.bind(&mut i, &raw("c")).unwrap_err();
        assert!(err.to_string().contains("missing required arg n"));
    }

    #[test]
    fn named_variadic_accepts_unknown_flags() {
        let set = ArgSet::from_proto("nv", &Token::new("{-known k} -args")).unwrap();
        let mut i = interp();
        let bound = set.bind(&mut i, &raw("nv -known a -other b")).unwrap();
        assert_eq!(bound["known"].text(), "a");
        assert_eq!(bound["other"].text(), "b");
    }
}
