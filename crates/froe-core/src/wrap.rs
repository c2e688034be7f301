//! Wrapping host values into tokens.
//!
//! A wrapped token prints like its display text and is invocable in command
//! position: `[$obj method args…]`. The method name is validated through a
//! tuple-coerced argument, so a bad call's usage message enumerates the
//! available methods.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::args::{ArgSet, Argument};
use crate::error::FroeResult;
use crate::interp::Interp;
use crate::proc::Procedure;
use crate::token::{Token, TokenData};

/// An opaque wrapper around a host value, optionally carrying a method
/// table. Identity is the payload pointer: two wrappers are equal only when
/// they wrap the same allocation.
#[derive(Clone)]
pub struct HostObject {
    display: String,
    value: Arc<dyn Any + Send + Sync>,
    methods: Arc<BTreeMap<String, Procedure>>,
}

impl HostObject {
    pub fn new(
        display: impl Into<String>,
        value: Arc<dyn Any + Send + Sync>,
        methods: Vec<(&str, Procedure)>,
    ) -> HostObject {
        let methods = methods
            .into_iter()
            .map(|(name, p)| (name.to_string(), p))
            .collect();
        HostObject {
            display: display.into(),
            value,
            methods: Arc::new(methods),
        }
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }

    /// Borrow the payload back out as its concrete type.
    pub fn downcast<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.keys().map(|s| s.as_str()).collect()
    }

    /// The procedure that dispatches `[$obj method args…]` through the
    /// method table.
    pub fn dispatcher(&self) -> Procedure {
        let obj = self.clone();
        Procedure::new(move |interp: &mut Interp, argv: &[Token]| -> FroeResult {
            let argset = obj.dispatch_argset();
            let bound = match argset.bind(interp, argv) {
                Ok(b) => b,
                Err(e) => {
                    argset.show_usage(&mut interp.stderr);
                    return Err(e);
                }
            };
            let method = bound["method"].clone();
            let target = obj
                .methods
                .get(method.text())
                .expect("tuple coercion admitted the method")
                .clone();
            let mut call_args = vec![method];
            if let Some(tail) = bound.get("args") {
                call_args.extend(tail.as_list());
            }
            target.call(interp, &call_args)
        })
    }

    fn dispatch_argset(&self) -> ArgSet {
        let allowed: Vec<Token> = self.methods.keys().map(Token::new).collect();
        let coercer = Token::from_list(vec![Token::new("tuple"), Token::from_list(allowed)]);
        ArgSet::with_args(
            self.display.clone(),
            vec![
                Argument::new("method")
                    .with_default(Token::empty())
                    .with_coerce(coercer)
                    .with_help("Method name"),
                Argument::new("args").with_help("Arguments passed to the method"),
            ],
        )
        .expect("a single-group set always validates")
    }
}

/// Wrap a host value with a method table into a token. The token's cache
/// holds the object; its text is the display form.
pub fn wrap_object(
    display: impl Into<String>,
    value: Arc<dyn Any + Send + Sync>,
    methods: Vec<(&str, Procedure)>,
) -> Token {
    let obj = HostObject::new(display, value, methods);
    Token::with_data(obj.display().to_string(), TokenData::Host(obj))
}
