#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use froe_core::{FroeError, Interpreter, Token};

/// A shared in-memory sink for capturing interpreter output.
#[derive(Clone, Default)]
pub struct Sink(Arc<Mutex<Vec<u8>>>);

impl Sink {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

pub fn interp_with_output() -> (Interpreter, Sink) {
    let interp = Interpreter::new();
    let sink = Sink::default();
    interp.set_stdout(Box::new(sink.clone()));
    (interp, sink)
}

pub fn eval_ok(interp: &Interpreter, src: &str) -> Token {
    match interp.eval(src) {
        Ok(tok) => tok,
        Err(e) => panic!("script failed: {}", e),
    }
}

pub fn eval_err(interp: &Interpreter, src: &str) -> FroeError {
    match interp.eval(src) {
        Ok(tok) => panic!("expected an error, got {:?}", tok),
        Err(e) => e,
    }
}
