//! `eval` and `pipeline`.

use crate::args::{ArgGroup, ArgSet, Argument};
use crate::error::{FroeError, FroeResult};
use crate::interp::Interp;
use crate::token::{join, Token};

pub(crate) fn install(interp: &mut Interp) {
    interp.define("eval", cmd_eval);
    interp.define("pipeline", cmd_pipeline);
    interp.define("->", cmd_pipeline);
}

/// `eval ARG…` — join the arguments with spaces and evaluate the result as
/// a script.
fn cmd_eval(interp: &mut Interp, args: &[Token]) -> FroeResult {
    if args.len() < 2 {
        return Err(FroeError::ArgMinimum {
            expected: 1,
            got: args.len().saturating_sub(1),
        });
    }
    interp.exec_source(&join(&args[1..], " "))
}

/// `pipeline ?RESULT? SCRIPT` (alias `->`) — evaluate SCRIPT, binding each
/// command's result to the variable `|` so the next command can read it as
/// `$|`. `break` stops the pipeline without error. The `|` binding is
/// removed afterwards; with RESULT given, the final value lands there.
fn cmd_pipeline(interp: &mut Interp, args: &[Token]) -> FroeResult {
    let mut set = ArgSet::with_groups(
        args[0].text(),
        vec![
            ArgGroup::new(vec![script_arg()]),
            ArgGroup::new(vec![result_arg(), script_arg()]),
        ],
    )?;
    set.help = "evaluates {script} as a script, saving each command's result \
into the variable |, so the next command can use it as $|. The pipeline's \
value is the last command's value; with {result} given it is also stored \
under that name."
        .to_string();
    let bound = match set.bind(interp, args) {
        Ok(b) => b,
        Err(e) => {
            set.show_usage(&mut interp.stderr);
            return Err(e);
        }
    };

    let script = bound["script"].as_script();
    let mut result = Token::empty();
    for cmd in &script {
        match interp.exec_command(cmd) {
            Ok(v) => result = v,
            Err(FroeError::Break(v)) => {
                result = v;
                break;
            }
            Err(e) => return Err(e),
        }
        interp.set_var("|", result.clone())?;
    }
    let _ = interp.del_var("|");

    if let Some(resvar) = bound.get("result") {
        if !resvar.text().is_empty() {
            interp.set_var(resvar.text(), result.clone())?;
        }
    }
    Ok(result)
}

fn script_arg() -> Argument {
    Argument::new("script").with_help("the script to run as a pipeline")
}

fn result_arg() -> Argument {
    Argument::new("result").with_help("variable name to save the final result to")
}
