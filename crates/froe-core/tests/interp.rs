//! End-to-end evaluation: substitution, signals at the host boundary,
//! output, and the unknown-command hook.

mod common;

use common::{eval_err, eval_ok, interp_with_output};
use froe_core::{FroeError, Interpreter, Token};

#[test]
fn assignment_substitution_and_return() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "set a 1; set b [set c $a$a$a]; return $a");
    assert_eq!(out.text(), "1");
    assert_eq!(interp.get_var("b").unwrap().text(), "111");
    assert_eq!(interp.get_var("c").unwrap().text(), "111");
}

#[test]
fn while_loop_counts_down() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "set x 10; set n 0; while {not [== $x 0]} { set x [+ $x -1]; set n [+ $n 1] }; return $n",
    );
    assert_eq!(out.text(), "10");
}

#[test]
fn int_lists_keep_their_parses() {
    let interp = Interpreter::new();
    eval_ok(&interp, "set intlist [int 0 1 2 3 4 5]");
    let tok = interp.get_var("intlist").unwrap();
    for (i, elem) in tok.as_list().iter().enumerate() {
        assert_eq!(elem.as_int().unwrap(), i as i64);
    }
}

#[test]
fn comparison_composition() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "not [eq [int 0] [int 1]]");
    assert!(out.as_bool().unwrap());
}

#[test]
fn break_carries_a_value_out_of_while() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "set b [while true {\n\
         \tset a [int 42]\n\
         \tbreak [int 69]\n\
         \tand this is okay, as long as we don't break parsing this can be anything\n\
         \tEscapes \\} work, too.\n\
         }]\n\
         return $b",
    );
    assert_eq!(out.as_int().unwrap(), 69);
    assert_eq!(interp.get_var("a").unwrap().as_int().unwrap(), 42);
}

#[test]
fn implicit_result_is_last_command() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "proc test {} {\n  int 42\n}\ntest");
    assert_eq!(out.as_int().unwrap(), 42);
}

#[test]
fn return_short_circuits_a_body() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "proc test {} {\n  return [int 42]\n  and all this other junk\n  never runs\n}\ntest",
    );
    assert_eq!(out.as_int().unwrap(), 42);
}

#[test]
fn arguments_keep_cached_parses() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "proc test {arg} {\n  return $arg\n}\ntest [int 42]");
    assert_eq!(out.as_int().unwrap(), 42);
}

#[test]
fn procedure_locals_do_not_leak() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "set a [int 42]\n\
         proc test {} { set a test; test2 }\n\
         proc test2 {} { set a test2; test3 }\n\
         proc test3 {} { set a test3 }\n\
         test\n\
         list $a",
    );
    assert_eq!(out.as_int().unwrap(), 42);
}

#[test]
fn single_character_parameters_bind_positionally() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "proc test {a b c d} {return $d}\ntest _ _ _ [int 42]");
    assert_eq!(out.as_int().unwrap(), 42);
}

#[test]
fn if_with_then_keyword() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "if {eq [int 42] 42} then {\n  false\n}");
    assert!(!out.as_bool().unwrap());
}

#[test]
fn print_family_output() {
    let (interp, sink) = interp_with_output();
    eval_ok(
        &interp,
        "print Hello       World\\n\nprint \"Hello  World\\n\"\nprintln {Hello     World\\n}",
    );
    assert_eq!(sink.contents(), "Hello World\nHello  World\nHello     World\\n\n");
}

#[test]
fn log_commands_tag_their_levels() {
    let (interp, out) = interp_with_output();
    let errs = common::Sink::default();
    interp.set_stderr(Box::new(errs.clone()));
    eval_ok(&interp, "log::info starting up; log::warn low disk");
    assert_eq!(out.contents(), "INFO starting up\n");
    assert_eq!(errs.contents(), "WARN low disk\n");
}

#[test]
fn unqualified_globals_stay_hidden_from_procedures() {
    let interp = Interpreter::new();
    let err = eval_err(&interp, "set ::g 42; proc p {} { return $g }; p");
    assert!(err.to_string().contains("no such variable g"));
    assert!(!err.is_signal());
}

#[test]
fn qualified_globals_are_reachable_from_procedures() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "set ::g 42; proc p {} { return $::g }; p");
    assert_eq!(out.text(), "42");
}

#[test]
fn catch_binds_result_and_error() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "catch { throw boom } r e; list $r $e");
    assert_eq!(out.text(), "{} boom");

    let out = eval_ok(
        &interp,
        "set fail [catch {list poopy} ret err]; list $fail $ret $err",
    );
    assert_eq!(out.text(), "false poopy {}");
}

#[test]
fn pipeline_threads_results() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "set s [pipeline { list 1 2 3; list::reverse $| }]; return $s");
    assert_eq!(out.text(), "3 2 1");
}

#[test]
fn unknown_hook_sees_the_original_name() {
    let interp = Interpreter::new();
    interp.register("", |_interp, args| {
        Ok(Token::new(format!("unknown:{}", args[0].text())))
    });
    let out = eval_ok(&interp, "nosuchcmd a b");
    assert_eq!(out.text(), "unknown:nosuchcmd");
}

#[test]
fn without_the_hook_missing_commands_error() {
    let interp = Interpreter::new();
    let err = eval_err(&interp, "definitely-not-a-command");
    assert!(err.to_string().contains("command not found"));
}

#[test]
fn host_panics_become_errors() {
    let interp = Interpreter::new();
    interp.register("explode", |_interp, _args| panic!("deliberate"));
    let err = eval_err(&interp, "explode");
    assert!(err.to_string().contains("internal fault"));
    // the interpreter is still usable
    assert_eq!(eval_ok(&interp, "set after ok").text(), "ok");
}

#[test]
fn errors_from_later_lines_name_the_line() {
    let interp = Interpreter::new();
    let err = eval_err(&interp, "set a 1\nthis-fails");
    assert!(err.to_string().contains("line 1"));
}

#[test]
fn stray_loop_signals_surface_to_the_host() {
    let interp = Interpreter::new();
    let err = eval_err(&interp, "break");
    assert!(err.is_signal());
    let err = eval_err(&interp, "tailcall 1");
    assert!(err.is_signal());
    // the interpreter recovered and keeps working
    assert_eq!(eval_ok(&interp, "set ok 1").text(), "1");
}

#[test]
fn max_call_depth_is_fatal_but_recoverable() {
    let interp = Interpreter::with_options(froe_core::InterpOptions { max_call_depth: 64 });
    eval_ok(&interp, "proc spin {} { spin }");
    let err = eval_err(&interp, "spin");
    assert!(matches!(err.root(), FroeError::MaxCallDepth));
    assert_eq!(eval_ok(&interp, "set ok 2").text(), "2");
}

#[test]
fn eval_joins_and_runs() {
    let interp = Interpreter::new();
    eval_ok(&interp, "eval set q 5");
    assert_eq!(interp.get_var("q").unwrap().text(), "5");
}

#[test]
fn subst_command_is_the_engine() {
    let interp = Interpreter::new();
    // braces survive one level of argument substitution, so the inner
    // braced form reaches subst literally
    let out = eval_ok(&interp, "set name froe; subst {{hello $name}}");
    assert_eq!(out.text(), "hello $name");
    let out = eval_ok(&interp, "set name froe; subst {hello $name}");
    assert_eq!(out.text(), "hello froe");
}
