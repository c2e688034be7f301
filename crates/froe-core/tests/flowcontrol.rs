//! Loop constructs and the control-flow signal protocol.

mod common;

use common::{eval_err, eval_ok};
use froe_core::Interpreter;

#[test]
fn while_with_continue_counts_every_other_pass() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "set a 10\n\
         set b [false]\n\
         set c 0\n\
         while {not [== $a 0]} {\n\
         \tset a [+ $a -1]\n\
         \tif $b {set b [false]; continue}\n\
         \tset b [true]\n\
         \tset c [+ $c 1]\n\
         }\n\
         return $c",
    );
    assert_eq!(out.text(), "5");
}

#[test]
fn for_loop_accumulates() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "set total 0; for {set i 0} {lt $i 4} {set i [+ $i 1]} { set total [+ $total $i] }; return $total",
    );
    assert_eq!(out.text(), "6");
}

#[test]
fn for_continue_still_steps() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "set total 0\n\
         for {set i 0} {lt $i 5} {set i [+ $i 1]} {\n\
         \tif {eq $i 2} {continue}\n\
         \tset total [+ $total $i]\n\
         }\n\
         return $total",
    );
    assert_eq!(out.text(), "8");
}

#[test]
fn foreach_binds_each_element() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "set acc {}; foreach x {a b c} { set acc [list::append $acc $x] }; return $acc",
    );
    assert_eq!(out.text(), "a b c");
}

#[test]
fn foreach_break_returns_its_value() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "foreach x {1 2 3} { if {eq $x 2} { break found } }");
    assert_eq!(out.text(), "found");
}

#[test]
fn do_runs_at_least_once() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "set n 0; do { set n [+ $n 1] }; return $n");
    assert_eq!(out.text(), "1");
    let out = eval_ok(&interp, "set n 0; do { set n [+ $n 1] } while {lt $n 3}; return $n");
    assert_eq!(out.text(), "3");
    let out = eval_ok(&interp, "set n 0; do { set n [+ $n 1] } until {eq $n 2}; return $n");
    assert_eq!(out.text(), "2");
}

#[test]
fn signals_pass_straight_through_catch() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "proc f {} { catch { return inner }; return outer }; f");
    assert_eq!(out.text(), "inner");

    let out = eval_ok(
        &interp,
        "set hits 0\n\
         while {lt $hits 3} {\n\
         \tcatch { set hits [+ $hits 1]; continue } r e\n\
         \tset never reached\n\
         }\n\
         return $hits",
    );
    assert_eq!(out.text(), "3");
    assert!(interp.get_var("never").is_err());
}

#[test]
fn catch_intercepts_value_errors_only() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "catch { no-such-command } r e; return $e");
    assert!(out.text().contains("command not found"));
}

#[test]
fn pipeline_break_stops_quietly() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "pipeline { list 1 2 3; break stop; this-would-fail }",
    );
    assert_eq!(out.text(), "stop");
}

#[test]
fn pipeline_result_variable_and_cleanup() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "-> final { list a b; len $| }");
    assert_eq!(out.text(), "2");
    assert_eq!(interp.get_var("final").unwrap().text(), "2");
    // the | binding is removed once the pipeline ends
    assert!(interp.get_var("|").is_err());
}

#[test]
fn tailcall_does_not_grow_the_stack() {
    let interp = Interpreter::with_options(froe_core::InterpOptions { max_call_depth: 64 });
    let out = eval_ok(
        &interp,
        "proc count {n} { if {eq $n 0} {return done}; tailcall [+ $n -1] }\ncount 5000",
    );
    assert_eq!(out.text(), "done");
}

#[test]
fn tailcall_fibonacci() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "proc fibtc {n a b} { if {eq $n 0} {return $b}; tailcall [+ $n -1] [+ $a $b] $a }\n\
         fibtc 10 1 1",
    );
    assert_eq!(out.text(), "89");
}

#[test]
fn plain_recursion_is_depth_limited() {
    let interp = Interpreter::with_options(froe_core::InterpOptions { max_call_depth: 64 });
    eval_ok(&interp, "proc down {n} { if {eq $n 0} {return 0}; down [+ $n -1] }");
    // shallow is fine
    assert_eq!(eval_ok(&interp, "down 3").text(), "0");
    // deep blows the guard
    let err = eval_err(&interp, "down 5000");
    assert!(err.to_string().contains("max call depth"));
}

#[test]
fn throw_matches_by_text() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "catch { throw my-error } r e\n\
         if {eq $e my-error} { return matched } else { return $e }",
    );
    assert_eq!(out.text(), "matched");
}
