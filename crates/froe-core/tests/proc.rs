//! Procedure definition: naming, registration scope, anonymous procedures,
//! macros, and prototype-driven binding.

mod common;

use common::{eval_err, eval_ok};
use froe_core::Interpreter;

#[test]
fn anonymous_procs_are_callable_by_token_only() {
    let interp = Interpreter::new();
    eval_ok(&interp, "set f [proc {x} {return x${x}x}]");
    let out = eval_ok(&interp, "$f hello");
    assert_eq!(out.text(), "xhellox");
    // the minted display name is not registered as a command
    let name = interp.get_var("f").unwrap().text().to_string();
    let err = eval_err(&interp, &name);
    assert!(err.to_string().contains("command not found"));
}

#[test]
fn anonymous_display_names_are_minted() {
    let interp = Interpreter::new();
    let first = eval_ok(&interp, "proc {x} {return $x}");
    let second = eval_ok(&interp, "proc _ {x} {return $x}");
    assert!(first.text().starts_with("proc#"));
    assert!(second.text().starts_with("proc#"));
    assert_ne!(first.text(), second.text());
}

#[test]
fn named_procs_at_the_top_level_are_global() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "proc echo {x} {return $x}");
    assert_eq!(out.text(), "::echo");
    assert_eq!(eval_ok(&interp, "echo hi").text(), "hi");
    assert_eq!(eval_ok(&interp, "::echo bye").text(), "bye");
}

#[test]
fn procs_defined_inside_a_body_are_frame_local() {
    let interp = Interpreter::new();
    eval_ok(
        &interp,
        "namespace ns {\n\
         \tproc p1 {} {\n\
         \t\tproc p2 {} { return ok }\n\
         \t\treturn [p2]\n\
         \t}\n\
         }",
    );
    assert_eq!(eval_ok(&interp, "::ns::p1").text(), "ok");
    let err = eval_err(&interp, "::ns::p2");
    assert!(err.to_string().contains("command not found"));
}

#[test]
fn qualified_names_define_into_their_namespace() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "proc ::math::dbl {x} { return $x$x }");
    assert_eq!(out.text(), "::math::dbl");
    assert_eq!(eval_ok(&interp, "::math::dbl a").text(), "aa");
    let err = eval_err(&interp, "dbl a");
    assert!(err.to_string().contains("command not found"));
}

#[test]
fn binding_failures_name_the_missing_argument() {
    let interp = Interpreter::new();
    eval_ok(&interp, "proc needs2 {x y} { return ok }");
    let err = eval_err(&interp, "needs2 1");
    assert!(err.to_string().contains("missing required arg"));
}

#[test]
fn prototypes_support_defaults_and_flags() {
    let interp = Interpreter::new();
    eval_ok(
        &interp,
        "proc greet {{-greeting hello} name} { return \"$greeting $name\" }",
    );
    assert_eq!(eval_ok(&interp, "greet world").text(), "hello world");
    assert_eq!(eval_ok(&interp, "greet -greeting hey world").text(), "hey world");
    // lazy prefix matching completes unambiguous flags
    assert_eq!(eval_ok(&interp, "greet -gr yo world").text(), "yo world");
}

#[test]
fn variadic_tail_collects_extras() {
    let interp = Interpreter::new();
    eval_ok(&interp, "proc tail {first args} { return [list $first $args] }");
    assert_eq!(eval_ok(&interp, "tail a b c d").text(), "a {b c d}");
}

#[test]
fn proc_result_token_is_immediately_invocable() {
    let interp = Interpreter::new();
    let out = eval_ok(&interp, "[proc {x} {return $x$x}] ab");
    assert_eq!(out.text(), "abab");
}

#[test]
fn two_element_lists_compile_to_procedures() {
    let interp = Interpreter::new();
    // a host command turns a plain {proto body} list into a callback
    interp.register("apply", |interp, args| {
        let p = args[1].as_procedure(interp)?;
        let mut call = vec![args[1].clone()];
        call.extend_from_slice(&args[2..]);
        p.call(interp, &call)
    });
    eval_ok(&interp, "set f {{x} {return <$x>}}");
    let out = eval_ok(&interp, "apply $f q");
    assert_eq!(out.text(), "<q>");
    // once compiled, the token's cache makes it directly invocable
    let out = eval_ok(&interp, "$f z");
    assert_eq!(out.text(), "<z>");
}

#[test]
fn recursive_procedures_see_only_their_own_arguments() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "proc fact n { if {eq $n 0} {return 1}; return [+ [fact [+ $n -1]] 0] }\nfact 0",
    );
    assert_eq!(out.text(), "1");
    let out = eval_ok(&interp, "fact 3");
    assert_eq!(out.text(), "1");
}

#[test]
fn macros_run_in_the_callers_frame() {
    let interp = Interpreter::new();
    let out = eval_ok(
        &interp,
        "macro bump {set n [+ $n 1]}\n\
         set n 3\n\
         bump\n\
         bump\n\
         return $n",
    );
    assert_eq!(out.text(), "5");

    // inside a procedure the macro touches that procedure's locals
    let out = eval_ok(
        &interp,
        "proc p {} { set n 10; bump; return $n }\np",
    );
    assert_eq!(out.text(), "11");
    assert_eq!(interp.get_var("n").unwrap().text(), "5");
}

#[test]
fn coerced_parameters_validate_at_bind_time() {
    let interp = Interpreter::new();
    eval_ok(&interp, "proc add {{a {} int} {b {} int}} { return [+ $a $b] }");
    assert_eq!(eval_ok(&interp, "add 2 3").text(), "5");
    let err = eval_err(&interp, "add 2 nope");
    assert!(err.to_string().contains("arg b"));
}

#[test]
fn tuple_coercion_enumerates_choices() {
    let interp = Interpreter::new();
    eval_ok(
        &interp,
        "proc gear {{dir {} {tuple {up down}}}} { return $dir }",
    );
    assert_eq!(eval_ok(&interp, "gear up").text(), "up");
    let err = eval_err(&interp, "gear sideways");
    assert!(err.to_string().contains("is not one of"));
    assert!(err.to_string().contains("up | down"));
}
