//! Drive the runtime the way emitted code does: init, register user
//! classes, build values, then dispatch on their class.

use fi_core::{Builtin, USER_CLASS_MIN};
use fi_runtime::*;
use serial_test::serial;
use std::ffi::CStr;
use std::process::{Command, Output};

const CLASS_PAIR: u16 = USER_CLASS_MIN;
const CLASS_LEAF: u16 = USER_CLASS_MIN + 1;

/// Set in a child process rerunning a single test that is expected to exit
const EXIT_CHILD_ENV: &str = "FI_RUNTIME_EXIT_CHILD";

fn in_exit_child() -> bool {
    std::env::var_os(EXIT_CHILD_ENV).is_some()
}

/// Rerun the test named `test` alone in a child process
fn run_in_child(test: &str) -> Output {
    Command::new(std::env::current_exe().unwrap())
        .args([test, "--exact", "--nocapture", "--test-threads=1"])
        .env(EXIT_CHILD_ENV, "1")
        .output()
        .unwrap()
}

/// Exit status 1 with `expected` as a whole stderr line
fn assert_died_with(output: &Output, expected: &str) {
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr);
    assert!(stderr.lines().any(|line| line == expected), "stderr: {}", stderr);
}

fn program_init() {
    register_arity(CLASS_PAIR, 2);
    register_arity(CLASS_LEAF, 0);
}

/// Equivalent of a generated `swap` that matches on Pair
fn swap(p: i64) -> i64 {
    match class(p) {
        CLASS_PAIR => {
            let a = prim_fetch(p, make_number(0));
            let b = prim_fetch(p, make_number(1));
            make_tuple2(CLASS_PAIR, b, a)
        }
        _ => p,
    }
}

#[test]
#[serial]
fn test_construct_and_match_user_class() {
    runtime_init();
    program_init();

    let p = make_tuple2(CLASS_PAIR, make_number(1), make_number(2));
    let q = swap(p);
    assert_eq!(class(q), CLASS_PAIR);
    assert_eq!(fixnum_value(prim_fetch(q, make_number(0))), 2);
    assert_eq!(fixnum_value(prim_fetch(q, make_number(1))), 1);

    let leaf = make_tuple0(CLASS_LEAF);
    assert_eq!(class(leaf), CLASS_LEAF);
    assert_eq!(swap(leaf), leaf);
}

#[test]
#[serial]
fn test_registering_same_arity_twice_is_harmless() {
    runtime_init();
    program_init();
    program_init();
    let p = make_tuple2(CLASS_PAIR, make_number(3), make_number(4));
    assert_eq!(class(p), CLASS_PAIR);
}

#[test]
#[serial]
fn test_lists_through_primitives() {
    runtime_init();
    let nil = make_tuple0(Builtin::Nil.tag());
    let list = prim_cons(make_number(1), prim_cons(make_number(2), nil));

    let mut values = Vec::new();
    let mut cursor = list;
    while class(cursor) == Builtin::Cons.tag() {
        values.push(fixnum_value(prim_fetch(cursor, make_number(0))));
        cursor = prim_fetch(cursor, make_number(1));
    }
    assert_eq!(values, vec![1, 2]);
    assert_eq!(class(cursor), Builtin::Nil.tag());
}

#[test]
#[serial]
fn test_strings_and_identifiers() {
    runtime_init();
    let s = unsafe { make_string(c"label".as_ptr()) };
    assert_eq!(string_length(s), 5);
    assert_eq!(unsafe { CStr::from_ptr(string_value(s)) }, c"label");

    let id = make_tuple1(Builtin::Id.tag(), s);
    assert_eq!(class(id), Builtin::Id.tag());
    assert_eq!(prim_fetch(id, make_number(0)), s);

    let tmp = prim_gen_tmp();
    let name = prim_fetch(tmp, make_number(0));
    assert_eq!(unsafe { CStr::from_ptr(string_value(name)) }, c"x0");

    let label = prim_gen_label();
    let name = prim_fetch(label, make_number(0));
    assert_eq!(unsafe { CStr::from_ptr(string_value(name)) }, c"L0");
}

#[test]
fn test_primitive_names() {
    assert_eq!(unsafe { is_prim(c"genTmp".as_ptr()) }, 1);
    assert_eq!(unsafe { is_prim(c"swap".as_ptr()) }, 0);
}

#[test]
fn test_match_failure_exits_with_message() {
    if in_exit_child() {
        runtime_init();
        let nil = make_tuple0(Builtin::Nil.tag());
        match_failure(42, class(nil));
    }
    let output = run_in_child("test_match_failure_exits_with_message");
    let expected = format!("Error: Match failure. Line: 42. Class: {}", Builtin::Nil.tag());
    assert_died_with(&output, &expected);
}

#[test]
fn test_die_exits_with_message() {
    if in_exit_child() {
        runtime_init();
        let message = unsafe { make_string(c"boom".as_ptr()) };
        prim_die(message);
        panic!("fi_prim_die returned");
    }
    let output = run_in_child("test_die_exits_with_message");
    assert_died_with(&output, "Error: boom");
}
