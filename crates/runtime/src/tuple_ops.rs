//! Class tags, tuple construction and match failure
//!
//! Generated code dispatches with `switch (fi_class(x))` and builds values
//! through the fixed-arity `fi_make_tupleN` constructors. Each constructor
//! checks `N` against the arity registered for the class.

use crate::state::{die, or_die, with_state};
use fi_core::{RuntimeError, Tag, Word};
use std::ffi::{c_int, c_ushort};

/// Class tag of a value (its low 16 bits)
#[unsafe(no_mangle)]
pub extern "C" fn fi_class(x: i64) -> c_ushort {
    Word::from_raw(x).tag()
}

/// Record the arity of a user class
///
/// Called by the emitted initialization routine, once per constructor.
#[unsafe(no_mangle)]
pub extern "C" fn fi_register_arity(class: c_ushort, arity: c_int) {
    let Ok(arity) = u8::try_from(arity) else {
        die(&format!("Invalid arity {} for class {}.", arity, class));
    };
    with_state(|state| or_die(state.heap.register_arity(class, arity)));
}

fn make_tuple(class: Tag, fields: &[i64]) -> i64 {
    let fields: Vec<Word> = fields.iter().map(|f| Word::from_raw(*f)).collect();
    with_state(|state| or_die(state.heap.make_tuple(class, &fields))).raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn fi_make_tuple0(class: c_ushort) -> i64 {
    make_tuple(class, &[])
}

#[unsafe(no_mangle)]
pub extern "C" fn fi_make_tuple1(class: c_ushort, a: i64) -> i64 {
    make_tuple(class, &[a])
}

#[unsafe(no_mangle)]
pub extern "C" fn fi_make_tuple2(class: c_ushort, a: i64, b: i64) -> i64 {
    make_tuple(class, &[a, b])
}

#[unsafe(no_mangle)]
pub extern "C" fn fi_make_tuple3(class: c_ushort, a: i64, b: i64, c: i64) -> i64 {
    make_tuple(class, &[a, b, c])
}

#[unsafe(no_mangle)]
pub extern "C" fn fi_make_tuple4(class: c_ushort, a: i64, b: i64, c: i64, d: i64) -> i64 {
    make_tuple(class, &[a, b, c, d])
}

/// Abort after a match with no applicable clause
///
/// `line` is the line of the `match` in the fi input; `class` is the tag of
/// the value that fell through.
#[unsafe(no_mangle)]
pub extern "C" fn fi_match_failure(line: c_int, class: c_ushort) -> ! {
    let error = RuntimeError::MatchFailure {
        line: line.max(0) as u32,
        tag: class,
    };
    die(&error.to_string())
}
