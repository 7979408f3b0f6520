//! Fixnum and string conversions for generated code
//!
//! Strings are copied into the arena on creation. `fi_string_value` hands out
//! a pointer into the arena; it stays valid until the process exits (or the
//! runtime is reinitialized).

use crate::state::{die, or_die, with_state};
use fi_core::Word;
use std::ffi::{CStr, c_char};

#[unsafe(no_mangle)]
pub extern "C" fn fi_make_number(n: i64) -> i64 {
    Word::fixnum(n).raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn fi_fixnum_value(n: i64) -> i64 {
    Word::from_raw(n).as_fixnum()
}

/// Copy a NUL-terminated C string into the arena
///
/// # Safety
/// `s` must point to a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fi_make_string(s: *const c_char) -> i64 {
    if s.is_null() {
        die("fi_make_string: null string");
    }
    let bytes = unsafe { CStr::from_ptr(s) }.to_bytes();
    with_state(|state| or_die(state.heap.make_string(bytes))).raw()
}

/// Pointer to the NUL-terminated contents of a string value
#[unsafe(no_mangle)]
pub extern "C" fn fi_string_value(s: i64) -> *const c_char {
    with_state(|state| or_die(state.heap.string_ptr(Word::from_raw(s)))) as *const c_char
}

/// Byte length recorded in a string's length field
#[unsafe(no_mangle)]
pub extern "C" fn fi_string_length(s: i64) -> i64 {
    with_state(|state| or_die(state.heap.string_len(Word::from_raw(s)))) as i64
}
