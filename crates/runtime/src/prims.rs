//! Primitive operations
//!
//! The compiler emits calls to a primitive `p` as `fi_prim_p(...)`. The set of
//! names is fixed by `fi_core::PRIMITIVES`.

#![allow(non_snake_case)]

use crate::state::{die, or_die, with_state};
use fi_core::Word;
use std::ffi::{CStr, c_char, c_int};

/// Fetch field `k` (a fixnum) of tuple `m`
#[unsafe(no_mangle)]
pub extern "C" fn fi_prim_fetch(m: i64, k: i64) -> i64 {
    let index = Word::from_raw(k).as_fixnum();
    let Ok(index) = usize::try_from(index) else {
        die(&format!("Fetching slot {} that does not exist.", index));
    };
    with_state(|state| or_die(state.heap.field(Word::from_raw(m), index))).raw()
}

#[unsafe(no_mangle)]
pub extern "C" fn fi_prim_cons(a: i64, d: i64) -> i64 {
    with_state(|state| or_die(state.heap.cons(Word::from_raw(a), Word::from_raw(d)))).raw()
}

/// Abort with the message held in string `e`
#[unsafe(no_mangle)]
pub extern "C" fn fi_prim_die(e: i64) -> i64 {
    let word = Word::from_raw(e);
    let message = with_state(|state| {
        state
            .heap
            .string_bytes(word)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    });
    match message {
        Ok(message) => die(&message),
        Err(e) => die(&e.to_string()),
    }
}

fn fresh_id(prefix: &str, next: impl FnOnce(&mut crate::state::TargetState) -> u64) -> i64 {
    with_state(|state| {
        let n = next(state);
        let name = format!("{}{}", prefix, n);
        or_die(state.heap.make_id(name.as_bytes()))
    })
    .raw()
}

/// Fresh temporary identifier `x<N>`
#[unsafe(no_mangle)]
pub extern "C" fn fi_prim_genTmp() -> i64 {
    fresh_id("x", |state| {
        state.tmp_counter += 1;
        state.tmp_counter - 1
    })
}

/// Fresh label identifier `L<N>`
#[unsafe(no_mangle)]
pub extern "C" fn fi_prim_genLabel() -> i64 {
    fresh_id("L", |state| {
        state.label_counter += 1;
        state.label_counter - 1
    })
}

/// 1 if `name` is a primitive, 0 otherwise
///
/// # Safety
/// `name` must point to a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fi_is_prim(name: *const c_char) -> c_int {
    if name.is_null() {
        return 0;
    }
    let name = unsafe { CStr::from_ptr(name) };
    match name.to_str() {
        Ok(name) if fi_core::is_primitive(name) => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fi_runtime_init;
    use crate::string_ops::fi_make_number;
    use serial_test::serial;

    fn id_name(id: i64) -> String {
        with_state(|state| {
            String::from_utf8(state.heap.id_name(Word::from_raw(id)).unwrap().to_vec()).unwrap()
        })
    }

    #[test]
    #[serial]
    fn test_fetch_and_cons() {
        fi_runtime_init();
        let list = fi_prim_cons(fi_make_number(4), fi_make_number(5));
        assert_eq!(fi_prim_fetch(list, fi_make_number(0)), fi_make_number(4));
        assert_eq!(fi_prim_fetch(list, fi_make_number(1)), fi_make_number(5));
    }

    #[test]
    #[serial]
    fn test_fresh_names_count_independently() {
        fi_runtime_init();
        assert_eq!(id_name(fi_prim_genTmp()), "x0");
        assert_eq!(id_name(fi_prim_genTmp()), "x1");
        assert_eq!(id_name(fi_prim_genLabel()), "L0");
        assert_eq!(id_name(fi_prim_genTmp()), "x2");
        assert_eq!(id_name(fi_prim_genLabel()), "L1");
    }

    #[test]
    fn test_is_prim() {
        for name in [c"fetch", c"cons", c"die", c"genTmp", c"genLabel"] {
            assert_eq!(unsafe { fi_is_prim(name.as_ptr()) }, 1);
        }
        assert_eq!(unsafe { fi_is_prim(c"car".as_ptr()) }, 0);
        assert_eq!(unsafe { fi_is_prim(std::ptr::null()) }, 0);
    }
}
