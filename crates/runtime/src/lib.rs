//! fi Runtime: support library for generated programs
//!
//! The fi compiler emits C that stores every value in a `long` and calls into
//! this library to build, inspect and match tagged values. This crate is the
//! target-side instantiation of `fi-core`: it owns one process-global `Heap`
//! that is unrelated to the heap the compiler used while generating code.
//!
//! A generated program must call `fi_runtime_init()` and then the emitted
//! initialization routine before running any generated function. The C
//! declarations live in `include/fi_runtime.h`.
//!
//! Every failure is fatal: the message is printed to stderr as
//! `Error: <message>` and the process exits with status 1.

pub mod prims;
pub mod state;
pub mod string_ops;
pub mod tuple_ops;

/// C declarations for everything exported here
pub const RUNTIME_HEADER: &str = include_str!("../include/fi_runtime.h");

// Re-export the C entry points under Rust-friendly names
pub use prims::{
    fi_is_prim as is_prim, fi_prim_cons as prim_cons, fi_prim_die as prim_die,
    fi_prim_fetch as prim_fetch, fi_prim_genLabel as prim_gen_label,
    fi_prim_genTmp as prim_gen_tmp,
};
pub use state::fi_runtime_init as runtime_init;
pub use string_ops::{
    fi_fixnum_value as fixnum_value, fi_make_number as make_number,
    fi_make_string as make_string, fi_string_length as string_length,
    fi_string_value as string_value,
};
pub use tuple_ops::{
    fi_class as class, fi_make_tuple0 as make_tuple0, fi_make_tuple1 as make_tuple1,
    fi_make_tuple2 as make_tuple2, fi_make_tuple3 as make_tuple3, fi_make_tuple4 as make_tuple4,
    fi_match_failure as match_failure, fi_register_arity as register_arity,
};
