//! Process-global runtime state
//!
//! Generated programs are single-threaded, but the exported functions take no
//! context argument, so the heap lives in a global. A `Mutex` keeps access
//! sound from Rust tests that run on several threads.

use fi_core::{DEFAULT_CAPACITY, Heap, RuntimeError, check_word_width};
use std::sync::Mutex;

pub struct TargetState {
    pub heap: Heap,
    pub tmp_counter: u64,
    pub label_counter: u64,
}

static STATE: Mutex<Option<TargetState>> = Mutex::new(None);

/// Print a fatal error and exit with status 1
pub fn die(message: &str) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

/// Unwrap a runtime result, dying on error
pub fn or_die<T>(result: Result<T, RuntimeError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => die(&e.to_string()),
    }
}

/// Run `f` against the initialized runtime state
pub fn with_state<R>(f: impl FnOnce(&mut TargetState) -> R) -> R {
    let mut guard = STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match guard.as_mut() {
        Some(state) => f(state),
        None => die("Runtime used before fi_runtime_init()."),
    }
}

/// Initialize (or reinitialize) the runtime
///
/// Checks the word width, allocates a fresh arena and loads the built-in class
/// table. User classes must be registered afterwards by the program's
/// initialization routine.
#[unsafe(no_mangle)]
pub extern "C" fn fi_runtime_init() {
    or_die(check_word_width());
    let state = TargetState {
        heap: Heap::with_capacity(DEFAULT_CAPACITY),
        tmp_counter: 0,
        label_counter: 0,
    };
    let mut guard = STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(state);
}
