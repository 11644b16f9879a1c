#![allow(dead_code)]

pub use kristy_test_utils::{builders, fakes, init_tracing, with_timeout};

use kristy::report::SCAFFOLD_LEN;

/// Report limit leaving exactly `room` bytes for the two streams.
pub fn limit_with_room(room: usize) -> usize {
    SCAFFOLD_LEN + room
}
