//! Admission control logic and state management.

mod limiter;
mod sweeper;

pub use limiter::{Limiter, Verdict};
