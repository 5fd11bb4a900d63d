//! Task and peripheral helpers.

pub mod task_pin;
