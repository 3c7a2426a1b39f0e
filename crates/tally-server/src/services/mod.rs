//! Built-in text services.

pub mod counter;
pub mod sys;

pub use counter::{CounterOp, CounterService};
pub use sys::SysService;
