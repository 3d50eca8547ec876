//! Risk management module
//!
//! Risk-budget position sizing: equity, risk percent and stop distance in,
//! share quantity and projected exposure out. Pure computation, no I/O.

mod sizing;
mod types;

pub use sizing::{size_position, PositionSizer};
pub use types::{NotSizable, RiskInput, SizingResult};
