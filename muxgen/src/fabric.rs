//! The multiplexing fabric: endpoint port allocation and per-channel routing logic.

mod channel;
mod ports;

pub use channel::*;
pub use ports::*;
