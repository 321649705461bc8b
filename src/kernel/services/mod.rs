//! Services layer (ports + adapters).
//!
//! - `ports`: contracts/types the kernel consumes.
//! - `adapters`: runtime, network and disk implementations (IO/async).

pub mod adapters;
pub mod ports;
