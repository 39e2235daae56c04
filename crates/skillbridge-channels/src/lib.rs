//! # skillbridge-channels
//!
//! The channel side of a conversation. Activities a skill sends back, and
//! the bridge's own trace notes, are delivered through the [`Channel`] trait.
//!
//! ## Provided channels
//!
//! | Channel            | Use                                                    |
//! |--------------------|--------------------------------------------------------|
//! | [`BufferedChannel`] | Hands activities to an `mpsc` receiver owned by a host |
//! | [`MemoryChannel`]   | Records everything; tests and local tooling           |

pub mod adapter;
pub mod buffered;
pub mod memory;

pub use adapter::Channel;
pub use buffered::{BufferedChannel, Outgoing};
pub use memory::MemoryChannel;
