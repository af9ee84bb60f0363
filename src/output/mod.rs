//! Line-oriented result stream.
//!
//! Every duplicate set is reported as a block:
//!
//! ```text
//! [3 files | 17 B | 5c0ae1f4d1a2b3c4]
//!   keep: a/1.bin
//!   delete: a/2.bin
//!   delete: b/3.bin
//!   deleted: a/2.bin
//!   deleted: b/3.bin
//! ```
//!
//! followed by a final `<removed> removed / <candidates> candidates` line.
//! Blocks are emitted atomically so concurrent workers never interleave
//! lines of different sets.

pub mod text;

pub use text::{Reporter, SetBlock, SharedBuffer};
