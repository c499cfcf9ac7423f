//! Fixed-Capacity Ring Buffer
//!
//! Bounded, oldest-evicting history used for per-session sample storage.
//! The detection pipeline is single-threaded per session (one frame is fully
//! processed before the next is pulled), so the buffer is a plain owned
//! structure with `&mut self` writes; wrap it yourself if you need sharing.

mod buffer;

pub use buffer::RingBuffer;
