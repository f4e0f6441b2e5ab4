//! Debounce primitives for noisy per-frame labels.

pub mod ring_buffer;

pub use ring_buffer::RingBuffer;
