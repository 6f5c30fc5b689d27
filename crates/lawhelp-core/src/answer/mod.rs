//! Answer engine port.
//!
//! The engine is a black box: question text in, answer text out. It may fail
//! or hang; callers bound it with [`engine::generate_with_timeout`].

pub mod engine;
