//! Bearer credential verification port.

pub mod verifier;
