//! Spam report parsing: line decoding, header classification, wrapper
//! scanning and extraction of the embedded original.

pub mod decode;
pub mod header;
pub mod original;
pub mod reader;
pub mod wrapper;
