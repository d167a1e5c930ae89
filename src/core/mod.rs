// ABI negotiation, library loading, boundary buffers and the generic lifecycle.
pub mod abi;
pub mod buffer;
pub mod completion;
pub mod error;
pub mod library;
pub mod lifecycle;
pub mod status;
pub mod symbols;
