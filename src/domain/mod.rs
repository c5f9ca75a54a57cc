//! Domain layer - codec and address rules with no I/O

pub mod abi;
pub mod address;
