pub mod buffer;
pub mod filter;
