#![doc = include_str!("../README.md")]

mod callbacks;
mod core;
mod symbols;

pub mod raw;

pub use crate::callbacks::CallbackSet;
pub use crate::core::{Core, CoreLoadError, GameInfo, SerializeError, SystemInfo};
pub use crate::symbols::CoreSymbols;

#[cfg(test)]
mod tests;
