#![doc = include_str!("../README.md")]

mod device;
mod error;
mod extract;
mod fallback;
mod global;
mod hash;
mod mutex;
mod os;
mod seed;
mod shared;
mod source;
mod time;
mod word;


pub use crate::device::*;
pub use crate::error::*;
pub use crate::extract::*;
pub use crate::fallback::*;
pub use crate::global::*;
pub use crate::hash::*;
pub use crate::os::*;
pub use crate::seed::*;
pub use crate::shared::*;
pub use crate::source::*;
pub use crate::time::*;
pub use crate::word::*;
