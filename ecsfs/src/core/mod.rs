// SPDX-License-Identifier: MIT

// === Sub-modules ===
pub mod checker;
pub mod cursor;
pub mod errors;
pub mod fat;
pub mod formatter;
mod macros;
pub mod meta;
pub mod utils;

// === Core Traits ===
pub mod traits {
    pub use super::checker::FsChecker;
    pub use super::cursor::FatTable;
    pub use super::formatter::FsFormatter;
    pub use super::meta::FsMeta;
}

// === Error types ===
pub use errors::*;
