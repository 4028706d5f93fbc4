// SPDX-License-Identifier: MIT

pub mod log;
pub mod string;

pub use self::log::{LogLevel, log_level};
