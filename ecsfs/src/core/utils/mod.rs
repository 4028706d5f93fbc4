// SPDX-License-Identifier: MIT

pub mod bitmap;
pub mod name_utils;

pub use bitmap::{Bitmap, BitmapOps};
