//! E-Paper Panel Specifications
//!
//! Static descriptors for the bistable panels the backup station can drive:
//! physical geometry in the controller's native gate orientation, refresh
//! timing, and how fast partial refreshes accumulate ghosting.
//!
//! # Example
//!
//! ```
//! use eink_specs::displays::WAVESHARE_2_13_V4;
//!
//! let spec = &WAVESHARE_2_13_V4;
//! assert_eq!((spec.width, spec.height), (122, 250));
//! assert_eq!(spec.bytes_per_row(), 16);
//! assert_eq!(spec.buffer_len(), 4000);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

mod display_spec;
pub mod displays;

pub use display_spec::{Controller, DisplaySpec};
