//! Bulk SMS dispatch for the Krishi portal.
//!
//! [`Dispatcher`] normalizes recipient numbers to one country-code
//! convention, sends them sequentially with a fixed inter-message delay,
//! and collects a per-recipient outcome for each. Without a configured
//! provider it runs in simulated mode: every readable recipient is
//! reported as a success and no network I/O happens.
//!
//! # Quick start
//!
//! ```
//! use krishi_sms::normalize_number;
//!
//! assert_eq!(
//!   normalize_number("98123 45678", "+91").as_deref(),
//!   Some("+919812345678"),
//! );
//! ```

mod dispatch;
mod normalize;

pub use dispatch::{BulkReport, Dispatcher, SendOutcome, SendStatus, SmsConfig};
pub use normalize::normalize_number;
