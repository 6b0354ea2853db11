//! Defensive scalar normalizers shared by every extraction stage.
//!
//! Nothing in this module returns an error: bad input degrades to `0` or to
//! an explicit "no date" absence marker, and the caller decides whether that
//! is worth a diagnostic.

pub mod dates;
pub mod numeric;
pub mod patterns;

pub use dates::{date_from_serial, normalize_date};
pub use numeric::{normalize_number, parse_decimal, parse_quantity};
