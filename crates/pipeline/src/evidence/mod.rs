//! Turning relation fields into evidence text.

pub mod relation;
pub mod truncate;
