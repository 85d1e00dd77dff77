//! Output generation.
//!
//! - [`json`]: the `{"articles": [...]}` document, printed or written under
//!   a date/edition directory layout

pub mod json;
