//! Small shared helpers.

pub mod format;
pub mod fs;
