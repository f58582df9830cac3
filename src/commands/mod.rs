//! # CLI Command Implementations
//!
//! One module per subcommand. Each defines an `Args` struct derived with
//! `clap` and an `execute` function that validates inputs, calls into the
//! `archive_override` library and reports the result.
//!
//! Input files are checked before any per-item work starts, so a bad path
//! fails fast with a non-zero exit.

pub mod notes;
pub mod package;
pub mod scan;
