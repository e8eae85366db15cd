//! Error types and result aliases for Tally.
//!
//! Every crate in the workspace reports failures through [`TallyError`].

mod error;

pub use error::{TallyError, TallyResult};
