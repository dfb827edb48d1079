//! Library side of the `rowport` binary.

pub mod logging;
pub mod pipeline;
