//! Library side of the `etl-clean` binary: logging setup and the
//! folder-level cleaning workflow.

pub mod logging;
pub mod pipeline;
