//! DynamoDB adapter and command-line front end for `count_core`.
//!
//! The binary resolves credentials and region through `aws-config`, waits for
//! the table, then runs a segmented count with one worker thread per segment.

pub mod adapters;
pub mod cli;
pub mod error;
pub mod logging;
pub mod output;
