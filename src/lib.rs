//! # sftpsweep
//!
//! Deletes aged files from a remote directory tree over SFTP, then removes
//! the directories that were emptied along the way.
//!
//! - **Depth-first, post-order**: a directory goes only after everything
//!   below it went, and it is removed by its parent's level
//! - **Exclusions**: entries whose name matches a pattern are skipped
//!   entirely and pin their parent directory
//! - **List only**: a dry run reports exactly what a real run would delete
//! - **Pluggable remote**: the walk runs against any [`remote::RemoteFs`]

pub mod cli;
pub mod common;
pub mod pruner;
pub mod remote;
