//! Miscellaneous support code shared by the `xforge` orchestrator: recursive
//! path mirroring (the in-process stand-in for the original's `rsync -a`
//! calls) and a streamed subprocess runner that reads a child's stdout and
//! stderr concurrently without buffering more than one line on either pipe.

pub mod paths;
pub mod process_builder;

pub use process_builder::ProcessBuilder;
