//! Core ingestion logic - independent of the command line front end.
//!
//! Bottom up: [`fetch`] and [`archive`] place source files on disk, [`normalize`] and
//! [`records`] turn their lines into typed records, [`loader`] writes them to the
//! database and [`pipeline`] runs the data sets in order while [`settings`] tracks the
//! install status.

pub mod archive;
pub mod catalog;
pub mod context;
pub mod datasets;
pub mod fetch;
pub mod loader;
pub mod log;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod seed;
pub mod settings;
pub mod status;
