//! ZIM client library
//!
//! This library provides the core functionality for the `zim` CLI tool.

pub mod commands;
pub mod records;

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Print the archive header
    Header {
        /// Archive file to read
        filename: PathBuf,
    },

    /// Stream all directory entry metadata to stdout
    Entries {
        /// Archive file to read
        filename: PathBuf,
    },

    /// Read one directory entry by index, with its content
    Entry {
        /// Entry index in the URL pointer table
        index: u32,

        /// Archive file to read
        filename: PathBuf,
    },

    /// Stream all cluster pointer records to stdout
    Clusters {
        /// Archive file to read
        filename: PathBuf,
    },

    /// Read one cluster by index, with its blobs
    Cluster {
        /// Cluster index in the cluster pointer table
        index: u32,

        /// Archive file to read
        filename: PathBuf,
    },

    /// Stream all entry metadata and content to stdout
    Stream {
        /// Archive file to read
        filename: PathBuf,
    },

    /// Write every content entry to files under a directory
    Extract {
        /// Directory to write extracted entries into
        output_dir: PathBuf,

        /// Archive file to read
        filename: PathBuf,
    },
}

pub use commands::handle;
