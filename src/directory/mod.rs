//! Enrichment of user profiles from an external people directory.

pub mod client;
pub mod refresher;

pub use client::{DirectoryClient, HttpDirectory};
