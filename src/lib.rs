//! # querydiff
//!
//! Compares query-store statistics of a site against recorded baselines.
//! SQL text is fingerprinted (whitespace removed, SHA-256), both datasets are
//! inner-joined on the fingerprint and the matched pairs are rendered as JSON.

pub mod admin;
pub mod cli;
pub mod commands;
pub mod compare;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod fingerprint;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod sql;
pub mod stats;
pub mod warmup;
pub mod workspace;

pub use compare::{compare, compare_datasets, CompareOptions, ComparisonReport, ComparisonRow};
pub use dataset::{Dataset, StatVariant};
pub use error::{QuerydiffError, Result};
pub use fingerprint::{fingerprint, Fingerprint};
pub use pipeline::{Pipeline, Session, Stage};
pub use workspace::QuerydiffWorkspace;
