//! Kubeguard core library.
//!
//! This crate exposes programmatic APIs for auditing Kubernetes manifests
//! against a security check catalog and rewriting them with the findings
//! fixed, while preserving comments and key order.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `audit`: Check execution across manifest files.
//! - `autofix`: Fix application plus comment-preserving merge back into files.
//! - `checks`: The security check catalog.
//! - `fix`: Per-finding remediations with structural preconditions.
//! - `yaml`: Comment-preserving YAML tree, parser, and emitter.
//! - `identity`: Sequence item identity rules used by the merge.
//! - `merge`: Three-way-ish merge of original and fixed documents.
//! - `manifest`: Document splitting and typed resource decoding.
//! - `models`: Data models for resources, findings, and summaries.
//! - `output`: Human/JSON printers for audit/autofix.
//! - `utils`: Supporting helpers.
//!
//! Note: All documentation comments are written in English by convention.
pub mod audit;
pub mod autofix;
pub mod checks;
pub mod cli;
pub mod config;
pub mod fix;
pub mod identity;
pub mod manifest;
pub mod merge;
pub mod models;
pub mod output;
pub mod utils;
pub mod yaml;
