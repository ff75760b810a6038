//! feedup - tag-aware package reference updater library
//!
//! This library provides the core functionality for keeping NuGet-style
//! package references current:
//! - Discovery of references in project, `packages.config`, and props files
//! - Version resolution against one or more feeds by release channel (tag)
//! - Format-preserving updates of the referencing files
//! - Console, markdown, and JSON reports of every decision

pub mod apply;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod feed;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod resolve;
