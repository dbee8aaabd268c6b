//! xcbazel core library.
//!
//! Turns the per-rule records extracted from a Bazel build graph into a
//! reproducible Xcode project. The pipeline runs in one direction:
//!
//! - [`rule_entry_map::RuleEntryMap`] normalizes the records;
//! - [`settings::BuildSettings`] composes the Bazel flags;
//! - [`generator::ProjectGenerator`] builds a [`project::ProjectGraph`];
//! - [`serializer`] writes the graph as `project.pbxproj` and as a JSON
//!   identifier table.

pub mod cli;
pub mod flags;
pub mod generator;
pub mod hasher;
pub mod label;
pub mod project;
pub mod report;
pub mod rule_entry;
pub mod rule_entry_map;
pub mod runner;
pub mod serializer;
pub mod settings;
