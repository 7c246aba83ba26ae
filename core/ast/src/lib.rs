#![warn(clippy::pedantic)]
//! Syntax tree of the Tern language as consumed by semantic analysis.
//!
//! The tree is built once (by the parser front end or by [`builder::AstBuilder`])
//! and then annotated in place by the analysis passes: identifiers receive their
//! symbol ids, [`types::TypeSlot`]s lose their placeholders, and closures get
//! their capture lists.

pub mod builder;
pub mod nodes;
pub(crate) mod nodes_impl;
pub mod types;
