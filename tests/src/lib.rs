//! End to end tests of the Tern semantic analysis front end.
//!
//! Trees are built with [`tern_ast::builder::AstBuilder`] and run through the
//! public entry points of `tern-sema`.

#[cfg(test)]
mod utils;
