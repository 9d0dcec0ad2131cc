//! `llgen` compiles an LL(1) grammar description into a recursive-descent
//! parser written in Rust.
//!
//! # Overview
//!
//! A grammar file declares a set of terminal and nonterminal rules and
//! lexical definitions. The compiler reads the grammar, resolves every
//! forward reference to a rule or lexical definition, left-factors shared
//! production prefixes and eliminates direct left recursion, computes
//! FIRST/FOLLOW sets, checks that the resulting grammar is LL(1), and
//! emits one parsing procedure per rule.
//!
//! # Pipeline
//!
//! The stages run in order and each one assumes the grammar produced by
//! the stage before it is already clean: [`parser`] builds an AST in an
//! [`arena`], [`transform`] rewrites it to remove left recursion and
//! shared prefixes, [`analysis`] computes FIRST/FOLLOW sets and checks
//! LL(1) disjointness, and [`emit`] renders the generated parser source.
//! [`pipeline::run`] drives all of the above and is the entry point most
//! callers want; [`dump`] is an optional AST-inspection aid along the way.
//!
//! # Example
//!
//! ```
//! use llgen::pipeline::{self, PipelineConfig};
//!
//! let src = "grammar calc; start: 'n' rest ; rest: 'plus' 'n' | ;";
//! let out = pipeline::run(src, PipelineConfig::default());
//! assert!(out.success);
//! assert!(out.code.unwrap().contains("pub fn parse_start"));
//! ```

pub mod analysis;
pub mod arena;
pub mod diagnostics;
pub mod dump;
pub mod emit;
pub mod interner;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod position;
pub mod transform;
pub mod util;
