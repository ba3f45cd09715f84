// src/lib.rs
//
// The AST the Brim parser produces, plus a builder and a printer.

pub mod ast;
mod ast_display;
mod builder;

pub use ast::*;
pub use ast_display::AstPrinter;
pub use builder::AstBuilder;
pub use brim_identity::{Interner, Span, Symbol};
