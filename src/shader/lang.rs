//! The shading language: tokens, token stream, syntax and parser.

pub mod parser;
pub mod stream;
pub mod syntax;
pub mod token;
