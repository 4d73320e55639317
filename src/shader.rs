//! Shader programs.
//!
//! A shader source goes through the following steps:
//!
//!   1. It’s tokenized and parsed under a [`DefineSet`] into a [`ParsedProgram`]; the
//!      [`ShaderStore`] keeps one parsed program per (path, define set) pair.
//!   2. The parsed program is converted for a backend by a [`ShaderWriter`]; the [`cache`] makes
//!      sure that happens at most once per parsed program.
//!   3. The resulting [`ConvertedProgram`] is handed to a render device.

pub mod cache;
pub mod define;
pub mod lang;
pub mod program;
pub mod store;
pub mod writer;

pub use self::define::DefineSet;
pub use self::lang::parser::{parse_program, ParseError};
pub use self::lang::syntax::{DataType, Stage, VertexComponent, VertexLayout};
pub use self::lang::token::LexError;
pub use self::program::{ParsedProgram, ShaderError};
pub use self::store::ShaderStore;
pub use self::writer::{
  Backend, ConvertedProgram, GlslWriter, ShaderWriter, UniformError, UniformTable, WriteError,
};
