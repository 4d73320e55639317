//! Backend writers.
//!
//! A writer turns a [`ParsedProgram`] into backend-specific shader sources, packed in a
//! [`ConvertedProgram`] along with the table of uniforms the backend exposes.

use std::error::Error;
use std::fmt;

use crate::config::Config;
use crate::shader::lang::syntax::{DataType, Declaration, Stage};
use crate::shader::program::ParsedProgram;

pub mod glsl;

pub use self::glsl::GlslWriter;

/// Target backend of a writer.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Backend {
  Glsl,
}

impl Backend {
  /// Build the writer for this backend, configured by `config`.
  pub fn writer(self, config: &Config) -> Box<dyn ShaderWriter> {
    match self {
      Backend::Glsl => Box::new(GlslWriter::from_config(config)),
    }
  }
}

impl fmt::Display for Backend {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      Backend::Glsl => f.write_str("GLSL"),
    }
  }
}

/// Class of shader writers.
pub trait ShaderWriter {
  fn backend(&self) -> Backend;

  /// Produce backend sources for a parsed program.
  ///
  /// Writers are pure: they never look at nor touch the conversion slot of the program.
  fn write(&self, program: &ParsedProgram) -> Result<ConvertedProgram, WriteError>;
}

/// Errors that might happen when writing a program for a backend.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WriteError {
  /// The program has no body for this stage.
  MissingStage(Stage),
  /// Something the backend cannot express.
  UnsupportedConstruct(String),
}

impl fmt::Display for WriteError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      WriteError::MissingStage(stage) => write!(f, "no {} stage", stage),
      WriteError::UnsupportedConstruct(ref what) => write!(f, "unsupported construct: {}", what),
    }
  }
}

impl Error for WriteError {}

/// Backend-specific artifact of a parsed program.
#[derive(Clone, Debug, PartialEq)]
pub struct ConvertedProgram {
  pub backend: Backend,
  pub vertex_source: String,
  pub fragment_source: String,
  pub uniforms: UniformTable,
}

impl ConvertedProgram {
  pub fn source(&self, stage: Stage) -> &str {
    match stage {
      Stage::Vertex => &self.vertex_source,
      Stage::Fragment => &self.fragment_source,
    }
  }
}

/// Uniforms of a converted program, in declaration order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UniformTable {
  uniforms: Vec<Declaration>,
}

impl UniformTable {
  pub fn new(uniforms: Vec<Declaration>) -> Self {
    UniformTable { uniforms }
  }

  pub fn get(&self, name: &str) -> Option<DataType> {
    self.uniforms.iter().find(|u| u.name == name).map(|u| u.ty)
  }

  /// Check that `name` is a uniform of type `ty`.
  pub fn check(&self, name: &str, ty: DataType) -> Result<(), UniformError> {
    match self.get(name) {
      None => Err(UniformError::Missing(name.to_owned())),
      Some(found) if found != ty => Err(UniformError::TypeMismatch {
        name: name.to_owned(),
        expected: found,
        found: ty,
      }),
      Some(_) => Ok(()),
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
    self.uniforms.iter()
  }

  pub fn len(&self) -> usize {
    self.uniforms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.uniforms.is_empty()
  }
}

/// Uniform lookup failure.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UniformError {
  Missing(String),
  /// `expected` is the declared type, `found` the type of the value.
  TypeMismatch {
    name: String,
    expected: DataType,
    found: DataType,
  },
}

impl fmt::Display for UniformError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      UniformError::Missing(ref name) => write!(f, "no uniform named {}", name),
      UniformError::TypeMismatch {
        ref name,
        expected,
        found,
      } => write!(
        f,
        "uniform {} is declared as {} but was given a {}",
        name, expected, found
      ),
    }
  }
}

impl Error for UniformError {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn uniform_table_check() {
    let table = UniformTable::new(vec![
      Declaration::new(DataType::Vec4, "_colourDiffuse"),
      Declaration::new(DataType::Mat4x4, "MVP"),
    ]);

    assert_eq!(table.check("MVP", DataType::Mat4x4), Ok(()));
    assert_eq!(
      table.check("_colourDiffuse", DataType::Vec3),
      Err(UniformError::TypeMismatch {
        name: "_colourDiffuse".to_owned(),
        expected: DataType::Vec4,
        found: DataType::Vec3,
      })
    );
    assert_eq!(
      table.check("_shininess", DataType::Float),
      Err(UniformError::Missing("_shininess".to_owned()))
    );
    assert_eq!(table.iter().map(|u| u.name.as_str()).collect::<Vec<_>>(), vec!["_colourDiffuse", "MVP"]);
  }
}
