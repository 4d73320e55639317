//! Parsed shader programs.
//!
//! A [`ParsedProgram`] is the backend-neutral representation of a shader source parsed under a
//! given define set. It owns a single slot for its converted, backend-specific artifact; see the
//! `cache` module for how that slot gets filled.

use std::cell::OnceCell;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use crate::resource::TyDesc;
use crate::shader::define::DefineSet;
use crate::shader::lang::parser::ParseError;
use crate::shader::lang::syntax::{Block, Declaration, Stage, VertexLayout};
use crate::shader::writer::{ConvertedProgram, WriteError};

/// Errors that can be risen while turning a shader source into a converted program.
#[derive(Debug)]
pub enum ShaderError {
  /// The source couldn’t be read from the file system.
  CannotRead(PathBuf, String),
  /// The source is ill-formed.
  Parse(PathBuf, ParseError),
  /// The parsed program couldn’t be written for the target backend.
  Write(WriteError),
}

impl fmt::Display for ShaderError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      ShaderError::CannotRead(ref path, ref reason) => {
        write!(f, "cannot read {}: {}", path.display(), reason)
      }

      ShaderError::Parse(ref path, ref err) => write!(f, "cannot parse {}: {}", path.display(), err),

      ShaderError::Write(ref err) => write!(f, "cannot write shader: {}", err),
    }
  }
}

impl Error for ShaderError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match *self {
      ShaderError::CannotRead(..) => None,
      ShaderError::Parse(_, ref err) => Some(err),
      ShaderError::Write(ref err) => Some(err),
    }
  }
}

impl From<WriteError> for ShaderError {
  fn from(err: WriteError) -> Self {
    ShaderError::Write(err)
  }
}

/// Backend-neutral shader program.
#[derive(Debug)]
pub struct ParsedProgram {
  /// Name of the program, usually the path of its source.
  pub name: String,
  /// Define set the program was parsed under.
  pub defines: DefineSet,
  pub vertex_layout: VertexLayout,
  /// Uniforms, in declaration order. Names are unique.
  pub uniforms: Vec<Declaration>,
  /// Values passed from the vertex stage to the fragment stage.
  pub varyings: Vec<Declaration>,
  /// Fragment stage outputs.
  pub outputs: Vec<Declaration>,
  pub vertex: Option<Block>,
  pub fragment: Option<Block>,
  converted: OnceCell<Box<ConvertedProgram>>,
}

impl ParsedProgram {
  /// Create an empty program.
  pub fn new<N>(name: N, defines: DefineSet) -> Self
  where N: Into<String> {
    ParsedProgram {
      name: name.into(),
      defines,
      vertex_layout: VertexLayout::default(),
      uniforms: Vec::new(),
      varyings: Vec::new(),
      outputs: Vec::new(),
      vertex: None,
      fragment: None,
      converted: OnceCell::new(),
    }
  }

  /// Look up a uniform by name.
  pub fn uniform(&self, name: &str) -> Option<&Declaration> {
    self.uniforms.iter().find(|u| u.name == name)
  }

  /// Body of a stage, if declared.
  pub fn stage(&self, stage: Stage) -> Option<&Block> {
    match stage {
      Stage::Vertex => self.vertex.as_ref(),
      Stage::Fragment => self.fragment.as_ref(),
    }
  }

  /// Is `name` used by any uniform, varying, output or vertex component?
  pub fn is_declared(&self, name: &str) -> bool {
    self
      .uniforms
      .iter()
      .chain(&self.varyings)
      .chain(&self.outputs)
      .any(|d| d.name == name)
      || self.vertex_layout.components.iter().any(|c| c.name() == name)
  }

  /// Converted artifact, if conversion already happened.
  pub fn converted(&self) -> Option<&ConvertedProgram> {
    self.converted.get().map(|c| &**c)
  }

  pub(crate) fn converted_slot(&self) -> &OnceCell<Box<ConvertedProgram>> {
    &self.converted
  }
}

impl TyDesc for ParsedProgram {
  const TY_DESC: &'static str = "shader program";
}
