//! Shader program store.
//!
//! The store hands out one parsed program per (source path, define set) pair. Asking twice for the
//! same pair gives back the same program, and thus the same conversion slot: every material using
//! that pair shares a single converted artifact.

use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::Config;
use crate::resource::load_with;
use crate::shader::define::DefineSet;
use crate::shader::lang::parser::parse_program;
use crate::shader::program::{ParsedProgram, ShaderError};

type Key = (PathBuf, DefineSet);

#[derive(Debug)]
pub struct ShaderStore {
  config: Config,
  programs: HashMap<Key, Rc<ParsedProgram>>,
}

impl ShaderStore {
  pub fn new(config: Config) -> Self {
    ShaderStore {
      config,
      programs: HashMap::new(),
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  /// Get the program at `path` (relative to the resource root) parsed under `defines`, reading and
  /// parsing it if needed.
  pub fn get<P>(&mut self, path: P, defines: &DefineSet) -> Result<Rc<ParsedProgram>, ShaderError>
  where P: AsRef<Path> {
    let path = path.as_ref();
    let key = (path.to_owned(), defines.clone());

    if let Some(program) = self.programs.get(&key) {
      debug!("cache hit for {} {}", path.display(), defines);
      return Ok(program.clone());
    }

    debug!("cache miss for {} {}", path.display(), defines);

    let full_path = self.config.resource_path(path);
    let program = load_with::<ParsedProgram, _, _, _>(&full_path, || {
      let source = fs::read_to_string(&full_path)
        .map_err(|e| ShaderError::CannotRead(full_path.clone(), e.to_string()))?;

      parse_program(path.display().to_string(), &source, defines)
        .map_err(|e| ShaderError::Parse(path.to_owned(), e))
    })?;

    Ok(self.insert(key, program))
  }

  /// Parse an in-memory source under `defines`, named `name`.
  ///
  /// Sources are cached by name, exactly like the ones read by [`ShaderStore::get`]: a second call
  /// with the same name and define set returns the first program, whatever `source` is.
  pub fn parse_source<N>(
    &mut self,
    name: N,
    source: &str,
    defines: &DefineSet,
  ) -> Result<Rc<ParsedProgram>, ShaderError>
  where N: Into<String> {
    let name = name.into();
    let key = (PathBuf::from(&name), defines.clone());

    if let Some(program) = self.programs.get(&key) {
      debug!("cache hit for {} {}", name, defines);
      return Ok(program.clone());
    }

    debug!("cache miss for {} {}", name, defines);

    let program =
      parse_program(name.as_str(), source, defines).map_err(|e| ShaderError::Parse(key.0.clone(), e))?;

    Ok(self.insert(key, program))
  }

  fn insert(&mut self, key: Key, program: ParsedProgram) -> Rc<ParsedProgram> {
    let program = Rc::new(program);
    self.programs.insert(key, program.clone());
    program
  }

  /// Number of cached programs.
  pub fn len(&self) -> usize {
    self.programs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.programs.is_empty()
  }

  /// Forget every cached program. Programs already handed out stay alive while referenced.
  pub fn clear(&mut self) {
    self.programs.clear();
  }
}
