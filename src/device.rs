//! Render device capability.
//!
//! Materials never talk to a graphics API directly. They go through a [`RenderDevice`], which only
//! has to accept generated sources and uniform writes.

use std::collections::HashMap;
use std::fmt;

use crate::material::UniformValue;
use crate::shader::writer::ConvertedProgram;

/// Class of render devices.
pub trait RenderDevice {
  /// Device-side program.
  type Program;

  /// Compilation / link error.
  type Error: fmt::Display;

  /// Compile and link a converted program.
  fn create_shader_program(
    &mut self,
    converted: &ConvertedProgram,
  ) -> Result<Self::Program, Self::Error>;

  /// Use a program for the next uniform writes and draws.
  fn set_active_program(&mut self, program: &Self::Program);

  /// Write a uniform of the active program.
  fn set_uniform(&mut self, name: &str, value: &UniformValue);
}

/// Uniform locations of a device program, looked up lazily.
///
/// Devices resolve a uniform name to a location the first time it’s written, then reuse it.
/// Unknown names are remembered as such too, so the backend is asked only once per name.
#[derive(Clone, Debug, Default)]
pub struct UniformLocations<L> {
  locations: HashMap<String, Option<L>>,
}

impl<L> UniformLocations<L>
where L: Copy {
  pub fn new() -> Self {
    UniformLocations {
      locations: HashMap::new(),
    }
  }

  /// Get the location of `name`, calling `lookup` if it was never asked for.
  pub fn get_or_lookup<F>(&mut self, name: &str, lookup: F) -> Option<L>
  where F: FnOnce(&str) -> Option<L> {
    if let Some(location) = self.locations.get(name) {
      return *location;
    }

    let location = lookup(name);
    self.locations.insert(name.to_owned(), location);
    location
  }

  pub fn len(&self) -> usize {
    self.locations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.locations.is_empty()
  }
}
