//! Materials.
//!
//! A material is a shader program (a source path and a define set) along with the values of its
//! uniforms. Uniform writes are checked against the uniform table of the converted program and
//! only pushed to the device when they changed.
//!
//! Uniform values live in device programs, so every material gets a device program of its own;
//! materials using the same source and define set only share the parsed and converted program.
//!
//! When the program of a material cannot be built, the material still exists but has no program:
//! binding it fails and whatever uses it is expected to skip rendering.

use log::{error, info};
use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use crate::config::Config;
use crate::device::RenderDevice;
use crate::shader::cache;
use crate::shader::define::DefineSet;
use crate::shader::lang::syntax::DataType;
use crate::shader::program::ShaderError;
use crate::shader::store::ShaderStore;
use crate::shader::writer::{Backend, ShaderWriter, UniformError, UniformTable};

/// Description of a material.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MaterialParams {
  /// Path of the shader source, relative to the resource root.
  pub shader_program_path: PathBuf,
  #[serde(default)]
  pub preprocessor_definitions: DefineSet,
}

impl MaterialParams {
  pub fn new<P>(shader_program_path: P) -> Self
  where P: Into<PathBuf> {
    MaterialParams {
      shader_program_path: shader_program_path.into(),
      preprocessor_definitions: DefineSet::new(),
    }
  }

  /// Add a preprocessor definition with an empty value.
  pub fn define<K>(mut self, key: K) -> Self
  where K: Into<String> {
    self.preprocessor_definitions.insert(key, "");
    self
  }
}

/// Value of a uniform.
#[derive(Clone, Debug, PartialEq)]
pub enum UniformValue {
  Float(f32),
  Int(i32),
  Bool(bool),
  Vec2(Vector2<f32>),
  Vec3(Vector3<f32>),
  Vec4(Vector4<f32>),
  Mat3(Matrix3<f32>),
  Mat4(Matrix4<f32>),
  /// Texture unit a 2D texture is bound to.
  Texture(u32),
}

impl UniformValue {
  pub fn data_type(&self) -> DataType {
    match *self {
      UniformValue::Float(_) => DataType::Float,
      UniformValue::Int(_) => DataType::Int,
      UniformValue::Bool(_) => DataType::Bool,
      UniformValue::Vec2(_) => DataType::Vec2,
      UniformValue::Vec3(_) => DataType::Vec3,
      UniformValue::Vec4(_) => DataType::Vec4,
      UniformValue::Mat3(_) => DataType::Mat3x3,
      UniformValue::Mat4(_) => DataType::Mat4x4,
      UniformValue::Texture(_) => DataType::Texture2D,
    }
  }
}

macro_rules! impl_from_for_uniform_value {
  ($($t:ty => $variant:ident),*) => {
    $(
      impl From<$t> for UniformValue {
        fn from(x: $t) -> Self {
          UniformValue::$variant(x)
        }
      }
    )*
  }
}

impl_from_for_uniform_value!(
  f32 => Float,
  i32 => Int,
  bool => Bool,
  Vector2<f32> => Vec2,
  Vector3<f32> => Vec3,
  Vector4<f32> => Vec4,
  Matrix3<f32> => Mat3,
  Matrix4<f32> => Mat4
);

/// Errors that prevent a material from getting a program.
#[derive(Debug)]
pub enum MaterialError {
  Shader(ShaderError),
  /// The device rejected the generated sources.
  Device(String),
}

impl fmt::Display for MaterialError {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      MaterialError::Shader(ref e) => write!(f, "shader error: {}", e),
      MaterialError::Device(ref reason) => write!(f, "device error: {}", reason),
    }
  }
}

impl Error for MaterialError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match *self {
      MaterialError::Shader(ref e) => Some(e),
      MaterialError::Device(_) => None,
    }
  }
}

impl From<ShaderError> for MaterialError {
  fn from(e: ShaderError) -> Self {
    MaterialError::Shader(e)
  }
}

/// A material, `P` being the device program type.
#[derive(Debug)]
pub struct Material<P> {
  params: MaterialParams,
  program: Option<P>,
  uniform_table: UniformTable,
  values: HashMap<String, UniformValue>,
  // names of values not pushed to the device yet, in write order
  modified: Vec<String>,
}

impl<P> Material<P> {
  /// A material without program.
  pub fn new(params: MaterialParams) -> Self {
    Material {
      params,
      program: None,
      uniform_table: UniformTable::default(),
      values: HashMap::new(),
      modified: Vec::new(),
    }
  }

  fn with_program(params: MaterialParams, program: P, uniform_table: UniformTable) -> Self {
    Material {
      program: Some(program),
      uniform_table,
      ..Material::new(params)
    }
  }

  pub fn params(&self) -> &MaterialParams {
    &self.params
  }

  pub fn has_program(&self) -> bool {
    self.program.is_some()
  }

  pub fn program(&self) -> Option<&P> {
    self.program.as_ref()
  }

  pub fn uniform_table(&self) -> &UniformTable {
    &self.uniform_table
  }

  /// Set the value of a uniform.
  ///
  /// The uniform must be declared by the program with the type of `value`. On failure the
  /// material is left untouched.
  pub fn set_uniform<V>(&mut self, name: &str, value: V) -> Result<(), UniformError>
  where V: Into<UniformValue> {
    let value = value.into();

    self.uniform_table.check(name, value.data_type())?;

    if self.values.get(name) == Some(&value) {
      return Ok(());
    }

    self.values.insert(name.to_owned(), value);

    if !self.modified.iter().any(|m| m == name) {
      self.modified.push(name.to_owned());
    }

    Ok(())
  }

  /// Set a texture uniform to a texture unit.
  pub fn set_texture(&mut self, name: &str, unit: u32) -> Result<(), UniformError> {
    self.set_uniform(name, UniformValue::Texture(unit))
  }

  pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
    self.values.get(name)
  }

  /// Uniforms written since the last flush, in write order.
  pub fn modified_uniforms(&self) -> impl Iterator<Item = &str> {
    self.modified.iter().map(String::as_str)
  }

  /// Push modified uniforms to the device. The program of the material must be active.
  pub fn flush_uniforms<D>(&mut self, device: &mut D)
  where D: RenderDevice<Program = P> {
    for name in self.modified.drain(..) {
      if let Some(value) = self.values.get(&name) {
        device.set_uniform(&name, value);
      }
    }
  }

  /// Make the program of the material active and push its modified uniforms.
  ///
  /// Returns `false` if the material has no program, in which case nothing should be rendered with
  /// it.
  pub fn bind<D>(&mut self, device: &mut D) -> bool
  where D: RenderDevice<Program = P> {
    match self.program {
      Some(ref program) => device.set_active_program(program),
      None => return false,
    }

    self.flush_uniforms(device);
    true
  }
}

/// Material factory.
///
/// Creating a material reads and parses its shader (once per path and define set), converts it
/// for the backend (once per parsed program) and compiles it on the device (once per material).
pub struct MaterialFactory {
  store: ShaderStore,
  writer: Box<dyn ShaderWriter>,
  annotate: bool,
}

impl MaterialFactory {
  /// Factory writing GLSL.
  pub fn new(config: Config) -> Self {
    let writer = Backend::Glsl.writer(&config);
    Self::with_writer(config, writer)
  }

  pub fn with_writer(config: Config, writer: Box<dyn ShaderWriter>) -> Self {
    info!("material factory writing {}", writer.backend());

    MaterialFactory {
      annotate: config.log_generated_source,
      store: ShaderStore::new(config),
      writer,
    }
  }

  pub fn store(&self) -> &ShaderStore {
    &self.store
  }

  pub fn store_mut(&mut self) -> &mut ShaderStore {
    &mut self.store
  }

  /// Create a material.
  ///
  /// Failures are logged and give a material without program.
  pub fn create_material<D>(&mut self, device: &mut D, params: MaterialParams) -> Material<D::Program>
  where D: RenderDevice {
    match self.try_create_material(device, params.clone()) {
      Ok(material) => material,

      Err(e) => {
        error!(
          "cannot create material for {} {}: {}",
          params.shader_program_path.display(),
          params.preprocessor_definitions,
          e
        );

        Material::new(params)
      }
    }
  }

  /// Create a material, failing if its program cannot be built.
  pub fn try_create_material<D>(
    &mut self,
    device: &mut D,
    params: MaterialParams,
  ) -> Result<Material<D::Program>, MaterialError>
  where D: RenderDevice {
    let parsed = self
      .store
      .get(&params.shader_program_path, &params.preprocessor_definitions)?;

    let converted = if self.annotate {
      cache::get_or_create_annotated(&parsed, self.writer.as_ref())
    } else {
      cache::get_or_create(&parsed, self.writer.as_ref())
    }
    .map_err(ShaderError::from)?;

    let program = device
      .create_shader_program(converted)
      .map_err(|e| MaterialError::Device(e.to_string()))?;

    Ok(Material::with_program(
      params,
      program,
      converted.uniforms.clone(),
    ))
  }

  /// Forget every cached shader.
  pub fn clear(&mut self) {
    self.store.clear();
  }
}
