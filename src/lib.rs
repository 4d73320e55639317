//! Shading language front end.
//!
//! This crate turns engine shader sources into backend sources (GLSL for now) and binds them to
//! materials:
//!
//! - [`shader`] tokenizes and parses sources under a preprocessor define set, converts parsed
//!   programs with a [`ShaderWriter`] and caches everything along the way.
//! - [`material`] checks uniform writes against the converted programs and pushes them to a
//!   [`RenderDevice`].
//!
//! ```ignore
//! let mut factory = MaterialFactory::new(Config::load("config.json")?);
//! let params = MaterialParams::new("shaders/pnt.shader").define("use_mat_colour");
//! let mut material = factory.create_material(&mut device, params);
//!
//! material.set_uniform("_colourDiffuse", Vector4::new(1., 0., 0., 1.))?;
//!
//! if material.bind(&mut device) {
//!   // draw
//! }
//! ```

pub mod config;
pub mod device;
pub mod logger;
pub mod material;
pub mod resource;
pub mod shader;

pub use crate::config::{Config, ConfigError};
pub use crate::device::{RenderDevice, UniformLocations};
pub use crate::material::{Material, MaterialError, MaterialFactory, MaterialParams, UniformValue};
pub use crate::shader::{
  Backend, ConvertedProgram, DataType, DefineSet, GlslWriter, ParsedProgram, ShaderError,
  ShaderStore, ShaderWriter, UniformError, UniformTable, VertexComponent, VertexLayout, WriteError,
};
