//! Conversion cache.
//!
//! Every [`ParsedProgram`] owns a single slot for its converted artifact. The first conversion
//! request runs the writer and fills the slot; any later request gets the very same artifact back
//! without invoking the writer again. Identity is the program instance: two programs parsed
//! separately from the same text are converted separately.
//!
//! The slot is a `std::cell::OnceCell`: parsed programs are meant to be used from a single thread.

use log::{debug, log_enabled, Level};

use crate::shader::program::ParsedProgram;
use crate::shader::writer::{ConvertedProgram, ShaderWriter, WriteError};

/// Get the converted artifact of `program`, writing it with `writer` if it doesn’t exist yet.
///
/// A failed write leaves the program unconverted, so a later call tries again.
pub fn get_or_create<'p, W>(
  program: &'p ParsedProgram,
  writer: &W,
) -> Result<&'p ConvertedProgram, WriteError>
where W: ShaderWriter + ?Sized {
  convert(program, writer, false)
}

/// Same as [`get_or_create`], but also log the generated sources, line by line, the first time
/// they are produced.
pub fn get_or_create_annotated<'p, W>(
  program: &'p ParsedProgram,
  writer: &W,
) -> Result<&'p ConvertedProgram, WriteError>
where W: ShaderWriter + ?Sized {
  convert(program, writer, true)
}

fn convert<'p, W>(
  program: &'p ParsedProgram,
  writer: &W,
  annotate: bool,
) -> Result<&'p ConvertedProgram, WriteError>
where W: ShaderWriter + ?Sized {
  let slot = program.converted_slot();

  if let Some(converted) = slot.get() {
    debug!("conversion cache hit for {} {}", program.name, program.defines);
    return Ok(&**converted);
  }

  debug!(
    "conversion cache miss for {} {}, writing {}",
    program.name,
    program.defines,
    writer.backend()
  );

  let converted = writer.write(program)?;
  let converted = slot.get_or_init(|| Box::new(converted));

  if annotate {
    annotate_shader("vertex", &converted.vertex_source);
    annotate_shader("fragment", &converted.fragment_source);
  }

  Ok(&**converted)
}

fn annotate_shader(stage: &str, s: &str) {
  if !log_enabled!(Level::Debug) {
    return;
  }

  debug!("{} shader:", stage);

  for (k, line) in s.lines().enumerate() {
    debug!("{:3}: {}", k + 1, line);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::shader::define::DefineSet;
  use crate::shader::lang::parser::parse_program;
  use crate::shader::lang::syntax::Stage;
  use crate::shader::writer::{Backend, GlslWriter};
  use std::cell::Cell;

  const SRC: &str = "
    uniform vec4 _colourDiffuse;
    output vec4 FragColour;
    vertex { gl_Position = vec4(0.0, 0.0, 0.0, 1.0); }
    fragment { FragColour = _colourDiffuse; }
  ";

  /// Writer counting its invocations, optionally failing.
  struct CountingWriter {
    calls: Cell<usize>,
    fail: Cell<bool>,
    inner: GlslWriter,
  }

  impl CountingWriter {
    fn new() -> Self {
      CountingWriter {
        calls: Cell::new(0),
        fail: Cell::new(false),
        inner: GlslWriter::default(),
      }
    }
  }

  impl ShaderWriter for CountingWriter {
    fn backend(&self) -> Backend {
      Backend::Glsl
    }

    fn write(&self, program: &ParsedProgram) -> Result<ConvertedProgram, WriteError> {
      self.calls.set(self.calls.get() + 1);

      if self.fail.get() {
        Err(WriteError::MissingStage(Stage::Vertex))
      } else {
        self.inner.write(program)
      }
    }
  }

  fn parse() -> ParsedProgram {
    parse_program("test", SRC, &DefineSet::new()).unwrap()
  }

  #[test]
  fn writes_at_most_once() {
    let program = parse();
    let writer = CountingWriter::new();

    assert!(program.converted().is_none());

    let a = get_or_create(&program, &writer).unwrap() as *const ConvertedProgram;
    let b = get_or_create_annotated(&program, &writer).unwrap() as *const ConvertedProgram;

    assert_eq!(writer.calls.get(), 1);
    assert_eq!(a, b);
    assert_eq!(
      program.converted().map(|c| c as *const ConvertedProgram),
      Some(a)
    );
  }

  #[test]
  fn failure_leaves_slot_empty() {
    let program = parse();
    let writer = CountingWriter::new();

    writer.fail.set(true);
    assert_eq!(
      get_or_create(&program, &writer),
      Err(WriteError::MissingStage(Stage::Vertex))
    );
    assert!(program.converted().is_none());

    writer.fail.set(false);
    assert!(get_or_create(&program, &writer).is_ok());
    assert_eq!(writer.calls.get(), 2);
  }

  #[test]
  fn identity_is_per_instance() {
    let a = parse();
    let b = parse();
    let writer = CountingWriter::new();

    let ca = get_or_create(&a, &writer).unwrap();
    let cb = get_or_create(&b, &writer).unwrap();

    assert_eq!(writer.calls.get(), 2);
    assert_eq!(ca, cb);
    assert!(!std::ptr::eq(ca, cb));
  }

  #[test]
  fn boxed_writers() {
    let program = parse();
    let writer: Box<dyn ShaderWriter> = Backend::Glsl.writer(&Default::default());
    let converted = get_or_create(&program, writer.as_ref()).unwrap();

    assert!(converted
      .fragment_source
      .contains("uniform vec4 _colourDiffuse;"));
  }
}
