//! GLSL writer.
//!
//! Both stages get the version header and every uniform. The vertex stage gets one input per
//! vertex layout component, at the location of the component in the layout, and writes varyings
//! as `out` variables; the fragment stage reads them back as `in` variables and writes its outputs
//! at increasing locations.
//!
//! Stage bodies are lowered to [`glsl::syntax`] and shown with [`glsl::transpiler::glsl`]; only the
//! header and the located inputs and outputs are written by hand.

use glsl::syntax as ast;
use glsl::transpiler;
use std::fmt::Write;

use crate::config::Config;
use crate::shader::lang::syntax::{
  AssignOp, BinaryOp, Block, DataType, Declaration, Expr, Stage, Statement, UnaryOp, VertexLayout,
};
use crate::shader::program::ParsedProgram;
use crate::shader::writer::{Backend, ConvertedProgram, ShaderWriter, UniformTable, WriteError};

/// Writer producing GLSL 3.30+ sources.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GlslWriter {
  version: u16,
  profile: Option<String>,
}

impl GlslWriter {
  pub fn new(version: u16, profile: Option<String>) -> Self {
    GlslWriter { version, profile }
  }

  pub fn from_config(config: &Config) -> Self {
    Self::new(config.glsl_version, config.glsl_profile.clone())
  }

  fn sink_stage(
    &self,
    program: &ParsedProgram,
    stage: Stage,
    body: &Block,
  ) -> Result<String, WriteError> {
    // lower first so that a failure leaves nothing half written
    let main = main_definition(body, stage)?;
    let mut sink = String::new();

    sink_header(&mut sink, self.version, self.profile.as_ref().map(String::as_str));
    sink_uniforms(&mut sink, &program.uniforms);

    match stage {
      Stage::Vertex => {
        sink_vertex_inputs(&mut sink, &program.vertex_layout);
        sink_varyings(&mut sink, &program.varyings, ast::StorageQualifier::Out);
      }

      Stage::Fragment => {
        sink_varyings(&mut sink, &program.varyings, ast::StorageQualifier::In);
        sink_fragment_outputs(&mut sink, &program.outputs);
      }
    }

    transpiler::glsl::show_function_definition(&mut sink, &main);

    Ok(sink)
  }
}

impl Default for GlslWriter {
  fn default() -> Self {
    GlslWriter::new(330, Some("core".to_owned()))
  }
}

impl ShaderWriter for GlslWriter {
  fn backend(&self) -> Backend {
    Backend::Glsl
  }

  fn write(&self, program: &ParsedProgram) -> Result<ConvertedProgram, WriteError> {
    let vertex = program
      .vertex
      .as_ref()
      .ok_or(WriteError::MissingStage(Stage::Vertex))?;
    let fragment = program
      .fragment
      .as_ref()
      .ok_or(WriteError::MissingStage(Stage::Fragment))?;

    for varying in &program.varyings {
      check_interface(varying, "varying")?;
    }

    for output in &program.outputs {
      check_interface(output, "output")?;
    }

    let vertex_source = self.sink_stage(program, Stage::Vertex, vertex)?;
    let fragment_source = self.sink_stage(program, Stage::Fragment, fragment)?;

    Ok(ConvertedProgram {
      backend: Backend::Glsl,
      vertex_source,
      fragment_source,
      uniforms: UniformTable::new(program.uniforms.clone()),
    })
  }
}

/// GLSL type of a data type.
pub fn glsl_type(ty: DataType) -> ast::TypeSpecifierNonArray {
  match ty {
    DataType::Float => ast::TypeSpecifierNonArray::Float,
    DataType::Int => ast::TypeSpecifierNonArray::Int,
    DataType::Bool => ast::TypeSpecifierNonArray::Bool,
    DataType::Vec2 => ast::TypeSpecifierNonArray::Vec2,
    DataType::Vec3 => ast::TypeSpecifierNonArray::Vec3,
    DataType::Vec4 => ast::TypeSpecifierNonArray::Vec4,
    DataType::Mat3x3 => ast::TypeSpecifierNonArray::Mat3,
    DataType::Mat4x4 => ast::TypeSpecifierNonArray::Mat4,
    DataType::Texture2D => ast::TypeSpecifierNonArray::Sampler2D,
  }
}

// Name of a called function in GLSL.
fn glsl_function(name: &str) -> &str {
  match name {
    "sample" => "texture",
    "texture2D" => "sampler2D",
    _ => name,
  }
}

fn check_interface(decl: &Declaration, what: &str) -> Result<(), WriteError> {
  match decl.ty {
    DataType::Bool | DataType::Texture2D => Err(WriteError::UnsupportedConstruct(format!(
      "{} {} `{}`",
      decl.ty, what, decl.name
    ))),
    _ => Ok(()),
  }
}

/// Global declaration of `decl` with the given qualifiers.
fn qualified(decl: &Declaration, qualifiers: Vec<ast::TypeQualifierSpec>) -> ast::SingleDeclaration {
  ast::SingleDeclaration {
    ty: ast::FullySpecifiedType {
      qualifier: Some(ast::TypeQualifier {
        qualifiers: ast::NonEmpty(qualifiers),
      }),
      ty: ast::TypeSpecifier::new(glsl_type(decl.ty)),
    },
    name: Some(decl.name.as_str().into()),
    array_specifier: None,
    initializer: None,
  }
}

fn sink_header<F>(sink: &mut F, version: u16, profile: Option<&str>)
where F: Write {
  let _ = match profile {
    Some(profile) => write!(sink, "#version {} {}\n\n", version, profile),
    None => write!(sink, "#version {}\n\n", version),
  };
}

fn sink_uniforms<F>(sink: &mut F, uniforms: &[Declaration])
where F: Write {
  for uniform in uniforms {
    let decl = qualified(
      uniform,
      vec![ast::TypeQualifierSpec::Storage(ast::StorageQualifier::Uniform)],
    );

    transpiler::glsl::show_single_declaration(sink, &decl);
    let _ = sink.write_str(";\n");
  }

  if !uniforms.is_empty() {
    let _ = sink.write_str("\n");
  }
}

fn sink_located<F>(sink: &mut F, location: usize, qualifier: &str, ty: DataType, name: &str)
where F: Write {
  let _ = write!(sink, "layout(location={}) {} ", location, qualifier);
  transpiler::glsl::show_type_specifier_non_array(sink, &glsl_type(ty));
  let _ = write!(sink, " {};\n", name);
}

fn sink_vertex_inputs<F>(sink: &mut F, layout: &VertexLayout)
where F: Write {
  for (location, component) in layout.components.iter().enumerate() {
    sink_located(sink, location, "in", component.data_type(), component.name());
  }

  if !layout.is_empty() {
    let _ = sink.write_str("\n");
  }
}

fn sink_varyings<F>(sink: &mut F, varyings: &[Declaration], storage: ast::StorageQualifier)
where F: Write {
  for varying in varyings {
    let mut qualifiers = Vec::new();

    // integers cannot be interpolated
    if varying.ty == DataType::Int {
      qualifiers.push(ast::TypeQualifierSpec::Interpolation(
        ast::InterpolationQualifier::Flat,
      ));
    }

    qualifiers.push(ast::TypeQualifierSpec::Storage(storage.clone()));

    transpiler::glsl::show_single_declaration(sink, &qualified(varying, qualifiers));
    let _ = sink.write_str(";\n");
  }

  if !varyings.is_empty() {
    let _ = sink.write_str("\n");
  }
}

fn sink_fragment_outputs<F>(sink: &mut F, outputs: &[Declaration])
where F: Write {
  for (location, output) in outputs.iter().enumerate() {
    sink_located(sink, location, "out", output.ty, &output.name);
  }

  if !outputs.is_empty() {
    let _ = sink.write_str("\n");
  }
}

/// `void main()` holding a stage body.
fn main_definition(body: &Block, stage: Stage) -> Result<ast::FunctionDefinition, WriteError> {
  Ok(ast::FunctionDefinition {
    prototype: ast::FunctionPrototype {
      ty: ast::FullySpecifiedType::new(ast::TypeSpecifierNonArray::Void),
      name: "main".into(),
      parameters: Vec::new(),
    },
    statement: lower_block(body, stage)?,
  })
}

fn simple(st: ast::SimpleStatement) -> ast::Statement {
  ast::Statement::Simple(Box::new(st))
}

fn lower_block(block: &Block, stage: Stage) -> Result<ast::CompoundStatement, WriteError> {
  block.iter().map(|st| lower_statement(st, stage)).collect()
}

fn lower_statement(st: &Statement, stage: Stage) -> Result<ast::Statement, WriteError> {
  match *st {
    Statement::Local(ref decl, ref init) => {
      if decl.ty == DataType::Texture2D {
        return Err(WriteError::UnsupportedConstruct(format!(
          "local texture2D `{}`",
          decl.name
        )));
      }

      Ok(ast::Statement::declare_var(
        ast::FullySpecifiedType::new(glsl_type(decl.ty)),
        decl.name.as_str(),
        None::<ast::ArraySpecifier>,
        init.as_ref().map(|e| ast::Initializer::from(lower_expr(e))),
      ))
    }

    Statement::Assign(ref target, op, ref value) => {
      let assign = ast::Expr::Assignment(
        Box::new(lower_expr(target)),
        assign_op(op),
        Box::new(lower_expr(value)),
      );

      Ok(simple(ast::SimpleStatement::Expression(Some(assign))))
    }

    Statement::Expr(ref e) => Ok(simple(ast::SimpleStatement::Expression(Some(lower_expr(e))))),

    Statement::If(ref cond, ref then, ref otherwise) => {
      lower_if(cond, then, otherwise.as_ref(), stage)
    }

    Statement::Discard => {
      if stage == Stage::Vertex {
        return Err(WriteError::UnsupportedConstruct(
          "discard in vertex stage".to_owned(),
        ));
      }

      Ok(simple(ast::SimpleStatement::Jump(ast::JumpStatement::Discard)))
    }

    Statement::Return => Ok(simple(ast::SimpleStatement::Jump(
      ast::JumpStatement::Return(None),
    ))),
  }
}

fn lower_if(
  cond: &Expr,
  then: &Block,
  otherwise: Option<&Block>,
  stage: Stage,
) -> Result<ast::Statement, WriteError> {
  let then_st = ast::Statement::Compound(Box::new(lower_block(then, stage)?));

  let rest = match otherwise {
    None => ast::SelectionRestStatement::Statement(Box::new(then_st)),

    Some(block) => {
      let else_st = match block.as_slice() {
        // else if chain
        [Statement::If(c, t, o)] => lower_if(c, t, o.as_ref(), stage)?,
        _ => ast::Statement::Compound(Box::new(lower_block(block, stage)?)),
      };

      ast::SelectionRestStatement::Else(Box::new(then_st), Box::new(else_st))
    }
  };

  Ok(simple(ast::SimpleStatement::Selection(ast::SelectionStatement {
    cond: Box::new(lower_expr(cond)),
    rest,
  })))
}

fn assign_op(op: AssignOp) -> ast::AssignmentOp {
  match op {
    AssignOp::Assign => ast::AssignmentOp::Equal,
    AssignOp::Add => ast::AssignmentOp::Add,
    AssignOp::Mul => ast::AssignmentOp::Mult,
    AssignOp::Div => ast::AssignmentOp::Div,
    AssignOp::And => ast::AssignmentOp::And,
    AssignOp::Or => ast::AssignmentOp::Or,
  }
}

fn unary_op(op: UnaryOp) -> ast::UnaryOp {
  match op {
    UnaryOp::Neg => ast::UnaryOp::Minus,
    UnaryOp::Not => ast::UnaryOp::Not,
  }
}

fn binary_op(op: BinaryOp) -> ast::BinaryOp {
  match op {
    BinaryOp::Or => ast::BinaryOp::Or,
    BinaryOp::And => ast::BinaryOp::And,
    BinaryOp::BitOr => ast::BinaryOp::BitOr,
    BinaryOp::BitAnd => ast::BinaryOp::BitAnd,
    BinaryOp::Equal => ast::BinaryOp::Equal,
    BinaryOp::NotEqual => ast::BinaryOp::NonEqual,
    BinaryOp::Lt => ast::BinaryOp::LT,
    BinaryOp::Gt => ast::BinaryOp::GT,
    BinaryOp::Lte => ast::BinaryOp::LTE,
    BinaryOp::Gte => ast::BinaryOp::GTE,
    BinaryOp::Add => ast::BinaryOp::Add,
    BinaryOp::Sub => ast::BinaryOp::Sub,
    BinaryOp::Mul => ast::BinaryOp::Mult,
    BinaryOp::Div => ast::BinaryOp::Div,
  }
}

/// Lower an expression. Parentheses come back from operator precedences when shown.
fn lower_expr(e: &Expr) -> ast::Expr {
  match *e {
    Expr::Int(i) => ast::Expr::IntConst(i),
    Expr::Float(f) => ast::Expr::FloatConst(f),
    Expr::Bool(b) => ast::Expr::BoolConst(b),
    Expr::Variable(ref name) => ast::Expr::Variable(name.as_str().into()),

    Expr::Unary(op, ref operand) => ast::Expr::Unary(unary_op(op), Box::new(lower_expr(operand))),

    Expr::Binary(op, ref lhs, ref rhs) => ast::Expr::Binary(
      binary_op(op),
      Box::new(lower_expr(lhs)),
      Box::new(lower_expr(rhs)),
    ),

    Expr::Ternary(ref cond, ref a, ref b) => ast::Expr::Ternary(
      Box::new(lower_expr(cond)),
      Box::new(lower_expr(a)),
      Box::new(lower_expr(b)),
    ),

    Expr::Call(ref name, ref args) => ast::Expr::FunCall(
      ast::FunIdentifier::Identifier(glsl_function(name).into()),
      args.iter().map(lower_expr).collect(),
    ),

    Expr::Field(ref object, ref field) => {
      ast::Expr::Dot(Box::new(lower_expr(object)), field.as_str().into())
    }

    Expr::Index(ref object, ref index) => ast::Expr::Bracket(
      Box::new(lower_expr(object)),
      ast::ArraySpecifier {
        dimensions: ast::NonEmpty(vec![ast::ArraySpecifierDimension::ExplicitlySized(
          Box::new(lower_expr(index)),
        )]),
      },
    ),
  }
}
