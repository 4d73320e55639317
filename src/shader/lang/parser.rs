//! Shader program parser.
//!
//! The parser walks a [`TokenParser`] and builds a [`ParsedProgram`] under a [`DefineSet`].
//! Conditional regions (`ifdef` / `ifndef`, with optional `else` branches that can chain into
//! another conditional) are resolved while parsing: regions that are not taken are still checked
//! for syntax, but contribute no declarations and no statements. Parsing stops at the first
//! error.
//!
//! A typical source looks like this:
//!
//! ```ignore
//! uniform mat4 MVP;
//! uniform vec4 _colourDiffuse;
//!
//! vertex_layout { Position, Normal, TexCoord }
//!
//! varying vec3 v_normal;
//! output vec4 FragColour;
//!
//! vertex {
//!   v_normal = Normal;
//!   gl_Position = MVP * vec4(Position, 1.0);
//! }
//!
//! fragment {
//!   vec4 colour = _colourDiffuse;
//!
//!   ifndef unlit_mode {
//!     colour = colour * max(dot(normalize(v_normal), vec3(0.0, 1.0, 0.0)), 0.2);
//!   }
//!
//!   FragColour = colour;
//! }
//! ```

use std::error::Error;
use std::fmt;

use crate::shader::define::DefineSet;
use crate::shader::lang::stream::TokenParser;
use crate::shader::lang::syntax::{
  AssignOp, BinaryOp, Block, DataType, Declaration, Expr, Stage, Statement, UnaryOp,
  VertexComponent,
};
use crate::shader::lang::token::{LexError, Token, TokenKind};
use crate::shader::program::ParsedProgram;

/// Identifiers that have a meaning of their own and cannot name anything.
const RESERVED: &[&str] = &[
  "uniform",
  "varying",
  "output",
  "vertex_layout",
  "vertex",
  "fragment",
  "ifdef",
  "ifndef",
  "else",
  "if",
  "discard",
  "return",
];

/// Deepest nesting of blocks, regions and sub-expressions accepted. Every operator of a chain of
/// binary operators counts as one level.
pub const MAX_NESTING: usize = 128;

/// Parse error. Every variant carries the line it was detected on.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseError {
  Lex(LexError),
  /// A token that doesn’t fit the grammar at this point.
  UnexpectedToken {
    line: usize,
    expected: String,
    found: String,
  },
  UnknownDataType { line: usize, name: String },
  /// Two uniforms share the same name.
  DuplicateUniform { line: usize, name: String },
  UnknownVertexComponent { line: usize, name: String },
  /// A name declared twice (varyings, outputs, vertex components).
  DuplicateDeclaration { line: usize, name: String },
  DuplicateVertexLayout { line: usize },
  DuplicateStage { line: usize, stage: Stage },
  /// Nesting deeper than [`MAX_NESTING`].
  TooDeep { line: usize },
}

impl ParseError {
  pub fn line(&self) -> usize {
    match *self {
      ParseError::Lex(ref err) => err.line,
      ParseError::UnexpectedToken { line, .. }
      | ParseError::UnknownDataType { line, .. }
      | ParseError::DuplicateUniform { line, .. }
      | ParseError::UnknownVertexComponent { line, .. }
      | ParseError::DuplicateDeclaration { line, .. }
      | ParseError::DuplicateVertexLayout { line }
      | ParseError::DuplicateStage { line, .. }
      | ParseError::TooDeep { line } => line,
    }
  }
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      ParseError::Lex(ref err) => err.fmt(f),

      ParseError::UnexpectedToken {
        line,
        ref expected,
        ref found,
      } => write!(f, "line {}: expected {}, found {}", line, expected, found),

      ParseError::UnknownDataType { line, ref name } => {
        write!(f, "line {}: unknown data type `{}`", line, name)
      }

      ParseError::DuplicateUniform { line, ref name } => {
        write!(f, "line {}: uniform `{}` is already declared", line, name)
      }

      ParseError::UnknownVertexComponent { line, ref name } => {
        write!(f, "line {}: unknown vertex component `{}`", line, name)
      }

      ParseError::DuplicateDeclaration { line, ref name } => {
        write!(f, "line {}: `{}` is already declared", line, name)
      }

      ParseError::DuplicateVertexLayout { line } => {
        write!(f, "line {}: vertex layout is already declared", line)
      }

      ParseError::DuplicateStage { line, stage } => {
        write!(f, "line {}: {} stage is already declared", line, stage)
      }

      ParseError::TooDeep { line } => write!(
        f,
        "line {}: nesting deeper than {} levels",
        line, MAX_NESTING
      ),
    }
  }
}

impl Error for ParseError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match *self {
      ParseError::Lex(ref err) => Some(err),
      _ => None,
    }
  }
}

impl From<LexError> for ParseError {
  fn from(err: LexError) -> Self {
    ParseError::Lex(err)
  }
}

type Result<T> = ::std::result::Result<T, ParseError>;

/// Parse a whole shader source under a define set.
pub fn parse_program<N>(name: N, source: &str, defines: &DefineSet) -> Result<ParsedProgram>
where N: Into<String> {
  let stream = TokenParser::new(source)?;
  let mut parser = Parser {
    stream,
    defines,
    program: ParsedProgram::new(name, defines.clone()),
    layout_declared: false,
    active: true,
    depth: 0,
  };

  while parser.stream.has_more() {
    parser.item()?;
  }

  Ok(parser.program)
}

struct Parser<'a> {
  stream: TokenParser,
  defines: &'a DefineSet,
  program: ParsedProgram,
  layout_declared: bool,
  // false while inside a conditional region that is not taken
  active: bool,
  depth: usize,
}

fn binary_op(token: &Token) -> Option<BinaryOp> {
  if token.kind != TokenKind::Operator {
    return None;
  }

  let op = match token.text.as_str() {
    "||" => BinaryOp::Or,
    "&&" => BinaryOp::And,
    "|" => BinaryOp::BitOr,
    "&" => BinaryOp::BitAnd,
    "==" => BinaryOp::Equal,
    "!=" => BinaryOp::NotEqual,
    "<" => BinaryOp::Lt,
    ">" => BinaryOp::Gt,
    "<=" => BinaryOp::Lte,
    ">=" => BinaryOp::Gte,
    "+" => BinaryOp::Add,
    "-" => BinaryOp::Sub,
    "*" => BinaryOp::Mul,
    "/" => BinaryOp::Div,
    _ => return None,
  };

  Some(op)
}

impl<'a> Parser<'a> {
  fn unexpected<T>(&self, expected: &str) -> Result<T> {
    let token = self.stream.current();

    Err(ParseError::UnexpectedToken {
      line: token.line,
      expected: expected.to_owned(),
      found: token.to_string(),
    })
  }

  fn line(&self) -> usize {
    self.stream.current().line
  }

  /// Run `f` one nesting level deeper.
  fn nested<T, F>(&mut self, f: F) -> Result<T>
  where F: FnOnce(&mut Self) -> Result<T> {
    if self.depth >= MAX_NESTING {
      return Err(ParseError::TooDeep { line: self.line() });
    }

    self.depth += 1;
    let r = f(self);
    self.depth -= 1;

    r
  }

  fn expect_operator(&mut self, op: &str) -> Result<()> {
    if self.stream.current().is_operator(op) {
      self.stream.advance();
      Ok(())
    } else {
      self.unexpected(&format!("`{}`", op))
    }
  }

  fn expect_identifier(&mut self, what: &str) -> Result<String> {
    let token = self.stream.current();

    if token.kind == TokenKind::Identifier && !RESERVED.contains(&token.text.as_str()) {
      let name = token.text.clone();
      self.stream.advance();
      Ok(name)
    } else {
      self.unexpected(what)
    }
  }

  fn is_conditional(&self) -> bool {
    let token = self.stream.current();
    token.is_identifier("ifdef") || token.is_identifier("ifndef")
  }

  fn data_type(&mut self) -> Result<DataType> {
    let token = self.stream.current();

    if token.kind != TokenKind::Identifier {
      return self.unexpected("a data type");
    }

    match DataType::from_keyword(&token.text) {
      Some(ty) => {
        self.stream.advance();
        Ok(ty)
      }

      None => Err(ParseError::UnknownDataType {
        line: token.line,
        name: token.text.clone(),
      }),
    }
  }

  /// `type name ;`
  fn declaration(&mut self) -> Result<(Declaration, usize)> {
    let ty = self.data_type()?;
    let line = self.line();
    let name = self.expect_identifier("a name")?;
    self.expect_operator(";")?;

    Ok((Declaration::new(ty, name), line))
  }

  // Items.

  fn item(&mut self) -> Result<()> {
    if self.is_conditional() {
      self.conditional(&mut |p: &mut Self| p.item().map(|_| Vec::<()>::new()))?;
      return Ok(());
    }

    let token = self.stream.current();

    if token.kind != TokenKind::Identifier {
      return self.unexpected("a declaration, a vertex layout or a stage");
    }

    match token.text.as_str() {
      "uniform" => {
        self.stream.advance();
        self.uniform()
      }

      "varying" => {
        self.stream.advance();
        let (decl, line) = self.declaration()?;
        self.declare(decl, line, |p| &mut p.varyings)
      }

      "output" => {
        self.stream.advance();
        let (decl, line) = self.declaration()?;
        self.declare(decl, line, |p| &mut p.outputs)
      }

      "vertex_layout" => self.vertex_layout(),
      "vertex" => self.stage(Stage::Vertex),
      "fragment" => self.stage(Stage::Fragment),
      _ => self.unexpected("a declaration, a vertex layout or a stage"),
    }
  }

  fn uniform(&mut self) -> Result<()> {
    let (decl, line) = self.declaration()?;

    if !self.active {
      return Ok(());
    }

    if self.program.uniform(&decl.name).is_some() {
      Err(ParseError::DuplicateUniform {
        line,
        name: decl.name,
      })
    } else if self.program.is_declared(&decl.name) {
      Err(ParseError::DuplicateDeclaration {
        line,
        name: decl.name,
      })
    } else {
      self.program.uniforms.push(decl);
      Ok(())
    }
  }

  fn declare<F>(&mut self, decl: Declaration, line: usize, list: F) -> Result<()>
  where F: FnOnce(&mut ParsedProgram) -> &mut Vec<Declaration> {
    if !self.active {
      return Ok(());
    }

    if self.program.is_declared(&decl.name) {
      Err(ParseError::DuplicateDeclaration {
        line,
        name: decl.name,
      })
    } else {
      list(&mut self.program).push(decl);
      Ok(())
    }
  }

  fn vertex_layout(&mut self) -> Result<()> {
    let line = self.line();
    self.stream.advance();
    self.expect_operator("{")?;

    let mut components = Vec::new();

    while !self.stream.current().is_operator("}") {
      let name_line = self.line();
      let name = self.expect_identifier("a vertex component")?;
      components.push((name, name_line));

      if !self.stream.current().is_operator("}") {
        self.expect_operator(",")?;
      }
    }

    self.stream.advance();

    if !self.active {
      return Ok(());
    }

    if self.layout_declared {
      return Err(ParseError::DuplicateVertexLayout { line });
    }

    for (name, line) in components {
      let component =
        VertexComponent::from_name(&name).ok_or(ParseError::UnknownVertexComponent {
          line,
          name: name.clone(),
        })?;

      // vertex components are global inputs in generated code
      if self.program.is_declared(&name) {
        return Err(ParseError::DuplicateDeclaration { line, name });
      }

      self.program.vertex_layout.components.push(component);
    }

    self.layout_declared = true;
    Ok(())
  }

  fn stage(&mut self, stage: Stage) -> Result<()> {
    let line = self.line();
    self.stream.advance();
    let body = self.block()?;

    if !self.active {
      return Ok(());
    }

    let slot = match stage {
      Stage::Vertex => &mut self.program.vertex,
      Stage::Fragment => &mut self.program.fragment,
    };

    if slot.is_some() {
      Err(ParseError::DuplicateStage { line, stage })
    } else {
      *slot = Some(body);
      Ok(())
    }
  }

  // Conditional regions.

  /// `ifdef KEY { … } [else { … } | else ifdef …]`, with `parse_one` parsing a single element of the
  /// region.
  fn conditional<T, F>(&mut self, parse_one: &mut F) -> Result<Vec<T>>
  where F: FnMut(&mut Self) -> Result<Vec<T>> {
    let negated = self.stream.current().is_identifier("ifndef");
    self.stream.advance();

    let key = self.expect_identifier("a define name")?;
    let taken = self.defines.is_defined(&key) != negated;
    let mut elements = self.region(taken, parse_one)?;

    if self.stream.current().is_identifier("else") {
      self.stream.advance();

      if self.is_conditional() {
        let was_active = self.active;
        self.active = was_active && !taken;
        let chained = self.nested(|p| p.conditional(parse_one));
        self.active = was_active;

        let chained = chained?;
        if !taken {
          elements.extend(chained);
        }
      } else {
        elements.extend(self.region(!taken, parse_one)?);
      }
    }

    Ok(elements)
  }

  fn region<T, F>(&mut self, taken: bool, parse_one: &mut F) -> Result<Vec<T>>
  where F: FnMut(&mut Self) -> Result<Vec<T>> {
    self.expect_operator("{")?;

    let was_active = self.active;
    self.active = was_active && taken;

    let mut elements = Vec::new();

    while !self.stream.current().is_operator("}") {
      if !self.stream.has_more() {
        return self.unexpected("`}`");
      }

      elements.extend(self.nested(|p| parse_one(p))?);
    }

    self.stream.advance();
    self.active = was_active;

    if taken {
      Ok(elements)
    } else {
      Ok(Vec::new())
    }
  }

  // Statements.

  fn block(&mut self) -> Result<Block> {
    self.nested(Self::braced_statements)
  }

  fn braced_statements(&mut self) -> Result<Block> {
    self.expect_operator("{")?;

    let mut block = Vec::new();

    while !self.stream.current().is_operator("}") {
      if !self.stream.has_more() {
        return self.unexpected("`}`");
      }

      block.extend(self.statement()?);
    }

    self.stream.advance();
    Ok(block)
  }

  /// Parse a statement. A conditional region yields all of its taken statements, flattened.
  fn statement(&mut self) -> Result<Vec<Statement>> {
    if self.is_conditional() {
      return self.conditional(&mut |p: &mut Self| p.statement());
    }

    let token = self.stream.current();

    if token.is_identifier("if") {
      return Ok(vec![self.if_statement()?]);
    }

    if token.is_identifier("discard") || token.is_identifier("return") {
      let st = if token.is_identifier("discard") {
        Statement::Discard
      } else {
        Statement::Return
      };

      self.stream.advance();
      self.expect_operator(";")?;
      return Ok(vec![st]);
    }

    if token.kind == TokenKind::Identifier
      && DataType::from_keyword(&token.text).is_some()
      && self.stream.peek(1).kind == TokenKind::Identifier
    {
      return Ok(vec![self.local()?]);
    }

    let target = self.expr()?;
    let token = self.stream.current();
    let assign = if token.kind == TokenKind::Operator {
      AssignOp::from_operator(&token.text)
    } else {
      None
    };

    match assign {
      Some(op) => {
        match target {
          Expr::Variable(_) | Expr::Field(..) | Expr::Index(..) => (),
          _ => return self.unexpected("`;`"),
        }

        self.stream.advance();
        let value = self.expr()?;
        self.expect_operator(";")?;
        Ok(vec![Statement::Assign(target, op, value)])
      }

      None => {
        self.expect_operator(";")?;
        Ok(vec![Statement::Expr(target)])
      }
    }
  }

  fn local(&mut self) -> Result<Statement> {
    let ty = self.data_type()?;
    let name = self.expect_identifier("a variable name")?;
    let init = if self.stream.current().is_operator("=") {
      self.stream.advance();
      Some(self.expr()?)
    } else {
      None
    };

    self.expect_operator(";")?;
    Ok(Statement::Local(Declaration::new(ty, name), init))
  }

  fn if_statement(&mut self) -> Result<Statement> {
    self.stream.advance();
    self.expect_operator("(")?;
    let cond = self.expr()?;
    self.expect_operator(")")?;
    let then = self.block()?;

    let otherwise = if self.stream.current().is_identifier("else") {
      self.stream.advance();

      if self.stream.current().is_identifier("if") {
        Some(vec![self.nested(Self::if_statement)?])
      } else {
        Some(self.block()?)
      }
    } else {
      None
    };

    Ok(Statement::If(cond, then, otherwise))
  }

  // Expressions.

  fn expr(&mut self) -> Result<Expr> {
    self.nested(Self::ternary)
  }

  fn ternary(&mut self) -> Result<Expr> {
    let cond = self.binary(1)?;

    if self.stream.current().is_operator("?") {
      self.stream.advance();
      let a = self.expr()?;
      self.expect_operator(":")?;
      let b = self.expr()?;

      Ok(Expr::Ternary(Box::new(cond), Box::new(a), Box::new(b)))
    } else {
      Ok(cond)
    }
  }

  /// Precedence climbing over left-associative binary operators.
  fn binary(&mut self, min_precedence: u8) -> Result<Expr> {
    let mut lhs = self.unary()?;
    let mut chained = 0;

    loop {
      let op = match binary_op(self.stream.current()) {
        Some(op) if op.precedence() >= min_precedence => op,
        _ => break,
      };

      // every operator makes the tree one level deeper
      chained += 1;
      if self.depth + chained > MAX_NESTING {
        return Err(ParseError::TooDeep { line: self.line() });
      }

      self.stream.advance();
      let rhs = self.binary(op.precedence() + 1)?;
      lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
    }

    Ok(lhs)
  }

  fn unary(&mut self) -> Result<Expr> {
    let op = if self.stream.current().is_operator("-") {
      Some(UnaryOp::Neg)
    } else if self.stream.current().is_operator("!") {
      Some(UnaryOp::Not)
    } else {
      None
    };

    match op {
      Some(op) => {
        self.stream.advance();
        Ok(Expr::Unary(op, Box::new(self.nested(Self::unary)?)))
      }

      None => self.postfix(),
    }
  }

  fn postfix(&mut self) -> Result<Expr> {
    let mut e = self.primary()?;

    loop {
      if self.stream.current().is_operator("(") {
        let name = match e {
          Expr::Variable(ref name) => name.clone(),
          _ => return self.unexpected("an operator"),
        };

        self.stream.advance();
        let args = self.arguments()?;
        e = Expr::Call(name, args);
      } else if self.stream.current().is_operator(".") {
        self.stream.advance();
        let field = self.expect_identifier("a field name")?;
        e = Expr::Field(Box::new(e), field);
      } else if self.stream.current().is_operator("[") {
        self.stream.advance();
        let index = self.expr()?;
        self.expect_operator("]")?;
        e = Expr::Index(Box::new(e), Box::new(index));
      } else {
        return Ok(e);
      }
    }
  }

  /// Arguments of a call, the opening parenthesis already consumed.
  fn arguments(&mut self) -> Result<Vec<Expr>> {
    let mut args = Vec::new();

    if self.stream.current().is_operator(")") {
      self.stream.advance();
      return Ok(args);
    }

    loop {
      args.push(self.expr()?);

      if self.stream.current().is_operator(",") {
        self.stream.advance();
      } else {
        self.expect_operator(")")?;
        return Ok(args);
      }
    }
  }

  fn primary(&mut self) -> Result<Expr> {
    let token = self.stream.current();

    let e = match token.kind {
      TokenKind::IntegerLiteral => Expr::Int(token.int_value),
      TokenKind::FloatLiteral => Expr::Float(token.float_value),
      TokenKind::BooleanLiteral => Expr::Bool(token.bool_value()),

      TokenKind::Identifier => {
        let is_type = DataType::from_keyword(&token.text).is_some();

        if RESERVED.contains(&token.text.as_str())
          || (is_type && !self.stream.peek(1).is_operator("("))
        {
          return self.unexpected("an expression");
        }

        Expr::Variable(token.text.clone())
      }

      TokenKind::Operator if token.is_operator("(") => {
        self.stream.advance();
        let e = self.expr()?;
        self.expect_operator(")")?;
        return Ok(e);
      }

      _ => return self.unexpected("an expression"),
    };

    self.stream.advance();
    Ok(e)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(src: &str) -> Result<ParsedProgram> {
    parse_program("test", src, &DefineSet::new())
  }

  fn parse_with(src: &str, defines: &DefineSet) -> Result<ParsedProgram> {
    parse_program("test", src, defines)
  }

  fn var(name: &str) -> Expr {
    Expr::Variable(name.to_owned())
  }

  #[test]
  fn uniforms_in_order() {
    let program = parse("uniform vec4 _colourDiffuse; uniform float _shininess;").unwrap();

    assert_eq!(
      program.uniforms,
      vec![
        Declaration::new(DataType::Vec4, "_colourDiffuse"),
        Declaration::new(DataType::Float, "_shininess"),
      ]
    );
  }

  #[test]
  fn duplicate_uniform() {
    let err = parse("uniform vec4 a;\nuniform float a;").unwrap_err();

    assert_eq!(
      err,
      ParseError::DuplicateUniform {
        line: 2,
        name: "a".to_owned()
      }
    );
  }

  #[test]
  fn uniform_clashing_with_varying() {
    let err = parse("varying vec3 n; uniform vec3 n;").unwrap_err();

    assert!(matches!(err, ParseError::DuplicateDeclaration { .. }));
  }

  #[test]
  fn duplicate_uniform_in_exclusive_branches() {
    let src = "ifdef hq { uniform vec4 c; } else { uniform vec3 c; }";
    let program = parse(src).unwrap();

    assert_eq!(program.uniforms, vec![Declaration::new(DataType::Vec3, "c")]);

    let program = parse_with(src, &DefineSet::new().with("hq")).unwrap();
    assert_eq!(program.uniforms, vec![Declaration::new(DataType::Vec4, "c")]);
  }

  #[test]
  fn unknown_data_type() {
    let err = parse("uniform vec5 a;").unwrap_err();

    assert_eq!(
      err,
      ParseError::UnknownDataType {
        line: 1,
        name: "vec5".to_owned()
      }
    );
  }

  #[test]
  fn vertex_layout_in_order() {
    let program = parse("vertex_layout { Position, Normal, TexCoord, }").unwrap();

    assert_eq!(
      program.vertex_layout.components,
      vec![
        VertexComponent::Position,
        VertexComponent::Normal,
        VertexComponent::TexCoord
      ]
    );
  }

  #[test]
  fn unknown_vertex_component() {
    let err = parse("vertex_layout {\n Position,\n Colour,\n Weight\n}").unwrap_err();

    assert_eq!(
      err,
      ParseError::UnknownVertexComponent {
        line: 4,
        name: "Weight".to_owned()
      }
    );
  }

  #[test]
  fn unknown_vertex_component_in_dead_region() {
    let program = parse("ifdef skinned { vertex_layout { Weight } }").unwrap();

    assert!(program.vertex_layout.is_empty());
  }

  #[test]
  fn duplicate_vertex_layout() {
    let err = parse("vertex_layout { Position }\nvertex_layout { Normal }").unwrap_err();

    assert_eq!(err, ParseError::DuplicateVertexLayout { line: 2 });
  }

  #[test]
  fn duplicate_stage() {
    let err = parse("vertex { }\nvertex { }").unwrap_err();

    assert_eq!(
      err,
      ParseError::DuplicateStage {
        line: 2,
        stage: Stage::Vertex
      }
    );
  }

  #[test]
  fn conditional_statements_are_flattened() {
    let src = "fragment { a = 1; ifdef x { b = 2; c = 3; } else { d = 4; } e = 5; }";

    let with = parse_with(src, &DefineSet::new().with("x")).unwrap();
    let without = parse(src).unwrap();

    let targets = |p: &ParsedProgram| -> Vec<Expr> {
      p.fragment
        .as_ref()
        .unwrap()
        .iter()
        .map(|st| match *st {
          Statement::Assign(ref t, ..) => t.clone(),
          _ => panic!("unexpected statement"),
        })
        .collect()
    };

    assert_eq!(targets(&with), vec![var("a"), var("b"), var("c"), var("e")]);
    assert_eq!(targets(&without), vec![var("a"), var("d"), var("e")]);
  }

  #[test]
  fn ifndef_and_chained_else() {
    let src = "fragment { ifdef a { x = 1; } else ifdef b { x = 2; } else { x = 3; } \
               ifndef a { y = 1; } }";

    let count = |defines: DefineSet| -> Vec<Statement> {
      parse_with(src, &defines).unwrap().fragment.unwrap()
    };

    let assign = |name: &str, v: i32| Statement::Assign(var(name), AssignOp::Assign, Expr::Int(v));

    assert_eq!(
      count(DefineSet::new().with("a").with("b")),
      vec![assign("x", 1)]
    );
    assert_eq!(
      count(DefineSet::new().with("b")),
      vec![assign("x", 2), assign("y", 1)]
    );
    assert_eq!(count(DefineSet::new()), vec![assign("x", 3), assign("y", 1)]);
  }

  #[test]
  fn nested_regions() {
    let src = "ifdef a { ifdef b { uniform float ab; } uniform float a_only; }";

    let p = parse_with(src, &DefineSet::new().with("b")).unwrap();
    assert!(p.uniforms.is_empty());

    let p = parse_with(src, &DefineSet::new().with("a").with("b")).unwrap();
    assert_eq!(p.uniforms.len(), 2);

    let p = parse_with(src, &DefineSet::new().with("a")).unwrap();
    assert_eq!(p.uniforms, vec![Declaration::new(DataType::Float, "a_only")]);
  }

  #[test]
  fn dead_regions_are_still_checked() {
    let err = parse("ifdef never { uniform float ; }").unwrap_err();

    assert!(matches!(err, ParseError::UnexpectedToken { .. }));
  }

  #[test]
  fn precedence() {
    let p = parse("vertex { x = a + b * c - d; }").unwrap();
    let expected = Expr::Binary(
      BinaryOp::Sub,
      Box::new(Expr::Binary(
        BinaryOp::Add,
        Box::new(var("a")),
        Box::new(Expr::Binary(
          BinaryOp::Mul,
          Box::new(var("b")),
          Box::new(var("c")),
        )),
      )),
      Box::new(var("d")),
    );

    assert_eq!(
      p.vertex.unwrap(),
      vec![Statement::Assign(var("x"), AssignOp::Assign, expected)]
    );
  }

  #[test]
  fn calls_fields_and_indices() {
    let p = parse("fragment { vec3 n = normalize(v[0].xyz); }").unwrap();
    let init = Expr::Call(
      "normalize".to_owned(),
      vec![Expr::Field(
        Box::new(Expr::Index(Box::new(var("v")), Box::new(Expr::Int(0)))),
        "xyz".to_owned(),
      )],
    );

    assert_eq!(
      p.fragment.unwrap(),
      vec![Statement::Local(
        Declaration::new(DataType::Vec3, "n"),
        Some(init)
      )]
    );
  }

  #[test]
  fn constructor_call_is_an_expression() {
    let p = parse("vertex { gl_Position = vec4(Position, 1.0); }").unwrap();

    match p.vertex.unwrap()[0] {
      Statement::Assign(_, AssignOp::Assign, Expr::Call(ref f, ref args)) => {
        assert_eq!(f, "vec4");
        assert_eq!(args.len(), 2);
      }
      ref st => panic!("unexpected statement {:?}", st),
    }
  }

  #[test]
  fn unary_ternary_and_if() {
    let p = parse(
      "fragment { if (!lit && k >= 0.5) { discard; } else if (k == 0) { return; } \
       c *= lit ? -k : 1.0; }",
    )
    .unwrap();
    let body = p.fragment.unwrap();

    assert_eq!(body.len(), 2);
    assert!(matches!(body[0], Statement::If(_, _, Some(_))));
    assert!(matches!(body[1], Statement::Assign(_, AssignOp::Mul, Expr::Ternary(..))));
  }

  #[test]
  fn invalid_assignment_target() {
    assert!(parse("vertex { a + b = c; }").is_err());
  }

  #[test]
  fn missing_semicolon_reports_line() {
    let err = parse("vertex {\n  a = b\n}").unwrap_err();

    assert_eq!(err.line(), 3);
  }

  #[test]
  fn unterminated_block() {
    let err = parse("vertex { a = b;").unwrap_err();

    assert!(matches!(err, ParseError::UnexpectedToken { .. }));
  }

  #[test]
  fn lexical_errors_are_parse_errors() {
    let err = parse("uniform float a; $").unwrap_err();

    assert!(matches!(err, ParseError::Lex(_)));
    assert_eq!(err.line(), 1);
  }

  #[test]
  fn errors_display_their_line() {
    let err = parse("uniform vec4 a;\nuniform float a;").unwrap_err();

    assert_eq!(err.to_string(), "line 2: uniform `a` is already declared");
    assert_eq!(
      ParseError::DuplicateStage {
        line: 7,
        stage: Stage::Fragment
      }
      .to_string(),
      "line 7: fragment stage is already declared"
    );
  }

  #[test]
  fn vertex_components_clash_with_declarations() {
    let clash = |src: &str, line: usize, name: &str| {
      assert_eq!(
        parse(src).map(|_| ()),
        Err(ParseError::DuplicateDeclaration {
          line,
          name: name.to_owned()
        }),
        "source: {}",
        src
      );
    };

    clash("uniform vec3 Normal;\nvertex_layout { Position, Normal }", 2, "Normal");
    clash("vertex_layout { Position, Normal }\nvarying vec3 Position;", 2, "Position");
    clash("vertex_layout { TexCoord }\noutput vec2 TexCoord;", 2, "TexCoord");
    clash("vertex_layout { Colour }\nuniform vec4 Colour;", 2, "Colour");
    clash("vertex_layout {\n Position,\n Position\n}", 3, "Position");

    // a dead region declares nothing
    assert!(parse("ifdef never { vertex_layout { Normal } } uniform vec3 Normal;").is_ok());
  }

  #[test]
  fn deep_nesting_is_an_error() {
    let deep = |src: String| match parse(&src) {
      Err(ParseError::TooDeep { .. }) => (),
      r => panic!("expected a nesting error, got {:?}", r.map(|p| p.name)),
    };
    let n = 100_000;

    deep(format!("vertex {{ x = {}1; }}", "- ".repeat(n)));
    deep(format!("vertex {{ x = {}1{}; }}", "(".repeat(n), ")".repeat(n)));
    deep(format!("vertex {{ x = 1{}; }}", " + 1".repeat(n)));
    deep(format!("vertex {{ {}{} }}", "if (a) { ".repeat(n), "}".repeat(n)));
    deep(format!("{}{}", "ifdef a { ".repeat(n), "}".repeat(n)));

    let err = parse(&format!("vertex {{\n x = {}1; }}", "!".repeat(n))).unwrap_err();
    assert_eq!(err.line(), 2);
  }

  #[test]
  fn reasonable_nesting_is_fine() {
    let src = format!(
      "vertex {{ x = {}a{} + -(-(b)) * c[d[0]]; }} fragment {{ }}",
      "(".repeat(20),
      ")".repeat(20)
    );

    assert!(parse(&src).is_ok());
  }

  #[test]
  fn reserved_words_are_not_names() {
    assert!(parse("uniform float vertex;").is_err());
    assert!(parse("fragment { x = uniform; }").is_err());
  }
}
