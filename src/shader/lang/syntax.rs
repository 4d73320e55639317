//! Syntax of the language.
//!
//! Declarations are fully typed; stage bodies are kept as a light statement / expression tree
//! that writers re-emit without evaluating anything.

use std::fmt;

/// Semantic data type of a declaration.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DataType {
  Float,
  Int,
  Bool,
  Vec2,
  Vec3,
  Vec4,
  Mat3x3,
  Mat4x4,
  Texture2D,
}

impl DataType {
  /// Get the data type named by a keyword, if any.
  pub fn from_keyword(keyword: &str) -> Option<Self> {
    match keyword {
      "float" => Some(DataType::Float),
      "int" => Some(DataType::Int),
      "bool" => Some(DataType::Bool),
      "vec2" => Some(DataType::Vec2),
      "vec3" => Some(DataType::Vec3),
      "vec4" => Some(DataType::Vec4),
      "mat3" => Some(DataType::Mat3x3),
      "mat4" => Some(DataType::Mat4x4),
      "texture2D" => Some(DataType::Texture2D),
      _ => None,
    }
  }

  /// Keyword naming this type in shader sources.
  pub fn keyword(self) -> &'static str {
    match self {
      DataType::Float => "float",
      DataType::Int => "int",
      DataType::Bool => "bool",
      DataType::Vec2 => "vec2",
      DataType::Vec3 => "vec3",
      DataType::Vec4 => "vec4",
      DataType::Mat3x3 => "mat3",
      DataType::Mat4x4 => "mat4",
      DataType::Texture2D => "texture2D",
    }
  }
}

impl fmt::Display for DataType {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    f.write_str(self.keyword())
  }
}

/// Semantic per-vertex attribute.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum VertexComponent {
  Position,
  Normal,
  TexCoord,
  Colour,
  Tangent,
  Bitangent,
}

impl VertexComponent {
  pub fn from_name(name: &str) -> Option<Self> {
    match name {
      "Position" => Some(VertexComponent::Position),
      "Normal" => Some(VertexComponent::Normal),
      "TexCoord" => Some(VertexComponent::TexCoord),
      "Colour" => Some(VertexComponent::Colour),
      "Tangent" => Some(VertexComponent::Tangent),
      "Bitangent" => Some(VertexComponent::Bitangent),
      _ => None,
    }
  }

  /// Name of the component, which is also the name of the vertex input in generated code.
  pub fn name(self) -> &'static str {
    match self {
      VertexComponent::Position => "Position",
      VertexComponent::Normal => "Normal",
      VertexComponent::TexCoord => "TexCoord",
      VertexComponent::Colour => "Colour",
      VertexComponent::Tangent => "Tangent",
      VertexComponent::Bitangent => "Bitangent",
    }
  }

  pub fn data_type(self) -> DataType {
    match self {
      VertexComponent::TexCoord => DataType::Vec2,
      VertexComponent::Colour => DataType::Vec4,
      _ => DataType::Vec3,
    }
  }

  /// Size in bytes of the component in an interleaved vertex buffer.
  pub fn size(self) -> usize {
    let floats = match self.data_type() {
      DataType::Vec2 => 2,
      DataType::Vec4 => 4,
      _ => 3,
    };

    floats * 4
  }
}

/// Ordered list of vertex components.
///
/// The order gives both the byte offsets in the interleaved vertex buffer and the attribute
/// locations in generated shaders.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VertexLayout {
  pub components: Vec<VertexComponent>,
}

impl VertexLayout {
  pub fn new(components: Vec<VertexComponent>) -> Self {
    VertexLayout { components }
  }

  /// Size in bytes of a whole vertex.
  pub fn vertex_size(&self) -> usize {
    self.components.iter().map(|c| c.size()).sum()
  }

  /// Byte offset of each component, in declaration order.
  pub fn offsets(&self) -> Vec<usize> {
    let mut offset = 0;

    self
      .components
      .iter()
      .map(|c| {
        let o = offset;
        offset += c.size();
        o
      })
      .collect()
  }

  pub fn is_empty(&self) -> bool {
    self.components.is_empty()
  }
}

/// Shader stage.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Stage {
  Vertex,
  Fragment,
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
    match *self {
      Stage::Vertex => f.write_str("vertex"),
      Stage::Fragment => f.write_str("fragment"),
    }
  }
}

/// A typed, named declaration (uniform, varying, output or local).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Declaration {
  pub ty: DataType,
  pub name: String,
}

impl Declaration {
  pub fn new<N>(ty: DataType, name: N) -> Self
  where N: Into<String> {
    Declaration {
      ty,
      name: name.into(),
    }
  }
}

/// A block of statements.
pub type Block = Vec<Statement>;

#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
  /// `type name [= init];`
  Local(Declaration, Option<Expr>),
  /// `target op value;`
  Assign(Expr, AssignOp, Expr),
  /// `expr;`
  Expr(Expr),
  /// `if (cond) { … } [else { … }]`
  If(Expr, Block, Option<Block>),
  Discard,
  Return,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AssignOp {
  Assign,
  Add,
  Mul,
  Div,
  And,
  Or,
}

impl AssignOp {
  pub fn from_operator(op: &str) -> Option<Self> {
    match op {
      "=" => Some(AssignOp::Assign),
      "+=" => Some(AssignOp::Add),
      "*=" => Some(AssignOp::Mul),
      "/=" => Some(AssignOp::Div),
      "&=" => Some(AssignOp::And),
      "|=" => Some(AssignOp::Or),
      _ => None,
    }
  }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnaryOp {
  Neg,
  Not,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryOp {
  Or,
  And,
  BitOr,
  BitAnd,
  Equal,
  NotEqual,
  Lt,
  Gt,
  Lte,
  Gte,
  Add,
  Sub,
  Mul,
  Div,
}

impl BinaryOp {
  /// Binding power; higher binds tighter.
  pub fn precedence(self) -> u8 {
    match self {
      BinaryOp::Or => 1,
      BinaryOp::And => 2,
      BinaryOp::BitOr => 3,
      BinaryOp::BitAnd => 4,
      BinaryOp::Equal | BinaryOp::NotEqual => 5,
      BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Lte | BinaryOp::Gte => 6,
      BinaryOp::Add | BinaryOp::Sub => 7,
      BinaryOp::Mul | BinaryOp::Div => 8,
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
  Int(i32),
  Float(f32),
  Bool(bool),
  Variable(String),
  Unary(UnaryOp, Box<Expr>),
  Binary(BinaryOp, Box<Expr>, Box<Expr>),
  /// `cond ? a : b`
  Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
  /// Function or constructor call, like `normalize(n)` or `vec4(p, 1.0)`.
  Call(String, Vec<Expr>),
  /// `e.field`
  Field(Box<Expr>, String),
  /// `e[i]`
  Index(Box<Expr>, Box<Expr>),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn keywords_round_trip() {
    for ty in &[
      DataType::Float,
      DataType::Int,
      DataType::Bool,
      DataType::Vec2,
      DataType::Vec3,
      DataType::Vec4,
      DataType::Mat3x3,
      DataType::Mat4x4,
      DataType::Texture2D,
    ] {
      assert_eq!(DataType::from_keyword(ty.keyword()), Some(*ty));
    }

    assert_eq!(DataType::from_keyword("vec5"), None);
  }

  #[test]
  fn layout_offsets() {
    let layout = VertexLayout::new(vec![
      VertexComponent::Position,
      VertexComponent::Normal,
      VertexComponent::TexCoord,
    ]);

    assert_eq!(layout.offsets(), vec![0, 12, 24]);
    assert_eq!(layout.vertex_size(), 32);
  }

  #[test]
  fn unknown_component() {
    assert_eq!(VertexComponent::from_name("Colour"), Some(VertexComponent::Colour));
    assert_eq!(VertexComponent::from_name("Color"), None);
  }
}
