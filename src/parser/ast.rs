//! AST (Abstract Syntax Tree) definitions
//!
//! Every syntactic form is one variant of the closed [`NodeKind`] enum, wrapped
//! in an [`AstNode`] that carries a parser-assigned [`NodeId`] and the [`Span`]
//! of source text it covers. The evaluator dispatches on `NodeKind` with a
//! single exhaustive `match`, and the step recorder uses the id and span to
//! attribute each step to the code that produced it.
//!
//! All node types implement [`Display`](fmt::Display) as a canonical,
//! fully-parenthesised rendering, which is what the parser tests compare
//! against to check precedence and associativity.

use crate::memory::value::format_float;
use std::fmt;
use std::rc::Rc;

/// Unique identifier for AST nodes, used for tracking execution position
pub type NodeId = usize;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord, Hash)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open source range: `end` points just past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Span {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Whether `line` falls inside this span
    pub fn covers_line(&self, line: usize) -> bool {
        self.start.line <= line && line <= self.end.line
    }
}

/// Identity of a visited node as seen by tracers and step records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub kind: &'static str,
    pub span: Span,
}

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Neg, // -x
    Not, // !x
}

/// Arithmetic and comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Short-circuiting operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

impl PrefixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::Neg => "-",
            PrefixOp::Not => "!",
        }
    }
}

impl InfixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::FloorDiv => "//",
            InfixOp::Mod => "%",
            InfixOp::Eq => "==",
            InfixOp::Ne => "!=",
            InfixOp::Lt => "<",
            InfixOp::Le => "<=",
            InfixOp::Gt => ">",
            InfixOp::Ge => ">=",
        }
    }
}

impl LogicalOp {
    pub fn symbol(self) -> &'static str {
        match self {
            LogicalOp::And => "&&",
            LogicalOp::Or => "||",
        }
    }
}

/// Function literal or declaration; shared by every closure created from it
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: AstNode,
}

/// `let`/`const` field inside a class body
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub constant: bool,
    pub init: Option<AstNode>,
    pub span: Span,
}

/// Class declaration with optional single parent
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub parent: Option<String>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<Rc<FunctionDecl>>,
}

/// Segment of an `f"..."` template string
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Text(String),
    Expr(AstNode),
}

/// One node of the syntax tree
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode {
    pub id: NodeId,
    pub span: Span,
    pub kind: NodeKind,
}

/// AST node variants representing statements and expressions
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // Expressions
    Identifier(String),
    Integer(i64),
    Float(f64),
    Str(String),
    Template(Vec<TemplatePart>),
    Boolean(bool),
    Null,
    Array(Vec<AstNode>),
    Hash(Vec<(AstNode, AstNode)>),
    Prefix {
        op: PrefixOp,
        operand: Box<AstNode>,
    },
    Infix {
        op: InfixOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Logical {
        op: LogicalOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Assign {
        target: Box<AstNode>,
        value: Box<AstNode>,
    },
    CompoundAssign {
        op: InfixOp,
        target: Box<AstNode>,
        value: Box<AstNode>,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
    },
    Index {
        target: Box<AstNode>,
        index: Box<AstNode>,
    },
    Property {
        object: Box<AstNode>,
        name: String,
    },
    Function(Rc<FunctionDecl>),
    This,
    Super,
    New {
        class: Box<AstNode>,
        args: Vec<AstNode>,
    },

    // Statements
    Let {
        name: String,
        value: Option<Box<AstNode>>,
    },
    Const {
        name: String,
        value: Box<AstNode>,
    },
    Return(Option<Box<AstNode>>),
    Break,
    Continue,
    Expression(Box<AstNode>),
    Block(Vec<AstNode>),
    If {
        condition: Box<AstNode>,
        consequence: Box<AstNode>,
        /// Either a `Block` (`else`) or another `If` (`elif`)
        alternative: Option<Box<AstNode>>,
    },
    While {
        condition: Box<AstNode>,
        body: Box<AstNode>,
    },
    For {
        init: Option<Box<AstNode>>,
        condition: Option<Box<AstNode>>,
        update: Option<Box<AstNode>>,
        body: Box<AstNode>,
    },
    FunctionDecl(Rc<FunctionDecl>),
    Class(Rc<ClassDecl>),
}

impl NodeKind {
    /// Human-readable label used in step records
    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::Integer(_) => "IntegerLiteral",
            NodeKind::Float(_) => "FloatLiteral",
            NodeKind::Str(_) => "StringLiteral",
            NodeKind::Template(_) => "TemplateString",
            NodeKind::Boolean(_) => "BooleanLiteral",
            NodeKind::Null => "NullLiteral",
            NodeKind::Array(_) => "ArrayLiteral",
            NodeKind::Hash(_) => "HashLiteral",
            NodeKind::Prefix { .. } => "PrefixExpression",
            NodeKind::Infix { .. } => "InfixExpression",
            NodeKind::Logical { .. } => "LogicalExpression",
            NodeKind::Assign { .. } => "Assignment",
            NodeKind::CompoundAssign { .. } => "CompoundAssignment",
            NodeKind::Call { .. } => "CallExpression",
            NodeKind::Index { .. } => "IndexExpression",
            NodeKind::Property { .. } => "PropertyAccess",
            NodeKind::Function(_) => "FunctionLiteral",
            NodeKind::This => "This",
            NodeKind::Super => "Super",
            NodeKind::New { .. } => "NewExpression",
            NodeKind::Let { .. } => "LetStatement",
            NodeKind::Const { .. } => "ConstStatement",
            NodeKind::Return(_) => "ReturnStatement",
            NodeKind::Break => "BreakStatement",
            NodeKind::Continue => "ContinueStatement",
            NodeKind::Expression(_) => "ExpressionStatement",
            NodeKind::Block(_) => "Block",
            NodeKind::If { .. } => "IfStatement",
            NodeKind::While { .. } => "WhileStatement",
            NodeKind::For { .. } => "ForStatement",
            NodeKind::FunctionDecl(_) => "FunctionDeclaration",
            NodeKind::Class(_) => "ClassDeclaration",
        }
    }
}

impl AstNode {
    pub fn new(id: NodeId, span: Span, kind: NodeKind) -> Self {
        AstNode { id, span, kind }
    }

    pub fn info(&self) -> NodeInfo {
        NodeInfo {
            id: self.id,
            kind: self.kind.label(),
            span: self.span,
        }
    }

    /// Whether this node may appear on the left of `=`
    pub fn is_assignable(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Identifier(_) | NodeKind::Index { .. } | NodeKind::Property { .. }
        )
    }

    /// Number of nodes in this subtree, counting this one
    pub fn count_nodes(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    /// Pre-order traversal over this node and every descendant
    pub fn walk(&self, visit: &mut dyn FnMut(&AstNode)) {
        visit(self);
        match &self.kind {
            NodeKind::Identifier(_)
            | NodeKind::Integer(_)
            | NodeKind::Float(_)
            | NodeKind::Str(_)
            | NodeKind::Boolean(_)
            | NodeKind::Null
            | NodeKind::This
            | NodeKind::Super
            | NodeKind::Break
            | NodeKind::Continue => {}
            NodeKind::Template(parts) => {
                for part in parts {
                    if let TemplatePart::Expr(expr) = part {
                        expr.walk(visit);
                    }
                }
            }
            NodeKind::Array(items) | NodeKind::Block(items) => {
                for item in items {
                    item.walk(visit);
                }
            }
            NodeKind::Hash(pairs) => {
                for (key, value) in pairs {
                    key.walk(visit);
                    value.walk(visit);
                }
            }
            NodeKind::Prefix { operand, .. } => operand.walk(visit),
            NodeKind::Infix { left, right, .. } | NodeKind::Logical { left, right, .. } => {
                left.walk(visit);
                right.walk(visit);
            }
            NodeKind::Assign { target, value } | NodeKind::CompoundAssign { target, value, .. } => {
                target.walk(visit);
                value.walk(visit);
            }
            NodeKind::Call { callee, args } => {
                callee.walk(visit);
                for arg in args {
                    arg.walk(visit);
                }
            }
            NodeKind::New { class, args } => {
                class.walk(visit);
                for arg in args {
                    arg.walk(visit);
                }
            }
            NodeKind::Index { target, index } => {
                target.walk(visit);
                index.walk(visit);
            }
            NodeKind::Property { object, .. } => object.walk(visit),
            NodeKind::Function(decl) | NodeKind::FunctionDecl(decl) => decl.body.walk(visit),
            NodeKind::Let { value, .. } => {
                if let Some(value) = value {
                    value.walk(visit);
                }
            }
            NodeKind::Const { value, .. } => value.walk(visit),
            NodeKind::Return(value) => {
                if let Some(value) = value {
                    value.walk(visit);
                }
            }
            NodeKind::Expression(expr) => expr.walk(visit),
            NodeKind::If {
                condition,
                consequence,
                alternative,
            } => {
                condition.walk(visit);
                consequence.walk(visit);
                if let Some(alt) = alternative {
                    alt.walk(visit);
                }
            }
            NodeKind::While { condition, body } => {
                condition.walk(visit);
                body.walk(visit);
            }
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => {
                for clause in [init, condition, update].into_iter().flatten() {
                    clause.walk(visit);
                }
                body.walk(visit);
            }
            NodeKind::Class(decl) => {
                for field in &decl.fields {
                    if let Some(init) = &field.init {
                        init.walk(visit);
                    }
                }
                for method in &decl.methods {
                    method.body.walk(visit);
                }
            }
        }
    }
}

fn join(nodes: &[AstNode]) -> String {
    nodes
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for ch in text.chars() {
        match ch {
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            '\r' => f.write_str("\\r")?,
            '\0' => f.write_str("\\0")?,
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            _ => write!(f, "{}", ch)?,
        }
    }
    Ok(())
}

impl fmt::Display for FunctionDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "fn {}({}) {}", name, self.params.join(", "), self.body),
            None => write!(f, "fn({}) {}", self.params.join(", "), self.body),
        }
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Identifier(name) => write!(f, "{}", name),
            NodeKind::Integer(n) => write!(f, "{}", n),
            NodeKind::Float(x) => write!(f, "{}", format_float(*x)),
            NodeKind::Str(s) => {
                f.write_str("\"")?;
                write_escaped(f, s)?;
                f.write_str("\"")
            }
            NodeKind::Template(parts) => {
                f.write_str("f\"")?;
                for part in parts {
                    match part {
                        TemplatePart::Text(text) => write_escaped(f, text)?,
                        TemplatePart::Expr(expr) => write!(f, "{{{}}}", expr)?,
                    }
                }
                f.write_str("\"")
            }
            NodeKind::Boolean(b) => write!(f, "{}", b),
            NodeKind::Null => write!(f, "null"),
            NodeKind::Array(items) => write!(f, "[{}]", join(items)),
            NodeKind::Hash(pairs) => {
                let rendered: Vec<String> =
                    pairs.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            NodeKind::Prefix { op, operand } => write!(f, "({}{})", op.symbol(), operand),
            NodeKind::Infix { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            NodeKind::Logical { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            NodeKind::Assign { target, value } => write!(f, "{} = {}", target, value),
            NodeKind::CompoundAssign { op, target, value } => {
                write!(f, "{} {}= {}", target, op.symbol(), value)
            }
            NodeKind::Call { callee, args } => write!(f, "{}({})", callee, join(args)),
            NodeKind::Index { target, index } => write!(f, "({}[{}])", target, index),
            NodeKind::Property { object, name } => write!(f, "{}.{}", object, name),
            NodeKind::Function(decl) => write!(f, "{}", decl),
            NodeKind::This => write!(f, "this"),
            NodeKind::Super => write!(f, "super"),
            NodeKind::New { class, args } => write!(f, "new {}({})", class, join(args)),
            NodeKind::Let { name, value } => match value {
                Some(value) => write!(f, "let {} = {};", name, value),
                None => write!(f, "let {};", name),
            },
            NodeKind::Const { name, value } => write!(f, "const {} = {};", name, value),
            NodeKind::Return(value) => match value {
                Some(value) => write!(f, "return {};", value),
                None => write!(f, "return;"),
            },
            NodeKind::Break => write!(f, "break;"),
            NodeKind::Continue => write!(f, "continue;"),
            NodeKind::Expression(expr) => write!(f, "{}", expr),
            NodeKind::Block(statements) => {
                f.write_str("{ ")?;
                for stmt in statements {
                    write!(f, "{} ", stmt)?;
                }
                f.write_str("}")
            }
            NodeKind::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if ({}) {}", condition, consequence)?;
                match alternative.as_deref() {
                    // `elif` chains are stored as nested ifs
                    Some(nested) if matches!(nested.kind, NodeKind::If { .. }) => {
                        write!(f, " el{}", nested)
                    }
                    Some(block) => write!(f, " else {}", block),
                    None => Ok(()),
                }
            }
            NodeKind::While { condition, body } => write!(f, "while ({}) {}", condition, body),
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => {
                let render = |clause: &Option<Box<AstNode>>| {
                    clause
                        .as_ref()
                        .map(|c| c.to_string().trim_end_matches(';').to_string())
                        .unwrap_or_default()
                };
                write!(
                    f,
                    "for ({}; {}; {}) {}",
                    render(init),
                    render(condition),
                    render(update),
                    body
                )
            }
            NodeKind::FunctionDecl(decl) => write!(f, "{}", decl),
            NodeKind::Class(decl) => {
                write!(f, "class {}", decl.name)?;
                if let Some(parent) = &decl.parent {
                    write!(f, " extends {}", parent)?;
                }
                f.write_str(" { ")?;
                for field in &decl.fields {
                    let keyword = if field.constant { "const" } else { "let" };
                    match &field.init {
                        Some(init) => write!(f, "{} {} = {}; ", keyword, field.name, init)?,
                        None => write!(f, "{} {}; ", keyword, field.name)?,
                    }
                }
                for method in &decl.methods {
                    write!(f, "{} ", method)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Top-level program structure
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub id: NodeId,
    pub span: Span,
    pub statements: Vec<AstNode>,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn info(&self) -> NodeInfo {
        NodeInfo {
            id: self.id,
            kind: "Program",
            span: self.span,
        }
    }

    /// Total node count including the program root
    pub fn count_nodes(&self) -> usize {
        1 + self.statements.iter().map(AstNode::count_nodes).sum::<usize>()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.statements.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", rendered.join(" "))
    }
}
