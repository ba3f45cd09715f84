// src/ast.rs
//
// AST node types produced by the parser and consumed by the semantic core.

use brim_identity::{Span, Symbol};

/// Unique identifier for AST nodes (expressions and loops)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a NodeId from a raw index. Only the parser and AST transforms should use this.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> u32 {
        self.0
    }

    #[cfg(any(test, feature = "testing"))]
    pub fn new_for_test(index: u32) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Hands out fresh node ids. Transforms continue from `Program::next_node_id`.
#[derive(Debug, Clone)]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// One past the highest id handed out so far.
    pub fn peek(&self) -> u32 {
        self.next
    }
}

/// A complete program: every source file of the compilation unit, in order.
#[derive(Debug, Clone)]
pub struct Program {
    pub files: Vec<SourceFile>,
    /// The next available node ID (one past the highest ID used).
    pub next_node_id: u32,
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub declarations: Vec<Decl>,
    /// Top-level code, executed in order before the entry point.
    pub statements: Vec<Stmt>,
}

/// Top-level declarations
#[derive(Debug, Clone)]
pub enum Decl {
    Struct(StructDecl),
    Class(ClassDecl),
    Enum(EnumDecl),
    Function(FuncDecl),
    Operator(OperatorDecl),
    Macro(MacroDecl),
    Global(VarStmt),
}

/// `[Name("arg", ...)]` attached to a declaration
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: Symbol,
    pub args: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeParam {
    pub name: Symbol,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Members shared by structs and classes
#[derive(Debug, Clone, Default)]
pub struct TypeMembers {
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<FuncDecl>,
    pub constructors: Vec<ConstructorDecl>,
    /// Destructor, clone and indexers, identified by name
    pub general_functions: Vec<FuncDecl>,
}

/// Stack-allocated value type with packed layout
#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: Symbol,
    pub type_params: Vec<TypeParam>,
    pub members: TypeMembers,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

/// Heap-allocated reference type
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: Symbol,
    pub type_params: Vec<TypeParam>,
    pub members: TypeMembers,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumMember {
    pub name: Symbol,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: Symbol,
    pub members: Vec<EnumMember>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamModifier {
    Ref,
    Temp,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub modifier: Option<ParamModifier>,
    pub span: Span,
}

/// Function or method declaration. `body` is `None` for `[External]` functions.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    pub name: Symbol,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Option<Block>,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    Binary(BinaryOp),
    Unary(UnaryOp),
}

#[derive(Debug, Clone)]
pub struct OperatorDecl {
    pub op: OperatorKind,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Block,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ConstructorDecl {
    pub params: Vec<Param>,
    pub body: Block,
    pub attributes: Vec<Attribute>,
    pub span: Span,
}

/// Untyped macro: parameters are substituted syntactically at each call site.
#[derive(Debug, Clone)]
pub struct MacroDecl {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub body: Block,
    pub span: Span,
}

/// Type expression (type annotations)
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// `int`, `Vec2`, `List<int>`, `func<int, float>`
    Named { name: Symbol, args: Vec<TypeExpr> },
    /// `T*`
    Pointer(Box<TypeExpr>),
    /// `T[expr]`, size evaluated at compile time
    StackArray {
        element: Box<TypeExpr>,
        size: Box<Expr>,
    },
}

/// Block of statements
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

/// Statements
#[derive(Debug, Clone)]
pub enum Stmt {
    Var(VarStmt),
    Const(ConstStmt),
    Assign(AssignStmt),
    Expr(ExprStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Return(ReturnStmt),
    Break(Span),
    Continue(Span),
    Block(Block),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Var(s) => s.span,
            Stmt::Const(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::Expr(s) => s.span,
            Stmt::If(s) => s.span,
            Stmt::While(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Break(span) | Stmt::Continue(span) => *span,
            Stmt::Block(b) => b.span,
        }
    }
}

/// `var name: T = init;`
#[derive(Debug, Clone)]
pub struct VarStmt {
    pub name: Symbol,
    pub ty: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}

/// `const name: T = value;` evaluated at compile time
#[derive(Debug, Clone)]
pub struct ConstStmt {
    pub name: Symbol,
    pub ty: Option<TypeExpr>,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AssignStmt {
    pub target: Expr,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Block,
    pub else_branch: Option<ElseBranch>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ElseBranch {
    Block(Block),
    If(Box<IfStmt>),
}

#[derive(Debug, Clone)]
pub struct WhileStmt {
    pub condition: Expr,
    pub body: Block,
    pub span: Span,
}

/// `for (init; condition; update) body`
#[derive(Debug, Clone)]
pub struct ForStmt {
    pub id: NodeId,
    pub init: Option<Box<Stmt>>,
    pub condition: Option<Expr>,
    pub update: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Option<Expr>,
    pub span: Span,
}

/// Expression
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    IntLiteral(i64),
    FloatLiteral(f64),
    CharLiteral(char),
    BoolLiteral(bool),
    StringLiteral(String),
    Identifier(Symbol),
    Binary(Box<BinaryExpr>),
    Unary(Box<UnaryExpr>),
    /// Named call: free function, macro, `sizeof`, or a function-typed variable
    Call(Box<CallExpr>),
    MethodCall(Box<MethodCallExpr>),
    Field(Box<FieldExpr>),
    Index(Box<IndexExpr>),
    Cast(Box<CastExpr>),
    /// `new T(args)`, heap allocation
    New(Box<ConstructExpr>),
    /// `T(args)`, stack construction
    Construct(Box<ConstructExpr>),
    AddressOf(Box<Expr>),
    Deref(Box<Expr>),
    /// `delete x`, `clone x`
    Keyword(Box<KeywordExpr>),
    Grouping(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::Shl | BinaryOp::Shr
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    BitNot,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::BitNot => "~",
        }
    }
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub left: Expr,
    pub op: BinaryOp,
    pub right: Expr,
}

#[derive(Debug, Clone)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub operand: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgModifier {
    Ref,
    Temp,
}

#[derive(Debug, Clone)]
pub struct Argument {
    pub modifier: Option<ArgModifier>,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Symbol,
    pub type_args: Vec<TypeExpr>,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone)]
pub struct MethodCallExpr {
    pub object: Expr,
    pub method: Symbol,
    pub type_args: Vec<TypeExpr>,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone)]
pub struct FieldExpr {
    pub object: Expr,
    pub field: Symbol,
}

#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub object: Expr,
    pub index: Expr,
}

#[derive(Debug, Clone)]
pub struct CastExpr {
    pub ty: TypeExpr,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct ConstructExpr {
    pub ty: TypeExpr,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Delete,
    Clone,
}

#[derive(Debug, Clone)]
pub struct KeywordExpr {
    pub keyword: Keyword,
    pub operand: Expr,
}

impl Expr {
    /// Strip any number of enclosing parentheses.
    pub fn ungrouped(&self) -> &Expr {
        let mut expr = self;
        while let ExprKind::Grouping(inner) = &expr.kind {
            expr = inner;
        }
        expr
    }

    /// Syntactic lvalue check: identifiers, fields, indexing and dereference.
    pub fn is_lvalue_shape(&self) -> bool {
        match &self.ungrouped().kind {
            ExprKind::Identifier(_) | ExprKind::Deref(_) => true,
            ExprKind::Field(field) => field.object.is_lvalue_shape(),
            ExprKind::Index(index) => index.object.is_lvalue_shape(),
            _ => false,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.ungrouped().kind,
            ExprKind::IntLiteral(_)
                | ExprKind::FloatLiteral(_)
                | ExprKind::CharLiteral(_)
                | ExprKind::BoolLiteral(_)
                | ExprKind::StringLiteral(_)
        )
    }
}
