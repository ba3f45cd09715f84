// src/builder.rs
//
// Programmatic AST construction. Used by tests and by hosts that synthesise
// declarations without going through the parser.

use brim_identity::{Interner, Span, Symbol};

use crate::ast::*;

/// Builds AST nodes with unique ids and interned names.
pub struct AstBuilder {
    interner: Interner,
    ids: NodeIdGen,
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AstBuilder {
    pub fn new() -> Self {
        let mut interner = Interner::new();
        interner.seed_builtin_symbols();
        Self {
            interner,
            ids: NodeIdGen::starting_at(0),
        }
    }

    pub fn sym(&mut self, name: &str) -> Symbol {
        self.interner.intern(name)
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    fn expr(&mut self, kind: ExprKind) -> Expr {
        Expr {
            id: self.ids.next_id(),
            kind,
            span: Span::default(),
        }
    }

    // Expressions

    pub fn int(&mut self, value: i64) -> Expr {
        self.expr(ExprKind::IntLiteral(value))
    }

    pub fn float(&mut self, value: f64) -> Expr {
        self.expr(ExprKind::FloatLiteral(value))
    }

    pub fn char_lit(&mut self, value: char) -> Expr {
        self.expr(ExprKind::CharLiteral(value))
    }

    pub fn bool_lit(&mut self, value: bool) -> Expr {
        self.expr(ExprKind::BoolLiteral(value))
    }

    pub fn string(&mut self, value: &str) -> Expr {
        self.expr(ExprKind::StringLiteral(value.to_string()))
    }

    pub fn ident(&mut self, name: &str) -> Expr {
        let sym = self.sym(name);
        self.expr(ExprKind::Identifier(sym))
    }

    pub fn binary(&mut self, left: Expr, op: BinaryOp, right: Expr) -> Expr {
        self.expr(ExprKind::Binary(Box::new(BinaryExpr { left, op, right })))
    }

    pub fn unary(&mut self, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(ExprKind::Unary(Box::new(UnaryExpr { op, operand })))
    }

    pub fn group(&mut self, inner: Expr) -> Expr {
        self.expr(ExprKind::Grouping(Box::new(inner)))
    }

    pub fn arg(&mut self, value: Expr) -> Argument {
        Argument {
            modifier: None,
            value,
        }
    }

    pub fn arg_with(&mut self, modifier: ArgModifier, value: Expr) -> Argument {
        Argument {
            modifier: Some(modifier),
            value,
        }
    }

    /// Call with plain arguments and no explicit type arguments.
    pub fn call(&mut self, callee: &str, args: Vec<Expr>) -> Expr {
        let args = args.into_iter().map(|value| self.arg(value)).collect();
        self.call_with(callee, Vec::new(), args)
    }

    pub fn call_with(&mut self, callee: &str, type_args: Vec<TypeExpr>, args: Vec<Argument>) -> Expr {
        let callee = self.sym(callee);
        self.expr(ExprKind::Call(Box::new(CallExpr {
            callee,
            type_args,
            args,
        })))
    }

    /// `sizeof<T>()`
    pub fn size_of(&mut self, ty: TypeExpr) -> Expr {
        self.call_with("sizeof", vec![ty], Vec::new())
    }

    pub fn method_call(&mut self, object: Expr, method: &str, args: Vec<Expr>) -> Expr {
        let method = self.sym(method);
        let args = args.into_iter().map(|value| self.arg(value)).collect();
        self.expr(ExprKind::MethodCall(Box::new(MethodCallExpr {
            object,
            method,
            type_args: Vec::new(),
            args,
        })))
    }

    pub fn field(&mut self, object: Expr, field: &str) -> Expr {
        let field = self.sym(field);
        self.expr(ExprKind::Field(Box::new(FieldExpr { object, field })))
    }

    pub fn index(&mut self, object: Expr, index: Expr) -> Expr {
        self.expr(ExprKind::Index(Box::new(IndexExpr { object, index })))
    }

    pub fn cast(&mut self, ty: TypeExpr, value: Expr) -> Expr {
        self.expr(ExprKind::Cast(Box::new(CastExpr { ty, value })))
    }

    pub fn new_expr(&mut self, ty: TypeExpr, args: Vec<Expr>) -> Expr {
        let args = args.into_iter().map(|value| self.arg(value)).collect();
        self.expr(ExprKind::New(Box::new(ConstructExpr { ty, args })))
    }

    pub fn construct(&mut self, ty: TypeExpr, args: Vec<Expr>) -> Expr {
        let args = args.into_iter().map(|value| self.arg(value)).collect();
        self.expr(ExprKind::Construct(Box::new(ConstructExpr { ty, args })))
    }

    pub fn address_of(&mut self, operand: Expr) -> Expr {
        self.expr(ExprKind::AddressOf(Box::new(operand)))
    }

    pub fn deref(&mut self, operand: Expr) -> Expr {
        self.expr(ExprKind::Deref(Box::new(operand)))
    }

    pub fn keyword(&mut self, keyword: Keyword, operand: Expr) -> Expr {
        self.expr(ExprKind::Keyword(Box::new(KeywordExpr { keyword, operand })))
    }

    // Types

    pub fn ty(&mut self, name: &str) -> TypeExpr {
        self.generic_ty(name, Vec::new())
    }

    pub fn generic_ty(&mut self, name: &str, args: Vec<TypeExpr>) -> TypeExpr {
        let name = self.sym(name);
        TypeExpr {
            kind: TypeExprKind::Named { name, args },
            span: Span::default(),
        }
    }

    pub fn pointer(&mut self, to: TypeExpr) -> TypeExpr {
        TypeExpr {
            kind: TypeExprKind::Pointer(Box::new(to)),
            span: Span::default(),
        }
    }

    pub fn array(&mut self, element: TypeExpr, size: Expr) -> TypeExpr {
        TypeExpr {
            kind: TypeExprKind::StackArray {
                element: Box::new(element),
                size: Box::new(size),
            },
            span: Span::default(),
        }
    }

    // Statements

    pub fn var_decl(&mut self, name: &str, ty: Option<TypeExpr>, init: Option<Expr>) -> VarStmt {
        VarStmt {
            name: self.sym(name),
            ty,
            init,
            span: Span::default(),
        }
    }

    pub fn var(&mut self, name: &str, ty: Option<TypeExpr>, init: Option<Expr>) -> Stmt {
        Stmt::Var(self.var_decl(name, ty, init))
    }

    pub fn const_stmt(&mut self, name: &str, ty: Option<TypeExpr>, value: Expr) -> Stmt {
        Stmt::Const(ConstStmt {
            name: self.sym(name),
            ty,
            value,
            span: Span::default(),
        })
    }

    pub fn assign(&mut self, target: Expr, value: Expr) -> Stmt {
        Stmt::Assign(AssignStmt {
            target,
            value,
            span: Span::default(),
        })
    }

    /// `name = value`
    pub fn assign_to(&mut self, name: &str, value: Expr) -> Stmt {
        let target = self.ident(name);
        self.assign(target, value)
    }

    pub fn expr_stmt(&mut self, expr: Expr) -> Stmt {
        Stmt::Expr(ExprStmt {
            expr,
            span: Span::default(),
        })
    }

    pub fn block(&mut self, stmts: Vec<Stmt>) -> Block {
        Block {
            stmts,
            span: Span::default(),
        }
    }

    pub fn if_stmt(&mut self, condition: Expr, then_stmts: Vec<Stmt>, else_stmts: Option<Vec<Stmt>>) -> Stmt {
        let else_branch = else_stmts.map(|stmts| ElseBranch::Block(self.block(stmts)));
        Stmt::If(self.if_node(condition, then_stmts, else_branch))
    }

    /// `if (cond) { .. } else <nested if>`
    pub fn if_else_if(&mut self, condition: Expr, then_stmts: Vec<Stmt>, nested: IfStmt) -> Stmt {
        Stmt::If(self.if_node(condition, then_stmts, Some(ElseBranch::If(Box::new(nested)))))
    }

    pub fn if_node(&mut self, condition: Expr, then_stmts: Vec<Stmt>, else_branch: Option<ElseBranch>) -> IfStmt {
        IfStmt {
            condition,
            then_branch: self.block(then_stmts),
            else_branch,
            span: Span::default(),
        }
    }

    pub fn while_stmt(&mut self, condition: Expr, body: Vec<Stmt>) -> Stmt {
        Stmt::While(WhileStmt {
            condition,
            body: self.block(body),
            span: Span::default(),
        })
    }

    pub fn for_stmt(
        &mut self,
        init: Option<Stmt>,
        condition: Option<Expr>,
        update: Option<Stmt>,
        body: Vec<Stmt>,
    ) -> ForStmt {
        ForStmt {
            id: self.ids.next_id(),
            init: init.map(Box::new),
            condition,
            update: update.map(Box::new),
            body: self.block(body),
            span: Span::default(),
        }
    }

    /// `for (var i = from; i < to; i = i + 1) body`
    pub fn counting_loop(&mut self, var: &str, from: i64, to: i64, body: Vec<Stmt>) -> ForStmt {
        let start = self.int(from);
        let init = self.var(var, None, Some(start));
        let iter = self.ident(var);
        let bound = self.int(to);
        let condition = self.binary(iter, BinaryOp::Lt, bound);
        let current = self.ident(var);
        let one = self.int(1);
        let next = self.binary(current, BinaryOp::Add, one);
        let update = self.assign_to(var, next);
        self.for_stmt(Some(init), Some(condition), Some(update), body)
    }

    pub fn ret(&mut self, value: Option<Expr>) -> Stmt {
        Stmt::Return(ReturnStmt {
            value,
            span: Span::default(),
        })
    }

    // Declarations

    pub fn type_param(&mut self, name: &str) -> TypeParam {
        TypeParam {
            name: self.sym(name),
            span: Span::default(),
        }
    }

    pub fn param(&mut self, name: &str, ty: TypeExpr) -> Param {
        Param {
            name: self.sym(name),
            ty,
            modifier: None,
            span: Span::default(),
        }
    }

    pub fn attribute(&mut self, name: &str, args: &[&str]) -> Attribute {
        Attribute {
            name: self.sym(name),
            args: args.iter().map(|a| a.to_string()).collect(),
            span: Span::default(),
        }
    }

    pub fn func(&mut self, name: &str, params: Vec<Param>, return_type: Option<TypeExpr>, body: Vec<Stmt>) -> FuncDecl {
        self.generic_func(name, &[], params, return_type, body)
    }

    pub fn generic_func(
        &mut self,
        name: &str,
        type_params: &[&str],
        params: Vec<Param>,
        return_type: Option<TypeExpr>,
        body: Vec<Stmt>,
    ) -> FuncDecl {
        let type_params = type_params.iter().map(|t| self.type_param(t)).collect();
        FuncDecl {
            name: self.sym(name),
            type_params,
            params,
            return_type,
            body: Some(self.block(body)),
            attributes: Vec::new(),
            span: Span::default(),
        }
    }

    /// Function without a body, bound to a host function through `[External]`.
    pub fn external_func(
        &mut self,
        name: &str,
        host_name: &str,
        params: Vec<Param>,
        return_type: Option<TypeExpr>,
    ) -> FuncDecl {
        let attribute = self.attribute("External", &[host_name]);
        FuncDecl {
            name: self.sym(name),
            type_params: Vec::new(),
            params,
            return_type,
            body: None,
            attributes: vec![attribute],
            span: Span::default(),
        }
    }

    pub fn operator(&mut self, op: OperatorKind, params: Vec<Param>, return_type: Option<TypeExpr>, body: Vec<Stmt>) -> OperatorDecl {
        OperatorDecl {
            op,
            type_params: Vec::new(),
            params,
            return_type,
            body: self.block(body),
            attributes: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn constructor(&mut self, params: Vec<Param>, body: Vec<Stmt>) -> ConstructorDecl {
        ConstructorDecl {
            params,
            body: self.block(body),
            attributes: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn macro_decl(&mut self, name: &str, params: &[&str], body: Vec<Stmt>) -> MacroDecl {
        let params = params.iter().map(|p| self.sym(p)).collect();
        MacroDecl {
            name: self.sym(name),
            params,
            body: self.block(body),
            span: Span::default(),
        }
    }

    pub fn field_decl(&mut self, name: &str, ty: TypeExpr) -> FieldDecl {
        FieldDecl {
            name: self.sym(name),
            ty,
            span: Span::default(),
        }
    }

    pub fn struct_decl(&mut self, name: &str, type_params: &[&str], fields: Vec<FieldDecl>) -> StructDecl {
        let type_params = type_params.iter().map(|t| self.type_param(t)).collect();
        StructDecl {
            name: self.sym(name),
            type_params,
            members: TypeMembers {
                fields,
                ..TypeMembers::default()
            },
            attributes: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn class_decl(&mut self, name: &str, type_params: &[&str], fields: Vec<FieldDecl>) -> ClassDecl {
        let type_params = type_params.iter().map(|t| self.type_param(t)).collect();
        ClassDecl {
            name: self.sym(name),
            type_params,
            members: TypeMembers {
                fields,
                ..TypeMembers::default()
            },
            attributes: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn enum_decl(&mut self, name: &str, members: Vec<(&str, Option<Expr>)>) -> EnumDecl {
        let members = members
            .into_iter()
            .map(|(member, value)| EnumMember {
                name: self.sym(member),
                value,
                span: Span::default(),
            })
            .collect();
        EnumDecl {
            name: self.sym(name),
            members,
            attributes: Vec::new(),
            span: Span::default(),
        }
    }

    pub fn file(&mut self, path: &str, declarations: Vec<Decl>, statements: Vec<Stmt>) -> SourceFile {
        SourceFile {
            path: path.to_string(),
            declarations,
            statements,
        }
    }

    /// Finish building. The interner goes to the analyzer along with the program.
    pub fn finish(self, files: Vec<SourceFile>) -> (Program, Interner) {
        let program = Program {
            files,
            next_node_id: self.ids.peek(),
        };
        (program, self.interner)
    }
}
