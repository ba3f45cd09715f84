// transforms/substitute.rs
//! Deep copy of statements and expressions under a substitution environment.
//!
//! Each copy hands out fresh node ids. Names in the environment are replaced
//! either by an expression (macro arguments, unrolled loop iterators) or by a
//! fresh symbol (macro locals). Substituted expressions are renumbered but
//! never walked again, so a name inside an argument is never replaced twice.

use rustc_hash::FxHashMap;

use brim_identity::Symbol;
use brim_syntax::ast::*;

#[derive(Debug, Clone)]
pub enum Replacement {
    Expr(Expr),
    Rename(Symbol),
}

pub struct Substitution<'a> {
    map: FxHashMap<Symbol, Replacement>,
    ids: &'a mut NodeIdGen,
    stop_at_return: bool,
}

impl<'a> Substitution<'a> {
    pub fn new(ids: &'a mut NodeIdGen) -> Self {
        Self {
            map: FxHashMap::default(),
            ids,
            stop_at_return: false,
        }
    }

    /// Drop every statement after the first `return` of each block.
    pub fn stop_at_return(mut self) -> Self {
        self.stop_at_return = true;
        self
    }

    pub fn replace(&mut self, name: Symbol, with: Expr) {
        self.map.insert(name, Replacement::Expr(with));
    }

    pub fn rename(&mut self, name: Symbol, to: Symbol) {
        self.map.insert(name, Replacement::Rename(to));
    }

    fn next_id(&mut self) -> NodeId {
        self.ids.next_id()
    }

    fn binding(&self, name: Symbol) -> Symbol {
        match self.map.get(&name) {
            Some(Replacement::Rename(to)) => *to,
            Some(Replacement::Expr(e)) => match &e.ungrouped().kind {
                ExprKind::Identifier(sym) => *sym,
                _ => name,
            },
            None => name,
        }
    }

    pub fn block(&mut self, block: &Block) -> Block {
        let mut stmts = Vec::with_capacity(block.stmts.len());
        for stmt in &block.stmts {
            stmts.push(self.stmt(stmt));
            if self.stop_at_return && matches!(stmt, Stmt::Return(_)) {
                break;
            }
        }
        Block {
            stmts,
            span: block.span,
        }
    }

    pub fn stmt(&mut self, stmt: &Stmt) -> Stmt {
        match stmt {
            Stmt::Var(s) => Stmt::Var(self.var(s)),
            Stmt::Const(s) => Stmt::Const(ConstStmt {
                name: self.binding(s.name),
                ty: s.ty.as_ref().map(|t| self.type_expr(t)),
                value: self.expr(&s.value),
                span: s.span,
            }),
            Stmt::Assign(s) => Stmt::Assign(AssignStmt {
                target: self.expr(&s.target),
                value: self.expr(&s.value),
                span: s.span,
            }),
            Stmt::Expr(s) => Stmt::Expr(ExprStmt {
                expr: self.expr(&s.expr),
                span: s.span,
            }),
            Stmt::If(s) => Stmt::If(self.if_stmt(s)),
            Stmt::While(s) => Stmt::While(WhileStmt {
                condition: self.expr(&s.condition),
                body: self.block(&s.body),
                span: s.span,
            }),
            Stmt::For(s) => Stmt::For(ForStmt {
                id: self.next_id(),
                init: s.init.as_ref().map(|i| Box::new(self.stmt(i))),
                condition: s.condition.as_ref().map(|c| self.expr(c)),
                update: s.update.as_ref().map(|u| Box::new(self.stmt(u))),
                body: self.block(&s.body),
                span: s.span,
            }),
            Stmt::Return(s) => Stmt::Return(ReturnStmt {
                value: s.value.as_ref().map(|v| self.expr(v)),
                span: s.span,
            }),
            Stmt::Break(span) => Stmt::Break(*span),
            Stmt::Continue(span) => Stmt::Continue(*span),
            Stmt::Block(b) => Stmt::Block(self.block(b)),
        }
    }

    pub fn var(&mut self, s: &VarStmt) -> VarStmt {
        VarStmt {
            name: self.binding(s.name),
            ty: s.ty.as_ref().map(|t| self.type_expr(t)),
            init: s.init.as_ref().map(|i| self.expr(i)),
            span: s.span,
        }
    }

    fn if_stmt(&mut self, s: &IfStmt) -> IfStmt {
        IfStmt {
            condition: self.expr(&s.condition),
            then_branch: self.block(&s.then_branch),
            else_branch: s.else_branch.as_ref().map(|e| match e {
                ElseBranch::Block(b) => ElseBranch::Block(self.block(b)),
                ElseBranch::If(nested) => ElseBranch::If(Box::new(self.if_stmt(nested))),
            }),
            span: s.span,
        }
    }

    pub fn type_expr(&mut self, ty: &TypeExpr) -> TypeExpr {
        let kind = match &ty.kind {
            TypeExprKind::Named { name, args } => TypeExprKind::Named {
                name: *name,
                args: args.iter().map(|a| self.type_expr(a)).collect(),
            },
            TypeExprKind::Pointer(inner) => TypeExprKind::Pointer(Box::new(self.type_expr(inner))),
            TypeExprKind::StackArray { element, size } => TypeExprKind::StackArray {
                element: Box::new(self.type_expr(element)),
                size: Box::new(self.expr(size)),
            },
        };
        TypeExpr { kind, span: ty.span }
    }

    fn args(&mut self, args: &[Argument]) -> Vec<Argument> {
        args.iter()
            .map(|a| Argument {
                modifier: a.modifier,
                value: self.expr(&a.value),
            })
            .collect()
    }

    fn construct(&mut self, c: &ConstructExpr) -> ConstructExpr {
        ConstructExpr {
            ty: self.type_expr(&c.ty),
            args: self.args(&c.args),
        }
    }

    pub fn expr(&mut self, expr: &Expr) -> Expr {
        let kind = match &expr.kind {
            ExprKind::Identifier(name) => match self.map.get(name) {
                Some(Replacement::Expr(with)) => {
                    let with = with.clone();
                    return renumber(&with, self.ids);
                }
                Some(Replacement::Rename(to)) => ExprKind::Identifier(*to),
                None => ExprKind::Identifier(*name),
            },
            ExprKind::IntLiteral(v) => ExprKind::IntLiteral(*v),
            ExprKind::FloatLiteral(v) => ExprKind::FloatLiteral(*v),
            ExprKind::CharLiteral(v) => ExprKind::CharLiteral(*v),
            ExprKind::BoolLiteral(v) => ExprKind::BoolLiteral(*v),
            ExprKind::StringLiteral(v) => ExprKind::StringLiteral(v.clone()),
            ExprKind::Binary(bin) => ExprKind::Binary(Box::new(BinaryExpr {
                left: self.expr(&bin.left),
                op: bin.op,
                right: self.expr(&bin.right),
            })),
            ExprKind::Unary(un) => ExprKind::Unary(Box::new(UnaryExpr {
                op: un.op,
                operand: self.expr(&un.operand),
            })),
            ExprKind::Call(call) => ExprKind::Call(Box::new(CallExpr {
                callee: self.binding(call.callee),
                type_args: call.type_args.iter().map(|t| self.type_expr(t)).collect(),
                args: self.args(&call.args),
            })),
            ExprKind::MethodCall(mc) => ExprKind::MethodCall(Box::new(MethodCallExpr {
                object: self.expr(&mc.object),
                method: mc.method,
                type_args: mc.type_args.iter().map(|t| self.type_expr(t)).collect(),
                args: self.args(&mc.args),
            })),
            ExprKind::Field(f) => ExprKind::Field(Box::new(FieldExpr {
                object: self.expr(&f.object),
                field: f.field,
            })),
            ExprKind::Index(idx) => ExprKind::Index(Box::new(IndexExpr {
                object: self.expr(&idx.object),
                index: self.expr(&idx.index),
            })),
            ExprKind::Cast(c) => ExprKind::Cast(Box::new(CastExpr {
                ty: self.type_expr(&c.ty),
                value: self.expr(&c.value),
            })),
            ExprKind::New(c) => ExprKind::New(Box::new(self.construct(c))),
            ExprKind::Construct(c) => ExprKind::Construct(Box::new(self.construct(c))),
            ExprKind::AddressOf(inner) => ExprKind::AddressOf(Box::new(self.expr(inner))),
            ExprKind::Deref(inner) => ExprKind::Deref(Box::new(self.expr(inner))),
            ExprKind::Keyword(kw) => ExprKind::Keyword(Box::new(KeywordExpr {
                keyword: kw.keyword,
                operand: self.expr(&kw.operand),
            })),
            ExprKind::Grouping(inner) => ExprKind::Grouping(Box::new(self.expr(inner))),
        };
        Expr {
            id: self.next_id(),
            kind,
            span: expr.span,
        }
    }
}

/// Copy `expr` with fresh node ids and no substitution.
pub fn renumber(expr: &Expr, ids: &mut NodeIdGen) -> Expr {
    Substitution::new(ids).expr(expr)
}
