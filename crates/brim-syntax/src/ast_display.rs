// src/ast_display.rs
//! Source-like rendering of AST nodes with symbol resolution.
//!
//! Nested binary operands are parenthesised, so the printed form is
//! unambiguous without precedence rules.

use std::fmt::Write;

use brim_identity::Interner;

use crate::ast::*;

/// Pretty-printer for AST nodes that resolves symbols via an Interner.
pub struct AstPrinter<'a> {
    interner: &'a Interner,
    indent: usize,
}

impl<'a> AstPrinter<'a> {
    pub fn new(interner: &'a Interner) -> Self {
        Self {
            interner,
            indent: 0,
        }
    }

    pub fn print_expr(&self, expr: &Expr) -> String {
        let mut out = String::new();
        self.write_expr(&mut out, expr);
        out
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        let mut out = String::new();
        self.write_stmt(&mut out, stmt);
        out
    }

    pub fn print_stmts(&self, stmts: &[Stmt]) -> String {
        let mut out = String::new();
        for stmt in stmts {
            self.write_stmt(&mut out, stmt);
        }
        out
    }

    pub fn print_block(&self, block: &Block) -> String {
        let mut out = String::new();
        self.write_block(&mut out, block);
        out
    }

    pub fn print_type(&self, ty: &TypeExpr) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty);
        out
    }

    fn name(&self, sym: brim_identity::Symbol) -> &str {
        self.interner.resolve(sym)
    }

    fn indented(&self) -> Self {
        Self {
            interner: self.interner,
            indent: self.indent + 1,
        }
    }

    fn write_indent(&self, out: &mut String) {
        for _ in 0..self.indent {
            out.push_str("    ");
        }
    }

    fn write_block(&self, out: &mut String, block: &Block) {
        out.push_str("{\n");
        let inner = self.indented();
        for stmt in &block.stmts {
            inner.write_stmt(out, stmt);
        }
        self.write_indent(out);
        out.push('}');
    }

    fn write_stmt(&self, out: &mut String, stmt: &Stmt) {
        self.write_indent(out);
        self.write_stmt_inline(out, stmt);
        out.push('\n');
    }

    /// Statement without leading indent or trailing newline.
    fn write_stmt_inline(&self, out: &mut String, stmt: &Stmt) {
        match stmt {
            Stmt::Var(var) => {
                let _ = write!(out, "var {}", self.name(var.name));
                if let Some(ty) = &var.ty {
                    out.push_str(": ");
                    self.write_type(out, ty);
                }
                if let Some(init) = &var.init {
                    out.push_str(" = ");
                    self.write_expr(out, init);
                }
                out.push(';');
            }
            Stmt::Const(c) => {
                let _ = write!(out, "const {}", self.name(c.name));
                if let Some(ty) = &c.ty {
                    out.push_str(": ");
                    self.write_type(out, ty);
                }
                out.push_str(" = ");
                self.write_expr(out, &c.value);
                out.push(';');
            }
            Stmt::Assign(assign) => {
                self.write_expr(out, &assign.target);
                out.push_str(" = ");
                self.write_expr(out, &assign.value);
                out.push(';');
            }
            Stmt::Expr(e) => {
                self.write_expr(out, &e.expr);
                out.push(';');
            }
            Stmt::If(if_stmt) => self.write_if(out, if_stmt),
            Stmt::While(w) => {
                out.push_str("while (");
                self.write_expr(out, &w.condition);
                out.push_str(") ");
                self.write_block(out, &w.body);
            }
            Stmt::For(f) => {
                out.push_str("for (");
                if let Some(init) = &f.init {
                    self.write_clause(out, init);
                }
                out.push_str("; ");
                if let Some(cond) = &f.condition {
                    self.write_expr(out, cond);
                }
                out.push_str("; ");
                if let Some(update) = &f.update {
                    self.write_clause(out, update);
                }
                out.push_str(") ");
                self.write_block(out, &f.body);
            }
            Stmt::Return(r) => match &r.value {
                Some(value) => {
                    out.push_str("return ");
                    self.write_expr(out, value);
                    out.push(';');
                }
                None => out.push_str("return;"),
            },
            Stmt::Break(_) => out.push_str("break;"),
            Stmt::Continue(_) => out.push_str("continue;"),
            Stmt::Block(block) => self.write_block(out, block),
        }
    }

    /// `for` header clause: a statement printed without its semicolon.
    fn write_clause(&self, out: &mut String, stmt: &Stmt) {
        let mut clause = String::new();
        self.write_stmt_inline(&mut clause, stmt);
        out.push_str(clause.trim_end_matches(';'));
    }

    fn write_if(&self, out: &mut String, if_stmt: &IfStmt) {
        out.push_str("if (");
        self.write_expr(out, &if_stmt.condition);
        out.push_str(") ");
        self.write_block(out, &if_stmt.then_branch);
        match &if_stmt.else_branch {
            Some(ElseBranch::Block(block)) => {
                out.push_str(" else ");
                self.write_block(out, block);
            }
            Some(ElseBranch::If(nested)) => {
                out.push_str(" else ");
                self.write_if(out, nested);
            }
            None => {}
        }
    }

    fn write_args(&self, out: &mut String, args: &[Argument]) {
        out.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match arg.modifier {
                Some(ArgModifier::Ref) => out.push_str("ref "),
                Some(ArgModifier::Temp) => out.push_str("temp "),
                None => {}
            }
            self.write_expr(out, &arg.value);
        }
        out.push(')');
    }

    fn write_type_args(&self, out: &mut String, type_args: &[TypeExpr]) {
        if type_args.is_empty() {
            return;
        }
        out.push('<');
        for (i, ty) in type_args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_type(out, ty);
        }
        out.push('>');
    }

    fn write_operand(&self, out: &mut String, expr: &Expr) {
        if matches!(expr.kind, ExprKind::Binary(_)) {
            out.push('(');
            self.write_expr(out, expr);
            out.push(')');
        } else {
            self.write_expr(out, expr);
        }
    }

    fn write_expr(&self, out: &mut String, expr: &Expr) {
        match &expr.kind {
            ExprKind::IntLiteral(v) => {
                let _ = write!(out, "{}", v);
            }
            ExprKind::FloatLiteral(v) => {
                let _ = write!(out, "{:?}", v);
            }
            ExprKind::CharLiteral(c) => {
                let _ = write!(out, "'{}'", c.escape_default());
            }
            ExprKind::BoolLiteral(b) => {
                let _ = write!(out, "{}", b);
            }
            ExprKind::StringLiteral(s) => {
                let _ = write!(out, "\"{}\"", s.escape_default());
            }
            ExprKind::Identifier(sym) => out.push_str(self.name(*sym)),
            ExprKind::Binary(bin) => {
                self.write_operand(out, &bin.left);
                let _ = write!(out, " {} ", bin.op.as_str());
                self.write_operand(out, &bin.right);
            }
            ExprKind::Unary(un) => {
                out.push_str(un.op.as_str());
                self.write_operand(out, &un.operand);
            }
            ExprKind::Call(call) => {
                out.push_str(self.name(call.callee));
                self.write_type_args(out, &call.type_args);
                self.write_args(out, &call.args);
            }
            ExprKind::MethodCall(mc) => {
                self.write_operand(out, &mc.object);
                let _ = write!(out, ".{}", self.name(mc.method));
                self.write_type_args(out, &mc.type_args);
                self.write_args(out, &mc.args);
            }
            ExprKind::Field(f) => {
                self.write_operand(out, &f.object);
                let _ = write!(out, ".{}", self.name(f.field));
            }
            ExprKind::Index(idx) => {
                self.write_operand(out, &idx.object);
                out.push('[');
                self.write_expr(out, &idx.index);
                out.push(']');
            }
            ExprKind::Cast(cast) => {
                out.push('(');
                self.write_type(out, &cast.ty);
                out.push_str(") ");
                self.write_operand(out, &cast.value);
            }
            ExprKind::New(c) => {
                out.push_str("new ");
                self.write_type(out, &c.ty);
                self.write_args(out, &c.args);
            }
            ExprKind::Construct(c) => {
                self.write_type(out, &c.ty);
                self.write_args(out, &c.args);
            }
            ExprKind::AddressOf(inner) => {
                out.push('&');
                self.write_operand(out, inner);
            }
            ExprKind::Deref(inner) => {
                out.push('*');
                self.write_operand(out, inner);
            }
            ExprKind::Keyword(k) => {
                out.push_str(match k.keyword {
                    Keyword::Delete => "delete ",
                    Keyword::Clone => "clone ",
                });
                self.write_operand(out, &k.operand);
            }
            ExprKind::Grouping(inner) => {
                out.push('(');
                self.write_expr(out, inner);
                out.push(')');
            }
        }
    }

    fn write_type(&self, out: &mut String, ty: &TypeExpr) {
        match &ty.kind {
            TypeExprKind::Named { name, args } => {
                out.push_str(self.name(*name));
                self.write_type_args(out, args);
            }
            TypeExprKind::Pointer(inner) => {
                self.write_type(out, inner);
                out.push('*');
            }
            TypeExprKind::StackArray { element, size } => {
                self.write_type(out, element);
                out.push('[');
                self.write_expr(out, size);
                out.push(']');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AstBuilder;

    #[test]
    fn prints_nested_binary_with_parens() {
        let mut b = AstBuilder::new();
        let two = b.int(2);
        let three = b.int(3);
        let four = b.int(4);
        let mul = b.binary(three, BinaryOp::Mul, four);
        let add = b.binary(two, BinaryOp::Add, mul);
        let (_, interner) = b.finish(Vec::new());
        assert_eq!(AstPrinter::new(&interner).print_expr(&add), "2 + (3 * 4)");
    }

    #[test]
    fn prints_for_loop_header() {
        let mut b = AstBuilder::new();
        let i = b.ident("i");
        let call = b.call("emit", vec![i]);
        let body = b.expr_stmt(call);
        let for_stmt = b.counting_loop("i", 0, 3, vec![body]);
        let (_, interner) = b.finish(Vec::new());
        let printed = AstPrinter::new(&interner).print_stmt(&Stmt::For(for_stmt));
        assert_eq!(
            printed,
            "for (var i = 0; i < 3; i = i + 1) {\n    emit(i);\n}\n"
        );
    }

    #[test]
    fn prints_types() {
        let mut b = AstBuilder::new();
        let int = b.ty("int");
        let ptr = b.pointer(int);
        let size = b.int(4);
        let arr = b.array(ptr, size);
        let (_, interner) = b.finish(Vec::new());
        assert_eq!(AstPrinter::new(&interner).print_type(&arr), "int*[4]");
    }
}
