// consteval/tests.rs

use super::*;
use brim_syntax::{AstBuilder, UnaryOp};

struct ConstEnv {
    constants: FxHashMap<Symbol, DataItem>,
    sizeof: Symbol,
    twice: Option<(Symbol, Expr)>,
}

impl ConstEnv {
    fn new(b: &mut AstBuilder) -> Self {
        Self {
            constants: FxHashMap::default(),
            sizeof: b.sym("sizeof"),
            twice: None,
        }
    }
}

impl ComputeEnv for ConstEnv {
    fn constant(&self, name: Symbol) -> Option<DataItem> {
        self.constants.get(&name).copied()
    }

    fn size_of(&mut self, call: &CallExpr, _span: Span) -> Option<u32> {
        (call.callee == self.sizeof).then_some(3)
    }

    fn expand_macro(&mut self, call: &CallExpr, _span: Span) -> Option<Expr> {
        match &self.twice {
            Some((name, body)) if *name == call.callee => Some(body.clone()),
            _ => None,
        }
    }
}

fn compute(expr: &Expr) -> Option<DataItem> {
    try_compute(expr, None, &mut LiteralEnv, None)
}

#[test]
fn arithmetic_precedence_from_tree_shape() {
    let mut b = AstBuilder::new();
    let three = b.int(3);
    let four = b.int(4);
    let product = b.binary(three, BinaryOp::Mul, four);
    let two = b.int(2);
    let sum = b.binary(two, BinaryOp::Add, product);
    assert_eq!(compute(&sum), Some(DataItem::Integer(14)));
}

#[test]
fn division_and_modulo_return_left_operand() {
    let mut b = AstBuilder::new();
    let ten = b.int(10);
    let three = b.int(3);
    let div = b.binary(ten, BinaryOp::Div, three);
    assert_eq!(compute(&div), Some(DataItem::Integer(10)));

    let ten = b.int(10);
    let three = b.int(3);
    let rem = b.binary(ten, BinaryOp::Mod, three);
    assert_eq!(compute(&rem), Some(DataItem::Integer(10)));

    let f = b.float(7.5);
    let two = b.float(2.0);
    let fdiv = b.binary(f, BinaryOp::Div, two);
    assert_eq!(compute(&fdiv), Some(DataItem::Float(7.5)));
}

#[test]
fn logical_operators_short_circuit() {
    let mut b = AstBuilder::new();
    let lhs = b.bool_lit(false);
    let runtime = b.call("read_input", vec![]);
    let and = b.binary(lhs, BinaryOp::And, runtime);
    assert_eq!(compute(&and), Some(DataItem::Bool(false)));

    let lhs = b.bool_lit(true);
    let runtime = b.call("read_input", vec![]);
    let or = b.binary(lhs, BinaryOp::Or, runtime);
    assert_eq!(compute(&or), Some(DataItem::Bool(true)));

    // Left operand does not decide: the uncomputable right side fails it
    let lhs = b.bool_lit(true);
    let runtime = b.call("read_input", vec![]);
    let and = b.binary(lhs, BinaryOp::And, runtime);
    assert_eq!(compute(&and), None);
}

#[test]
fn unsupported_forms_fail_without_panicking() {
    let mut b = AstBuilder::new();
    let s = b.string("hi");
    assert_eq!(compute(&s), None);

    let obj = b.ident("point");
    let field = b.field(obj, "x");
    assert_eq!(compute(&field), None);

    let ty = b.ty("Point");
    let new = b.new_expr(ty, vec![]);
    assert_eq!(compute(&new), None);

    let v = b.ident("unknown");
    let neg = b.unary(UnaryOp::Neg, v);
    assert_eq!(compute(&neg), None);
}

#[test]
fn byte_literal_width_follows_expected_type() {
    let mut b = AstBuilder::new();
    let small = b.int(200);
    assert_eq!(
        try_compute(&small, Some(TypeId::BYTE), &mut LiteralEnv, None),
        Some(DataItem::Byte(200))
    );
    let big = b.int(256);
    assert_eq!(
        try_compute(&big, Some(TypeId::BYTE), &mut LiteralEnv, None),
        Some(DataItem::Integer(256))
    );
    assert_eq!(compute(&small), Some(DataItem::Integer(200)));
}

#[test]
fn mixed_widths_promote() {
    let mut b = AstBuilder::new();
    let c = b.char_lit('A');
    let one = b.int(1);
    let sum = b.binary(c, BinaryOp::Add, one);
    assert_eq!(compute(&sum), Some(DataItem::Integer(66)));

    let i = b.int(1);
    let f = b.float(0.5);
    let sum = b.binary(i, BinaryOp::Add, f);
    assert_eq!(compute(&sum), Some(DataItem::Float(1.5)));

    let max = b.int(i32::MAX as i64);
    let one = b.int(1);
    let wrapped = b.binary(max, BinaryOp::Add, one);
    assert_eq!(compute(&wrapped), Some(DataItem::Integer(i32::MIN)));
}

#[test]
fn constants_sizeof_and_macros_come_from_env() {
    let mut b = AstBuilder::new();
    let mut env = ConstEnv::new(&mut b);
    let n = b.sym("N");
    env.constants.insert(n, DataItem::Integer(5));

    let ident = b.ident("N");
    let one = b.int(1);
    let expr = b.binary(ident, BinaryOp::Add, one);
    assert_eq!(try_compute(&expr, None, &mut env, None), Some(DataItem::Integer(6)));

    // The operand of sizeof is never evaluated
    let runtime = b.call("read_input", vec![]);
    let size = b.call("sizeof", vec![runtime]);
    assert_eq!(try_compute(&size, None, &mut env, None), Some(DataItem::Integer(3)));

    let twice = b.sym("twice");
    let seven = b.int(7);
    let two = b.int(2);
    let body = b.binary(seven, BinaryOp::Mul, two);
    env.twice = Some((twice, body));
    let call = b.call("twice", vec![]);
    assert_eq!(try_compute(&call, None, &mut env, None), Some(DataItem::Integer(14)));
}

#[test]
fn bound_env_overlays_bindings() {
    let mut b = AstBuilder::new();
    let i = b.sym("i");
    let ident = b.ident("i");
    let three = b.int(3);
    let cond = b.binary(ident, BinaryOp::Lt, three);

    let mut base = LiteralEnv;
    let mut env = BoundEnv::new(&mut base);
    assert_eq!(try_compute(&cond, None, &mut env, None), None);
    env.bind(i, DataItem::Integer(2));
    assert_eq!(try_compute(&cond, None, &mut env, None), Some(DataItem::Bool(true)));
}

#[test]
fn memo_answers_first() {
    let mut b = AstBuilder::new();
    let runtime = b.call("read_input", vec![]);
    let mut memo = ComputeMemo::default();
    memo.insert(runtime.id, DataItem::Integer(9));
    let one = b.int(1);
    let sum = b.binary(runtime, BinaryOp::Add, one);
    assert_eq!(
        try_compute(&sum, None, &mut LiteralEnv, Some(&memo)),
        Some(DataItem::Integer(10))
    );
}

#[test]
fn simple_evaluator_rejects_names_and_calls() {
    let mut b = AstBuilder::new();
    let one = b.int(1);
    let shift = b.int(4);
    let flag = b.binary(one, BinaryOp::Shl, shift);
    assert_eq!(try_compute_simple(&flag), Some(DataItem::Integer(16)));

    let name = b.ident("N");
    assert_eq!(try_compute_simple(&name), None);
    let call = b.call("sizeof", vec![]);
    assert_eq!(try_compute_simple(&call), None);
}
