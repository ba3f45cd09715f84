// src/analyzer/tests.rs

use super::*;
use brim_syntax::ast::*;
use brim_syntax::AstBuilder;

use crate::data_item::DataItem;
use crate::entity_defs::{CallableKind, GeneralKind};
use crate::errors::{SemanticError, SemanticWarning};
use crate::expression_data::ResolvedCall;
use crate::transforms::InlineResult;

type Build<'a> = Box<dyn FnOnce(&mut AstBuilder) -> (Vec<Decl>, Vec<Stmt>) + 'a>;

fn analyze_with(config: SemaConfig, build: Build<'_>) -> (Analyzer, SemaResult<()>) {
    let mut b = AstBuilder::new();
    let (decls, stmts) = build(&mut b);
    let file = b.file("main.brim", decls, stmts);
    let (program, interner) = b.finish(vec![file]);
    let mut analyzer = AnalyzerBuilder::new(interner).with_config(config).build();
    let result = analyzer.analyze(&program);
    (analyzer, result)
}

fn analyze(build: Build<'_>) -> (Analyzer, SemaResult<()>) {
    analyze_with(SemaConfig::default(), build)
}

fn expect_error(result: SemaResult<()>) -> SemanticError {
    let err = result.expect_err("analysis should fail");
    err.as_semantic().cloned().unwrap_or_else(|| panic!("internal error: {err}"))
}

fn callables_named(analyzer: &Analyzer, name: &str) -> Vec<CallableRef> {
    analyzer
        .registry
        .all_callables()
        .into_iter()
        .filter(|c| analyzer.name(analyzer.registry.callable(*c).name) == name)
        .collect()
}

fn int_param(b: &mut AstBuilder, name: &str) -> Param {
    let ty = b.ty("int");
    b.param(name, ty)
}

/// `name(x: <ty>) { }`
fn unary_func(b: &mut AstBuilder, name: &str, ty: &str) -> Decl {
    let ty = b.ty(ty);
    let param = b.param("x", ty);
    Decl::Function(b.func(name, vec![param], None, Vec::new()))
}

#[test]
fn exact_overload_beats_conversion() {
    let mut calls = (NodeId::default(), NodeId::default());
    let (analyzer, result) = analyze(Box::new(|b| {
        let f_int = unary_func(b, "f", "int");
        let f_float = unary_func(b, "f", "float");
        let one = b.int(1);
        let first = b.call("f", vec![one]);
        let half = b.float(1.5);
        let second = b.call("f", vec![half]);
        calls = (first.id, second.id);
        let first = b.expr_stmt(first);
        let second = b.expr_stmt(second);
        (vec![f_int, f_float], vec![first, second])
    }));
    result.unwrap();

    let param_of = |node: NodeId| match analyzer.expr_data.call(node) {
        Some(ResolvedCall::Callable(c)) => analyzer.registry.callable(c).params[0].ty,
        other => panic!("unexpected resolution {other:?}"),
    };
    assert_eq!(param_of(calls.0), TypeId::INTEGER);
    assert_eq!(param_of(calls.1), TypeId::FLOAT);
}

#[test]
fn small_literal_converts_to_byte_parameter() {
    let mut arg_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        let g = unary_func(b, "g", "byte");
        let seven = b.int(7);
        arg_id = seven.id;
        let call = b.call("g", vec![seven]);
        let call = b.expr_stmt(call);
        (vec![g], vec![call])
    }));
    result.unwrap();
    assert_eq!(analyzer.expr_data.get_type(arg_id), Some(TypeId::BYTE));
}

#[test]
fn large_literal_does_not_fit_byte_parameter() {
    let (_, result) = analyze(Box::new(|b| {
        let g = unary_func(b, "g", "byte");
        let big = b.int(300);
        let call = b.call("g", vec![big]);
        let call = b.expr_stmt(call);
        (vec![g], vec![call])
    }));
    assert!(matches!(expect_error(result), SemanticError::FunctionNotFound { .. }));
}

#[test]
fn template_instantiated_once_per_argument_set() {
    let mut ids = Vec::new();
    let (analyzer, result) = analyze(Box::new(|b| {
        // id<T>(x: T) -> T { return x; }
        let t = b.ty("T");
        let x = b.param("x", t);
        let ret_ty = b.ty("T");
        let body_x = b.ident("x");
        let ret = b.ret(Some(body_x));
        let id = b.generic_func("id", &["T"], vec![x], Some(ret_ty), vec![ret]);

        let mut stmts = Vec::new();
        for value in [b.int(1), b.int(2), b.float(1.5)] {
            let call = b.call("id", vec![value]);
            ids.push(call.id);
            stmts.push(b.expr_stmt(call));
        }
        (vec![Decl::Function(id)], stmts)
    }));
    result.unwrap();

    assert_eq!(analyzer.templates.len(), 2);
    let resolved: Vec<_> = ids.iter().map(|id| analyzer.expr_data.call(*id)).collect();
    assert_eq!(resolved[0], resolved[1]);
    assert_ne!(resolved[0], resolved[2]);
    assert_eq!(analyzer.expr_data.get_type(ids[2]), Some(TypeId::FLOAT));
}

#[test]
fn equally_good_conversions_are_ambiguous() {
    let (_, result) = analyze(Box::new(|b| {
        let mut decls = Vec::new();
        for (first, second) in [("int", "float"), ("float", "int")] {
            let a = b.ty(first);
            let a = b.param("a", a);
            let c = b.ty(second);
            let c = b.param("c", c);
            decls.push(Decl::Function(b.func("h", vec![a, c], None, Vec::new())));
        }
        let one = b.int(1);
        let other = b.int(1);
        let call = b.call("h", vec![one, other]);
        let call = b.expr_stmt(call);
        (decls, vec![call])
    }));
    let SemanticError::DuplicatedDefinitions { signature, .. } = expect_error(result) else {
        panic!("expected an ambiguity");
    };
    assert_eq!(signature, "h(int, int)");
}

fn entry_point(b: &mut AstBuilder, body: Vec<Stmt>) -> Decl {
    let mut main = b.func("main", Vec::new(), None, body);
    let attr = b.attribute("CodeEntry", &[]);
    main.attributes.push(attr);
    Decl::Function(main)
}

fn call_stmt(b: &mut AstBuilder, name: &str) -> Stmt {
    let call = b.call(name, Vec::new());
    b.expr_stmt(call)
}

#[test]
fn unused_functions_are_eliminated() {
    let (analyzer, result) = analyze(Box::new(|b| {
        let used = Decl::Function(b.func("used", Vec::new(), None, Vec::new()));
        let calls_used = call_stmt(b, "used");
        let unused = Decl::Function(b.func("unused", Vec::new(), None, vec![calls_used]));
        let calls_used = call_stmt(b, "used");
        let main = entry_point(b, vec![calls_used]);
        (vec![used, unused, main], Vec::new())
    }));
    result.unwrap();

    let used = callables_named(&analyzer, "used")[0];
    let unused = callables_named(&analyzer, "unused")[0];
    let main = callables_named(&analyzer, "main")[0];
    assert!(analyzer.live.contains(used));
    assert!(analyzer.live.contains(main));
    assert!(!analyzer.live.contains(unused));

    let count = analyzer.usage.get(used);
    assert_eq!(count.times_used_total, 2);
    assert_eq!(count.times_used, 1);
}

#[test]
fn self_recursion_does_not_keep_a_function_alive() {
    let (analyzer, result) = analyze(Box::new(|b| {
        let again = call_stmt(b, "spin");
        let spin = Decl::Function(b.func("spin", Vec::new(), None, vec![again]));
        let main = entry_point(b, Vec::new());
        (vec![spin, main], Vec::new())
    }));
    result.unwrap();

    let spin = callables_named(&analyzer, "spin")[0];
    assert!(!analyzer.live.contains(spin));
    assert_eq!(analyzer.usage.get(spin).times_used_total, 0);
}

#[test]
fn elimination_can_be_switched_off() {
    let config = SemaConfig {
        eliminate_unused: false,
        ..SemaConfig::default()
    };
    let (analyzer, result) = analyze_with(config, Box::new(|b| {
        let lonely = Decl::Function(b.func("lonely", Vec::new(), None, Vec::new()));
        (vec![lonely], Vec::new())
    }));
    result.unwrap();
    let lonely = callables_named(&analyzer, "lonely")[0];
    assert!(analyzer.live.contains(lonely));
}

#[test]
fn macro_expression_folds_to_a_constant() {
    let mut call_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        // macro twice(x) { return x + x; }
        let left = b.ident("x");
        let right = b.ident("x");
        let sum = b.binary(left, BinaryOp::Add, right);
        let ret = b.ret(Some(sum));
        let twice = b.macro_decl("twice", &["x"], vec![ret]);

        let arg = b.int(21);
        let call = b.call("twice", vec![arg]);
        call_id = call.id;
        let int = b.ty("int");
        let constant = b.const_stmt("N", Some(int), call);
        (vec![Decl::Macro(twice)], vec![constant])
    }));
    result.unwrap();

    assert!(matches!(analyzer.expr_data.call(call_id), Some(ResolvedCall::Macro(_))));
    assert_eq!(analyzer.expr_data.constant(call_id), Some(DataItem::Integer(42)));
    assert!(matches!(analyzer.expr_data.inlined(call_id), Some(InlineResult::Expr(_))));
}

#[test]
fn macro_locals_are_renamed_at_the_call_site() {
    let mut call_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        let g = unary_func(b, "g", "int");
        // macro m(a) { var t = a; g(t); }
        let a = b.ident("a");
        let local = b.var("t", None, Some(a));
        let t = b.ident("t");
        let use_t = b.call("g", vec![t]);
        let use_t = b.expr_stmt(use_t);
        let m = b.macro_decl("m", &["a"], vec![local, use_t]);

        // var t: int = 1; m(t + 1);
        let int = b.ty("int");
        let one = b.int(1);
        let caller_t = b.var("t", Some(int), Some(one));
        let t = b.ident("t");
        let one = b.int(1);
        let arg = b.binary(t, BinaryOp::Add, one);
        let call = b.call("m", vec![arg]);
        call_id = call.id;
        let call = b.expr_stmt(call);
        (vec![g, Decl::Macro(m)], vec![caller_t, call])
    }));
    result.unwrap();

    let Some(InlineResult::Block(block)) = analyzer.expr_data.inlined(call_id) else {
        panic!("statement macro inlines to a block");
    };
    let Stmt::Var(var) = &block.stmts[0] else {
        panic!("first statement is the macro local");
    };
    assert_ne!(analyzer.interner.resolve(var.name), "t");
    assert_eq!(analyzer.name(var.name), "t");
}

fn unrolling(max_unroll_iterations: usize) -> SemaConfig {
    SemaConfig {
        unroll_loops: true,
        max_unroll_iterations,
        ..SemaConfig::default()
    }
}

#[test]
fn counting_loop_unrolls_into_blocks() {
    let mut loop_id = NodeId::default();
    let (analyzer, result) = analyze_with(unrolling(64), Box::new(|b| {
        let g = unary_func(b, "g", "int");
        let i = b.ident("i");
        let call = b.call("g", vec![i]);
        let call = b.expr_stmt(call);
        let for_stmt = b.counting_loop("i", 0, 3, vec![call]);
        loop_id = for_stmt.id;
        (vec![g], vec![Stmt::For(for_stmt)])
    }));
    result.unwrap();
    assert_eq!(analyzer.expr_data.unrolled(loop_id).map(<[_]>::len), Some(3));
}

#[test]
fn loop_bounded_by_array_length_unrolls() {
    // var a: int[3];
    // for (var i = 0; i < a.Length; i = i + 1) {}
    let mut loop_id = NodeId::default();
    let (analyzer, result) = analyze_with(unrolling(64), Box::new(|b| {
        let int = b.ty("int");
        let three = b.int(3);
        let array = b.array(int, three);
        let a = b.var("a", Some(array), None);

        let zero = b.int(0);
        let init = b.var("i", None, Some(zero));
        let i = b.ident("i");
        let array = b.ident("a");
        let length = b.field(array, "Length");
        let condition = b.binary(i, BinaryOp::Lt, length);
        let i = b.ident("i");
        let one = b.int(1);
        let next = b.binary(i, BinaryOp::Add, one);
        let update = b.assign_to("i", next);
        let for_stmt = b.for_stmt(Some(init), Some(condition), Some(update), Vec::new());
        loop_id = for_stmt.id;
        (Vec::new(), vec![a, Stmt::For(for_stmt)])
    }));
    result.unwrap();
    assert_eq!(analyzer.expr_data.unrolled(loop_id).map(<[_]>::len), Some(3));
}

#[test]
fn unroll_budget_is_fatal() {
    let (_, result) = analyze_with(unrolling(4), Box::new(|b| {
        let for_stmt = b.counting_loop("i", 0, 10, Vec::new());
        (Vec::new(), vec![Stmt::For(for_stmt)])
    }));
    assert!(matches!(expect_error(result), SemanticError::UnrollLimitExceeded { limit: 4, .. }));
}

#[test]
fn loops_stay_rolled_unless_asked() {
    let mut loop_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        let for_stmt = b.counting_loop("i", 0, 3, Vec::new());
        loop_id = for_stmt.id;
        (Vec::new(), vec![Stmt::For(for_stmt)])
    }));
    result.unwrap();
    assert!(analyzer.expr_data.unrolled(loop_id).is_none());
}

#[test]
fn constant_condition_is_reported() {
    let (analyzer, result) = analyze(Box::new(|b| {
        let int = b.ty("int");
        let zero = b.int(0);
        let debug = b.const_stmt("DEBUG", Some(int), zero);
        let condition = b.ident("DEBUG");
        let branch = b.if_stmt(condition, Vec::new(), None);
        (Vec::new(), vec![debug, branch])
    }));
    result.unwrap();
    assert!(analyzer.warnings.iter().any(|w| matches!(
        w.warning,
        SemanticWarning::ConstantCondition { value: false, .. }
    )));
}

#[test]
fn literal_condition_is_not_reported() {
    let (analyzer, result) = analyze(Box::new(|b| {
        let yes = b.int(1);
        let brk = Stmt::Break(Span::default());
        let forever = b.while_stmt(yes, vec![brk]);
        (Vec::new(), vec![forever])
    }));
    result.unwrap();
    assert!(analyzer.warnings.is_empty());
}

#[test]
fn code_after_return_is_unreachable() {
    let (analyzer, result) = analyze(Box::new(|b| {
        let g = unary_func(b, "g", "int");
        let ret = b.ret(None);
        let one = b.int(1);
        let call = b.call("g", vec![one]);
        let first = b.expr_stmt(call);
        let two = b.int(2);
        let call = b.call("g", vec![two]);
        let second = b.expr_stmt(call);
        let f = Decl::Function(b.func("f", Vec::new(), None, vec![ret, first, second]));
        (vec![g, f], Vec::new())
    }));
    result.unwrap();
    let unreachable = analyzer
        .warnings
        .iter()
        .filter(|w| matches!(w.warning, SemanticWarning::UnreachableStatement { .. }))
        .count();
    assert_eq!(unreachable, 1);
}

#[test]
fn constants_cannot_be_assigned() {
    let (_, result) = analyze(Box::new(|b| {
        let one = b.int(1);
        let n = b.const_stmt("N", None, one);
        let two = b.int(2);
        let assign = b.assign_to("N", two);
        (Vec::new(), vec![n, assign])
    }));
    let SemanticError::AssignToConstant { name, .. } = expect_error(result) else {
        panic!("expected an assignment error");
    };
    assert_eq!(name, "N");
}

#[test]
fn break_outside_loop_is_rejected() {
    let (_, result) = analyze(Box::new(|_| (Vec::new(), vec![Stmt::Break(Span::default())])));
    assert!(matches!(expect_error(result), SemanticError::InvalidBreak { .. }));
}

#[test]
fn constant_index_past_the_end_is_rejected() {
    let (_, result) = analyze(Box::new(|b| {
        let int = b.ty("int");
        let four = b.int(4);
        let array = b.array(int, four);
        let decl = b.var("a", Some(array), None);
        let a = b.ident("a");
        let four = b.int(4);
        let index = b.index(a, four);
        let index = b.expr_stmt(index);
        (Vec::new(), vec![decl, index])
    }));
    assert!(matches!(
        expect_error(result),
        SemanticError::IndexOutOfBounds { index: 4, size: 4, .. }
    ));
}

#[test]
fn stack_array_element_records_its_size() {
    let mut index_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        let float = b.ty("float");
        let four = b.int(4);
        let array = b.array(float, four);
        let decl = b.var("a", Some(array), None);
        let a = b.ident("a");
        let three = b.int(3);
        let index = b.index(a, three);
        index_id = index.id;
        let index = b.expr_stmt(index);
        (Vec::new(), vec![decl, index])
    }));
    result.unwrap();
    assert!(matches!(
        analyzer.expr_data.call(index_id),
        Some(ResolvedCall::ArrayElement { element_size: 1 })
    ));
    assert_eq!(analyzer.expr_data.get_type(index_id), Some(TypeId::FLOAT));
}

#[test]
fn class_indexer_resolves_to_general_function() {
    let mut index_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        // class Bag { indexer_get(i: int) -> int { return i; } }
        let mut bag = b.class_decl("Bag", &[], Vec::new());
        let i = int_param(b, "i");
        let int = b.ty("int");
        let body_i = b.ident("i");
        let ret = b.ret(Some(body_i));
        let getter = b.func("indexer_get", vec![i], Some(int), vec![ret]);
        bag.members.general_functions.push(getter);

        let bag_ty = b.ty("Bag");
        let created = b.new_expr(bag_ty, Vec::new());
        let decl = b.var("bag", None, Some(created));
        let bag_ref = b.ident("bag");
        let zero = b.int(0);
        let index = b.index(bag_ref, zero);
        index_id = index.id;
        let int = b.ty("int");
        let read = b.var("v", Some(int), Some(index));
        (vec![Decl::Class(bag)], vec![decl, read])
    }));
    result.unwrap();

    let Some(ResolvedCall::Callable(getter)) = analyzer.expr_data.call(index_id) else {
        panic!("indexing a class goes through its indexer");
    };
    assert_eq!(
        analyzer.registry.callable(getter).kind,
        CallableKind::General(GeneralKind::IndexerGet)
    );
}

#[test]
fn delete_without_destructor_is_builtin() {
    let mut delete_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        let int = b.ty("int");
        let x = b.field_decl("x", int);
        let point = b.struct_decl("Point", &[], vec![x]);
        let point_ty = b.ty("Point");
        let created = b.new_expr(point_ty, Vec::new());
        let decl = b.var("p", None, Some(created));
        let p = b.ident("p");
        let delete = b.keyword(Keyword::Delete, p);
        delete_id = delete.id;
        let delete = b.expr_stmt(delete);
        (vec![Decl::Struct(point)], vec![decl, delete])
    }));
    result.unwrap();
    assert_eq!(analyzer.expr_data.call(delete_id), Some(ResolvedCall::BuiltinDelete));
}

#[test]
fn duplicate_function_is_rejected() {
    let (_, result) = analyze(Box::new(|b| {
        let first = unary_func(b, "f", "int");
        let second = unary_func(b, "f", "int");
        (vec![first, second], Vec::new())
    }));
    let SemanticError::AlreadyDefined { name, .. } = expect_error(result) else {
        panic!("expected a redefinition");
    };
    assert_eq!(name, "f");
}

#[test]
fn enum_members_are_constants() {
    let mut member_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        let five = b.int(5);
        let color = b.enum_decl("Color", vec![("Red", None), ("Green", Some(five)), ("Blue", None)]);
        let object = b.ident("Color");
        let blue = b.field(object, "Blue");
        member_id = blue.id;
        let constant = b.const_stmt("B", None, blue);
        (vec![Decl::Enum(color)], vec![constant])
    }));
    result.unwrap();
    assert_eq!(analyzer.expr_data.constant(member_id), Some(DataItem::Integer(6)));
}

#[test]
fn generic_struct_method_uses_owner_arguments() {
    let mut call_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        // struct Box<T> { value: T; get() -> T { return this.value; } }
        let t = b.ty("T");
        let value = b.field_decl("value", t);
        let mut boxed = b.struct_decl("Box", &["T"], vec![value]);
        let this = b.ident("this");
        let field = b.field(this, "value");
        let ret = b.ret(Some(field));
        let t = b.ty("T");
        let get = b.func("get", Vec::new(), Some(t), vec![ret]);
        boxed.members.methods.push(get);

        // var bx: Box<int>; var v = bx.get();
        let int = b.ty("int");
        let box_int = b.generic_ty("Box", vec![int]);
        let decl = b.var("bx", Some(box_int), None);
        let bx = b.ident("bx");
        let call = b.method_call(bx, "get", Vec::new());
        call_id = call.id;
        let read = b.var("v", None, Some(call));
        (vec![Decl::Struct(boxed)], vec![decl, read])
    }));
    result.unwrap();

    assert_eq!(analyzer.expr_data.get_type(call_id), Some(TypeId::INTEGER));
    let Some(ResolvedCall::Callable(instance)) = analyzer.expr_data.call(call_id) else {
        panic!("method call resolves to an instance");
    };
    assert!(analyzer.registry.callable(instance).is_instance());
}

type BuildFiles<'a> = Box<dyn FnOnce(&mut AstBuilder) -> Vec<SourceFile> + 'a>;

fn analyze_files(build: BuildFiles<'_>) -> (Analyzer, SemaResult<()>) {
    let mut b = AstBuilder::new();
    let files = build(&mut b);
    let (program, interner) = b.finish(files);
    let mut analyzer = AnalyzerBuilder::new(interner).build();
    let result = analyzer.analyze(&program);
    (analyzer, result)
}

/// `class Bag { <general> }`
fn bag_with(b: &mut AstBuilder, general: FuncDecl) -> Decl {
    let mut bag = b.class_decl("Bag", &[], Vec::new());
    bag.members.general_functions.push(general);
    Decl::Class(bag)
}

#[test]
fn indexer_getter_needs_an_int_index() {
    let (_, result) = analyze(Box::new(|b| {
        let float = b.ty("float");
        let i = b.param("i", float);
        let int = b.ty("int");
        let zero = b.int(0);
        let ret = b.ret(Some(zero));
        let getter = b.func("indexer_get", vec![i], Some(int), vec![ret]);
        (vec![bag_with(b, getter)], Vec::new())
    }));
    assert!(matches!(expect_error(result), SemanticError::InvalidIndexerGet { .. }));
}

#[test]
fn indexer_setter_needs_index_and_value() {
    let (_, result) = analyze(Box::new(|b| {
        let i = int_param(b, "i");
        let setter = b.func("indexer_set", vec![i], None, Vec::new());
        (vec![bag_with(b, setter)], Vec::new())
    }));
    assert!(matches!(expect_error(result), SemanticError::InvalidIndexerSet { .. }));
}

#[test]
fn destructor_takes_no_parameters() {
    let (_, result) = analyze(Box::new(|b| {
        let x = int_param(b, "x");
        let destructor = b.func("destructor", vec![x], None, Vec::new());
        (vec![bag_with(b, destructor)], Vec::new())
    }));
    assert!(matches!(expect_error(result), SemanticError::InvalidDestructor { .. }));
}

#[test]
fn clone_returns_the_owner() {
    let (_, result) = analyze(Box::new(|b| {
        let int = b.ty("int");
        let zero = b.int(0);
        let ret = b.ret(Some(zero));
        let clone = b.func("clone", Vec::new(), Some(int), vec![ret]);
        (vec![bag_with(b, clone)], Vec::new())
    }));
    let SemanticError::InvalidClone { ty, .. } = expect_error(result) else {
        panic!("expected a clone shape error");
    };
    assert_eq!(ty, "Bag");
}

#[test]
fn second_entry_point_is_rejected() {
    let (_, result) = analyze(Box::new(|b| {
        let main = entry_point(b, Vec::new());
        let mut start = b.func("start", Vec::new(), None, Vec::new());
        let attr = b.attribute("CodeEntry", &[]);
        start.attributes.push(attr);
        (vec![main, Decl::Function(start)], Vec::new())
    }));
    assert!(matches!(expect_error(result), SemanticError::DuplicateEntryPoint { .. }));
}

#[test]
fn template_cannot_be_entry_point() {
    let (_, result) = analyze(Box::new(|b| {
        let t = b.ty("T");
        let x = b.param("x", t);
        let mut main = b.generic_func("main", &["T"], vec![x], None, Vec::new());
        let attr = b.attribute("CodeEntry", &[]);
        main.attributes.push(attr);
        (vec![Decl::Function(main)], Vec::new())
    }));
    assert!(matches!(expect_error(result), SemanticError::TemplateEntryPoint { .. }));
}

#[test]
fn method_cannot_be_entry_point() {
    let (analyzer, result) = analyze(Box::new(|b| {
        let mut app = b.struct_decl("App", &[], Vec::new());
        let mut run = b.func("run", Vec::new(), None, Vec::new());
        let attr = b.attribute("CodeEntry", &[]);
        run.attributes.push(attr);
        app.members.methods.push(run);
        (vec![Decl::Struct(app)], Vec::new())
    }));
    assert!(analyzer.registry.entry_point().is_none());
    assert!(matches!(expect_error(result), SemanticError::MethodEntryPoint { .. }));
}

#[test]
fn enum_members_share_one_type() {
    let (_, result) = analyze(Box::new(|b| {
        let one = b.int(1);
        let half = b.float(1.5);
        let mixed = b.enum_decl("Mixed", vec![("A", Some(one)), ("B", Some(half))]);
        (vec![Decl::Enum(mixed)], Vec::new())
    }));
    let SemanticError::EnumMixedTypes { name, .. } = expect_error(result) else {
        panic!("expected mixed member types");
    };
    assert_eq!(name, "Mixed");
}

#[test]
fn enum_value_must_be_literal() {
    let (_, result) = analyze(Box::new(|b| {
        let x = b.ident("x");
        let flags = b.enum_decl("Flags", vec![("A", Some(x))]);
        (vec![Decl::Enum(flags)], Vec::new())
    }));
    let SemanticError::EnumValueNotConstant { member, .. } = expect_error(result) else {
        panic!("expected a non-constant member");
    };
    assert_eq!(member, "A");
}

#[test]
fn duplicate_struct_in_one_file_is_rejected() {
    let (_, result) = analyze(Box::new(|b| {
        let first = b.struct_decl("Point", &[], Vec::new());
        let second = b.struct_decl("Point", &[], Vec::new());
        (vec![Decl::Struct(first), Decl::Struct(second)], Vec::new())
    }));
    let SemanticError::AlreadyDefined { kind, name, .. } = expect_error(result) else {
        panic!("expected a redefinition");
    };
    assert_eq!((kind.as_str(), name.as_str()), ("type", "Point"));
}

#[test]
fn same_struct_name_in_two_files_stays_distinct() {
    // a.brim: struct Point { x: int }          var pa: Point;
    // b.brim: struct Point { x: int, y: int }  var pb: Point;
    let mut names = None;
    let (analyzer, result) = analyze_files(Box::new(|b| {
        names = Some((b.sym("pa"), b.sym("pb")));
        let int = b.ty("int");
        let x = b.field_decl("x", int);
        let narrow = b.struct_decl("Point", &[], vec![x]);
        let point = b.ty("Point");
        let pa = b.var("pa", Some(point), None);
        let a = b.file("a.brim", vec![Decl::Struct(narrow)], vec![pa]);

        let int = b.ty("int");
        let x = b.field_decl("x", int);
        let int = b.ty("int");
        let y = b.field_decl("y", int);
        let wide = b.struct_decl("Point", &[], vec![x, y]);
        let point = b.ty("Point");
        let pb = b.var("pb", Some(point), None);
        let second = b.file("b.brim", vec![Decl::Struct(wide)], vec![pb]);
        vec![a, second]
    }));
    result.unwrap();

    assert_eq!(analyzer.registry.structs.len(), 2);
    let global = |name: Symbol| {
        let id = analyzer.registry.globals.find(|g| g.name == name).expect("global is declared");
        analyzer.registry.globals.get(id).clone()
    };
    let (pa, pb) = names.expect("names are interned");
    let (pa, pb) = (global(pa), global(pb));
    assert_ne!(pa.ty, pb.ty);
    assert_eq!(pb.offset, 1);
    assert_eq!(analyzer.global_slots, 3);
}

#[test]
fn pointer_index_is_an_offset() {
    let mut index_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        let int = b.ty("int");
        let ptr = b.pointer(int);
        let decl = b.var("p", Some(ptr), None);
        let p = b.ident("p");
        let two = b.int(2);
        let index = b.index(p, two);
        index_id = index.id;
        let read = b.var("v", None, Some(index));
        (Vec::new(), vec![decl, read])
    }));
    result.unwrap();
    assert_eq!(
        analyzer.expr_data.call(index_id),
        Some(ResolvedCall::PointerOffset { element_size: 1 })
    );
    assert_eq!(analyzer.expr_data.get_type(index_id), Some(TypeId::INTEGER));
}

#[test]
fn function_name_is_a_value() {
    let mut value_id = NodeId::default();
    let (analyzer, result) = analyze(Box::new(|b| {
        let f = unary_func(b, "f", "int");
        let value = b.ident("f");
        value_id = value.id;
        let decl = b.var("g", None, Some(value));
        (vec![f], vec![decl])
    }));
    result.unwrap();
    let f = callables_named(&analyzer, "f")[0];
    assert_eq!(analyzer.expr_data.call(value_id), Some(ResolvedCall::FunctionValue(f)));
}

#[test]
fn overloaded_function_value_is_ambiguous() {
    let (_, result) = analyze(Box::new(|b| {
        let f_int = unary_func(b, "f", "int");
        let f_float = unary_func(b, "f", "float");
        let value = b.ident("f");
        let decl = b.var("g", None, Some(value));
        (vec![f_int, f_float], vec![decl])
    }));
    let SemanticError::AmbiguousFunction { name, .. } = expect_error(result) else {
        panic!("expected an ambiguous function value");
    };
    assert_eq!(name, "f");
}

#[test]
fn temp_on_a_temporary_is_hinted() {
    let (analyzer, result) = analyze(Box::new(|b| {
        let g = unary_func(b, "g", "int");
        let one = b.int(1);
        let arg = b.arg_with(ArgModifier::Temp, one);
        let call = b.call_with("g", Vec::new(), vec![arg]);
        let call = b.expr_stmt(call);
        (vec![g], vec![call])
    }));
    result.unwrap();
    assert!(matches!(
        analyzer.hints(),
        [CompileHint {
            hint: SemanticHint::RedundantTemp { .. },
            ..
        }]
    ));
}

#[test]
fn pointer_offset_past_slot_range_is_an_error() {
    // struct S { a: int, b: int, c: int }
    // var p: S*;
    // p[1000000000].a = 1;
    let (_, result) = analyze(Box::new(|b| {
        let fields = ["a", "b", "c"].map(|name| {
            let int = b.ty("int");
            b.field_decl(name, int)
        });
        let s = b.struct_decl("S", &[], fields.into());
        let s_ty = b.ty("S");
        let ptr = b.pointer(s_ty);
        let decl = b.var("p", Some(ptr), None);
        let p = b.ident("p");
        let far = b.int(1_000_000_000);
        let element = b.index(p, far);
        let target = b.field(element, "a");
        let one = b.int(1);
        let assign = b.assign(target, one);
        (vec![Decl::Struct(s)], vec![decl, assign])
    }));
    assert!(matches!(expect_error(result), SemanticError::AddressOverflow { .. }));
}

#[test]
fn oversized_global_is_an_error() {
    // var a: int[70000][70000];
    let (_, result) = analyze(Box::new(|b| {
        let int = b.ty("int");
        let rows = b.int(70_000);
        let row = b.array(int, rows);
        let columns = b.int(70_000);
        let grid = b.array(row, columns);
        let decl = b.var("a", Some(grid), None);
        (Vec::new(), vec![decl])
    }));
    assert!(matches!(expect_error(result), SemanticError::TypeTooLarge { .. }));
}
