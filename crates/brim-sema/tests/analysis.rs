// tests/analysis.rs
//
// End-to-end runs of the analyzer through its public surface: building,
// analyzing, reading the output and resolving addresses for code generation.
//
// Set BRIM_LOG=trace to see the analyzer's spans while a test runs.

use brim_sema::{
    AnalysisOutput, AnalyzerBuilder, BuiltinKind, CallableRef, DataItem, ErrorKind, HostFunction, HostType,
    ResolvedCall, SemaConfig, SemaResult, SemanticError, StorageLookup, TypeId, ValueAddress,
};
use brim_syntax::{AstBuilder, Decl, Expr, NodeId, Stmt, Symbol};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("BRIM_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

fn run(
    configure: impl FnOnce(AnalyzerBuilder) -> AnalyzerBuilder,
    mut b: AstBuilder,
    decls: Vec<Decl>,
    stmts: Vec<Stmt>,
) -> SemaResult<AnalysisOutput> {
    init_tracing();
    let file = b.file("main.brim", decls, stmts);
    let (program, interner) = b.finish(vec![file]);
    let mut analyzer = configure(AnalyzerBuilder::new(interner)).build();
    analyzer.analyze(&program)?;
    Ok(analyzer.into_output())
}

fn function_named(output: &AnalysisOutput, name: &str) -> CallableRef {
    output
        .registry
        .all_callables()
        .into_iter()
        .find(|c| output.interner.display_name(output.registry.callable(*c).name) == name)
        .unwrap_or_else(|| panic!("no callable named {name}"))
}

fn entry_point(b: &mut AstBuilder, body: Vec<Stmt>) -> Decl {
    let mut main = b.func("main", Vec::new(), None, body);
    let attr = b.attribute("CodeEntry", &[]);
    main.attributes.push(attr);
    Decl::Function(main)
}

#[test]
fn external_function_binds_to_host() {
    let mut b = AstBuilder::new();
    let int = b.ty("int");
    let value = b.param("value", int);
    let print = b.external_func("print", "host_print", vec![value], None);
    let five = b.int(5);
    let call = b.call("print", vec![five]);
    let call = b.expr_stmt(call);
    let main = entry_point(&mut b, vec![call]);

    let host = HostFunction::new(
        "host_print",
        vec![HostType::Builtin(BuiltinKind::Integer)],
        HostType::Builtin(BuiltinKind::Void),
    );
    let output = run(|a| a.with_host_function(host), b, vec![Decl::Function(print), main], Vec::new()).unwrap();

    let print = function_named(&output, "print");
    assert_eq!(output.registry.callable(print).external.as_deref(), Some("host_print"));
    assert!(output.is_live(print));
    assert_eq!(output.usage.get(print).times_used, 1);
}

#[test]
fn external_signature_must_match_host() {
    let mut b = AstBuilder::new();
    let float = b.ty("float");
    let value = b.param("value", float);
    let print = b.external_func("print", "host_print", vec![value], None);

    let host = HostFunction::new(
        "host_print",
        vec![HostType::Builtin(BuiltinKind::Integer)],
        HostType::Builtin(BuiltinKind::Void),
    );
    let err = run(|a| a.with_host_function(host), b, vec![Decl::Function(print)], Vec::new())
        .err()
        .expect("signature mismatch");
    assert!(matches!(err.as_semantic(), Some(SemanticError::ExternalSignatureMismatch { .. })));
}

#[test]
fn unknown_host_function_is_rejected() {
    let mut b = AstBuilder::new();
    let print = b.external_func("print", "nowhere", Vec::new(), None);
    let err = run(|a| a, b, vec![Decl::Function(print)], Vec::new())
        .err()
        .expect("unknown external");
    assert!(matches!(err.as_semantic(), Some(SemanticError::UnknownExternal { .. })));
}

#[test]
fn entry_point_can_be_required() {
    let config = SemaConfig {
        require_entry_point: true,
        ..SemaConfig::default()
    };
    let b = AstBuilder::new();
    let err = run(|a| a.with_config(config), b, Vec::new(), Vec::new())
        .err()
        .expect("no entry point");
    assert!(matches!(err.as_semantic(), Some(SemanticError::MissingEntryPoint { .. })));
    assert_eq!(err.kind(), ErrorKind::Compiler);
}

#[test]
fn errors_render_with_names() {
    let mut b = AstBuilder::new();
    let missing = b.ident("missing");
    let stmt = b.expr_stmt(missing);
    let err = run(|a| a, b, Vec::new(), vec![stmt]).err().expect("undefined variable");
    assert!(err.to_string().starts_with("undefined variable 'missing'"), "{err}");
}

struct Globals(Vec<(Symbol, ValueAddress, TypeId)>);

impl StorageLookup for Globals {
    fn storage_of(&self, name: Symbol) -> Option<(ValueAddress, TypeId)> {
        self.0
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(_, addr, ty)| (*addr, *ty))
    }
}

#[test]
fn output_resolves_global_addresses() {
    // struct Pair { a: int, b: int }
    // var first: int;
    // var pairs: Pair[3];
    let mut b = AstBuilder::new();
    let a = b.ty("int");
    let a = b.field_decl("a", a);
    let second = b.ty("int");
    let second = b.field_decl("b", second);
    let pair = b.struct_decl("Pair", &[], vec![a, second]);
    let int = b.ty("int");
    let first = b.var_decl("first", Some(int), None);
    let pair_ty = b.ty("Pair");
    let three = b.int(3);
    let array = b.array(pair_ty, three);
    let pairs = b.var_decl("pairs", Some(array), None);

    // pairs[2].b
    let base = b.ident("pairs");
    let two = b.int(2);
    let element = b.index(base, two);
    let access: Expr = b.field(element, "b");
    let pairs_sym = b.sym("pairs");

    let mut output = run(
        |a| a,
        b,
        vec![Decl::Struct(pair), Decl::Global(first), Decl::Global(pairs)],
        Vec::new(),
    )
    .unwrap();
    assert_eq!(output.global_slots, 1 + 3 * 2);

    let global = output
        .registry
        .globals
        .find(|g| g.name == pairs_sym)
        .map(|id| output.registry.globals.get(id).clone())
        .expect("pairs is declared");
    assert_eq!(global.offset, 1);

    let storage = Globals(vec![(pairs_sym, ValueAddress::global(global.offset as i32), global.ty)]);
    let (address, ty) = output.resolve_address(&access, &storage).unwrap();
    assert_eq!(address, ValueAddress::global(1 + 2 * 2 + 1));
    assert_eq!(ty, TypeId::INTEGER);
}

#[test]
fn sizeof_folds_to_slot_count() {
    let mut b = AstBuilder::new();
    let int = b.ty("int");
    let x = b.field_decl("x", int);
    let float = b.ty("float");
    let y = b.field_decl("y", float);
    let point = b.struct_decl("Point", &[], vec![x, y]);
    let point_ty = b.ty("Point");
    let size = b.size_of(point_ty);
    let size_id: NodeId = size.id;
    let constant = b.const_stmt("SIZE", None, size);

    let output = run(|a| a, b, vec![Decl::Struct(point)], vec![constant]).unwrap();
    assert_eq!(output.expression_data.call(size_id), Some(ResolvedCall::SizeOf(2)));
    assert_eq!(output.expression_data.constant(size_id), Some(DataItem::Integer(2)));
}

#[test]
fn only_live_template_instances_are_emitted() {
    // first<T>(x: T) -> T { return x; }
    // helper() { first(1.5); }
    // main() { first(1); }
    let mut b = AstBuilder::new();
    let t = b.ty("T");
    let x = b.param("x", t);
    let ret_ty = b.ty("T");
    let body_x = b.ident("x");
    let ret = b.ret(Some(body_x));
    let first = b.generic_func("first", &["T"], vec![x], Some(ret_ty), vec![ret]);

    let half = b.float(1.5);
    let call = b.call("first", vec![half]);
    let call = b.expr_stmt(call);
    let helper = b.func("helper", Vec::new(), None, vec![call]);

    let one = b.int(1);
    let call = b.call("first", vec![one]);
    let call = b.expr_stmt(call);
    let main = entry_point(&mut b, vec![call]);

    let output = run(
        |a| a,
        b,
        vec![Decl::Function(first), Decl::Function(helper), main],
        Vec::new(),
    )
    .unwrap();

    assert_eq!(output.template_instances.len(), 1);
    let instance = output.template_instances[0];
    assert_eq!(output.registry.callable(instance).ret, TypeId::INTEGER);
    assert!(!output.is_live(function_named(&output, "helper")));
}
