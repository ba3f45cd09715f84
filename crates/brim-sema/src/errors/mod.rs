// errors/mod.rs
//! Semantic analysis errors (E2xxx), internal errors (E9xxx),
//! warnings (W3xxx) and hints (H4xxx).

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticError {
    #[error("type '{name}' not found")]
    #[diagnostic(code(E2001))]
    TypeNotFound {
        name: String,
        #[label("unknown type")]
        span: SourceSpan,
    },

    #[error("expected {expected} type arguments, found {found}")]
    #[diagnostic(code(E2002))]
    WrongTypeArgCount {
        expected: usize,
        found: usize,
        #[label("wrong number of type arguments")]
        span: SourceSpan,
    },

    #[error("array size must be a compile-time constant integer")]
    #[diagnostic(code(E2003))]
    ArraySizeNotConstant {
        #[label("not computable at compile time")]
        span: SourceSpan,
    },

    #[error("invalid array size {size}")]
    #[diagnostic(code(E2004))]
    InvalidArraySize {
        size: i64,
        #[label("array size must not be negative")]
        span: SourceSpan,
    },

    #[error("{kind} '{name}' is already defined in this file")]
    #[diagnostic(code(E2005))]
    AlreadyDefined {
        kind: String,
        name: String,
        #[label("redefinition")]
        span: SourceSpan,
    },

    #[error("duplicated definitions for '{signature}'")]
    #[diagnostic(
        code(E2006),
        help("more than one declaration matches this call equally well")
    )]
    DuplicatedDefinitions {
        signature: String,
        #[label("ambiguous call")]
        span: SourceSpan,
    },

    #[error("'{name}' refers to more than one function")]
    #[diagnostic(
        code(E2007),
        help("annotate the expected function type to pick an overload")
    )]
    AmbiguousFunction {
        name: String,
        #[label("ambiguous function reference")]
        span: SourceSpan,
    },

    #[error("no function matches '{signature}'")]
    #[diagnostic(code(E2008))]
    FunctionNotFound {
        signature: String,
        #[label("no matching declaration")]
        span: SourceSpan,
    },

    #[error("no operator matches '{signature}'")]
    #[diagnostic(code(E2009))]
    OperatorNotFound {
        signature: String,
        #[label("no matching operator")]
        span: SourceSpan,
    },

    #[error("no constructor matches '{signature}'")]
    #[diagnostic(code(E2010))]
    ConstructorNotFound {
        signature: String,
        #[label("no matching constructor")]
        span: SourceSpan,
    },

    #[error("type '{ty}' has no method '{method}'")]
    #[diagnostic(code(E2011))]
    MethodNotFound {
        ty: String,
        method: String,
        #[label("unknown method")]
        span: SourceSpan,
    },

    #[error("type '{ty}' has no field '{field}'")]
    #[diagnostic(code(E2012))]
    FieldNotFound {
        ty: String,
        field: String,
        #[label("unknown field")]
        span: SourceSpan,
    },

    #[error("undefined variable '{name}'")]
    #[diagnostic(code(E2013))]
    UndefinedVariable {
        name: String,
        #[label("not found in scope")]
        span: SourceSpan,
    },

    #[error("constant '{name}' is already defined")]
    #[diagnostic(
        code(E2014),
        help("constant names must be unique across all enclosing scopes")
    )]
    ConstantAlreadyDefined {
        name: String,
        #[label("shadows a visible constant")]
        span: SourceSpan,
    },

    #[error("value of constant '{name}' is not computable at compile time")]
    #[diagnostic(code(E2015))]
    ConstantNotComputable {
        name: String,
        #[label("not a compile-time value")]
        span: SourceSpan,
    },

    #[error("expected {expected} arguments, found {found}")]
    #[diagnostic(code(E2016))]
    WrongArgumentCount {
        expected: usize,
        found: usize,
        #[label("wrong number of arguments")]
        span: SourceSpan,
    },

    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(E2017))]
    TypeMismatch {
        expected: String,
        found: String,
        #[label("type mismatch")]
        span: SourceSpan,
    },

    #[error("cannot assign to constant '{name}'")]
    #[diagnostic(code(E2018))]
    AssignToConstant {
        name: String,
        #[label("constants are immutable")]
        span: SourceSpan,
    },

    #[error("cannot infer the type of '{name}'")]
    #[diagnostic(code(E2019), help("add a type annotation or an initializer"))]
    VarNeedsType {
        name: String,
        #[label("no type annotation and no initializer")]
        span: SourceSpan,
    },

    #[error("sizeof takes exactly one type argument or exactly one value argument")]
    #[diagnostic(code(E2020))]
    SizeOfShape {
        #[label("invalid sizeof")]
        span: SourceSpan,
    },

    #[error("destructor must take no parameters and return void")]
    #[diagnostic(code(E2021))]
    InvalidDestructor {
        #[label("invalid destructor signature")]
        span: SourceSpan,
    },

    #[error("clone must take no parameters and return '{ty}'")]
    #[diagnostic(code(E2022))]
    InvalidClone {
        ty: String,
        #[label("invalid clone signature")]
        span: SourceSpan,
    },

    #[error("indexer getter must take exactly one int index and return a value")]
    #[diagnostic(code(E2023))]
    InvalidIndexerGet {
        #[label("invalid indexer getter")]
        span: SourceSpan,
    },

    #[error("indexer setter must take exactly one int index and one value, and return void")]
    #[diagnostic(code(E2024))]
    InvalidIndexerSet {
        #[label("invalid indexer setter")]
        span: SourceSpan,
    },

    #[error("unknown general function '{name}'")]
    #[diagnostic(
        code(E2025),
        help("general functions are destructor, clone, indexer_get and indexer_set")
    )]
    UnknownGeneralFunction {
        name: String,
        #[label("not a general function")]
        span: SourceSpan,
    },

    #[error("type '{ty}' cannot be indexed")]
    #[diagnostic(code(E2026), help("declare indexer_get / indexer_set on the type"))]
    IndexerNotFound {
        ty: String,
        #[label("no indexer")]
        span: SourceSpan,
    },

    #[error("value of enum member '{member}' is not a constant")]
    #[diagnostic(
        code(E2027),
        help("enum values may only use literals and operators")
    )]
    EnumValueNotConstant {
        member: String,
        #[label("not a literal expression")]
        span: SourceSpan,
    },

    #[error("members of enum '{name}' have different types")]
    #[diagnostic(code(E2028))]
    EnumMixedTypes {
        name: String,
        #[label("all members must share one type")]
        span: SourceSpan,
    },

    #[error("unknown external function '{name}'")]
    #[diagnostic(code(E2029))]
    UnknownExternal {
        name: String,
        #[label("no host function with this name")]
        span: SourceSpan,
    },

    #[error("signature of '{name}' does not match the host function")]
    #[diagnostic(code(E2030), help("host function is {expected}"))]
    ExternalSignatureMismatch {
        name: String,
        expected: String,
        #[label("signature mismatch")]
        span: SourceSpan,
    },

    #[error("more than one entry point")]
    #[diagnostic(code(E2031))]
    DuplicateEntryPoint {
        #[label("second [CodeEntry]")]
        span: SourceSpan,
    },

    #[error("entry point cannot be a template")]
    #[diagnostic(code(E2032))]
    TemplateEntryPoint {
        #[label("template function")]
        span: SourceSpan,
    },

    #[error("entry point must be a free function")]
    #[diagnostic(code(E2052))]
    MethodEntryPoint {
        #[label("[CodeEntry] on a member")]
        span: SourceSpan,
    },

    #[error("no entry point")]
    #[diagnostic(code(E2033), help("mark one function with [CodeEntry]"))]
    MissingEntryPoint {
        #[label("program has no [CodeEntry] function")]
        span: SourceSpan,
    },

    #[error("type replacer '{alias}' is already defined")]
    #[diagnostic(code(E2034))]
    DuplicateTypeReplacer {
        alias: String,
        #[label("second [Define]")]
        span: SourceSpan,
    },

    #[error("collapse of {what} is not implemented")]
    #[diagnostic(code(E2035))]
    CollapseNotImplemented {
        what: String,
        #[label("cannot be simplified")]
        span: SourceSpan,
    },

    #[error("loop unrolling exceeded {limit} iterations")]
    #[diagnostic(
        code(E2036),
        help("the loop condition never becomes false at compile time")
    )]
    UnrollLimitExceeded {
        limit: usize,
        #[label("unroll budget exhausted")]
        span: SourceSpan,
    },

    #[error("array index must be a compile-time constant")]
    #[diagnostic(code(E2037))]
    IndexNotConstant {
        #[label("not computable at compile time")]
        span: SourceSpan,
    },

    #[error("index {index} is out of bounds for an array of {size}")]
    #[diagnostic(code(E2038))]
    IndexOutOfBounds {
        index: i64,
        size: u32,
        #[label("out of bounds")]
        span: SourceSpan,
    },

    #[error("elements of '{ty}' have no address")]
    #[diagnostic(code(E2039), help("access goes through the type's indexer"))]
    AddressRequiresIndexer {
        ty: String,
        #[label("indexed through a user-defined indexer")]
        span: SourceSpan,
    },

    #[error("expression is not an lvalue")]
    #[diagnostic(code(E2040))]
    NotAnLvalue {
        #[label("has no storage location")]
        span: SourceSpan,
    },

    #[error("size of generic parameter '{name}' is unknown")]
    #[diagnostic(code(E2041))]
    SizeOfGeneric {
        name: String,
        #[label("unresolved generic")]
        span: SourceSpan,
    },

    #[error("struct '{name}' contains itself")]
    #[diagnostic(code(E2042), help("use a pointer to break the cycle"))]
    RecursiveStruct {
        name: String,
        #[label("infinite size")]
        span: SourceSpan,
    },

    #[error("break outside of loop")]
    #[diagnostic(code(E2043))]
    InvalidBreak {
        #[label("not inside a loop")]
        span: SourceSpan,
    },

    #[error("'{name}' is not callable")]
    #[diagnostic(code(E2044))]
    NotCallable {
        name: String,
        #[label("not a function")]
        span: SourceSpan,
    },

    #[error("cannot dereference '{ty}'")]
    #[diagnostic(code(E2045))]
    InvalidDeref {
        ty: String,
        #[label("not a pointer")]
        span: SourceSpan,
    },

    #[error("condition must be integral, found {found}")]
    #[diagnostic(code(E2046))]
    InvalidCondition {
        found: String,
        #[label("not a condition")]
        span: SourceSpan,
    },

    #[error("cannot cast {from} to {to}")]
    #[diagnostic(code(E2047))]
    InvalidCast {
        from: String,
        to: String,
        #[label("invalid cast")]
        span: SourceSpan,
    },

    #[error("'{name}' has no size of its own")]
    #[diagnostic(code(E2048))]
    NoHeapSize {
        name: String,
        #[label("only values stored on the heap have a heap size")]
        span: SourceSpan,
    },

    #[error("'{name}' is a macro and cannot be used as a value")]
    #[diagnostic(code(E2049))]
    MacroAsValue {
        name: String,
        #[label("macro reference")]
        span: SourceSpan,
    },

    #[error("'{ty}' needs more slots than a frame can address")]
    #[diagnostic(code(E2050))]
    TypeTooLarge {
        ty: String,
        #[label("too large")]
        span: SourceSpan,
    },

    #[error("address offset does not fit in a slot index")]
    #[diagnostic(code(E2051))]
    AddressOverflow {
        #[label("offset overflows")]
        span: SourceSpan,
    },
}

/// Compiler defects (E9xxx). Never caused by user code alone.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum InternalError {
    #[error("template instance '{name}' left generic parameter '{param}' unresolved")]
    #[diagnostic(code(E9001))]
    UnresolvedGeneric {
        name: String,
        param: String,
        #[label("instantiated here")]
        span: SourceSpan,
    },

    #[error("layout requested for the invalid type")]
    #[diagnostic(code(E9002))]
    InvalidTypeLayout {
        #[label("here")]
        span: SourceSpan,
    },

    #[error("impossible state: {detail}")]
    #[diagnostic(code(E9003))]
    ImpossibleState {
        detail: String,
        #[label("here")]
        span: SourceSpan,
    },
}

/// Semantic warnings (W3xxx) - these don't prevent compilation but indicate potential issues
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticWarning {
    #[error("unknown attribute '{name}'")]
    #[diagnostic(code(W3001), help("known attributes are External, Define and CodeEntry"))]
    UnknownAttribute {
        name: String,
        #[label("ignored")]
        span: SourceSpan,
    },

    #[error("unreachable statement")]
    #[diagnostic(code(W3002))]
    UnreachableStatement {
        #[label("follows a return")]
        span: SourceSpan,
    },

    #[error("condition is always {value}")]
    #[diagnostic(code(W3003))]
    ConstantCondition {
        value: bool,
        #[label("computable at compile time")]
        span: SourceSpan,
    },
}

/// Style-only hints (H4xxx)
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticHint {
    #[error("redundant 'temp' modifier")]
    #[diagnostic(code(H4001), help("the argument is already a temporary"))]
    RedundantTemp {
        #[label("remove 'temp'")]
        span: SourceSpan,
    },

    #[error("redundant cast to '{ty}'")]
    #[diagnostic(code(H4002))]
    RedundantCast {
        ty: String,
        #[label("value already has this type")]
        span: SourceSpan,
    },
}
