use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use super::*;
use crate::invoke::{call_depth, Args};
use mica_imports::{Binding, Package, UntypedError, UntypedKind, UntypedLit};
use mica_ir::ast::{BinaryOp, Block, Expr as Ast, FuncDecl, FuncLit, Literal, Param, Stmt};
use mica_ir::{FuncType, Kind, ReturnShape};
use mica_value::{Complex128, Complex64, EvalErrorKind, EvalResult, Function, Uintptr, Value};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const LIB: &str = "example.com/lib";

#[allow(clippy::approx_constant, reason = "an arbitrary float64 result")]
const ANSWER: f64 = 3.14;

struct Names(SharedInterner);

impl Names {
    fn new() -> Self {
        Names(SharedInterner::new())
    }

    fn name(&self, s: &str) -> Name {
        self.0.intern(s)
    }

    fn id(&self, s: &str) -> Ast {
        Ast::ident(self.name(s))
    }

    fn lib(&self, member: &str) -> Ast {
        Ast::selector(self.name("lib"), self.name(member))
    }

    fn call_lib(&self, member: &str, args: Vec<Ast>) -> Ast {
        Ast::call(self.lib(member), args)
    }

    fn param(&self, name: &str, ty: TypeDesc) -> Param {
        Param {
            name: self.name(name),
            ty,
        }
    }

    fn let_(&self, name: &str, init: Ast) -> Stmt {
        Stmt::Let {
            name: self.name(name),
            ty: None,
            init,
        }
    }
}

fn int(v: i64) -> Ast {
    Ast::lit(Literal::Int(v))
}

fn native<F>(name: &str, params: Vec<TypeDesc>, results: Vec<TypeDesc>, body: F) -> Binding
where
    F: Fn(&[Value]) -> EvalResult<Vec<Value>> + Send + Sync + 'static,
{
    Binding::func(Function::native(name, FuncType::new(params, results), body))
}

fn lib_package(ticks: &Arc<AtomicI64>) -> Package {
    let mut pkg = Package::new("lib");
    let mut bind = |name: &str, binding: Binding| {
        pkg.binds.insert(name.to_string(), binding);
    };

    bind("Pi", Binding::constant(Value::Float64(ANSWER), TypeDesc::FLOAT64));
    bind(
        "Answer",
        native("lib.Answer", vec![], vec![TypeDesc::FLOAT64], |_| {
            Ok(vec![Value::Float64(ANSWER)])
        }),
    );
    bind(
        "Pair",
        native(
            "lib.Pair",
            vec![],
            vec![TypeDesc::INT, TypeDesc::STRING],
            |_| Ok(vec![Value::Int(7), Value::string("seven")]),
        ),
    );
    bind(
        "Wide",
        native("lib.Wide", vec![], vec![TypeDesc::basic(Kind::Int8)], |_| {
            Ok(vec![Value::Int(300)])
        }),
    );
    bind(
        "ThreeHundred",
        native("lib.ThreeHundred", vec![], vec![TypeDesc::INT], |_| {
            Ok(vec![Value::Int(300)])
        }),
    );
    bind(
        "Boom",
        native("lib.Boom", vec![], vec![TypeDesc::INT], |_| {
            panic!("index out of range")
        }),
    );
    let counter = Arc::clone(ticks);
    bind(
        "Tick",
        native("lib.Tick", vec![], vec![TypeDesc::INT], move |_| {
            let tick = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(vec![Value::Int(tick as isize)])
        }),
    );
    let join_sig = FuncType::new(
        vec![TypeDesc::slice(TypeDesc::INT)],
        vec![TypeDesc::STRING],
    )
    .variadic();
    bind(
        "Join",
        Binding::func(Function::native("lib.Join", join_sig, |args| {
            let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
            Ok(vec![Value::string(parts.join(","))])
        })),
    );
    bind("Counter", Binding::var(Value::Int(0), TypeDesc::INT));
    bind("Big", Binding::constant(Value::Int64(1 << 40), TypeDesc::INT64));
    bind("Huge", Binding::constant(Value::Int(300), TypeDesc::INT));

    pkg.untypeds.insert(
        "Big".to_string(),
        UntypedLit::new(UntypedKind::Int, "1099511627776").marshal(),
    );
    pkg.untypeds.insert(
        "Huge".to_string(),
        UntypedLit::new(UntypedKind::Int, "300").marshal(),
    );
    pkg
}

fn compiler_with(names: &Names, registry: ImportRegistry, max_call_depth: usize) -> Compiler {
    Compiler::builder()
        .registry(registry)
        .interner(names.0.clone())
        .max_call_depth(max_call_depth)
        .import(LIB)
        .build()
        .unwrap()
}

fn compiler(names: &Names) -> (Compiler, Arc<AtomicI64>) {
    let ticks = Arc::new(AtomicI64::new(0));
    let mut registry = ImportRegistry::new();
    registry.register(LIB, lib_package(&ticks));
    let compiler = compiler_with(names, registry, DEFAULT_MAX_CALL_DEPTH);
    (compiler, ticks)
}

fn eval(compiler: &mut Compiler, expr: &Ast) -> Value {
    let compiled = compiler.compile_expr(expr).unwrap();
    compiled.eval(&compiler.new_env()).unwrap()
}

/// Evaluates through the closure's own return type, without boxing first.
struct Unboxed<'a> {
    expr: &'a Expr,
    env: &'a Arc<Env>,
}

impl KindVisitor for Unboxed<'_> {
    type Output = Option<Value>;

    fn visit<T: Specialize>(self) -> Option<Value> {
        let func = T::unwrap(&self.expr.func)?;
        Some(func(self.env).unwrap().into_value())
    }
}

#[test]
fn single_result_calls_are_unboxed_for_every_kind() {
    let samples = [
        Value::Bool(true),
        Value::Int(-7),
        Value::Int8(-8),
        Value::Int16(1600),
        Value::Int32(-32),
        Value::Int64(1 << 40),
        Value::Uint(7),
        Value::Uint8(200),
        Value::Uint16(65_000),
        Value::Uint32(4_000_000_000),
        Value::Uint64(u64::MAX),
        Value::Uintptr(Uintptr(0xdead)),
        Value::Float32(1.5),
        Value::Float64(-0.25),
        Value::Complex64(Complex64::new(1.0, -1.0)),
        Value::Complex128(Complex128::new(2.0, 3.0)),
        Value::string("s"),
        Value::Nil,
    ];
    assert_eq!(samples.len(), Kind::ALL.len());

    let names = Names::new();
    let mut pkg = Package::new("lib");
    for (kind, sample) in Kind::ALL.into_iter().zip(&samples) {
        let sample = sample.clone();
        pkg.binds.insert(
            kind.name().to_string(),
            native(kind.name(), vec![], vec![TypeDesc::basic(kind)], move |_| {
                Ok(vec![sample.clone()])
            }),
        );
    }
    let mut registry = ImportRegistry::new();
    registry.register(LIB, pkg);
    let mut compiler = compiler_with(&names, registry, DEFAULT_MAX_CALL_DEPTH);
    let env = compiler.new_env();

    for (kind, sample) in Kind::ALL.into_iter().zip(samples) {
        let expr = compiler
            .compile_expr(&names.call_lib(kind.name(), vec![]))
            .unwrap();
        assert_eq!(expr.kind(), kind);
        let value = dispatch(kind, Unboxed {
            expr: &expr,
            env: &env,
        });
        assert_eq!(value, Some(sample), "{kind}");
    }
}

#[test]
fn float64_call_takes_the_float64_path() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let expr = compiler
        .compile_expr(&names.call_lib("Answer", vec![]))
        .unwrap();

    let ExprFn::Float64(func) = &expr.func else {
        panic!("expected a float64 closure");
    };
    for _ in 0..3 {
        let env = compiler.new_env();
        assert_eq!(func(&env).unwrap(), ANSWER);
    }
}

#[test]
fn two_result_call_takes_the_generic_path() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let expr = compiler.compile_expr(&names.call_lib("Pair", vec![])).unwrap();

    assert!(matches!(expr.func, ExprFn::Multi(_)));
    assert_eq!(expr.value_count(), None);
    let values = expr.eval_all(&compiler.new_env()).unwrap();
    assert_eq!(values, vec![Value::Int(7), Value::string("seven")]);
}

#[test]
fn multi_value_in_single_value_context_is_rejected() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let pair = names.call_lib("Pair", vec![]);
    let err = compiler
        .compile_expr(&names.call_lib("Join", vec![pair]))
        .err();
    assert!(matches!(err, Some(CompileError::MultiValue)));
}

#[test]
fn return_shape_is_cached_on_the_call() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let invoker = compiler.invoker();
    let shape_of = |compiler: &mut Compiler, member: &str| {
        let callee = compiler.compile_expr(&names.lib(member)).unwrap();
        Call::new(member, callee, &[], invoker).unwrap().shape()
    };

    assert_eq!(shape_of(&mut compiler, "Answer"), ReturnShape::One(Kind::Float64));
    assert_eq!(shape_of(&mut compiler, "Pair"), ReturnShape::Many(2));
}

#[test]
fn dynamic_path_rejects_constant_callee() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let callee = compiler.compile_expr(&names.lib("Answer")).unwrap();
    assert!(callee.is_constant());

    let call = Call::new("lib.Answer", callee, &[], compiler.invoker()).unwrap();
    assert!(matches!(call.call_ret1(), Err(CompileError::Internal(_))));
    assert!(call.emit().is_ok());
}

#[test]
fn narrowing_truncates() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);

    // An int8 result carried in a wider tag is narrowed by the accessor.
    let wide = eval(&mut compiler, &names.call_lib("Wide", vec![]));
    assert_eq!(wide, Value::Int8(44));

    let converted = Ast::convert(
        TypeDesc::basic(Kind::Int8),
        names.call_lib("ThreeHundred", vec![]),
    );
    assert_eq!(eval(&mut compiler, &converted), Value::Int8(44));

    let truncated = Ast::convert(TypeDesc::INT, Ast::lit(Literal::Float64(-2.7)));
    assert_eq!(eval(&mut compiler, &truncated), Value::Int(-2));
}

proptest! {
    #[test]
    fn arguments_evaluate_left_to_right(count in 0usize..8) {
        let names = Names::new();
        let (mut compiler, _) = compiler(&names);
        let args = (0..count).map(|_| names.call_lib("Tick", vec![])).collect();
        let got = eval(&mut compiler, &names.call_lib("Join", args));

        let expected: Vec<String> = (1..=count).map(|i| i.to_string()).collect();
        prop_assert_eq!(got, Value::string(expected.join(",")));
    }
}

#[test]
fn callee_is_evaluated_before_arguments() {
    let names = Names::new();
    let (mut compiler, ticks) = compiler(&names);
    let callee = Ast::block(Block::new(
        vec![Stmt::Expr(names.call_lib("Tick", vec![]))],
        vec![names.lib("Join")],
    ));
    let args = vec![names.call_lib("Tick", vec![]), names.call_lib("Tick", vec![])];

    let got = eval(&mut compiler, &Ast::call(callee, args));
    assert_eq!(got, Value::string("2,3"));
    assert_eq!(ticks.load(Ordering::SeqCst), 3);
}

#[test]
fn evaluation_is_idempotent_across_fresh_envs() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let block = Block::new(
        vec![names.let_("x", int(20))],
        vec![Ast::binary(BinaryOp::Add, names.id("x"), int(22))],
    );
    let program = compiler.compile_program(&block).unwrap();

    let first = program.eval().unwrap();
    let second = program.eval().unwrap();
    assert_eq!(first, vec![Value::Int(42)]);
    assert_eq!(first, second);
}

#[test]
fn compile_errors_are_reported() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let mut error = |expr: Ast| compiler.compile_expr(&expr).err();

    assert!(matches!(error(names.id("missing")), Some(CompileError::Undefined(n)) if n == "missing"));
    assert!(matches!(
        error(Ast::selector(names.name("nope"), names.name("X"))),
        Some(CompileError::UnknownPackage(_))
    ));
    assert!(matches!(
        error(names.lib("Missing")),
        Some(CompileError::UnknownMember { .. })
    ));
    assert!(matches!(
        error(names.call_lib("Answer", vec![int(1)])),
        Some(CompileError::ArityMismatch { expected: 0, got: 1, .. })
    ));
    assert!(matches!(
        error(names.call_lib("Join", vec![int(1), Ast::lit(Literal::Str("x".into()))])),
        Some(CompileError::TypeMismatch { .. })
    ));
    assert!(matches!(
        error(Ast::call(int(1), vec![])),
        Some(CompileError::NotCallable(_))
    ));
}

#[test]
fn arity_error_message() {
    let err = CompileError::ArityMismatch {
        name: "lib.Join".to_string(),
        expected: 2,
        got: 1,
    };
    assert_eq!(
        err.to_string(),
        "not enough arguments in call to lib.Join: have 1, want 2"
    );
}

#[test]
fn native_panic_surfaces_as_eval_error() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let expr = compiler
        .compile_expr(&names.call_lib("Boom", vec![]))
        .unwrap();
    let err = expr.eval(&compiler.new_env()).unwrap_err();
    assert_eq!(
        err.kind,
        EvalErrorKind::CallablePanicked {
            name: "lib.Boom".to_string(),
            message: "index out of range".to_string()
        }
    );
}

#[test]
fn imported_constants_fold_and_variables_read_through() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);

    let pi = compiler.compile_expr(&names.lib("Pi")).unwrap();
    assert_eq!(pi.constant, Some(Value::Float64(ANSWER)));

    let counter = compiler.compile_expr(&names.lib("Counter")).unwrap();
    assert!(!counter.is_constant());
    let env = compiler.new_env();
    assert_eq!(counter.eval(&env).unwrap(), Value::Int(0));

    let cell = compiler
        .registry()
        .lookup_bind(LIB, "Counter")
        .map(Binding::value)
        .unwrap();
    assert!(cell.store(Value::Int(9)));
    assert_eq!(counter.eval(&env).unwrap(), Value::Int(9));
}

#[test]
fn untyped_constants_convert_exactly() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);

    let big = Ast::convert(TypeDesc::basic(Kind::Float32), names.lib("Big"));
    assert_eq!(eval(&mut compiler, &big), Value::Float32(1_099_511_627_776.0));

    let fits = Ast::convert(TypeDesc::basic(Kind::Uint16), names.lib("Huge"));
    assert_eq!(eval(&mut compiler, &fits), Value::Uint16(300));

    let overflow = Ast::convert(TypeDesc::basic(Kind::Int8), names.lib("Huge"));
    let err = compiler.compile_expr(&overflow).err();
    assert!(matches!(
        err,
        Some(CompileError::Untyped(UntypedError::Overflow { target: Kind::Int8, .. }))
    ));
}

#[test]
fn invalid_conversions_are_rejected() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let err = compiler
        .compile_expr(&Ast::convert(TypeDesc::STRING, int(1)))
        .err();
    assert!(matches!(err, Some(CompileError::InvalidConversion { .. })));

    let err = compiler
        .compile_expr(&Ast::convert(
            TypeDesc::FLOAT64,
            Ast::lit(Literal::Complex128(1.0, 0.0)),
        ))
        .err();
    assert!(matches!(err, Some(CompileError::InvalidConversion { .. })));

    let boxed = eval(&mut compiler, &Ast::convert(TypeDesc::any(), int(5)));
    assert_eq!(boxed, Value::Int(5));
}

#[test]
fn binary_operators_fold_and_wrap() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);

    let sum = compiler
        .compile_expr(&Ast::binary(
            BinaryOp::Add,
            Ast::lit(Literal::Int8(100)),
            Ast::lit(Literal::Int8(100)),
        ))
        .unwrap();
    assert_eq!(sum.constant, Some(Value::Int8(-56)));

    let less = Ast::binary(
        BinaryOp::Lt,
        Ast::lit(Literal::Str("abc".into())),
        Ast::lit(Literal::Str("abd".into())),
    );
    assert_eq!(eval(&mut compiler, &less), Value::Bool(true));

    let concat = Ast::binary(
        BinaryOp::Add,
        Ast::lit(Literal::Str("foo".into())),
        Ast::lit(Literal::Str("bar".into())),
    );
    assert_eq!(eval(&mut compiler, &concat), Value::string("foobar"));

    // Results of specialized calls chain without boxing.
    let scaled = Ast::binary(
        BinaryOp::Mul,
        names.call_lib("Answer", vec![]),
        Ast::lit(Literal::Float64(2.0)),
    );
    let scaled = compiler.compile_expr(&scaled).unwrap();
    assert!(matches!(scaled.func, ExprFn::Float64(_)));
    assert_eq!(
        scaled.eval(&compiler.new_env()).unwrap(),
        Value::Float64(ANSWER * 2.0)
    );

    let equal = Ast::binary(BinaryOp::Eq, names.call_lib("Tick", vec![]), int(1));
    assert_eq!(eval(&mut compiler, &equal), Value::Bool(true));
}

#[test]
fn binary_operator_errors() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let mut error = |expr: Ast| compiler.compile_expr(&expr).err();

    assert!(matches!(
        error(Ast::binary(BinaryOp::Add, int(1), Ast::lit(Literal::Int8(1)))),
        Some(CompileError::TypeMismatch { .. })
    ));
    assert!(matches!(
        error(Ast::binary(
            BinaryOp::Lt,
            Ast::lit(Literal::Complex64(1.0, 1.0)),
            Ast::lit(Literal::Complex64(1.0, 1.0)),
        )),
        Some(CompileError::InvalidOperation { op: "<", .. })
    ));
    assert!(matches!(
        error(Ast::binary(
            BinaryOp::Sub,
            Ast::lit(Literal::Bool(true)),
            Ast::lit(Literal::Bool(false)),
        )),
        Some(CompileError::InvalidOperation { op: "-", .. })
    ));
}

#[test]
fn blocks_scope_their_declarations() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let inner = Ast::block(Block::new(vec![names.let_("x", int(2))], vec![names.id("x")]));
    let block = Block::new(
        vec![names.let_("x", int(1))],
        vec![
            Ast::binary(BinaryOp::Add, inner, names.id("x")),
            names.id("x"),
        ],
    );
    let program = compiler.compile_program(&block).unwrap();
    assert_eq!(program.frame_size(), 1);
    assert_eq!(program.eval().unwrap(), vec![Value::Int(3), Value::Int(1)]);
}

#[test]
fn constants_assignments_and_redeclarations() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let block = Block::new(
        vec![
            Stmt::Const {
                name: names.name("c"),
                init: Ast::binary(BinaryOp::Mul, int(6), int(7)),
            },
            names.let_("n", int(1)),
            Stmt::Assign {
                name: names.name("n"),
                value: Ast::binary(BinaryOp::Add, names.id("n"), names.id("c")),
            },
        ],
        vec![names.id("n")],
    );
    let program = compiler.compile_program(&block).unwrap();
    assert_eq!(program.frame_size(), 1);
    assert_eq!(program.eval().unwrap(), vec![Value::Int(43)]);

    let mut error = |stmts: Vec<Stmt>| {
        compiler
            .compile_expr(&Ast::block(Block::new(stmts, vec![])))
            .err()
    };
    assert!(matches!(
        error(vec![Stmt::Const {
            name: names.name("k"),
            init: names.call_lib("Tick", vec![]),
        }]),
        Some(CompileError::NotConstant(_))
    ));
    assert!(matches!(
        error(vec![names.let_("a", int(1)), names.let_("a", int(2))]),
        Some(CompileError::Redeclared(_))
    ));
    assert!(matches!(
        error(vec![
            names.let_("a", int(1)),
            Stmt::Assign {
                name: names.name("a"),
                value: Ast::lit(Literal::Str("s".into())),
            },
        ]),
        Some(CompileError::TypeMismatch { .. })
    ));
    assert!(matches!(
        error(vec![Stmt::Assign {
            name: names.name("c"),
            value: int(1),
        }]),
        Some(CompileError::NotAssignable(_))
    ));
}

#[test]
fn closures_capture_their_defining_frame() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let int_to_int = TypeDesc::func(vec![TypeDesc::INT], vec![TypeDesc::INT]);

    let adder = FuncLit {
        params: vec![names.param("y", TypeDesc::INT)],
        results: vec![TypeDesc::INT],
        body: Block::value(vec![Ast::binary(
            BinaryOp::Add,
            names.id("x"),
            names.id("y"),
        )]),
    };
    let make_adder = FuncLit {
        params: vec![names.param("x", TypeDesc::INT)],
        results: vec![int_to_int],
        body: Block::value(vec![Ast::func_lit(adder)]),
    };
    let block = Block::new(
        vec![
            names.let_("makeAdder", Ast::func_lit(make_adder)),
            names.let_("add5", Ast::call(names.id("makeAdder"), vec![int(5)])),
            names.let_("add7", Ast::call(names.id("makeAdder"), vec![int(7)])),
        ],
        vec![
            Ast::call(names.id("add5"), vec![int(10)]),
            Ast::call(names.id("add7"), vec![int(10)]),
        ],
    );
    let program = compiler.compile_program(&block).unwrap();
    assert_eq!(program.eval().unwrap(), vec![Value::Int(15), Value::Int(17)]);
}

#[test]
fn declared_functions_recurse_until_the_depth_limit() {
    let names = Names::new();
    let ticks = Arc::new(AtomicI64::new(0));
    let mut registry = ImportRegistry::new();
    registry.register(LIB, lib_package(&ticks));
    let mut compiler = compiler_with(&names, registry, 64);

    let down = FuncDecl {
        name: names.name("down"),
        type_params: vec![],
        func: FuncLit {
            params: vec![names.param("n", TypeDesc::INT)],
            results: vec![TypeDesc::INT],
            body: Block::value(vec![Ast::call(names.id("down"), vec![names.id("n")])]),
        },
    };
    let block = Block::new(
        vec![Stmt::FuncDecl(down)],
        vec![Ast::call(names.id("down"), vec![int(1)])],
    );
    let program = compiler.compile_program(&block).unwrap();
    let err = program.eval().unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::StackOverflow { limit: 64 });
    assert_eq!(call_depth(), 0);
}

fn one_decl(names: &Names) -> Stmt {
    Stmt::FuncDecl(FuncDecl {
        name: names.name("one"),
        type_params: vec![],
        func: FuncLit {
            params: vec![],
            results: vec![TypeDesc::INT],
            body: Block::value(vec![int(1)]),
        },
    })
}

fn one_lit() -> Ast {
    Ast::func_lit(FuncLit {
        params: vec![],
        results: vec![TypeDesc::INT],
        body: Block::value(vec![int(1)]),
    })
}

#[test]
fn declared_function_outlives_its_block() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let escaped = Ast::block(Block::new(vec![one_decl(&names)], vec![names.id("one")]));
    let result = compiler
        .compile_expr(&Ast::call(escaped, vec![]))
        .unwrap()
        .eval(&compiler.new_env())
        .unwrap();
    assert_eq!(result, Value::Int(1));
}

#[test]
fn functions_escaping_a_program_keep_their_frame() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let block = Block::new(
        vec![one_decl(&names), names.let_("f", one_lit())],
        vec![names.id("one"), names.id("f")],
    );
    let program = compiler.compile_program(&block).unwrap();
    let escaped = program.eval().unwrap();
    assert_eq!(escaped.len(), 2);

    let invoker = compiler.invoker();
    for func in &escaped {
        let results = invoker.invoke(func, Args::new()).unwrap();
        assert_eq!(results, vec![Value::Int(1)]);
    }
}

#[test]
fn functions_stored_in_their_own_frame_do_not_leak_it() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let block = Block::new(
        vec![one_decl(&names), names.let_("f", one_lit())],
        vec![
            Ast::call(names.id("one"), vec![]),
            Ast::call(names.id("f"), vec![]),
        ],
    );
    let program = compiler.compile_program(&block).unwrap();

    let env = program.new_env();
    assert_eq!(program.run(&env).unwrap(), vec![Value::Int(1), Value::Int(1)]);
    let frame = Arc::downgrade(&env);
    drop(env);
    assert!(frame.upgrade().is_none());
}

#[test]
fn reassigned_function_does_not_leak_its_frame() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let block = Block::new(
        vec![
            names.let_("f", one_lit()),
            Stmt::Assign {
                name: names.name("f"),
                value: one_lit(),
            },
        ],
        vec![Ast::call(names.id("f"), vec![])],
    );
    let program = compiler.compile_program(&block).unwrap();

    let env = program.new_env();
    assert_eq!(program.run(&env).unwrap(), vec![Value::Int(1)]);
    let frame = Arc::downgrade(&env);
    drop(env);
    assert!(frame.upgrade().is_none());
}

#[test]
fn block_constants_are_scoped_to_the_block() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let inner = Block::new(
        vec![Stmt::Const {
            name: names.name("k"),
            init: int(2),
        }],
        vec![Ast::binary(BinaryOp::Add, names.id("k"), names.id("x"))],
    );
    let block = Block::new(
        vec![names.let_("k", int(1)), names.let_("x", int(10))],
        vec![Ast::block(inner), names.id("k")],
    );
    let program = compiler.compile_program(&block).unwrap();
    assert_eq!(program.eval().unwrap(), vec![Value::Int(12), Value::Int(1)]);

    let scoped = Block::new(
        vec![Stmt::Const {
            name: names.name("j"),
            init: int(3),
        }],
        vec![names.id("j")],
    );
    let value = compiler
        .compile_expr(&Ast::block(scoped))
        .unwrap()
        .eval(&compiler.new_env())
        .unwrap();
    assert_eq!(value, Value::Int(3));
    assert!(matches!(
        compiler.compile_expr(&names.id("j")),
        Err(CompileError::Undefined(_))
    ));
}

#[test]
fn failed_unit_leaves_no_declarations_behind() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let broken = Block::new(
        vec![names.let_("a", int(1)), names.let_("b", names.id("nope"))],
        vec![],
    );
    assert!(matches!(
        compiler.compile_program(&broken),
        Err(CompileError::Undefined(_))
    ));
    assert_eq!(compiler.global_size(), 0);

    let fixed = Block::new(vec![names.let_("a", int(1))], vec![names.id("a")]);
    let program = compiler.compile_program(&fixed).unwrap();
    assert_eq!(compiler.global_size(), 1);
    assert_eq!(program.eval().unwrap(), vec![Value::Int(1)]);
}

#[test]
fn constant_nil_callee_is_an_internal_fault() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let sig = FuncType::new(vec![], vec![TypeDesc::INT]);
    let nil_func = Ast::lit(Literal::Nil(TypeDesc::from_func(sig)));
    assert!(matches!(
        compiler.compile_expr(&Ast::call(nil_func, vec![])),
        Err(CompileError::Internal(_))
    ));
}

#[test]
fn generic_declarations_warn_and_are_skipped() {
    let names = Names::new();
    let (mut compiler, _) = compiler(&names);
    let identity = FuncDecl {
        name: names.name("Identity"),
        type_params: vec![names.name("T")],
        func: FuncLit {
            params: vec![names.param("v", TypeDesc::TypeParam(names.name("T")))],
            results: vec![TypeDesc::TypeParam(names.name("T"))],
            body: Block::value(vec![names.id("v")]),
        },
    };
    let block = Block::new(vec![Stmt::FuncDecl(identity)], vec![int(1)]);
    let program = compiler.compile_program(&block).unwrap();

    assert_eq!(program.frame_size(), 0);
    assert_eq!(program.eval().unwrap(), vec![Value::Int(1)]);
    assert_eq!(
        compiler.warnings(),
        &[Warning {
            name: "Identity".to_string(),
            message: "generic function declarations are not supported yet".to_string(),
        }]
    );
    assert!(matches!(
        compiler.compile_expr(&names.id("Identity")),
        Err(CompileError::Undefined(_))
    ));
}

#[test]
fn unknown_import_fails_the_build() {
    let result = Compiler::builder().import("example.com/none").build();
    assert!(matches!(result, Err(CompileError::UnknownPackage(_))));
}
