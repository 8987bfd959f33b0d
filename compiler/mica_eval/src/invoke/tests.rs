use super::*;
use mica_value::{EvalError, EvalErrorKind};
use pretty_assertions::assert_eq;
use smallvec::smallvec;

fn add_ints() -> Function {
    let sig = FuncType::new(vec![TypeDesc::INT, TypeDesc::INT], vec![TypeDesc::INT]);
    Function::native("add", sig, |args| {
        let a = args[0].as_i64().unwrap_or_default();
        let b = args[1].as_i64().unwrap_or_default();
        Ok(vec![Value::Int((a + b) as isize)])
    })
}

fn kind_of(result: EvalResult<Vec<Value>>) -> EvalErrorKind {
    result.unwrap_err().kind
}

#[test]
fn invokes_native_function() {
    let results = Invoker::default()
        .invoke(&Value::func(add_ints()), smallvec![Value::Int(2), Value::Int(40)])
        .unwrap();
    assert_eq!(results, vec![Value::Int(42)]);
}

#[test]
fn non_function_is_not_callable() {
    let err = kind_of(Invoker::default().invoke(&Value::Int(1), Args::new()));
    assert_eq!(
        err,
        EvalErrorKind::NotCallable {
            type_name: "int".to_string()
        }
    );
}

#[test]
fn arity_is_checked() {
    let err = kind_of(Invoker::default().invoke_func(&add_ints(), smallvec![Value::Int(1)]));
    assert_eq!(
        err,
        EvalErrorKind::ArityMismatch {
            name: "add".to_string(),
            expected: 2,
            got: 1
        }
    );
}

#[test]
fn primitive_parameters_require_exact_kind() {
    let err = kind_of(
        Invoker::default().invoke_func(&add_ints(), smallvec![Value::Int(1), Value::Int8(1)]),
    );
    assert_eq!(
        err,
        EvalErrorKind::TypeMismatch {
            expected: "int".to_string(),
            got: "int8".to_string()
        }
    );
}

#[test]
fn interface_parameters_accept_anything() {
    let sig = FuncType::new(vec![TypeDesc::any()], vec![TypeDesc::STRING]);
    let describe = Function::native("describe", sig, |args| {
        Ok(vec![Value::string(args[0].type_name())])
    });
    let invoker = Invoker::default();
    for (arg, name) in [
        (Value::Uint16(3), "uint16"),
        (Value::Nil, "nil"),
        (Value::string("x"), "string"),
    ] {
        let results = invoker.invoke_func(&describe, smallvec![arg]).unwrap();
        assert_eq!(results, vec![Value::string(name)]);
    }
}

#[test]
fn foreign_variables_are_read_through() {
    let cell = Value::var(Value::Int(5));
    let results = Invoker::default()
        .invoke_func(&add_ints(), smallvec![cell.clone(), Value::Int(1)])
        .unwrap();
    assert_eq!(results, vec![Value::Int(6)]);

    cell.store(Value::Int(10));
    let results = Invoker::default()
        .invoke_func(&add_ints(), smallvec![cell, Value::Int(1)])
        .unwrap();
    assert_eq!(results, vec![Value::Int(11)]);
}

#[test]
fn variadic_arguments_are_checked_against_element_type() {
    let sig = FuncType::new(
        vec![TypeDesc::STRING, TypeDesc::slice(TypeDesc::INT)],
        vec![TypeDesc::INT],
    )
    .variadic();
    let count = Function::native("count", sig, |args| {
        Ok(vec![Value::Int(args.len() as isize - 1)])
    });
    let invoker = Invoker::default();

    let none = invoker
        .invoke_func(&count, smallvec![Value::string("n")])
        .unwrap();
    assert_eq!(none, vec![Value::Int(0)]);

    let three = invoker
        .invoke_func(
            &count,
            smallvec![Value::string("n"), Value::Int(1), Value::Int(2), Value::Int(3)],
        )
        .unwrap();
    assert_eq!(three, vec![Value::Int(3)]);

    let err = kind_of(invoker.invoke_func(&count, smallvec![Value::string("n"), Value::Bool(true)]));
    assert!(matches!(err, EvalErrorKind::TypeMismatch { .. }));
    let err = kind_of(invoker.invoke_func(&count, Args::new()));
    assert!(matches!(err, EvalErrorKind::ArityMismatch { .. }));
}

#[test]
fn result_count_is_checked() {
    let sig = FuncType::new(vec![], vec![TypeDesc::INT, TypeDesc::BOOL]);
    let liar = Function::native("liar", sig, |_| Ok(vec![Value::Int(1)]));
    let err = kind_of(Invoker::default().invoke_func(&liar, Args::new()));
    assert_eq!(
        err,
        EvalErrorKind::ResultCountMismatch {
            name: "liar".to_string(),
            expected: 2,
            got: 1
        }
    );
}

#[test]
fn panicking_native_becomes_an_error() {
    let sig = FuncType::new(vec![], vec![]);
    let boom = Function::native("boom", sig, |_| panic!("index out of range"));
    let err = kind_of(Invoker::default().invoke_func(&boom, Args::new()));
    assert_eq!(
        err,
        EvalErrorKind::CallablePanicked {
            name: "boom".to_string(),
            message: "index out of range".to_string()
        }
    );
    assert_eq!(call_depth(), 0);
}

#[test]
fn errors_record_the_call() {
    let sig = FuncType::new(vec![], vec![]);
    let fail = Function::native("fail", sig, |_| Err(EvalError::new("disk full")));
    let err = Invoker::default()
        .invoke_func(&fail, Args::new())
        .unwrap_err();
    assert_eq!(err.trace, vec!["fail".to_string()]);
    assert_eq!(err.to_string(), "disk full\n  in fail");
}

#[test]
fn call_depth_is_limited_and_restored() {
    fn recurse(invoker: Invoker) -> Function {
        let sig = FuncType::new(vec![], vec![TypeDesc::INT]);
        Function::native("recurse", sig, move |_| {
            let inner = recurse(invoker);
            invoker.invoke_func(&inner, Args::new())
        })
    }

    let invoker = Invoker {
        max_call_depth: 50,
        stack_growth: true,
    };
    let err = invoker
        .invoke_func(&recurse(invoker), Args::new())
        .unwrap_err();
    assert_eq!(err.kind, EvalErrorKind::StackOverflow { limit: 50 });
    assert_eq!(err.trace.len(), 50);
    assert_eq!(call_depth(), 0);
}
