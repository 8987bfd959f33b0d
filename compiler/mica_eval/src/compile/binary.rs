//! Binary operators, compiled per operand kind.
//!
//! Operands must have identical types. Arithmetic on integers wraps. When
//! both operands are constants the result is folded.

use std::sync::Arc;

use mica_ir::ast::{self, BinaryOp};
use mica_ir::{Kind, TypeDesc};
use mica_value::{Arith, Complex128, Complex64, Ordered, Str, Uintptr};

use super::expr_fn::{dispatch, Compiled, Expr, ExprFn, KindVisitor, Specialize};
use super::{CompileError, Compiler, Result};
use crate::Env;

impl Compiler {
    pub(super) fn binary(
        &mut self,
        op: BinaryOp,
        lhs: &ast::Expr,
        rhs: &ast::Expr,
    ) -> Result<Expr> {
        let lhs = self.expr(lhs)?;
        let rhs = self.expr(rhs)?;
        if lhs.ty != rhs.ty {
            return Err(CompileError::TypeMismatch {
                expected: self.type_name(&lhs.ty),
                got: self.type_name(&rhs.ty),
                context: format!("operator {}", op.symbol()),
            });
        }

        let operands = Operands {
            op,
            lhs: &lhs,
            rhs: &rhs,
        };
        let func = match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => arith(operands),
            BinaryOp::Eq => dispatch(lhs.kind(), Equal(operands)),
            BinaryOp::Lt => ordered(operands),
        };
        let func = func.map_err(|err| match err {
            CompileError::InvalidOperation { op, .. } => CompileError::InvalidOperation {
                op,
                ty: self.type_name(&lhs.ty),
            },
            other => other,
        })?;

        let ty = if op.is_comparison() {
            TypeDesc::BOOL
        } else {
            lhs.ty.clone()
        };
        let expr = Expr::new(func, ty.clone());
        if lhs.is_constant() && rhs.is_constant() {
            let value = expr.eval(&Env::root(0)).map_err(CompileError::ConstantEval)?;
            return Expr::constant(value, ty);
        }
        Ok(expr)
    }
}

#[derive(Copy, Clone)]
struct Operands<'a> {
    op: BinaryOp,
    lhs: &'a Expr,
    rhs: &'a Expr,
}

impl Operands<'_> {
    #[cold]
    fn invalid(self) -> CompileError {
        CompileError::InvalidOperation {
            op: self.op.symbol(),
            ty: self.lhs.kind().name().to_string(),
        }
    }
}

fn arith(operands: Operands<'_>) -> Result<ExprFn> {
    match operands.lhs.kind() {
        Kind::Int => arith_op::<isize>(operands),
        Kind::Int8 => arith_op::<i8>(operands),
        Kind::Int16 => arith_op::<i16>(operands),
        Kind::Int32 => arith_op::<i32>(operands),
        Kind::Int64 => arith_op::<i64>(operands),
        Kind::Uint => arith_op::<usize>(operands),
        Kind::Uint8 => arith_op::<u8>(operands),
        Kind::Uint16 => arith_op::<u16>(operands),
        Kind::Uint32 => arith_op::<u32>(operands),
        Kind::Uint64 => arith_op::<u64>(operands),
        Kind::Uintptr => arith_op::<Uintptr>(operands),
        Kind::Float32 => arith_op::<f32>(operands),
        Kind::Float64 => arith_op::<f64>(operands),
        Kind::Complex64 => arith_op::<Complex64>(operands),
        Kind::Complex128 => arith_op::<Complex128>(operands),
        Kind::String if operands.op == BinaryOp::Add => concat(operands),
        _ => Err(operands.invalid()),
    }
}

fn arith_op<T: Specialize + Arith>(operands: Operands<'_>) -> Result<ExprFn> {
    let a = operands.lhs.typed::<T>()?;
    let b = operands.rhs.typed::<T>()?;
    let func: Compiled<T> = match operands.op {
        BinaryOp::Add => Arc::new(move |env| Ok(T::add(a(env)?, b(env)?))),
        BinaryOp::Sub => Arc::new(move |env| Ok(T::sub(a(env)?, b(env)?))),
        BinaryOp::Mul => Arc::new(move |env| Ok(T::mul(a(env)?, b(env)?))),
        BinaryOp::Eq | BinaryOp::Lt => return Err(operands.invalid()),
    };
    Ok(T::wrap(func))
}

fn concat(operands: Operands<'_>) -> Result<ExprFn> {
    let a = operands.lhs.typed::<Str>()?;
    let b = operands.rhs.typed::<Str>()?;
    Ok(ExprFn::Str(Arc::new(move |env| {
        let lhs = a(env)?;
        Ok(lhs.concat(&b(env)?))
    })))
}

fn ordered(operands: Operands<'_>) -> Result<ExprFn> {
    match operands.lhs.kind() {
        Kind::Int => less::<isize>(operands),
        Kind::Int8 => less::<i8>(operands),
        Kind::Int16 => less::<i16>(operands),
        Kind::Int32 => less::<i32>(operands),
        Kind::Int64 => less::<i64>(operands),
        Kind::Uint => less::<usize>(operands),
        Kind::Uint8 => less::<u8>(operands),
        Kind::Uint16 => less::<u16>(operands),
        Kind::Uint32 => less::<u32>(operands),
        Kind::Uint64 => less::<u64>(operands),
        Kind::Uintptr => less::<Uintptr>(operands),
        Kind::Float32 => less::<f32>(operands),
        Kind::Float64 => less::<f64>(operands),
        Kind::String => less::<Str>(operands),
        _ => Err(operands.invalid()),
    }
}

fn less<T: Specialize + Ordered>(operands: Operands<'_>) -> Result<ExprFn> {
    let a = operands.lhs.typed::<T>()?;
    let b = operands.rhs.typed::<T>()?;
    Ok(ExprFn::Bool(Arc::new(move |env| {
        let lhs = a(env)?;
        Ok(lhs.less(&b(env)?))
    })))
}

/// `==` is defined on every kind.
struct Equal<'a>(Operands<'a>);

impl KindVisitor for Equal<'_> {
    type Output = Result<ExprFn>;

    fn visit<T: Specialize>(self) -> Result<ExprFn> {
        let a = self.0.lhs.typed::<T>()?;
        let b = self.0.rhs.typed::<T>()?;
        Ok(ExprFn::Bool(Arc::new(move |env| {
            let lhs = a(env)?;
            Ok(lhs == b(env)?)
        })))
    }
}
