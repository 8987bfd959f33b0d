//! Explicit conversions `T(x)`.

use std::sync::Arc;

use mica_imports::UntypedLit;
use mica_ir::{ast, Kind, Name, TypeDesc};
use mica_value::{type_mismatch, Value};

use super::expr_fn::{dispatch, Compiled, Expr, ExprFn, KindVisitor, Specialize};
use super::{CompileError, Compiler, Result};

impl Compiler {
    pub(super) fn convert(&mut self, target: &TypeDesc, operand: &ast::Expr) -> Result<Expr> {
        // Imported untyped constants convert from their exact text.
        if let ast::Expr::Selector { package, member } = operand {
            if let Some(text) = self.untyped_text(*package, *member)? {
                let lit = UntypedLit::unmarshal(&text)?;
                let value = lit.to_value(target.kind())?;
                return Expr::constant(value, target.clone());
            }
        }

        let source = self.expr(operand)?;
        if !convertible(&source.ty, target) {
            return Err(self.invalid_conversion(&source.ty, target));
        }
        let to = target.kind();

        if let Some(value) = &source.constant {
            let Some(converted) = value.convert(to) else {
                return Err(self.invalid_conversion(&source.ty, target));
            };
            return Expr::constant(converted, target.clone());
        }
        if source.kind() == to && to != Kind::Other {
            return Ok(Expr::new(source.func, target.clone()));
        }

        let boxed = source.boxed()?;
        let func = dispatch(to, Converted(boxed));
        Ok(Expr::new(func, target.clone()))
    }

    fn untyped_text(&self, package: Name, member: Name) -> Result<Option<String>> {
        let path = self.package_path(package)?;
        Ok(self
            .registry
            .lookup_untyped(&path, self.name(member))
            .map(str::to_string))
    }

    fn invalid_conversion(&self, from: &TypeDesc, to: &TypeDesc) -> CompileError {
        CompileError::InvalidConversion {
            from: self.type_name(from),
            to: self.type_name(to),
        }
    }
}

/// Anything converts to an interface. Otherwise numbers convert among
/// themselves (complex only to complex), and strings, bools and composites
/// only to a type of the same kind.
fn convertible(from: &TypeDesc, to: &TypeDesc) -> bool {
    if to.is_interface() {
        return true;
    }
    let (src, dst) = (from.kind(), to.kind());
    if src.is_numeric() && dst.is_numeric() {
        return src.is_complex() == dst.is_complex();
    }
    if src == Kind::Other {
        return from == to;
    }
    src == dst
}

struct Converted(Compiled<Value>);

impl KindVisitor for Converted {
    type Output = ExprFn;

    fn visit<T: Specialize>(self) -> ExprFn {
        let source = self.0;
        T::wrap(Arc::new(move |env| {
            let value = source(env)?;
            match value.convert(T::KIND) {
                Some(converted) => T::from_value(&converted),
                None => Err(type_mismatch(T::KIND.name(), value.type_name())),
            }
        }))
    }
}
