use std::sync::Arc;

use mica_ir::ast::{self, Stmt};
use mica_ir::{Name, TypeDesc};

use super::expr_fn::Compiled;
use super::{func_lit, CompileError, Compiler, Result};
use crate::scope::StorageKind;

impl Compiler {
    /// Compile one statement. Declarations resolved entirely at compile
    /// time (constants, skipped generics) produce no closure.
    pub(super) fn stmt(&mut self, stmt: &Stmt) -> Result<Option<Compiled<()>>> {
        match stmt {
            Stmt::Let { name, ty, init } => self.let_stmt(*name, ty.as_ref(), init).map(Some),
            Stmt::Const { name, init } => {
                self.const_stmt(*name, init)?;
                Ok(None)
            }
            Stmt::Assign { name, value } => self.assign(*name, value).map(Some),
            Stmt::Expr(expr) => self.expr(expr)?.effect().map(Some),
            Stmt::FuncDecl(decl) => self.func_decl(decl),
        }
    }

    fn let_stmt(
        &mut self,
        name: Name,
        declared: Option<&TypeDesc>,
        init: &ast::Expr,
    ) -> Result<Compiled<()>> {
        // The initializer cannot see the name it initializes.
        let init = self.expr(init)?;
        let ty = match declared {
            Some(ty) => {
                self.check_assignable(&init.ty, ty, "variable declaration")?;
                ty.clone()
            }
            None => init.ty.clone(),
        };
        let value = init.boxed()?;
        self.check_fresh(name)?;
        let slot = self.declare_slot(name, ty, StorageKind::Var)?;
        Ok(Arc::new(move |env| env.bind(slot, func_lit::detach(value(env)?, env))))
    }

    fn const_stmt(&mut self, name: Name, init: &ast::Expr) -> Result<()> {
        let init = self.expr(init)?;
        let Some(value) = init.constant else {
            return Err(CompileError::NotConstant(self.name(name).to_string()));
        };
        self.check_fresh(name)?;
        self.scope.declare(name, init.ty, StorageKind::Constant(value));
        Ok(())
    }

    fn assign(&mut self, name: Name, value: &ast::Expr) -> Result<Compiled<()>> {
        let Some((symbol, depth)) = self.scope.resolve(name) else {
            return Err(CompileError::Undefined(self.name(name).to_string()));
        };
        let (slot, ty) = match (&symbol.storage, symbol.slot) {
            (StorageKind::Var, Some(slot)) => (slot, symbol.ty.clone()),
            _ => return Err(CompileError::NotAssignable(self.name(name).to_string())),
        };
        let value = self.expr(value)?;
        self.check_assignable(&value.ty, &ty, "assignment")?;
        let value = value.boxed()?;
        Ok(Arc::new(move |env| {
            let value = value(env)?;
            let frame = env.frame(depth)?;
            frame.bind(slot, func_lit::detach(value, frame))
        }))
    }

    pub(super) fn check_assignable(
        &self,
        got: &TypeDesc,
        expected: &TypeDesc,
        context: &str,
    ) -> Result<()> {
        if got.assignable_to(expected) {
            return Ok(());
        }
        Err(CompileError::TypeMismatch {
            expected: self.type_name(expected),
            got: self.type_name(got),
            context: context.to_string(),
        })
    }

    /// Redeclaring a name in the same frame is an error; shadowing an outer
    /// one is not.
    pub(super) fn check_fresh(&self, name: Name) -> Result<()> {
        if self.scope.declared_here(name) {
            return Err(CompileError::Redeclared(self.name(name).to_string()));
        }
        Ok(())
    }

    pub(super) fn declare_slot(
        &mut self,
        name: Name,
        ty: TypeDesc,
        storage: StorageKind,
    ) -> Result<usize> {
        self.scope
            .declare(name, ty, storage)
            .slot
            .ok_or_else(|| CompileError::Internal("declaration without a slot".to_string()))
    }
}
