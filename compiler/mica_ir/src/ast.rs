//! Typed expression tree.
//!
//! This is the hand-off format from the front end. Names are already
//! interned, macros already expanded, and every node whose type cannot be
//! derived from its children carries its `TypeDesc` explicitly: literals,
//! parameters, declared results and conversions.

use crate::{Kind, Name, TypeDesc};

/// A literal constant with its exact static type.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Uint(u64),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Uintptr(u64),
    Float32(f32),
    Float64(f64),
    Complex64(f32, f32),
    Complex128(f64, f64),
    Str(String),
    /// The zero value of a reference type.
    Nil(TypeDesc),
}

impl Literal {
    pub fn ty(&self) -> TypeDesc {
        let kind = match self {
            Literal::Bool(_) => Kind::Bool,
            Literal::Int(_) => Kind::Int,
            Literal::Int8(_) => Kind::Int8,
            Literal::Int16(_) => Kind::Int16,
            Literal::Int32(_) => Kind::Int32,
            Literal::Int64(_) => Kind::Int64,
            Literal::Uint(_) => Kind::Uint,
            Literal::Uint8(_) => Kind::Uint8,
            Literal::Uint16(_) => Kind::Uint16,
            Literal::Uint32(_) => Kind::Uint32,
            Literal::Uint64(_) => Kind::Uint64,
            Literal::Uintptr(_) => Kind::Uintptr,
            Literal::Float32(_) => Kind::Float32,
            Literal::Float64(_) => Kind::Float64,
            Literal::Complex64(..) => Kind::Complex64,
            Literal::Complex128(..) => Kind::Complex128,
            Literal::Str(_) => Kind::String,
            Literal::Nil(ty) => return ty.clone(),
        };
        TypeDesc::Basic(kind)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Eq,
    Lt,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Eq => "==",
            BinaryOp::Lt => "<",
        }
    }

    /// Comparison operators yield `bool` regardless of operand kind.
    pub const fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Lt)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Lit(Literal),
    /// Local variable, constant, or declared function.
    Ident(Name),
    /// Member of an imported package, e.g. `math.Pi`.
    Selector { package: Name, member: Name },
    Call { func: Box<Expr>, args: Vec<Expr> },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Explicit conversion `T(x)`.
    Convert { ty: TypeDesc, expr: Box<Expr> },
    FuncLit(Box<FuncLit>),
    Block(Box<Block>),
}

impl Expr {
    pub fn lit(lit: Literal) -> Expr {
        Expr::Lit(lit)
    }

    pub fn ident(name: Name) -> Expr {
        Expr::Ident(name)
    }

    pub fn selector(package: Name, member: Name) -> Expr {
        Expr::Selector { package, member }
    }

    pub fn call(func: Expr, args: Vec<Expr>) -> Expr {
        Expr::Call {
            func: Box::new(func),
            args,
        }
    }

    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn convert(ty: TypeDesc, expr: Expr) -> Expr {
        Expr::Convert {
            ty,
            expr: Box::new(expr),
        }
    }

    pub fn func_lit(func: FuncLit) -> Expr {
        Expr::FuncLit(Box::new(func))
    }

    pub fn block(block: Block) -> Expr {
        Expr::Block(Box::new(block))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Name,
    pub ty: TypeDesc,
}

/// An anonymous function. The body's result expressions are the returned
/// values, in order.
#[derive(Clone, Debug, PartialEq)]
pub struct FuncLit {
    pub params: Vec<Param>,
    pub results: Vec<TypeDesc>,
    pub body: Block,
}

/// A named function declaration. Non-empty `type_params` marks it generic.
#[derive(Clone, Debug, PartialEq)]
pub struct FuncDecl {
    pub name: Name,
    pub type_params: Vec<Name>,
    pub func: FuncLit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// `var name [ty] = init`
    Let {
        name: Name,
        ty: Option<TypeDesc>,
        init: Expr,
    },
    /// `const name = init`; `init` must fold to a constant.
    Const { name: Name, init: Expr },
    Assign { name: Name, value: Expr },
    Expr(Expr),
    FuncDecl(FuncDecl),
}

impl Stmt {
    /// Whether the statement introduces a slot in the enclosing frame.
    pub fn declares_slot(&self) -> bool {
        match self {
            Stmt::Let { .. } => true,
            Stmt::FuncDecl(decl) => decl.type_params.is_empty(),
            Stmt::Const { .. } | Stmt::Assign { .. } | Stmt::Expr(_) => false,
        }
    }
}

/// Statements followed by the block's result values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub results: Vec<Expr>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, results: Vec<Expr>) -> Self {
        Block { stmts, results }
    }

    /// A block with no statements.
    pub fn value(results: Vec<Expr>) -> Self {
        Block {
            stmts: Vec::new(),
            results,
        }
    }

    pub fn declares_slots(&self) -> bool {
        self.stmts.iter().any(Stmt::declares_slot)
    }
}
