//! # Symbolic Engine Module
//!
//! Expression tree for formulas of a single real variable. A formula typed by the user
//! is parsed into an [`Expr`] (see `parse_expr`), differentiated symbolically
//! (see `symbolic_engine_derivatives`) and lowered into a compiled evaluator
//! (see `symbolic_lambdify`).
//!
//! ## Main Structures
//! - `Expr` - recursive expression tree built from boxed nodes
//! - `Function` - the one-argument functions a formula may call (sin, exp, sqrt ...)
//!
//! ## Interesting Code Features
//! 1. **Operator Overloading**: `std::ops` traits give natural syntax: `x.clone() * x + Expr::Const(1.0)`
//! 2. **Precedence-aware Display**: rendering only adds the parentheses needed to parse back
//!    to the same tree, so the text of a derivative can be shown to the user and re-entered.
//! 3. **Named constants**: `pi` and `e` stay symbolic in the tree and are resolved at compile time.

use std::f64::consts::{E, PI};
use std::fmt;
use strum_macros::{Display, EnumIter, EnumString};

/// One-argument functions known to the formula language.
///
/// `EnumString` accepts every spelling a formula may use (`tan` and `tg`, `atan` and `arctg` ...),
/// `Display` prints the canonical mathjs-style name that the parser accepts back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum Function {
    #[strum(serialize = "exp")]
    Exp,
    /// natural logarithm, written `log` like mathjs does
    #[strum(to_string = "log", serialize = "ln")]
    Ln,
    #[strum(to_string = "log10", serialize = "lg")]
    Log10,
    #[strum(serialize = "sqrt")]
    Sqrt,
    #[strum(serialize = "abs")]
    Abs,
    #[strum(serialize = "sin")]
    Sin,
    #[strum(serialize = "cos")]
    Cos,
    #[strum(to_string = "tan", serialize = "tg")]
    Tan,
    #[strum(to_string = "cot", serialize = "ctg")]
    Cot,
    #[strum(to_string = "asin", serialize = "arcsin")]
    Asin,
    #[strum(to_string = "acos", serialize = "arccos")]
    Acos,
    #[strum(to_string = "atan", serialize = "arctan", serialize = "arctg")]
    Atan,
    #[strum(to_string = "acot", serialize = "arccot", serialize = "arcctg")]
    Acot,
    #[strum(serialize = "sinh")]
    Sinh,
    #[strum(serialize = "cosh")]
    Cosh,
    #[strum(serialize = "tanh")]
    Tanh,
}

impl Function {
    /// Numerical value of the function. Out-of-domain arguments give `NaN`/`inf`
    /// exactly as `f64` arithmetic does; the caller decides what a non-finite value means.
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Function::Exp => x.exp(),
            Function::Ln => x.ln(),
            Function::Log10 => x.log10(),
            Function::Sqrt => x.sqrt(),
            Function::Abs => x.abs(),
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Cot => 1.0 / x.tan(),
            Function::Asin => x.asin(),
            Function::Acos => x.acos(),
            Function::Atan => x.atan(),
            Function::Acot => PI / 2.0 - x.atan(),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
        }
    }
}

/// Core symbolic expression: an abstract syntax tree of a formula.
///
/// # Examples
/// ```
/// use RustedFormulaPlot::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let expr = x.clone() * x + Expr::Const(2.0);
/// assert_eq!(expr.to_string(), "x * x + 2");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable or named constant ("x", "pi")
    Var(String),
    /// Numerical constant value
    Const(f64),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    /// base ^ exponent
    Pow(Box<Expr>, Box<Expr>),
    /// unary minus
    Neg(Box<Expr>),
    /// call of a one-argument function
    Func(Function, Box<Expr>),
}

/// Value of a named constant, if `name` is one.
pub fn named_constant(name: &str) -> Option<f64> {
    match name {
        "pi" | "PI" => Some(PI),
        "e" | "E" => Some(E),
        _ => None,
    }
}

impl std::ops::Add for Expr {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Expr::Add(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Sub for Expr {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Expr::Sub(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Mul for Expr {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Expr::Mul(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Div for Expr {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Expr::Div(self.boxed(), rhs.boxed())
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Expr::Neg(self.boxed())
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Convenience method to wrap expression in Box for recursive structures.
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    /// Wraps the expression into a call of `function`.
    pub fn apply(self, function: Function) -> Expr {
        Expr::Func(function, self.boxed())
    }

    pub fn exp(self) -> Expr {
        self.apply(Function::Exp)
    }

    pub fn ln(self) -> Expr {
        self.apply(Function::Ln)
    }

    pub fn sqrt(self) -> Expr {
        self.apply(Function::Sqrt)
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::Pow(self.boxed(), rhs.boxed())
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    /// check if the expression contains a variable
    pub fn contains_variable(&self, var_name: &str) -> bool {
        match self {
            Expr::Var(name) => name == var_name,
            Expr::Const(_) => false,
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                lhs.contains_variable(var_name) || rhs.contains_variable(var_name)
            }
            Expr::Neg(expr) | Expr::Func(_, expr) => expr.contains_variable(var_name),
        }
    }

    /// All symbols referenced by the expression, named constants excluded.
    /// Sorted and deduplicated.
    pub fn variables(&self) -> Vec<String> {
        fn collect(expr: &Expr, vars: &mut Vec<String>) {
            match expr {
                Expr::Var(name) => {
                    if named_constant(name).is_none() {
                        vars.push(name.clone());
                    }
                }
                Expr::Const(_) => {}
                Expr::Add(lhs, rhs)
                | Expr::Sub(lhs, rhs)
                | Expr::Mul(lhs, rhs)
                | Expr::Div(lhs, rhs)
                | Expr::Pow(lhs, rhs) => {
                    collect(lhs, vars);
                    collect(rhs, vars);
                }
                Expr::Neg(expr) | Expr::Func(_, expr) => collect(expr, vars),
            }
        }
        let mut vars = Vec::new();
        collect(self, &mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    /// binding strength used by Display: higher binds tighter
    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) => 2,
            Expr::Neg(_) => 3,
            Expr::Const(val) if val.is_sign_negative() => 3,
            Expr::Pow(..) => 4,
            Expr::Var(_) | Expr::Const(_) | Expr::Func(..) => 5,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Renders a formula the parser accepts back, e.g. `2 * x * cos(x ^ 2)`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) | Expr::Sub(lhs, rhs) => {
                let op = if matches!(self, Expr::Add(..)) { "+" } else { "-" };
                lhs.fmt_operand(f, lhs.precedence() < 1)?;
                write!(f, " {} ", op)?;
                rhs.fmt_operand(f, rhs.precedence() <= 1)
            }
            Expr::Mul(lhs, rhs) | Expr::Div(lhs, rhs) => {
                let op = if matches!(self, Expr::Mul(..)) { "*" } else { "/" };
                lhs.fmt_operand(f, lhs.precedence() < 2)?;
                write!(f, " {} ", op)?;
                rhs.fmt_operand(f, rhs.precedence() <= 2)
            }
            Expr::Pow(base, exp) => {
                base.fmt_operand(f, base.precedence() < 5)?;
                write!(f, " ^ ")?;
                exp.fmt_operand(f, exp.precedence() < 5)
            }
            Expr::Neg(expr) => {
                write!(f, "-")?;
                expr.fmt_operand(f, expr.precedence() < 3)
            }
            Expr::Func(function, arg) => write!(f, "{}({})", function, arg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_function_aliases() {
        assert_eq!(Function::from_str("tg").unwrap(), Function::Tan);
        assert_eq!(Function::from_str("arctg").unwrap(), Function::Atan);
        assert_eq!(Function::from_str("ln").unwrap(), Function::Ln);
        assert_eq!(Function::from_str("log").unwrap(), Function::Ln);
        assert!(Function::from_str("foo").is_err());
    }

    #[test]
    fn test_function_names_round_trip() {
        for function in Function::iter() {
            let name = function.to_string();
            assert_eq!(Function::from_str(&name).unwrap(), function);
        }
    }

    #[test]
    fn test_display_minimal_parentheses() {
        let x = Expr::var("x");
        let expr = (x.clone() + Expr::Const(1.0)) * x.clone();
        assert_eq!(expr.to_string(), "(x + 1) * x");
        let expr = x.clone() - (x.clone() - Expr::Const(2.0));
        assert_eq!(expr.to_string(), "x - (x - 2)");
        let expr = -(x.clone().pow(Expr::Const(2.0)));
        assert_eq!(expr.to_string(), "-x ^ 2");
        let expr = x.clone().pow(Expr::Const(-1.0));
        assert_eq!(expr.to_string(), "x ^ (-1)");
        let expr = (x.clone() * Expr::Const(3.0)).apply(Function::Sin);
        assert_eq!(expr.to_string(), "sin(x * 3)");
    }

    #[test]
    fn test_variables_skip_named_constants() {
        let expr = Expr::var("x") * Expr::var("pi") + Expr::var("y") + Expr::var("x");
        assert_eq!(expr.variables(), vec!["x".to_string(), "y".to_string()]);
        assert!(expr.contains_variable("y"));
        assert!(!expr.contains_variable("z"));
    }

    #[test]
    fn test_function_apply() {
        assert_eq!(Function::Exp.apply(0.0), 1.0);
        assert!((Function::Acot.apply(1.0) - PI / 4.0).abs() < 1e-12);
        assert!(Function::Ln.apply(-1.0).is_nan());
        assert!(Function::Sqrt.apply(-4.0).is_nan());
    }
}
