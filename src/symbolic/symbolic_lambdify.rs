//! Lowering of an [`Expr`] into a flat evaluation tree bound to one variable,
//! plus the [`ScalarFunction`] seam the numerical code is generic over.
use crate::symbolic::symbolic_engine::{Expr, Function, named_constant};
use std::fmt;

/// Error raised while evaluating a compiled function at a point.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    /// the formula references a symbol that is neither the bound variable nor a named constant
    UndefinedSymbol(String),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EvalError::UndefinedSymbol(name) => write!(f, "Undefined symbol: {}", name),
        }
    }
}

impl std::error::Error for EvalError {}

/// A real function of one real variable whose evaluation may fail.
///
/// Non-finite results are returned as values, the caller picks the policy
/// (the sampler records a gap, the integrator rejects endpoints).
pub trait ScalarFunction {
    fn evaluate(&self, x: f64) -> Result<f64, EvalError>;

    /// Get function name for debugging/logging
    fn name(&self) -> &str {
        "unnamed_function"
    }
}

impl<T: ScalarFunction + ?Sized> ScalarFunction for &T {
    fn evaluate(&self, x: f64) -> Result<f64, EvalError> {
        (**self).evaluate(x)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Simple function wrapper for closures
pub struct ClosureFunction<F>
where
    F: Fn(f64) -> f64,
{
    func: F,
    name: String,
}

impl<F> ClosureFunction<F>
where
    F: Fn(f64) -> f64,
{
    pub fn new(func: F, name: String) -> Self {
        Self { func, name }
    }
}

impl<F> ScalarFunction for ClosureFunction<F>
where
    F: Fn(f64) -> f64,
{
    fn evaluate(&self, x: f64) -> Result<f64, EvalError> {
        Ok((self.func)(x))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Lambda {
    /// the bound variable
    Arg,
    Const(f64),
    /// symbol without a value, fails on evaluation
    Free(String),
    Add(Box<Lambda>, Box<Lambda>),
    Sub(Box<Lambda>, Box<Lambda>),
    Mul(Box<Lambda>, Box<Lambda>),
    Div(Box<Lambda>, Box<Lambda>),
    Pow(Box<Lambda>, Box<Lambda>),
    Neg(Box<Lambda>),
    Func(Function, Box<Lambda>),
}

impl Lambda {
    #[inline(always)]
    pub fn eval(&self, x: f64) -> Result<f64, EvalError> {
        let value = match self {
            Lambda::Arg => x,
            Lambda::Const(v) => *v,
            Lambda::Free(name) => return Err(EvalError::UndefinedSymbol(name.clone())),
            Lambda::Add(a, b) => a.eval(x)? + b.eval(x)?,
            Lambda::Sub(a, b) => a.eval(x)? - b.eval(x)?,
            Lambda::Mul(a, b) => a.eval(x)? * b.eval(x)?,
            Lambda::Div(a, b) => a.eval(x)? / b.eval(x)?,
            Lambda::Pow(a, b) => a.eval(x)?.powf(b.eval(x)?),
            Lambda::Neg(e) => -e.eval(x)?,
            Lambda::Func(function, e) => function.apply(e.eval(x)?),
        };
        Ok(value)
    }
}

/// Formula compiled for repeated evaluation in one variable.
#[derive(Clone, Debug)]
pub struct CompiledExpr {
    var: String,
    text: String,
    lambda: Lambda,
}

impl CompiledExpr {
    /// name of the bound variable
    pub fn var(&self) -> &str {
        &self.var
    }

    /// rendering of the expression this was compiled from
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lambda(&self) -> &Lambda {
        &self.lambda
    }

    /// Symbols other than the bound variable and named constants. Evaluation fails
    /// whenever this is not empty and the symbol is reached.
    pub fn free_symbols(&self) -> Vec<String> {
        fn collect(lambda: &Lambda, out: &mut Vec<String>) {
            match lambda {
                Lambda::Arg | Lambda::Const(_) => {}
                Lambda::Free(name) => out.push(name.clone()),
                Lambda::Add(a, b)
                | Lambda::Sub(a, b)
                | Lambda::Mul(a, b)
                | Lambda::Div(a, b)
                | Lambda::Pow(a, b) => {
                    collect(a, out);
                    collect(b, out);
                }
                Lambda::Neg(e) | Lambda::Func(_, e) => collect(e, out),
            }
        }
        let mut out = Vec::new();
        collect(&self.lambda, &mut out);
        out.sort();
        out.dedup();
        out
    }

    pub fn evaluate(&self, x: f64) -> Result<f64, EvalError> {
        self.lambda.eval(x)
    }

    /// Optional API for closure-based callers; failures become `NaN`
    pub fn as_closure(self) -> impl Fn(f64) -> f64 + Send + Sync {
        move |x| self.lambda.eval(x).unwrap_or(f64::NAN)
    }
}

impl ScalarFunction for CompiledExpr {
    fn evaluate(&self, x: f64) -> Result<f64, EvalError> {
        self.lambda.eval(x)
    }

    fn name(&self) -> &str {
        &self.text
    }
}

impl Expr {
    fn to_lambda(&self, var: &str) -> Lambda {
        let bin = |a: &Expr, b: &Expr| (Box::new(a.to_lambda(var)), Box::new(b.to_lambda(var)));
        match self {
            Expr::Var(name) if name == var => Lambda::Arg,
            Expr::Var(name) => match named_constant(name) {
                Some(value) => Lambda::Const(value),
                None => Lambda::Free(name.clone()),
            },
            Expr::Const(v) => Lambda::Const(*v),
            Expr::Add(a, b) => {
                let (a, b) = bin(a, b);
                Lambda::Add(a, b)
            }
            Expr::Sub(a, b) => {
                let (a, b) = bin(a, b);
                Lambda::Sub(a, b)
            }
            Expr::Mul(a, b) => {
                let (a, b) = bin(a, b);
                Lambda::Mul(a, b)
            }
            Expr::Div(a, b) => {
                let (a, b) = bin(a, b);
                Lambda::Div(a, b)
            }
            Expr::Pow(a, b) => {
                let (a, b) = bin(a, b);
                Lambda::Pow(a, b)
            }
            Expr::Neg(e) => Lambda::Neg(Box::new(e.to_lambda(var))),
            Expr::Func(function, e) => Lambda::Func(*function, Box::new(e.to_lambda(var))),
        }
    }

    /// Compiles the expression as a function of `var`. Never fails: symbols other than `var`
    /// and the named constants are reported by evaluation.
    pub fn compile(&self, var: &str) -> CompiledExpr {
        CompiledExpr {
            var: var.to_string(),
            text: self.to_string(),
            lambda: self.to_lambda(var),
        }
    }

    /// Boxed closure `x -> f(x)` in the style of the lambdify family; failures become `NaN`
    pub fn lambdify1D(&self, var: &str) -> Box<dyn Fn(f64) -> f64 + Send + Sync> {
        Box::new(self.compile(var).as_closure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compile_and_evaluate() {
        let expr = Expr::parse_expression("sin(x) + 0.5 * x").unwrap();
        let compiled = expr.compile("x");
        assert_relative_eq!(compiled.evaluate(0.0).unwrap(), 0.0);
        assert_relative_eq!(
            compiled.evaluate(2.0).unwrap(),
            2.0_f64.sin() + 1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_named_constants_fold_at_compile() {
        let compiled = Expr::parse_expression("pi * x + e").unwrap().compile("x");
        assert!(compiled.free_symbols().is_empty());
        assert_relative_eq!(
            compiled.evaluate(1.0).unwrap(),
            std::f64::consts::PI + std::f64::consts::E,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_free_symbol_fails_on_evaluate() {
        let compiled = Expr::parse_expression("x + y").unwrap().compile("x");
        assert_eq!(compiled.free_symbols(), vec!["y".to_string()]);
        assert_eq!(
            compiled.evaluate(1.0),
            Err(EvalError::UndefinedSymbol("y".to_string()))
        );
    }

    #[test]
    fn test_non_finite_is_a_value() {
        let compiled = Expr::parse_expression("1/x").unwrap().compile("x");
        assert!(compiled.evaluate(0.0).unwrap().is_infinite());
        let compiled = Expr::parse_expression("sqrt(x)").unwrap().compile("x");
        assert!(compiled.evaluate(-1.0).unwrap().is_nan());
    }

    #[test]
    fn test_compiled_matches_tree_walk() {
        let expr = Expr::parse_expression("x^3 - 2 * cosh(x) / (1 + abs(x)) + log10(x^2 + 1)").unwrap();
        let compiled = expr.compile("x");
        for i in 0..20 {
            let x = -3.0 + 0.3 * i as f64;
            assert_relative_eq!(
                compiled.evaluate(x).unwrap(),
                expr.eval_at("x", x).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_closure_function() {
        let square = ClosureFunction::new(|x| x * x, "square".to_string());
        assert_eq!(square.evaluate(3.0), Ok(9.0));
        assert_eq!(square.name(), "square");
        let lambda = Expr::parse_expression("2x").unwrap().lambdify1D("x");
        assert_eq!(lambda(4.0), 8.0);
        let failing = Expr::parse_expression("k").unwrap().lambdify1D("x");
        assert!(failing(1.0).is_nan());
    }
}
