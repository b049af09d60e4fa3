//! # Symbolic Engine Derivatives Module
//!
//! Analytical differentiation and algebraic cleanup of [`Expr`] trees.
//!
//! ## Key Methods
//! - `diff(var)` - derivative by the sum, product, quotient, power and chain rules
//! - `simplify()` - constant folding plus neutral element rules, so that `d/dx x^2`
//!   reads `2 * x` rather than `2 * x ^ 1 * 1`
//! - `n_th_derivative1D(var, n)` - repeated differentiation
//! - `eval_at(var, x)` - direct recursive evaluation
//! - `compare_num1D(...)` - validate an analytical derivative against a central difference
//!
//! The text of a simplified derivative is what the plot legend shows next to `f'(x)`.
use crate::symbolic::symbolic_engine::{Expr, Function, named_constant};
use crate::symbolic::symbolic_lambdify::EvalError;

impl Expr {
    //___________________________________________________________________________________________________________________
    //                     DIFFERENTIATION
    // _________________________________________________________________________________________________________________

    /// Analytical derivative with respect to `var`. The result is not simplified.
    ///
    /// # Examples
    /// ```
    /// use RustedFormulaPlot::symbolic::symbolic_engine::Expr;
    /// let f = Expr::parse_expression("x^3 + sin(x)").unwrap();
    /// assert_eq!(f.diff("x").simplify().to_string(), "3 * x ^ 2 + cos(x)");
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Var(name) => {
                if name == var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => lhs.diff(var) + rhs.diff(var),
            Expr::Sub(lhs, rhs) => lhs.diff(var) - rhs.diff(var),
            Expr::Mul(lhs, rhs) => {
                let lhs_diff = lhs.diff(var);
                let rhs_diff = rhs.diff(var);
                lhs_diff * *rhs.clone() + *lhs.clone() * rhs_diff
            }
            Expr::Div(lhs, rhs) => {
                let lhs_diff = lhs.diff(var);
                let rhs_diff = rhs.diff(var);
                (lhs_diff * *rhs.clone() - *lhs.clone() * rhs_diff)
                    / (*rhs.clone()).pow(Expr::Const(2.0))
            }
            Expr::Pow(base, exp) => {
                let base_diff = base.diff(var);
                if !exp.contains_variable(var) {
                    // v * u^(v-1) * u'
                    let reduced = match exp.as_ref() {
                        Expr::Const(val) => Expr::Const(val - 1.0),
                        other => other.clone() - Expr::Const(1.0),
                    };
                    *exp.clone() * (*base.clone()).pow(reduced) * base_diff
                } else if !base.contains_variable(var) {
                    // u^v * ln(u) * v'
                    self.clone() * (*base.clone()).ln() * exp.diff(var)
                } else {
                    // u^v * (v' * ln(u) + v * u' / u)
                    let exp_diff = exp.diff(var);
                    self.clone()
                        * (exp_diff * (*base.clone()).ln() + *exp.clone() * base_diff / *base.clone())
                }
            }
            Expr::Neg(expr) => -expr.diff(var),
            Expr::Func(function, arg) => {
                let outer = Self::function_derivative(*function, arg);
                outer * arg.diff(var)
            }
        }
    }

    /// derivative of `function` evaluated at `u`, without the chain factor
    fn function_derivative(function: Function, u: &Expr) -> Expr {
        let u = u.clone();
        let one = || Expr::Const(1.0);
        let square = |e: Expr| e.pow(Expr::Const(2.0));
        match function {
            Function::Exp => u.exp(),
            Function::Ln => one() / u,
            Function::Log10 => one() / (u * Expr::Const(10.0).ln()),
            Function::Sqrt => one() / (Expr::Const(2.0) * u.sqrt()),
            Function::Abs => u.clone() / u.apply(Function::Abs),
            Function::Sin => u.apply(Function::Cos),
            Function::Cos => -u.apply(Function::Sin),
            Function::Tan => one() / square(u.apply(Function::Cos)),
            Function::Cot => -(one() / square(u.apply(Function::Sin))),
            Function::Asin => one() / (one() - square(u)).sqrt(),
            Function::Acos => -(one() / (one() - square(u)).sqrt()),
            Function::Atan => one() / (one() + square(u)),
            Function::Acot => -(one() / (one() + square(u))),
            Function::Sinh => u.apply(Function::Cosh),
            Function::Cosh => u.apply(Function::Sinh),
            Function::Tanh => one() / square(u.apply(Function::Cosh)),
        }
    }

    /// n-th derivative, simplified after every step
    pub fn n_th_derivative1D(&self, var_name: &str, n: usize) -> Expr {
        let mut expr = self.clone();
        for _ in 0..n {
            expr = expr.diff(var_name).simplify();
        }
        expr
    }

    //___________________________________________________________________________________________________________________
    //                     SIMPLIFICATION
    // _________________________________________________________________________________________________________________

    /// Bottom-up constant folding and neutral element rules.
    ///
    /// Folding never produces a non-finite constant, `1/0` stays `1 / 0`. Division, powers and
    /// function calls of constants are folded only when the result is an integer, so `1/3` and
    /// `log(10)` keep their exact textual form.
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Var(_) | Expr::Const(_) => self.clone(),
            Expr::Add(lhs, rhs) => match (lhs.simplify(), rhs.simplify()) {
                (Expr::Const(a), Expr::Const(b)) => fold(a + b, || Expr::Const(a) + Expr::Const(b)),
                (l, r) if l.is_zero() => r,
                (l, r) if r.is_zero() => l,
                (l, Expr::Const(b)) if b < 0.0 => l - Expr::Const(-b),
                (l, Expr::Neg(r)) => l - *r,
                (l, r) => l + r,
            },
            Expr::Sub(lhs, rhs) => match (lhs.simplify(), rhs.simplify()) {
                (Expr::Const(a), Expr::Const(b)) => fold(a - b, || Expr::Const(a) - Expr::Const(b)),
                (l, r) if r.is_zero() => l,
                (l, r) if l.is_zero() => negate(r),
                (l, Expr::Neg(r)) => l + *r,
                (l, r) => l - r,
            },
            Expr::Mul(lhs, rhs) => simplify_mul(lhs.simplify(), rhs.simplify()),
            Expr::Div(lhs, rhs) => match (lhs.simplify(), rhs.simplify()) {
                (Expr::Const(a), Expr::Const(b)) => {
                    fold_integer(a / b, || Expr::Const(a) / Expr::Const(b))
                }
                (l, r) if r.is_one() => l,
                (l, r) if l.is_zero() && !r.is_zero() => Expr::Const(0.0),
                (l, r) => l / r,
            },
            Expr::Pow(base, exp) => match (base.simplify(), exp.simplify()) {
                (Expr::Const(a), Expr::Const(b)) => {
                    fold_integer(a.powf(b), || Expr::Const(a).pow(Expr::Const(b)))
                }
                (_, e) if e.is_zero() => Expr::Const(1.0),
                (b, e) if e.is_one() => b,
                (b, _) if b.is_one() => Expr::Const(1.0),
                (b, e) => b.pow(e),
            },
            Expr::Neg(expr) => negate(expr.simplify()),
            Expr::Func(function, arg) => match arg.simplify() {
                Expr::Const(a) => fold_integer(function.apply(a), || Expr::Const(a).apply(*function)),
                other => other.apply(*function),
            },
        }
    }

    //___________________________________________________________________________________________________________________
    //                     EVALUATION
    // _________________________________________________________________________________________________________________

    /// Evaluates the expression at `var = x` by walking the tree. Named constants resolve to their
    /// values; any other symbol is an error.
    pub fn eval_at(&self, var: &str, x: f64) -> Result<f64, EvalError> {
        let value = match self {
            Expr::Var(name) if name == var => x,
            Expr::Var(name) => {
                named_constant(name).ok_or_else(|| EvalError::UndefinedSymbol(name.clone()))?
            }
            Expr::Const(val) => *val,
            Expr::Add(lhs, rhs) => lhs.eval_at(var, x)? + rhs.eval_at(var, x)?,
            Expr::Sub(lhs, rhs) => lhs.eval_at(var, x)? - rhs.eval_at(var, x)?,
            Expr::Mul(lhs, rhs) => lhs.eval_at(var, x)? * rhs.eval_at(var, x)?,
            Expr::Div(lhs, rhs) => lhs.eval_at(var, x)? / rhs.eval_at(var, x)?,
            Expr::Pow(base, exp) => base.eval_at(var, x)?.powf(exp.eval_at(var, x)?),
            Expr::Neg(expr) => -expr.eval_at(var, x)?,
            Expr::Func(function, arg) => function.apply(arg.eval_at(var, x)?),
        };
        Ok(value)
    }

    /// Compares the analytical derivative with a central finite difference on `num_values`
    /// points of `[start, end]`. Points where either value is not finite are left out.
    /// Returns the root mean square difference and whether it is below `max_norm`.
    pub fn compare_num1D(
        &self,
        var: &str,
        start: f64,
        end: f64,
        num_values: usize,
        max_norm: f64,
    ) -> Result<(f64, bool), EvalError> {
        let function = self.compile(var);
        let derivative = self.diff(var).simplify().compile(var);
        let num_values = num_values.max(2);
        let step_between = (end - start) / (num_values as f64 - 1.0);
        let h = 1e-4 * step_between.abs().max(1e-3);
        let mut sum_sq = 0.0;
        let mut used = 0usize;
        for i in 0..num_values {
            let x = start + i as f64 * step_between;
            let analytical = derivative.evaluate(x)?;
            let numerical = (function.evaluate(x + h)? - function.evaluate(x - h)?) / (2.0 * h);
            if analytical.is_finite() && numerical.is_finite() {
                sum_sq += (analytical - numerical).powi(2);
                used += 1;
            }
        }
        let norm = if used == 0 { 0.0 } else { (sum_sq / used as f64).sqrt() };
        Ok((norm, norm < max_norm))
    }
}

fn fold(value: f64, keep: impl FnOnce() -> Expr) -> Expr {
    if value.is_finite() { Expr::Const(value) } else { keep() }
}

fn fold_integer(value: f64, keep: impl FnOnce() -> Expr) -> Expr {
    if value.is_finite() && value.fract() == 0.0 {
        Expr::Const(value)
    } else {
        keep()
    }
}

fn negate(expr: Expr) -> Expr {
    match expr {
        Expr::Const(val) => Expr::Const(-val),
        Expr::Neg(inner) => *inner,
        other => -other,
    }
}

fn simplify_mul(lhs: Expr, rhs: Expr) -> Expr {
    match (lhs, rhs) {
        (Expr::Const(a), Expr::Const(b)) => fold(a * b, || Expr::Const(a) * Expr::Const(b)),
        (l, r) if l.is_zero() || r.is_zero() => Expr::Const(0.0),
        (l, r) if l.is_one() => r,
        (l, r) if r.is_one() => l,
        (Expr::Const(a), r) if a == -1.0 => negate(r),
        // constants go first: x * 2 -> 2 * x
        (l, Expr::Const(b)) => simplify_mul(Expr::Const(b), l),
        // left associate so constants meet: 3 * (2 * x) -> 6 * x
        (l, Expr::Mul(inner_lhs, inner_rhs)) => simplify_mul(l, *inner_lhs) * *inner_rhs,
        (Expr::Neg(l), r) => negate(simplify_mul(*l, r)),
        (l, Expr::Neg(r)) => negate(simplify_mul(l, *r)),
        (l, r) => l * r,
    }
}
