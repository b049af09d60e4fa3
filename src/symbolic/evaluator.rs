//! Stateless handle combining parsing, compilation and differentiation of formula strings.
//! It is passed explicitly to the sampler and to the integration tasks.
use crate::symbolic::parse_expr::CompileError;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_lambdify::CompiledExpr;
use log::debug;

/// Symbolic derivative of a formula: the tree, its textual rendering and a compiled form.
#[derive(Clone, Debug)]
pub struct Derivative {
    pub expr: Expr,
    pub text: String,
    pub compiled: CompiledExpr,
}

/// Formula evaluator bound to one variable name (`x` by default).
#[derive(Clone, Copy, Debug)]
pub struct Evaluator {
    var: &'static str,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self { var: "x" }
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(var: &'static str) -> Self {
        Self { var }
    }

    pub fn variable(&self) -> &'static str {
        self.var
    }

    pub fn parse(&self, formula: &str) -> Result<Expr, CompileError> {
        Expr::parse_expression(formula)
    }

    /// Parses and compiles `formula` as a function of the bound variable.
    pub fn compile(&self, formula: &str) -> Result<CompiledExpr, CompileError> {
        self.parse_and_compile(formula).map(|(_, compiled)| compiled)
    }

    /// Like [`Evaluator::compile`], but also hands back the parsed tree.
    pub fn parse_and_compile(&self, formula: &str) -> Result<(Expr, CompiledExpr), CompileError> {
        let expr = self.parse(formula)?;
        let compiled = expr.compile(self.var);
        let free = compiled.free_symbols();
        if !free.is_empty() {
            debug!("formula '{}' has free symbols {:?}", formula, free);
        }
        Ok((expr, compiled))
    }

    /// Symbolic derivative of an already parsed expression with respect to the bound variable.
    pub fn derive_expr(&self, expr: &Expr) -> Derivative {
        differentiate(expr, self.var)
    }

    /// Parses `formula` and differentiates it with respect to `var`; the compiled derivative
    /// takes `var` as its argument.
    pub fn derive(&self, formula: &str, var: &str) -> Result<Derivative, CompileError> {
        let expr = self.parse(formula)?;
        Ok(differentiate(&expr, var))
    }
}

fn differentiate(expr: &Expr, var: &str) -> Derivative {
    let derivative = expr.diff(var).simplify();
    let text = derivative.to_string();
    let compiled = derivative.compile(var);
    Derivative {
        expr: derivative,
        text,
        compiled,
    }
}
