/// a module turns a String formula into a symbolic expression
///
///# Example
/// ```
/// use RustedFormulaPlot::symbolic::symbolic_engine::Expr;
/// let parsed_expression = Expr::parse_expression("2 sin(x) + x^2").unwrap();
/// println!(" parsed_expression {}", parsed_expression);
///  ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) keeps a formula as a symbolic expression tree
/// 2) turns a symbolic expression into a string expression for printing and control results
///# Example#
/// ```
/// use RustedFormulaPlot::symbolic::symbolic_engine::Expr;
/// let x = Expr::var("x");
/// let f = x.clone() * x + Expr::Const(1.0);
/// assert_eq!(f.to_string(), "x * x + 1");
/// ```
pub mod symbolic_engine;
/// analytical derivatives and simplification of symbolic expressions
///# Example
/// ```
/// use RustedFormulaPlot::symbolic::symbolic_engine::Expr;
/// let f = Expr::parse_expression("x^2 + 3x").unwrap();
/// let df = f.diff("x").simplify();
/// assert_eq!(df.to_string(), "2 * x + 3");
/// assert_eq!(df.eval_at("x", 1.0).unwrap(), 5.0);
/// ```
pub mod symbolic_engine_derivatives;
/// turns a symbolic expression into a compiled function of one variable
pub mod symbolic_lambdify;
/// stateless handle to compile and differentiate formula strings
///# Example
/// ```
/// use RustedFormulaPlot::symbolic::evaluator::Evaluator;
/// let evaluator = Evaluator::new();
/// let f = evaluator.compile("sqrt(x)").unwrap();
/// assert_eq!(f.evaluate(4.0).unwrap(), 2.0);
/// let df = evaluator.derive("x^3", "x").unwrap();
/// assert_eq!(df.text, "3 * x ^ 2");
/// ```
pub mod evaluator;
/// optional rewriting of informal formulas before compilation
pub mod normalization;
