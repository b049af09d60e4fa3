//! a module turns a String formula into a symbolic expression
//!
//! Grammar (lowest to highest binding):
//! ```text
//!  expression := term (('+' | '-') term)*
//!  term       := unary (('*' | '/') unary | implicit_factor)*
//!  unary      := ('-' | '+') unary | power
//!  power      := atom ('^' unary)?              right associative, -x^2 == -(x^2)
//!  atom       := number | call | symbol | '(' expression ')'
//! ```
//! Implicit multiplication covers `3x`, `2(x + 1)` and `2 sin(x)`.
//! Nesting deeper than [`MAX_NESTING`] and trees deeper than [`MAX_TREE_DEPTH`] are
//! rejected with [`CompileError::Syntax`], as are literals that overflow `f64`.
//!
//! # Example
//! ```
//! use RustedFormulaPlot::symbolic::symbolic_engine::Expr;
//! let parsed_expression = Expr::parse_expression("x^2 + 3x").unwrap();
//! assert_eq!(parsed_expression.to_string(), "x ^ 2 + 3 * x");
//! ```
use crate::symbolic::symbolic_engine::{Expr, Function};
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of, satisfy},
    combinator::{cut, map, opt, peek, recognize},
    error::{ErrorKind, ParseError},
    multi::{fold_many0, many0, separated_list1},
    sequence::{pair, preceded, terminated},
};
use std::fmt;
use std::str::FromStr;

/// Error produced when a formula string cannot be turned into an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    Empty,
    /// `position` is a byte offset into the formula
    Syntax { position: usize, message: String },
    UnknownFunction(String),
    WrongArity {
        function: String,
        expected: usize,
        found: usize,
    },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::Empty => write!(f, "empty formula"),
            CompileError::Syntax { position, message } => {
                write!(f, "syntax error at position {}: {}", position, message)
            }
            CompileError::UnknownFunction(name) => write!(f, "unknown function '{}'", name),
            CompileError::WrongArity {
                function,
                expected,
                found,
            } => write!(
                f,
                "function '{}' expects {} argument(s), got {}",
                function, expected, found
            ),
        }
    }
}

impl std::error::Error for CompileError {}

impl CompileError {
    fn unexpected(input: &str, remaining: &str) -> Self {
        let position = input.len() - remaining.len();
        let message = match remaining.chars().next() {
            Some(c) => format!("unexpected '{}'", c),
            None => "unexpected end of input".to_string(),
        };
        CompileError::Syntax { position, message }
    }
}

/// Deepest nesting of parentheses, calls, signs and exponents accepted by the parser.
pub const MAX_NESTING: usize = 64;
/// Deepest expression tree accepted; every later tree walk is recursive.
pub const MAX_TREE_DEPTH: usize = 200;

/// nom error carrying the remaining input at the failure point, a rejection with its own
/// message, or a semantic error found while building a function call
#[derive(Debug)]
enum ParseFailure<'a> {
    Syntax(&'a str),
    Rejected(&'a str, &'static str),
    Call(CompileError),
}

impl<'a> ParseError<&'a str> for ParseFailure<'a> {
    fn from_error_kind(input: &'a str, _kind: ErrorKind) -> Self {
        ParseFailure::Syntax(input)
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    // report the branch that got furthest into the input
    fn or(self, other: Self) -> Self {
        let keep_self = match (&self, &other) {
            (ParseFailure::Syntax(a), ParseFailure::Syntax(b)) => a.len() <= b.len(),
            (ParseFailure::Syntax(_), _) => false,
            (_, _) => true,
        };
        if keep_self { self } else { other }
    }
}

impl ParseFailure<'_> {
    fn into_compile_error(self, input: &str) -> CompileError {
        match self {
            ParseFailure::Syntax(remaining) => CompileError::unexpected(input, remaining),
            ParseFailure::Rejected(remaining, message) => CompileError::Syntax {
                position: input.len() - remaining.len(),
                message: message.to_string(),
            },
            ParseFailure::Call(err) => err,
        }
    }
}

type PResult<'a, O> = IResult<&'a str, O, ParseFailure<'a>>;

fn space(input: &str) -> PResult<'_, &str> {
    multispace0(input)
}

/// single character token surrounded by optional whitespace
fn symbol<'a>(c: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    move |input: &'a str| {
        let (input, _) = space(input)?;
        terminated(char(c), space).parse(input)
    }
}

fn number(input: &str) -> PResult<'_, Expr> {
    let mantissa = alt((
        recognize((digit1, opt((char('.'), digit0)))),
        recognize((char('.'), digit1)),
    ));
    // no cut here: "2e" and "2exp(x)" fall back to implicit multiplication
    let exponent = opt((one_of("eE"), opt(one_of("+-")), digit1));
    let parsed: PResult<'_, &str> = recognize((mantissa, exponent)).parse(input);
    let (rest, text) = parsed?;
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok((rest, Expr::Const(value))),
        Ok(_) => Err(nom::Err::Failure(ParseFailure::Rejected(
            input,
            "number out of range",
        ))),
        Err(_) => Err(nom::Err::Error(ParseFailure::from_error_kind(
            input,
            ErrorKind::Float,
        ))),
    }
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))
    .parse(input)
}

fn is_known_function(name: &str) -> bool {
    name == "pow" || Function::from_str(name).is_ok()
}

fn wrong_arity(function: &str, expected: usize, found: usize) -> CompileError {
    CompileError::WrongArity {
        function: function.to_string(),
        expected,
        found,
    }
}

/// Resolves a call `name(args...)` into an expression.
fn build_call(name: &str, mut args: Vec<Expr>) -> Result<Expr, CompileError> {
    match (name, args.len()) {
        ("pow", 2) => {
            let exponent = args.remove(1);
            let base = args.remove(0);
            Ok(base.pow(exponent))
        }
        ("pow", found) => Err(wrong_arity(name, 2, found)),
        // log(x, base)
        ("log", 2) => {
            let base = args.remove(1);
            let value = args.remove(0);
            Ok(value.ln() / base.ln())
        }
        (_, found) => {
            let function = Function::from_str(name)
                .map_err(|_| CompileError::UnknownFunction(name.to_string()))?;
            if found != 1 {
                return Err(wrong_arity(name, 1, found));
            }
            Ok(args.remove(0).apply(function))
        }
    }
}

fn call_or_symbol<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (rest, name) = identifier(input)?;
    let (after_space, _) = space(rest)?;
    // known functions may be separated from their '(' by spaces; for any other name
    // a space means implicit multiplication: "x (x + 1)"
    let call_input = if rest.starts_with('(') {
        Some(rest)
    } else if is_known_function(name) && after_space.starts_with('(') {
        Some(after_space)
    } else {
        None
    };
    let Some(call_input) = call_input else {
        return Ok((rest, Expr::Var(name.to_string())));
    };
    let (rest, args) = preceded(
        char('('),
        cut(terminated(
            separated_list1(symbol(','), |i: &'a str| expression(i, depth + 1)),
            symbol(')'),
        )),
    )
    .parse(call_input)?;
    match build_call(name, args) {
        Ok(expr) => Ok((rest, expr)),
        Err(err) => Err(nom::Err::Failure(ParseFailure::Call(err))),
    }
}

fn parenthesized<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    preceded(
        char('('),
        cut(terminated(|i: &'a str| expression(i, depth + 1), symbol(')'))),
    )
    .parse(input)
}

fn atom<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, _) = space(input)?;
    alt((
        number,
        |i: &'a str| call_or_symbol(i, depth),
        |i: &'a str| parenthesized(i, depth),
    ))
    .parse(input)
}

fn power<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, base) = atom(input, depth)?;
    let (input, exponent) =
        opt(preceded(symbol('^'), cut(|i: &'a str| unary(i, depth + 1)))).parse(input)?;
    match exponent {
        Some(exponent) => Ok((input, base.pow(exponent))),
        None => Ok((input, base)),
    }
}

fn negate(expr: Expr) -> Expr {
    match expr {
        Expr::Const(val) => Expr::Const(-val),
        other => Expr::Neg(other.boxed()),
    }
}

/// every nested construct passes through here, so this is where depth is bounded
fn unary<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, _) = space(input)?;
    if depth > MAX_NESTING {
        return Err(nom::Err::Failure(ParseFailure::Rejected(
            input,
            "expression nested too deeply",
        )));
    }
    alt((
        map(preceded(char('-'), |i: &'a str| unary(i, depth + 1)), negate),
        preceded(char('+'), |i: &'a str| unary(i, depth + 1)),
        |i: &'a str| power(i, depth),
    ))
    .parse(input)
}

/// a factor written right after another one without '*': "3x", "2(x+1)", "x sin(x)"
fn implicit_factor<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, _) = space(input)?;
    preceded(
        peek(satisfy(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '(')),
        |i: &'a str| power(i, depth),
    )
    .parse(input)
}

fn term<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, first) = unary(input, depth)?;
    fold_many0(
        alt((
            pair(
                alt((symbol('*'), symbol('/'))),
                cut(|i: &'a str| unary(i, depth)),
            ),
            map(|i: &'a str| implicit_factor(i, depth), |factor| ('*', factor)),
        )),
        move || first.clone(),
        |acc, (op, rhs)| if op == '*' { acc * rhs } else { acc / rhs },
    )
    .parse(input)
}

fn expression<'a>(input: &'a str, depth: usize) -> PResult<'a, Expr> {
    let (input, first) = term(input, depth)?;
    fold_many0(
        pair(
            alt((symbol('+'), symbol('-'))),
            cut(|i: &'a str| term(i, depth)),
        ),
        move || first.clone(),
        |acc, (op, rhs)| if op == '+' { acc + rhs } else { acc - rhs },
    )
    .parse(input)
}

/// Depth of the tree, walked with an explicit stack.
fn tree_depth(expr: &Expr) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(expr, 1)];
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        match node {
            Expr::Var(_) | Expr::Const(_) => {}
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs) => {
                stack.push((lhs.as_ref(), depth + 1));
                stack.push((rhs.as_ref(), depth + 1));
            }
            Expr::Neg(inner) | Expr::Func(_, inner) => stack.push((inner.as_ref(), depth + 1)),
        }
    }
    deepest
}

/// Parses a whole formula; the entire input must be consumed.
pub fn parse_expression_func(input: &str) -> Result<Expr, CompileError> {
    if input.trim().is_empty() {
        return Err(CompileError::Empty);
    }
    let parsed: PResult<'_, Expr> = terminated(|i| expression(i, 0), space).parse(input);
    let expr = match parsed {
        Ok(("", expr)) => expr,
        Ok((rest, _)) => return Err(CompileError::unexpected(input, rest)),
        Err(nom::Err::Error(failure)) | Err(nom::Err::Failure(failure)) => {
            return Err(failure.into_compile_error(input));
        }
        Err(nom::Err::Incomplete(_)) => return Err(CompileError::unexpected(input, "")),
    };
    if tree_depth(&expr) > MAX_TREE_DEPTH {
        return Err(CompileError::Syntax {
            position: 0,
            message: "expression too large".to_string(),
        });
    }
    Ok(expr)
}

impl Expr {
    /// Parses a mathematical expression from its string representation.
    ///
    /// # Supported Syntax
    /// - Variables and named constants: x, pi, e
    /// - Constants: 3.14, .5, 1e-6
    /// - Operators: +, -, *, /, ^ and implicit multiplication
    /// - Functions: sin, cos, tan/tg, cot/ctg, asin/arcsin, acos/arccos, atan/arctg,
    ///   acot/arcctg, sinh, cosh, tanh, exp, log/ln, log10, sqrt, abs, pow(a, b), log(x, base)
    pub fn parse_expression(input: &str) -> Result<Expr, CompileError> {
        parse_expression_func(input)
    }
}
