//! # Formula normalization
//!
//! A raw formula typed by a user ("sen(x) + x²", "y = 2·x") may be rewritten into the
//! syntax the parser accepts before it is compiled. The rewriting is an injected capability
//! ([`FormulaNormalizer`]); when it is missing or fails, the raw text is used unchanged and
//! the reason is kept for display.
//!
//! Available normalizers:
//! - [`NotConfigured`] - always falls back, the normal state when no service is set up
//! - [`RuleBasedNormalizer`] - offline rewriting of common informal notation
//! - [`ReplyNormalizer`] - wraps any text-to-text service (for example a language model client)
//!   and cleans its reply
//! - any closure `Fn(&str) -> Normalization`
use regex::Regex;
use std::fmt;

/// Why the raw formula was used instead of a normalized one.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    NotConfigured,
    ServiceFailed(String),
    EmptyReply,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FallbackReason::NotConfigured => {
                write!(f, "No normalization service configured. Using the original formula")
            }
            FallbackReason::ServiceFailed(msg) => {
                write!(f, "Normalization service failed ({}). Using the original formula", msg)
            }
            FallbackReason::EmptyReply => {
                write!(f, "Normalization service returned an empty reply. Using the original formula")
            }
        }
    }
}

/// Outcome of a normalization attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalization {
    Normalized(String),
    Fallback {
        expression: String,
        reason: FallbackReason,
    },
}

impl Normalization {
    pub fn fallback(raw: &str, reason: FallbackReason) -> Self {
        Normalization::Fallback {
            expression: raw.to_string(),
            reason,
        }
    }

    /// the formula to compile
    pub fn expression(&self) -> &str {
        match self {
            Normalization::Normalized(expression) => expression,
            Normalization::Fallback { expression, .. } => expression,
        }
    }

    pub fn used_service(&self) -> bool {
        matches!(self, Normalization::Normalized(_))
    }

    pub fn reason(&self) -> Option<&FallbackReason> {
        match self {
            Normalization::Normalized(_) => None,
            Normalization::Fallback { reason, .. } => Some(reason),
        }
    }
}

pub trait FormulaNormalizer {
    fn normalize(&self, raw: &str) -> Normalization;
}

impl<F> FormulaNormalizer for F
where
    F: Fn(&str) -> Normalization,
{
    fn normalize(&self, raw: &str) -> Normalization {
        self(raw)
    }
}

/// No service available: the raw formula is always used.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotConfigured;

impl FormulaNormalizer for NotConfigured {
    fn normalize(&self, raw: &str) -> Normalization {
        Normalization::fallback(raw, FallbackReason::NotConfigured)
    }
}

/// Strips surrounding Markdown code fences and whitespace from a service reply:
/// "```js\nsin(x)\n```" -> "sin(x)".
pub fn clean_model_reply(text: &str) -> String {
    let mut cleaned = text.trim();
    if cleaned.starts_with("```") {
        cleaned = match cleaned.find('\n') {
            Some(pos) => &cleaned[pos + 1..],
            None => "",
        };
    }
    if let Some(stripped) = cleaned.strip_suffix("```") {
        cleaned = stripped;
    }
    cleaned.trim().to_string()
}

/// Normalizer on top of a text service `raw -> Result<reply, error message>`.
pub struct ReplyNormalizer<S>
where
    S: Fn(&str) -> Result<String, String>,
{
    service: S,
}

impl<S> ReplyNormalizer<S>
where
    S: Fn(&str) -> Result<String, String>,
{
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

impl<S> FormulaNormalizer for ReplyNormalizer<S>
where
    S: Fn(&str) -> Result<String, String>,
{
    fn normalize(&self, raw: &str) -> Normalization {
        match (self.service)(raw) {
            Ok(reply) => {
                let cleaned = clean_model_reply(&reply);
                if cleaned.is_empty() {
                    Normalization::fallback(raw, FallbackReason::EmptyReply)
                } else {
                    Normalization::Normalized(cleaned)
                }
            }
            Err(msg) => Normalization::fallback(raw, FallbackReason::ServiceFailed(msg)),
        }
    }
}

/// Offline rewriting of informal notation.
///
/// `sen` -> `sin`, `x²` -> `x^2`, `·`/`×` -> `*`, `÷` -> `/`, `π` -> `pi`, `√x` -> `sqrt(x)`,
/// and a leading `y =` or `f(x) =` is dropped. A decimal comma is left alone since it is
/// ambiguous with argument separators.
#[derive(Debug, Clone)]
pub struct RuleBasedNormalizer {
    prefix: Regex,
    sen: Regex,
    root_of_token: Regex,
}

impl RuleBasedNormalizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            prefix: Regex::new(r"^\s*(?:y|f\s*\(\s*x\s*\))\s*=\s*")?,
            sen: Regex::new(r"\bsen\b")?,
            root_of_token: Regex::new(r"√\s*([A-Za-z0-9_.]+)")?,
        })
    }

    pub fn rewrite(&self, raw: &str) -> String {
        let text = self.prefix.replace(raw, "");
        let text = self.sen.replace_all(&text, "sin");
        let text = text
            .replace('²', "^2")
            .replace('³', "^3")
            .replace(['·', '×', '⋅'], "*")
            .replace('÷', "/")
            .replace('π', "pi")
            .replace('−', "-")
            .replace("√(", "sqrt(");
        let text = self.root_of_token.replace_all(&text, "sqrt($1)");
        text.trim().to_string()
    }
}

impl FormulaNormalizer for RuleBasedNormalizer {
    fn normalize(&self, raw: &str) -> Normalization {
        let rewritten = self.rewrite(raw);
        if rewritten.is_empty() {
            Normalization::fallback(raw, FallbackReason::EmptyReply)
        } else {
            Normalization::Normalized(rewritten)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_configured_falls_back_to_raw() {
        let outcome = NotConfigured.normalize("x^2 + 3x");
        assert_eq!(outcome.expression(), "x^2 + 3x");
        assert!(!outcome.used_service());
        assert_eq!(outcome.reason(), Some(&FallbackReason::NotConfigured));
    }

    #[test]
    fn test_closure_normalizer() {
        let rename_ln = |raw: &str| Normalization::Normalized(raw.replace("ln", "log"));
        let outcome = rename_ln.normalize("ln(x)");
        assert_eq!(outcome, Normalization::Normalized("log(x)".to_string()));
        assert!(outcome.used_service());
    }

    #[test]
    fn test_clean_model_reply() {
        assert_eq!(clean_model_reply("```js\npow(x,2) + 3*x\n```"), "pow(x,2) + 3*x");
        assert_eq!(clean_model_reply("  sin(x)  "), "sin(x)");
        assert_eq!(clean_model_reply("```\n```"), "");
    }

    #[test]
    fn test_reply_normalizer() {
        let ok = ReplyNormalizer::new(|_raw: &str| Ok("```\nsin(x)\n```".to_string()));
        assert_eq!(ok.normalize("sen(x)").expression(), "sin(x)");
        let empty = ReplyNormalizer::new(|_raw: &str| Ok("   ".to_string()));
        let outcome = empty.normalize("sen(x)");
        assert_eq!(outcome.expression(), "sen(x)");
        assert_eq!(outcome.reason(), Some(&FallbackReason::EmptyReply));
        let failing = ReplyNormalizer::new(|_raw: &str| Err("HTTP 500".to_string()));
        let outcome = failing.normalize("sen(x)");
        assert_eq!(
            outcome.reason(),
            Some(&FallbackReason::ServiceFailed("HTTP 500".to_string()))
        );
        assert!(outcome.reason().unwrap().to_string().contains("HTTP 500"));
    }

    #[test]
    fn test_rule_based_rewrites() {
        let normalizer = RuleBasedNormalizer::new().unwrap();
        assert_eq!(normalizer.rewrite("y = sen(x) + x²"), "sin(x) + x^2");
        assert_eq!(normalizer.rewrite("f(x) = 2·x ÷ π"), "2*x / pi");
        assert_eq!(normalizer.rewrite("√(x) + √2x"), "sqrt(x) + sqrt(2x)");
        assert_eq!(normalizer.rewrite("tg(x) * ctg(x)"), "tg(x) * ctg(x)");
        // a word that merely contains "sen" is kept
        assert_eq!(normalizer.rewrite("sent"), "sent");
    }

    #[test]
    fn test_rule_based_empty_result() {
        let normalizer = RuleBasedNormalizer::new().unwrap();
        let outcome = normalizer.normalize("y = ");
        assert_eq!(outcome.reason(), Some(&FallbackReason::EmptyReply));
        assert_eq!(outcome.expression(), "y = ");
    }
}
