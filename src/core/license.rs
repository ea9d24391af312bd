//! License metadata and license expressions.
//!
//! A manifest's `license` element either points at a file shipped in the
//! package or declares an SPDX-style expression such as
//! `MIT OR (Apache-2.0 WITH Classpath-exception-2.0)`. Expressions are
//! only evaluated for format versions this library understands; newer
//! versions degrade to the raw text.

use std::fmt;

use semver::Version;
use serde::Serialize;
use thiserror::Error;

/// How the `license` element declares its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseType {
    /// The body names a file packaged alongside the manifest.
    File,
    /// The body is a license expression.
    Expression,
}

impl LicenseType {
    /// Map a raw `type` attribute onto the known set.
    ///
    /// Unrecognized values are `None`, never an error, so that manifests
    /// written for newer tooling still resolve.
    pub fn from_attribute(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("file") {
            Some(LicenseType::File)
        } else if raw.eq_ignore_ascii_case("expression") {
            Some(LicenseType::Expression)
        } else {
            None
        }
    }
}

/// Error from parsing a license expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LicenseExpressionError {
    #[error("license expression is empty")]
    Empty,
    #[error("invalid character `{0}` in license expression")]
    InvalidCharacter(char),
    #[error("unexpected token `{0}` in license expression")]
    UnexpectedToken(String),
    #[error("license expression ended unexpectedly")]
    UnexpectedEnd,
    #[error("unbalanced parentheses in license expression")]
    UnbalancedParens,
}

/// A parsed license expression tree.
///
/// Operator precedence follows SPDX: `WITH` binds tightest, then `AND`,
/// then `OR`. Operators must be uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LicenseExpression {
    /// A single license identifier; `plus` marks a trailing `+`
    /// ("this version or later").
    License { id: String, plus: bool },
    /// A license combined with an exception
    /// (`GPL-2.0 WITH Classpath-exception-2.0`).
    With {
        id: String,
        plus: bool,
        exception: String,
    },
    /// Both operands must be satisfied.
    And(Box<LicenseExpression>, Box<LicenseExpression>),
    /// Either operand may be satisfied.
    Or(Box<LicenseExpression>, Box<LicenseExpression>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Open,
    Close,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(id) => write!(f, "{}", id),
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, LicenseExpressionError> {
    let mut tokens = Vec::new();
    let mut ident = String::new();
    for c in input.chars() {
        match c {
            '(' | ')' => {
                if !ident.is_empty() {
                    tokens.push(Token::Ident(std::mem::take(&mut ident)));
                }
                tokens.push(if c == '(' { Token::Open } else { Token::Close });
            }
            c if c.is_whitespace() => {
                if !ident.is_empty() {
                    tokens.push(Token::Ident(std::mem::take(&mut ident)));
                }
            }
            c if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '+' => {
                ident.push(c);
            }
            other => return Err(LicenseExpressionError::InvalidCharacter(other)),
        }
    }
    if !ident.is_empty() {
        tokens.push(Token::Ident(ident));
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn or_expr(&mut self) -> Result<LicenseExpression, LicenseExpressionError> {
        let mut left = self.and_expr()?;
        while matches!(self.peek(), Some(Token::Ident(id)) if id == "OR") {
            self.next();
            let right = self.and_expr()?;
            left = LicenseExpression::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<LicenseExpression, LicenseExpressionError> {
        let mut left = self.primary()?;
        while matches!(self.peek(), Some(Token::Ident(id)) if id == "AND") {
            self.next();
            let right = self.primary()?;
            left = LicenseExpression::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<LicenseExpression, LicenseExpressionError> {
        match self.next() {
            Some(Token::Open) => {
                let inner = self.or_expr()?;
                match self.next() {
                    Some(Token::Close) => Ok(inner),
                    _ => Err(LicenseExpressionError::UnbalancedParens),
                }
            }
            Some(Token::Ident(id)) => {
                let (id, plus) = split_plus(&id)?;
                if id.is_empty() || is_operator(&id) {
                    return Err(LicenseExpressionError::UnexpectedToken(id));
                }
                if matches!(self.peek(), Some(Token::Ident(next)) if next == "WITH") {
                    self.next();
                    let exception = match self.next() {
                        Some(Token::Ident(exception))
                            if !is_operator(&exception) && !exception.contains('+') =>
                        {
                            exception
                        }
                        Some(token) => {
                            return Err(LicenseExpressionError::UnexpectedToken(
                                token.to_string(),
                            ))
                        }
                        None => return Err(LicenseExpressionError::UnexpectedEnd),
                    };
                    Ok(LicenseExpression::With {
                        id,
                        plus,
                        exception,
                    })
                } else {
                    Ok(LicenseExpression::License { id, plus })
                }
            }
            Some(Token::Close) => Err(LicenseExpressionError::UnbalancedParens),
            None => Err(LicenseExpressionError::UnexpectedEnd),
        }
    }
}

fn split_plus(id: &str) -> Result<(String, bool), LicenseExpressionError> {
    match id.strip_suffix('+') {
        Some(stripped) => {
            if stripped.contains('+') {
                return Err(LicenseExpressionError::UnexpectedToken(id.to_string()));
            }
            Ok((stripped.to_string(), true))
        }
        None => {
            if id.contains('+') {
                return Err(LicenseExpressionError::UnexpectedToken(id.to_string()));
            }
            Ok((id.to_string(), false))
        }
    }
}

/// Operator keywords are uppercase; the lowercase spellings are rejected
/// when they appear where an identifier is required.
fn is_operator(token: &str) -> bool {
    token.eq_ignore_ascii_case("and")
        || token.eq_ignore_ascii_case("or")
        || token.eq_ignore_ascii_case("with")
}

impl LicenseExpression {
    /// Parse an SPDX-style expression.
    pub fn parse(input: &str) -> Result<Self, LicenseExpressionError> {
        let tokens = tokenize(input)?;
        if tokens.is_empty() {
            return Err(LicenseExpressionError::Empty);
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expression = parser.or_expr()?;
        if let Some(extra) = parser.peek() {
            return Err(LicenseExpressionError::UnexpectedToken(extra.to_string()));
        }
        Ok(expression)
    }
}

impl fmt::Display for LicenseExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LicenseExpression::License { id, plus } => {
                write!(f, "{}{}", id, if *plus { "+" } else { "" })
            }
            LicenseExpression::With {
                id,
                plus,
                exception,
            } => write!(f, "{}{} WITH {}", id, if *plus { "+" } else { "" }, exception),
            LicenseExpression::And(left, right) => write!(f, "({} AND {})", left, right),
            LicenseExpression::Or(left, right) => write!(f, "({} OR {})", left, right),
        }
    }
}

/// Resolved license declaration of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LicenseMetadata {
    license_type: LicenseType,
    raw_text: String,
    expression: Option<LicenseExpression>,
    version: Version,
}

impl LicenseMetadata {
    pub(crate) fn new(
        license_type: LicenseType,
        raw_text: String,
        expression: Option<LicenseExpression>,
        version: Version,
    ) -> Self {
        LicenseMetadata {
            license_type,
            raw_text,
            expression,
            version,
        }
    }

    /// Baseline format version assumed when a manifest declares none.
    pub fn empty_version() -> Version {
        Version::new(1, 0, 0)
    }

    /// Highest license-expression format version this library evaluates.
    pub fn current_version() -> Version {
        Version::new(1, 0, 0)
    }

    /// Declared license type.
    pub fn license_type(&self) -> LicenseType {
        self.license_type
    }

    /// The declaration body as written in the manifest.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Parsed expression tree.
    ///
    /// `None` with [`LicenseType::Expression`] means the declared format
    /// version is newer than this library understands; consumers should
    /// fall back to [`raw_text`](Self::raw_text).
    pub fn expression(&self) -> Option<&LicenseExpression> {
        self.expression.as_ref()
    }

    /// Declared license-expression format version.
    pub fn version(&self) -> &Version {
        &self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_license() {
        let expr = LicenseExpression::parse("MIT").unwrap();
        assert_eq!(
            expr,
            LicenseExpression::License {
                id: "MIT".to_string(),
                plus: false,
            }
        );
    }

    #[test]
    fn test_parse_plus_suffix() {
        let expr = LicenseExpression::parse("GPL-2.0+").unwrap();
        assert_eq!(
            expr,
            LicenseExpression::License {
                id: "GPL-2.0".to_string(),
                plus: true,
            }
        );
    }

    #[test]
    fn test_parse_or_and_precedence() {
        // AND binds tighter than OR.
        let expr = LicenseExpression::parse("MIT OR Apache-2.0 AND BSD-3-Clause").unwrap();
        assert_eq!(expr.to_string(), "(MIT OR (Apache-2.0 AND BSD-3-Clause))");
    }

    #[test]
    fn test_parse_parenthesized() {
        let expr = LicenseExpression::parse("(MIT OR Apache-2.0) AND BSD-3-Clause").unwrap();
        assert_eq!(expr.to_string(), "((MIT OR Apache-2.0) AND BSD-3-Clause)");
    }

    #[test]
    fn test_parse_with_exception() {
        let expr = LicenseExpression::parse("GPL-2.0 WITH Classpath-exception-2.0").unwrap();
        assert_eq!(
            expr,
            LicenseExpression::With {
                id: "GPL-2.0".to_string(),
                plus: false,
                exception: "Classpath-exception-2.0".to_string(),
            }
        );
    }

    #[test]
    fn test_unbalanced_parens() {
        assert_eq!(
            LicenseExpression::parse("(MIT"),
            Err(LicenseExpressionError::UnbalancedParens)
        );
        assert!(LicenseExpression::parse("MIT)").is_err());
    }

    #[test]
    fn test_lowercase_operators_rejected() {
        assert!(LicenseExpression::parse("MIT or Apache-2.0").is_err());
    }

    #[test]
    fn test_dangling_operator() {
        assert_eq!(
            LicenseExpression::parse("MIT OR"),
            Err(LicenseExpressionError::UnexpectedEnd)
        );
    }

    #[test]
    fn test_empty_expression() {
        assert_eq!(
            LicenseExpression::parse("   "),
            Err(LicenseExpressionError::Empty)
        );
    }

    #[test]
    fn test_invalid_character() {
        assert_eq!(
            LicenseExpression::parse("MIT | Apache-2.0"),
            Err(LicenseExpressionError::InvalidCharacter('|'))
        );
    }

    #[test]
    fn test_license_type_mapping() {
        assert_eq!(LicenseType::from_attribute("file"), Some(LicenseType::File));
        assert_eq!(
            LicenseType::from_attribute("EXPRESSION"),
            Some(LicenseType::Expression)
        );
        assert_eq!(LicenseType::from_attribute("url"), None);
        assert_eq!(LicenseType::from_attribute(""), None);
    }
}
