//! Boolean query compiler.
//!
//! Free text such as `cats (dogs or not birds)` is normalized, given implicit `and`s,
//! parsed into an [`Expr`] tree and rewritten into a canonical [`Dnf`]. The ranking
//! models walk the `Dnf` directly.

use crate::config::MAX_DNF_CLAUSES;
use crate::error::{Error, Result};
use crate::tokenizer::{normalize, Analyzer};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Exact tautology detection enumerates every truth assignment, so it only runs for
/// queries with at most this many distinct tokens.
const TAUTOLOGY_CHECK_MAX_TOKENS: usize = 12;

/// Parsed boolean expression, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(String),
    Not(Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    /// Conjunction of `operands`, flattening nested conjunctions.
    pub fn and(operands: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(operands.len());
        for op in operands {
            match op {
                Expr::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 { flat.remove(0) } else { Expr::And(flat) }
    }

    /// Disjunction of `operands`, flattening nested disjunctions.
    pub fn or(operands: Vec<Expr>) -> Expr {
        let mut flat = Vec::with_capacity(operands.len());
        for op in operands {
            match op {
                Expr::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 { flat.remove(0) } else { Expr::Or(flat) }
    }

    pub fn evaluate<F>(&self, assignment: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            Expr::Literal(token) => assignment(token),
            Expr::Not(inner) => !inner.evaluate(assignment),
            Expr::And(operands) => operands.iter().all(|op| op.evaluate(assignment)),
            Expr::Or(operands) => operands.iter().any(|op| op.evaluate(assignment)),
        }
    }

    pub fn tokens(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_tokens(&mut out);
        out
    }

    fn collect_tokens<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            Expr::Literal(token) => {
                out.insert(token.as_str());
            }
            Expr::Not(inner) => inner.collect_tokens(out),
            Expr::And(operands) | Expr::Or(operands) => {
                for op in operands {
                    op.collect_tokens(out);
                }
            }
        }
    }
}

/// A token, possibly negated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    pub token: String,
    pub negated: bool,
}

impl Literal {
    pub fn new(token: impl Into<String>, negated: bool) -> Self {
        Self { token: token.into(), negated }
    }

    pub fn holds<F>(&self, assignment: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        assignment(&self.token) != self.negated
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "~{}", self.token)
        } else {
            f.write_str(&self.token)
        }
    }
}

/// AND of literals. Literals are sorted, distinct and never complementary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Conjunction {
    pub literals: Vec<Literal>,
}

impl Conjunction {
    pub fn evaluate<F>(&self, assignment: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        self.literals.iter().all(|l| l.holds(assignment))
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, literal) in self.literals.iter().enumerate() {
            if i > 0 {
                f.write_str(" & ")?;
            }
            write!(f, "{literal}")?;
        }
        Ok(())
    }
}

/// Canonical disjunctive normal form of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dnf {
    /// The query had no terms at all. Matches no document.
    Empty,
    /// Unsatisfiable, e.g. `cat and not cat`.
    Never,
    /// Always satisfied, e.g. `cat or not cat`.
    Always,
    /// OR of one or more conjunctions, sorted, none absorbing another.
    Clauses(Vec<Conjunction>),
}

impl Dnf {
    pub fn evaluate<F>(&self, assignment: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            Dnf::Empty | Dnf::Never => false,
            Dnf::Always => true,
            Dnf::Clauses(clauses) => clauses.iter().any(|c| c.evaluate(assignment)),
        }
    }

    pub fn clauses(&self) -> &[Conjunction] {
        match self {
            Dnf::Clauses(clauses) => clauses,
            _ => &[],
        }
    }

    /// Distinct tokens referenced by the expression.
    pub fn tokens(&self) -> BTreeSet<&str> {
        self.clauses()
            .iter()
            .flat_map(|c| c.literals.iter().map(|l| l.token.as_str()))
            .collect()
    }

    pub fn is_empty(&self) -> bool { matches!(self, Dnf::Empty) }
}

impl fmt::Display for Dnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dnf::Empty => Ok(()),
            Dnf::Never => f.write_str("false"),
            Dnf::Always => f.write_str("true"),
            Dnf::Clauses(clauses) => {
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    if clauses.len() > 1 && clause.literals.len() > 1 {
                        write!(f, "({clause})")?;
                    } else {
                        write!(f, "{clause}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Term(String),
    And,
    Or,
    Not,
    LParen,
    RParen,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Term(t) => write!(f, "term '{t}'"),
            Token::And => f.write_str("'and'"),
            Token::Or => f.write_str("'or'"),
            Token::Not => f.write_str("'not'"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    analyzer: Analyzer,
    reserved_words: HashSet<String>,
}

impl QueryCompiler {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer, reserved_words: HashSet::new() }
    }

    /// Words dropped from queries after stemming.
    pub fn with_reserved_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.reserved_words.extend(words.into_iter().map(Into::into));
        self
    }

    pub fn analyzer(&self) -> &Analyzer { &self.analyzer }

    /// Compile a query into canonical DNF. Blank queries compile to [`Dnf::Empty`].
    pub fn compile(&self, text: &str) -> Result<Dnf> {
        let dnf = match self.parse(text)? {
            Some(expr) => simplify(expand(&expr, false)?),
            None => Dnf::Empty,
        };
        tracing::debug!(query = text, dnf = %dnf, "compiled query");
        Ok(dnf)
    }

    /// Parse a query into its expression tree without normalizing it.
    /// Returns `None` when no term survives normalization.
    pub fn parse(&self, text: &str) -> Result<Option<Expr>> {
        let tokens = insert_implicit_and(self.lex(text));
        if tokens.is_empty() {
            return Ok(None);
        }
        let mut parser = Parser { tokens: &tokens, pos: 0 };
        let expr = parser.parse_or()?;
        match parser.peek() {
            None => Ok(Some(expr)),
            Some(Token::RParen) => Err(Error::invalid_query("unbalanced parentheses: unexpected ')'")),
            Some(tok) => Err(Error::invalid_query(format!("unexpected {tok}"))),
        }
    }

    fn lex(&self, text: &str) -> Vec<Token> {
        let mut cleaned = String::with_capacity(text.len());
        for c in normalize(text).chars() {
            match c {
                '(' | ')' => {
                    cleaned.push(' ');
                    cleaned.push(c);
                    cleaned.push(' ');
                }
                c if c.is_alphanumeric() || c.is_whitespace() => cleaned.push(c),
                _ => cleaned.push(' '),
            }
        }
        cleaned
            .split_whitespace()
            .filter_map(|word| match word {
                "(" => Some(Token::LParen),
                ")" => Some(Token::RParen),
                "and" => Some(Token::And),
                "or" => Some(Token::Or),
                "not" => Some(Token::Not),
                w => {
                    let stem = self.analyzer.stem(w);
                    if self.reserved_words.contains(&stem) { None } else { Some(Token::Term(stem)) }
                }
            })
            .collect()
    }
}

/// Splice an `and` wherever an operand is directly followed by another operand:
/// a term or `)` followed by a term, `(` or `not`.
fn insert_implicit_and(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len() * 2);
    for tok in tokens {
        let needs_and = matches!(out.last(), Some(Token::Term(_) | Token::RParen))
            && matches!(tok, Token::Term(_) | Token::LParen | Token::Not);
        if needs_and {
            out.push(Token::And);
        }
        out.push(tok);
    }
    out
}

/// Recursive descent over the token stream. Precedence: not > and > or.
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_and()?];
        while self.eat(&Token::Or) {
            operands.push(self.parse_and()?);
        }
        Ok(Expr::or(operands))
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_unary()?];
        while self.eat(&Token::And) {
            operands.push(self.parse_unary()?);
        }
        Ok(Expr::and(operands))
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Not) {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.peek() {
            Some(Token::Term(token)) => {
                self.pos += 1;
                Ok(Expr::Literal(token.clone()))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                if self.peek() == Some(&Token::RParen) {
                    return Err(Error::invalid_query("empty parentheses"));
                }
                let inner = self.parse_or()?;
                if !self.eat(&Token::RParen) {
                    return Err(Error::invalid_query("unbalanced parentheses: missing ')'"));
                }
                Ok(inner)
            }
            Some(tok) => Err(Error::invalid_query(format!("expected a term, found {tok}"))),
            None => Err(Error::invalid_query("unexpected end of query")),
        }
    }
}

type Clause = Vec<Literal>;

/// Push negations down to the literals and distribute AND over OR.
fn expand(expr: &Expr, negated: bool) -> Result<Vec<Clause>> {
    match expr {
        Expr::Literal(token) => Ok(vec![vec![Literal::new(token.clone(), negated)]]),
        Expr::Not(inner) => expand(inner, !negated),
        Expr::And(operands) if !negated => distribute(operands, negated),
        Expr::Or(operands) if negated => distribute(operands, negated),
        Expr::And(operands) | Expr::Or(operands) => {
            let mut clauses = Vec::new();
            for op in operands {
                clauses.extend(expand(op, negated)?);
                check_size(clauses.len())?;
            }
            Ok(clauses)
        }
    }
}

fn distribute(operands: &[Expr], negated: bool) -> Result<Vec<Clause>> {
    let mut acc: Vec<Clause> = vec![Vec::new()];
    for op in operands {
        let rhs = expand(op, negated)?;
        check_size(acc.len().saturating_mul(rhs.len()))?;
        let mut next = Vec::with_capacity(acc.len() * rhs.len());
        for left in &acc {
            for right in &rhs {
                let mut clause = left.clone();
                clause.extend(right.iter().cloned());
                if let Some(clause) = normalize_clause(clause) {
                    next.push(clause);
                }
            }
        }
        next.sort();
        next.dedup();
        check_size(next.len())?;
        acc = next;
    }
    Ok(acc)
}

fn check_size(clauses: usize) -> Result<()> {
    if clauses > MAX_DNF_CLAUSES {
        return Err(Error::invalid_query(format!(
            "query expands to more than {MAX_DNF_CLAUSES} conjunctions"
        )));
    }
    Ok(())
}

/// Sort and deduplicate a clause; `None` if it holds a literal and its negation.
fn normalize_clause(mut clause: Clause) -> Option<Clause> {
    clause.sort();
    clause.dedup();
    // complementary literals are adjacent after sorting
    if clause.windows(2).any(|w| w[0].token == w[1].token) { None } else { Some(clause) }
}

fn simplify(clauses: Vec<Clause>) -> Dnf {
    let mut clauses: Vec<Clause> = clauses.into_iter().filter_map(normalize_clause).collect();
    if clauses.is_empty() {
        return Dnf::Never;
    }
    // shortest first, so a clause can only be absorbed by one already kept
    clauses.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
    let mut kept: Vec<Clause> = Vec::with_capacity(clauses.len());
    for clause in clauses {
        if !kept.iter().any(|k| is_subset(k, &clause)) {
            kept.push(clause);
        }
    }
    if is_tautology(&kept) {
        return Dnf::Always;
    }
    kept.sort();
    Dnf::Clauses(kept.into_iter().map(|literals| Conjunction { literals }).collect())
}

fn is_subset(small: &Clause, big: &Clause) -> bool {
    small.iter().all(|l| big.binary_search(l).is_ok())
}

fn is_tautology(clauses: &[Clause]) -> bool {
    let tokens: Vec<&str> = clauses
        .iter()
        .flatten()
        .map(|l| l.token.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if tokens.is_empty() || tokens.len() > TAUTOLOGY_CHECK_MAX_TOKENS {
        return false;
    }
    (0u32..1 << tokens.len()).all(|mask| {
        let assignment = |t: &str| tokens.iter().position(|&x| x == t).map_or(false, |i| mask & (1 << i) != 0);
        clauses.iter().any(|c| c.iter().all(|l| l.holds(&assignment)))
    })
}
