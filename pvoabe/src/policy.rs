//! Monotone span programs and the boolean policy compiler that produces them.

use alloc::boxed::Box;
use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::curve::CurveScalar;
use crate::lsss::LsssError;
use crate::traits::SerializableToArray;

/// Errors that can happen when compiling a boolean policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The policy contains no attributes.
    Empty,
    /// A token appeared where an attribute or an opening parenthesis was expected.
    UnexpectedToken(String),
    /// Parentheses do not match.
    UnbalancedParenthesis,
    /// The policy was parsed, but unconsumed input remained.
    TrailingInput(String),
    /// Parentheses are nested deeper than [`MAX_NESTING_DEPTH`].
    TooDeeplyNested,
    /// The policy has more `AND`/`OR` gates than [`MAX_GATES`].
    TooManyGates,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Empty policy"),
            Self::UnexpectedToken(token) => write!(f, "Unexpected token `{}`", token),
            Self::UnbalancedParenthesis => write!(f, "Unbalanced parenthesis"),
            Self::TrailingInput(rest) => write!(f, "Unexpected trailing input `{}`", rest),
            Self::TooDeeplyNested => write!(
                f,
                "Parentheses nested deeper than {} levels",
                MAX_NESTING_DEPTH
            ),
            Self::TooManyGates => write!(f, "More than {} gates in the policy", MAX_GATES),
        }
    }
}

/// The deepest parenthesis nesting [`AccessMatrix::from_policy`] accepts.
pub const MAX_NESTING_DEPTH: usize = 32;

/// The largest number of `AND`/`OR` gates [`AccessMatrix::from_policy`] accepts.
pub const MAX_GATES: usize = 1024;

/// An access structure in monotone span program form:
/// an `n x c` matrix over the scalar field and a label for each row.
///
/// A set of attributes satisfies the matrix if the rows labelled with them
/// span the target vector `(1, 0, ..., 0)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessMatrix {
    rows: Vec<Vec<CurveScalar>>,
    labels: Vec<String>,
}

impl AccessMatrix {
    /// Creates an access matrix, checking that it is non-empty and rectangular,
    /// and that every row has a label.
    pub fn new(rows: Vec<Vec<CurveScalar>>, labels: Vec<String>) -> Result<Self, LsssError> {
        if rows.is_empty() {
            return Err(LsssError::InvalidMatrix("the matrix has no rows".into()));
        }
        let num_cols = rows[0].len();
        if num_cols == 0 {
            return Err(LsssError::InvalidMatrix("the matrix has no columns".into()));
        }
        if let Some(i) = rows.iter().position(|row| row.len() != num_cols) {
            return Err(LsssError::InvalidMatrix(format!(
                "row {} has {} entries instead of {}",
                i,
                rows[i].len(),
                num_cols
            )));
        }
        if labels.len() != rows.len() {
            return Err(LsssError::InvalidMatrix(format!(
                "{} labels for {} rows",
                labels.len(),
                rows.len()
            )));
        }
        Ok(Self { rows, labels })
    }

    /// Compiles a boolean formula into an access matrix.
    ///
    /// Attributes are combined with `AND` and `OR` (case-insensitive),
    /// `AND` binds tighter than `OR`, and parentheses group subformulas.
    /// An attribute may appear several times; each occurrence becomes a row.
    pub fn from_policy(policy: &str) -> Result<Self, PolicyError> {
        let tokens = tokenize(policy);
        if tokens.is_empty() {
            return Err(PolicyError::Empty);
        }
        let mut parser = Parser {
            tokens: &tokens,
            position: 0,
            depth: 0,
            gates: 0,
        };
        let tree = parser.parse_or()?;
        if let Some(token) = parser.peek() {
            return Err(match token {
                Token::Close => PolicyError::UnbalancedParenthesis,
                _ => PolicyError::TrailingInput(
                    tokens[parser.position..]
                        .iter()
                        .map(Token::to_string)
                        .collect::<Vec<_>>()
                        .join(" "),
                ),
            });
        }

        let mut counter = 1;
        let mut assigned = Vec::new();
        assign_vectors(&tree, vec![CurveScalar::one()], &mut counter, &mut assigned);

        let (rows, labels) = assigned
            .into_iter()
            .map(|(mut vector, label)| {
                vector.resize(counter, CurveScalar::zero());
                (vector, label)
            })
            .unzip();
        Ok(Self { rows, labels })
    }

    /// The number of rows (shares).
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// The number of columns.
    pub fn num_cols(&self) -> usize {
        self.rows[0].len()
    }

    /// Returns the `i`-th row.
    pub fn row(&self, i: usize) -> Option<&[CurveScalar]> {
        self.rows.get(i).map(|row| row.as_slice())
    }

    /// Returns the label of the `i`-th row.
    pub fn label(&self, i: usize) -> Option<&str> {
        self.labels.get(i).map(|label| label.as_str())
    }

    /// Returns the row labels in row order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns the indices of the rows labelled with one of `attributes`, in ascending order.
    pub fn rows_for<'a>(&self, attributes: impl IntoIterator<Item = &'a str>) -> Vec<usize> {
        let attributes: BTreeSet<&str> = attributes.into_iter().collect();
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| attributes.contains(label.as_str()))
            .map(|(i, _)| i)
            .collect()
    }

    /// A canonical encoding: dimensions, then each row's label and entries.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::<u8>::new();
        result.extend_from_slice(&(self.num_rows() as u32).to_be_bytes());
        result.extend_from_slice(&(self.num_cols() as u32).to_be_bytes());
        for (row, label) in self.rows.iter().zip(self.labels.iter()) {
            result.extend_from_slice(&(label.len() as u32).to_be_bytes());
            result.extend_from_slice(label.as_bytes());
            for entry in row.iter() {
                result.extend_from_slice(entry.to_array().as_slice());
            }
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Attribute(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "("),
            Self::Close => write!(f, ")"),
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
            Self::Attribute(name) => write!(f, "{}", name),
        }
    }
}

fn tokenize(policy: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    let flush = |word: &mut String, tokens: &mut Vec<Token>| {
        if word.is_empty() {
            return;
        }
        let token = if word.eq_ignore_ascii_case("and") {
            Token::And
        } else if word.eq_ignore_ascii_case("or") {
            Token::Or
        } else {
            Token::Attribute(word.clone())
        };
        tokens.push(token);
        word.clear();
    };

    for c in policy.chars() {
        match c {
            '(' | ')' => {
                flush(&mut word, &mut tokens);
                tokens.push(if c == '(' { Token::Open } else { Token::Close });
            }
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

#[derive(Debug)]
enum PolicyNode {
    Leaf(String),
    And(Box<PolicyNode>, Box<PolicyNode>),
    Or(Box<PolicyNode>, Box<PolicyNode>),
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    depth: usize,
    gates: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    // Both the parser and the vector assignment recurse once per gate and per nesting level.
    fn count_gate(&mut self) -> Result<(), PolicyError> {
        self.gates += 1;
        if self.gates > MAX_GATES {
            return Err(PolicyError::TooManyGates);
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<PolicyNode, PolicyError> {
        let mut node = self.parse_and()?;
        while self.peek() == Some(&Token::Or) {
            self.position += 1;
            self.count_gate()?;
            let right = self.parse_and()?;
            node = PolicyNode::Or(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<PolicyNode, PolicyError> {
        let mut node = self.parse_leaf()?;
        while self.peek() == Some(&Token::And) {
            self.position += 1;
            self.count_gate()?;
            let right = self.parse_leaf()?;
            node = PolicyNode::And(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn parse_leaf(&mut self) -> Result<PolicyNode, PolicyError> {
        let token = self.peek().ok_or(PolicyError::Empty)?;
        self.position += 1;
        match token {
            Token::Attribute(name) => Ok(PolicyNode::Leaf(name.clone())),
            Token::Open => {
                if self.depth == MAX_NESTING_DEPTH {
                    return Err(PolicyError::TooDeeplyNested);
                }
                self.depth += 1;
                let node = self.parse_or()?;
                match self.peek() {
                    Some(Token::Close) => {
                        self.position += 1;
                        self.depth -= 1;
                        Ok(node)
                    }
                    _ => Err(PolicyError::UnbalancedParenthesis),
                }
            }
            other => Err(PolicyError::UnexpectedToken(other.to_string())),
        }
    }
}

/// Lewko-Waters labelling: an `OR` gate passes its vector to both children,
/// an `AND` gate splits it into `(v, 0.., 1)` and `(0, .., 0, -1)`
/// and increments the column counter.
fn assign_vectors(
    node: &PolicyNode,
    vector: Vec<CurveScalar>,
    counter: &mut usize,
    assigned: &mut Vec<(Vec<CurveScalar>, String)>,
) {
    match node {
        PolicyNode::Leaf(label) => assigned.push((vector, label.clone())),
        PolicyNode::Or(left, right) => {
            assign_vectors(left, vector.clone(), counter, assigned);
            assign_vectors(right, vector, counter, assigned);
        }
        PolicyNode::And(left, right) => {
            let mut left_vector = vector;
            left_vector.resize(*counter, CurveScalar::zero());
            left_vector.push(CurveScalar::one());

            let mut right_vector = vec![CurveScalar::zero(); *counter];
            right_vector.push(-&CurveScalar::one());

            *counter += 1;
            assign_vectors(left, left_vector, counter, assigned);
            assign_vectors(right, right_vector, counter, assigned);
        }
    }
}
