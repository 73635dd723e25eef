//! Classifier errors.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("statement text is empty")]
    EmptyStatement,

    #[error("statement text is blank")]
    BlankStatement,

    #[error("VALUES clause has multiple literals outside parentheses")]
    InvalidValuesClause,

    #[error("unbalanced braces in escape clause")]
    UnbalancedEscape,

    #[error("unsupported escape clause: {0}")]
    UnsupportedEscape(String),
}
