//! SQL processing settings.

use serde::{Deserialize, Serialize};

/// Qualified-name convention used by the session.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Naming {
    /// SQL naming, names qualified with a dot: `SCHEMA.TABLE`.
    #[default]
    Sql,
    /// System naming, names qualified with a slash: `LIB/TABLE`.
    System,
}

impl Naming {
    /// The qualifier separator for this convention.
    pub fn separator(&self) -> char {
        match self {
            Naming::Sql => '.',
            Naming::System => '/',
        }
    }
}

/// Policy deciding which statements are worth caching in a host package.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PackageCriteria {
    /// Package statements with parameter markers and other re-runnable shapes.
    #[default]
    Default,
    /// Additionally package every SELECT.
    Select,
}

/// Settings consumed by the statement classifier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Sql {
    /// Qualified-name convention.
    ///
    /// _Default:_ `sql`
    #[serde(default)]
    pub naming: Naming,

    /// Package caching policy.
    ///
    /// _Default:_ `default`
    #[serde(default)]
    pub package_criteria: PackageCriteria,

    /// Rewrite ODBC escape clauses (`{fn ...}`, `{d '...'}`, `{call ...}`)
    /// into native syntax before classification.
    ///
    /// _Default:_ `true`
    #[serde(default = "Sql::escape_processing")]
    pub escape_processing: bool,

    /// Decimal separator substituted into numeric literals during escape
    /// rewrite. Only `.` and `,` are meaningful.
    ///
    /// _Default:_ `.`
    #[serde(default = "Sql::decimal_separator")]
    pub decimal_separator: char,

    /// Statements longer than this always have comments stripped before
    /// parsing. Shorter statements keep their comments verbatim.
    ///
    /// _Default:_ `32767`
    #[serde(default = "Sql::comment_strip_threshold")]
    pub comment_strip_threshold: usize,

    /// Host server protocol level. UPDATE, DELETE and MERGE become
    /// batchable at level 10 and above.
    ///
    /// _Default:_ `10`
    #[serde(default = "Sql::server_level")]
    pub server_level: u16,
}

impl Sql {
    fn escape_processing() -> bool {
        true
    }

    fn decimal_separator() -> char {
        '.'
    }

    fn comment_strip_threshold() -> usize {
        32767
    }

    fn server_level() -> u16 {
        10
    }
}

impl Default for Sql {
    fn default() -> Self {
        Self {
            naming: Naming::default(),
            package_criteria: PackageCriteria::default(),
            escape_processing: Self::escape_processing(),
            decimal_separator: Self::decimal_separator(),
            comment_strip_threshold: Self::comment_strip_threshold(),
            server_level: Self::server_level(),
        }
    }
}
