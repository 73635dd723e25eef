//! Statement classification.
//!
//! One pass over the tokenized text decides the native statement kind,
//! counts parameter markers, extracts CALL and single-table SELECT
//! names and collects the secondary-clause facts the connection and
//! statement layers act on.

use hostlink_config::{Naming, PackageCriteria, Sql};

use super::comments::strip_comments;
use super::escape;
use super::rewrite::RewriterSet;
use super::tokenizer::{Token, Tokenizer};
use super::Error;

/// UPDATE, DELETE and MERGE batch at this server protocol level and above.
const BATCHABLE_SERVER_LEVEL: u16 = 10;

/// Native statement kind, as the host database server groups them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NativeKind {
    #[default]
    Undetermined,
    Other,
    Select,
    Call,
    Commit,
    Rollback,
    Connect,
    BlockInsert,
}

/// Facts collected while scanning the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatementFacts {
    pub is_for_update: bool,
    pub is_for_fetch_or_read_only: bool,
    /// Positioned update or delete: `WHERE CURRENT OF cursor`.
    pub is_current_of: bool,
    pub is_insert: bool,
    /// INSERT ... SELECT.
    pub is_subselect: bool,
    pub is_update_or_delete: bool,
    pub is_declare: bool,
    pub is_drda_connect: bool,
    pub is_drda_disconnect: bool,
    /// A `?=CALL` lead-in synthesized a return-value parameter.
    pub has_return_value_parameter: bool,
    pub can_be_batched: bool,
}

/// The immutable classification descriptor, built once per distinct
/// statement text at prepare time.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// Canonical statement text: rewritten by hooks, comment-stripped
    /// past the threshold, escape-converted, and truncated to the CALL
    /// keyword when a return-value marker was synthesized.
    pub text: String,
    pub kind: NativeKind,
    pub parameter_count: usize,
    /// `AS` correlation of a single-table SELECT.
    pub correlation_name: Option<String>,
    /// Table of a single-table SELECT, qualified as written.
    pub select_table: Option<String>,
    /// Procedure name of a CALL.
    pub procedure: Option<String>,
    /// Schema qualifying the called procedure.
    pub schema: Option<String>,
    pub facts: StatementFacts,
    /// Zero parameters, no sub-select insert, no positioned update or
    /// delete, and not a query: can run without a prepare round trip.
    pub is_immediately_executable: bool,
    /// Worth caching as a precompiled access plan in the host package.
    pub is_packaged: bool,
}

/// Session-level settings the classifier consults.
#[derive(Debug, Clone)]
pub struct ClassifierContext {
    pub naming: Naming,
    pub package_criteria: PackageCriteria,
    pub escape_processing: bool,
    pub decimal_separator: char,
    pub comment_strip_threshold: usize,
    pub server_level: u16,
    pub rewriters: RewriterSet,
}

impl ClassifierContext {
    pub fn from_config(sql: &Sql) -> Self {
        Self {
            naming: sql.naming,
            package_criteria: sql.package_criteria,
            escape_processing: sql.escape_processing,
            decimal_separator: sql.decimal_separator,
            comment_strip_threshold: sql.comment_strip_threshold,
            server_level: sql.server_level,
            rewriters: RewriterSet::default(),
        }
    }
}

impl Default for ClassifierContext {
    fn default() -> Self {
        Self::from_config(&Sql::default())
    }
}

pub struct Classifier;

impl Classifier {
    /// Classify one statement. Deterministic: the same text and context
    /// always produce the same descriptor.
    pub fn parse(sql: &str, context: &ClassifierContext) -> Result<Statement, Error> {
        if sql.is_empty() {
            return Err(Error::EmptyStatement);
        }
        if sql.trim().is_empty() {
            return Err(Error::BlankStatement);
        }

        let mut text = context.rewriters.rewrite(sql.to_string());
        if text.trim().is_empty() {
            return Err(Error::BlankStatement);
        }

        // Large statements always lose their comments to bound parser
        // cost; short ones keep them verbatim in the stored text.
        if text.len() > context.comment_strip_threshold {
            text = strip_comments(&text);
            context.rewriters.notify_comments_stripped(&text);
        }

        if context.escape_processing {
            text = escape::convert(&text, context.decimal_separator)?;
        }

        let analysis = analyze(&text, context)?;
        Ok(analysis.into_statement(text, context))
    }
}

#[derive(Debug, Default)]
struct Analysis {
    kind: NativeKind,
    facts: StatementFacts,
    parameter_markers: usize,
    /// Offset the stored text restarts at, for `?=CALL` lead-ins.
    text_start: usize,
    procedure: Option<String>,
    schema: Option<String>,
    select_table: Option<String>,
    correlation: Option<String>,
}

impl Analysis {
    fn into_statement(self, text: String, context: &ClassifierContext) -> Statement {
        let facts = self.facts;
        let parameter_count = self
            .parameter_markers
            .saturating_sub(facts.has_return_value_parameter as usize);

        let text = if self.text_start > 0 {
            text[self.text_start..].trim().to_string()
        } else {
            text
        };

        let is_select = self.kind == NativeKind::Select;

        let is_immediately_executable = !(parameter_count > 0
            || (facts.is_insert && facts.is_subselect)
            || (facts.is_current_of && facts.is_update_or_delete))
            && !is_select;

        let is_packaged = (parameter_count > 0
            && !facts.is_current_of
            && !facts.is_update_or_delete)
            || (facts.is_insert && facts.is_subselect)
            || (is_select && facts.is_for_update)
            || facts.is_declare
            || (context.package_criteria == PackageCriteria::Select && is_select);

        Statement {
            text,
            kind: self.kind,
            parameter_count,
            correlation_name: self.correlation,
            select_table: self.select_table,
            procedure: self.procedure,
            schema: self.schema,
            facts,
            is_immediately_executable,
            is_packaged,
        }
    }
}

fn analyze(text: &str, context: &ClassifierContext) -> Result<Analysis, Error> {
    let tokens: Vec<Token> = Tokenizer::new(text).collect();

    let mut analysis = Analysis {
        parameter_markers: tokens.iter().filter(|token| token.text == "?").count(),
        ..Default::default()
    };

    // First significant keyword, past any run of leading parentheses,
    // so `((SELECT ...` still classifies as a query.
    let first = match tokens.iter().position(|token| token.text != "(") {
        Some(first) => first,
        // Nothing but comments or parentheses.
        None => return Ok(analysis),
    };

    dispatch(text, &tokens, first, context, &mut analysis)?;
    scan_clauses(text, &tokens, first, context, &mut analysis);

    Ok(analysis)
}

fn dispatch(
    text: &str,
    tokens: &[Token],
    first: usize,
    context: &ClassifierContext,
    analysis: &mut Analysis,
) -> Result<(), Error> {
    let token = &tokens[first];

    if token.matches("SELECT") || token.matches("WITH") || token.matches("VALUES") {
        analysis.kind = NativeKind::Select;
    } else if token.matches("CALL") {
        analysis.kind = NativeKind::Call;
        extract_procedure(text, tokens, first, context, analysis);
    } else if token.text == "?" {
        // ?, ?= and ?=CALL lead-ins: a CALL with a synthesized
        // return-value parameter. The marker is not a real parameter.
        analysis.kind = NativeKind::Call;
        analysis.facts.has_return_value_parameter = true;

        if next_matches(tokens, first + 1, "=") && next_matches(tokens, first + 2, "CALL") {
            let call = first + 2;
            analysis.text_start = tokens[call].offset;
            extract_procedure(text, tokens, call, context, analysis);
        }
    } else if token.matches("COMMIT") {
        analysis.kind = NativeKind::Commit;
    } else if token.matches("ROLLBACK") {
        analysis.kind = NativeKind::Rollback;
    } else if token.matches("CONNECT") || token.matches("CONNECTION") {
        analysis.kind = NativeKind::Connect;
        analysis.facts.is_drda_connect = true;
    } else if token.matches("DISCONNECT") {
        analysis.kind = NativeKind::Connect;
        analysis.facts.is_drda_disconnect = true;
    } else if token.matches("RELEASE") {
        // A savepoint release is an ordinary statement. Detected by a
        // loose substring match over the whole text; deliberately kept
        // that way for compatibility with existing applications.
        if text.to_ascii_uppercase().contains("SAVEPOINT") {
            analysis.kind = NativeKind::Other;
        } else {
            analysis.kind = NativeKind::Connect;
            analysis.facts.is_drda_disconnect = true;
        }
    } else if token.matches("INSERT") {
        analysis.kind = NativeKind::Other;
        analysis.facts.is_insert = true;
        analyze_insert(tokens, first, analysis)?;
    } else if token.matches("UPDATE") || token.matches("DELETE") || token.matches("MERGE") {
        analysis.kind = NativeKind::Other;
        analysis.facts.is_update_or_delete = true;
        analysis.facts.can_be_batched = context.server_level >= BATCHABLE_SERVER_LEVEL;
    } else if token.matches("DECLARE") {
        analysis.kind = NativeKind::Other;
        analysis.facts.is_declare = true;
    } else if token.matches("SET") {
        // Stays undetermined unless the second token makes this a
        // connection switch.
        analysis.kind = NativeKind::Undetermined;
        if next_matches(tokens, 1, "CONNECTION") {
            analysis.kind = NativeKind::Connect;
            analysis.facts.is_drda_connect = true;
        }
    } else {
        analysis.kind = NativeKind::Other;
    }

    Ok(())
}

/// Block-insert detection and VALUES-clause batchability.
fn analyze_insert(tokens: &[Token], first: usize, analysis: &mut Analysis) -> Result<(), Error> {
    // An `n ROWS VALUES` shape submits a block of rows in one exchange.
    for pair in tokens[first..].windows(2) {
        if pair[0].matches("ROWS") && pair[1].matches("VALUES") {
            analysis.kind = NativeKind::BlockInsert;
            break;
        }
    }

    let mut depth = 0usize;
    let mut values = None;
    for (index, token) in tokens.iter().enumerate().skip(first + 1) {
        match token.text {
            "(" => depth += 1,
            ")" => depth = depth.saturating_sub(1),
            _ if depth == 0 && token.matches("VALUES") => {
                values = Some(index);
                break;
            }
            _ => (),
        }
    }

    let values = match values {
        Some(values) => values,
        // INSERT ... SELECT has no VALUES clause to batch.
        None => return Ok(()),
    };

    // Batching needs uniform values: all parameter markers, or all
    // literals. A mix disables batching; several bare literals outside
    // parentheses is not a value list at all.
    let mut depth = 0usize;
    let mut markers = 0usize;
    let mut literals = 0usize;
    let mut bare_literals = 0usize;

    for token in &tokens[values + 1..] {
        match token.text {
            "(" => depth += 1,
            ")" => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            "," | ";" | "=" => (),
            "?" => markers += 1,
            _ => {
                literals += 1;
                if depth == 0 {
                    bare_literals += 1;
                }
            }
        }
    }

    if bare_literals > 1 && markers == 0 {
        return Err(Error::InvalidValuesClause);
    }

    analysis.facts.can_be_batched = markers == 0 || literals == 0;
    Ok(())
}

fn scan_clauses(
    text: &str,
    tokens: &[Token],
    first: usize,
    context: &ClassifierContext,
    analysis: &mut Analysis,
) {
    let mut depth = 0usize;
    let mut seen_from = false;

    for index in first + 1..tokens.len() {
        let token = &tokens[index];

        if token.text == "(" {
            depth += 1;
            continue;
        }
        if token.text == ")" {
            depth = depth.saturating_sub(1);
            continue;
        }
        if token.is_quoted() {
            continue;
        }

        if token.matches("CURRENT") && next_matches(tokens, index + 1, "OF") {
            analysis.facts.is_current_of = true;
        } else if token.matches("FOR") {
            if next_matches(tokens, index + 1, "UPDATE") {
                analysis.facts.is_for_update = true;
            } else if (next_matches(tokens, index + 1, "FETCH")
                || next_matches(tokens, index + 1, "READ"))
                && next_matches(tokens, index + 2, "ONLY")
            {
                analysis.facts.is_for_fetch_or_read_only = true;
            }
        } else if token.matches("SELECT") && analysis.facts.is_insert && !seen_from {
            analysis.facts.is_subselect = true;
        } else if token.matches("FROM") && depth == 0 && !seen_from {
            // Only the first top-level FROM names the queried table.
            seen_from = true;
            if analysis.kind == NativeKind::Select {
                extract_select_table(text, tokens, index, context, analysis);
            }
        }
    }
}

fn next_matches(tokens: &[Token], index: usize, keyword: &str) -> bool {
    tokens
        .get(index)
        .map(|token| token.matches(keyword))
        .unwrap_or(false)
}

fn extract_procedure(
    text: &str,
    tokens: &[Token],
    call: usize,
    context: &ClassifierContext,
    analysis: &mut Analysis,
) {
    let start = match tokens.get(call + 1) {
        Some(token) => token.offset,
        None => return,
    };

    if let Some(name) = QualifiedName::scan(text, start, context.naming.separator()) {
        analysis.schema = name.qualifier;
        analysis.procedure = Some(name.name);
    }
}

fn extract_select_table(
    text: &str,
    tokens: &[Token],
    from: usize,
    context: &ClassifierContext,
    analysis: &mut Analysis,
) {
    let next = match tokens.get(from + 1) {
        Some(token) => token,
        None => return,
    };

    // A parenthesized sub-query in FROM has no plain table name.
    if next.text == "(" {
        return;
    }

    let separator = context.naming.separator();
    let name = match QualifiedName::scan(text, next.offset, separator) {
        Some(name) => name,
        None => return,
    };

    let table = match &name.qualifier {
        Some(qualifier) => format!("{}{}{}", qualifier, separator, name.name),
        None => name.name.clone(),
    };

    // Optional AS correlation, then a comma means a join list: only
    // single-table selects record a table name.
    let mut correlation = None;
    let mut after = None;

    for (index, token) in tokens.iter().enumerate().skip(from + 1) {
        if token.offset >= name.end {
            after = Some(index);
            break;
        }
    }

    let mut trailing = after.and_then(|index| tokens.get(index));

    if let Some(index) = after {
        if tokens[index].matches("AS") {
            if let Some(token) = tokens.get(index + 1) {
                correlation = Some(unquote_identifier(token.text));
            }
            trailing = tokens.get(index + 2);
        }
    }

    if trailing.map(|token| token.text == ",").unwrap_or(false) {
        return;
    }

    analysis.select_table = Some(table);
    analysis.correlation = correlation;
}

/// Strip quotes from a delimited identifier, fold plain ones to upper
/// case.
fn unquote_identifier(text: &str) -> String {
    if let Some(inner) = text
        .strip_prefix('"')
        .and_then(|text| text.strip_suffix('"'))
    {
        inner.replace("\"\"", "\"")
    } else {
        text.to_ascii_uppercase()
    }
}

/// A possibly qualified, possibly quoted name scanned from the raw
/// statement text.
struct QualifiedName {
    qualifier: Option<String>,
    name: String,
    /// Offset one past the scanned name.
    end: usize,
}

impl QualifiedName {
    /// Scan from `start`. Unquoted parts fold to upper case; quoted
    /// parts keep their case and may contain the separator character.
    /// Qualifier and name may be quoted independently.
    fn scan(text: &str, start: usize, separator: char) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut pos = start;
        let mut parts: Vec<String> = Vec::new();

        while pos < bytes.len() {
            if bytes[pos] == b'"' {
                let open = pos;
                let mut close = pos + 1;
                while close < bytes.len() {
                    if bytes[close] == b'"' {
                        if bytes.get(close + 1) == Some(&b'"') {
                            close += 2;
                            continue;
                        }
                        break;
                    }
                    close += 1;
                }
                if close >= bytes.len() {
                    return None;
                }
                parts.push(text[open + 1..close].replace("\"\"", "\""));
                pos = close + 1;
            } else {
                let begin = pos;
                while pos < bytes.len() {
                    let c = bytes[pos];
                    if c as char == separator
                        || c.is_ascii_whitespace()
                        || matches!(c, b'(' | b')' | b',' | b';' | b'"' | b'\'')
                    {
                        break;
                    }
                    pos += 1;
                }
                if pos == begin {
                    break;
                }
                parts.push(text[begin..pos].to_ascii_uppercase());
            }

            if pos < bytes.len() && bytes[pos] as char == separator {
                pos += 1;
                continue;
            }
            break;
        }

        let name = parts.pop()?;
        let qualifier = if parts.is_empty() {
            None
        } else {
            Some(parts.join(&separator.to_string()))
        };

        Some(Self {
            qualifier,
            name,
            end: pos,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(sql: &str) -> Statement {
        Classifier::parse(sql, &ClassifierContext::default()).unwrap()
    }

    fn system_naming() -> ClassifierContext {
        let mut config = Sql::default();
        config.naming = Naming::System;
        ClassifierContext::from_config(&config)
    }

    #[test]
    fn test_empty_and_blank_fail_fast() {
        let context = ClassifierContext::default();
        assert_eq!(
            Classifier::parse("", &context).unwrap_err(),
            Error::EmptyStatement
        );
        assert_eq!(
            Classifier::parse("   \t\n", &context).unwrap_err(),
            Error::BlankStatement
        );
    }

    #[test]
    fn test_classification_is_deterministic() {
        let sql = "SELECT * FROM LIB.TABLE WHERE X = ? FOR UPDATE";
        assert_eq!(parse(sql), parse(sql));
    }

    #[test]
    fn test_select_for_update() {
        let statement = parse("SELECT * FROM LIB.TABLE WHERE X = ? FOR UPDATE");

        assert_eq!(statement.kind, NativeKind::Select);
        assert_eq!(statement.parameter_count, 1);
        assert!(statement.facts.is_for_update);
        assert_eq!(statement.select_table.as_deref(), Some("LIB.TABLE"));
        assert!(!statement.is_immediately_executable);
        assert!(statement.is_packaged);
    }

    #[test]
    fn test_select_table_under_system_naming() {
        let statement =
            Classifier::parse("SELECT * FROM LIB/TABLE WHERE X = ?", &system_naming()).unwrap();
        assert_eq!(statement.select_table.as_deref(), Some("LIB/TABLE"));
    }

    #[test]
    fn test_select_variants() {
        assert_eq!(parse("WITH X AS (SELECT 1 FROM A) SELECT * FROM X").kind, NativeKind::Select);
        assert_eq!(parse("VALUES 1").kind, NativeKind::Select);
        // Leading parentheses don't hide the keyword.
        assert_eq!(parse("((SELECT 1 FROM A))").kind, NativeKind::Select);
    }

    #[test]
    fn test_select_correlation_and_join_list() {
        let statement = parse("SELECT * FROM ORDERS AS o WHERE o.ID = 1");
        assert_eq!(statement.select_table.as_deref(), Some("ORDERS"));
        assert_eq!(statement.correlation_name.as_deref(), Some("O"));

        // Multi-table selects record no table.
        let statement = parse("SELECT * FROM A, B WHERE A.X = B.X");
        assert!(statement.select_table.is_none());

        // Sub-queries in FROM have no plain table name.
        let statement = parse("SELECT * FROM (SELECT X FROM A) AS t");
        assert!(statement.select_table.is_none());

        // Only the first top-level FROM counts.
        let statement = parse("SELECT * FROM A WHERE X IN (SELECT Y FROM B)");
        assert_eq!(statement.select_table.as_deref(), Some("A"));
    }

    #[test]
    fn test_quoted_table_names() {
        let statement = parse(r#"SELECT * FROM "My Lib"."Or.ders""#);
        assert_eq!(statement.select_table.as_deref(), Some("My Lib.Or.ders"));

        let statement = parse(r#"SELECT * FROM LIB."Mixed""#);
        assert_eq!(statement.select_table.as_deref(), Some("LIB.Mixed"));
    }

    #[test]
    fn test_call_with_schema() {
        let statement = parse("CALL MYLIB.MYPROC(?, ?)");

        assert_eq!(statement.kind, NativeKind::Call);
        assert_eq!(statement.procedure.as_deref(), Some("MYPROC"));
        assert_eq!(statement.schema.as_deref(), Some("MYLIB"));
        assert_eq!(statement.parameter_count, 2);
        assert!(!statement.facts.has_return_value_parameter);
    }

    #[test]
    fn test_call_under_system_naming() {
        let statement = Classifier::parse("CALL MYLIB/MYPROC(?)", &system_naming()).unwrap();
        assert_eq!(statement.schema.as_deref(), Some("MYLIB"));
        assert_eq!(statement.procedure.as_deref(), Some("MYPROC"));
    }

    #[test]
    fn test_call_quoted_parts() {
        let statement = parse(r#"CALL "MyLib"."My.Proc"(?)"#);
        assert_eq!(statement.schema.as_deref(), Some("MyLib"));
        assert_eq!(statement.procedure.as_deref(), Some("My.Proc"));

        let statement = parse(r#"CALL mylib."proc"(?)"#);
        assert_eq!(statement.schema.as_deref(), Some("MYLIB"));
        assert_eq!(statement.procedure.as_deref(), Some("proc"));
    }

    #[test]
    fn test_return_value_call() {
        let statement = parse("?=CALL MYPROC(?)");

        assert_eq!(statement.kind, NativeKind::Call);
        assert!(statement.facts.has_return_value_parameter);
        // The synthesized marker is not a real parameter.
        assert_eq!(statement.parameter_count, 1);
        // The stored text restarts at CALL.
        assert!(statement.text.starts_with("CALL"));
        assert_eq!(statement.procedure.as_deref(), Some("MYPROC"));

        let statement = parse("? = CALL MYPROC");
        assert!(statement.facts.has_return_value_parameter);
        assert_eq!(statement.parameter_count, 0);
        assert_eq!(statement.text, "CALL MYPROC");
    }

    #[test]
    fn test_connect_forms() {
        assert!(parse("CONNECT TO PROD400").facts.is_drda_connect);
        assert_eq!(parse("CONNECT TO PROD400").kind, NativeKind::Connect);
        assert!(parse("DISCONNECT CURRENT").facts.is_drda_disconnect);
        assert_eq!(parse("SET CONNECTION PROD400").kind, NativeKind::Connect);
        // Plain SET stays undetermined.
        assert_eq!(parse("SET PATH = MYLIB").kind, NativeKind::Undetermined);
    }

    #[test]
    fn test_release_savepoint_substring_rule() {
        // RELEASE of a connection.
        let statement = parse("RELEASE ALL");
        assert_eq!(statement.kind, NativeKind::Connect);
        assert!(statement.facts.is_drda_disconnect);

        // A savepoint release is an ordinary statement.
        assert_eq!(parse("RELEASE SAVEPOINT S1").kind, NativeKind::Other);

        // The substring rule is loose by design: any later SAVEPOINT
        // text suppresses the connect classification.
        assert_eq!(parse("RELEASE TO SAVEPOINT_TABLE").kind, NativeKind::Other);
    }

    #[test]
    fn test_insert_batching() {
        let statement = parse("INSERT INTO T VALUES (?, ?)");
        assert!(statement.facts.is_insert);
        assert!(statement.facts.can_be_batched);
        assert!(statement.is_packaged);

        // Mixed literal and marker: valid, but not batchable.
        let statement = parse("INSERT INTO T VALUES (1, ?)");
        assert!(!statement.facts.can_be_batched);

        // All literals batch.
        let statement = parse("INSERT INTO T (A, B) VALUES (1, 2)");
        assert!(statement.facts.can_be_batched);
        assert!(statement.is_immediately_executable);
    }

    #[test]
    fn test_insert_values_syntax_error() {
        let context = ClassifierContext::default();
        assert_eq!(
            Classifier::parse("INSERT INTO T VALUES 1, 2", &context).unwrap_err(),
            Error::InvalidValuesClause
        );
        // A single bare literal is fine.
        assert!(Classifier::parse("INSERT INTO T VALUES 1", &context).is_ok());
    }

    #[test]
    fn test_block_insert() {
        let statement = parse("INSERT INTO T 5 ROWS VALUES (?, ?)");
        assert_eq!(statement.kind, NativeKind::BlockInsert);
        assert!(statement.facts.can_be_batched);
    }

    #[test]
    fn test_insert_subselect() {
        let statement = parse("INSERT INTO T SELECT X FROM S");

        assert!(statement.facts.is_insert);
        assert!(statement.facts.is_subselect);
        assert!(!statement.is_immediately_executable);
        assert!(statement.is_packaged);
        // The inner FROM belongs to the sub-select, not to a query.
        assert!(statement.select_table.is_none());
    }

    #[test]
    fn test_update_delete_merge_batchability() {
        let statement = parse("UPDATE T SET X = ? WHERE Y = ?");
        assert!(statement.facts.is_update_or_delete);
        assert!(statement.facts.can_be_batched);
        assert_eq!(statement.parameter_count, 2);

        let mut config = Sql::default();
        config.server_level = 9;
        let context = ClassifierContext::from_config(&config);
        let statement = Classifier::parse("DELETE FROM T WHERE X = ?", &context).unwrap();
        assert!(!statement.facts.can_be_batched);

        assert!(parse("MERGE INTO T USING S ON T.X = S.X").facts.is_update_or_delete);
    }

    #[test]
    fn test_positioned_update() {
        let statement = parse("UPDATE T SET X = 1 WHERE CURRENT OF C1");

        assert!(statement.facts.is_current_of);
        assert!(statement.facts.is_update_or_delete);
        assert!(!statement.is_immediately_executable);
        assert!(!statement.is_packaged);
    }

    #[test]
    fn test_cursor_clauses() {
        assert!(parse("SELECT * FROM T FOR FETCH ONLY").facts.is_for_fetch_or_read_only);
        assert!(parse("SELECT * FROM T FOR READ ONLY").facts.is_for_fetch_or_read_only);
        assert!(!parse("SELECT * FROM T FOR READ").facts.is_for_fetch_or_read_only);
    }

    #[test]
    fn test_declare() {
        let statement = parse("DECLARE C1 CURSOR FOR SELECT * FROM T");
        assert!(statement.facts.is_declare);
        assert!(statement.is_packaged);
    }

    #[test]
    fn test_commit_rollback() {
        assert_eq!(parse("COMMIT").kind, NativeKind::Commit);
        assert_eq!(parse("ROLLBACK WORK").kind, NativeKind::Rollback);
        assert!(parse("COMMIT").is_immediately_executable);
    }

    #[test]
    fn test_markers_in_literals_and_comments_do_not_count() {
        let statement = parse("UPDATE T SET X = '?' WHERE Y = ? /* ? */");
        assert_eq!(statement.parameter_count, 1);
    }

    #[test]
    fn test_package_criteria_select() {
        let mut config = Sql::default();
        config.package_criteria = PackageCriteria::Select;
        let context = ClassifierContext::from_config(&config);

        let statement = Classifier::parse("SELECT * FROM T", &context).unwrap();
        assert!(statement.is_packaged);

        // The plain policy doesn't package a parameterless query.
        assert!(!parse("SELECT * FROM T").is_packaged);
    }

    #[test]
    fn test_short_statements_keep_comments() {
        let statement = parse("SELECT * FROM T -- keep me");
        assert!(statement.text.contains("keep me"));
    }

    #[test]
    fn test_long_statements_lose_comments() {
        let mut config = Sql::default();
        config.comment_strip_threshold = 10;
        let context = ClassifierContext::from_config(&config);

        let statement =
            Classifier::parse("SELECT * FROM T -- strip me", &context).unwrap();
        assert!(!statement.text.contains("strip me"));
        assert_eq!(statement.select_table.as_deref(), Some("T"));
    }

    #[test]
    fn test_escape_processing_feeds_classification() {
        let statement = parse("{call MYLIB.MYPROC(?)}");
        assert_eq!(statement.kind, NativeKind::Call);
        assert_eq!(statement.procedure.as_deref(), Some("MYPROC"));
        assert_eq!(statement.text, "CALL MYLIB.MYPROC(?)");

        let statement = parse("{?= call MYPROC(?)}");
        assert!(statement.facts.has_return_value_parameter);
        assert_eq!(statement.parameter_count, 1);
        assert!(statement.text.starts_with("CALL"));
    }
}
