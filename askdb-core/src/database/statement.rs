//! Statement splitting for multi-statement input
//!
//! Splits on semicolons that sit outside string literals, quoted identifiers
//! and comments. Dollar-quoted Postgres bodies are not recognized; Postgres
//! handles reject multi-statement input anyway, so the splitter only has to
//! be exact for the MySQL grammar.

/// Split `sql` into individual statements. Empty fragments (for example from
/// a trailing semicolon) are dropped; each returned statement is trimmed.
pub(crate) fn split_statements(sql: &str) -> Vec<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Normal,
        SingleQuote,
        DoubleQuote,
        Backtick,
        LineComment,
        BlockComment,
    }

    let mut statements = Vec::new();
    let mut current = String::new();
    let mut state = State::Normal;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                ';' => {
                    let stmt = current.trim();
                    if !stmt.is_empty() {
                        statements.push(stmt.to_string());
                    }
                    current.clear();
                    continue;
                }
                '\'' => state = State::SingleQuote,
                '"' => state = State::DoubleQuote,
                '`' => state = State::Backtick,
                '-' if chars.peek() == Some(&'-') => state = State::LineComment,
                '/' if chars.peek() == Some(&'*') => state = State::BlockComment,
                _ => {}
            },
            State::SingleQuote => match c {
                // Backslash escape: keep the escaped character opaque.
                '\\' => {
                    current.push(c);
                    if let Some(escaped) = chars.next() {
                        current.push(escaped);
                    }
                    continue;
                }
                '\'' => state = State::Normal,
                _ => {}
            },
            State::DoubleQuote => {
                if c == '"' {
                    state = State::Normal;
                }
            }
            State::Backtick => {
                if c == '`' {
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    current.push(c);
                    if let Some(slash) = chars.next() {
                        current.push(slash);
                    }
                    state = State::Normal;
                    continue;
                }
            }
        }
        current.push(c);
    }

    let tail = current.trim();
    if !tail.is_empty() {
        statements.push(tail.to_string());
    }
    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_statement_passes_through() {
        assert_eq!(split_statements("SELECT 1"), vec!["SELECT 1"]);
    }

    #[test]
    fn trailing_semicolon_yields_no_empty_statement() {
        assert_eq!(split_statements("SELECT 1;"), vec!["SELECT 1"]);
    }

    #[test]
    fn splits_a_batch_on_semicolons() {
        let statements = split_statements(
            "INSERT INTO t (a) VALUES (1); UPDATE t SET a = 2; SELECT * FROM t;",
        );
        assert_eq!(
            statements,
            vec![
                "INSERT INTO t (a) VALUES (1)",
                "UPDATE t SET a = 2",
                "SELECT * FROM t",
            ]
        );
    }

    #[test]
    fn semicolons_inside_literals_do_not_split() {
        let statements = split_statements("SELECT 'a;b'; SELECT \"c;d\"; SELECT `e;f`");
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0], "SELECT 'a;b'");
    }

    #[test]
    fn escaped_quote_does_not_end_the_literal() {
        let statements = split_statements(r"SELECT 'it\'s; fine'; SELECT 2");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], r"SELECT 'it\'s; fine'");
    }

    #[test]
    fn doubled_quote_does_not_end_the_literal() {
        let statements = split_statements("SELECT 'a''; b'; SELECT 2");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], "SELECT 'a''; b'");
    }

    #[test]
    fn semicolons_inside_comments_do_not_split() {
        let statements = split_statements("SELECT 1 -- not; here\n; SELECT /* nor; here */ 2");
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[1], "SELECT /* nor; here */ 2");
    }

    #[test]
    fn whitespace_only_input_yields_nothing() {
        assert!(split_statements("   ;;  ; ").is_empty());
    }
}
