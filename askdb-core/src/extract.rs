//! SQL extraction from raw model replies
//!
//! Models like to wrap their answer in markdown fences no matter what the
//! prompt says. Extraction strips that known formatting noise and nothing
//! else; whether the remaining text is valid SQL is for the target database
//! to decide.

/// Strip fenced-SQL markers and surrounding whitespace from a raw reply.
///
/// Idempotent: applying it to its own output changes nothing.
pub fn extract_sql(raw: &str) -> String {
    raw.replace("```sql", "")
        .replace("```", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sql_fences() {
        assert_eq!(extract_sql("```sql\nSELECT 1;\n```"), "SELECT 1;");
    }

    #[test]
    fn strips_bare_fences() {
        assert_eq!(extract_sql("```\nSELECT 1;\n```"), "SELECT 1;");
    }

    #[test]
    fn plain_replies_pass_through_trimmed() {
        assert_eq!(extract_sql("  SELECT 1;  \n"), "SELECT 1;");
    }

    #[test]
    fn extraction_is_idempotent() {
        let inputs = [
            "```sql\nSELECT 1;\n```",
            "SELECT 1;",
            "```SELECT 'a```b';```",
            "",
        ];
        for input in inputs {
            let once = extract_sql(input);
            assert_eq!(extract_sql(&once), once);
        }
    }

    #[test]
    fn does_not_validate_sql() {
        assert_eq!(extract_sql("not sql at all"), "not sql at all");
    }
}
