//! Script segmentation
//!
//! A dataset script is plain SQL text made of `;`-terminated statements.
//! Two strategies are available:
//! - [`SplitMode::Lines`]: a statement ends on any logical line whose trimmed
//!   text ends in `;`. Blank lines and `--` comment lines are dropped.
//!   A `;` that ends a line inside a multi-line string literal splits the
//!   statement there.
//! - [`SplitMode::QuoteAware`]: scans the text and splits only on `;`
//!   outside string literals, quoted identifiers and comments.

use serde::{Deserialize, Serialize};

/// Comment marker for whole-line comments
pub const COMMENT_PREFIX: &str = "--";

/// How a script is cut into statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SplitMode {
    #[default]
    Lines,
    QuoteAware,
}

impl SplitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitMode::Lines => "lines",
            SplitMode::QuoteAware => "quote-aware",
        }
    }
}

impl std::fmt::Display for SplitMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SplitMode {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "lines" => Ok(SplitMode::Lines),
            "quote-aware" | "quote_aware" => Ok(SplitMode::QuoteAware),
            _ => Err(crate::Error::Script(format!("unknown split mode: {}", s))),
        }
    }
}

/// Result of cutting a script into statements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitScript {
    /// Statements in script order
    pub statements: Vec<String>,
    /// Text left over after the last terminator. Never executed.
    pub trailing: Option<String>,
}

/// Split a script using the given strategy
pub fn split_script(text: &str, mode: SplitMode) -> SplitScript {
    match mode {
        SplitMode::Lines => split_lines(text),
        SplitMode::QuoteAware => split_quote_aware(text),
    }
}

fn split_lines(text: &str) -> SplitScript {
    let mut statements = Vec::new();
    let mut buffer = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            continue;
        }

        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(line);

        if trimmed.ends_with(';') {
            statements.push(std::mem::take(&mut buffer));
        }
    }

    SplitScript {
        statements,
        trailing: non_blank(buffer),
    }
}

fn split_quote_aware(text: &str) -> SplitScript {
    let bytes = text.as_bytes();
    let mut statements = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        i += 1;
                        // doubled quote is an escape
                        if i < bytes.len() && bytes[i] == quote {
                            i += 1;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                i += 2;
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() {
                    if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            b';' => {
                let stmt = &text[start..=i];
                if has_code(stmt) {
                    statements.push(stmt.trim().to_string());
                }
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }

    let rest = &text[start.min(text.len())..];
    SplitScript {
        statements,
        trailing: if has_code(rest) {
            Some(rest.trim().to_string())
        } else {
            None
        },
    }
}

/// True when the fragment holds something other than whitespace, comments and `;`
fn has_code(fragment: &str) -> bool {
    let mut in_block = false;
    for line in fragment.lines() {
        let mut rest = line.trim();
        loop {
            if in_block {
                match rest.find("*/") {
                    Some(end) => {
                        in_block = false;
                        rest = rest[end + 2..].trim();
                    }
                    None => break,
                }
            } else if rest.is_empty() || rest.starts_with(COMMENT_PREFIX) {
                break;
            } else if let Some(after) = rest.strip_prefix("/*") {
                in_block = true;
                rest = after;
            } else if let Some(after) = rest.strip_prefix(';') {
                rest = after.trim();
            } else {
                return true;
            }
        }
    }
    false
}

fn non_blank(buffer: String) -> Option<String> {
    if buffer.trim().is_empty() {
        None
    } else {
        Some(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "-- sample\nCREATE TABLE t(x INTEGER);\n\nINSERT INTO t VALUES (1);\nINSERT INTO t VALUES (2);\n";

    #[test]
    fn test_lines_keeps_order() {
        let split = split_script(SAMPLE, SplitMode::Lines);
        assert_eq!(
            split.statements,
            vec![
                "CREATE TABLE t(x INTEGER);",
                "INSERT INTO t VALUES (1);",
                "INSERT INTO t VALUES (2);",
            ]
        );
        assert!(split.trailing.is_none());
    }

    #[test]
    fn test_lines_multi_line_statement() {
        let text = "CREATE TABLE t (\n  -- id column\n  id INTEGER,\n\n  name TEXT\n);\n";
        let split = split_script(text, SplitMode::Lines);
        assert_eq!(split.statements.len(), 1);
        assert_eq!(split.statements[0], "CREATE TABLE t (\n  id INTEGER,\n  name TEXT\n);");
    }

    #[test]
    fn test_lines_splits_inside_literal() {
        // known limitation of line mode
        let text = "INSERT INTO t VALUES ('a;\nb');\n";
        let split = split_script(text, SplitMode::Lines);
        assert_eq!(split.statements, vec!["INSERT INTO t VALUES ('a;", "b');"]);
        assert!(split.trailing.is_none());
    }

    #[test]
    fn test_lines_trailing_without_terminator() {
        let split = split_script("SELECT 1;\nSELECT 2", SplitMode::Lines);
        assert_eq!(split.statements, vec!["SELECT 1;"]);
        assert_eq!(split.trailing.as_deref(), Some("SELECT 2"));
    }

    #[test]
    fn test_quote_aware_respects_literals() {
        let text = "INSERT INTO t VALUES ('a;\nb');\nINSERT INTO t VALUES ('it''s; fine');";
        let split = split_script(text, SplitMode::QuoteAware);
        assert_eq!(
            split.statements,
            vec![
                "INSERT INTO t VALUES ('a;\nb');",
                "INSERT INTO t VALUES ('it''s; fine');",
            ]
        );
        assert!(split.trailing.is_none());
    }

    #[test]
    fn test_quote_aware_skips_comments() {
        let text = "-- header; not a statement\n/* block; comment */\nSELECT 1; -- tail;\n;;\n";
        let split = split_script(text, SplitMode::QuoteAware);
        assert_eq!(split.statements.len(), 1);
        assert!(split.statements[0].ends_with("SELECT 1;"));
        assert!(split.trailing.is_none());
    }

    #[test]
    fn test_quote_aware_trailing() {
        let split = split_script("SELECT 1; SELECT 2", SplitMode::QuoteAware);
        assert_eq!(split.statements, vec!["SELECT 1;"]);
        assert_eq!(split.trailing.as_deref(), Some("SELECT 2"));
    }

    #[test]
    fn test_split_mode_parse() {
        assert_eq!("lines".parse::<SplitMode>().unwrap(), SplitMode::Lines);
        assert_eq!("quote-aware".parse::<SplitMode>().unwrap(), SplitMode::QuoteAware);
        assert!("words".parse::<SplitMode>().is_err());
        for mode in [SplitMode::Lines, SplitMode::QuoteAware] {
            assert_eq!(mode.as_str().parse::<SplitMode>().unwrap(), mode);
            assert_eq!(mode.to_string(), mode.as_str());
        }
    }
}
