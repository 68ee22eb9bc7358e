//! Minimal comma-separated record reader for the catalog source.
//!
//! Supports double-quoted fields (embedded commas, newlines and `""`
//! escapes), CRLF line endings and blank lines. Unquoted fields are trimmed.

use super::CatalogLoadError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct RawRecord {
    /// 1-based line on which the record starts.
    pub line: usize,
    pub fields: Vec<String>,
}

pub(crate) fn read_records(input: &str) -> Result<Vec<RawRecord>, CatalogLoadError> {
    let mut records = Vec::new();
    let mut chars = input.chars().peekable();
    let mut line = 1;

    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut field_quoted = false;
    let mut in_quotes = false;
    let mut record_line = line;
    let mut record_has_content = false;

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' if matches!(chars.peek(), Some('"')) => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push('\n');
                }
                other => field.push(other),
            }
            continue;
        }

        match ch {
            '"' if field.trim().is_empty() && !field_quoted => {
                field.clear();
                in_quotes = true;
                field_quoted = true;
                record_has_content = true;
            }
            '"' => {
                return Err(CatalogLoadError::Malformed {
                    line,
                    message: "unexpected quote inside an unquoted field".to_string(),
                });
            }
            ',' => {
                fields.push(finish_field(&mut field, &mut field_quoted));
                record_has_content = true;
            }
            '\r' if matches!(chars.peek(), Some('\n')) => {}
            '\n' => {
                if record_has_content || !field.trim().is_empty() {
                    fields.push(finish_field(&mut field, &mut field_quoted));
                    records.push(RawRecord { line: record_line, fields: std::mem::take(&mut fields) });
                }
                field.clear();
                record_has_content = false;
                line += 1;
                record_line = line;
            }
            other => {
                if field_quoted {
                    if other.is_whitespace() {
                        continue;
                    }
                    return Err(CatalogLoadError::Malformed {
                        line,
                        message: format!("unexpected `{other}` after closing quote"),
                    });
                }
                field.push(other);
                if !other.is_whitespace() {
                    record_has_content = true;
                }
            }
        }
    }

    if in_quotes {
        return Err(CatalogLoadError::Malformed {
            line: record_line,
            message: "unterminated quoted field".to_string(),
        });
    }

    if record_has_content || !field.trim().is_empty() {
        fields.push(finish_field(&mut field, &mut field_quoted));
        records.push(RawRecord { line: record_line, fields });
    }

    Ok(records)
}

fn finish_field(field: &mut String, quoted: &mut bool) -> String {
    let value = if *quoted { std::mem::take(field) } else { field.trim().to_string() };
    field.clear();
    *quoted = false;
    value
}

#[cfg(test)]
mod tests {
    use super::read_records;
    use crate::catalog::CatalogLoadError;

    fn fields(input: &str) -> Vec<Vec<String>> {
        read_records(input).expect("input should parse").into_iter().map(|r| r.fields).collect()
    }

    #[test]
    fn splits_plain_records_and_trims() {
        let parsed = fields("product,price,image\n Mug , 40 ,mug.png\n");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1], vec!["Mug", "40", "mug.png"]);
    }

    #[test]
    fn quoted_fields_keep_commas_quotes_and_newlines() {
        let parsed = fields("\"Chair, oak\",120,\"a \"\"b\"\"\nc\"\r\nLamp,30,x\n");
        assert_eq!(parsed[0], vec!["Chair, oak", "120", "a \"b\"\nc"]);
        assert_eq!(parsed[1], vec!["Lamp", "30", "x"]);
    }

    #[test]
    fn blank_lines_are_skipped_and_lines_are_tracked() {
        let records = read_records("a,1,x\n\n   \nb,2,y").expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].line, 4);
        assert_eq!(records[1].fields, vec!["b", "2", "y"]);
    }

    #[test]
    fn empty_trailing_field_is_preserved() {
        let parsed = fields("Mug,40,\n");
        assert_eq!(parsed[0], vec!["Mug", "40", ""]);
    }

    #[test]
    fn unterminated_quote_is_malformed() {
        let error = read_records("a,1,x\n\"b,2,y\n").expect_err("quote never closes");
        assert!(matches!(error, CatalogLoadError::Malformed { line: 2, .. }));
    }

    #[test]
    fn stray_quote_is_malformed() {
        let error = read_records("ab\"c,1,x\n").expect_err("quote inside bare field");
        assert!(matches!(error, CatalogLoadError::Malformed { line: 1, .. }));
    }
}
