use crate::types::TokenizerOptions;

const IDENT_PLACEHOLDER: &str = "$id";
const NUMBER_PLACEHOLDER: &str = "$num";
const STRING_PLACEHOLDER: &str = "$str";

/// One lexical token of a source file: its comparison text and 1-based line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceToken<'a> {
    pub text: &'a str,
    pub line: u32,
}

fn is_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "if" | "else"
            | "for"
            | "while"
            | "do"
            | "switch"
            | "case"
            | "break"
            | "continue"
            | "return"
            | "try"
            | "catch"
            | "finally"
            | "throw"
            | "fn"
            | "function"
            | "class"
            | "struct"
            | "enum"
            | "impl"
            | "trait"
            | "const"
            | "let"
            | "var"
            | "static"
            | "public"
            | "private"
            | "protected"
            | "async"
            | "await"
    )
}

/// Splits `text` into comparison tokens for C-like languages.
///
/// `//` and `/* */` comments are skipped, as are `#` lines (preprocessor
/// directives, shell and Python comments). Identifiers, numbers, string
/// literals and single punctuation bytes become one token each. Line numbers
/// are non-decreasing, so the result can be fed straight into a
/// [`crate::CorpusBuilder`].
pub fn tokenize_source<'a>(text: &'a str, options: &TokenizerOptions) -> Vec<SourceToken<'a>> {
    let bytes = text.as_bytes();
    let mut i = 0usize;
    let mut line: u32 = 1;
    let mut at_line_start = true;

    let mut tokens = Vec::new();

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\n' {
            line = line.saturating_add(1);
            i += 1;
            at_line_start = true;
            continue;
        }
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let was_at_line_start = at_line_start;
        at_line_start = false;

        if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            i += 2;
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }
        if b == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            i += 2;
            let mut closed = false;
            while i < bytes.len() {
                if bytes[i] == b'\n' {
                    line = line.saturating_add(1);
                    at_line_start = true;
                }
                if bytes[i] == b'*' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    i += 2;
                    closed = true;
                    break;
                }
                i += 1;
            }
            if !closed {
                i = bytes.len();
            }
            continue;
        }
        if b == b'#' && was_at_line_start {
            i += 1;
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        if b == b'"' || b == b'\'' || b == b'`' {
            let quote = b;
            let start = i;
            let start_line = line;
            i += 1;
            while i < bytes.len() {
                let c = bytes[i];
                if c == b'\n' {
                    line = line.saturating_add(1);
                }
                if c == b'\\' && i + 1 < bytes.len() {
                    if bytes[i + 1] == b'\n' {
                        line = line.saturating_add(1);
                    }
                    i += 2;
                    continue;
                }
                i += 1;
                if c == quote {
                    break;
                }
            }
            let end = i.min(bytes.len());
            let literal = if options.ignore_literals {
                STRING_PLACEHOLDER
            } else {
                &text[start..end]
            };
            tokens.push(SourceToken {
                text: literal,
                line: start_line,
            });
            continue;
        }

        if b.is_ascii_alphabetic() || b == b'_' || b == b'$' {
            let start = i;
            i += 1;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let ident = &text[start..i];
            let text = if options.ignore_identifiers && !is_keyword(ident) {
                IDENT_PLACEHOLDER
            } else {
                ident
            };
            tokens.push(SourceToken { text, line });
            continue;
        }

        if b.is_ascii_digit() {
            let start = i;
            i += 1;
            while i < bytes.len()
                && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'.' || bytes[i] == b'_')
            {
                i += 1;
            }
            let text = if options.ignore_literals {
                NUMBER_PLACEHOLDER
            } else {
                &text[start..i]
            };
            tokens.push(SourceToken { text, line });
            continue;
        }

        // Multi-byte characters stay whole so slices remain on char boundaries.
        let width = text[i..].chars().next().map_or(1, char::len_utf8);
        tokens.push(SourceToken {
            text: &text[i..i + width],
            line,
        });
        i += width;
    }

    tokens
}
