//! Comment removal for PL/SQL source
//!
//! The boundary scanner operates on comment-free source to keep its state
//! machine simple. This module strips `--` and `/* */` comments while
//! preserving string literals verbatim, so `--` or `/*` inside a literal
//! survives untouched. `''` inside a literal is an escaped quote, not a
//! terminator.

/// Removes single-line and multi-line comments from PL/SQL source.
///
/// String literals are preserved byte-for-byte. The newline that terminates a
/// single-line comment is kept so line structure survives.
pub fn strip_comments(source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    let chars: Vec<char> = source.chars().collect();

    let mut in_string = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    let mut i = 0;
    while i < chars.len() {
        let current = chars[i];
        let next = if i + 1 < chars.len() {
            chars[i + 1]
        } else {
            '\0'
        };

        if in_line_comment {
            if current == '\n' {
                in_line_comment = false;
                result.push(current);
            }
            i += 1;
            continue;
        }

        if in_block_comment {
            if current == '*' && next == '/' {
                in_block_comment = false;
                i += 2;
            } else {
                i += 1;
            }
            continue;
        }

        if in_string {
            result.push(current);
            if current == '\'' {
                if next == '\'' {
                    // Escaped quote, stay inside the literal
                    result.push(next);
                    i += 2;
                    continue;
                }
                in_string = false;
            }
            i += 1;
            continue;
        }

        if current == '-' && next == '-' {
            in_line_comment = true;
            i += 2;
            continue;
        }

        if current == '/' && next == '*' {
            in_block_comment = true;
            i += 2;
            continue;
        }

        if current == '\'' {
            in_string = true;
        }
        result.push(current);
        i += 1;
    }

    result
}
