//! Route pattern compiler.
//!
//! Patterns are textual, with a small token vocabulary (`:a`, `:d`, `:D`,
//! `:w`, `:W`, `:[class]`), size quantifiers (`{n}`, `{min,max}`), and
//! capture groups (`(...)`). A pattern compiles to a `regex::Regex` plus
//! bookkeeping needed for specificity ordering.

use regex::Regex;

use crate::error::AppError;

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    arg_names: Vec<String>,
    /// Length, in bytes, of the pattern's leading literal run (before the
    /// first token or capture group). Used for specificity ordering.
    literal_prefix_len: usize,
    /// Whether the pattern contains any token or capture construct at all.
    has_tokens: bool,
}

impl Pattern {
    /// Compile a pattern string. Fails with [`AppError::PatternSyntax`] if
    /// the pattern is malformed (unbalanced parens/braces, unknown token,
    /// or an invalid embedded regex class).
    pub fn compile(source: &str) -> Result<Self, AppError> {
        let mut regex_src = String::from("^");
        let mut arg_names = Vec::new();
        let mut literal_prefix_len = None;
        let mut has_tokens = false;

        let chars: Vec<char> = source.chars().collect();
        let mut i = 0;
        let mut cursor_len = 0usize; // byte offset into `source` consumed so far

        while i < chars.len() {
            let c = chars[i];
            match c {
                '(' => {
                    has_tokens = true;
                    if literal_prefix_len.is_none() {
                        literal_prefix_len = Some(cursor_len);
                    }
                    regex_src.push('(');
                    arg_names.push(format!("arg{}", arg_names.len()));
                    i += 1;
                    cursor_len += 1;
                }
                ')' => {
                    regex_src.push(')');
                    i += 1;
                    cursor_len += 1;
                }
                ':' => {
                    has_tokens = true;
                    if literal_prefix_len.is_none() {
                        literal_prefix_len = Some(cursor_len);
                    }
                    let (fragment, consumed) = compile_token(&chars[i..])
                        .ok_or_else(|| AppError::PatternSyntax(format!("bad token at '{source}'")))?;
                    regex_src.push_str(&fragment);
                    i += consumed;
                    cursor_len += chars[i.saturating_sub(consumed)..i]
                        .iter()
                        .map(|c| c.len_utf8())
                        .sum::<usize>();

                    // Optional quantifier override: {n} or {min,max}
                    if i < chars.len() && chars[i] == '{' {
                        if let Some((quant, consumed)) = parse_quantifier(&chars[i..]) {
                            // strip the trailing `+` we just pushed and replace it
                            regex_src.pop();
                            regex_src.push_str(&quant);
                            i += consumed;
                        } else {
                            return Err(AppError::PatternSyntax(format!(
                                "bad quantifier at '{source}'"
                            )));
                        }
                    }
                }
                other => {
                    for esc in escape_literal(other) {
                        regex_src.push(esc);
                    }
                    i += 1;
                    cursor_len += other.len_utf8();
                }
            }
        }
        regex_src.push('$');

        let regex = Regex::new(&regex_src)
            .map_err(|e| AppError::PatternSyntax(format!("'{source}': {e}")))?;

        Ok(Pattern {
            source: source.to_string(),
            regex,
            arg_names,
            literal_prefix_len: literal_prefix_len.unwrap_or(source.len()),
            has_tokens,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn arg_names(&self) -> &[String] {
        &self.arg_names
    }

    pub fn literal_prefix_len(&self) -> usize {
        self.literal_prefix_len
    }

    pub fn has_tokens(&self) -> bool {
        self.has_tokens
    }

    /// Match `path` against this pattern, returning the ordered capture
    /// values on success.
    pub fn matches<'p>(&self, path: &'p str) -> Option<Vec<&'p str>> {
        let caps = self.regex.captures(path)?;
        Some(
            (1..caps.len())
                .map(|idx| caps.get(idx).map(|m| m.as_str()).unwrap_or(""))
                .collect(),
        )
    }
}

fn escape_literal(c: char) -> Vec<char> {
    if matches!(
        c,
        '.' | '+' | '*' | '?' | '^' | '$' | '|' | '\\' | '[' | ']' | '{' | '}'
    ) {
        vec!['\\', c]
    } else {
        vec![c]
    }
}

/// Compile a single `:x` or `:[class]` token starting at `chars[0] == ':'`.
/// Returns the regex fragment (including a default `+` quantifier) and the
/// number of source chars consumed.
fn compile_token(chars: &[char]) -> Option<(String, usize)> {
    if chars.first() != Some(&':') {
        return None;
    }
    match chars.get(1)? {
        'a' => Some(("[^/]+".to_string(), 2)),
        'd' => Some(("[0-9]+".to_string(), 2)),
        'D' => Some(("[^0-9]+".to_string(), 2)),
        'w' => Some(("[A-Za-z]+".to_string(), 2)),
        'W' => Some(("[^A-Za-z]+".to_string(), 2)),
        '[' => {
            let end = chars[1..].iter().position(|&c| c == ']')? + 1;
            let class: String = chars[1..=end].iter().collect();
            Some((format!("{class}+"), end + 1))
        }
        _ => None,
    }
}

/// Parse a `{n}` or `{min,max}` quantifier. Returns the regex quantifier
/// fragment and the number of chars consumed (including braces).
fn parse_quantifier(chars: &[char]) -> Option<(String, usize)> {
    if chars.first() != Some(&'{') {
        return None;
    }
    let end = chars.iter().position(|&c| c == '}')?;
    let inner: String = chars[1..end].iter().collect();
    if inner.chars().all(|c| c.is_ascii_digit()) && !inner.is_empty() {
        Some((format!("{{{inner}}}"), end + 1))
    } else if let Some((min, max)) = inner.split_once(',') {
        if min.chars().all(|c| c.is_ascii_digit()) && max.chars().all(|c| c.is_ascii_digit()) {
            Some((format!("{{{min},{max}}}"), end + 1))
        } else {
            None
        }
    } else {
        None
    }
}
