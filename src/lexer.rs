use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("Unexpected character '{ch}' at position {position} in input string")]
    UnexpectedCharacter { ch: char, position: usize },
}

/// Splits an input string into terminal tokens over a fixed alphabet:
/// the two-character literal `id`, the operators `+ * ( )`, and bare
/// alphabetic letters. Whitespace separates tokens and is dropped.
///
/// The alphabet is deliberately not derived from the grammar's declared
/// terminals; positions in errors are character offsets.
pub fn tokenize(input: &str) -> Result<Vec<String>, LexError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens: Vec<String> = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
        } else if c == 'i' && chars.get(i + 1) == Some(&'d') {
            // longest match first: `id` beats the bare letter `i`
            tokens.push("id".to_string());
            i += 2;
        } else if matches!(c, '+' | '*' | '(' | ')') {
            tokens.push(c.to_string());
            i += 1;
        } else if c.is_alphabetic() {
            tokens.push(c.to_string());
            i += 1;
        } else {
            return Err(LexError::UnexpectedCharacter { ch: c, position: i });
        }
    }
    Ok(tokens)
}
