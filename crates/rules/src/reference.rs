//! Reference path parsing.
//!
//! Paths are `.`-separated keys with `[n]` array indexes, for example
//! `person.friends[1].name`. `\.` and `\[` escape a literal dot or bracket.

use crate::error::{EngineError, Result};
use crate::node::Key;

pub fn parse_path(path: &str) -> Result<Vec<Key>> {
    let invalid = || EngineError::InvalidReference(path.to_string());
    if path.is_empty() {
        return Err(invalid());
    }

    let mut keys = Vec::new();
    let mut current = String::new();
    let mut after_index = false;
    let mut chars = path.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some('.' | '[')) => {
                current.extend(chars.next());
                after_index = false;
            }
            '.' if after_index => after_index = false,
            '.' => keys.push(Key::from(std::mem::take(&mut current))),
            '[' => {
                if !current.is_empty() {
                    keys.push(Key::from(std::mem::take(&mut current)));
                }
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some(']') => break,
                        Some(d) if d.is_ascii_digit() => digits.push(d),
                        _ => return Err(invalid()),
                    }
                }
                if digits.is_empty() || !matches!(chars.peek(), None | Some('.' | '[')) {
                    return Err(invalid());
                }
                keys.push(Key::from(digits));
                after_index = true;
            }
            other => {
                current.push(other);
                after_index = false;
            }
        }
    }

    if !after_index {
        keys.push(Key::from(current));
    }
    Ok(keys)
}
