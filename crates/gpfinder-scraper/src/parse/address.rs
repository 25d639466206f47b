//! Free-text address splitting.

use gpfinder_core::{Address, Postcode};

/// Splits address text into lines and a trailing postcode.
///
/// Each input fragment may itself hold several comma-separated lines. The
/// postcode is taken from the end of the last line only; when it is absent
/// every line is kept as-is and `postcode` is `None`. Returns `None` when
/// there is no text at all.
#[must_use]
pub fn split_address<S: AsRef<str>>(fragments: &[S]) -> Option<Address> {
    let mut lines: Vec<String> = fragments
        .iter()
        .flat_map(|f| f.as_ref().split(','))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect();
    let last = lines.last()?.clone();

    if let Ok(postcode) = Postcode::parse(&last) {
        lines.pop();
        return Some(Address {
            lines,
            postcode: Some(postcode),
        });
    }

    if let Some((head, postcode)) = trailing_postcode(&last) {
        let head = head.trim_end_matches([',', ' ']).to_owned();
        lines.pop();
        if !head.is_empty() {
            lines.push(head);
        }
        return Some(Address {
            lines,
            postcode: Some(postcode),
        });
    }

    Some(Address {
        lines,
        postcode: None,
    })
}

/// A postcode ending `line`, with the text before it.
fn trailing_postcode(line: &str) -> Option<(&str, Postcode)> {
    let words: Vec<&str> = line.split_whitespace().collect();
    // Try the last two words joined, then the last word alone.
    for take in [2, 1] {
        if words.len() < take {
            continue;
        }
        let tail = words[words.len() - take..].join("");
        if let Ok(postcode) = Postcode::parse(&tail) {
            let first_tail_word = words[words.len() - take];
            let split_at = line.rfind(first_tail_word)?;
            return Some((&line[..split_at], postcode));
        }
    }
    None
}
