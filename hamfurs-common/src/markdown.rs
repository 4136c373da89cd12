//! Helpers for Telegram's legacy Markdown parse mode.

const SPECIAL: &[char] = &['_', '*', '[', ']', '`'];

/// Escape characters that would otherwise start Markdown entities.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Join items as "a, b and c".
pub fn oxford_join<S: AsRef<str>>(items: &[S]) -> String {
    match items {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [head @ .., second_last, last] => {
            let tail = format!("{} and {}", second_last.as_ref(), last.as_ref());
            head.iter()
                .map(|s| s.as_ref().to_string())
                .chain(std::iter::once(tail))
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

/// Uppercase the first letter of each whitespace-separated word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
