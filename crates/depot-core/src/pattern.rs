// Shell-style wildcard matching for exclude patterns: `*` matches any run
// of characters, `?` matches exactly one.
pub fn wildcard_match(pattern: &str, input: &str) -> bool {
    match_chars(
        &pattern.chars().collect::<Vec<_>>(),
        &input.chars().collect::<Vec<_>>(),
    )
}

fn match_chars(pattern: &[char], input: &[char]) -> bool {
    match pattern.first() {
        None => input.is_empty(),
        Some('*') => {
            if match_chars(&pattern[1..], input) {
                return true;
            }
            !input.is_empty() && match_chars(pattern, &input[1..])
        }
        Some('?') => !input.is_empty() && match_chars(&pattern[1..], &input[1..]),
        Some(&ch) => input.first() == Some(&ch) && match_chars(&pattern[1..], &input[1..]),
    }
}

pub fn is_excluded(name: &str, patterns: &[String]) -> bool {
    patterns
        .iter()
        .any(|pattern| wildcard_match(pattern, name))
}
