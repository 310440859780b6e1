//! Dot-anchored domain pattern matching

/// Matches a hostname against a partial-hostname pattern
///
/// Dots anchor the pattern: a leading dot matches a hostname suffix, a
/// trailing dot a prefix, dots on both ends a substring, and a bare pattern
/// the whole hostname.
///
/// # Arguments
/// * `hostname` - Lowercase hostname, e.g. `www.example.co.nz`
/// * `pattern` - Pattern such as `.nz`, `www.example.`, `.google.`
pub fn domain_matches(hostname: &str, pattern: &str) -> bool {
    let anchored_start = pattern.starts_with('.');
    let anchored_end = pattern.ends_with('.');

    match (anchored_start, anchored_end) {
        (true, true) => hostname.contains(pattern),
        (true, false) => hostname.ends_with(pattern),
        (false, true) => hostname.starts_with(pattern),
        (false, false) => hostname == pattern,
    }
}
