/// Split a multi-valued cell (`"Action;Indie"`) into trimmed, non-empty
/// tokens. The delimiter is per field; sources disagree on `;` vs `,`.
pub fn split_tokens(raw: &str, delimiter: char) -> impl Iterator<Item = &str> + '_ {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
