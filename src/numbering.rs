//! Sequence-number suffixes on `id` / `for` values and clone container classes.

pub(crate) const CONTAINER_CLASS_PREFIX: &str = "cloned-fields-";

/// Splits a trailing `_<digits>` suffix off `name`, returning the base and
/// the digits. Names without such a suffix come back whole.
pub(crate) fn split_numeric_suffix(name: &str) -> (&str, Option<&str>) {
    let digits_start = name
        .char_indices()
        .rev()
        .take_while(|(_, ch)| ch.is_ascii_digit())
        .last()
        .map(|(idx, _)| idx);

    match digits_start {
        Some(start) if start > 0 && name.as_bytes()[start - 1] == b'_' => {
            (&name[..start - 1], Some(&name[start..]))
        }
        _ => (name, None),
    }
}

/// Appends `_<number>` without looking at any existing suffix.
pub(crate) fn append_suffix(name: &str, number: usize) -> String {
    format!("{name}_{number}")
}

/// Drops a trailing `_<digits>` suffix, if any, then appends `_<number>`.
pub(crate) fn replace_suffix(name: &str, number: usize) -> String {
    let (base, _) = split_numeric_suffix(name);
    append_suffix(base, number)
}

pub(crate) fn container_class(number: usize) -> String {
    format!("{CONTAINER_CLASS_PREFIX}{number}")
}

/// Sequence number of a clone container, read from the first class token of
/// the exact form `cloned-fields-<digits>`.
pub(crate) fn container_number(class_attr: &str) -> Option<usize> {
    class_attr.split_whitespace().find_map(|token| {
        let digits = token.strip_prefix(CONTAINER_CLASS_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    })
}
