//! JSON Pointer helpers (RFC 6901).
//!
//! Pointers name schema nodes in synthesis errors (`/properties/tags/items`)
//! and instance locations in validation issues (`/tasks/0/task_id`). They are
//! also how local `$ref` fragments such as `#/$defs/Node` are decoded.
//! Segments are `/`-separated, with `~` escaped as `~0` and `/` escaped as `~1`.

/// Appends a segment to a JSON Pointer path, applying RFC 6901 escaping.
pub fn push_segment(path: &mut String, segment: &str) {
    path.push('/');
    for c in segment.chars() {
        match c {
            '~' => path.push_str("~0"),
            '/' => path.push_str("~1"),
            other => path.push(other),
        }
    }
}

/// Returns a new JSON Pointer path by appending a segment to the given path.
#[must_use]
pub fn format(path: &str, segment: &str) -> String {
    let mut result: String = path.to_string();
    push_segment(&mut result, segment);
    result
}

/// Returns a new JSON Pointer path by appending an array index.
#[must_use]
pub fn format_index(path: &str, index: usize) -> String {
    format(path, &index.to_string())
}

/// Reverses RFC 6901 escaping for one segment.
///
/// Returns `None` for a dangling `~` or an escape other than `~0` / `~1`.
#[must_use]
pub fn unescape_segment(segment: &str) -> Option<String> {
    let mut out: String = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Splits a pointer (`/a/b~1c`) into unescaped segments (`["a", "b/c"]`).
///
/// The empty pointer addresses the whole document and yields no segments.
/// Returns `None` when the pointer does not start with `/` or has a bad escape.
#[must_use]
pub fn segments(pointer: &str) -> Option<Vec<String>> {
    if pointer.is_empty() {
        return Some(Vec::new());
    }
    let rest: &str = pointer.strip_prefix('/')?;
    rest.split('/').map(unescape_segment).collect()
}

/// Renders a pointer for humans: the document root is shown as `#`.
#[must_use]
pub fn display(pointer: &str) -> String {
    format!("#{pointer}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_segment_escapes_slash_and_tilde() {
        let mut path = String::new();
        push_segment(&mut path, "properties");
        push_segment(&mut path, "a/b~c");
        assert_eq!("/properties/a~1b~0c", path);
    }

    #[test]
    fn format_index_appends_position() {
        assert_eq!("/tasks/3", format_index("/tasks", 3));
    }

    #[test]
    fn unescape_reverses_escapes() {
        assert_eq!(Some("a/b~c".to_string()), unescape_segment("a~1b~0c"));
    }

    #[test]
    fn unescape_order_is_tilde_one_before_tilde_zero() {
        // "~01" is an escaped "~" followed by a literal "1", never "/".
        assert_eq!(Some("~1".to_string()), unescape_segment("~01"));
    }

    #[test]
    fn unescape_rejects_bad_escape() {
        assert_eq!(None, unescape_segment("a~2"));
        assert_eq!(None, unescape_segment("trailing~"));
    }

    #[test]
    fn segments_of_definition_pointer() {
        let expected: Vec<String> = vec!["$defs".to_string(), "My/Type".to_string()];
        assert_eq!(Some(expected), segments("/$defs/My~1Type"));
    }

    #[test]
    fn segments_of_empty_pointer() {
        assert_eq!(Some(Vec::new()), segments(""));
    }

    #[test]
    fn segments_require_leading_slash() {
        assert_eq!(None, segments("$defs/Name"));
    }

    #[test]
    fn round_trip_through_format_and_segments() {
        let pointer: String = format(&format("", "definitions"), "a~b/c");
        let expected: Vec<String> = vec!["definitions".to_string(), "a~b/c".to_string()];
        assert_eq!(Some(expected), segments(&pointer));
    }

    #[test]
    fn display_marks_root() {
        assert_eq!("#", display(""));
        assert_eq!("#/properties/a", display("/properties/a"));
    }
}
