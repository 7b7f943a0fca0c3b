//! Display names for stack frames.
//!
//! Raw function names arrive as whatever the debugger reports: plain C names,
//! qualified C++ methods (`Foo::bar(int, int)`), templates and operator
//! overloads (`Vec<int>::operator[](unsigned long)`). The card title shows only the
//! identifier that precedes the parameter list.

use crate::model::StackFrame;

/// Extract the display name of a raw function signature.
///
/// Returns the identifier before the first parameter-list delimiter, which is `(`
/// or a `[` not immediately followed by `]`. Leading `Scope::` qualifiers are
/// dropped. When no delimiter exists the raw string is returned unchanged.
pub fn display_name(raw: &str) -> &str {
    let bytes = raw.as_bytes();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < bytes.len() {
        let c = bytes[i];
        let opens_params = c == b'(' || (c == b'[' && bytes.get(i + 1) != Some(&b']'));
        if opens_params {
            return raw[start..i].trim();
        }
        if c == b'[' {
            // `[]` belongs to `operator[]`
            i += 2;
            continue;
        }
        if !is_name_byte(c) {
            start = i + 1;
        }
        i += 1;
    }
    raw
}

/// Bytes that may appear in a display name: identifier characters, spaces,
/// and the symbols of overloaded operators.
fn is_name_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'_' | b' ' | b'~' | b'+' | b'-' | b'*' | b'/' | b'<' | b'>' | b'&' | b'|' | b'='
                | b'!' | b'%' | b'^'
        )
        || !c.is_ascii()
}

/// Title shown on a frame card: `name (frame_id)`, or just the name when the id is 0.
pub fn frame_title(frame: &StackFrame) -> String {
    let name = display_name(&frame.func_name);
    if frame.frame_id != 0 {
        format!("{} ({})", name, frame.frame_id)
    } else {
        name.to_string()
    }
}
