//! Shell-style `$NAME` / `${NAME}` substitution.
//!
//! A name is a run of ASCII letters, digits and `_`, or one of the special
//! single-character parameters `* # $ @ ! ? -` and `0`-`9`. Malformed braces
//! (`${`, `${}`) are dropped, and a `$` followed by anything else is kept
//! literally, as is a trailing `$`.

/// Replace every variable reference in `s` with `mapping(name)`.
pub fn expand(s: &str, mut mapping: impl FnMut(&str) -> String) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut start = 0;
    let mut j = 0;

    while j < bytes.len() {
        if bytes[j] == b'$' && j + 1 < bytes.len() {
            out.push_str(&s[start..j]);
            let (name, width) = shell_name(&s[j + 1..]);
            match (name, width) {
                ("", 0) => out.push('$'),
                ("", _) => {}
                (name, _) => out.push_str(&mapping(name)),
            }
            j += width;
            start = j + 1;
        }
        j += 1;
    }

    out.push_str(&s[start..]);
    out
}

/// Name following a `$` and the number of bytes it occupies. An empty name
/// with a non-zero width is bad syntax to be swallowed.
fn shell_name(s: &str) -> (&str, usize) {
    let bytes = s.as_bytes();
    if bytes[0] == b'{' {
        if bytes.len() > 2 && is_special(bytes[1]) && bytes[2] == b'}' {
            return (&s[1..2], 3);
        }
        return match bytes.iter().skip(1).position(|&b| b == b'}') {
            Some(0) => ("", 2),
            Some(end) => (&s[1..=end], end + 2),
            None => ("", 1),
        };
    }
    if is_special(bytes[0]) {
        return (&s[..1], 1);
    }
    let len = bytes
        .iter()
        .take_while(|&&b| b == b'_' || b.is_ascii_alphanumeric())
        .count();
    (&s[..len], len)
}

fn is_special(b: u8) -> bool {
    matches!(b, b'*' | b'#' | b'$' | b'@' | b'!' | b'?' | b'-' | b'0'..=b'9')
}
