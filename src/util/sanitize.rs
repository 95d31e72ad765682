use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

// CSI sequences (ESC [ ... final byte) and OSC sequences (ESC ] ... BEL/ST)
// A pattern that fails to build leaves escapes in place; the control-char
// pass below still drops the ESC bytes themselves.
static ESCAPES: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"\x1B\[[0-9;?]*[ -/]*[@-~]|\x1B\][^\x07\x1B]*(?:\x07|\x1B\\)").ok()
});

const MAX_CHARS: usize = 200;

/// Make untrusted article text safe to print: drop escape sequences and
/// control characters, fold whitespace to single spaces and cap the length.
pub fn sanitize_for_terminal(s: &str) -> String {
    let stripped = match ESCAPES.as_ref() {
        Some(re) => re.replace_all(s, ""),
        None => Cow::Borrowed(s),
    };
    let mut out = String::with_capacity(stripped.len().min(MAX_CHARS));
    let mut pending_space = false;
    for ch in stripped.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if ch.is_control() {
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(ch);
    }
    match out.char_indices().nth(MAX_CHARS) {
        Some((cut, _)) => out[..cut].to_string(),
        None => out,
    }
}
