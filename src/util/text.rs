use std::borrow::Cow;

/// Strips control characters from untrusted feed text.
///
/// Feed titles come from attacker-controlled XML and end up in log lines,
/// CSV cells, and terminal output, so escape sequences and other control
/// bytes are removed. Returns borrowed input on the common clean path.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|c| !c.is_control()).collect())
}
