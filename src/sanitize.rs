use std::sync::LazyLock;

use regex::Regex;

pub const EMAIL_TOKEN: &str = "[email redacted]";
pub const PHONE_TOKEN: &str = "[phone redacted]";

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}").unwrap());

// 10+ digits, at most two separator chars between digits, optional leading
// + or (. Ranges like "120000 - 150000" stay intact.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\(?\d(?:[\s().-]{0,2}\d){9,}").unwrap());

/// Redact email- and phone-like substrings before text leaves the machine.
///
/// Emails go first so digits inside an address are never split off as a
/// phone number. The tokens contain neither `@` nor digits, so a second
/// pass finds nothing new.
pub fn sanitize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let without_emails = EMAIL_RE.replace_all(text, EMAIL_TOKEN);
    PHONE_RE.replace_all(&without_emails, PHONE_TOKEN).into_owned()
}
