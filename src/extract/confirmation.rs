pub const CONFIRMATION_PHRASES: &[&str] = &[
    "application submitted",
    "application received",
    "thank you for applying",
    "thanks for applying",
    "we received your application",
    "we've received your application",
    "your application has been submitted",
    "your application has been received",
];

/// True if the page text contains any confirmation phrase.
pub fn looks_like_confirmation(body_text: &str) -> bool {
    let body = body_text.to_lowercase();
    CONFIRMATION_PHRASES.iter().any(|p| body.contains(p))
}
