use triage_protocol::ErrorType;

/// Ordered phrase table. The first bucket with a matching phrase wins, so more specific
/// element-state failures sit ahead of timeouts, and timeouts ahead of assertions (a timeout
/// message routinely contains "expected").
const ERROR_TYPE_RULES: &[(ErrorType, &[&str])] = &[
    (
        ErrorType::ElementNotFound,
        &[
            "element not found",
            "unable to find",
            "could not find",
            "cannot find",
            "can't find",
            "failed to find",
            "never found",
            "no elements found",
            "does not exist",
        ],
    ),
    (
        ErrorType::ElementNotVisible,
        &[
            "not visible",
            "is hidden",
            "visibility: hidden",
            "display: none",
            "effective width and height",
        ],
    ),
    (
        ErrorType::ElementCovered,
        &[
            "is being covered",
            "covered by another element",
            "covered by",
            "pointer-events: none",
            "obscured",
        ],
    ),
    (
        ErrorType::ElementDetached,
        &["detached from the dom", "detached", "stale element"],
    ),
    (
        ErrorType::InvalidElementType,
        &[
            "can only be called on",
            "valid typeable element",
            "not a typeable element",
            "invalid element type",
            "cannot be typed into",
            "requires a dom element",
        ],
    ),
    (ErrorType::Timeout, &["timed out", "timeout", "time out"]),
    (ErrorType::AssertionFailed, &["assertion", "assert", "expected"]),
    (
        ErrorType::NetworkError,
        &[
            "network",
            "econnrefused",
            "econnreset",
            "enotfound",
            "socket hang up",
            "failed to fetch",
            "fetch failed",
            "cy.request()",
            "status code",
            "xhr",
        ],
    ),
];

/// Label the root cause of a failure message.
#[must_use]
pub fn classify_error_type(message: &str) -> ErrorType {
    let lowered = message.to_lowercase();
    if lowered.trim().is_empty() {
        return ErrorType::Unknown;
    }

    ERROR_TYPE_RULES
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|phrase| lowered.contains(phrase)))
        .map_or(ErrorType::Unknown, |(kind, _)| *kind)
}
