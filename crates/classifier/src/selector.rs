use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// One step of the selector cascade.
pub trait SelectorMatcher: Send + Sync {
    fn name(&self) -> &str;

    /// Return a selector if this matcher recognizes one in `text`.
    fn attempt(&self, text: &str) -> Option<String>;
}

type Extract = fn(&Captures<'_>) -> Option<String>;

/// Regex plus a function that turns its captures into a canonical selector string.
pub struct PatternMatcher {
    name: String,
    regex: Regex,
    extract: Extract,
}

impl PatternMatcher {
    pub fn new(name: impl Into<String>, pattern: &str, extract: Extract) -> Self {
        Self {
            name: name.into(),
            regex: Regex::new(pattern).expect("selector pattern must compile"),
            extract,
        }
    }
}

impl SelectorMatcher for PatternMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn attempt(&self, text: &str) -> Option<String> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| (self.extract)(&caps))
            .map(|selector| selector.trim().to_string())
            .find(|selector| !selector.is_empty())
    }
}

fn whole(caps: &Captures<'_>) -> Option<String> {
    caps.get(0).map(|m| m.as_str().to_string())
}

fn first_group(caps: &Captures<'_>) -> Option<String> {
    caps.get(1).map(|m| m.as_str().to_string())
}

/// Attributes that are stable enough to be worth a dedicated matcher, most useful first.
const SPECIFIC_ATTRIBUTES: &[&str] = &["data-testid", "data-test", "aria-label", "alt", "type"];

/// Ordered list of matchers; the first non-empty result wins.
pub struct SelectorCascade {
    matchers: Vec<Box<dyn SelectorMatcher>>,
}

impl SelectorCascade {
    pub fn new(matchers: Vec<Box<dyn SelectorMatcher>>) -> Self {
        Self { matchers }
    }

    /// The cascade used for test failure messages: framework selector syntax first, then
    /// selectors rebuilt from HTML dumps, then bare CSS tokens.
    pub fn standard() -> Self {
        let mut matchers: Vec<Box<dyn SelectorMatcher>> = Vec::new();

        // tag[attr="value"]
        matchers.push(Box::new(PatternMatcher::new(
            "compound_attribute",
            r#"[a-zA-Z][\w-]*\[[\w:-]+=(?:"[^"]*"|'[^']*')\]"#,
            whole,
        )));

        for attr in SPECIFIC_ATTRIBUTES {
            let escaped = regex::escape(attr);
            matchers.push(Box::new(PatternMatcher::new(
                format!("{attr}_double_quoted"),
                &format!(r#"\[{escaped}="[^"]*"\]"#),
                whole,
            )));
            matchers.push(Box::new(PatternMatcher::new(
                format!("{attr}_single_quoted"),
                &format!(r"\[{escaped}='[^']*'\]"),
                whole,
            )));
        }

        matchers.push(Box::new(PatternMatcher::new(
            "generic_attribute",
            r#"\[[\w:-]+[~|^$*]?=(?:"[^"]*"|'[^']*'|[^\]\s"']+)\]"#,
            whole,
        )));

        // Inline HTML, e.g. `<button data-testid="save" class="btn">`.
        matchers.push(Box::new(PatternMatcher::new(
            "html_data_testid",
            r#"<[a-zA-Z][\w-]*[^>]*?\sdata-testid=["']([^"']+)["']"#,
            |caps| first_group(caps).map(|v| format!(r#"[data-testid="{v}"]"#)),
        )));
        matchers.push(Box::new(PatternMatcher::new(
            "html_data_test",
            r#"<[a-zA-Z][\w-]*[^>]*?\sdata-test=["']([^"']+)["']"#,
            |caps| first_group(caps).map(|v| format!(r#"[data-test="{v}"]"#)),
        )));
        matchers.push(Box::new(PatternMatcher::new(
            "html_id",
            r#"<[a-zA-Z][\w-]*[^>]*?\sid=["']([^"'\s]+)["']"#,
            |caps| first_group(caps).map(|v| format!("#{v}")),
        )));
        matchers.push(Box::new(PatternMatcher::new(
            "html_class",
            r#"<[a-zA-Z][\w-]*[^>]*?\sclass=["']([^"']+)["']"#,
            |caps| {
                first_group(caps)?
                    .split_whitespace()
                    .next()
                    .map(|class| format!(".{class}"))
            },
        )));
        // Cypress prints elements as `<input#email.form-control>`.
        matchers.push(Box::new(PatternMatcher::new(
            "html_tag_id",
            r"<([a-zA-Z][\w-]*)#([\w-]+)",
            |caps| Some(format!("{}#{}", caps.get(1)?.as_str(), caps.get(2)?.as_str())),
        )));

        matchers.push(Box::new(PatternMatcher::new(
            "html_tag_class_chain",
            r"<([a-zA-Z][\w-]*)((?:\.[\w-]+)+)",
            |caps| Some(format!("{}{}", caps.get(1)?.as_str(), caps.get(2)?.as_str())),
        )));
        matchers.push(Box::new(PatternMatcher::new(
            "html_form_control",
            r#"<(input|select|textarea|button)\b[^>]*?\s(name|type|placeholder)=["']([^"']+)["']"#,
            |caps| {
                Some(format!(
                    r#"{}[{}="{}"]"#,
                    caps.get(1)?.as_str(),
                    caps.get(2)?.as_str(),
                    caps.get(3)?.as_str()
                ))
            },
        )));

        matchers.push(Box::new(PatternMatcher::new(
            "backticked_css",
            r"`([#.\[][^`\s][^`]*)`",
            first_group,
        )));
        matchers.push(Box::new(PatternMatcher::new(
            "css_chain",
            r#"(?:^|[\s'"(,:])((?:[#.][a-zA-Z_][\w-]*)(?:\s*>?\s*[#.][a-zA-Z_][\w-]*)*)"#,
            first_group,
        )));

        Self::new(matchers)
    }

    pub fn matchers(&self) -> impl Iterator<Item = &dyn SelectorMatcher> {
        self.matchers.iter().map(|m| &**m)
    }

    pub fn extract(&self, text: &str) -> Option<String> {
        self.extract_with_source(text).map(|(_, selector)| selector)
    }

    /// Like [`Self::extract`] but also names the matcher that produced the selector.
    pub fn extract_with_source(&self, text: &str) -> Option<(&str, String)> {
        self.matchers
            .iter()
            .find_map(|matcher| matcher.attempt(text).map(|s| (matcher.name(), s)))
    }
}

static STANDARD_CASCADE: Lazy<SelectorCascade> = Lazy::new(SelectorCascade::standard);

/// Pull the most useful DOM/CSS selector out of a failure message.
#[must_use]
pub fn extract_selector(text: &str) -> Option<String> {
    STANDARD_CASCADE.extract(text)
}
