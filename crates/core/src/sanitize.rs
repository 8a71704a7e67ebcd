//! Allow-list HTML sanitation and markup well-formedness checking.
//!
//! [`sanitize`] keeps only the tags and per-tag attributes named in a
//! [`SanitizePolicy`]; everything else is stripped, and the content of
//! `script`/`style` elements is dropped entirely. [`validate_markup`] is a
//! separate well-formedness gate that runs on the sanitized output.

use std::collections::{HashMap, HashSet};

use quick_xml::events::Event;
use quick_xml::Reader;

/// Elements whose content is removed together with the tag itself.
const CONTENT_STRIPPED_TAGS: &[&str] = &["script", "style"];

/// Synthetic root element used by [`validate_markup`].
const SYNTHETIC_ROOT: &str = "quill-root";

/// Allowed tags and attributes for comment text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanitizePolicy {
    pub allowed_tags: HashSet<String>,
    pub allowed_attributes: HashMap<String, HashSet<String>>,
}

impl SanitizePolicy {
    /// Policy that strips every tag, keeping text only.
    pub fn text_only() -> Self {
        Self::default()
    }

    /// The policy applied to submitted comments: `<a href title>`, `<code>`,
    /// `<i>` and `<strong>`.
    pub fn comment_default() -> Self {
        let allowed_tags = ["a", "code", "i", "strong"]
            .into_iter()
            .map(String::from)
            .collect();
        let allowed_attributes = HashMap::from([(
            "a".to_string(),
            ["href", "title"].into_iter().map(String::from).collect(),
        )]);
        Self {
            allowed_tags,
            allowed_attributes,
        }
    }
}

/// Strip all markup not permitted by `policy`. Never fails.
pub fn sanitize(raw: &str, policy: &SanitizePolicy) -> String {
    // ammonia refuses a tag that is both allowed and content-stripped.
    let tags: HashSet<&str> = policy
        .allowed_tags
        .iter()
        .map(String::as_str)
        .filter(|t| !CONTENT_STRIPPED_TAGS.contains(t))
        .collect();

    let tag_attributes: HashMap<&str, HashSet<&str>> = policy
        .allowed_attributes
        .iter()
        .filter(|(tag, _)| tags.contains(tag.as_str()))
        .map(|(tag, attrs)| (tag.as_str(), attrs.iter().map(String::as_str).collect()))
        .collect();

    ammonia::Builder::default()
        .tags(tags)
        .tag_attributes(tag_attributes)
        .generic_attributes(HashSet::new())
        .link_rel(None)
        .clean_content_tags(CONTENT_STRIPPED_TAGS.iter().copied().collect())
        .clean(raw)
        .to_string()
}

/// Check that `text` parses as well-formed markup once wrapped in a single
/// synthetic root element.
pub fn validate_markup(text: &str) -> bool {
    let wrapped = format!("<{SYNTHETIC_ROOT}>{text}</{SYNTHETIC_ROOT}>");
    let mut reader = Reader::from_str(&wrapped);
    let mut depth: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => depth += 1,
            Ok(Event::End(_)) => {
                if depth == 0 {
                    return false;
                }
                depth -= 1;
            }
            Ok(Event::Eof) => return depth == 0,
            Ok(_) => {}
            Err(_) => return false,
        }
    }
}
