use std::collections::HashMap;
use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::clean;

static TITLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").unwrap());
static BODY_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());
static META_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta").unwrap());
static JSONLD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

/// Elements whose text is never rendered.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Rendered text under `el`, whitespace-collapsed. Text inside hidden
/// elements is skipped.
fn visible_text(el: ElementRef<'_>) -> String {
    let parts: Vec<&str> = el
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| HIDDEN_TAGS.contains(&e.name()))
            });
            (!hidden).then_some(&**text)
        })
        .collect();
    clean(&parts.join(" "))
}

/// Read-only view of a page, as seen by the extractors.
pub trait PageSignal {
    /// Cleaned text of the first element matching `selector`.
    fn text_by_selector(&self, selector: &str) -> Option<String>;
    fn attr_by_selector(&self, selector: &str, attr: &str) -> Option<String>;
    /// `<meta name=key>` or `<meta property=key>` content.
    fn meta(&self, key: &str) -> Option<String>;
    fn body_text(&self) -> String;
    fn document_title(&self) -> String;
    /// Raw JSON-LD script bodies in document order.
    fn structured_blocks(&self) -> Vec<String>;
    fn url(&self) -> String;

    /// True when none of the page-level signals carry anything. Pages that
    /// only answer selector queries should override this.
    fn is_empty(&self) -> bool {
        self.structured_blocks().is_empty()
            && self.body_text().trim().is_empty()
            && self.document_title().trim().is_empty()
            && self.meta("og:title").is_none()
            && self.meta("og:site_name").is_none()
    }
}

/// A parsed HTML document.
pub struct HtmlPage {
    document: Html,
    url: String,
}

impl HtmlPage {
    pub fn parse(html: &str, url: impl Into<String>) -> Self {
        Self {
            document: Html::parse_document(html),
            url: url.into(),
        }
    }

    fn first_match(&self, selector: &str) -> Option<scraper::ElementRef<'_>> {
        // Unparseable selectors count as "no match".
        let sel = Selector::parse(selector).ok()?;
        self.document.select(&sel).next()
    }
}

impl PageSignal for HtmlPage {
    fn text_by_selector(&self, selector: &str) -> Option<String> {
        let el = self.first_match(selector)?;
        let text = visible_text(el);
        (!text.is_empty()).then_some(text)
    }

    fn attr_by_selector(&self, selector: &str, attr: &str) -> Option<String> {
        let el = self.first_match(selector)?;
        el.value().attr(attr).map(clean).filter(|v| !v.is_empty())
    }

    fn meta(&self, key: &str) -> Option<String> {
        let lookup = |attr: &str| {
            self.document.select(&META_SEL).find_map(|el| {
                let v = el.value();
                if v.attr(attr)? == key {
                    v.attr("content").map(clean).filter(|c| !c.is_empty())
                } else {
                    None
                }
            })
        };
        lookup("name").or_else(|| lookup("property"))
    }

    fn body_text(&self) -> String {
        self.document
            .select(&BODY_SEL)
            .next()
            .map(visible_text)
            .unwrap_or_default()
    }

    fn document_title(&self) -> String {
        self.document
            .select(&TITLE_SEL)
            .next()
            .map(|el| clean(&el.text().collect::<String>()))
            .unwrap_or_default()
    }

    fn structured_blocks(&self) -> Vec<String> {
        self.document
            .select(&JSONLD_SEL)
            .map(|el| el.text().collect::<String>())
            .collect()
    }

    fn url(&self) -> String {
        self.url.clone()
    }
}

/// In-memory page built from individual signals.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    pub url: String,
    pub title: String,
    pub body: String,
    pub blocks: Vec<String>,
    pub selectors: HashMap<String, String>,
    pub attrs: HashMap<(String, String), String>,
    pub metas: HashMap<String, String>,
}

impl StaticPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn with_block(mut self, block: &str) -> Self {
        self.blocks.push(block.to_string());
        self
    }

    pub fn with_text(mut self, selector: &str, text: &str) -> Self {
        self.selectors.insert(selector.to_string(), text.to_string());
        self
    }

    pub fn with_attr(mut self, selector: &str, attr: &str, value: &str) -> Self {
        self.attrs
            .insert((selector.to_string(), attr.to_string()), value.to_string());
        self
    }

    pub fn with_meta(mut self, key: &str, content: &str) -> Self {
        self.metas.insert(key.to_string(), content.to_string());
        self
    }
}

impl PageSignal for StaticPage {
    fn text_by_selector(&self, selector: &str) -> Option<String> {
        self.selectors
            .get(selector)
            .map(|t| clean(t))
            .filter(|t| !t.is_empty())
    }

    fn attr_by_selector(&self, selector: &str, attr: &str) -> Option<String> {
        self.attrs
            .get(&(selector.to_string(), attr.to_string()))
            .map(|t| clean(t))
            .filter(|t| !t.is_empty())
    }

    fn meta(&self, key: &str) -> Option<String> {
        self.metas
            .get(key)
            .map(|t| clean(t))
            .filter(|t| !t.is_empty())
    }

    fn body_text(&self) -> String {
        clean(&self.body)
    }

    fn document_title(&self) -> String {
        clean(&self.title)
    }

    fn structured_blocks(&self) -> Vec<String> {
        self.blocks.clone()
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn is_empty(&self) -> bool {
        self.blocks.is_empty()
            && self.body.trim().is_empty()
            && self.title.trim().is_empty()
            && self.selectors.values().all(|v| v.trim().is_empty())
            && self.attrs.values().all(|v| v.trim().is_empty())
            && self.metas.values().all(|v| v.trim().is_empty())
    }
}
