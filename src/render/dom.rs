//! Queryable snapshot of rendered HTML.

use super::Locator;
use crate::error::{NewsError, Result};
use scraper::{ElementRef, Html, Selector};

/// Parsed HTML with CSS, text, and structural lookups.
///
/// `scraper::Html` is not `Send`; build a `Dom`, pull owned data out of it,
/// and drop it before the next `.await`.
pub struct Dom {
    html: Html,
}

impl Dom {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// All elements matching a CSS selector, in document order.
    pub fn select_all(&self, css: &str) -> Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(css)?;
        Ok(self.html.select(&selector).collect())
    }

    /// First `tag` element whose whitespace-normalized text equals `text`.
    pub fn find_by_tag_text(&self, tag: &str, text: &str) -> Result<Option<ElementRef<'_>>> {
        let wanted = collapse_whitespace(text);
        Ok(self
            .select_all(tag)?
            .into_iter()
            .find(|el| visible_text(*el) == wanted))
    }

    /// First `tag` element whose text starts with `prefix`.
    pub fn find_by_text_prefix(&self, tag: &str, prefix: &str) -> Result<Option<ElementRef<'_>>> {
        Ok(self
            .select_all(tag)?
            .into_iter()
            .find(|el| visible_text(*el).starts_with(prefix)))
    }

    /// Whether `locator` matches anything in this snapshot.
    pub fn contains(&self, locator: &Locator) -> bool {
        let found = match locator {
            Locator::Css(css) => self.select_all(css).map(|els| !els.is_empty()),
            Locator::TagText { tag, text } => self.find_by_tag_text(tag, text).map(|el| el.is_some()),
            Locator::TextPrefix { tag, prefix } => {
                self.find_by_text_prefix(tag, prefix).map(|el| el.is_some())
            }
        };
        found.unwrap_or(false)
    }
}

pub fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|_| NewsError::Selector(css.to_string()))
}

/// Nearest ancestor of `el` with the given tag name.
pub fn ancestor<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|a| a.value().name() == tag)
}

/// First later sibling of `el` with the given tag name.
pub fn following_sibling<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|s| s.value().name() == tag)
}

/// Direct element children of `el` with the given tag name.
pub fn children<'a>(el: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == tag)
        .collect()
}

/// First descendant of `el` with the given tag name.
pub fn descendant<'a>(el: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|d| d.value().name() == tag)
}

/// Element text with runs of whitespace collapsed to one space.
pub fn visible_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
