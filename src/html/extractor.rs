//! The `scraper`-backed implementation of [`HtmlPort`] (C4).

use scraper::{Html, Selector};

use crate::domain::NormalizedUrl;
use crate::ports::html::{ExtractedLink, HtmlPort};

pub struct ScraperHtmlExtractor {
    link_selector: Selector,
}

impl Default for ScraperHtmlExtractor {
    fn default() -> Self {
        Self {
            link_selector: Selector::parse("a").expect("static selector is valid"),
        }
    }
}

impl HtmlPort for ScraperHtmlExtractor {
    fn extract_links(&self, html_bytes: &[u8], base_url: &str) -> Vec<ExtractedLink> {
        let html = String::from_utf8_lossy(html_bytes);
        let document = Html::parse_document(&html);

        let mut links = Vec::new();
        for element in document.select(&self.link_selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };

            if href.is_empty()
                || href.starts_with('#')
                || href.starts_with("javascript:")
                || href.starts_with("mailto:")
                || href.starts_with("tel:")
            {
                continue;
            }

            let Ok(url) = NormalizedUrl::parse(href, Some(base_url)) else {
                continue;
            };

            let anchor_text = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
            links.push(ExtractedLink { url, anchor_text });
        }
        links
    }
}
