//! Concrete HTML adapter (C4) backed by `scraper`.

mod extractor;

pub use extractor::ScraperHtmlExtractor;
