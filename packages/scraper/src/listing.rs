//! Listing-page parsing.
//!
//! The police department's "Calls and Arrests" page lists each daily log
//! as an `<option>` in a `<select>`, whose value points at the PDF. Plain
//! `<a href="...pdf">` links are accepted too.

use reqwest::Url;
use scraper::{Html, Selector};

use crate::ScrapeError;

/// A downloadable police-log PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfLink {
    /// Local filename, always ending in `.pdf`.
    pub filename: String,
    /// Absolute download URL.
    pub url: Url,
}

/// Extracts every PDF link from a listing page, in document order,
/// options first. Duplicate filenames keep their first occurrence.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] if a built-in CSS selector fails to
/// parse.
pub fn parse_listing(html: &str, base: &Url) -> Result<Vec<PdfLink>, ScrapeError> {
    let document = Html::parse_document(html);
    let option_sel = parse_selector("select option")?;
    let anchor_sel = parse_selector("a[href]")?;

    let mut links: Vec<PdfLink> = Vec::new();
    let mut push = |link: PdfLink| {
        if !links.iter().any(|l| l.filename == link.filename) {
            links.push(link);
        }
    };

    for option in document.select(&option_sel) {
        let text = option.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() || text.contains("Select") {
            continue;
        }

        let Some(value) = option.value().attr("value").map(str::trim).filter(|v| !v.is_empty())
        else {
            log::debug!("Listing option '{text}' has no value; skipping");
            continue;
        };

        match base.join(value) {
            Ok(url) => push(PdfLink {
                filename: pdf_filename(text),
                url,
            }),
            Err(e) => log::warn!("Listing option '{text}' has invalid URL '{value}': {e}"),
        }
    }

    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !href.to_ascii_lowercase().ends_with(".pdf") {
            continue;
        }
        let Ok(url) = base.join(href) else {
            log::warn!("Listing link has invalid URL '{href}'");
            continue;
        };
        let Some(name) = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };
        push(PdfLink {
            filename: pdf_filename(&name.replace("%20", " ")),
            url,
        });
    }

    log::debug!("Found {} PDF link(s) on listing page", links.len());
    Ok(links)
}

/// Turns a listing label into a safe local filename ending in `.pdf`.
#[must_use]
pub fn pdf_filename(label: &str) -> String {
    let name = label.trim().replace(['/', '\\'], "-");
    if name.to_ascii_lowercase().ends_with(".pdf") {
        name
    } else {
        format!("{name}.pdf")
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://police.example.edu/docs/reports/Calls_and_Arrests.asp").unwrap()
    }

    #[test]
    fn options_become_links() {
        let html = r#"
            <select name="reports">
              <option value="">Select a date</option>
              <option value="CallsForService/January 5, 2024.pdf">January 5, 2024</option>
              <option value="CallsForService/January 4, 2024.pdf"> January 4, 2024 </option>
              <option value="x.pdf">   </option>
            </select>"#;
        let links = parse_listing(html, &base()).unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].filename, "January 5, 2024.pdf");
        assert_eq!(
            links[0].url.as_str(),
            "https://police.example.edu/docs/reports/CallsForService/January%205,%202024.pdf"
        );
        assert_eq!(links[1].filename, "January 4, 2024.pdf");
    }

    #[test]
    fn pdf_anchors_become_links() {
        let html = r#"
            <a href="/about.html">About</a>
            <a href="logs/2024-01-05.PDF">Latest</a>"#;
        let links = parse_listing(html, &base()).unwrap();

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].filename, "2024-01-05.PDF");
        assert_eq!(
            links[0].url.as_str(),
            "https://police.example.edu/docs/reports/logs/2024-01-05.PDF"
        );
    }

    #[test]
    fn duplicate_filenames_keep_first() {
        let html = r#"
            <select><option value="a/Log.pdf">Log.pdf</option></select>
            <a href="b/Log.pdf">again</a>"#;
        let links = parse_listing(html, &base()).unwrap();
        assert_eq!(links.len(), 1);
        assert!(links[0].url.as_str().ends_with("/a/Log.pdf"));
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(pdf_filename("1/5/2024"), "1-5-2024.pdf");
        assert_eq!(pdf_filename(" report.pdf "), "report.pdf");
    }
}
