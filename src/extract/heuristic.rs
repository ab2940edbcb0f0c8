use crate::page::PageSignal;

use super::{Fields, COMPANY_MAX, LOCATION_MAX, TITLE_MAX};

/// One structural hint: where on the page a field might live.
#[derive(Debug, Clone, Copy)]
pub enum Hint {
    Text(&'static str),
    Attr(&'static str, &'static str),
}

impl Hint {
    fn lookup(&self, page: &dyn PageSignal) -> Option<String> {
        match *self {
            Hint::Text(sel) => page.text_by_selector(sel),
            Hint::Attr(sel, attr) => page.attr_by_selector(sel, attr),
        }
    }
}

pub const TITLE_HINTS: &[Hint] = &[
    Hint::Text("h1"),
    Hint::Text("[data-test='job-title']"),
    Hint::Text("[data-testid='job-title']"),
    Hint::Text(".jobsearch-JobInfoHeader-title"),
    Hint::Text(".topcard__title"),
    Hint::Text(".jobs-unified-top-card__job-title"),
    Hint::Attr("[data-job-title]", "data-job-title"),
];

pub const COMPANY_HINTS: &[Hint] = &[
    Hint::Text("[data-test='employer-name']"),
    Hint::Text("[data-testid='company-name']"),
    Hint::Text(".topcard__org-name-link"),
    Hint::Text(".jobs-unified-top-card__company-name"),
    Hint::Text(".jobsearch-InlineCompanyRating div:first-child"),
    Hint::Attr("[data-company-name]", "data-company-name"),
];

pub const LOCATION_HINTS: &[Hint] = &[
    Hint::Text("[data-test='location']"),
    Hint::Text("[data-testid='job-location']"),
    Hint::Text("[data-testid='inlineHeader-companyLocation']"),
    Hint::Text(".topcard__flavor--bullet"),
    Hint::Text(".jobs-unified-top-card__bullet"),
    Hint::Text(".job-location"),
    Hint::Attr("[data-job-location]", "data-job-location"),
];

/// First hint yielding a non-empty value of at most `max` chars.
pub fn first_match(page: &dyn PageSignal, hints: &[Hint], max: usize) -> Option<String> {
    hints
        .iter()
        .filter_map(|h| h.lookup(page))
        .find(|v| !v.is_empty() && v.chars().count() <= max)
}

/// Selectors, then metadata tags, then the document title. Later stages
/// only fill what earlier ones left empty.
pub fn locate_fields(page: &dyn PageSignal) -> Fields {
    let mut job_title = first_match(page, TITLE_HINTS, TITLE_MAX).unwrap_or_default();
    let mut company = first_match(page, COMPANY_HINTS, COMPANY_MAX).unwrap_or_default();
    let location = first_match(page, LOCATION_HINTS, LOCATION_MAX).unwrap_or_default();

    if job_title.is_empty() {
        if let Some(og_title) = page.meta("og:title") {
            job_title = before_separator(&og_title);
        }
    }
    if company.is_empty() {
        if let Some(site) = page.meta("og:site_name") {
            if site.chars().count() <= COMPANY_MAX {
                company = site;
            }
        }
    }

    if job_title.is_empty() || company.is_empty() {
        let (title_part, company_part) = split_document_title(&page.document_title());
        if job_title.is_empty() {
            job_title = title_part;
        }
        if company.is_empty() {
            company = company_part;
        }
    }

    Fields::bounded(&job_title, &company, &location)
}

/// Text before the first `|` or `-`.
fn before_separator(s: &str) -> String {
    s.split(['|', '-']).next().unwrap_or_default().trim().to_string()
}

/// "Role - Company | Site" → ("Role", "Company").
pub fn split_document_title(title: &str) -> (String, String) {
    let head = title.split('|').next().unwrap_or_default();
    let mut dash_parts = head.split(" - ").map(str::trim);
    let job_title = dash_parts.next().unwrap_or_default().to_string();
    let company = dash_parts.next().unwrap_or_default().to_string();
    (job_title, company)
}
