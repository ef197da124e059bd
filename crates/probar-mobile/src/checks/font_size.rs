//! Font size readability.
//!
//! Flags visible text rendered below the configured pixel threshold. Only the
//! outermost offending element of a subtree is reported.

use super::{CheckOutcome, Evidence};
use crate::config::FontSizeConfig;
use crate::dom::{
    fetch_markup, parse_css_float, parse_css_int, DomSnapshot, ElementSnapshot, Occlusion,
    SnapshotScope, TextSample,
};
use crate::driver::PageDriver;
use crate::result::AuditResult;

/// Tags that are conventionally small
pub const EXEMPT_TAGS: [&str; 3] = ["cufon", "sup", "sub"];

/// Ancestors that exempt their whole subtree
const SCRIPT_TAGS: [&str; 2] = ["sup", "sub"];

/// Elements that render text without text content
const FORM_TAGS: [&str; 3] = ["input", "select", "textarea"];

/// Indices of the elements whose text is too small to read
#[must_use]
pub fn find_small_text(snapshot: &DomSnapshot, config: &FontSizeConfig) -> Vec<usize> {
    let mut accepted: Vec<usize> = Vec::new();

    for (index, element) in snapshot.elements.iter().enumerate() {
        if !is_unreadable(snapshot, index, element, config) {
            continue;
        }

        if accepted
            .iter()
            .any(|&outer| snapshot.contains(outer, index))
        {
            continue;
        }

        accepted.push(index);
    }

    accepted
}

fn is_unreadable(
    snapshot: &DomSnapshot,
    index: usize,
    element: &ElementSnapshot,
    config: &FontSizeConfig,
) -> bool {
    let Some(size) = element.font_size.as_deref().and_then(parse_css_float) else {
        return false;
    };
    if size >= config.min_px {
        return false;
    }

    let tag = element.tag.as_str();
    if EXEMPT_TAGS.contains(&tag) {
        return false;
    }

    // Text pushed off-screen with a large indent is an accessible label
    let indent = element.text_indent.as_deref().and_then(parse_css_int);
    if let (Some(indent), Some(width)) = (indent, element.offset_width) {
        if indent.abs() > width {
            return false;
        }
    }

    if element.has_empty_box()
        || (!element.is_root() && !element.has_offset_parent)
        || element.display == "none"
        || element.is_transparent()
    {
        return false;
    }

    // Excluded terms are matched in the page, see `SnapshotScope::Text`
    match element.text {
        Some(TextSample::Readable) => {}
        Some(TextSample::Excluded) => return false,
        Some(TextSample::Empty) | None => {
            if !FORM_TAGS.contains(&tag) {
                return false;
            }
        }
    }

    !snapshot
        .ancestors(index)
        .any(|(_, ancestor)| {
            Occlusion::TEXT.hides(ancestor) || SCRIPT_TAGS.contains(&ancestor.tag.as_str())
        })
}

/// Scan the current page for unreadable text
pub async fn scan<D>(driver: &mut D, config: &FontSizeConfig) -> AuditResult<CheckOutcome>
where
    D: PageDriver + ?Sized,
{
    let scope = SnapshotScope::Text {
        threshold_px: config.min_px,
        excluded_terms: &config.excluded_terms,
    };
    let snapshot = DomSnapshot::capture(driver, scope).await?;
    let accepted = find_small_text(&snapshot, config);
    let markup = fetch_markup(driver, &accepted).await?;

    let evidence = accepted
        .iter()
        .zip(markup.into_iter().chain(std::iter::repeat(None)))
        .map(|(&index, html)| {
            Evidence::Markup(html.unwrap_or_else(|| {
                snapshot
                    .get(index)
                    .map_or_else(String::new, |element| format!("<{}>", element.tag))
            }))
        })
        .collect();

    Ok(CheckOutcome::from_evidence(evidence))
}
