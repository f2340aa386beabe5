// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

//! Tolerant HTML text extraction and word counting.

use scraper::{ElementRef, Html};

/// Visible text of a document and its word count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub word_count: u32,
    pub text: String,
}

/// Extract the visible text of an HTML document and count its words.
///
/// Parsing is tolerant: malformed markup never fails, it just yields whatever
/// text the parser recovers. `<script>` and `<style>` subtrees are dropped
/// before counting. A word is a maximal non-whitespace run; adjacent
/// whitespace and linebreaks collapse to single separators.
pub fn extract(html: &str) -> ExtractedText {
    let document = Html::parse_document(html);

    let mut raw = String::new();
    collect_text(document.root_element(), &mut raw);

    let words: Vec<&str> = raw.split_whitespace().collect();
    ExtractedText {
        word_count: words.len() as u32,
        text: words.join(" "),
    }
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    let name = element.value().name();
    if name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style") {
        return;
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                out.push(' ');
                out.push_str(trimmed);
            }
        } else if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        }
    }
}
