//! Element rewriting over a buffered HTML body with `lol_html`.
//!
//! Element handlers run synchronously, but filling a container needs a
//! catalog call. The rewrite is therefore split in two passes: [`count_matches`]
//! finds how many containers the document has, the caller resolves one lookup
//! per container, and [`inject_widgets`] applies the results in document
//! order. `HtmlRewriter` is not `Send`, so neither pass may be held across an
//! `.await`.

use std::cell::Cell;

use lol_html::html_content::ContentType;
use lol_html::{element, HtmlRewriter, Selector, Settings};
use thiserror::Error;

use crate::widget::Widget;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("invalid selector \"{selector}\": {reason}")]
    Selector { selector: String, reason: String },

    #[error("HTML rewriting failed: {0}")]
    Rewriting(#[from] lol_html::errors::RewritingError),
}

/// Number of elements in `html` matching `selector`.
///
/// # Errors
///
/// Returns [`RewriteError`] if the selector is invalid or parsing fails.
pub fn count_matches(html: &str, selector: &str) -> Result<usize, RewriteError> {
    validate_selector(selector)?;

    let matched = Cell::new(0usize);
    run_rewriter(
        html,
        Settings {
            element_content_handlers: vec![element!(selector, |_el| {
                matched.set(matched.get() + 1);
                Ok(())
            })],
            ..Settings::default()
        },
    )?;

    Ok(matched.get())
}

/// Fill the n-th element matching `selector` with `widgets[n]`.
///
/// A filled element gets the widget's style block inserted immediately before
/// it and its inner content replaced. Elements whose slot is `None`, or that
/// have no slot, are left as they are.
///
/// # Errors
///
/// Returns [`RewriteError`] if the selector is invalid or parsing fails.
pub fn inject_widgets(
    html: &str,
    selector: &str,
    widgets: &[Option<Widget>],
) -> Result<String, RewriteError> {
    validate_selector(selector)?;

    let next_slot = Cell::new(0usize);
    let settings = Settings {
        element_content_handlers: vec![element!(selector, |el| {
            let slot = next_slot.get();
            next_slot.set(slot + 1);
            if let Some(Some(widget)) = widgets.get(slot) {
                el.before(&widget.style, ContentType::Html);
                el.set_inner_content(&widget.content, ContentType::Html);
            }
            Ok(())
        })],
        ..Settings::default()
    };
    run_rewriter(html, settings)
}

/// `element!` unwraps the selector parse; check it first so a bad selector
/// surfaces as an error rather than a panic.
fn validate_selector(selector: &str) -> Result<(), RewriteError> {
    selector
        .parse::<Selector>()
        .map(|_| ())
        .map_err(|e| RewriteError::Selector {
            selector: selector.to_owned(),
            reason: e.to_string(),
        })
}

fn run_rewriter(html: &str, settings: Settings<'_, '_>) -> Result<String, RewriteError> {
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(settings, |chunk: &[u8]| {
        output.extend_from_slice(chunk);
    });
    rewriter.write(html.as_bytes())?;
    rewriter.end()?;
    Ok(String::from_utf8_lossy(&output).into_owned())
}
