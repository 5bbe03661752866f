//! Markup for the "Shop This Style" product widget.

use std::borrow::Cow;

use mpid_core::ProductRecord;

/// Hover-swap styling, inserted once in front of each filled container.
const WIDGET_STYLE: &str = r#"
<style type="text/css">
  .hoverable-image { position: relative; }
  .hoverable-image .main-image {
    opacity: 1;
    position: relative;
    transition: 0.2s ease all;
    z-index: 2;
  }
  .hoverable-image:hover .main-image { opacity: 0; }
  .hoverable-image .hover-image {
    left: 0;
    position: absolute;
    top: 0;
    z-index: 1;
  }
  .shot { display: inline-block; }
  @media (max-width: 992px) {
    .mpid-container .main-image { width: 50%; height: 50%; }
    .mpid-container .hover-image { width: 50%; height: 50%; }
  }
</style>"#;

/// Rendered widget: a style block for before the container and the
/// container's new inner content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Widget {
    pub style: String,
    pub content: String,
}

/// Render the widget for `record`, linking into `site_url`.
#[must_use]
pub fn render_widget(record: &ProductRecord, site_url: &str) -> Widget {
    let href = format!("{site_url}/products/{}", record.permalink);
    let hover_url = hover_image_url(&record.image_url);
    let label = escape_html(&record.label);
    let width = record.image_width;
    let height = record.image_height;

    let content = format!(
        r#"
<div class="mx-auto">
  <section class="mt-lg-5 mpid-margin" style="width: 100%">
    <div class="img-fluid d-flex justify-content-lg-center justify-content-xl-center"
         data-toggle="tooltip"
         data-bs-tooltip="Shop This Style"
         style="width: 100% !important; margin: auto;"
         title="Shop This Style Now">
      <div id="products_container_0">
        <div class="item">
          <a href="{href}" class="shot hoverable-image">
            <img class="main-image" src="{main}" alt="{label}" width="{width}" height="{height}" />
            <img class="hover-image" src="{hover}" alt="{label}" width="{width}" height="{height}" />
          </a>
          <div class="name">{label}<br/></div>
        </div>
      </div>
    </div>
  </section>
</div>"#,
        href = escape_html(&href),
        main = escape_html(&record.image_url),
        hover = escape_html(&hover_url),
    );

    Widget {
        style: WIDGET_STYLE.to_string(),
        content,
    }
}

/// Alternate shot URL: first `-2_` becomes `-6_`. URLs without the marker
/// come back unchanged.
#[must_use]
pub fn hover_image_url(image_url: &str) -> String {
    image_url.replacen("-2_", "-6_", 1)
}

fn escape_html(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}
