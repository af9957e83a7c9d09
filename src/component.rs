//! Custom element packaging: wraps an exported SVG in a zero-dependency ES
//! module so it can be dropped into any page as `<blob-name></blob-name>`.

use std::path::Path;

use crate::error::{BlobError, Result};

/// Derive a custom element tag name from a preset path.
///
/// Leading digits and dashes are stripped; names without a hyphen get a
/// `blob-` prefix so the result is a valid custom element name.
pub fn derive_tag_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("shape");
    let cleaned = stem.trim_start_matches(|c: char| c.is_ascii_digit() || c == '-');
    let name = if cleaned.is_empty() { stem } else { cleaned };
    let name: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    if name.contains('-') && name.starts_with(|c: char| c.is_ascii_lowercase()) {
        name
    } else {
        format!("blob-{name}")
    }
}

/// Check the custom element naming rules we rely on.
pub fn validate_tag_name(tag: &str) -> Result<()> {
    let valid = tag.starts_with(|c: char| c.is_ascii_lowercase())
        && tag.contains('-')
        && !tag.ends_with('-')
        && tag
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(BlobError::invalid(
            "tag",
            format!("{tag:?} is not a valid custom element name"),
        ))
    }
}

/// Wrap `svg` in an ES module defining `<tag>`.
///
/// The element renders the SVG into its shadow root and sizes itself from
/// its `width`/`height` attributes, falling back to the SVG's own size.
pub fn wrap_web_component(svg: &str, tag: &str) -> Result<String> {
    validate_tag_name(tag)?;
    let markup = svg
        .trim()
        .replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${");
    let class_name = tag_to_class_name(tag);

    Ok(format!(
        r##"// {tag}.js, generated by blob-forge v{version}
// Usage:
//   <script type="module" src="./{tag}.js"></script>
//   <{tag} width="300" height="300"></{tag}>

const MARKUP = `{markup}`;

class {class_name} extends HTMLElement {{
  static get observedAttributes() {{
    return ['width', 'height'];
  }}

  constructor() {{
    super();
    this.attachShadow({{ mode: 'open' }});
  }}

  connectedCallback() {{
    this.shadowRoot.innerHTML =
      '<style>:host {{ display: inline-block; }} svg {{ width: 100%; height: 100%; display: block; }}</style>' +
      MARKUP;
    this._applySize();
  }}

  attributeChangedCallback() {{
    this._applySize();
  }}

  _applySize() {{
    const svg = this.shadowRoot.querySelector('svg');
    const w = this.getAttribute('width') || (svg && svg.getAttribute('width'));
    const h = this.getAttribute('height') || (svg && svg.getAttribute('height'));
    if (w) this.style.width = w + 'px';
    if (h) this.style.height = h + 'px';
  }}
}}

if (!customElements.get('{tag}')) {{
  customElements.define('{tag}', {class_name});
}}
export {{ {class_name} }};
export default {class_name};
"##,
        version = env!("CARGO_PKG_VERSION"),
    ))
}

/// "blob-hero" -> "BlobHero"
fn tag_to_class_name(tag: &str) -> String {
    tag.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_tag_name_various_inputs() {
        assert_eq!(derive_tag_name(Path::new("sunset-blob.json")), "sunset-blob");
        assert_eq!(derive_tag_name(Path::new("hero.json")), "blob-hero");
        assert_eq!(derive_tag_name(Path::new("presets/001-wave.json")), "blob-wave");
        assert_eq!(derive_tag_name(Path::new("My Shape.json")), "my-shape");
        // all digits
        assert_eq!(derive_tag_name(Path::new("123.json")), "blob-123");
    }

    #[test]
    fn tag_validation() {
        assert!(validate_tag_name("blob-hero").is_ok());
        assert!(validate_tag_name("x-1").is_ok());
        assert!(validate_tag_name("hero").is_err());
        assert!(validate_tag_name("Blob-Hero").is_err());
        assert!(validate_tag_name("1-blob").is_err());
        assert!(validate_tag_name("blob-").is_err());
    }

    #[test]
    fn module_defines_element() {
        let js = wrap_web_component("<svg width=\"10\"></svg>\n", "blob-hero").unwrap();
        assert!(js.contains("class BlobHero extends HTMLElement"));
        assert!(js.contains("customElements.define('blob-hero', BlobHero);"));
        assert!(js.contains("export default BlobHero;"));
        assert!(js.contains("return ['width', 'height'];"));
        assert!(js.contains("const MARKUP = `<svg width=\"10\"></svg>`;"));
    }

    #[test]
    fn markup_is_escaped_for_template_literal() {
        let js = wrap_web_component("<svg>`${x}`\\</svg>", "blob-x").unwrap();
        assert!(js.contains("<svg>\\`\\${x}\\`\\\\</svg>"));
        assert!(wrap_web_component("<svg/>", "nohyphen").is_err());
    }
}
