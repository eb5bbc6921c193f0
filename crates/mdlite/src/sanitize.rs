use ammonia::Builder;

/// Clean a rendered fragment before it is embedded in an exported document.
///
/// The renderer already escapes everything it is given; this pass keeps the
/// export path safe regardless of where the fragment came from.
pub fn clean_fragment(html: &str) -> String {
    Builder::new().clean(html).to_string()
}
