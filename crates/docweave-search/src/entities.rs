//! Minimal HTML entity decoding for the streaming walk.

/// Decode one entity reference (the name between `&` and `;`).
///
/// Named entities outside the small set used by rendered documentation
/// pages are kept literal rather than dropped.
pub(crate) fn decode_entity(name: &str) -> String {
    match name {
        "amp" => "&".to_owned(),
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "quot" => "\"".to_owned(),
        "apos" => "'".to_owned(),
        "nbsp" => " ".to_owned(),
        // Pilcrow permalink markers carry no searchable text.
        "para" => String::new(),
        _ => decode_numeric(name).unwrap_or_else(|| format!("&{name};")),
    }
}

fn decode_numeric(name: &str) -> Option<String> {
    let digits = name.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse().ok()?
    };
    char::from_u32(code).map(String::from)
}
