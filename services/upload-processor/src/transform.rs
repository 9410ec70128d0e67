/// Uppercase text using the Unicode default case mapping.
///
/// The mapping is locale-independent and may change the length of the text
/// (`ß` becomes `SS`).
pub fn uppercase(text: &str) -> String {
    text.to_uppercase()
}

/// Key under which the processed form of `key` is stored
pub fn output_key(key: &str) -> String {
    format!("processed/{key}")
}
