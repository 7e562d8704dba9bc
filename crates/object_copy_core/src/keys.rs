pub const DESTINATION_KEY_PREFIX: &str = "resized-";

/// Decodes an object key as it appears in an event notification.
///
/// Keys arrive form-encoded: `+` stands for a space and reserved characters
/// are written as `%XX`. Decoded bytes that are not valid UTF-8 are replaced
/// with U+FFFD and malformed escapes are kept as written.
pub fn decode_object_key(encoded: &str) -> String {
    let spaced = encoded.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// The prefix is applied unconditionally, even to keys that already carry it.
pub fn destination_key(decoded_source_key: &str) -> String {
    format!("{DESTINATION_KEY_PREFIX}{decoded_source_key}")
}

/// Renders `bucket/key` for a server-side copy. Each key segment is
/// percent-encoded; the `/` separators are kept as written.
pub fn copy_source(bucket: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    format!("{bucket}/{encoded_key}")
}
