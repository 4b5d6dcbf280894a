use rand::Rng;

const NAME_LEN: usize = 40;
const ALPHANUMERIC: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const FALLBACK_MIME: &str = "application/octet-stream";

/// Random storage name for `content`: 40 alphanumeric characters, plus the
/// extension `infer` recognizes from the bytes, if any.
///
/// The client's filename plays no part, so two uploads called `photo.jpg`
/// never land on the same key.
pub fn hash_name(content: &[u8]) -> String {
    let mut rng = rand::thread_rng();
    let stem: String = (0..NAME_LEN)
        .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char)
        .collect();
    match infer::get(content) {
        Some(kind) if !kind.extension().is_empty() => format!("{stem}.{}", kind.extension()),
        _ => stem,
    }
}

/// MIME type sniffed from the content, or `application/octet-stream`.
pub fn sniff_mime(content: &[u8]) -> &'static str {
    infer::get(content)
        .map(|kind| kind.mime_type())
        .unwrap_or(FALLBACK_MIME)
}

/// MIME type recorded for a stored file. What the bytes say wins; the
/// client-declared type, stripped of parameters, only covers content `infer`
/// does not recognise.
pub(crate) fn content_mime(content: &[u8], declared: Option<&str>) -> String {
    if let Some(kind) = infer::get(content) {
        return kind.mime_type().to_string();
    }
    declared
        .and_then(|d| d.split(';').next())
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| FALLBACK_MIME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn name_is_forty_alphanumerics_without_known_content() {
        let name = hash_name(b"plain words");
        assert_eq!(name.len(), NAME_LEN);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn extension_comes_from_content() {
        let name = hash_name(PNG);
        let (stem, ext) = name.split_once('.').unwrap();
        assert_eq!(stem.len(), NAME_LEN);
        assert_eq!(ext, "png");
    }

    #[test]
    fn names_do_not_repeat() {
        assert_ne!(hash_name(b"same"), hash_name(b"same"));
    }

    #[test]
    fn sniffed_mime_falls_back() {
        assert_eq!(sniff_mime(PNG), "image/png");
        assert_eq!(sniff_mime(b"hello"), "application/octet-stream");
        assert_eq!(sniff_mime(&[]), "application/octet-stream");
    }

    #[test]
    fn content_beats_declared_mime() {
        assert_eq!(content_mime(PNG, Some("text/html; charset=utf-8")), "image/png");
        assert_eq!(content_mime(b"hello", Some("Text/Plain; charset=utf-8")), "text/plain");
        assert_eq!(content_mime(b"hello", Some("")), "application/octet-stream");
        assert_eq!(content_mime(b"hello", None), "application/octet-stream");
    }
}
