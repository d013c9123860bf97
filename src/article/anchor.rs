/// Drop a trailing same-page anchor from a URL.
///
/// Scans backwards from the end: a `#` cuts the URL there, while a `!` or `/`
/// seen first leaves it untouched, so hash-bang routes like `/#!/path` survive.
/// The first character is never inspected. Empty input yields `None`.
pub fn strip_anchor(url: Option<&str>) -> Option<&str> {
    let url = url.filter(|u| !u.is_empty())?;
    let bytes = url.as_bytes();
    for i in (1..bytes.len()).rev() {
        match bytes[i] {
            b'#' => return Some(&url[..i]),
            b'!' | b'/' => break,
            _ => {}
        }
    }
    Some(url)
}
