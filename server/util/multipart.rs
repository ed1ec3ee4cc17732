/// One part of a `multipart/form-data` body.
#[derive(Debug, PartialEq)]
pub struct Part<'a> {
    /// `name="..."` from Content-Disposition.
    pub name: Option<String>,
    /// `filename="..."` from Content-Disposition; only file parts carry it.
    pub filename: Option<String>,
    pub data: &'a [u8],
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    let mime = content_type.split(';').next()?.trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }
    header_params(content_type.split_once(';')?.1)
        .into_iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("boundary"))
        .map(|(_, v)| v)
        .filter(|b| !b.is_empty())
}

/// Splits a multipart body into its parts. Parts without a header/body
/// separator (preamble, closing `--`) are skipped.
pub fn parse_parts<'a>(body: &'a [u8], boundary: &str) -> Vec<Part<'a>> {
    let delimiter = format!("--{}", boundary);
    let sep = b"\r\n\r\n";

    split_on(body, delimiter.as_bytes())
        .into_iter()
        .filter_map(|part| {
            let sep_pos = find_subsequence(part, sep)?;
            let headers = String::from_utf8_lossy(&part[..sep_pos]);
            let disposition = headers
                .lines()
                .find(|l| l.to_ascii_lowercase().starts_with("content-disposition:"))?;
            let raw = &part[sep_pos + sep.len()..];
            Some(Part {
                name: disposition_param(disposition, "name"),
                filename: disposition_param(disposition, "filename"),
                data: raw.strip_suffix(b"\r\n").unwrap_or(raw),
            })
        })
        .collect()
}

/// Returns the file part uploaded under `field_name`, if any.
pub fn find_file<'p, 'a>(parts: &'p [Part<'a>], field_name: &str) -> Option<&'p Part<'a>> {
    parts
        .iter()
        .find(|p| p.name.as_deref() == Some(field_name) && p.filename.is_some())
}

/// Parses `key="value"` (or unquoted `key=value`) out of a
/// Content-Disposition header line.
fn disposition_param(line: &str, key: &str) -> Option<String> {
    let (_, params) = line.split_once(':')?;
    header_params(params)
        .into_iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Splits `a; k=v; k2="v;2"` into trimmed `(key, value)` pairs. A `;` inside
/// a quoted value does not end the parameter, and `\"` / `\\` inside quotes
/// are unescaped. Bare tokens such as `form-data` come back with an empty
/// value.
fn header_params(params: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let mut chars = params.chars().peekable();
    while chars.peek().is_some() {
        let mut key = String::new();
        while let Some(c) = chars.next_if(|&c| c != '=' && c != ';') {
            key.push(c);
        }

        let mut value = String::new();
        if chars.next() == Some('=') {
            while chars.next_if(|&c| c == ' ' || c == '\t').is_some() {}
            if chars.next_if_eq(&'"').is_some() {
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => match chars.next_if(|&n| n == '"' || n == '\\') {
                            Some(n) => value.push(n),
                            None => value.push(c),
                        },
                        c => value.push(c),
                    }
                }
                // Anything between the closing quote and the next `;` is junk.
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                }
            } else {
                for c in chars.by_ref() {
                    if c == ';' {
                        break;
                    }
                    value.push(c);
                }
                value = value.trim().to_owned();
            }
        }

        let key = key.trim();
        if !key.is_empty() {
            out.push((key.to_owned(), value));
        }
    }
    out
}

/// Builds a single-part multipart body for tests: returns
/// `(content_type, body)`.
#[cfg(test)]
pub fn build_single_file(field: &str, filename: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----ferriteBoundary7MA4YWxkTrZu0gW";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n", field, filename).as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    (format!("multipart/form-data; boundary={}", boundary), body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_is_extracted_and_unquoted() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=\"abc123\"").as_deref(),
            Some("abc123")
        );
        assert_eq!(extract_boundary("application/json"), None);
        assert_eq!(extract_boundary("multipart/form-data"), None);
    }

    #[test]
    fn boundary_key_is_case_insensitive() {
        assert_eq!(
            extract_boundary("Multipart/Form-Data; Boundary=xyz; charset=utf-8").as_deref(),
            Some("xyz")
        );
        assert_eq!(extract_boundary("multipart/form-data; BOUNDARY=\"q;q\"").as_deref(), Some("q;q"));
    }

    #[test]
    fn semicolon_inside_quoted_filename_is_kept() {
        let (ct, body) = build_single_file("image", "my;cat.jpg", b"x");
        let parts = parse_parts(&body, &extract_boundary(&ct).unwrap());
        let file = find_file(&parts, "image").unwrap();
        assert_eq!(file.filename.as_deref(), Some("my;cat.jpg"));
    }

    #[test]
    fn disposition_params_unescape_quotes_and_keep_paths() {
        let line = r#"Content-Disposition: form-data; name="image"; filename="say \"hi\".png""#;
        assert_eq!(disposition_param(line, "filename").as_deref(), Some("say \"hi\".png"));
        assert_eq!(disposition_param(line, "name").as_deref(), Some("image"));

        let line = r#"Content-Disposition: form-data; name=image; filename="C:\Users\me\dog.png""#;
        assert_eq!(disposition_param(line, "filename").as_deref(), Some(r"C:\Users\me\dog.png"));
        assert_eq!(disposition_param(line, "name").as_deref(), Some("image"));
        assert_eq!(disposition_param(line, "missing"), None);
    }

    #[test]
    fn parses_text_and_file_parts() {
        let body = b"--XX\r\n\
Content-Disposition: form-data; name=\"note\"\r\n\r\n\
hello\r\n\
--XX\r\n\
Content-Disposition: form-data; name=\"image\"; filename=\"cat.jpg\"\r\n\
Content-Type: image/jpeg\r\n\r\n\
\x00\x01\r\n\x02\r\n\
--XX--\r\n";
        let parts = parse_parts(body, "XX");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].name.as_deref(), Some("note"));
        assert_eq!(parts[0].filename, None);
        assert_eq!(parts[0].data, b"hello");

        let file = find_file(&parts, "image").unwrap();
        assert_eq!(file.filename.as_deref(), Some("cat.jpg"));
        assert_eq!(file.data, b"\x00\x01\r\n\x02");
    }

    #[test]
    fn filename_does_not_count_as_name() {
        let (ct, body) = build_single_file("photo", "image", b"x");
        let boundary = extract_boundary(&ct).unwrap();
        let parts = parse_parts(&body, &boundary);
        assert!(find_file(&parts, "image").is_none());
        assert!(find_file(&parts, "photo").is_some());
    }

    #[test]
    fn text_field_is_not_a_file() {
        let body = b"--B\r\nContent-Disposition: form-data; name=\"image\"\r\n\r\nabc\r\n--B--\r\n";
        let parts = parse_parts(body, "B");
        assert!(find_file(&parts, "image").is_none());
    }
}
