const MAX_NAME_LEN: usize = 200;
const FALLBACK_NAME: &str = "unknown";

/// Reduce a client-supplied file name to a lowercase, single-segment name.
///
/// Directory components are dropped; anything other than alphanumerics, `.`,
/// `-` and `_` becomes `-`, runs of `-` collapse, and leading/trailing `.` or
/// `-` are trimmed, also around the final `.`. The client's extension is kept.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let mut out = String::with_capacity(base.len());
    for c in base.chars().take(MAX_NAME_LEN) {
        let mapped = if c.is_alphanumeric() || c == '.' || c == '_' {
            c
        } else {
            '-'
        };
        if mapped == '-' && out.ends_with('-') {
            continue;
        }
        out.extend(mapped.to_lowercase());
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '-');
    if trimmed.is_empty() {
        return FALLBACK_NAME.to_string();
    }

    match trimmed.rsplit_once('.') {
        Some((stem, ext)) => {
            let stem = stem.trim_end_matches('-');
            let ext = ext.trim_start_matches('-');
            if stem.is_empty() || ext.is_empty() {
                trimmed.to_string()
            } else {
                format!("{}.{}", stem, ext)
            }
        }
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize_filename("Photo.JPG"), "photo.jpg");
        assert_eq!(sanitize_filename("my holiday (1).png"), "my-holiday-1.png");
        assert_eq!(sanitize_filename("draft -.final .JPG"), "draft-.final.jpg");
        assert_eq!(sanitize_filename("photo.png"), "photo.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\cat.gif"), "cat.gif");
    }

    #[test]
    fn test_sanitize_fallback() {
        assert_eq!(sanitize_filename(""), "unknown");
        assert_eq!(sanitize_filename("..."), "unknown");
        assert_eq!(sanitize_filename("***"), "unknown");
    }
}
