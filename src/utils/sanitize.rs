//! Scrubbing for text that crosses the pipeline boundary.

use std::sync::LazyLock;

use regex::Regex;

/// Upper bound on failure message length, in characters.
pub const MAX_MESSAGE_CHARS: usize = 256;

/// Upper bound on scratch file name length, in bytes. Well under the usual
/// 255-byte component limit.
pub const MAX_FILE_NAME_BYTES: usize = 128;

/// Longest suffix still treated as an extension when shortening a name.
const MAX_EXTENSION_BYTES: usize = 16;

/// Absolute Unix paths, drive-letter paths and UNC paths, anchored at a token start.
static PATH_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<pre>^|[\s'"(=\[,])(?:/|[A-Za-z]:[\\/]|\\\\)[^\s'"()\[\]:,]+"#)
        .expect("path pattern is valid")
});

/// Produce a bounded, single-line message with file-system paths redacted.
pub fn sanitize_message(message: &str) -> String {
    let flattened: String = message
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    let redacted = PATH_LIKE.replace_all(flattened.trim(), "${pre}<path>");

    if redacted.chars().count() <= MAX_MESSAGE_CHARS {
        return redacted.into_owned();
    }

    let mut bounded: String = redacted.chars().take(MAX_MESSAGE_CHARS - 1).collect();
    bounded.push('…');
    bounded
}

/// Reduce an object name to a safe single path component.
///
/// Keeps ASCII alphanumerics, `.`, `-` and `_` so the extension survives.
/// Long names are shortened to [`MAX_FILE_NAME_BYTES`], keeping the extension.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        return "blob".to_string();
    }
    if cleaned.len() <= MAX_FILE_NAME_BYTES {
        return cleaned.to_string();
    }

    // Only ASCII is left, so byte offsets are char boundaries
    let extension = match cleaned.rfind('.') {
        Some(dot) if cleaned.len() - dot <= MAX_EXTENSION_BYTES => &cleaned[dot..],
        _ => "",
    };
    let stem = &cleaned[..MAX_FILE_NAME_BYTES - extension.len()];
    format!("{}{}", stem, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_unix_paths() {
        assert_eq!(
            sanitize_message("failed to open /tmp/docpipe-a1/report.pdf: No such file"),
            "failed to open <path>: No such file"
        );
    }

    #[test]
    fn test_redacts_windows_paths() {
        assert_eq!(
            sanitize_message(r"cannot read C:\Users\me\AppData\Local\Temp\x.docx"),
            "cannot read <path>"
        );
    }

    #[test]
    fn test_redacts_quoted_paths() {
        assert_eq!(
            sanitize_message("open '/var/lib/scratch/file' failed"),
            "open '<path>' failed"
        );
    }

    #[test]
    fn test_keeps_urls_and_keys() {
        let message = "HTTP 404 for https://storage.local/uploads/a/b.pdf (key a/b.pdf)";
        assert_eq!(sanitize_message(message), message);
    }

    #[test]
    fn test_strips_control_characters() {
        assert_eq!(
            sanitize_message("line one\nline two\tend\u{0}"),
            "line one line two end"
        );
    }

    #[test]
    fn test_truncates_long_messages() {
        let long = "é".repeat(1000);
        let result = sanitize_message(&long);
        assert_eq!(result.chars().count(), MAX_MESSAGE_CHARS);
        assert!(result.ends_with('…'));
    }

    #[test]
    fn test_short_message_untouched() {
        assert_eq!(sanitize_message("scanner offline"), "scanner offline");
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("report.pdf"), "report.pdf");
        assert_eq!(sanitize_file_name("My Report (1).docx"), "My_Report__1_.docx");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "blob");
        assert_eq!(sanitize_file_name("..."), "blob");
    }

    #[test]
    fn test_long_file_name_keeps_extension() {
        let name = format!("{}.pdf", "a".repeat(300));
        let result = sanitize_file_name(&name);
        assert_eq!(result.len(), MAX_FILE_NAME_BYTES);
        assert!(result.ends_with("a.pdf"));

        let unicode = format!("{}.docx", "日".repeat(200));
        let result = sanitize_file_name(&unicode);
        assert_eq!(result.len(), MAX_FILE_NAME_BYTES);
        assert!(result.ends_with("_.docx"));

        // A long trailing segment is not an extension
        let dotted = format!("x.{}", "b".repeat(200));
        let result = sanitize_file_name(&dotted);
        assert_eq!(result.len(), MAX_FILE_NAME_BYTES);
        assert!(result.starts_with("x.bbb"));
    }
}
