use lazy_static::lazy_static;
use regex::Regex;

/// Maximum length of the file-name segment of an object key
const MAX_KEY_NAME_LEN: usize = 128;

lazy_static! {
    /// Runs of characters that are not safe inside an object key segment
    /// - Kept: ASCII letters, digits, '.', '_', '-'
    /// - Replaced: spaces, slashes, unicode, shell metacharacters
    pub static ref UNSAFE_KEY_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
}

/// Turn an uploaded file's original name into a safe object key segment.
///
/// Directory components are dropped, unsafe runs collapse into a single '-',
/// and leading dots are removed so the key never names a hidden object.
/// Falls back to `"file"` when nothing usable remains.
pub fn sanitize_file_name(original: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);

    let replaced = UNSAFE_KEY_CHARS.replace_all(base, "-");
    let trimmed = replaced.trim_start_matches(['.', '-']).trim_end_matches('-');

    let mut name: String = trimmed.chars().take(MAX_KEY_NAME_LEN).collect();
    if name.is_empty() {
        name.push_str("file");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_safe_names() {
        assert_eq!(sanitize_file_name("receipt.pdf"), "receipt.pdf");
        assert_eq!(sanitize_file_name("bill_2024-05.png"), "bill_2024-05.png");
    }

    #[test]
    fn test_sanitize_replaces_unsafe_runs() {
        assert_eq!(sanitize_file_name("my electric bill.pdf"), "my-electric-bill.pdf");
        assert_eq!(sanitize_file_name("tagihan (listrik)!.jpg"), "tagihan-listrik-.jpg");
        assert_eq!(sanitize_file_name("faktur é.png"), "faktur-.png");
    }

    #[test]
    fn test_sanitize_strips_directories_and_dots() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\me\\scan.jpg"), "scan.jpg");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
    }

    #[test]
    fn test_sanitize_falls_back_when_empty() {
        assert_eq!(sanitize_file_name(""), "file");
        assert_eq!(sanitize_file_name("???"), "file");
        assert_eq!(sanitize_file_name("dir/"), "file");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "a".repeat(500);
        assert_eq!(sanitize_file_name(&long).len(), MAX_KEY_NAME_LEN);
    }
}
