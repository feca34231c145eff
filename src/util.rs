use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Render `path` relative to the chart root when it lives under it.
pub fn relative_display(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Lossily decode captured script output, cut to `max_bytes` on a char boundary.
pub fn bounded_output(bytes: &[u8], max_bytes: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut end = text.len().min(max_bytes);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub fn now_epoch_ms() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("compute timestamp")?
        .as_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_output_cuts_on_char_boundaries() {
        assert_eq!(bounded_output("héllo".as_bytes(), 2), "h");
        assert_eq!(bounded_output("héllo".as_bytes(), 3), "hé");
        assert_eq!(bounded_output(b"short", 64), "short");
        assert_eq!(bounded_output(b"abcdef", 4), "abcd");
        assert_eq!(bounded_output(b"\xffok", 64), "\u{fffd}ok");
    }

    #[test]
    fn relative_display_strips_root_when_possible() {
        let root = Path::new("/course");
        assert_eq!(
            relative_display(Path::new("/course/L01_Intro/01_agent"), root),
            "L01_Intro/01_agent"
        );
        assert_eq!(relative_display(Path::new("/elsewhere/x"), root), "/elsewhere/x");
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
