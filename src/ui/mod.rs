//! Server-rendered HTML.
//!
//! Pages and HTMX fragments are plain `String`s built with `format!`. Every
//! value that came from a user or a backend goes through [`escape`].
//!
//! # Structure
//!
//! - [`shell`]: the root document (fonts, theme, metadata)
//! - [`layout`]: sidebar, mobile nav, header and toaster around protected pages
//! - [`uploader`]: the upload button, pending list and toast fragments
//! - [`pages`]: file browser and sign-in bodies

pub mod layout;
pub mod pages;
pub mod shell;
pub mod uploader;

use url::Url;

/// Escape text for use in element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Absolute path built from percent-encoded segments.
pub fn encoded_path(segments: &[&str]) -> String {
    let Ok(mut url) = Url::parse("http://storeit.invalid/") else {
        return "/".to_string();
    };
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url.path().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape(r#"<img src="x" onerror='y'>&"#),
            "&lt;img src=&quot;x&quot; onerror=&#x27;y&#x27;&gt;&amp;"
        );
        assert_eq!(escape("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_encoded_path() {
        assert_eq!(
            encoded_path(&["uploads", "u1", "files", "my report #2.pdf"]),
            "/uploads/u1/files/my%20report%20%232.pdf"
        );
        assert_eq!(encoded_path(&["uploads", "a/b"]), "/uploads/a%2Fb");
    }
}
