/// Page title shared by every document.
pub const SITE_TITLE: &str = "StoreIt";
pub const SITE_DESCRIPTION: &str = "StoreIt - The only solution you need";

const POPPINS_STYLESHEET: &str = "https://fonts.googleapis.com/css2?family=Poppins:wght@100;200;300;400;500;600;700;800;900&display=swap";

/// Wrap `body` in the root document.
///
/// Loads Poppins (weights 100 to 900) and exposes it as the `--font-poppins`
/// CSS variable; the body applies it with antialiasing.
pub fn root_shell(page_title: Option<&str>, body: &str) -> String {
    let title = match page_title {
        Some(page) => format!("{} - {SITE_TITLE}", super::escape(page)),
        None => SITE_TITLE.to_string(),
    };

    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="{SITE_DESCRIPTION}">
    <title>{title}</title>

    <link rel="preconnect" href="https://fonts.googleapis.com">
    <link rel="preconnect" href="https://fonts.gstatic.com" crossorigin>
    <link rel="stylesheet" href="{POPPINS_STYLESHEET}">
    <style>:root {{ --font-poppins: "Poppins", ui-sans-serif, system-ui, sans-serif; }}</style>

    <script src="/assets/vendor/htmx.min.js"></script>
    <link rel="stylesheet" href="/assets/app.css">
</head>
<body class="font-poppins antialiased">
{body}
</body>
</html>"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_shell_metadata() {
        let html = root_shell(None, "<p>hi</p>");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"<html lang="en">"#));
        assert!(html.contains("<title>StoreIt</title>"));
        assert!(html.contains(r#"content="StoreIt - The only solution you need""#));
        assert!(html.contains("--font-poppins"));
        assert!(html.contains("wght@100;200;300;400;500;600;700;800;900"));
        assert!(html.contains(r#"<body class="font-poppins antialiased">"#));
        assert!(html.contains("<p>hi</p>"));
    }

    #[test]
    fn test_page_title_is_escaped() {
        let html = root_shell(Some("<Docs>"), "");
        assert!(html.contains("<title>&lt;Docs&gt; - StoreIt</title>"));
    }
}
