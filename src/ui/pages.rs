//! Page bodies for the file browser and the sign-in page.

use super::{escape, shell};
use crate::backend::UploadedFile;
use crate::file_type::{Category, FileKind};

/// Number of files listed under "Recent files uploaded" on the dashboard.
const RECENT_LIMIT: usize = 10;

/// Human readable size, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{bytes} Bytes");
    }
    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

fn total_size(files: &[UploadedFile]) -> u64 {
    files.iter().map(|f| f.size).sum()
}

fn file_card(file: &UploadedFile) -> String {
    let preview = if file.kind == FileKind::Image {
        escape(&file.url)
    } else {
        file.kind.icon().to_string()
    };
    format!(r#"<a href="{url}" target="_blank" rel="noopener" class="file-card">
    <div class="flex justify-between">
        <figure class="thumbnail"><img src="{preview}" alt="{extension}" class="thumbnail-image"></figure>
        <p class="body-1">{size}</p>
    </div>
    <div class="file-card-details">
        <p class="subtitle-2 line-clamp-1">{name}</p>
        <p class="body-2 text-light-100">{created}</p>
    </div>
</a>"#,
        url = escape(&file.url),
        extension = escape(&file.extension),
        size = format_size(file.size),
        name = escape(&file.name),
        created = file.created_at.format("%-I:%M%P, %-d %b"),
    )
}

/// Listing for one browse category.
pub fn category_page(category: Category, files: &[UploadedFile]) -> String {
    let body = if files.is_empty() {
        r#"<p class="empty-list">No files uploaded</p>"#.to_string()
    } else {
        let cards: String = files.iter().map(file_card).collect();
        format!(r#"<section class="file-list">{cards}</section>"#)
    };

    format!(r#"<div class="page-container">
    <section class="w-full">
        <h1 class="h1 capitalize">{title}</h1>
        <div class="total-size-section">
            <p class="body-1">Total: <span class="h5">{total}</span></p>
        </div>
    </section>
    {body}
</div>"#,
        title = category.title(),
        total = format_size(total_size(files)),
    )
}

/// Usage summary per category plus the most recent uploads.
pub fn dashboard(files: &[UploadedFile]) -> String {
    let summary: String = Category::ALL
        .iter()
        .map(|category| {
            let in_category: Vec<&UploadedFile> = files
                .iter()
                .filter(|f| category.kinds().contains(&f.kind))
                .collect();
            let size: u64 = in_category.iter().map(|f| f.size).sum();
            format!(
                r#"<li><a href="{href}" class="dashboard-summary-card"><img src="{icon}" alt="{title}" width="40" height="40"><h4 class="summary-type-size">{size}</h4><h5 class="summary-type-title">{title}</h5><p class="body-2">{count} files</p></a></li>"#,
                href = category.href(),
                icon = category.icon(),
                title = category.title(),
                size = format_size(size),
                count = in_category.len(),
            )
        })
        .collect();

    let recent = if files.is_empty() {
        r#"<p class="empty-list">No files uploaded</p>"#.to_string()
    } else {
        let items: String = files.iter().take(RECENT_LIMIT).map(file_card).collect();
        format!(r#"<div class="recent-files">{items}</div>"#)
    };

    format!(r#"<div class="dashboard-container">
    <section>
        <p class="body-1">Used: <span class="h5">{total}</span></p>
        <ul class="dashboard-summary-list">{summary}</ul>
    </section>
    <section class="dashboard-recent-files">
        <h2 class="h3 xl:h2 text-light-100">Recent files uploaded</h2>
        {recent}
    </section>
</div>"#,
        total = format_size(total_size(files)),
    )
}

/// Public page that protected pages redirect to.
pub fn sign_in_page() -> String {
    let body = r#"<main class="auth-layout flex min-h-screen items-center justify-center">
    <section class="auth-form">
        <img src="/assets/icons/logo-full-brand.svg" alt="logo" width="224" height="82" class="h-auto">
        <h1 class="form-title">Sign In</h1>
        <p class="body-2 text-light-100">Your session has expired or you are not signed in. Sign in to continue to your files.</p>
    </section>
</main>"#;
    shell::root_shell(Some("Sign In"), body)
}
