//! Uploader fragments.
//!
//! The upload button posts the chosen files with the uploader id and the
//! current path. The pending list swaps itself out and keeps polling while
//! it has entries.

use super::{encoded_path, escape};
use crate::uploader::{FileState, PendingEntry, Toast};

/// Seconds between pending-list refreshes.
const POLL_SECS: u32 = 1;

/// DOM id of an uploader's pending list.
pub fn pending_list_id(uploader_id: &str) -> String {
    format!("uploader-{}-pending", escape(uploader_id))
}

/// Upload button plus its (initially empty) pending list.
pub fn uploader_form(uploader_id: &str, path: &str, class: &str) -> String {
    let id = escape(uploader_id);
    let target = pending_list_id(uploader_id);
    let pending = pending_list(uploader_id, &[]);
    let path = escape(path);
    let class = escape(class);

    // The list sits outside the form so removals never resend the files.
    format!(r##"<div class="file-uploader">
    <form class="cursor-pointer"
          hx-post="/uploads"
          hx-encoding="multipart/form-data"
          hx-trigger="change"
          hx-target="#{target}"
          hx-swap="outerHTML">
        <input type="hidden" name="uploader_id" value="{id}">
        <input type="hidden" name="path" value="{path}">
        <label class="uploader-button {class}">
            <input type="file" name="files" multiple class="hidden">
            <img src="/assets/icons/upload.svg" alt="upload" width="24" height="24">
            <p>Upload</p>
        </label>
    </form>
    {pending}
</div>"##)
}

/// The pending list fragment.
///
/// Empty lists render a placeholder that does not poll.
pub fn pending_list(uploader_id: &str, entries: &[PendingEntry]) -> String {
    let dom_id = pending_list_id(uploader_id);
    if entries.is_empty() {
        return format!(r#"<ul id="{dom_id}" class="uploader-preview-list hidden"></ul>"#);
    }

    let fragment_url = escape(&encoded_path(&["uploads", uploader_id]));
    let items: String = entries
        .iter()
        .map(|entry| pending_item(uploader_id, &dom_id, entry))
        .collect();

    format!(r#"<ul id="{dom_id}" class="uploader-preview-list"
    hx-get="{fragment_url}"
    hx-trigger="every {POLL_SECS}s"
    hx-swap="outerHTML">
    <h4 class="h4 text-light-100">Uploading</h4>
    {items}
</ul>"#)
}

fn pending_item(uploader_id: &str, dom_id: &str, entry: &PendingEntry) -> String {
    let name = escape(&entry.name);
    let thumbnail = match &entry.thumbnail {
        Some(data_url) => format!(
            r#"<img src="{}" alt="thumbnail" class="thumbnail-image">"#,
            escape(data_url)
        ),
        None => format!(
            r#"<img src="{}" alt="{}" width="32" height="32">"#,
            entry.kind.icon(),
            escape(&entry.extension)
        ),
    };
    let status = match &entry.state {
        FileState::Selected | FileState::Uploading => {
            r#"<img src="/assets/icons/file-loader.gif" width="80" height="26" alt="Loader">"#
                .to_string()
        }
        FileState::Failed { reason } => format!(
            r#"<span class="preview-item-error" title="{}">Upload failed</span>"#,
            escape(reason)
        ),
    };
    let remove_url = escape(&encoded_path(&["uploads", uploader_id, "files", &entry.name]));

    format!(r##"<li class="uploader-preview-item" data-state="{state}">
        <div class="flex items-center gap-3">
            <figure class="thumbnail">{thumbnail}</figure>
            <div class="preview-item-name">
                {name}
                {status}
            </div>
        </div>
        <button type="button" class="remove-button"
            hx-delete="{remove_url}"
            hx-target="#{dom_id}"
            hx-swap="outerHTML">
            <img src="/assets/icons/remove.svg" width="24" height="24" alt="Remove">
        </button>
    </li>"##,
        state = state_label(&entry.state),
    )
}

fn state_label(state: &FileState) -> &'static str {
    match state {
        FileState::Selected => "selected",
        FileState::Uploading => "uploading",
        FileState::Failed { .. } => "failed",
    }
}

/// Toaster container; polls the uploader's toast queue.
pub fn toaster(uploader_id: &str) -> String {
    let url = escape(&encoded_path(&["uploads", uploader_id, "toasts"]));
    format!(r#"<div id="toaster" class="toaster" role="status" aria-live="polite"
    hx-get="{url}"
    hx-trigger="every 2s"
    hx-swap="innerHTML"></div>"#)
}

/// Drained toasts, rendered into the toaster.
pub fn toasts(toasts: &[Toast]) -> String {
    toasts
        .iter()
        .map(|toast| {
            format!(
                r#"<div class="toast error-toast" data-level="{}"><p class="body-2 text-white">{}</p></div>"#,
                toast.level.as_str(),
                escape(&toast.message)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_type::FileKind;

    fn entry(name: &str, state: FileState) -> PendingEntry {
        PendingEntry {
            name: name.to_string(),
            size: 10,
            kind: FileKind::Document,
            extension: "pdf".to_string(),
            thumbnail: None,
            state,
        }
    }

    #[test]
    fn test_empty_list_does_not_poll() {
        let html = pending_list("u1", &[]);
        assert!(html.contains(r#"id="uploader-u1-pending""#));
        assert!(!html.contains("hx-trigger"));
        assert!(!html.contains("Uploading"));
    }

    #[test]
    fn test_entries_render_with_remove_and_state() {
        let html = pending_list(
            "u1",
            &[
                entry("a b.pdf", FileState::Uploading),
                entry("<x>.pdf", FileState::Failed { reason: "boom".into() }),
            ],
        );
        assert!(html.contains("Uploading"));
        assert!(html.contains(r#"hx-trigger="every 1s""#));
        assert!(html.contains(r#"hx-delete="/uploads/u1/files/a%20b.pdf""#));
        assert!(html.contains("file-loader.gif"));
        assert!(html.contains("&lt;x&gt;.pdf"));
        assert!(html.contains("Upload failed"));
        assert!(html.contains(r#"data-state="failed""#));
    }

    #[test]
    fn test_form_carries_uploader_and_path() {
        let html = uploader_form("u1", "/images", "");
        assert!(html.contains(r#"hx-post="/uploads""#));
        assert!(html.contains(r#"name="uploader_id" value="u1""#));
        assert!(html.contains(r#"name="path" value="/images""#));
        assert!(html.contains(r#"name="files" multiple"#));
    }

    #[test]
    fn test_toasts_escape_messages() {
        let html = toasts(&[Toast::warning("<b>.png is too large. Max file size is 50MB.")]);
        assert!(html.contains("error-toast"));
        assert!(html.contains(r#"data-level="warning""#));
        assert!(html.contains("&lt;b&gt;.png is too large"));
    }

    #[test]
    fn test_toasts_tag_each_level() {
        let html = toasts(&[Toast::warning("w"), Toast::error("e")]);
        assert!(html.contains(r#"data-level="warning"><p class="body-2 text-white">w</p>"#));
        assert!(html.contains(r#"data-level="error"><p class="body-2 text-white">e</p>"#));
    }
}
