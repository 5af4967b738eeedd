use bytes::Bytes;

/// A file the user picked or dropped, held only for the life of its upload.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    name: String,
    payload: Bytes,
    content_type: Option<String>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
            content_type: None,
        }
    }

    /// Attach the MIME type declared by the client.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Lookup key within one uploader.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Declared MIME type, or one guessed from the file name.
    pub fn content_type(&self) -> String {
        self.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&self.name)
                .first_or_octet_stream()
                .to_string()
        })
    }
}
