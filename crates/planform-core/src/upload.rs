//! Upload boundary - which files may be submitted and in what order

/// A file picked or dropped by the user, already read into memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type,
            bytes,
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Size in whole kilobytes, rounded to nearest
    pub fn size_kb(&self) -> usize {
        (self.bytes.len() + 512) / 1024
    }
}

/// File filter for the upload widget
#[derive(Debug, Clone)]
pub struct UploadFilter {
    /// MIME type prefixes (e.g., "image/")
    pub mime_prefixes: Vec<String>,
    /// Extensions accepted on their own, without dots (e.g., ["pdf", "svg"])
    pub extensions: Vec<String>,
    /// Extensions matched by a MIME prefix, used when the platform reports no MIME type
    pub implied_extensions: Vec<String>,
}

impl UploadFilter {
    /// Images, PDF and SVG floor plans
    pub fn floor_plans() -> Self {
        Self {
            mime_prefixes: vec!["image/".to_string()],
            extensions: vec!["pdf".to_string(), "svg".to_string()],
            implied_extensions: ["png", "jpg", "jpeg", "gif", "bmp", "webp", "tif", "tiff"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }

    pub fn accepts(&self, name: &str, mime_type: Option<&str>) -> bool {
        if let Some(mime) = mime_type {
            if self.mime_prefixes.iter().any(|prefix| mime.starts_with(prefix.as_str())) {
                return true;
            }
        }

        let Some((_, ext)) = name.rsplit_once('.') else {
            return false;
        };
        self.extensions
            .iter()
            .chain(self.implied_extensions.iter())
            .any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// Convert to accept string for HTML input element
    pub fn to_accept_string(&self) -> String {
        self.mime_prefixes
            .iter()
            .map(|prefix| format!("{}*", prefix))
            .chain(self.extensions.iter().map(|ext| format!(".{}", ext)))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for UploadFilter {
    fn default() -> Self {
        Self::floor_plans()
    }
}

/// Ordered file list from the last pick or drop
///
/// A new selection replaces the previous one. Only the first file is submitted.
#[derive(Debug, Clone, Default)]
pub struct UploadSelection {
    files: Vec<UploadFile>,
}

impl UploadSelection {
    /// Keep the files the filter accepts, preserving order
    pub fn from_files(files: Vec<UploadFile>, filter: &UploadFilter) -> Self {
        let files = files
            .into_iter()
            .filter(|f| {
                let accepted = filter.accepts(&f.name, f.mime_type.as_deref());
                if !accepted {
                    tracing::warn!(file = %f.name, "Ignoring file with unsupported type");
                }
                accepted
            })
            .collect();
        Self { files }
    }

    pub fn replace(&mut self, other: UploadSelection) {
        *self = other;
    }

    pub fn first(&self) -> Option<&UploadFile> {
        self.files.first()
    }

    pub fn files(&self) -> &[UploadFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}
