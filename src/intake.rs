//! Accepting uploaded PDF files and handing out content references.

use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const PDF_MIME: &str = "application/pdf";
pub const PDF_EXTENSION: &str = "pdf";

const ID_SUFFIX_LEN: usize = 7;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Process-local handle to the bytes of an uploaded file.
///
/// Clones share the same buffer; it is released when the last clone drops.
#[derive(Clone)]
pub struct ContentRef {
    locator: String,
    bytes: Arc<[u8]>,
}

impl ContentRef {
    fn new(id: &str, name: &str, bytes: Arc<[u8]>) -> Self {
        Self {
            locator: format!("mem://{id}/{name}"),
            bytes,
        }
    }

    pub fn locator(&self) -> &str {
        &self.locator
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentRef")
            .field("locator", &self.locator)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A file known to the application, ready to be placed on the map.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    pub content: ContentRef,
}

/// A dropped or selected file before it has been accepted.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    /// MIME type when the source reports one
    pub mime: Option<String>,
    pub bytes: Arc<[u8]>,
}

/// Whether a file should be accepted, judged by MIME type or, when that is
/// unknown, by its `.pdf` extension.
pub fn accepts(name: &str, mime: Option<&str>) -> bool {
    match mime.filter(|m| !m.is_empty()) {
        Some(mime) => mime.eq_ignore_ascii_case(PDF_MIME),
        None => std::path::Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION)),
    }
}

/// Synthesises an id of the form `pdf-<unix millis>-<random base36>`.
pub fn generate_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("pdf-{millis}-{suffix}")
}

/// The list of files the user has provided this session.
#[derive(Debug, Default)]
pub struct FileIntake {
    files: Vec<UploadedFile>,
}

impl FileIntake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends every acceptable file and returns how many were added.
    pub fn accept(&mut self, incoming: impl IntoIterator<Item = IncomingFile>) -> usize {
        let mut added = 0;
        for file in incoming {
            if !accepts(&file.name, file.mime.as_deref()) {
                log::debug!(
                    "Ignoring {} ({})",
                    file.name,
                    file.mime.as_deref().unwrap_or("unknown type")
                );
                continue;
            }
            let id = generate_id();
            let content = ContentRef::new(&id, &file.name, file.bytes);
            self.files.push(UploadedFile {
                id,
                name: file.name,
                content,
            });
            added += 1;
        }
        added
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn get(&self, id: &str) -> Option<&UploadedFile> {
        self.files.iter().find(|f| f.id == id)
    }

    /// Forgets a file; its bytes are freed once no overlay still uses them.
    pub fn remove(&mut self, id: &str) -> Option<UploadedFile> {
        let index = self.files.iter().position(|f| f.id == id)?;
        Some(self.files.remove(index))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incoming(name: &str, mime: Option<&str>) -> IncomingFile {
        IncomingFile {
            name: name.to_owned(),
            mime: mime.map(str::to_owned),
            bytes: Arc::from(&b"%PDF-1.7"[..]),
        }
    }

    #[test]
    fn test_drop_single_pdf() {
        let mut intake = FileIntake::new();
        let added = intake.accept([incoming("site.pdf", Some(PDF_MIME))]);
        assert_eq!(added, 1);
        assert_eq!(intake.len(), 1);
        let file = &intake.files()[0];
        assert_eq!(file.name, "site.pdf");
        assert!(!file.content.locator().is_empty());
        assert!(!file.content.is_empty());
    }

    #[test]
    fn test_rejects_other_types() {
        let mut intake = FileIntake::new();
        let added = intake.accept([
            incoming("photo.png", Some("image/png")),
            incoming("notes.txt", None),
            incoming("fake.pdf", Some("text/plain")),
        ]);
        assert_eq!(added, 0);
        assert!(intake.is_empty());
    }

    #[test]
    fn test_extension_fallback_without_mime() {
        assert!(accepts("Survey.PDF", None));
        assert!(accepts("plan.pdf", Some("")));
        assert!(!accepts("plan", None));
    }

    #[test]
    fn test_duplicates_produce_independent_entries() {
        let mut intake = FileIntake::new();
        intake.accept([incoming("site.pdf", Some(PDF_MIME))]);
        intake.accept([incoming("site.pdf", Some(PDF_MIME))]);
        assert_eq!(intake.len(), 2);
        assert_ne!(intake.files()[0].id, intake.files()[1].id);
    }

    #[test]
    fn test_mixed_drop_keeps_only_pdfs() {
        let mut intake = FileIntake::new();
        let added = intake.accept([
            incoming("a.pdf", Some(PDF_MIME)),
            incoming("b.jpg", Some("image/jpeg")),
            incoming("c.pdf", None),
        ]);
        assert_eq!(added, 2);
        let names: Vec<_> = intake.files().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.pdf", "c.pdf"]);
    }

    #[test]
    fn test_id_format() {
        let id = generate_id();
        let parts: Vec<_> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "pdf");
        assert!(parts[1].parse::<u128>().is_ok());
        assert_eq!(parts[2].len(), ID_SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn test_remove_releases_entry() {
        let mut intake = FileIntake::new();
        intake.accept([incoming("site.pdf", Some(PDF_MIME))]);
        let id = intake.files()[0].id.clone();
        let removed = intake.remove(&id).unwrap();
        assert_eq!(removed.name, "site.pdf");
        assert!(intake.get(&id).is_none());
        assert!(intake.remove(&id).is_none());
    }
}
