//! Resume upload validation, storage and text extraction.

use std::io::{Cursor, Read};
use std::sync::LazyLock;

use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use regex::Regex;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

pub const MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

static XML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid xml tag regex"));
static XML_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|lt|gt|quot|apos|amp);").expect("valid xml entity regex")
});

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No resume file was uploaded")]
    Missing,

    #[error("File type not allowed. Allowed types: pdf, docx, txt")]
    ExtensionNotAllowed,

    #[error("File size {size} bytes exceeds maximum limit of 5.0MB")]
    TooLarge { size: usize },

    #[error("Invalid filename after sanitization")]
    InvalidFilename,

    #[error("Could not extract text from {kind} file: {message}")]
    Extraction { kind: &'static str, message: String },
}

impl From<UploadError> for AppError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Extraction { .. } => AppError::UnprocessableEntity(e.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
}

impl DocumentKind {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, extension) = filename.rsplit_once('.')?;
        match extension.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "docx" => Some(DocumentKind::Docx),
            "txt" => Some(DocumentKind::Txt),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Docx => "DOCX",
            DocumentKind::Txt => "text",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentKind::Txt => "text/plain; charset=utf-8",
        }
    }
}

/// A validated resume file.
#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub filename: String,
    pub kind: DocumentKind,
    pub bytes: Bytes,
}

impl ResumeUpload {
    /// Validates extension, size and filename.
    pub fn new(filename: &str, bytes: Bytes) -> Result<Self, UploadError> {
        let kind = DocumentKind::from_filename(filename).ok_or(UploadError::ExtensionNotAllowed)?;
        if bytes.is_empty() {
            return Err(UploadError::Missing);
        }
        if bytes.len() > MAX_UPLOAD_SIZE {
            return Err(UploadError::TooLarge { size: bytes.len() });
        }

        let filename = sanitize_filename(filename);
        if DocumentKind::from_filename(&filename) != Some(kind) {
            return Err(UploadError::InvalidFilename);
        }

        Ok(Self {
            filename,
            kind,
            bytes,
        })
    }

    pub fn object_key(&self, application_id: Uuid) -> String {
        format!("resumes/{application_id}/{}", self.filename)
    }

    /// Extracts plain text. CPU-bound; run it off the async executor.
    pub fn extract_text(&self) -> Result<String, UploadError> {
        let extraction_error = |message: String| UploadError::Extraction {
            kind: self.kind.label(),
            message,
        };

        match self.kind {
            DocumentKind::Pdf => {
                pdf_extract::extract_text_from_mem(&self.bytes).map_err(|e| extraction_error(e.to_string()))
            }
            DocumentKind::Docx => extract_docx_text(&self.bytes).map_err(extraction_error),
            DocumentKind::Txt => Ok(String::from_utf8_lossy(&self.bytes).into_owned()),
        }
    }
}

/// Keeps ASCII letters, digits, `.`, `_` and `-` from the final path segment;
/// whitespace becomes `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let cleaned: String = base
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Paragraph text of a DOCX container, one paragraph per line.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, String> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a DOCX archive: {e}"))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| format!("missing word/document.xml: {e}"))?
        .read_to_string(&mut xml)
        .map_err(|e| format!("unreadable word/document.xml: {e}"))?;

    let xml = xml
        .replace("</w:p>", "\n")
        .replace("<w:tab/>", "\t")
        .replace("<w:br/>", "\n");
    let text = XML_TAG.replace_all(&xml, "");
    Ok(decode_xml_entities(&text))
}

/// Decodes XML entities in one pass, so decoded text is never decoded again.
fn decode_xml_entities(text: &str) -> String {
    XML_ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => {
                    let code = &entity[1..];
                    match code.strip_prefix('x') {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => code.parse::<u32>().ok(),
                    }
                    .and_then(char::from_u32)
                }
            };
            decoded.map(String::from).unwrap_or_default()
        })
        .into_owned()
}

/// Uploads the original file to object storage.
pub async fn store_resume(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    upload: &ResumeUpload,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(upload.bytes.clone()))
        .content_type(upload.kind.content_type())
        .send()
        .await
        .map_err(|e| AppError::S3(format!("S3 upload failed: {e}")))?;

    info!("Uploaded resume to s3://{bucket}/{key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn docx_with(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_rejects_disallowed_extension() {
        let err = ResumeUpload::new("resume.exe", Bytes::from_static(b"MZ")).unwrap_err();
        assert!(matches!(err, UploadError::ExtensionNotAllowed));
        assert!(ResumeUpload::new("resume", Bytes::from_static(b"x")).is_err());
    }

    #[test]
    fn test_rejects_oversize_file() {
        let bytes = Bytes::from(vec![b'a'; MAX_UPLOAD_SIZE + 1]);
        let err = ResumeUpload::new("resume.txt", bytes).unwrap_err();
        assert!(matches!(err, UploadError::TooLarge { .. }));

        let bytes = Bytes::from(vec![b'a'; MAX_UPLOAD_SIZE]);
        assert!(ResumeUpload::new("resume.txt", bytes).is_ok());
    }

    #[test]
    fn test_rejects_empty_file() {
        let err = ResumeUpload::new("resume.pdf", Bytes::new()).unwrap_err();
        assert!(matches!(err, UploadError::Missing));
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let upload = ResumeUpload::new("CV.PDF", Bytes::from_static(b"%PDF")).unwrap();
        assert_eq!(upload.kind, DocumentKind::Pdf);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/My Resume (final).pdf"), "My_Resume_final.pdf");
        assert_eq!(sanitize_filename("C:\\Users\\jo\\cv.docx"), "cv.docx");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn test_object_key_layout() {
        let upload = ResumeUpload::new("cv.txt", Bytes::from_static(b"hello")).unwrap();
        let id = Uuid::nil();
        assert_eq!(
            upload.object_key(id),
            "resumes/00000000-0000-0000-0000-000000000000/cv.txt"
        );
    }

    #[test]
    fn test_txt_extraction_is_lossy_utf8() {
        let upload = ResumeUpload::new("cv.txt", Bytes::from_static(b"Skills: Rust \xff")).unwrap();
        assert_eq!(upload.extract_text().unwrap(), "Skills: Rust \u{fffd}");
    }

    #[test]
    fn test_docx_extraction_reads_paragraphs() {
        let xml = r#"<?xml version="1.0"?><w:document><w:body><w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p><w:p><w:r><w:t>R&amp;D &lt;Lead&gt;</w:t><w:tab/><w:t>2020&#8211;2024</w:t></w:r></w:p></w:body></w:document>"#;
        let upload = ResumeUpload::new("cv.docx", Bytes::from(docx_with(xml))).unwrap();
        assert_eq!(
            upload.extract_text().unwrap(),
            "Jane Doe\nR&D <Lead>\t2020\u{2013}2024\n"
        );
    }

    #[test]
    fn test_escaped_entities_are_decoded_once() {
        assert_eq!(decode_xml_entities("&#38;lt;b&amp;gt;"), "&lt;b&gt;");
        assert_eq!(decode_xml_entities("&#x41;&quot;&apos;"), "A\"'");
    }

    #[test]
    fn test_docx_extraction_fails_on_non_zip() {
        let upload = ResumeUpload::new("cv.docx", Bytes::from_static(b"plain text")).unwrap();
        let err = upload.extract_text().unwrap_err();
        assert!(matches!(err, UploadError::Extraction { kind: "DOCX", .. }));
    }

    #[test]
    fn test_extraction_error_maps_to_unprocessable() {
        let err: AppError = UploadError::Extraction {
            kind: "PDF",
            message: "broken".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::UnprocessableEntity(_)));
        let err: AppError = UploadError::ExtensionNotAllowed.into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
