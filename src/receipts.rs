use rust_decimal::Decimal;
use std::fmt;
use std::path::Path;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "tiff"];
pub const DEFAULT_FOLDER: &str = "receipts";
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Tiff,
}

impl ImageKind {
    /// Recognises an image by its leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
        const TIFF_LE: &[u8] = &[b'I', b'I', 0x2A, 0x00];
        const TIFF_BE: &[u8] = &[b'M', b'M', 0x00, 0x2A];

        if bytes.starts_with(PNG) {
            Some(ImageKind::Png)
        } else if bytes.starts_with(JPEG) {
            Some(ImageKind::Jpeg)
        } else if bytes.starts_with(TIFF_LE) || bytes.starts_with(TIFF_BE) {
            Some(ImageKind::Tiff)
        } else {
            None
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
            ImageKind::Tiff => "tiff",
        };
        f.write_str(name)
    }
}

/// True for a single path component without separators or parent references.
pub fn is_safe_component(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && !name.starts_with('.')
}

/// Upload file name with a safe shape and an allowed image extension.
pub fn is_allowed_file_name(file_name: &str) -> bool {
    if !is_safe_component(file_name) {
        return false;
    }
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// What could be read off a receipt image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiptScan {
    pub store_name: Option<String>,
    pub amount: Option<Decimal>,
}

/// Extracts store name and total from a receipt image.
pub trait ReceiptScanner: Send + Sync + fmt::Debug {
    fn scan(&self, kind: ImageKind, bytes: &[u8]) -> ReceiptScan;
}

/// Scanner that recognises nothing; uploads are stored but not read.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderScanner;

impl ReceiptScanner for PlaceholderScanner {
    fn scan(&self, _kind: ImageKind, _bytes: &[u8]) -> ReceiptScan {
        ReceiptScan::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_known_formats() {
        assert_eq!(
            ImageKind::sniff(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            Some(ImageKind::Png)
        );
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(b"II*\0rest"), Some(ImageKind::Tiff));
        assert_eq!(ImageKind::sniff(b"MM\0*rest"), Some(ImageKind::Tiff));
    }

    #[test]
    fn test_sniff_rejects_other_content() {
        assert_eq!(ImageKind::sniff(b"%PDF-1.7"), None);
        assert_eq!(ImageKind::sniff(b""), None);
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8]), None);
    }

    #[test]
    fn test_file_name_rules() {
        assert!(is_allowed_file_name("receipt.png"));
        assert!(is_allowed_file_name("scan.JPEG"));
        assert!(is_allowed_file_name("page.tiff"));
        assert!(!is_allowed_file_name("receipt.gif"));
        assert!(!is_allowed_file_name("receipt"));
        assert!(!is_allowed_file_name("../receipt.png"));
        assert!(!is_allowed_file_name("a/b.png"));
        assert!(!is_allowed_file_name("a\\b.png"));
        assert!(!is_allowed_file_name(".png"));
    }

    #[test]
    fn test_folder_rules() {
        assert!(is_safe_component("receipts"));
        assert!(is_safe_component("2026-10"));
        assert!(!is_safe_component(""));
        assert!(!is_safe_component(".."));
        assert!(!is_safe_component("a/b"));
    }

    #[test]
    fn test_placeholder_scanner_finds_nothing() {
        let scan = PlaceholderScanner.scan(ImageKind::Png, &[]);
        assert_eq!(scan, ReceiptScan::default());
    }
}
