//! Listing documents: type tags, upload limits and storage key layout.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest accepted upload (50 MiB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Document, spreadsheet and image formats accepted for due diligence.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/tiff",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "text/csv",
];

/// Root of every document key in the blob store.
pub const STORAGE_ROOT: &str = "listings/";

/// Used when a filename sanitizes down to nothing.
const FALLBACK_FILENAME: &str = "document";

// ---------------------------------------------------------------------------
// Document type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    FinancialStatement,
    TaxReturn,
    BankStatement,
    BusinessPlan,
    LeaseAgreement,
    InventoryList,
    EmployeeList,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 8] = [
        DocumentType::FinancialStatement,
        DocumentType::TaxReturn,
        DocumentType::BankStatement,
        DocumentType::BusinessPlan,
        DocumentType::LeaseAgreement,
        DocumentType::InventoryList,
        DocumentType::EmployeeList,
        DocumentType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::FinancialStatement => "financial_statement",
            DocumentType::TaxReturn => "tax_return",
            DocumentType::BankStatement => "bank_statement",
            DocumentType::BusinessPlan => "business_plan",
            DocumentType::LeaseAgreement => "lease_agreement",
            DocumentType::InventoryList => "inventory_list",
            DocumentType::EmployeeList => "employee_list",
            DocumentType::Other => "other",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown document type '{s}'. Must be one of: {}",
                    DocumentType::ALL.map(DocumentType::as_str).join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A stored document belonging to one listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DbId,
    pub listing_id: DbId,
    pub name: String,
    pub document_type: DocumentType,
    pub storage_key: String,
    pub file_size: i64,
    pub mime_type: String,
    pub requires_nda: bool,
    /// Informational: storage-side encryption is always requested.
    pub is_encrypted: bool,
    pub created_at: Timestamp,
}

/// Row values for a document whose bytes are already in the blob store.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub listing_id: DbId,
    pub name: String,
    pub document_type: DocumentType,
    pub storage_key: String,
    pub file_size: i64,
    pub mime_type: String,
    pub requires_nda: bool,
    pub is_encrypted: bool,
}

/// Metadata returned to clients (never the storage key).
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub id: DbId,
    pub listing_id: DbId,
    pub name: String,
    pub document_type: DocumentType,
    pub file_size: i64,
    pub mime_type: String,
    pub requires_nda: bool,
    pub created_at: Timestamp,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            listing_id: doc.listing_id,
            name: doc.name.clone(),
            document_type: doc.document_type,
            file_size: doc.file_size,
            mime_type: doc.mime_type.clone(),
            requires_nda: doc.requires_nda,
            created_at: doc.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject payloads above [`MAX_UPLOAD_BYTES`]. Exactly the limit is accepted.
pub fn validate_upload_size(size: usize) -> Result<(), CoreError> {
    if size > MAX_UPLOAD_BYTES {
        return Err(CoreError::PayloadTooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Reduce a declared content type to its lowercase essence
/// (`"Application/PDF; x=y"` -> `"application/pdf"`).
pub fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Accept only types in [`ALLOWED_MIME_TYPES`]. Returns the normalized type.
pub fn validate_mime_type(content_type: &str) -> Result<String, CoreError> {
    let mime = normalize_mime_type(content_type);
    if ALLOWED_MIME_TYPES.contains(&mime.as_str()) {
        Ok(mime)
    } else {
        Err(CoreError::UnsupportedMediaType(format!(
            "File type not allowed: {content_type}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Storage keys
// ---------------------------------------------------------------------------

/// Keep ASCII alphanumerics and `.-_`; everything else (slashes included)
/// is dropped.
pub fn sanitize_filename(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    if safe.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        safe
    }
}

/// Key prefix shared by every document of one listing.
pub fn listing_prefix(listing_id: DbId) -> String {
    format!("{STORAGE_ROOT}{listing_id}/")
}

/// `listings/{listing_id}/{document_type}/{8 hex}_{sanitized filename}`.
pub fn generate_storage_key(listing_id: DbId, document_type: DocumentType, filename: &str) -> String {
    let unique = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}{}/{}_{}",
        listing_prefix(listing_id),
        document_type,
        &unique[..8],
        sanitize_filename(filename)
    )
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn exactly_fifty_mib_is_accepted() {
        assert!(validate_upload_size(MAX_UPLOAD_BYTES).is_ok());
        assert_matches!(
            validate_upload_size(MAX_UPLOAD_BYTES + 1),
            Err(CoreError::PayloadTooLarge { size, max }) if size == MAX_UPLOAD_BYTES + 1 && max == MAX_UPLOAD_BYTES
        );
    }

    #[test]
    fn pdf_allowed_zip_rejected() {
        assert_eq!(validate_mime_type("application/pdf").unwrap(), "application/pdf");
        assert_matches!(
            validate_mime_type("application/zip"),
            Err(CoreError::UnsupportedMediaType(_))
        );
        assert_matches!(
            validate_mime_type("application/x-msdownload"),
            Err(CoreError::UnsupportedMediaType(_))
        );
    }

    #[test]
    fn mime_parameters_and_case_are_ignored() {
        assert_eq!(validate_mime_type("Text/CSV; charset=utf-8").unwrap(), "text/csv");
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitize_filename("P&L 2023 (final).xlsx"), "PL2023final.xlsx");
        assert_eq!(sanitize_filename("tax_return-2022.pdf"), "tax_return-2022.pdf");
        assert_eq!(sanitize_filename("///"), "document");
    }

    #[test]
    fn storage_key_layout() {
        let key = generate_storage_key(42, DocumentType::TaxReturn, "2022 return.pdf");
        let rest = key.strip_prefix("listings/42/tax_return/").expect("prefix");
        let (unique, name) = rest.split_once('_').expect("separator");
        assert_eq!(unique.len(), 8);
        assert!(unique.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(name, "2022return.pdf");
        assert_eq!(key.matches('/').count(), 3);
    }

    #[test]
    fn storage_keys_are_disambiguated() {
        let a = generate_storage_key(1, DocumentType::Other, "a.pdf");
        let b = generate_storage_key(1, DocumentType::Other, "a.pdf");
        assert_ne!(a, b);
    }

    #[test]
    fn document_type_parses_column_values() {
        for t in DocumentType::ALL {
            assert_eq!(t.as_str().parse::<DocumentType>().unwrap(), t);
        }
        assert_matches!("receipt".parse::<DocumentType>(), Err(CoreError::Validation(_)));
    }
}
