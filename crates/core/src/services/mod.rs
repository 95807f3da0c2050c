//! Services the HTTP layer calls. Each takes its collaborators as trait
//! objects so the same code runs against PostgreSQL/S3 and the in-memory
//! stores.

pub mod access_gate;
pub mod document_service;
pub mod listing_service;
pub mod nda_service;

pub use access_gate::AccessGate;
pub use document_service::{DocumentService, DownloadCredential, SweepReport, UploadDocument};
pub use listing_service::ListingService;
pub use nda_service::{NdaAccessStatus, NdaDisposition, NdaOutcome, NdaService};
