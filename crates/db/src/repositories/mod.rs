//! Zero-sized repositories, one per table.

pub mod document_repo;
pub mod listing_repo;
pub mod nda_repo;

pub use document_repo::DocumentRepo;
pub use listing_repo::ListingRepo;
pub use nda_repo::NdaRepo;
