pub mod document;
pub mod listing;
pub mod nda;
