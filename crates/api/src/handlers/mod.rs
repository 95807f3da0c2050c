pub mod documents;
pub mod listings;
pub mod ndas;
