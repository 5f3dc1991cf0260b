pub mod categorization;
pub mod ingestion;
pub mod queries;
