// Library interface for the morning-news modules
// This allows tests and other binaries to import modules

pub mod assistant;
pub mod ingestion;
pub mod llm;
pub mod preferences;
pub mod server;
pub mod sessions;
pub mod storage;
pub mod worker;
