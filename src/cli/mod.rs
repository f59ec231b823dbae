pub mod doctor;
pub mod graph;
pub mod ingest;
pub mod search;
