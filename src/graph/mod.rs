pub mod nouns;
pub mod relations;
pub mod transcripts;
pub mod types;
pub mod users;
pub mod view;
