pub mod service;

pub use service::TransactionIngestService;
