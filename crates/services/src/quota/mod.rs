pub mod ports;
pub mod service;

pub use ports::{QuotaConsumption, QuotaError, QuotaLedgerRepository, QuotaService, QuotaWindow};
pub use service::QuotaServiceImpl;
