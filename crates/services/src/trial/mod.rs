pub mod ports;
pub mod service;

pub use ports::{TrialError, TrialRecord, TrialRepository, TrialService, TrialStatus};
pub use service::TrialServiceImpl;
