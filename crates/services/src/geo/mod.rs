pub mod ports;
pub mod service;

pub use ports::{GeoCurrency, GeoLocator, GeoService};
pub use service::{GeoServiceImpl, HttpGeoLocator};
