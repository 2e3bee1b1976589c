//! Carrier confirmation adapters.
//!
//! A thin SOAP-over-HTTP implementation of the `CarrierTransport` port.

mod envelope;
mod http_transport;

pub use envelope::CarrierCredentials;
pub use http_transport::{CarrierHttpSettings, SoapCarrierTransport};
