//! Reqwest-backed SOAP transport for the carrier confirmation endpoint.
//!
//! This adapter owns transport details only: envelope encoding, TLS floor,
//! timeout and HTTP status mapping. Retry decisions belong to the gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url, tls};
use tracing::debug;

use super::envelope::{CarrierCredentials, SOAP_ACTION, build_envelope, parse_reply};
use crate::domain::ports::{
    CarrierReply, CarrierSubmission, CarrierTransport, CarrierTransportError,
};

const USER_AGENT: &str = "dolly-backend-carrier/0.1";

/// Endpoint, account and timeout settings for the carrier transport.
#[derive(Debug, Clone)]
pub struct CarrierHttpSettings {
    pub endpoint: Url,
    pub credentials: CarrierCredentials,
    /// Per-attempt request timeout.
    pub timeout: Duration,
}

/// Carrier transport that posts SOAP envelopes to one endpoint.
pub struct SoapCarrierTransport {
    client: Client,
    endpoint: Url,
    credentials: CarrierCredentials,
}

impl SoapCarrierTransport {
    /// Build the transport with a client that refuses TLS below 1.2.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(settings: CarrierHttpSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .min_tls_version(tls::Version::TLS_1_2)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint: settings.endpoint,
            credentials: settings.credentials,
        })
    }
}

#[async_trait]
impl CarrierTransport for SoapCarrierTransport {
    async fn submit(
        &self,
        submission: &CarrierSubmission,
    ) -> Result<CarrierReply, CarrierTransportError> {
        let envelope = build_envelope(submission, &self.credentials)
            .map_err(|error| CarrierTransportError::invalid_request(error.to_string()))?;
        debug!(
            trip_id = %submission.trip_id,
            items = submission.items.len(),
            bytes = envelope.len(),
            "posting carrier envelope"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header(ACCEPT, "text/xml")
            .header("SOAPAction", SOAP_ACTION)
            .body(envelope)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_bytes()));
        }
        Ok(parse_reply(&body))
    }

    async fn probe(&self) -> Result<u16, CarrierTransportError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(map_transport_error)?;
        Ok(response.status().as_u16())
    }
}

fn map_transport_error(error: reqwest::Error) -> CarrierTransportError {
    if error.is_timeout() {
        CarrierTransportError::timeout(error.to_string())
    } else {
        CarrierTransportError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CarrierTransportError {
    let preview = body_preview(body);
    let code = status.as_u16();
    let message = if preview.is_empty() {
        format!("status {code}")
    } else {
        format!("status {code}: {preview}")
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => CarrierTransportError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            CarrierTransportError::timeout(message)
        }
        _ => CarrierTransportError::unavailable(code, message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network status mapping.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::rate_limited(StatusCode::TOO_MANY_REQUESTS, true)]
    #[case::request_timeout(StatusCode::REQUEST_TIMEOUT, true)]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, true)]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, true)]
    #[case::unavailable(StatusCode::SERVICE_UNAVAILABLE, true)]
    #[case::bad_request(StatusCode::BAD_REQUEST, true)]
    #[case::unauthorised(StatusCode::UNAUTHORIZED, true)]
    #[case::not_found(StatusCode::NOT_FOUND, true)]
    fn statuses_map_to_retryability(#[case] status: StatusCode, #[case] retryable: bool) {
        let error = map_status_error(status, b"<fault>busy</fault>");
        assert_eq!(error.is_retryable(), retryable);
    }

    #[rstest]
    fn client_errors_are_unavailable_with_their_status() {
        let error = map_status_error(StatusCode::FORBIDDEN, b"");
        assert_eq!(error, CarrierTransportError::unavailable(403_u16, "status 403"));
    }

    #[rstest]
    fn server_errors_keep_their_status_and_preview() {
        let error = map_status_error(StatusCode::BAD_GATEWAY, b"upstream\n  down");
        assert_eq!(
            error,
            CarrierTransportError::unavailable(502_u16, "status 502: upstream down")
        );
    }

    #[rstest]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(400);
        let preview = body_preview(body.as_bytes());
        assert_eq!(preview.chars().count(), 163);
        assert!(preview.ends_with("..."));
    }

    #[rstest]
    fn client_builds_with_tls_floor() {
        let settings = CarrierHttpSettings {
            endpoint: Url::parse("https://carrier.invalid/asn.asmx").expect("url"),
            credentials: CarrierCredentials {
                username: "svc".to_owned(),
                password: "pw".to_owned(),
                supplier_code: "SUP".to_owned(),
                user_id: "0".to_owned(),
            },
            timeout: Duration::from_secs(30),
        };
        assert!(SoapCarrierTransport::new(settings).is_ok());
    }
}
