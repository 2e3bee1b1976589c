//! SOAP 1.1 envelope for the `InsertEntDtAsn` operation.
//!
//! Encoding and decoding only; the HTTP exchange lives in the transport.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::domain::DollyId;
use crate::domain::ports::{CarrierReply, CarrierSubmission};

pub(super) const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub(super) const TEMPURI_NS: &str = "http://tempuri.org/";
pub(super) const SOAP_ACTION: &str = "\"http://tempuri.org/InsertEntDtAsn\"";

const COMPLETED_WITHOUT_DESCRIPTION: &str = "operation completed";

/// Account fields embedded in every envelope.
#[derive(Clone, PartialEq, Eq)]
pub struct CarrierCredentials {
    pub username: String,
    pub password: String,
    pub supplier_code: String,
    /// Carrier-side user id; the carrier expects `"0"` unless told otherwise.
    pub user_id: String,
}

impl fmt::Debug for CarrierCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CarrierCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("supplier_code", &self.supplier_code)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Failure while serialising an envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("envelope encoding failed: {0}")]
pub(super) struct EnvelopeError(String);

impl EnvelopeError {
    fn from_display(error: impl fmt::Display) -> Self {
        Self(error.to_string())
    }
}

struct EnvelopeWriter {
    inner: Writer<Cursor<Vec<u8>>>,
}

impl EnvelopeWriter {
    fn new() -> Self {
        Self {
            inner: Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2),
        }
    }

    fn write(&mut self, event: Event<'_>) -> Result<(), EnvelopeError> {
        self.inner
            .write_event(event)
            .map_err(EnvelopeError::from_display)
    }

    fn open(&mut self, name: &str) -> Result<(), EnvelopeError> {
        self.write(Event::Start(BytesStart::new(name)))
    }

    fn close(&mut self, name: &str) -> Result<(), EnvelopeError> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn text(&mut self, name: &str, value: &str) -> Result<(), EnvelopeError> {
        self.open(name)?;
        self.write(Event::Text(BytesText::new(value)))?;
        self.close(name)
    }

    fn finish(self) -> Result<String, EnvelopeError> {
        String::from_utf8(self.inner.into_inner().into_inner()).map_err(EnvelopeError::from_display)
    }
}

/// Serialise `submission` into an `InsertEntDtAsn` request document.
///
/// Items keep their order. `DollyEye` counts VINs within each dolly and
/// starts at 1 for every distinct dolly.
pub(super) fn build_envelope(
    submission: &CarrierSubmission,
    credentials: &CarrierCredentials,
) -> Result<String, EnvelopeError> {
    let mut out = EnvelopeWriter::new();
    out.write(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    out.write(Event::Start(
        BytesStart::new("soapenv:Envelope")
            .with_attributes([("xmlns:soapenv", SOAP_ENV_NS), ("xmlns:tem", TEMPURI_NS)]),
    ))?;
    out.write(Event::Empty(BytesStart::new("soapenv:Header")))?;
    out.open("soapenv:Body")?;
    out.open("tem:InsertEntDtAsn")?;
    out.open("tem:dtasnItem")?;
    out.open("tem:DTASNItem")?;
    out.text("tem:TripCode", submission.trip_id.as_str())?;
    out.text("tem:SupplierCode", &credentials.supplier_code)?;
    out.text("tem:UserId", &credentials.user_id)?;

    out.open("tem:DTASNItemDetails")?;
    let mut eyes: BTreeMap<&DollyId, u32> = BTreeMap::new();
    for item in &submission.items {
        let counter = eyes.entry(&item.dolly_id).or_insert(0);
        *counter += 1;
        let eye = *counter;

        out.open("tem:DTASNItemDetail")?;
        out.text("tem:DollyNumber", &item.order_number.to_string())?;
        out.text("tem:VINNumber", item.vin_id.as_str())?;
        out.text("tem:PartNumber", &item.part_number)?;
        out.text("tem:QTY", &item.quantity.to_string())?;
        out.text(
            "tem:ProcessTime",
            &item.process_date.format("%Y-%m-%d").to_string(),
        )?;
        out.text("tem:WaybillNumber", &item.waybill_number)?;
        out.text("tem:TripReasonCode", &item.reason_code)?;
        out.text("tem:DollyEye", &eye.to_string())?;
        out.close("tem:DTASNItemDetail")?;
    }
    out.close("tem:DTASNItemDetails")?;
    out.close("tem:DTASNItem")?;
    out.close("tem:dtasnItem")?;

    out.text("tem:userName", &credentials.username)?;
    out.text("tem:password", &credentials.password)?;
    out.close("tem:InsertEntDtAsn")?;
    out.close("soapenv:Body")?;
    out.close("soapenv:Envelope")?;
    out.finish()
}

#[derive(Default)]
struct ReplyFields {
    saw_result: bool,
    fault: bool,
    successful: Option<String>,
    description: Option<String>,
    fault_string: Option<String>,
}

impl ReplyFields {
    fn note_element(&mut self, local_name: &[u8]) {
        match local_name {
            b"InsertEntDtAsnResult" => self.saw_result = true,
            b"Fault" => self.fault = true,
            _ => {}
        }
    }

    fn note_text(&mut self, local_name: &[u8], value: String) {
        match local_name {
            b"Successful" => self.successful = Some(value),
            b"ResultDescription" => self.description = Some(value),
            b"faultstring" => self.fault_string = Some(value),
            _ => {}
        }
    }
}

/// Interpret a carrier response body.
///
/// Faults, malformed XML and missing result elements are non-acceptance with
/// a descriptive message, never errors.
pub(super) fn parse_reply(body: &str) -> CarrierReply {
    match scan_reply(body) {
        Ok(fields) => interpret(fields),
        Err(message) => refused(message),
    }
}

fn scan_reply(body: &str) -> Result<ReplyFields, String> {
    let mut reader = Reader::from_str(body);
    let mut fields = ReplyFields::default();
    let mut open_leaf: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                let name = start.local_name().as_ref().to_vec();
                fields.note_element(&name);
                open_leaf = Some(name);
            }
            Ok(Event::Empty(start)) => {
                let name = start.local_name().as_ref().to_vec();
                fields.note_element(&name);
                fields.note_text(&name, String::new());
            }
            Ok(Event::Text(text)) => {
                if let Some(name) = open_leaf.as_deref() {
                    let value = text
                        .unescape()
                        .map_err(|error| format!("malformed carrier response: {error}"))?;
                    fields.note_text(name, value.trim().to_owned());
                }
            }
            Ok(Event::End(_)) => open_leaf = None,
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(error) => return Err(format!("malformed carrier response: {error}")),
        }
    }
    Ok(fields)
}

fn interpret(fields: ReplyFields) -> CarrierReply {
    if fields.fault {
        let detail = fields
            .fault_string
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "unspecified".to_owned());
        return refused(format!("carrier fault: {detail}"));
    }
    if !fields.saw_result {
        return refused("unexpected carrier response: InsertEntDtAsnResult missing".to_owned());
    }
    let Some(successful) = fields.successful else {
        return refused("unexpected carrier response: Successful missing".to_owned());
    };
    let message = fields
        .description
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| COMPLETED_WITHOUT_DESCRIPTION.to_owned());
    CarrierReply {
        accepted: successful.eq_ignore_ascii_case("true"),
        message,
    }
}

fn refused(message: String) -> CarrierReply {
    CarrierReply {
        accepted: false,
        message,
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
