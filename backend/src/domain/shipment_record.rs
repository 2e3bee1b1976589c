//! Permanent shipment ledger rows and the confirmation channel.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BatchId, DollyId, OperatorId, PlateId, StationId, TripId, VinId};

/// Channel through which a shipment is confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationChannel {
    Asn,
    Waybill,
    #[default]
    Both,
}

impl ConfirmationChannel {
    /// Stable storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asn => "asn",
            Self::Waybill => "waybill",
            Self::Both => "both",
        }
    }

    /// Whether the channel confirms through an advance shipping notice.
    pub const fn confirms_asn(self) -> bool {
        matches!(self, Self::Asn | Self::Both)
    }

    /// Whether the channel confirms through a waybill.
    pub const fn confirms_waybill(self) -> bool {
        matches!(self, Self::Waybill | Self::Both)
    }
}

impl fmt::Display for ConfirmationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse failure for [`ConfirmationChannel`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("confirmation channel must be asn, waybill, or both (got {0})")]
pub struct ParseConfirmationChannelError(pub String);

impl FromStr for ConfirmationChannel {
    type Err = ParseConfirmationChannelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asn" => Ok(Self::Asn),
            "waybill" => Ok(Self::Waybill),
            "both" => Ok(Self::Both),
            _ => Err(ParseConfirmationChannelError(value.to_owned())),
        }
    }
}

/// Append-only record of one shipped (dolly, VIN) pair on a trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentRecord {
    pub dolly_id: DollyId,
    pub vin_id: VinId,
    pub trip_id: TripId,
    pub plate_id: PlateId,
    pub batch_id: BatchId,
    pub order_number: i64,
    pub customer_reference: String,
    pub quantity: i32,
    pub station: StationId,
    pub loading_operator: OperatorId,
    pub data_entry_operator: OperatorId,
    pub produced_at: DateTime<Utc>,
    pub loaded_at: DateTime<Utc>,
    pub asn_confirmed_at: Option<DateTime<Utc>>,
    pub waybill_confirmed_at: Option<DateTime<Utc>>,
}
