//! Wire message model.
//!
//! Every frame on the link is a [`MessageHeader`] plus one encoded
//! payload struct selected by `message_type`. The structs here are the
//! schema: `serde` derives define the field order, `heapless` types cap
//! every string and list at the sizes the device advertises in its
//! [`crate::wire::sizes::SizesDescriptor`].
//!
//! Tagged unions ([`ParamValue`], [`ParamDesc`]) keep their type
//! identity end to end; a `Uint32` never silently becomes an `Int64`
//! because both fit in eight bytes.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::config::{
    BIG_DATA_BUFFER_LEN, COUNT_COMMANDS_IN_RESPONSE, COUNT_MEDIUM_STRUCTS, COUNT_PARAM_DESC_IN_RESPONSE,
    COUNT_PARAM_IDS, COUNT_SMALL_STRUCTS, LONG_STRING_LEN, MEDIUM_STRING_LEN, NUM_PARAM_BYTES,
    PARAM_INFO_DESCRIPTION_LEN, SHORT_STRING_LEN,
};

// ── Bounded string/byte aliases ───────────────────────────────

/// Units labels, version strings, enum key names.
pub type ShortString = String<SHORT_STRING_LEN>;
/// Names of parameters, files, commands, streams.
pub type MediumString = String<MEDIUM_STRING_LEN>;
/// Parameter-info description text.
pub type InfoString = String<PARAM_INFO_DESCRIPTION_LEN>;
/// Device and command descriptions.
pub type LongString = String<LONG_STRING_LEN>;
/// Error strings, CLI lines, result messages.
pub type BigString = String<BIG_DATA_BUFFER_LEN>;
/// File packets, stream data, ping echo.
pub type BigBytes = Vec<u8, BIG_DATA_BUFFER_LEN>;
/// String-typed parameter values.
pub type ParamString = String<NUM_PARAM_BYTES>;
/// Bytes-typed parameter values.
pub type ParamBytes = Vec<u8, NUM_PARAM_BYTES>;

// ── Message types ─────────────────────────────────────────────

/// Wire message type numbers. The values are the protocol contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MessageType {
    ErrorReport = 1,
    Ping = 2,
    GetDeviceInfo = 3,
    DiscoverParameters = 5,
    DiscoverParamEx = 6,
    ReadParameters = 7,
    WriteParameters = 8,
    ParameterNotification = 10,
    DiscoverNotifications = 11,
    DiscoverFiles = 12,
    TransferInit = 13,
    TransferData = 14,
    TransferDataNotification = 15,
    EraseFile = 16,
    DiscoverCommands = 17,
    SendCommand = 18,
    CliNotification = 20,
    DiscoverStreams = 25,
    OpenStream = 26,
    CloseStream = 27,
    StreamDataNotification = 28,
    SetTime = 30,
    GetTime = 31,
    DiscoverWifi = 40,
    WifiConnect = 41,
    ParamEnableNotify = 50,
    ParamDisableNotify = 51,
}

impl MessageType {
    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Map a raw header field to a known type. `None` means the peer
    /// sent something this build does not implement.
    pub const fn from_u32(raw: u32) -> Option<Self> {
        Some(match raw {
            1 => Self::ErrorReport,
            2 => Self::Ping,
            3 => Self::GetDeviceInfo,
            5 => Self::DiscoverParameters,
            6 => Self::DiscoverParamEx,
            7 => Self::ReadParameters,
            8 => Self::WriteParameters,
            10 => Self::ParameterNotification,
            11 => Self::DiscoverNotifications,
            12 => Self::DiscoverFiles,
            13 => Self::TransferInit,
            14 => Self::TransferData,
            15 => Self::TransferDataNotification,
            16 => Self::EraseFile,
            17 => Self::DiscoverCommands,
            18 => Self::SendCommand,
            20 => Self::CliNotification,
            25 => Self::DiscoverStreams,
            26 => Self::OpenStream,
            27 => Self::CloseStream,
            28 => Self::StreamDataNotification,
            30 => Self::SetTime,
            31 => Self::GetTime,
            40 => Self::DiscoverWifi,
            41 => Self::WifiConnect,
            50 => Self::ParamEnableNotify,
            51 => Self::ParamDisableNotify,
            _ => return None,
        })
    }
}

impl core::fmt::Display for MessageType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::ErrorReport => "Error Report",
            Self::Ping => "Ping",
            Self::GetDeviceInfo => "Get Device Info",
            Self::DiscoverParameters => "Discover Parameters",
            Self::DiscoverParamEx => "Discover Param Ex",
            Self::ReadParameters => "Read Parameters",
            Self::WriteParameters => "Write Parameters",
            Self::ParameterNotification => "Parameter Notification",
            Self::DiscoverNotifications => "Discover Notifications",
            Self::DiscoverFiles => "Discover Files",
            Self::TransferInit => "Transfer Init",
            Self::TransferData => "Transfer Data",
            Self::TransferDataNotification => "Transfer Data Notification",
            Self::EraseFile => "Erase File",
            Self::DiscoverCommands => "Discover Commands",
            Self::SendCommand => "Send Command",
            Self::CliNotification => "CLI Notification",
            Self::DiscoverStreams => "Discover Streams",
            Self::OpenStream => "Open Stream",
            Self::CloseStream => "Close Stream",
            Self::StreamDataNotification => "Stream Data Notification",
            Self::SetTime => "Set Time",
            Self::GetTime => "Get Time",
            Self::DiscoverWifi => "Discover WiFi",
            Self::WifiConnect => "WiFi Connect",
            Self::ParamEnableNotify => "Enable Param Notify",
            Self::ParamDisableNotify => "Disable Param Notify",
        };
        f.write_str(name)
    }
}

// ── Message header ────────────────────────────────────────────

/// The five semantic header fields every frame carries, in both wire
/// layouts. `message_type` stays raw here so unknown types survive the
/// trip to the dispatcher, which answers them with NOT_IMPLEMENTED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageHeader {
    pub message_type: u32,
    /// Routing tag; 0 is the default endpoint.
    pub endpoint_id: u32,
    /// Opaque peer tag assigned by the application.
    pub client_id: u32,
    /// Non-zero marks a continued response with this many to follow.
    pub remaining_objects: u32,
    /// Stable across all frames of one continued transaction.
    pub transaction_id: u32,
}

impl MessageHeader {
    pub fn new(message_type: MessageType) -> Self {
        Self {
            message_type: message_type.as_u32(),
            ..Self::default()
        }
    }
}

// ── Service IDs ───────────────────────────────────────────────

/// Service bits advertised in the device-info `services` bitmask and
/// used by the access gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ServiceId {
    Parameters = 1,
    Files = 2,
    Streams = 4,
    Commands = 8,
    Cli = 16,
    Time = 32,
    Wifi = 64,
}

impl ServiceId {
    pub const fn mask(self) -> u32 {
        self as u32
    }
}

// ── Shared field enums ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessLevel {
    NoAccess,
    Read,
    Write,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageLocation {
    None,
    Ram,
    Nonvolatile,
    RamExtended,
    NonvolatileExtended,
}

/// Parameter data types. Order matters: [`ParamValue`] and
/// [`ParamDesc`] variants mirror it so all three tags agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    Uint32,
    Int32,
    Float32,
    Uint64,
    Int64,
    Float64,
    Bool,
    String,
    Enumeration,
    Bitfield,
    Bytes,
}

// ── Error report (1) ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub result: i32,
    pub result_message: BigString,
}

// ── Ping (2) ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingRequest {
    pub echo_data: BigBytes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingResponse {
    pub echo_data: BigBytes,
    /// RSSI in dBm when the link can report it, else 0.
    pub signal_strength: i32,
}

// ── Device info (3) ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfoRequest {
    /// Opaque key unlocking gated services; judged by the application.
    pub challenge_key: Option<ParamString>,
    /// Client's protocol version, "MAJOR.MINOR.PATCH".
    pub client_protocol_version: ShortString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfoResponse {
    pub protocol_version: ShortString,
    pub device_name: MediumString,
    pub manufacturer: MediumString,
    pub device_description: LongString,
    pub firmware_version: ShortString,
    /// Hash of the parameter descriptor table; clients cache on it.
    pub parameter_metadata_hash: u32,
    /// Bitmask of [`ServiceId`] values this device exposes.
    pub services: u32,
    /// Packed sizes descriptor; see [`crate::wire::sizes`].
    pub sizes_struct: [u8; 16],
}

impl Default for DeviceInfoResponse {
    fn default() -> Self {
        Self {
            protocol_version: ShortString::new(),
            device_name: MediumString::new(),
            manufacturer: MediumString::new(),
            device_description: LongString::new(),
            firmware_version: ShortString::new(),
            parameter_metadata_hash: 0,
            services: 0,
            sizes_struct: [0; 16],
        }
    }
}

// ── Parameter descriptors (5, 6) ──────────────────────────────

/// Request for DISCOVER_PARAMETERS and DISCOVER_PARAM_EX. An empty ID
/// list asks for everything.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterInfoRequest {
    pub parameter_ids: Vec<u32, COUNT_PARAM_IDS>,
}

/// Type-specific descriptor detail. The variant order mirrors
/// [`ParamType`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamDesc {
    Uint32 {
        range_min: Option<u32>,
        range_max: Option<u32>,
        default_value: Option<u32>,
        units: Option<ShortString>,
    },
    Int32 {
        range_min: Option<i32>,
        range_max: Option<i32>,
        default_value: Option<i32>,
        units: Option<ShortString>,
    },
    Float32 {
        range_min: Option<f32>,
        range_max: Option<f32>,
        default_value: Option<f32>,
        precision: Option<u32>,
        units: Option<ShortString>,
    },
    Uint64 {
        range_min: Option<u64>,
        range_max: Option<u64>,
        default_value: Option<u64>,
        units: Option<ShortString>,
    },
    Int64 {
        range_min: Option<i64>,
        range_max: Option<i64>,
        default_value: Option<i64>,
        units: Option<ShortString>,
    },
    Float64 {
        range_min: Option<f64>,
        range_max: Option<f64>,
        default_value: Option<f64>,
        precision: Option<u32>,
        units: Option<ShortString>,
    },
    Bool {
        default_value: Option<bool>,
        /// Key-set ID for label lookup via DISCOVER_PARAM_EX.
        pei_id: Option<u32>,
    },
    String {
        default_value: Option<ParamString>,
        max_size: u32,
    },
    Enumeration {
        default_value: Option<u32>,
        pei_id: Option<u32>,
        units: Option<ShortString>,
    },
    Bitfield {
        default_value: Option<u64>,
        bits_available: u32,
        pei_id: Option<u32>,
    },
    Bytes {
        default_value: Option<ParamBytes>,
        max_size: u32,
    },
}

impl ParamDesc {
    pub const fn param_type(&self) -> ParamType {
        match self {
            Self::Uint32 { .. } => ParamType::Uint32,
            Self::Int32 { .. } => ParamType::Int32,
            Self::Float32 { .. } => ParamType::Float32,
            Self::Uint64 { .. } => ParamType::Uint64,
            Self::Int64 { .. } => ParamType::Int64,
            Self::Float64 { .. } => ParamType::Float64,
            Self::Bool { .. } => ParamType::Bool,
            Self::String { .. } => ParamType::String,
            Self::Enumeration { .. } => ParamType::Enumeration,
            Self::Bitfield { .. } => ParamType::Bitfield,
            Self::Bytes { .. } => ParamType::Bytes,
        }
    }
}

/// One parameter descriptor as the repository publishes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamInfo {
    /// Parameter ID, at most 15 bits.
    pub id: u32,
    pub name: MediumString,
    pub description: InfoString,
    pub access: AccessLevel,
    pub storage_location: StorageLocation,
    pub desc: ParamDesc,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterInfoResponse {
    pub parameter_infos: Vec<ParamInfo, COUNT_PARAM_DESC_IN_RESPONSE>,
}

/// One labelled key of an enumeration, bitfield, or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamExKey {
    pub id: u32,
    pub name: ShortString,
}

/// One extended-info object; a discover-ex reply carries exactly one
/// of these per message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamExInfoResponse {
    pub associated_pid: u32,
    pub data_type: ParamType,
    pub keys: Vec<ParamExKey, COUNT_SMALL_STRUCTS>,
}

// ── Parameter values (7, 8, 10) ───────────────────────────────

/// A parameter value with its wire type tag. Variant order mirrors
/// [`ParamType`]; widening on read is forbidden.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Uint32(u32),
    Int32(i32),
    Float32(f32),
    Uint64(u64),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    String(ParamString),
    Enumeration(u32),
    Bitfield(u64),
    Bytes(ParamBytes),
}

impl ParamValue {
    pub const fn param_type(&self) -> ParamType {
        match self {
            Self::Uint32(_) => ParamType::Uint32,
            Self::Int32(_) => ParamType::Int32,
            Self::Float32(_) => ParamType::Float32,
            Self::Uint64(_) => ParamType::Uint64,
            Self::Int64(_) => ParamType::Int64,
            Self::Float64(_) => ParamType::Float64,
            Self::Bool(_) => ParamType::Bool,
            Self::String(_) => ParamType::String,
            Self::Enumeration(_) => ParamType::Enumeration,
            Self::Bitfield(_) => ParamType::Bitfield,
            Self::Bytes(_) => ParamType::Bytes,
        }
    }
}

/// A value bound to its parameter and read timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamValueRecord {
    pub parameter_id: u32,
    /// Tick time of the read, for client-side ordering.
    pub timestamp: u32,
    /// Non-zero when this slot failed (e.g. INVALID_ID for an unknown
    /// PID in an explicit list).
    pub result: i32,
    pub value: ParamValue,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterRead {
    pub parameter_ids: Vec<u32, COUNT_PARAM_IDS>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterReadResponse {
    pub values: Vec<ParamValueRecord, COUNT_MEDIUM_STRUCTS>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterWrite {
    pub values: Vec<ParamValueRecord, COUNT_MEDIUM_STRUCTS>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ParameterWriteResponse {
    pub result: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterNotification {
    pub values: Vec<ParamValueRecord, COUNT_MEDIUM_STRUCTS>,
}

// ── Notification configuration (11, 50, 51) ───────────────────

/// Per-parameter notification policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamNotifyConfig {
    pub parameter_id: u32,
    /// No two notifications closer than this, in ticks.
    pub minimum_notification_period: u32,
    /// Heartbeat: notify at least this often even unchanged. 0 disables.
    pub maximum_notification_period: u32,
    /// Smallest change that counts as significant.
    pub minimum_delta: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamEnableNotifications {
    pub configs: Vec<ParamNotifyConfig, COUNT_SMALL_STRUCTS>,
    /// Clear the whole table before applying `configs`.
    pub disable_all_first: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamDisableNotifications {
    pub parameter_ids: Vec<u32, COUNT_PARAM_IDS>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamNotifyConfigResponse {
    pub result: i32,
    pub result_message: Option<BigString>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscoverNotifications {
    /// Empty list checks every active slot.
    pub parameter_ids: Vec<u32, COUNT_PARAM_IDS>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscoverNotificationsResponse {
    pub configs: Vec<ParamNotifyConfig, COUNT_SMALL_STRUCTS>,
}

// ── File service (12–16) ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoverFiles {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub file_id: u32,
    pub file_name: MediumString,
    pub access: AccessLevel,
    pub current_size_bytes: u32,
    pub storage_location: StorageLocation,
    pub require_checksum: bool,
    pub maximum_size_bytes: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscoverFilesResponse {
    pub file_infos: Vec<FileInfo, COUNT_MEDIUM_STRUCTS>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferDirection {
    /// Device to client.
    Read,
    /// Client to device.
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTransferRequest {
    pub file_id: u32,
    pub read_write: TransferDirection,
    pub request_offset: u32,
    pub transfer_length: u32,
    pub transfer_id: u32,
    /// Watchdog budget; 0 disables the watchdog.
    pub timeout_in_ms: u32,
    pub requested_ack_rate: Option<u32>,
    pub require_checksum: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileTransferResponse {
    pub result: i32,
    pub transfer_id: u32,
    /// Data frames between acknowledgements, after negotiation.
    pub ack_rate: u32,
    /// May be reduced when the file is shorter than requested.
    pub transfer_length: u32,
    pub result_message: Option<BigString>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileTransferData {
    pub result: i32,
    pub transfer_id: u32,
    /// 1-based within the transfer (read) or within the current ack
    /// window (write).
    pub message_number: u32,
    pub message_data: BigBytes,
    /// RFC 1071 checksum over `message_data`, when negotiated.
    pub checksum: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileTransferDataNotification {
    pub result: i32,
    pub result_message: Option<BigString>,
    pub is_complete: bool,
    pub transfer_id: u32,
    /// Where the sender should resume after an error.
    pub retry_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEraseRequest {
    pub file_id: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEraseResponse {
    pub result: i32,
    pub file_id: u32,
    pub result_message: Option<BigString>,
}

// ── Command service (17, 18) ──────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoverCommands {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandInfo {
    pub id: u32,
    pub name: MediumString,
    pub description: Option<LongString>,
    pub timeout_in_ms: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscoverCommandsResponse {
    pub available_commands: Vec<CommandInfo, COUNT_COMMANDS_IN_RESPONSE>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendCommand {
    pub command_id: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SendCommandResponse {
    pub result: i32,
    pub result_message: Option<BigString>,
}

// ── CLI (20) ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CliData {
    pub message_data: BigString,
}

// ── Stream service (25–28) ────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoverStreams {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamDirection {
    DeviceToClient,
    ClientToDevice,
    Bidirectional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamInfo {
    pub stream_id: u32,
    pub name: MediumString,
    pub description: LongString,
    pub access: AccessLevel,
    pub direction: StreamDirection,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiscoverStreamsResponse {
    pub streams: Vec<StreamInfo, COUNT_MEDIUM_STRUCTS>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOpen {
    pub stream_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamClose {
    pub stream_id: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamResponse {
    pub stream_id: u32,
    pub result: i32,
    pub result_message: Option<BigString>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamData {
    pub stream_id: u32,
    /// Increments per frame so the receiver can spot drops.
    pub roll_count: u32,
    pub message_data: BigBytes,
    pub checksum: Option<i32>,
}

// ── Time service (30, 31) ─────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSetRequest {
    pub seconds_utc: i64,
    /// Offset from UTC in seconds.
    pub timezone: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSetResponse {
    pub result: i32,
    pub result_message: Option<BigString>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeGetRequest {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeGetResponse {
    pub result: i32,
    pub seconds_utc: i64,
    pub timezone: Option<i32>,
}

// ── Wi-Fi service (40, 41) ────────────────────────────────────

/// SSIDs are 802.11-bounded at 32 octets.
pub type Ssid = String<32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiscoverWifiRequest {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiSecurity {
    Open,
    Wep,
    Wpa,
    Wpa2,
    Wpa3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiBand {
    Band2G4,
    Band5G,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionDescription {
    pub ssid: Ssid,
    pub signal_strength: i32,
    pub security: WifiSecurity,
    pub band: WifiBand,
    pub is_connected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverWifiResponse {
    pub result: i32,
    /// One access point per message; continuation covers the rest.
    pub access_point: Option<ConnectionDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WifiConnectionRequest {
    pub ssid: Ssid,
    pub password: Option<ParamString>,
    pub autoconnect: bool,
    pub disconnect: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WifiConnectionResponse {
    pub result: i32,
    pub signal_strength: Option<i32>,
    pub result_message: Option<BigString>,
}
