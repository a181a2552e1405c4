//! The packed sizes descriptor advertised in the device info response.
//!
//! Clients size their own buffers and batching from these fourteen
//! fields, so the byte layout is a wire contract: two little-endian
//! `u16` values followed by twelve `u8` values, 16 bytes total, no
//! padding.

use crate::config;

pub const SIZES_DESCRIPTOR_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizesDescriptor {
    pub max_message_size: u16,
    pub big_data_buffer_size: u16,
    pub parameter_buffer_count: u8,
    pub num_params_in_response: u8,
    pub description_len: u8,
    pub max_param_bytes: u8,
    pub param_info_description_len: u8,
    pub medium_string_len: u8,
    pub short_string_len: u8,
    pub param_info_enum_count: u8,
    pub num_descriptors_in_response: u8,
    pub num_param_notifications: u8,
    pub num_commands_in_response: u8,
    pub num_param_desc_in_response: u8,
}

impl SizesDescriptor {
    /// The descriptor matching this build's sizing table.
    pub const fn for_this_build() -> Self {
        Self {
            max_message_size: config::MAX_MESSAGE_SIZE as u16,
            big_data_buffer_size: config::BIG_DATA_BUFFER_LEN as u16,
            parameter_buffer_count: config::COUNT_PARAM_IDS as u8,
            num_params_in_response: config::COUNT_MEDIUM_STRUCTS as u8,
            description_len: config::LONG_STRING_LEN as u8,
            max_param_bytes: config::NUM_PARAM_BYTES as u8,
            param_info_description_len: config::PARAM_INFO_DESCRIPTION_LEN as u8,
            medium_string_len: config::MEDIUM_STRING_LEN as u8,
            short_string_len: config::SHORT_STRING_LEN as u8,
            param_info_enum_count: config::COUNT_SMALL_STRUCTS as u8,
            num_descriptors_in_response: config::COUNT_MEDIUM_STRUCTS as u8,
            num_param_notifications: config::NUM_SUPPORTED_PARAM_NOTIFY as u8,
            num_commands_in_response: config::COUNT_COMMANDS_IN_RESPONSE as u8,
            num_param_desc_in_response: config::COUNT_PARAM_DESC_IN_RESPONSE as u8,
        }
    }

    pub const fn pack(&self) -> [u8; SIZES_DESCRIPTOR_LEN] {
        let mms = self.max_message_size.to_le_bytes();
        let bdb = self.big_data_buffer_size.to_le_bytes();
        [
            mms[0],
            mms[1],
            bdb[0],
            bdb[1],
            self.parameter_buffer_count,
            self.num_params_in_response,
            self.description_len,
            self.max_param_bytes,
            self.param_info_description_len,
            self.medium_string_len,
            self.short_string_len,
            self.param_info_enum_count,
            self.num_descriptors_in_response,
            self.num_param_notifications,
            self.num_commands_in_response,
            self.num_param_desc_in_response,
        ]
    }

    pub const fn unpack(raw: &[u8; SIZES_DESCRIPTOR_LEN]) -> Self {
        Self {
            max_message_size: u16::from_le_bytes([raw[0], raw[1]]),
            big_data_buffer_size: u16::from_le_bytes([raw[2], raw[3]]),
            parameter_buffer_count: raw[4],
            num_params_in_response: raw[5],
            description_len: raw[6],
            max_param_bytes: raw[7],
            param_info_description_len: raw[8],
            medium_string_len: raw[9],
            short_string_len: raw[10],
            param_info_enum_count: raw[11],
            num_descriptors_in_response: raw[12],
            num_param_notifications: raw[13],
            num_commands_in_response: raw[14],
            num_param_desc_in_response: raw[15],
        }
    }
}
