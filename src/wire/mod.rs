//! Wire layer: message schema, envelope framing, and the sizes
//! descriptor.
//!
//! Everything the link peer sees is defined here. The service layer
//! above works in terms of these types and never touches raw frame
//! bytes directly.

pub mod codec;
pub mod sizes;
pub mod types;

pub use codec::{decode_payload, encode_payload, Framing};
pub use sizes::{SizesDescriptor, SIZES_DESCRIPTOR_LEN};
pub use types::{MessageHeader, MessageType};
