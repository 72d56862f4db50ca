//! Wire constants for the HID transport and U2FHID command set.

/// Length in bytes of every HID frame, init or continuation.
pub const FRAME_LEN: usize = 64;

/// Length of an init packet's fixed header (`cid` + `cmd` + `bcnt`).
pub const INIT_HEADER_LEN: usize = 7;

/// Length of a continuation packet's fixed header (`cid` + `seq`).
pub const CONT_HEADER_LEN: usize = 5;

/// Maximum payload bytes an init packet can carry.
pub const INIT_PAYLOAD_MAX: usize = FRAME_LEN - INIT_HEADER_LEN;

/// Maximum payload bytes a continuation packet can carry.
pub const CONT_PAYLOAD_MAX: usize = FRAME_LEN - CONT_HEADER_LEN;

/// Bit distinguishing init packets (set) from continuation packets (clear)
/// in the fifth byte of a frame.
pub const TYPE_INIT_MASK: u8 = 0x80;

/// Mask for the sequence number carried by a continuation packet.
pub const CONT_SEQ_MASK: u8 = 0x7F;

/// Highest legal continuation sequence number.
pub const CONT_SEQ_MAX: u8 = 0x7F;

/// Reserved, always-invalid channel id.
pub const NULL_CID: u32 = 0x0000_0000;

/// The broadcast channel id, valid only while requesting `CMD_INIT`.
pub const BROADCAST_CID: u32 = 0xFFFF_FFFF;

/// `U2FHID_PING`: echo payload back unchanged.
pub const CMD_PING: u8 = 0x80 | 0x01;

/// `U2FHID_MSG`: an encapsulated U2F raw message (APDU).
pub const CMD_MSG: u8 = 0x80 | 0x03;

/// `U2FHID_LOCK`: lock a channel's exclusive access to the device.
pub const CMD_LOCK: u8 = 0x80 | 0x04;

/// `U2FHID_INIT`: allocate a channel / query protocol and device info.
pub const CMD_INIT: u8 = 0x80 | 0x06;

/// `U2FHID_WINK`: request a visible/audible identification signal.
pub const CMD_WINK: u8 = 0x80 | 0x08;

/// `U2FHID_ERROR`: carries a single-byte error code as its payload.
pub const CMD_ERROR: u8 = 0x80 | 0x3F;

/// `U2FHID_IF_VERSION`: the `U2FHID` protocol version implemented here.
pub const PROTOCOL_VERSION: u8 = 2;

/// No error.
pub const ERR_NONE: u8 = 0x00;
/// The request invoked an unsupported `U2FHID` command.
pub const ERR_INVALID_CMD: u8 = 0x01;
/// The request contained an invalid parameter.
pub const ERR_INVALID_PAR: u8 = 0x02;
/// The request's declared length doesn't match what was received.
pub const ERR_INVALID_LEN: u8 = 0x03;
/// A continuation packet arrived with an unexpected sequence number.
pub const ERR_INVALID_SEQ: u8 = 0x04;
/// A message was not completed within the reassembly deadline.
pub const ERR_MSG_TIMEOUT: u8 = 0x05;
/// The channel is busy processing another transaction.
pub const ERR_CHANNEL_BUSY: u8 = 0x06;
/// Channel requires a lock but is not locked by the caller.
pub const ERR_LOCK_REQUIRED: u8 = 0x0A;
/// Invalid channel id.
pub const ERR_INVALID_CID: u8 = 0x0B;
/// Unspecified error.
pub const ERR_OTHER: u8 = 0x7F;

/// `U2F_REGISTER`: enroll a new key handle for an application.
pub const U2F_REGISTER: u8 = 0x01;
/// `U2F_AUTHENTICATE`: sign a challenge with an existing key handle.
pub const U2F_AUTHENTICATE: u8 = 0x02;
/// `U2F_VERSION`: report the supported U2F raw-message protocol version.
pub const U2F_VERSION: u8 = 0x03;

/// `P1` value for AUTHENTICATE: check-only, never touches user presence.
pub const U2F_AUTH_CHECK: u8 = 0x07;
/// `P1` value for AUTHENTICATE: require user presence before signing.
pub const U2F_AUTH_ENFORCE: u8 = 0x03;
/// `P1` value for AUTHENTICATE: sign without requiring user presence.
pub const U2F_AUTH_NO_ENFORCE: u8 = 0x08;

/// Success.
pub const SW_NO_ERROR: u16 = 0x9000;
/// The key handle's application parameter didn't match, or the handle was
/// otherwise rejected (`U2F_AUTH_CHECK` uses this to say "not mine").
pub const SW_WRONG_DATA: u16 = 0x6A80;
/// User presence is required and was not given.
pub const SW_CONDITIONS_NOT_SATISFIED: u16 = 0x6985;
/// Unsupported `INS` byte.
pub const SW_INS_NOT_SUPPORTED: u16 = 0x6D00;
/// Unsupported `CLA` byte.
pub const SW_CLA_NOT_SUPPORTED: u16 = 0x6E00;

/// Reassembly aborts if more than this elapses without a frame for the
/// channel's in-flight message.
pub const REASSEMBLY_TIMEOUT: std::time::Duration = std::time::Duration::from_millis(500);

/// Channels with no activity for this long are eligible for reaping.
pub const CHANNEL_IDLE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);

/// Largest `bcnt` a message is allowed to declare. `U2FHID`'s 16-bit length
/// field could in theory reach 64 KiB, but every deployed transceiver caps
/// messages well below that; we use the widely adopted 7609-byte bound.
pub const MAX_MESSAGE_LEN: usize = 7609;
