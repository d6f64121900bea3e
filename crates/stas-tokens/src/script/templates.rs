//! Byte layout constants for classifying token locking scripts.

/// Length of a public key hash.
pub const PKH_LEN: usize = 20;

/// STAS v2 prefix: OP_DUP OP_HASH160 OP_DATA_20.
pub const STAS_V2_PREFIX: [u8; 3] = [0x76, 0xa9, 0x14];

/// Bytes right after the owner hash in a STAS v2 script:
/// OP_EQUALVERIFY OP_CHECKSIG OP_VERIFY OP_DUP OP_HASH160 OP_16.
pub const STAS_V2_MARKER: [u8; 6] = [0x88, 0xac, 0x69, 0x76, 0xaa, 0x60];

/// Owner hash position in a STAS v2 script (bytes 3..23).
pub const STAS_V2_OWNER_OFFSET: usize = 3;

/// Where `STAS_V2_MARKER` starts.
pub const STAS_V2_MARKER_OFFSET: usize = STAS_V2_OWNER_OFFSET + PKH_LEN;

/// Template length up to and including the redemption hash. Flags and
/// token metadata pushes follow.
pub const STAS_V2_TEMPLATE_LEN: usize = 1431;

/// OP_RETURN position in the STAS v2 template.
pub const STAS_V2_OP_RETURN_OFFSET: usize = 1409;

/// Redemption hash position (bytes 1411..1431), after an OP_DATA_20 at 1410.
pub const STAS_V2_REDEMPTION_OFFSET: usize = 1411;

/// Shortest STAS v2 script: the template plus at least a flags byte.
pub const STAS_V2_MIN_LEN: usize = STAS_V2_TEMPLATE_LEN + 1;

/// dSTAS base template prefix: OP_2MUL OP_SIZE OP_OVER OP_IF.
pub const DSTAS_BASE_PREFIX: [u8; 4] = [0x6d, 0x82, 0x73, 0x63];

/// Length of the compiled dSTAS base template. Its last byte is OP_RETURN.
pub const DSTAS_BASE_TEMPLATE_LEN: usize = 2812;

/// dSTAS action data marking a frozen token (OP_2).
pub const DSTAS_FROZEN_MARKER: u8 = 0x52;
