//! Local checks on user-supplied mint addresses.
//!
//! Only the length is checked; the scanner service owns deeper validation.

use crate::error::ScanError;

pub const MIN_ADDRESS_LEN: usize = 32;
pub const MAX_ADDRESS_LEN: usize = 44;

/// Trim and validate an address, returning the trimmed form.
///
/// Length is counted in UTF-16 code units, matching the web client.
pub fn validate_address(input: &str) -> Result<&str, ScanError> {
    let address = input.trim();
    if address.is_empty() {
        return Err(ScanError::EmptyAddress);
    }
    let len = address.encode_utf16().count();
    if !(MIN_ADDRESS_LEN..=MAX_ADDRESS_LEN).contains(&len) {
        return Err(ScanError::InvalidAddress);
    }
    Ok(address)
}
