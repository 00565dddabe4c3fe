//! Parsing helpers for addresses and hex-encoded bytes.

use crate::identity::AccountAddress;

/// Parses an account address from its `shard.realm.num` string form.
///
/// # Arguments
/// * `input` - A string slice such as `"0.0.1234"`.
///
/// # Returns
/// * `Ok(AccountAddress)` - If all three components parse as unsigned
///   integers.
/// * `Err(String)` - If the shape or any component is invalid.
pub fn parse_account_address(input: &str) -> Result<AccountAddress, String> {
    let mut parts = input.split('.');
    let mut next = |name: &str| {
        parts
            .next()
            .ok_or_else(|| format!("address is missing its {name} component"))?
            .parse::<u64>()
            .map_err(|_| format!("invalid {name} component in address '{input}'"))
    };
    let shard = next("shard")?;
    let realm = next("realm")?;
    let num = next("account number")?;
    if parts.next().is_some() {
        return Err(format!("address '{input}' has trailing components"));
    }
    Ok(AccountAddress { shard, realm, num })
}

/// Decodes hex bytes, tolerating a leading `0x` prefix.
pub fn parse_hex_bytes(hex_str: &str) -> Result<Vec<u8>, String> {
    let hex_str = hex_str.trim_start_matches("0x");
    hex::decode(hex_str).map_err(|_| "Invalid hex string".to_string())
}
