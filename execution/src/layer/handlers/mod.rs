use super::*;
use commonware_codec::ReadExt as _;
use commonware_utils::from_hex;
use reflex_types::economy::*;

/// Environment variable holding the hex-encoded owner public key. Privileged
/// instructions from any other signer are rejected.
pub const OWNER_PUBLIC_KEY_ENV: &str = "REFLEX_OWNER_PUBLIC_KEY_HEX";

fn economy_error(player: &PublicKey, error_code: u8, message: impl Into<String>) -> Event {
    Event::EconomyError {
        player: player.clone(),
        code: error_code,
        message: message.into(),
    }
}

fn economy_error_vec(
    player: &PublicKey,
    error_code: u8,
    message: impl Into<String>,
) -> Vec<Event> {
    vec![economy_error(player, error_code, message)]
}

pub(crate) fn is_owner_public_key(public: &PublicKey) -> bool {
    let Ok(hex_key) = std::env::var(OWNER_PUBLIC_KEY_ENV) else {
        return false;
    };
    let Some(bytes) = from_hex(hex_key.trim()) else {
        return false;
    };
    let mut reader = bytes.as_slice();
    match PublicKey::read(&mut reader) {
        Ok(owner) => owner == *public,
        Err(_) => false,
    }
}

mod admin;
mod economy;
mod migration;
mod session;
