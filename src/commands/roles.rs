//! Access levels supplied by the host for each command invocation.
//!
//! Higher values imply every capability of the lower ones. Use [role_name] for display.
pub const LEVEL_USER: u8 = 1;
/// May broadcast command output to the room
pub const LEVEL_VOICE: u8 = 2;
/// May manage the shop catalog and read everyone's receipts
pub const LEVEL_DRIVER: u8 = 5;
/// Console-level staff; required for the file commands and wallet grants
pub const LEVEL_CONSOLE: u8 = 10;

pub fn role_name(level: u8) -> &'static str {
    match level {
        l if l >= LEVEL_CONSOLE => "Console",
        l if l >= LEVEL_DRIVER => "Driver",
        l if l >= LEVEL_VOICE => "Voice",
        _ => "User",
    }
}
