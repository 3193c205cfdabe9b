//! The in-band `AESDCHAR_IOCSEEKTO` seek command.
//!
//! When the socket server is backed by the character device, a message
//! equal to this exact literal is translated into the device ioctl instead
//! of being written through to the store.

/// `"AESDCHAR_IOCSEEKTO:"` — the first 19 bytes of a seek command.
const PREFIX: &[u8] = b"AESDCHAR_IOCSEEKTO:";

/// Total length of `AESDCHAR_IOCSEEKTO:X,Y\n`.
const COMMAND_LEN: usize = 23;

/// Index of the `write_cmd` digit.
const CMD_DIGIT_POS: usize = 19;
/// Index of the `write_cmd_offset` digit.
const OFFSET_DIGIT_POS: usize = 21;

/// Parses `message` as `AESDCHAR_IOCSEEKTO:X,Y\n`, where `X` and `Y` are
/// single ASCII digits. Returns `None` for anything else, including a
/// prefix match with the wrong total length or non-digit payload — such a
/// message is written through to the store like any other command.
pub fn parse(message: &[u8]) -> Option<(u8, u8)> {
    if message.len() != COMMAND_LEN {
        return None;
    }
    if &message[..PREFIX.len()] != PREFIX {
        return None;
    }
    let cmd = message[CMD_DIGIT_POS];
    let comma = message[CMD_DIGIT_POS + 1];
    let offset = message[OFFSET_DIGIT_POS];
    let newline = message[OFFSET_DIGIT_POS + 1];

    if cmd.is_ascii_digit() && comma == b',' && offset.is_ascii_digit() && newline == b'\n' {
        Some((cmd - b'0', offset - b'0'))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_command() {
        assert_eq!(parse(b"AESDCHAR_IOCSEEKTO:3,7\n"), Some((3, 7)));
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(parse(b"AESDCHAR_IOCSEEKTO:3,7"), None);
        assert_eq!(parse(b"AESDCHAR_IOCSEEKTO:3,70\n"), None);
    }

    #[test]
    fn rejects_non_digit_payload() {
        assert_eq!(parse(b"AESDCHAR_IOCSEEKTO:a,7\n"), None);
        assert_eq!(parse(b"AESDCHAR_IOCSEEKTO:3;7\n"), None);
    }

    #[test]
    fn rejects_wrong_prefix() {
        assert_eq!(parse(b"AESDCHAR_IOCSEEKT0:3,7\n"), None);
    }

    #[test]
    fn ordinary_messages_are_not_mistaken_for_seek_commands() {
        assert_eq!(parse(b"hello\n"), None);
    }
}
