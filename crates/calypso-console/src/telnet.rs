//! Minimal telnet option handling for the controller VTY.
//!
//! The VTY opens with a handful of option offers (echo, suppress-go-ahead,
//! linemode). We behave like a plain line client: refuse everything and
//! strip the negotiation bytes out of the text stream.

const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterState {
    Data,
    Iac,
    /// Waiting for the option byte following WILL/WONT/DO/DONT
    Option(u8),
    Sub,
    SubIac,
}

/// Stateful IAC filter. Sequences split across reads are carried over.
#[derive(Debug)]
pub struct TelnetFilter {
    state: FilterState,
}

impl Default for TelnetFilter {
    fn default() -> Self {
        Self { state: FilterState::Data }
    }
}

impl TelnetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds raw socket bytes. Plain text goes to `text`, negotiation
    /// answers that must be written back to the peer go to `replies`.
    pub fn feed(&mut self, input: &[u8], text: &mut Vec<u8>, replies: &mut Vec<u8>) {
        for &b in input {
            self.state = match self.state {
                FilterState::Data => match b {
                    IAC => FilterState::Iac,
                    // Telnet CR NUL
                    0 => FilterState::Data,
                    _ => {
                        text.push(b);
                        FilterState::Data
                    }
                },
                FilterState::Iac => match b {
                    IAC => {
                        text.push(IAC);
                        FilterState::Data
                    }
                    WILL | WONT | DO | DONT => FilterState::Option(b),
                    SB => FilterState::Sub,
                    // NOP, GA, DM and friends carry no payload
                    _ => FilterState::Data,
                },
                FilterState::Option(cmd) => {
                    match cmd {
                        DO => replies.extend_from_slice(&[IAC, WONT, b]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, b]),
                        _ => {}
                    }
                    FilterState::Data
                }
                FilterState::Sub => match b {
                    IAC => FilterState::SubIac,
                    _ => FilterState::Sub,
                },
                FilterState::SubIac => match b {
                    SE => FilterState::Data,
                    _ => FilterState::Sub,
                },
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(filter: &mut TelnetFilter, input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut text = Vec::new();
        let mut replies = Vec::new();
        filter.feed(input, &mut text, &mut replies);
        (text, replies)
    }

    #[test]
    fn test_plain_text_passes() {
        let mut f = TelnetFilter::new();
        let (text, replies) = run(&mut f, b"OpenBSC> ");
        assert_eq!(text, b"OpenBSC> ");
        assert!(replies.is_empty());
    }

    #[test]
    fn test_vty_greeting_negotiation() {
        // WILL ECHO, WILL SGA, DONT LINEMODE, then the banner
        let mut input = vec![IAC, WILL, 1, IAC, WILL, 3, IAC, DONT, 34];
        input.extend_from_slice(b"Welcome\r\nOpenBSC> ");
        let mut f = TelnetFilter::new();
        let (text, replies) = run(&mut f, &input);
        assert_eq!(text, b"Welcome\r\nOpenBSC> ");
        assert_eq!(replies, vec![IAC, DONT, 1, IAC, DONT, 3]);
    }

    #[test]
    fn test_do_is_refused() {
        let mut f = TelnetFilter::new();
        let (_, replies) = run(&mut f, &[IAC, DO, 24]);
        assert_eq!(replies, vec![IAC, WONT, 24]);
    }

    #[test]
    fn test_split_sequence_and_escaped_iac() {
        let mut f = TelnetFilter::new();
        let (text, replies) = run(&mut f, &[b'a', IAC]);
        assert_eq!(text, b"a");
        assert!(replies.is_empty());
        let (text, replies) = run(&mut f, &[WILL]);
        assert!(text.is_empty() && replies.is_empty());
        let (text, replies) = run(&mut f, &[1, b'b', IAC, IAC, b'c']);
        assert_eq!(text, vec![b'b', IAC, b'c']);
        assert_eq!(replies, vec![IAC, DONT, 1]);
    }

    #[test]
    fn test_subnegotiation_is_skipped() {
        let mut f = TelnetFilter::new();
        let (text, _) = run(&mut f, &[b'x', IAC, SB, 31, 0, 80, IAC, SE, b'y', b'\r', 0, b'\n']);
        assert_eq!(text, b"xy\r\n");
    }
}
