// Copyright (C) 2019-2020  Pierre Krieger
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Textual form of the control messages.
//!
//! Each command has a lowercase name (for example `getifname` or `setenaddr`). Commands that
//! carry an argument are followed by a single space-separated argument: an integer for the
//! boolean commands (`setpromisc 1`), or a MAC address written as six colon-separated
//! hexadecimal octets for the address commands (`addmulti 01:00:5e:00:00:01`).

use crate::ffi::{EtherCommand, EtherMessage, ETHER_ADDR_LEN};
use core::{fmt, str::FromStr};

impl EtherCommand {
    /// Returns the textual name of the command.
    pub fn ascii_name(&self) -> &'static str {
        match self {
            EtherCommand::GetIfName => "getifname",
            EtherCommand::GetIfIndex => "getifindex",
            EtherCommand::GetEnaddr => "getenaddr",
            EtherCommand::SetEnaddr => "setenaddr",
            EtherCommand::GetPromisc => "getpromisc",
            EtherCommand::SetPromisc => "setpromisc",
            EtherCommand::GetAutosrc => "getautosrc",
            EtherCommand::SetAutosrc => "setautosrc",
            EtherCommand::AddMulti => "addmulti",
            EtherCommand::DelMulti => "delmulti",
            EtherCommand::Detach => "detach",
        }
    }

    /// Finds a command from its textual name.
    pub fn from_ascii_name(name: &str) -> Option<EtherCommand> {
        EtherCommand::ALL
            .iter()
            .copied()
            .find(|cmd| cmd.ascii_name() == name)
    }
}

impl EtherMessage {
    /// Parses a request written in its textual form.
    pub fn parse_ascii(text: &str) -> Result<EtherMessage, ParseError> {
        let mut words = text.split_whitespace();
        let name = words.next().ok_or(ParseError::Empty)?;
        let command = EtherCommand::from_ascii_name(name)
            .ok_or_else(|| ParseError::UnknownCommand(name.to_owned()))?;

        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(ParseError::UnexpectedArgument(extra.to_owned()));
        }

        let needs_argument = command.request_len() != 0;
        let argument = match (needs_argument, argument) {
            (true, Some(arg)) => arg,
            (true, None) => return Err(ParseError::MissingArgument(command.ascii_name())),
            (false, Some(arg)) => return Err(ParseError::UnexpectedArgument(arg.to_owned())),
            (false, None) => "",
        };

        Ok(match command {
            EtherCommand::GetIfName => EtherMessage::GetIfName,
            EtherCommand::GetIfIndex => EtherMessage::GetIfIndex,
            EtherCommand::GetEnaddr => EtherMessage::GetEnaddr,
            EtherCommand::SetEnaddr => EtherMessage::SetEnaddr(parse_mac(argument)?),
            EtherCommand::GetPromisc => EtherMessage::GetPromisc,
            EtherCommand::SetPromisc => EtherMessage::SetPromisc(parse_bool(argument)?),
            EtherCommand::GetAutosrc => EtherMessage::GetAutosrc,
            EtherCommand::SetAutosrc => EtherMessage::SetAutosrc(parse_bool(argument)?),
            EtherCommand::AddMulti => EtherMessage::AddMulti(parse_mac(argument)?),
            EtherCommand::DelMulti => EtherMessage::DelMulti(parse_mac(argument)?),
            EtherCommand::Detach => EtherMessage::Detach,
        })
    }
}

impl FromStr for EtherMessage {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EtherMessage::parse_ascii(s)
    }
}

impl fmt::Display for EtherMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.command().ascii_name())?;
        match self {
            EtherMessage::SetEnaddr(addr)
            | EtherMessage::AddMulti(addr)
            | EtherMessage::DelMulti(addr) => write!(f, " {}", MacAddr(addr)),
            EtherMessage::SetPromisc(val) | EtherMessage::SetAutosrc(val) => {
                write!(f, " {}", u32::from(*val))
            }
            _ => Ok(()),
        }
    }
}

/// Wrapper around a MAC address whose `Display` implementation prints the usual
/// `xx:xx:xx:xx:xx:xx` form.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MacAddr<'a>(pub &'a [u8; ETHER_ADDR_LEN]);

impl<'a> fmt::Display for MacAddr<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let a = self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }
}

/// Parses a MAC address made of six colon-separated hexadecimal octets.
pub fn parse_mac(text: &str) -> Result<[u8; ETHER_ADDR_LEN], ParseError> {
    let mut out = [0; ETHER_ADDR_LEN];
    let mut octets = text.split(':');

    for byte in out.iter_mut() {
        let octet = octets
            .next()
            .filter(|o| !o.is_empty() && o.len() <= 2)
            .filter(|o| o.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| ParseError::InvalidMac(text.to_owned()))?;
        *byte =
            u8::from_str_radix(octet, 16).map_err(|_| ParseError::InvalidMac(text.to_owned()))?;
    }

    if octets.next().is_some() {
        return Err(ParseError::InvalidMac(text.to_owned()));
    }

    Ok(out)
}

fn parse_bool(text: &str) -> Result<bool, ParseError> {
    text.parse::<u32>()
        .map(|v| v != 0)
        .map_err(|_| ParseError::InvalidInteger(text.to_owned()))
}

/// Error while parsing the textual form of a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Command {0} requires an argument")]
    MissingArgument(&'static str),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    #[error("Invalid integer: {0}")]
    InvalidInteger(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        for cmd in EtherCommand::ALL.iter() {
            assert_eq!(EtherCommand::from_ascii_name(cmd.ascii_name()), Some(*cmd));
        }
    }

    #[test]
    fn parse_set_enaddr() {
        let msg: EtherMessage = "setenaddr 00:1b:21:0a:ff:3".parse().unwrap();
        assert_eq!(
            msg,
            EtherMessage::SetEnaddr([0x00, 0x1b, 0x21, 0x0a, 0xff, 0x03])
        );
        assert_eq!(msg.to_string(), "setenaddr 00:1b:21:0a:ff:03");
    }

    #[test]
    fn parse_booleans() {
        assert_eq!(
            EtherMessage::parse_ascii("setpromisc 1"),
            Ok(EtherMessage::SetPromisc(true))
        );
        assert_eq!(
            EtherMessage::parse_ascii("  setautosrc   0 "),
            Ok(EtherMessage::SetAutosrc(false))
        );
        assert_eq!(
            EtherMessage::parse_ascii("setpromisc yes"),
            Err(ParseError::InvalidInteger("yes".into()))
        );
    }

    #[test]
    fn arguments_checked() {
        assert_eq!(
            EtherMessage::parse_ascii("addmulti"),
            Err(ParseError::MissingArgument("addmulti"))
        );
        assert_eq!(
            EtherMessage::parse_ascii("detach now"),
            Err(ParseError::UnexpectedArgument("now".into()))
        );
        assert_eq!(
            EtherMessage::parse_ascii("setpromisc 1 2"),
            Err(ParseError::UnexpectedArgument("2".into()))
        );
        assert_eq!(
            EtherMessage::parse_ascii("frobnicate"),
            Err(ParseError::UnknownCommand("frobnicate".into()))
        );
        assert_eq!(EtherMessage::parse_ascii(""), Err(ParseError::Empty));
    }

    #[test]
    fn bad_mac_addresses() {
        for text in &[
            "00:11:22:33:44",
            "00:11:22:33:44:55:66",
            "00:11:22:33:44:5g",
            "0:1::3:4:5",
            "000:1:2:3:4:5",
            "+1:+2:+3:+4:+5:+6",
            "-0:00:00:00:00:00",
        ] {
            assert!(parse_mac(text).is_err(), "{}", text);
        }
        assert!(EtherMessage::parse_ascii("addmulti +1:+2:+3:+4:+5:+6").is_err());
    }
}
