use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use serlink_core::{ChecksumKind, Config, Peer, DEFAULT_MAX_PAYLOAD};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod echo;
pub mod info;
pub mod listen;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compose a single frame.
    Send(SendArgs),
    /// Parse a byte stream and print received frames.
    Listen(ListenArgs),
    /// Parse a byte stream and reply to every frame with its own payload.
    Echo(EchoArgs),
    /// Show the active wire-format configuration.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Echo(args) => echo::run(args),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

/// Wire-format knobs shared by every subcommand. Both ends of a link must
/// be invoked with the same values.
#[derive(Args, Debug, Clone)]
pub struct WireArgs {
    /// Checksum algorithm.
    #[arg(long, value_name = "KIND", default_value = "crc16")]
    pub checksum: ChecksumArg,

    /// Start-of-frame marker byte (decimal or 0x-prefixed hex).
    #[arg(long, value_name = "BYTE", default_value = "0x01", conflicts_with = "no_sof")]
    pub sof: String,

    /// Omit the start-of-frame marker entirely.
    #[arg(long)]
    pub no_sof: bool,

    /// Maximum payload size in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,

    /// Idle ticks before a partial frame is dropped (0 disables).
    #[arg(long, value_name = "TICKS", default_value_t = 10)]
    pub timeout_ticks: u32,

    /// Which half of the ID space this endpoint allocates from.
    #[arg(long, value_name = "PEER", default_value = "a")]
    pub peer: PeerArg,
}

impl WireArgs {
    pub fn to_config(&self) -> CliResult<Config> {
        let sof = if self.no_sof {
            None
        } else {
            Some(parse_byte(&self.sof)?)
        };
        Ok(Config {
            sof,
            checksum: self.checksum.into(),
            max_payload: self.max_payload,
            timeout_ticks: self.timeout_ticks,
            peer: self.peer.into(),
            ..Config::default()
        })
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ChecksumArg {
    None,
    Xor8,
    Crc16,
    Crc32,
}

impl From<ChecksumArg> for ChecksumKind {
    fn from(arg: ChecksumArg) -> Self {
        match arg {
            ChecksumArg::None => ChecksumKind::None,
            ChecksumArg::Xor8 => ChecksumKind::Xor8,
            ChecksumArg::Crc16 => ChecksumKind::Crc16,
            ChecksumArg::Crc32 => ChecksumKind::Crc32,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum PeerArg {
    A,
    B,
}

impl From<PeerArg> for Peer {
    fn from(arg: PeerArg) -> Self {
        match arg {
            PeerArg::A => Peer::A,
            PeerArg::B => Peer::B,
        }
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Message type (decimal or 0x-prefixed hex).
    #[arg(value_name = "TYPE")]
    pub frame_type: String,

    /// Payload as a UTF-8 string.
    #[arg(long, value_name = "TEXT", conflicts_with = "file")]
    pub data: Option<String>,

    /// Payload read from a file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Explicit frame ID, for composing a reply (decimal or 0x-prefixed hex).
    #[arg(long, value_name = "ID")]
    pub id: Option<String>,

    /// Print the frame as hex instead of writing raw bytes.
    #[arg(long)]
    pub hex: bool,

    /// Write the frame here instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Input file or device; stdin when omitted.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Wall-clock interval of one idle tick (e.g. 100ms, 1s).
    #[arg(long, value_name = "DURATION", default_value = "100ms")]
    pub tick_interval: String,

    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Input file or device; stdin when omitted. Replies go to stdout.
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Wall-clock interval of one idle tick (e.g. 100ms, 1s).
    #[arg(long, value_name = "DURATION", default_value = "100ms")]
    pub tick_interval: String,

    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    #[command(flatten)]
    pub wire: WireArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {}

/// Parse a byte value, accepting decimal or 0x-prefixed hex.
pub fn parse_byte(input: &str) -> CliResult<u8> {
    parse_number(input)
        .map_err(|_| CliError::new(USAGE, format!("invalid byte value: {input}")))
}

/// Parse a frame ID, accepting decimal or 0x-prefixed hex.
pub fn parse_id(input: &str) -> CliResult<u16> {
    parse_number(input).map_err(|_| CliError::new(USAGE, format!("invalid frame ID: {input}")))
}

fn parse_number<T: FromStrRadix>(input: &str) -> Result<T, ()> {
    let input = input.trim();
    if let Some(hex) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        T::from_str_radix_(hex, 16)
    } else {
        T::from_str_radix_(input, 10)
    }
}

trait FromStrRadix: Sized {
    fn from_str_radix_(src: &str, radix: u32) -> Result<Self, ()>;
}

impl FromStrRadix for u8 {
    fn from_str_radix_(src: &str, radix: u32) -> Result<Self, ()> {
        u8::from_str_radix(src, radix).map_err(|_| ())
    }
}

impl FromStrRadix for u16 {
    fn from_str_radix_(src: &str, radix: u32) -> Result<Self, ()> {
        u16::from_str_radix(src, radix).map_err(|_| ())
    }
}

/// Parse a duration like `100ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<std::time::Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(std::time::Duration::from_millis(value)),
        _ => Ok(std::time::Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_byte_accepts_hex_and_decimal() {
        assert_eq!(parse_byte("0x7E").unwrap(), 0x7E);
        assert_eq!(parse_byte("1").unwrap(), 1);
        assert_eq!(parse_byte("255").unwrap(), 255);
    }

    #[test]
    fn parse_byte_rejects_out_of_range() {
        assert!(parse_byte("256").is_err());
        assert!(parse_byte("0x100").is_err());
        assert!(parse_byte("nope").is_err());
    }

    #[test]
    fn parse_id_accepts_full_width() {
        assert_eq!(parse_id("0xBEEF").unwrap(), 0xBEEF);
        assert_eq!(parse_id("65535").unwrap(), 65535);
        assert!(parse_id("65536").is_err());
    }

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(
            parse_duration("150ms").unwrap(),
            std::time::Duration::from_millis(150)
        );
        assert_eq!(parse_duration("2s").unwrap(), std::time::Duration::from_secs(2));
        assert_eq!(parse_duration("3").unwrap(), std::time::Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("").is_err());
    }

    #[test]
    fn wire_args_build_a_config() {
        let args = WireArgs {
            checksum: ChecksumArg::Crc32,
            sof: "0x7E".to_string(),
            no_sof: false,
            max_payload: 256,
            timeout_ticks: 5,
            peer: PeerArg::B,
        };
        let config = args.to_config().expect("config should build");

        assert_eq!(config.sof, Some(0x7E));
        assert_eq!(config.checksum, ChecksumKind::Crc32);
        assert_eq!(config.max_payload, 256);
        assert_eq!(config.timeout_ticks, 5);
        assert_eq!(config.peer, Peer::B);
    }

    #[test]
    fn no_sof_clears_the_marker() {
        let args = WireArgs {
            checksum: ChecksumArg::Crc16,
            sof: "0x01".to_string(),
            no_sof: true,
            max_payload: DEFAULT_MAX_PAYLOAD,
            timeout_ticks: 10,
            peer: PeerArg::A,
        };
        let config = args.to_config().expect("config should build");
        assert_eq!(config.sof, None);
    }
}
