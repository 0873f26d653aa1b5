use std::fs;
use std::io::Write;

use bytes::BytesMut;
use serlink_core::{encode_frame, IdGen};
use tracing::info;

use crate::cmd::{parse_byte, parse_id, SendArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::hex_string;

pub fn run(args: SendArgs, _format: crate::output::OutputFormat) -> CliResult<i32> {
    let config = args.wire.to_config()?;
    let frame_type = parse_byte(&args.frame_type)?;
    let payload = resolve_payload(&args)?;

    let id = match &args.id {
        Some(explicit) => parse_id(explicit)?,
        None => IdGen::new(config.peer).next(),
    };

    let mut frame = BytesMut::new();
    let written = encode_frame(&config, id, frame_type, &payload, &mut frame)
        .map_err(|err| frame_error("compose failed", err))?;
    info!(id, frame_type, bytes = written, "frame composed");

    if args.hex {
        println!("{}", hex_string(&frame));
        return Ok(SUCCESS);
    }

    match &args.out {
        Some(path) => {
            fs::write(path, &frame).map_err(|err| {
                io_error(&format!("failed writing {}", path.display()), err)
            })?;
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(&frame)
                .and_then(|()| stdout.flush())
                .map_err(|err| io_error("failed writing frame to stdout", err))?;
        }
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{ChecksumArg, PeerArg, WireArgs};

    fn send_args(data: Option<&str>) -> SendArgs {
        SendArgs {
            frame_type: "0x20".to_string(),
            data: data.map(str::to_string),
            file: None,
            id: None,
            hex: true,
            out: None,
            wire: WireArgs {
                checksum: ChecksumArg::Crc16,
                sof: "0x01".to_string(),
                no_sof: false,
                max_payload: 64,
                timeout_ticks: 10,
                peer: PeerArg::A,
            },
        }
    }

    #[test]
    fn payload_defaults_to_empty() {
        let args = send_args(None);
        assert!(resolve_payload(&args).expect("payload should resolve").is_empty());
    }

    #[test]
    fn data_argument_becomes_payload() {
        let args = send_args(Some("hello"));
        assert_eq!(
            resolve_payload(&args).expect("payload should resolve"),
            b"hello"
        );
    }

    #[test]
    fn oversized_payload_maps_to_data_invalid() {
        let mut args = send_args(Some("x"));
        args.data = Some("y".repeat(100));
        let err = run(args, crate::output::OutputFormat::Pretty).unwrap_err();
        assert_eq!(err.code, crate::exit::DATA_INVALID);
    }
}
