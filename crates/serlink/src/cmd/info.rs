use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serlink_core::{frame_overhead, wire_size, Config, ID_BYTES, LEN_BYTES, TYPE_BYTES};

use crate::cmd::InfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[derive(Serialize)]
struct InfoOutput {
    checksum: String,
    checksum_bytes: usize,
    sof: Option<u8>,
    id_bytes: usize,
    len_bytes: usize,
    type_bytes: usize,
    max_payload: usize,
    timeout_ticks: u32,
    frame_overhead: usize,
    max_frame_size: usize,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.wire.to_config()?;
    let out = describe(&config);

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["checksum".to_string(), out.checksum.clone()])
                .add_row(vec![
                    "checksum bytes".to_string(),
                    out.checksum_bytes.to_string(),
                ])
                .add_row(vec![
                    "start marker".to_string(),
                    out.sof
                        .map(|b| format!("0x{b:02X}"))
                        .unwrap_or_else(|| "off".to_string()),
                ])
                .add_row(vec!["id bytes".to_string(), out.id_bytes.to_string()])
                .add_row(vec!["len bytes".to_string(), out.len_bytes.to_string()])
                .add_row(vec!["type bytes".to_string(), out.type_bytes.to_string()])
                .add_row(vec!["max payload".to_string(), out.max_payload.to_string()])
                .add_row(vec![
                    "timeout ticks".to_string(),
                    out.timeout_ticks.to_string(),
                ])
                .add_row(vec![
                    "frame overhead".to_string(),
                    out.frame_overhead.to_string(),
                ])
                .add_row(vec![
                    "max frame size".to_string(),
                    out.max_frame_size.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!(
                "checksum={} ({}B) sof={} id={}B len={}B type={}B max_payload={} overhead={}",
                out.checksum,
                out.checksum_bytes,
                out.sof
                    .map(|b| format!("0x{b:02X}"))
                    .unwrap_or_else(|| "off".to_string()),
                out.id_bytes,
                out.len_bytes,
                out.type_bytes,
                out.max_payload,
                out.frame_overhead
            );
        }
    }

    Ok(SUCCESS)
}

fn describe(config: &Config) -> InfoOutput {
    InfoOutput {
        checksum: format!("{:?}", config.checksum).to_lowercase(),
        checksum_bytes: config.checksum.width(),
        sof: config.sof,
        id_bytes: ID_BYTES,
        len_bytes: LEN_BYTES,
        type_bytes: TYPE_BYTES,
        max_payload: config.effective_max_payload(),
        timeout_ticks: config.timeout_ticks,
        frame_overhead: frame_overhead(config),
        max_frame_size: wire_size(config, config.effective_max_payload()),
    }
}
