use std::io::{IsTerminal, Write};
use std::path::Path;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use usbstream_frame::{DetectorInput, DetectorOutput, DetectorState, Packet};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    index: usize,
    size: usize,
    payload: String,
    complete: bool,
    invalid: bool,
    domain: &'a str,
}

pub fn print_packet(packet: &Packet, index: usize, domain: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                index,
                size: packet.len(),
                payload: hex(packet.payload.as_ref()),
                complete: packet.status.complete,
                invalid: packet.status.invalid,
                domain,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "SIZE", "STATUS", "PAYLOAD"])
                .add_row(vec![
                    index.to_string(),
                    packet.len().to_string(),
                    status_label(packet.status.complete, packet.status.invalid).to_string(),
                    hex(packet.payload.as_ref()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "packet={} size={} status={} payload={}",
                index,
                packet.len(),
                status_label(packet.status.complete, packet.status.invalid),
                hex(packet.payload.as_ref())
            );
        }
        OutputFormat::Raw => {
            print_raw(packet.payload.as_ref());
        }
    }
}

/// One clock step of the detector: what it sampled and what it registered.
#[derive(Debug, Clone, Serialize)]
pub struct StepRow {
    pub step: usize,
    pub input: DetectorInput,
    pub state: DetectorState,
    pub output: DetectorOutput,
}

pub fn print_steps(rows: &[StepRow], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for row in rows {
                println!(
                    "{}",
                    serde_json::to_string(row).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "STEP", "IN", "IN STATUS", "STATE", "OUT", "FIRST", "LAST", "OUT STATUS",
                ]);
            for row in rows {
                table.add_row(vec![
                    row.step.to_string(),
                    input_cell(&row.input),
                    status_label(row.input.complete, row.input.invalid).to_string(),
                    row.state.to_string(),
                    output_cell(&row.output),
                    flag(row.output.stream.advance && row.output.first).to_string(),
                    flag(row.output.stream.advance && row.output.last).to_string(),
                    status_label(row.output.complete, row.output.invalid).to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for row in rows {
                println!(
                    "step={} in={} state={} out={} first={} last={} status={}",
                    row.step,
                    input_cell(&row.input),
                    row.state,
                    output_cell(&row.output),
                    flag(row.output.stream.advance && row.output.first),
                    flag(row.output.stream.advance && row.output.last),
                    status_label(row.output.complete, row.output.invalid)
                );
            }
        }
        OutputFormat::Raw => {
            let emitted: Vec<u8> = rows
                .iter()
                .filter(|row| row.output.is_emitting())
                .map(|row| row.output.stream.payload)
                .collect();
            print_raw(&emitted);
        }
    }
}

#[derive(Serialize)]
struct SynthOutput<'a> {
    path: &'a str,
    packets: usize,
    samples: u64,
}

pub fn print_synth_summary(path: &Path, packets: usize, samples: u64, format: OutputFormat) {
    let path = path.display().to_string();
    match format {
        OutputFormat::Json => {
            let out = SynthOutput {
                path: &path,
                packets,
                samples,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PATH", "PACKETS", "SAMPLES"])
                .add_row(vec![path, packets.to_string(), samples.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            println!("wrote {samples} samples ({packets} packets) to {path}");
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn input_cell(input: &DetectorInput) -> String {
    match (input.stream.active, input.stream.advance) {
        (true, true) => format!("{:02x}", input.stream.payload),
        (true, false) => "..".to_string(),
        _ => "--".to_string(),
    }
}

fn output_cell(output: &DetectorOutput) -> String {
    match (output.stream.active, output.stream.advance) {
        (_, true) => format!("{:02x}", output.stream.payload),
        (true, false) => "..".to_string(),
        _ => "--".to_string(),
    }
}

fn status_label(complete: bool, invalid: bool) -> &'static str {
    match (complete, invalid) {
        (false, false) => "-",
        (true, false) => "complete",
        (false, true) => "invalid",
        (true, true) => "complete+invalid",
    }
}

fn flag(value: bool) -> u8 {
    u8::from(value)
}

pub fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}
