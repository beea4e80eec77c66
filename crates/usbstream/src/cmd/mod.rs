use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Subcommand};
use usbstream_frame::{
    AssemblerConfig, DetectorConfig, Packet, PacketStatus, TraceConfig, DEFAULT_MAX_PACKET_SIZE,
    MIN_INTER_PACKET_GAP,
};
use usbstream_utmi::ClockDomain;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod detect;
pub mod steps;
pub mod synth;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Reconstruct packets from a binary receive trace.
    Detect(DetectArgs),
    /// Write a binary receive trace for the given packets.
    Synth(SynthArgs),
    /// Print the detector's step-by-step waveform for the given packets.
    Steps(StepsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Detect(args) => detect::run(args, format),
        Command::Synth(args) => synth::run(args, format),
        Command::Steps(args) => steps::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// A packet payload given on the command line as hex (`aabbcc`, `AA:BB:CC`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexPayload(pub Vec<u8>);

impl FromStr for HexPayload {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: Vec<u8> = s
            .bytes()
            .filter(|b| !matches!(b, b':' | b' ' | b'_'))
            .collect();
        if digits.is_empty() {
            return Err("packet must contain at least one byte".to_string());
        }
        if digits.len() % 2 != 0 {
            return Err(format!("odd number of hex digits in {s:?}"));
        }

        let nibble = |b: u8| char::from(b).to_digit(16).map(|d| d as u8);
        digits
            .chunks(2)
            .map(|pair| match (nibble(pair[0]), nibble(pair[1])) {
                (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
                _ => Err(format!(
                    "invalid hex byte {:?}",
                    String::from_utf8_lossy(pair)
                )),
            })
            .collect::<Result<Vec<u8>, String>>()
            .map(HexPayload)
    }
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Trace file to read.
    pub path: PathBuf,
    /// Maximum reconstructed packet size in bytes.
    #[arg(
        long,
        env = "USBSTREAM_MAX_PACKET_SIZE",
        default_value_t = DEFAULT_MAX_PACKET_SIZE
    )]
    pub max_packet_size: usize,
    /// Clock domain the detector is bound to.
    #[arg(long, default_value = "usb")]
    pub domain: ClockDomain,
}

impl DetectArgs {
    pub fn detector_config(&self) -> DetectorConfig {
        DetectorConfig {
            domain: self.domain.clone(),
        }
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        AssemblerConfig {
            max_packet_size: self.max_packet_size,
        }
    }
}

/// Packets and waveform shape shared by `synth` and `steps`.
#[derive(Args, Debug)]
pub struct WaveformArgs {
    /// Packet payload as hex; repeat for multiple packets.
    #[arg(long = "packet", short = 'p', value_name = "HEX", required = true)]
    pub packets: Vec<HexPayload>,
    /// Idle steps after each packet.
    #[arg(long, default_value_t = MIN_INTER_PACKET_GAP)]
    pub gap: usize,
    /// Stall steps between consecutive bytes of a packet.
    #[arg(long, default_value_t = 0)]
    pub stall: usize,
    /// Raise the complete status level on every packet.
    #[arg(long)]
    pub complete: bool,
    /// Raise the invalid status level on every packet.
    #[arg(long)]
    pub invalid: bool,
}

impl WaveformArgs {
    pub fn trace_config(&self) -> TraceConfig {
        TraceConfig {
            inter_packet_gap: self.gap,
            stall_steps: self.stall,
        }
    }

    pub fn packets(&self) -> Vec<Packet> {
        let status = PacketStatus {
            complete: self.complete,
            invalid: self.invalid,
        };
        self.packets
            .iter()
            .map(|hex| Packet::new(hex.0.clone()).with_status(status))
            .collect()
    }
}

#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Trace file to write.
    pub path: PathBuf,
    #[command(flatten)]
    pub waveform: WaveformArgs,
}

#[derive(Args, Debug)]
pub struct StepsArgs {
    #[command(flatten)]
    pub waveform: WaveformArgs,
    /// Clock domain the detector is bound to.
    #[arg(long, default_value = "usb")]
    pub domain: ClockDomain,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_payload_plain_and_separated() {
        assert_eq!(
            "aabbccdd".parse::<HexPayload>().unwrap(),
            HexPayload(vec![0xAA, 0xBB, 0xCC, 0xDD])
        );
        assert_eq!(
            "C3:00_05 08".parse::<HexPayload>().unwrap(),
            HexPayload(vec![0xC3, 0x00, 0x05, 0x08])
        );
    }

    #[test]
    fn hex_payload_rejects_bad_input() {
        assert!("".parse::<HexPayload>().is_err());
        assert!("abc".parse::<HexPayload>().is_err());
        assert!("zz".parse::<HexPayload>().is_err());
    }

    #[test]
    fn waveform_applies_status_to_every_packet() {
        let args = WaveformArgs {
            packets: vec![HexPayload(vec![1]), HexPayload(vec![2, 3])],
            gap: 4,
            stall: 1,
            complete: true,
            invalid: false,
        };

        let packets = args.packets();
        assert_eq!(packets.len(), 2);
        assert!(packets.iter().all(|p| p.status == PacketStatus::COMPLETE));

        let config = args.trace_config();
        assert_eq!((config.inter_packet_gap, config.stall_steps), (4, 1));
    }
}
