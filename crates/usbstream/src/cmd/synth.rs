use std::fs::File;
use std::io::BufWriter;

use usbstream_frame::TraceWriter;

use crate::cmd::SynthArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_synth_summary, OutputFormat};

pub fn run(args: SynthArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.waveform.trace_config();
    config
        .validate()
        .map_err(|err| frame_error("invalid waveform", err))?;
    let packets = args.waveform.packets();

    let file = File::create(&args.path)
        .map_err(|err| io_error(&format!("failed creating {}", args.path.display()), err))?;
    let mut writer = TraceWriter::with_config(BufWriter::new(file), config);

    for packet in &packets {
        writer
            .write_packet(packet)
            .map_err(|err| frame_error("write failed", err))?;
    }
    writer
        .finish()
        .map_err(|err| frame_error("write failed", err))?;

    tracing::debug!(path = %args.path.display(), samples = writer.samples(), "trace written");
    print_synth_summary(&args.path, packets.len(), writer.samples(), format);
    Ok(SUCCESS)
}
