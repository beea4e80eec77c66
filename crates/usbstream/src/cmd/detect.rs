use std::fs::File;
use std::io::BufReader;

use usbstream_frame::PacketReader;

use crate::cmd::DetectArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_packet, OutputFormat};

pub fn run(args: DetectArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.path)
        .map_err(|err| io_error(&format!("failed opening {}", args.path.display()), err))?;

    let mut reader = PacketReader::with_config(
        BufReader::new(file),
        args.detector_config(),
        args.assembler_config(),
    );

    let mut index = 0usize;
    while let Some(packet) = reader
        .read_packet()
        .map_err(|err| frame_error("detect failed", err))?
    {
        print_packet(&packet, index, args.domain.name(), format);
        index = index.saturating_add(1);
    }

    tracing::info!(
        packets = index,
        samples = reader.samples(),
        domain = %args.domain,
        "trace processed"
    );
    Ok(SUCCESS)
}
