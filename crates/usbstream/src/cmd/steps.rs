use usbstream_frame::{synthesize, BoundaryDetector, DetectorConfig, DetectorInput};

use crate::cmd::StepsArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_steps, OutputFormat, StepRow};

pub fn run(args: StepsArgs, format: OutputFormat) -> CliResult<i32> {
    let rows = waveform(&args).map_err(|err| frame_error("invalid waveform", err))?;
    print_steps(&rows, format);
    Ok(SUCCESS)
}

/// Drive a fresh detector with the synthesized samples, plus one idle step so
/// the final drain is followed by the return to idle.
fn waveform(args: &StepsArgs) -> usbstream_frame::Result<Vec<StepRow>> {
    let mut samples = synthesize(&args.waveform.packets(), &args.waveform.trace_config())?;
    samples.push(DetectorInput::idle());

    let mut detector = BoundaryDetector::with_config(DetectorConfig {
        domain: args.domain.clone(),
    });

    Ok(samples
        .into_iter()
        .enumerate()
        .map(|(step, input)| {
            let state = detector.state();
            let output = detector.step(&input);
            StepRow {
                step,
                input,
                state,
                output,
            }
        })
        .collect())
}
