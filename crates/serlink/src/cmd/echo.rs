use std::cell::Cell;
use std::fs::File;
use std::io::Read;
use std::rc::Rc;

use serlink_core::Session;
use serlink_io::{Pump, StreamWire, Ticker};
use tracing::{info, warn};

use crate::cmd::{parse_duration, EchoArgs};
use crate::exit::{io_error, link_error, CliResult, SUCCESS};

/// Reply to every received frame with its own payload, under the same type
/// and ID, so the sender's reply correlation fires.
pub fn run(args: EchoArgs) -> CliResult<i32> {
    let config = args.wire.to_config()?;
    let tick_interval = parse_duration(&args.tick_interval)?;

    let mut session = Session::new(config, StreamWire::new(std::io::stdout()));
    let count = Rc::new(Cell::new(0u64));
    let counter = Rc::clone(&count);
    session.add_generic_listener(Box::new(move |responder, frame| {
        match responder.respond(frame.frame_type, frame.payload, frame.id) {
            Ok(()) => counter.set(counter.get() + 1),
            Err(err) => warn!(error = %err, "echo reply failed"),
        }
        true
    }));

    let input = open_input(args.path.as_deref())?;
    let mut pump = Pump::new(input).with_ticker(Ticker::new(tick_interval));
    pump.run(&mut session)
        .map_err(|err| link_error("echo failed", err))?;

    if let Some(err) = session.get_mut().take_last_error() {
        return Err(link_error("echo reply write failed", err));
    }

    info!(frames = count.get(), "echo finished");
    Ok(SUCCESS)
}

fn open_input(path: Option<&std::path::Path>) -> CliResult<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(std::io::stdin())),
    }
}
