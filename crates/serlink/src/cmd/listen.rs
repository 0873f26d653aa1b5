use std::cell::Cell;
use std::fs::File;
use std::io::Read;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serlink_core::{NullWire, Session};
use serlink_io::{Pump, Ticker};
use tracing::info;

use crate::cmd::{parse_duration, ListenArgs};
use crate::exit::{io_error, link_error, CliResult, SUCCESS};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.wire.to_config()?;
    let tick_interval = parse_duration(&args.tick_interval)?;

    let mut session = Session::new(config, NullWire);
    let count = Rc::new(Cell::new(0u64));
    let counter = Rc::clone(&count);
    session.add_generic_listener(Box::new(move |_, frame| {
        print_frame(frame, format);
        counter.set(counter.get() + 1);
        true
    }));

    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stop);
    let _ = ctrlc::set_handler(move || stop_flag.store(true, Ordering::SeqCst));

    let input = open_input(args.path.as_deref())?;
    let mut pump = Pump::new(input).with_ticker(Ticker::new(tick_interval));

    // The stop flag takes effect between chunks; a blocked read ends the
    // loop via EOF when the writing side goes away.
    while !stop.load(Ordering::SeqCst) {
        match pump.step(&mut session) {
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(err) => return Err(link_error("listen failed", err)),
        }
    }

    info!(frames = count.get(), "listen finished");
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
