use clap::{App, Arg, ArgMatches, SubCommand};
use duplex_pipe::{
    config::{parse_buffer_size, ChannelConfig, BUFFER_SIZE_ENV},
    Channel, PipeError, Result, SessionOptions, Side, Signal,
};
use log::{info, warn};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Instant,
};

fn main() -> Result<()> {
    env_logger::init();

    let capacity_arg = Arg::with_name("capacity")
        .short("c")
        .long("capacity")
        .value_name("BYTES")
        .help("Ring capacity per direction (defaults to $DUPLEX_PIPE_BUFFER_SIZE or 1000)")
        .takes_value(true);

    let matches = App::new("pipe-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Duplex pipe exerciser")
        .subcommand(
            SubCommand::with_name("demo")
                .about("Send a message A -> B and echo it back B -> A")
                .arg(capacity_arg.clone())
                .arg(
                    Arg::with_name("message")
                        .short("m")
                        .long("message")
                        .value_name("TEXT")
                        .help("Message to send")
                        .default_value("hello through the pipe")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("from")
                        .short("f")
                        .long("from")
                        .value_name("INDEX")
                        .help("Side that sends first (0 = A, 1 = B)")
                        .default_value("0")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("stress")
                .about("Stream bytes from A to several readers on B")
                .arg(capacity_arg)
                .arg(
                    Arg::with_name("bytes")
                        .short("b")
                        .long("bytes")
                        .value_name("BYTES")
                        .help("Total bytes to stream")
                        .default_value("1048576")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("readers")
                        .short("r")
                        .long("readers")
                        .value_name("COUNT")
                        .help("Number of reader sessions on B")
                        .default_value("1")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("info")
                .about("Show version and configuration information"),
        )
        .get_matches();

    match matches.subcommand() {
        ("demo", Some(demo_matches)) => run_demo(demo_matches),
        ("stress", Some(stress_matches)) => run_stress(stress_matches),
        ("info", Some(_)) => show_info(),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

fn channel_config(matches: &ArgMatches) -> Result<ChannelConfig> {
    let config = match matches.value_of("capacity") {
        Some(value) => ChannelConfig::new("cli").with_buffer_size(parse_buffer_size(value)?),
        None => ChannelConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn count_arg(matches: &ArgMatches, name: &str) -> Result<usize> {
    let value = matches
        .value_of(name)
        .ok_or_else(|| PipeError::invalid_argument(name, "missing value"))?;
    value
        .parse()
        .map_err(|_| PipeError::invalid_argument(name, format!("'{}' is not a count", value)))
}

fn reader_count(matches: &ArgMatches) -> Result<usize> {
    match count_arg(matches, "readers")? {
        0 => Err(PipeError::invalid_argument(
            "readers",
            "at least one reader is required",
        )),
        n => Ok(n),
    }
}

fn sender_side(matches: &ArgMatches) -> Result<Side> {
    let index = count_arg(matches, "from")?;
    Side::from_index(index)
        .ok_or_else(|| PipeError::invalid_argument("from", format!("no side {}", index)))
}

/// Wait until `total` bytes were consumed or a reader thread has exited
///
/// Readers only exit on their own after a failure, so a finished handle
/// means the remaining bytes may never be drained.
fn wait_for_drain(channel: &Channel, total: u64, readers: &[JoinHandle<usize>]) -> bool {
    loop {
        if channel.a_to_b().stats().bytes_read >= total {
            return true;
        }
        if readers.iter().any(JoinHandle::is_finished) {
            return channel.a_to_b().stats().bytes_read >= total;
        }
        thread::yield_now();
    }
}

fn run_demo(matches: &ArgMatches) -> Result<()> {
    let config = channel_config(matches)?;
    let sender = sender_side(matches)?;
    let message = matches.value_of("message").unwrap_or_default().as_bytes().to_vec();
    let channel = Arc::new(Channel::new(config)?);

    println!(
        "Channel capacity: {} bytes per direction ({} usable)",
        channel.config().a_to_b_capacity,
        channel.config().a_to_b_capacity - 1
    );

    let echo = {
        let channel = channel.clone();
        let len = message.len();
        thread::spawn(move || -> Result<()> {
            let echoer = channel.open(sender.peer(), SessionOptions::read_write())?;
            let mut buf = vec![0u8; len];
            echoer.read_exact(&mut buf)?;
            info!("{} received {} bytes", sender.peer(), buf.len());
            echoer.write_all(&buf)
        })
    };

    let session = channel.open(sender, SessionOptions::read_write())?;
    session.write_all(&message)?;
    let mut echoed = vec![0u8; message.len()];
    session.read_exact(&mut echoed)?;

    echo.join()
        .map_err(|_| PipeError::invalid_argument("demo", "echo thread panicked"))??;

    println!("Sent by {}: {}", sender, String::from_utf8_lossy(&message));
    println!("Echoed: {}", String::from_utf8_lossy(&echoed));
    println!("A -> B: {}", channel.a_to_b().stats().summary());
    println!("B -> A: {}", channel.b_to_a().stats().summary());
    Ok(())
}

fn run_stress(matches: &ArgMatches) -> Result<()> {
    let config = channel_config(matches)?;
    let total = count_arg(matches, "bytes")?;
    let reader_count = reader_count(matches)?;
    let channel = Arc::new(Channel::new(config)?);
    let abort = Signal::new();

    println!("Streaming {} bytes to {} reader(s)...", total, reader_count);

    let readers = (0..reader_count)
        .map(|_| channel.open(Side::B, SessionOptions::read_only()).map(Arc::new))
        .collect::<Result<Vec<_>>>()?;

    let handles: Vec<_> = readers
        .iter()
        .map(|session| {
            let session = session.clone();
            let abort = abort.clone();
            thread::spawn(move || {
                let mut buf = [0u8; 4096];
                let mut received = 0usize;
                loop {
                    match session.read(&mut buf) {
                        Ok(n) => received += n,
                        Err(PipeError::Interrupted { .. }) => return received,
                        Err(e) => {
                            eprintln!("reader failed: {}", e);
                            abort.raise();
                            return received;
                        }
                    }
                }
            })
        })
        .collect();

    let start = Instant::now();
    let streamed = stream(&channel, total, abort);
    let drained = streamed.is_ok() && wait_for_drain(&channel, total as u64, &handles);
    let elapsed = start.elapsed();

    for session in &readers {
        session.signal().raise();
    }

    println!("\nResults:");
    for (i, handle) in handles.into_iter().enumerate() {
        let received = handle.join().unwrap_or(0);
        println!("  Reader {}: {} bytes", i, received);
    }
    println!("  Total time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    println!(
        "  Throughput: {:.2} MiB/s",
        total as f64 / (1024.0 * 1024.0) / elapsed.as_secs_f64()
    );
    let stats = channel.a_to_b().stats();
    println!("  In flight: {} bytes", stats.in_flight());
    println!("  {}", stats.summary());

    streamed?;
    if !drained {
        return Err(PipeError::invalid_argument(
            "readers",
            "readers stopped before the stream was drained",
        ));
    }
    Ok(())
}

fn stream(channel: &Channel, total: usize, abort: Signal) -> Result<()> {
    let writer = channel.open(Side::A, SessionOptions::write_only().with_signal(abort))?;
    let chunk = vec![0xA5u8; 8192];
    let mut remaining = total;
    while remaining > 0 {
        let n = remaining.min(chunk.len());
        if let Err(e) = writer.write_all(&chunk[..n]) {
            warn!("writer stopped with {} bytes left: {}", remaining, e);
            return Err(e);
        }
        remaining -= n;
    }
    Ok(())
}

fn show_info() -> Result<()> {
    println!("duplex-pipe v{}", duplex_pipe::VERSION);
    let config = ChannelConfig::from_env()?;
    println!(
        "Buffer size: {} bytes (override with {})",
        config.a_to_b_capacity, BUFFER_SIZE_ENV
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stress_matches(args: &[&str]) -> ArgMatches<'static> {
        App::new("pipe-cli")
            .arg(
                Arg::with_name("readers")
                    .long("readers")
                    .default_value("1")
                    .takes_value(true),
            )
            .get_matches_from(std::iter::once("pipe-cli").chain(args.iter().copied()))
    }

    #[test]
    fn test_zero_readers_rejected() {
        let matches = stress_matches(&["--readers", "0"]);
        assert!(matches!(
            reader_count(&matches),
            Err(PipeError::InvalidArgument { .. })
        ));

        let matches = stress_matches(&["--readers", "3"]);
        assert_eq!(reader_count(&matches).unwrap(), 3);
    }

    #[test]
    fn test_drain_wait_stops_when_reader_exits() {
        let channel = Channel::with_capacity(16).unwrap();
        let failed = thread::spawn(|| 0usize);
        while !failed.is_finished() {
            thread::yield_now();
        }

        assert!(!wait_for_drain(&channel, 1024, &[failed]));
    }

    #[test]
    fn test_drain_wait_completes_after_consumption() {
        let channel = Channel::with_capacity(16).unwrap();
        let writer = channel.open(Side::A, SessionOptions::write_only()).unwrap();
        let reader = channel.open(Side::B, SessionOptions::read_only()).unwrap();
        writer.write_all(b"abcd").unwrap();
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf).unwrap();

        let idle = thread::spawn(|| {
            thread::sleep(std::time::Duration::from_millis(200));
            0usize
        });
        assert!(wait_for_drain(&channel, 4, &[idle]));
    }

    #[test]
    fn test_failed_reader_interrupts_writer() {
        let channel = Channel::with_capacity(8).unwrap();
        let abort = Signal::new();
        let raiser = {
            let abort = abort.clone();
            thread::spawn(move || {
                thread::sleep(std::time::Duration::from_millis(50));
                abort.raise();
            })
        };

        let result = stream(&channel, 1024, abort);
        raiser.join().unwrap();
        assert!(matches!(result, Err(PipeError::Interrupted { .. })));
    }
}
