//! worker_wire - inspect and benchmark the message kind registry
//!
//! Usage:
//!   cargo run --release -- --list
//!   cargo run --release -- --lookup 5
//!   cargo run --release -- --bench -n 1000000

use std::hint::black_box;
use std::time::Instant;

use log::error;

use worker_wire::config::{parse_args, CliCommand, CliConfig, USAGE};
use worker_wire::protocol::{Decoder, Encoder, HEADER_SIZE};
use worker_wire::registry::{self, MessageKind, Registry};

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn print_table(registry: &Registry) {
    println!("Message kinds ({})", registry.len());
    println!("-------------------------------------");
    println!("  code  name        variant        reply");
    for &(kind, code) in registry.entries() {
        println!(
            "  {:>4}  {:<10}  {:<13}  {}",
            code,
            kind.name(),
            format!("{:?}", kind),
            if kind.expects_reply() { "yes" } else { "no" }
        );
    }
}

fn lookup(query: &str) -> Result<MessageKind, registry::RegistryError> {
    match query.parse::<u8>() {
        Ok(code) => registry::kind_of(code),
        Err(_) => query.parse::<MessageKind>(),
    }
}

fn benchmark_lookup(iterations: usize) {
    println!("📊 Registry Lookup Benchmark");
    println!("----------------------------");

    // Warm up
    for code in 0..=u8::MAX {
        let _ = registry::kind_of(code);
    }

    let start = Instant::now();
    let mut hits = 0usize;
    for i in 0..iterations {
        let code = (i % 8) as u8;
        if registry::kind_of(black_box(code)).is_ok() {
            hits += 1;
        }
    }
    let duration = start.elapsed();
    let ns = duration.as_nanos() as f64 / iterations as f64;

    println!("  Operations: {} ({} hits)", iterations, hits);
    println!("  kind_of latency: {:.2} ns/op", ns);
    println!(
        "  Throughput: {:.2} M ops/sec\n",
        iterations as f64 / duration.as_secs_f64() / 1_000_000.0
    );
}

fn benchmark_codec(iterations: usize) {
    println!("📊 Envelope Codec Benchmark");
    println!("---------------------------");

    const PAYLOAD_SIZE: usize = 64;

    let mut encoder = Encoder::new(1024 * 1024);
    let payload = vec![0u8; PAYLOAD_SIZE];
    let kinds = registry::all_kinds();

    let start = Instant::now();
    for i in 0..iterations {
        if encoder.available() < HEADER_SIZE + PAYLOAD_SIZE {
            encoder.reset();
        }
        let _ = encoder.encode(kinds[i % kinds.len()], i as u64, &payload);
    }
    let encode_duration = start.elapsed();

    encoder.reset();
    for i in 0..10_000 {
        let _ = encoder.encode(kinds[i % kinds.len()], i as u64, &payload);
    }
    let encoded = encoder.as_bytes().to_vec();

    let start = Instant::now();
    let mut frames = 0usize;
    for _ in 0..100 {
        let mut decoder = Decoder::new(&encoded);
        while let Ok(Some(_)) = decoder.next_frame() {
            frames += 1;
        }
    }
    let decode_duration = start.elapsed();

    println!("  Payload size: {} bytes", PAYLOAD_SIZE);
    println!(
        "  Encode latency: {:.2} ns/op",
        encode_duration.as_nanos() as f64 / iterations as f64
    );
    println!(
        "  Decode latency: {:.2} ns/op",
        decode_duration.as_nanos() as f64 / frames.max(1) as f64
    );
}

fn run(config: CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = registry::init()?;

    match config.command {
        CliCommand::List => print_table(registry),
        CliCommand::Lookup(query) => {
            let kind = lookup(&query)?;
            println!("{} => {} ({:?}), code {}", query, kind, kind, kind.code());
        }
        CliCommand::Bench => {
            benchmark_lookup(config.iterations);
            benchmark_codec(config.iterations);
        }
        CliCommand::Help => println!("{}", USAGE),
    }

    Ok(())
}

fn main() {
    let config = match parse_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    init_logging(config.verbose);

    if let Err(e) = run(config) {
        error!("{}", e);
        std::process::exit(1);
    }
}
