// Dump a BSON file as relaxed Extended JSON.
//
//     cargo run --example bsondump -- path/to/file.bson [--max-depth N] [--lenient-utf8] [--strict-arrays]
use bsonkit::{decode_with_options, DecoderConfig};
use std::process::ExitCode;
use std::time::Instant;

fn usage() -> ExitCode {
    eprintln!("usage: bsondump <file> [--max-depth N] [--lenient-utf8] [--strict-arrays]");
    ExitCode::from(2)
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let mut path = None;
    let mut config = DecoderConfig::default();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--max-depth" => match args.next().and_then(|n| n.parse().ok()) {
                Some(n) => config.max_depth = n,
                None => return usage(),
            },
            "--lenient-utf8" => config.validate_utf8 = false,
            "--strict-arrays" => config.array_strict_indices = true,
            _ if path.is_none() => path = Some(arg),
            _ => return usage(),
        }
    }
    let Some(path) = path else {
        return usage();
    };

    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("{path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let value = match decode_with_options(&bytes, config) {
        Ok(value) => value,
        Err(err) => {
            eprintln!("{path}: {err} [{}]", err.error_type());
            return ExitCode::FAILURE;
        }
    };
    let elapsed = start.elapsed();

    match serde_json::to_string_pretty(&value) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("{path}: {err}");
            return ExitCode::FAILURE;
        }
    }
    eprintln!("decoded {} bytes in {:?}", bytes.len(), elapsed);
    ExitCode::SUCCESS
}
