//! Command execution.

use crate::Commands;
use colored::Colorize;
use fesl_protocol::{CodecConfig, Decoder, Message, MessageBuilder};
use serde_json::{json, Value};
use std::io::Read;
use std::path::Path;

/// Executes a command and returns the formatted output.
pub fn execute(config: &CodecConfig, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Decode { file, hex, json } => {
            let input = read_input(file.as_deref())?;
            let data = if hex { decode_hex(&input)? } else { input };
            decode_stream(config, &data, json)
        }

        Commands::Build {
            cmd,
            msg_type,
            id,
            pairs,
            out,
        } => {
            let mut builder = MessageBuilder::new(&cmd, msg_type, id)?;
            for arg in &pairs {
                let (key, value) = parse_pair(arg)?;
                builder.push(key, value);
            }
            let bytes = builder.build()?;

            match out {
                Some(path) => {
                    std::fs::write(&path, &bytes)?;
                    Ok(format!(
                        "{} {} bytes to {}",
                        "Wrote".green(),
                        bytes.len(),
                        path.display().to_string().cyan()
                    ))
                }
                None => Ok(hex::encode(&bytes)),
            }
        }
    }
}

/// Splits `data` into messages and formats each one.
fn decode_stream(
    config: &CodecConfig,
    data: &[u8],
    as_json: bool,
) -> Result<String, Box<dyn std::error::Error>> {
    let mut decoder = Decoder::with_config(config);
    decoder.extend(data);

    let frames = decoder.decode_all()?;
    tracing::debug!(count = frames.len(), "decoded frames");

    let mut lines = Vec::with_capacity(frames.len());
    for frame in &frames {
        let msg = Message::new(frame)?;
        if as_json {
            lines.push(message_json(&msg)?.to_string());
        } else {
            lines.push(format_message(&msg)?);
        }
    }

    if decoder.buffered() > 0 {
        eprintln!(
            "{}: {} trailing bytes do not form a complete message",
            "Warning".yellow(),
            decoder.buffered()
        );
    }

    Ok(lines.join("\n"))
}

fn format_message(msg: &Message<'_>) -> Result<String, Box<dyn std::error::Error>> {
    let type_name = match msg.message_type() {
        Ok(t) => t.to_string(),
        Err(_) => format!("unknown({:#04x})", msg.type_code()),
    };

    let mut output = format!(
        "{} {} id={} length={}",
        msg.cmd().bold(),
        type_name.yellow(),
        msg.id(),
        msg.length()
    );
    for pair in msg.pairs() {
        let (key, value) = pair?;
        output.push_str(&format!("\n  {} = {}", key.cyan(), value));
    }
    Ok(output)
}

fn message_json(msg: &Message<'_>) -> Result<Value, Box<dyn std::error::Error>> {
    let pairs: Vec<Value> = msg
        .collect_pairs()?
        .into_iter()
        .map(|(k, v)| json!([k, v]))
        .collect();

    Ok(json!({
        "cmd": msg.cmd(),
        "type": msg.type_code(),
        "type_name": msg.message_type().ok().map(|t| t.name()),
        "id": msg.id(),
        "length": msg.length(),
        "pairs": pairs,
    }))
}

/// Reads the whole input file, or stdin when no path is given.
fn read_input(path: Option<&Path>) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(std::fs::read(path)?),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Decodes hex text, ignoring whitespace.
fn decode_hex(input: &[u8]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let text: Vec<u8> = input
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(hex::decode(text)?)
}

/// Splits a `KEY=VALUE` argument at the first `=`.
fn parse_pair(arg: &str) -> Result<(&str, &str), Box<dyn std::error::Error>> {
    arg.split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", arg).into())
}
