/// Region inspection tool
/// Prints the occupancy map of a region file, reports chunks that fail to
/// decode, and optionally rewrites the region with blocks replaced.
///
/// Usage: region-tool <input> [output] [--config options.toml] [--replace from=to]

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use mcregion::{BlockId, ChunkOptions, RegionContainer};

struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    replace: Option<(BlockId, BlockId)>,
}

fn parse_block(name: &str) -> Result<BlockId> {
    BlockId::from_name(name)
        .or_else(|| name.parse::<u8>().ok().map(BlockId))
        .ok_or_else(|| anyhow!("Unknown block '{}'", name))
}

fn parse_args() -> Result<Args> {
    let mut input = None;
    let mut output = None;
    let mut config = None;
    let mut replace = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a file")?;
                config = Some(PathBuf::from(path));
            }
            "--replace" => {
                let spec = args.next().context("--replace needs from=to")?;
                let (from, to) = spec
                    .split_once('=')
                    .ok_or_else(|| anyhow!("Expected from=to, got '{}'", spec))?;
                replace = Some((parse_block(from)?, parse_block(to)?));
            }
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            _ if output.is_none() => output = Some(PathBuf::from(arg)),
            _ => bail!("Unexpected argument '{}'", arg),
        }
    }

    Ok(Args {
        input: input.context(
            "Usage: region-tool <input> [output] [--config options.toml] [--replace from=to]",
        )?,
        output,
        config,
        replace,
    })
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let options = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            ChunkOptions::from_toml_str(&raw)?
        }
        None => ChunkOptions::default(),
    };

    let bytes = fs::read(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let mut region = RegionContainer::load_with_options(&bytes, options)?;

    println!("{}", region.chunk_occupancy_map());
    println!("{} chunks", region.occupied_count());

    for ((z, x), error) in region.verify_chunks() {
        println!("  chunk ({}, {}): {}", z, x, error);
    }

    if let Some((from, to)) = args.replace {
        let mut skipped = 0;
        for ((z, x), chunk) in region.iter_mut() {
            let result = chunk.block_type_map(|id| if id == from { to } else { id });
            if let Err(e) = result {
                log::warn!("Skipping chunk ({}, {}): {}", z, x, e);
                skipped += 1;
                continue;
            }
            chunk.unload()?;
        }
        println!("Replaced {} with {} ({} chunks skipped)", from, to, skipped);
    }

    if let Some(path) = &args.output {
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        region.export_to(BufWriter::new(file))?;
        log::info!("Wrote {}", path.display());
    }

    Ok(())
}
