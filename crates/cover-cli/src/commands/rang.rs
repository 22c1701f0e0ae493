use log::info;

use cover_core::{modify_image, Container, Rang};

use crate::cli::{RangCommand, RangEmbed, RangExtract, RangModify};
use crate::error::{read_file, write_file, CliError, Result};

pub fn run(command: RangCommand) -> Result<()> {
    match command {
        RangCommand::Modify(args) => modify(args),
        RangCommand::Extract(args) => extract(args),
        RangCommand::Embed(args) => embed(args),
    }
}

fn modify(args: RangModify) -> Result<()> {
    let pixels = read_file(&args.image)?;
    let expected_len = args.width.checked_mul(args.height).and_then(|n| n.checked_mul(4));
    if expected_len != Some(pixels.len()) {
        return Err(CliError::InvalidArgument(format!(
            "expected {}x{} RGBA8 buffer ({} bytes), got {} bytes",
            args.width,
            args.height,
            expected_len.unwrap_or(0),
            pixels.len()
        )));
    }
    let modified = modify_image(args.width, args.height, &pixels);
    write_file(&args.out, &modified)
}

fn load_entropy(path: Option<std::path::PathBuf>) -> Result<Option<[u8; 32]>> {
    let Some(path) = path else { return Ok(None) };
    let bytes = read_file(&path)?;
    let entropy: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
        CliError::InvalidArgument(format!("entropy file must be exactly 32 bytes, got {}", bytes.len()))
    })?;
    Ok(Some(entropy))
}

fn extract(args: RangExtract) -> Result<()> {
    let data = read_file(&args.image)?;
    let container = Container::read(&data)?;
    let rang = Rang::initialize(&container, None, None);
    let extracted = rang.extract(args.length);
    write_file(&args.out, &extracted)
}

fn embed(args: RangEmbed) -> Result<()> {
    let data = read_file(&args.data)?;
    let clear_bytes = read_file(&args.clear)?;
    let modified_bytes = read_file(&args.modified)?;
    let clear = Container::read(&clear_bytes)?;
    let modified = Container::read(&modified_bytes)?;
    let entropy = load_entropy(args.entropy)?;

    let mut rang = Rang::initialize(&clear, Some(&modified), entropy);
    info!("usable differing coefficients: {}", rang.usable_count());
    rang.embed(&data, args.padding_bits)?;

    let mut out_container = clear;
    let changed = rang.apply(&mut out_container);
    info!("embedded {} bytes, {changed} coefficients flipped", data.len());

    write_file(&args.out, &out_container.write()?)
}
