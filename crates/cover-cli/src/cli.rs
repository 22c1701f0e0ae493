//! Argument grammar: one subcommand struct per Eph5/Rang operation, mirroring
//! the reference tool's command surface one-to-one (see DESIGN.md for the
//! one disclosed narrowing, `rang modify`'s raw-pixel width/height flags).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[clap(name = "cover", version, about = "Hide and recover payloads in JPEG DCT coefficients via Eph5 and Rang-JPEG")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[clap(short, long, parse(from_occurrences), global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Eph5: keyed matrix-coding steganography over a single JPEG.
    #[clap(subcommand)]
    Eph5(Eph5Command),
    /// Rang-JPEG: difference-image steganography over a clear/modified pair.
    #[clap(subcommand)]
    Rang(RangCommand),
}

#[derive(Subcommand)]
pub enum Eph5Command {
    /// Report image geometry and per-k capacity estimates.
    Analyze(Eph5Analyze),
    /// Embed a payload at a given matrix-coding parameter k.
    Embed(Eph5Embed),
    /// Extract all seven k-streams from a container.
    Extract(Eph5Extract),
}

#[derive(Args)]
pub struct Eph5Analyze {
    pub image: PathBuf,
    /// Embedding password (defaults to the tool's default password).
    #[clap(short, long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct Eph5Embed {
    /// Matrix-coding parameter, 1..=7. Required unless --auto is given.
    #[clap(short = 'k', long = "k")]
    pub k: Option<u8>,
    /// Automatically pick the largest k whose expected capacity fits the payload.
    #[clap(short = 'a', long = "auto")]
    pub auto: bool,
    /// On insufficient capacity, retry with decreasing k instead of failing.
    #[clap(short = 'f', long = "fit")]
    pub fit: bool,
    #[clap(short, long)]
    pub password: Option<String>,
    pub data: PathBuf,
    pub container: PathBuf,
    pub out: PathBuf,
}

#[derive(Args)]
pub struct Eph5Extract {
    #[clap(short, long)]
    pub password: Option<String>,
    pub container: PathBuf,
    /// Output files are written as `<out_prefix>.1` .. `<out_prefix>.7`.
    pub out_prefix: PathBuf,
}

#[derive(Subcommand)]
pub enum RangCommand {
    /// Produce the blurred companion image `embed` needs as its "modified" input.
    Modify(RangModify),
    /// Extract a fixed-length payload from a container's public hash.
    Extract(RangExtract),
    /// Solve for and apply a set of coefficient flips encoding a payload.
    Embed(RangEmbed),
}

#[derive(Args)]
pub struct RangModify {
    /// Raw RGBA8 pixel buffer (no container format) to blur.
    pub image: PathBuf,
    #[clap(short = 'w', long = "width")]
    pub width: usize,
    #[clap(short = 'H', long = "height")]
    pub height: usize,
    pub out: PathBuf,
}

#[derive(Args)]
pub struct RangExtract {
    /// Number of bytes to extract.
    #[clap(short = 'l', long = "length")]
    pub length: usize,
    pub image: PathBuf,
    pub out: PathBuf,
}

#[derive(Args)]
pub struct RangEmbed {
    /// Path to a 32-byte entropy file (defaults to an all-zero key).
    #[clap(short = 'e', long = "entropy")]
    pub entropy: Option<PathBuf>,
    /// Extra candidate coefficients sampled to keep the GF(2) system solvable.
    #[clap(short = 'b', long = "padding-bits", default_value = "64")]
    pub padding_bits: usize,
    pub data: PathBuf,
    pub clear: PathBuf,
    pub modified: PathBuf,
    pub out: PathBuf,
}
