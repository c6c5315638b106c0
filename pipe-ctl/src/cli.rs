use clap::{Parser, ValueEnum};
use pipe_rs::{DEFAULT_MESSAGE, DEFAULT_SHIFT, Framing, Variant};

#[derive(Parser)]
#[command(name = "pipe-ctl")]
#[command(version, about = "Fork a child and talk to it over an anonymous pipe", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Child echoes the message shifted by two
    pipe-ctl --message AB
    pipe-ctl --hex 48656c6c6f --wait

    # The greeting program, relayed verbatim
    pipe-ctl --variant greeting

    # Length-prefixed frames, report as JSON
    pipe-ctl --framing length-prefixed --wait --json

    # List variants and framings
    pipe-ctl --list-variants
")]
pub struct Cli {
    /// Payload text sent by the parent
    #[arg(short, long, value_name = "TEXT", default_value = DEFAULT_MESSAGE)]
    pub message: String,

    /// Payload as hex bytes (overrides --message)
    #[arg(short = 'x', long, value_name = "HEX")]
    pub hex: Option<String>,

    /// Program variant
    #[arg(long, value_enum, default_value_t = VariantArg::Echo)]
    pub variant: VariantArg,

    /// Channel framing
    #[arg(long, value_enum, default_value_t = FramingArg::Sentinel)]
    pub framing: FramingArg,

    /// Value added to every echoed byte
    #[arg(long, value_name = "N", default_value_t = DEFAULT_SHIFT)]
    pub shift: u8,

    /// Wait for the child before exiting
    #[arg(short, long)]
    pub wait: bool,

    /// Print the session report as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with status 1 on error instead of 0
    #[arg(long)]
    pub strict: bool,

    /// Show verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// List available variants and framings
    #[arg(long)]
    pub list_variants: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    /// Framed payload, shifted and echoed by the child
    Echo,
    /// Unframed greeting relayed unchanged
    Greeting,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Echo => Variant::Echo,
            VariantArg::Greeting => Variant::Greeting,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum FramingArg {
    /// Payload followed by a 0x00 byte
    Sentinel,
    /// Four-byte big-endian length, then the payload
    LengthPrefixed,
}

impl From<FramingArg> for Framing {
    fn from(arg: FramingArg) -> Self {
        match arg {
            FramingArg::Sentinel => Framing::Sentinel,
            FramingArg::LengthPrefixed => Framing::LengthPrefixed,
        }
    }
}
