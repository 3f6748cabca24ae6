// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::{
    env,
    io::{self, Write as _},
    sync::atomic::{AtomicBool, AtomicU8, Ordering::Relaxed},
};

use anyhow::{bail, Result};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor as _};

static COLORING: AtomicU8 = AtomicU8::new(AUTO);
static VERBOSE: AtomicBool = AtomicBool::new(false);

const AUTO: u8 = 0;
const ALWAYS: u8 = 1;
const NEVER: u8 = 2;

/// Environment variable consulted when `--color` is not passed.
pub(crate) const COLOR_ENV: &str = "SYZYGY_GYP_TERM_COLOR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Coloring {
    Auto,
    Always,
    Never,
}

impl Coloring {
    pub(crate) fn parse(s: &str) -> Result<Self> {
        match s {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => bail!("must be auto, always, or never, but found `{other}`"),
        }
    }
}

pub(crate) fn set_coloring(color: Option<Coloring>) -> Result<()> {
    let color = match color {
        Some(color) => color,
        None => match env::var(COLOR_ENV) {
            Ok(s) if !s.is_empty() => Coloring::parse(&s)?,
            _ => Coloring::Auto,
        },
    };
    let coloring = match color {
        Coloring::Auto => AUTO,
        Coloring::Always => ALWAYS,
        Coloring::Never => NEVER,
    };
    COLORING.store(coloring, Relaxed);
    Ok(())
}

fn coloring() -> ColorChoice {
    match COLORING.load(Relaxed) {
        AUTO => ColorChoice::Auto,
        ALWAYS => ColorChoice::Always,
        NEVER => ColorChoice::Never,
        _ => unreachable!(),
    }
}

pub(crate) fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Relaxed);
}

pub(crate) fn verbose() -> bool {
    VERBOSE.load(Relaxed)
}

pub(crate) fn print_status(
    color: Option<Color>,
    kind: &str,
    write_msg: impl FnOnce(&mut StandardStream) -> io::Result<()>,
) {
    let mut stream = StandardStream::stderr(coloring());
    let _ = stream.set_color(ColorSpec::new().set_bold(true).set_fg(color));
    let _ = write!(stream, "{kind}");
    let _ = stream.reset();
    let _ = write!(stream, ": ");
    let _ = write_msg(&mut stream);
}

macro_rules! error {
    ($($msg:expr),* $(,)?) => {{
        use std::io::Write as _;
        crate::term::print_status(Some(termcolor::Color::Red), "error", |stream| writeln!(stream, $($msg),*));
    }};
}

macro_rules! warn {
    ($($msg:expr),* $(,)?) => {{
        use std::io::Write as _;
        crate::term::print_status(Some(termcolor::Color::Yellow), "warning", |stream| writeln!(stream, $($msg),*));
    }};
}

macro_rules! info {
    ($($msg:expr),* $(,)?) => {{
        use std::io::Write as _;
        crate::term::print_status(None, "info", |stream| writeln!(stream, $($msg),*));
    }};
}
