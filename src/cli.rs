// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::{env, ffi::OsString, path::PathBuf};

use anyhow::{bail, format_err, Error, Result};
use lexopt::{
    Arg::{Long, Short, Value},
    ValueExt as _,
};

use crate::term::{self, Coloring};

pub(crate) fn print_version() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}

const USAGE: &str = "syzygy-gyp [OPTIONS] <SUBCOMMAND>";

pub(crate) fn print_help() {
    println!(
        "\
{0} {1}
{2}
USAGE:
    {USAGE}

SUBCOMMANDS:
    gyp [ARGS]...   Run the gyp generator with the project environment
                    (all following arguments are passed to gyp)
    build-dir       Print the active build directory
    env             Print the gyp variables after applying the project
                    environment

OPTIONS:
        --src-dir <DIR>     Source root (the directory containing `syzygy`);
                            defaults to the nearest such ancestor of the
                            current directory
        --python <PATH>     Python interpreter used to run gyp
                            (defaults to $PYTHON, then `python`)
    -v, --verbose           Use verbose output
        --color <WHEN>      Coloring: auto, always, never
    -h, --help              Prints help information
    -V, --version           Prints version information

ENVIRONMENT:
    SKIP_SYZYGY_GYP_ENV     If set, `syzygy.gyp_env` is not applied
    {3}   Default for --color
",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_DESCRIPTION"),
        term::COLOR_ENV,
    );
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Subcommand {
    /// Run gyp with the given arguments.
    Gyp(Vec<OsString>),
    BuildDir,
    Env,
    Help,
    Version,
}

#[derive(Debug)]
pub(crate) struct Args {
    pub(crate) subcommand: Subcommand,
    pub(crate) src_dir: Option<PathBuf>,
    pub(crate) python: Option<OsString>,
    pub(crate) color: Option<Coloring>,
    pub(crate) verbose: bool,
}

impl Args {
    pub(crate) fn parse() -> Result<Self> {
        Self::parse_from(env::args_os().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = impl Into<OsString>>) -> Result<Self> {
        let mut parser = lexopt::Parser::from_args(args);

        let mut subcommand: Option<Subcommand> = None;
        let mut src_dir: Option<PathBuf> = None;
        let mut python: Option<OsString> = None;
        let mut color: Option<String> = None;
        let mut verbose = false;
        let mut help = false;
        let mut version = false;

        while let Some(arg) = parser.next()? {
            macro_rules! parse_opt {
                ($opt:ident) => {{
                    if $opt.is_some() {
                        return Err(multi_arg(&arg));
                    }
                    $opt = Some(parser.value()?.into());
                }};
            }

            match arg {
                Long("src-dir") => parse_opt!(src_dir),
                Long("python") => parse_opt!(python),
                Long("color") => {
                    if color.is_some() {
                        return Err(multi_arg(&arg));
                    }
                    color = Some(parser.value()?.string()?);
                }
                Short('v') | Long("verbose") => verbose = true,
                Short('h') | Long("help") => help = true,
                Short('V') | Long("version") => version = true,
                Value(value) if subcommand.is_none() => {
                    subcommand = Some(match value.to_str() {
                        Some("gyp") => {
                            // Everything after `gyp` belongs to gyp, including `--help`.
                            Subcommand::Gyp(parser.raw_args()?.collect())
                        }
                        Some("build-dir") => Subcommand::BuildDir,
                        Some("env") => Subcommand::Env,
                        _ => bail!(
                            "no such subcommand: `{}`\n\nUSAGE:\n    {USAGE}\n\nFor more information try --help",
                            value.to_string_lossy()
                        ),
                    });
                }
                _ => return Err(arg.unexpected().into()),
            }
        }

        let color = color.as_deref().map(Coloring::parse).transpose()?;

        let subcommand = if help {
            Subcommand::Help
        } else if version {
            Subcommand::Version
        } else {
            subcommand.ok_or_else(|| {
                format_err!(
                    "no subcommand specified\n\nUSAGE:\n    {USAGE}\n\nFor more information try --help"
                )
            })?
        };

        Ok(Self { subcommand, src_dir, python, color, verbose })
    }
}

fn multi_arg(arg: &lexopt::Arg<'_>) -> Error {
    let flag = match arg {
        Long(flag) => format!("--{flag}"),
        Short(flag) => format!("-{flag}"),
        Value(_) => unreachable!(),
    };
    format_err!(
        "\
The argument '{flag}' was provided more than once, but cannot be used multiple times

USAGE:
    {USAGE}

For more information try --help
"
    )
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsString, path::PathBuf};

    use super::{Args, Subcommand};
    use crate::term::Coloring;

    fn parse(args: &[&str]) -> anyhow::Result<Args> {
        Args::parse_from(args.iter().copied())
    }

    #[test]
    fn gyp_args_are_forwarded() {
        let args = parse(&["--src-dir", "/src", "gyp", "--depth=.", "-v", "--help"]).unwrap();
        assert_eq!(
            args.subcommand,
            Subcommand::Gyp(vec!["--depth=.".into(), "-v".into(), "--help".into()])
        );
        assert_eq!(args.src_dir, Some(PathBuf::from("/src")));
        assert!(!args.verbose);

        let args = parse(&["gyp"]).unwrap();
        assert_eq!(args.subcommand, Subcommand::Gyp(vec![]));
    }

    #[test]
    fn options_after_subcommand() {
        let args =
            parse(&["build-dir", "-v", "--color=never", "--python", "python2.7"]).unwrap();
        assert_eq!(args.subcommand, Subcommand::BuildDir);
        assert!(args.verbose);
        assert_eq!(args.color, Some(Coloring::Never));
        assert_eq!(args.python, Some(OsString::from("python2.7")));

        assert_eq!(parse(&["env"]).unwrap().subcommand, Subcommand::Env);
    }

    #[test]
    fn help_and_version() {
        assert_eq!(parse(&["-h"]).unwrap().subcommand, Subcommand::Help);
        assert_eq!(parse(&["env", "--help"]).unwrap().subcommand, Subcommand::Help);
        assert_eq!(parse(&["-V"]).unwrap().subcommand, Subcommand::Version);
    }

    #[test]
    fn errors() {
        let e = parse(&[]).unwrap_err().to_string();
        assert!(e.contains("no subcommand specified"), "{e}");

        let e = parse(&["configure"]).unwrap_err().to_string();
        assert!(e.contains("no such subcommand: `configure`"), "{e}");

        let e = parse(&["--src-dir", "a", "--src-dir=b", "env"]).unwrap_err().to_string();
        assert!(e.contains("The argument '--src-dir' was provided more than once"), "{e}");

        let e = parse(&["env", "--color", "sometimes"]).unwrap_err().to_string();
        assert!(e.contains("must be auto, always, or never, but found `sometimes`"), "{e}");

        let e = parse(&["env", "--frobnicate"]).unwrap_err().to_string();
        assert!(e.contains("--frobnicate"), "{e}");

        let e = parse(&["env", "extra"]).unwrap_err().to_string();
        assert!(e.contains("extra"), "{e}");

        assert!(parse(&["--python"]).is_err());
    }
}
