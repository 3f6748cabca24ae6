// SPDX-License-Identifier: Apache-2.0 OR MIT

#![forbid(unsafe_code)]

#[macro_use]
mod term;

#[macro_use]
mod process;

mod build_dir;
mod cli;
mod fs;
mod gyp;
mod gyp_env;
mod layout;
mod literal;

use std::env;

use anyhow::Result;

use crate::{
    cli::{Args, Subcommand},
    gyp_env::{Environment as _, ProcessEnv},
    layout::Layout,
};

fn main() {
    let code = match try_main() {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            1
        }
    };
    std::process::exit(code)
}

fn try_main() -> Result<i32> {
    let args = Args::parse()?;
    term::set_coloring(args.color)?;
    term::set_verbose(args.verbose);

    match args.subcommand {
        Subcommand::Help => {
            cli::print_help();
            return Ok(0);
        }
        Subcommand::Version => {
            cli::print_version();
            return Ok(0);
        }
        _ => {}
    }

    let layout = match &args.src_dir {
        Some(src_dir) => {
            let layout = Layout::new(fs::absolute(src_dir));
            if !layout.project_dir().is_dir() {
                warn!("`{}` does not contain a `syzygy` directory", layout.src_dir().display());
            }
            layout
        }
        None => Layout::find_for_wd(&env::current_dir()?)?,
    };

    match args.subcommand {
        Subcommand::Gyp(gyp_args) => {
            let mut env = ProcessEnv::new();
            gyp_env::apply_project_env(&mut env, &layout)?;
            let python = gyp::python(args.python.as_deref(), &env);
            let mut cmd = gyp::command(&layout, python, &gyp_args, &env)?;
            for (key, val) in env.applied() {
                cmd.env(key, val);
            }
            gyp::run(&cmd)
        }
        Subcommand::BuildDir => {
            println!("{}", build_dir::active_build_dir(&layout)?.display());
            Ok(0)
        }
        Subcommand::Env => {
            let mut env = ProcessEnv::new();
            gyp_env::apply_project_env(&mut env, &layout)?;
            for &var in gyp_env::SUPPORTED_VARS {
                if let Some(val) = env.var(var) {
                    println!("{var}={}", val.to_string_lossy());
                }
            }
            Ok(0)
        }
        Subcommand::Help | Subcommand::Version => unreachable!(),
    }
}
