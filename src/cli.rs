//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

//! Contains utility code specifically for the CLI tools located in
//! the `tools/` subdirectory.
//!
//! Tools should look/feel uniform, so the common options and the logging
//! setup are pulled into this module and then used by each driver.

use bpaf::{construct, OptionParser, Parser};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Basic options that every CLI tool in the suite takes in.
#[derive(Debug, Clone)]
pub struct BaseOptions {
    /// The file to output results to
    pub output: Option<PathBuf>,
    /// Whether or not to run the logging in verbose mode.
    pub verbose: bool,
    /// The list of inputs given to the tool
    pub inputs: Vec<PathBuf>,
}

/// Options for tools that run pass pipelines.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Textual pipelines, in the order they were given
    pub passes: Vec<String>,
    /// Whether to insert verifiers after every pass
    pub verify: bool,
    /// Whether to print a timing report at the end
    pub timing: bool,
    /// Whether to dump the IR after every pass
    pub print_after_all: bool,
    /// Whether to list the available passes and exit
    pub list_passes: bool,
}

/// Returns a [`OptionParser`] preconfigured with the standard options
/// and additional tool-specific options.
pub fn tool_with<T>(
    description: &'static str,
    usage: &'static str,
    additional: impl Parser<T> + 'static,
) -> OptionParser<(T, BaseOptions)> {
    let res = construct!(additional, default());

    res.to_options()
        .descr(description)
        .version(VERSION)
        .usage(usage)
}

/// Gets the baseline default options that every tool needs.
pub fn default() -> impl Parser<BaseOptions> {
    let inputs = inputs();
    let output = output();
    let verbose = verbose();

    construct!(BaseOptions {
        output,
        verbose,
        inputs,
    })
}

/// Gets every option related to running pass pipelines.
pub fn pipeline() -> impl Parser<PipelineOptions> {
    let passes = passes();
    let verify = verify();
    let timing = timing();
    let print_after_all = print_after_all();
    let list_passes = list_passes();

    construct!(PipelineOptions {
        passes,
        verify,
        timing,
        print_after_all,
        list_passes,
    })
}

/// Gets the output file specified on the CLI, if one exists.
pub fn output() -> impl Parser<Option<PathBuf>> {
    bpaf::long("output")
        .short('o')
        .help("the file to output to")
        .argument::<PathBuf>("FILE")
        .optional()
}

/// Gets the input file specified on the CLI.
pub fn inputs() -> impl Parser<Vec<PathBuf>> {
    bpaf::positional::<PathBuf>("FILES")
        .help("files to read as input to the tool")
        .many()
}

/// Checks for the presence of `-v` or `--verbose`
pub fn verbose() -> impl Parser<bool> {
    bpaf::long("verbose")
        .short('v')
        .help("enable verbose output")
        .flag(true, false)
}

/// Gets a list of pipelines to run over the IR
pub fn passes() -> impl Parser<Vec<String>> {
    bpaf::long("passes")
        .short('p')
        .help("a comma-separated pipeline to run over the input, e.g. `constfold,dce`")
        .argument::<String>("PIPELINE")
        .many()
}

/// Checks for the presence of `--verify`
pub fn verify() -> impl Parser<bool> {
    bpaf::long("verify")
        .help("verify the IR after every pass")
        .flag(true, false)
}

/// Checks for the presence of `--timing`
pub fn timing() -> impl Parser<bool> {
    bpaf::long("timing")
        .help("print how long every pass took")
        .flag(true, false)
}

/// Checks for the presence of `--print-after-all`
pub fn print_after_all() -> impl Parser<bool> {
    bpaf::long("print-after-all")
        .help("print the IR to stderr after every pass")
        .flag(true, false)
}

/// Checks for the presence of `--list-passes`
pub fn list_passes() -> impl Parser<bool> {
    bpaf::long("list-passes")
        .help("list every available pass and exit")
        .flag(true, false)
}

/// Installs a logger that writes to stderr.
///
/// `RUST_LOG` takes priority if it is set, otherwise only warnings are
/// shown (or everything at `debug` and above when `verbose` is set).
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // a second call in the same process keeps the first logger
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
