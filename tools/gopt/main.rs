//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use ansi_term::Color::{Red, White};
use garnet::cli::{self, BaseOptions, PipelineOptions};
use garnet::instrument::IrPrinter;
use garnet::ir::Module;
use garnet::pass::PassManager;
use garnet::reader;
use garnet::registry::PassRegistry;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    #[cfg(windows)]
    let _ = ansi_term::enable_ansi_support();

    let (pipeline, base) = cli::tool_with(
        "garnet IR optimizer and pass pipeline driver",
        "Usage: gopt [options] <input ir>",
        cli::pipeline(),
    )
    .run();

    cli::init_logging(base.verbose);

    let registry = PassRegistry::with_builtins();

    if pipeline.list_passes {
        for (name, description) in registry.entries() {
            println!("  {name:<20} {description}");
        }

        return ExitCode::SUCCESS;
    }

    match optimize_single_file(&registry, &base, &pipeline) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            let prefix = Red.bold().paint("error:");

            eprintln!("{prefix} {message}");

            ExitCode::FAILURE
        }
    }
}

fn optimize_single_file(
    registry: &PassRegistry,
    base: &BaseOptions,
    options: &PipelineOptions,
) -> Result<(), String> {
    let input = match base.inputs.as_slice() {
        [input] => input,
        [] => return Err("no input file given".to_owned()),
        _ => return Err("can only optimize one file at a time".to_owned()),
    };

    let mut module = read_module(input)?;
    let mut pm = PassManager::new(options.verify);

    for text in options.passes.iter() {
        registry
            .build_pipeline(text, &mut pm)
            .map_err(|e| e.to_string())?;
    }

    if options.print_after_all {
        pm.add_instrumentation(IrPrinter::stderr());
    }

    let report = options.timing.then(|| pm.enable_timing());

    let result = pm.run(&mut module);

    if let Some(report) = report {
        eprint!("{report}");
    }

    result.map_err(|e| e.to_string())?;

    match &base.output {
        Some(path) => fs::write(path, module.to_string())
            .map_err(|e| format!("unable to write output to file `{}`: {e}", path.display())),
        None => {
            garnet::ir::print_module(&module);

            Ok(())
        }
    }
}

fn read_module(path: &Path) -> Result<Module, String> {
    let name = path.display().to_string();
    let source = fs::read_to_string(path).map_err(|e| format!("unable to read `{name}`: {e}"))?;

    reader::parse_ir(&name, &source).map_err(|e| {
        let header = White.bold().paint("failed to parse input");

        format!("{header}\n{}", reader::format_parse_error(&name, &source, &e))
    })
}
