extern crate log;
extern crate simplelog;

use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::{Duration, Instant};

use log::info;

use serpent::compiler::{
    codegen::generate,
    expander::{expand, Expansion},
    isa::Program,
    CompilerError,
};
use serpent::emulator::{Emulator, WriterSink};
use serpent::io::{is_primitive, unit_name, FsLoader};
use serpent::project::GridExport;
use serpent::*;

fn main() {
    let args = configure_cli().get_matches();

    if let Some(level) = get_log_level(&args) {
        if let Err(e) = configure_logging(level) {
            eprintln!("Failed to configure logger: {}", e);
        }
    }

    let config = match read_config(&args) {
        Ok(config) => config,
        Err(msg) => {
            print_errs(&[msg]);
            exit(ERR_CONFIG)
        }
    };
    let fixed = match config.fixed_point() {
        Some(fp) => fp,
        None => {
            print_errs(&[format!("Invalid scale {}", config.scale)]);
            exit(ERR_CONFIG)
        }
    };

    let input = args.value_of("input").unwrap_or_default();
    let src_path = Path::new(input);
    let unit = unit_name(src_path);
    let text = match std::fs::read_to_string(src_path) {
        Ok(text) => text,
        Err(e) => {
            print_errs(&[format!("Could not read {}: {}", src_path.display(), e)]);
            exit(ERR_IO)
        }
    };

    let stop_stage = get_stage(&args);

    // Expand
    let expand_time = Instant::now();
    let expansion = if is_primitive(src_path) {
        None
    } else {
        match expand(&unit, &text, &FsLoader::beside(src_path), fixed) {
            Ok(expansion) => Some(expansion),
            Err(err) => {
                print_errs(&[err]);
                exit(ERR_EXPAND)
            }
        }
    };
    let primitive = expansion.as_ref().map_or_else(|| text.clone(), Expansion::text);
    info!("Expand: {}", expand_time.elapsed().as_secs_f32());

    if let Some(asm) = args.value_of("emit-asm") {
        if let Err(e) = std::fs::write(asm, &primitive) {
            print_errs(&[format!("Could not write {}: {}", asm, e)]);
            exit(ERR_IO)
        }
    }

    if stop_stage == Some(Stage::Expand) {
        return;
    }

    // Parse
    let program = match Program::parse(&primitive) {
        Ok(program) => program,
        Err(err) => {
            print_errs(&[locate_in(expansion.as_ref(), &unit, err)]);
            exit(ERR_PARSE)
        }
    };

    if stop_stage == Some(Stage::Parse) {
        return;
    }

    if args.is_present("emulate") {
        let mut emulator = match Emulator::new(&program, config.registers) {
            Ok(emulator) => emulator
                .with_tick(Duration::from_millis(config.tick_ms))
                .with_stack_depth(config.stack_depth),
            Err(errs) => {
                let errs: Vec<_> = errs
                    .into_iter()
                    .map(|e| locate_in(expansion.as_ref(), &unit, e))
                    .collect();
                print_errs(&errs);
                exit(ERR_EMULATOR)
            }
        };

        let stdout = std::io::stdout();
        let mut sink = WriterSink::new(stdout.lock());
        if let Err(err) = emulator.run(&mut sink) {
            print_errs(&[locate_in(expansion.as_ref(), &unit, err)]);
            exit(ERR_EMULATOR)
        }
        return;
    }

    // Generate
    let generate_time = Instant::now();
    let compilation = match generate(&program, &config) {
        Ok(compilation) => compilation,
        Err(errs) => {
            let errs: Vec<_> = errs
                .into_iter()
                .map(|e| locate_in(expansion.as_ref(), &unit, e))
                .collect();
            print_errs(&errs);
            exit(ERR_CODEGEN)
        }
    };
    info!("Generate: {}", generate_time.elapsed().as_secs_f32());
    if !compilation.fallthrough().is_empty() {
        info!(
            "{} label(s) are entered by falling through",
            compilation.fallthrough().len()
        );
    }

    if stop_stage == Some(Stage::Generate) {
        return;
    }

    let output = args
        .value_of("output")
        .map_or_else(|| src_path.with_extension("json"), PathBuf::from);
    let export = match &expansion {
        Some(expansion) => GridExport::extract(&compilation).locate(expansion),
        None => GridExport::extract(&compilation),
    };
    let written = std::fs::File::create(&output)
        .map_err(|e| e.to_string())
        .and_then(|f| export.write(f).map_err(|e| e.to_string()));
    if let Err(e) = written {
        print_errs(&[format!("Failed to write grid export {}: {}", output.display(), e)]);
        exit(ERR_EXPORT)
    }
    info!(
        "Wrote {} cells in {} rows to {}",
        export.cells.len(),
        export.height,
        output.display()
    );
}

/// Report an error in the primitive text against the file the user wrote.
fn locate_in<E>(
    expansion: Option<&Expansion>,
    unit: &str,
    err: CompilerError<E>,
) -> CompilerError<E> {
    match expansion {
        Some(expansion) => expansion.locate(err),
        None => err.in_unit(unit),
    }
}
