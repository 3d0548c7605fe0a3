use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use wrlpack_core::{convert_file, ConvertOptions, DescriptorFormat, FlattenMode};

const USAGE: &str = "USAGE: wrlpack [--world-space] [--normals] [--json] <infile.wrl> <outfile.xml> <outfile.bin>

Options:
  --world-space  bake transforms into vertex positions
  --normals      generate smooth normals for meshes without them
  --json         write a JSON descriptor instead of XML
  -h, --help     print this message";

/// Parsed command line.
#[derive(Debug, PartialEq)]
struct CliArgs {
    options: ConvertOptions,
    input: PathBuf,
    descriptor: PathBuf,
    binary: PathBuf,
}

#[derive(Debug, PartialEq)]
enum Command {
    Convert(CliArgs),
    Help,
}

/// Parse arguments (without the program name). `Err` carries a usage
/// message.
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command, String> {
    let mut options = ConvertOptions::default();
    let mut positional = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--world-space" => options.flatten = FlattenMode::WorldSpace,
            "--normals" => options.generate_normals = true,
            "--json" => options.descriptor_format = Some(DescriptorFormat::Json),
            "-h" | "--help" => return Ok(Command::Help),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("Unknown option '{}'", flag));
            }
            _ => positional.push(PathBuf::from(arg)),
        }
    }

    let [input, descriptor, binary]: [PathBuf; 3] = positional
        .try_into()
        .map_err(|p: Vec<PathBuf>| format!("Expected 3 file arguments, got {}", p.len()))?;

    Ok(Command::Convert(CliArgs {
        options,
        input,
        descriptor,
        binary,
    }))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(Command::Convert(args)) => args,
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return Ok(());
        }
        Err(message) => {
            eprintln!("{}\n\n{}", message, USAGE);
            std::process::exit(1);
        }
    };

    if !args.input.is_file() {
        bail!("Input file '{}' does not exist", args.input.display());
    }

    log::info!("Converting {} with {:?}", args.input.display(), args.options);

    let report = convert_file(&args.input, &args.descriptor, &args.binary, &args.options)
        .with_context(|| format!("Failed to convert '{}'", args.input.display()))?;

    println!(
        "{}: {} meshes, {} materials, {} instances, {} triangles, {} bytes",
        args.input.display(),
        report.meshes,
        report.materials,
        report.instances,
        report.triangles,
        report.binary_size
    );
    if !report.warnings.is_empty() {
        println!("{} warnings (run with RUST_LOG=warn for details)", report.warnings.len());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_three_positionals() {
        let parsed = parse_args(args(&["in.wrl", "out.xml", "out.bin"])).unwrap();
        assert_eq!(
            parsed,
            Command::Convert(CliArgs {
                options: ConvertOptions::default(),
                input: PathBuf::from("in.wrl"),
                descriptor: PathBuf::from("out.xml"),
                binary: PathBuf::from("out.bin"),
            })
        );
    }

    #[test]
    fn test_flags() {
        let Ok(Command::Convert(parsed)) = parse_args(args(&[
            "--world-space",
            "in.wrl",
            "--normals",
            "out.json",
            "out.bin",
            "--json",
        ])) else {
            panic!("Expected a conversion command");
        };

        assert_eq!(parsed.options.flatten, FlattenMode::WorldSpace);
        assert!(parsed.options.generate_normals);
        assert_eq!(parsed.options.descriptor_format, Some(DescriptorFormat::Json));
        assert_eq!(parsed.binary, PathBuf::from("out.bin"));
    }

    #[test]
    fn test_wrong_argument_count() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["in.wrl", "out.xml"])).is_err());
        assert!(parse_args(args(&["a", "b", "c", "d"])).is_err());
    }

    #[test]
    fn test_unknown_flag() {
        let err = parse_args(args(&["--fast", "in.wrl", "out.xml", "out.bin"])).unwrap_err();
        assert!(err.contains("--fast"));
    }

    #[test]
    fn test_help() {
        assert_eq!(parse_args(args(&["in.wrl", "--help"])), Ok(Command::Help));
    }
}
