// xtask - Build automation for the Tamarin workspace
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::env;
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, exit};

const BINARY: &str = "tamarin";

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();

    let result = match args.split_first() {
        None => {
            print_usage();
            Ok(())
        }
        Some((command, rest)) => match command.as_str() {
            "install" => bin_dir(rest).and_then(install),
            "uninstall" => bin_dir(rest).and_then(uninstall),
            "help" | "-h" | "--help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!(
                "unrecognised command '{}', try 'cargo xtask help'",
                other
            )),
        },
    };

    if let Err(message) = result {
        eprintln!("xtask: {}", message);
        exit(1);
    }
}

fn print_usage() {
    println!("usage: cargo xtask <install|uninstall> [--prefix <dir>]");
    println!();
    println!("  install     release-build the {} binary and copy it into <dir>/bin", BINARY);
    println!("  uninstall   remove a previously installed binary from <dir>/bin");
    println!();
    println!("<dir> defaults to $CARGO_HOME, or ~/.cargo when unset.");
}

/// Where binaries land: `<prefix>/bin`. The prefix comes from `--prefix`,
/// then `$CARGO_HOME`, then `~/.cargo`.
fn bin_dir(args: &[String]) -> Result<PathBuf, String> {
    let prefix = match args.iter().position(|arg| arg == "--prefix") {
        Some(pos) => args
            .get(pos + 1)
            .map(PathBuf::from)
            .ok_or("--prefix needs a directory")?,
        None => env::var_os("CARGO_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".cargo")))
            .ok_or("cannot work out an install prefix, pass --prefix <dir>")?,
    };
    Ok(prefix.join("bin"))
}

fn workspace_root() -> PathBuf {
    // xtask sits one level below the workspace root.
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn install(bin_dir: PathBuf) -> Result<(), String> {
    let root = workspace_root();
    let cargo = env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());

    let status = Command::new(cargo)
        .args(["build", "--release", "--bin", BINARY])
        .current_dir(&root)
        .status()
        .map_err(|e| format!("could not run cargo: {}", e))?;
    if !status.success() {
        return Err("release build failed".to_string());
    }

    let built = root.join("target").join("release").join(BINARY);
    let installed = bin_dir.join(BINARY);

    fs::create_dir_all(&bin_dir).map_err(|e| describe(&bin_dir, e))?;
    fs::copy(&built, &installed).map_err(|e| describe(&built, e))?;
    fs::set_permissions(&installed, fs::Permissions::from_mode(0o755))
        .map_err(|e| describe(&installed, e))?;

    println!("installed {}", installed.display());
    Ok(())
}

fn uninstall(bin_dir: PathBuf) -> Result<(), String> {
    let installed = bin_dir.join(BINARY);
    if !installed.exists() {
        println!("nothing installed at {}", installed.display());
        return Ok(());
    }

    fs::remove_file(&installed).map_err(|e| describe(&installed, e))?;
    println!("removed {}", installed.display());
    Ok(())
}

fn describe(path: &Path, error: io::Error) -> String {
    format!("{}: {}", path.display(), error)
}
