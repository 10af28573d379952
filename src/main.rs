/*!
 * mountfs - Command Line Entry Point
 *
 * Mounts a source (directory, packed archive or fused executable) and
 * inspects it through the virtual filesystem:
 * - ls / cat / stat on virtual paths
 * - mount listing in precedence order
 * - packing the merged tree, optionally fused onto an executable
 */

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{miette, IntoDiagnostic, Result};
use tracing::info;

use mountfs::{
    fuse, init_tracing, span_operation, Filesystem, FilesystemConfig, PackBuilder, SystemEnvironment,
};

#[derive(Parser, Debug)]
#[command(name = "mountfs", version, about = "Inspect and pack layered virtual filesystems")]
struct Cli {
    /// Save directory identity; mounts <app data>/<namespace>/<NAME> ahead of the source
    #[arg(long, value_name = "NAME")]
    identity: Option<String>,

    /// JSON configuration file (environment overrides still apply)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory, packed archive or fused executable to mount
    source: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the children of a virtual directory
    Ls {
        #[arg(default_value = "")]
        path: String,
    },
    /// Write a file's contents to stdout
    Cat { path: String },
    /// Print entry metadata as JSON
    Stat { path: String },
    /// List mounts in precedence order
    Mounts,
    /// Pack the merged tree into an archive
    Pack {
        out: PathBuf,
        /// Append the archive to a copy of this executable
        #[arg(long, value_name = "EXE")]
        fuse: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => FilesystemConfig::from_json_file(path)?.with_env_overrides(),
        None => FilesystemConfig::from_env(),
    };

    let mut fs = Filesystem::new(config, SystemEnvironment);
    fs.init(Some(cli.source.as_path()));
    if fs.source().is_none() {
        return Err(miette!(
            code = "mountfs::source",
            help = "SOURCE must be a directory, a packed archive or a fused executable",
            "could not mount {}",
            cli.source.display()
        ));
    }

    if let Some(identity) = &cli.identity {
        fs.set_identity(identity)?;
    }

    run(&fs, cli.command)
}

fn run(fs: &Filesystem, command: Command) -> Result<()> {
    let mut stdout = std::io::stdout().lock();

    match command {
        Command::Ls { path } => {
            let span = span_operation("ls", &path);
            let mut items = fs.directory_items(&path);
            items.sort_unstable();
            items.dedup();
            for item in &items {
                writeln!(stdout, "{}", item).into_diagnostic()?;
            }
            span.record_result(true);
        }
        Command::Cat { path } => {
            let span = span_operation("cat", &path);
            let data = fs.read(&path)?;
            stdout.write_all(&data).into_diagnostic()?;
            span.record_result(true);
        }
        Command::Stat { path } => {
            let span = span_operation("stat", &path);
            let metadata = fs.metadata(&path)?;
            let report = serde_json::json!({
                "path": path,
                "type": metadata.file_type,
                "size": metadata.size,
                "modified": metadata.modified,
                "mount": fs.real_directory(&path).map(|p| p.display().to_string()),
            });
            let text = serde_json::to_string_pretty(&report).into_diagnostic()?;
            writeln!(stdout, "{}", text).into_diagnostic()?;
            span.record_result(true);
        }
        Command::Mounts => {
            for mount in fs.mounts() {
                writeln!(stdout, "{}\t{}", mount.backend, mount.path.display()).into_diagnostic()?;
            }
        }
        Command::Pack { out, fuse: exe } => {
            let span = span_operation("pack", "");
            let archive_path = match &exe {
                Some(_) => out.with_extension("tar.partial"),
                None => out.clone(),
            };

            let file = std::fs::File::create(&archive_path).into_diagnostic()?;
            let mut builder = PackBuilder::new(std::io::BufWriter::new(file));
            let entries = fs.export("", &mut builder)?;
            let (_, archive_len) = builder.finish()?;
            info!(entries = entries, bytes = archive_len, out = %archive_path.display(), "Packed archive");

            if let Some(exe) = exe {
                let total = fuse(&exe, &archive_path, &out);
                std::fs::remove_file(&archive_path).into_diagnostic()?;
                let total = total?;
                writeln!(stdout, "{} entries, {} bytes -> {}", entries, total, out.display())
                    .into_diagnostic()?;
            } else {
                writeln!(stdout, "{} entries, {} bytes -> {}", entries, archive_len, out.display())
                    .into_diagnostic()?;
            }
            span.record_result(true);
        }
    }
    Ok(())
}
