use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use icamcat_core::{CatalogConfig, ImageKind, ImageStore, LocalStorage, NameListKind, ScanReport};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "icamcat", version, about = "iCam image catalog tool")]
struct Cli {
	/// JSON config file (defaults to ~/.icamcat/config.json when present)
	#[arg(long, global = true)]
	config: Option<PathBuf>,
	/// Image root on the card, overriding the config
	#[arg(long, global = true)]
	root: Option<PathBuf>,
	/// Enable debug logging
	#[arg(short, long, global = true)]
	verbose: bool,
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Build the catalog and print a summary
	Scan {
		/// Print the report as JSON
		#[arg(long)]
		json: bool,
	},
	/// List directories, or the images of one directory
	List {
		/// Directory index
		#[arg(long)]
		dir: Option<usize>,
	},
	/// Translate an absolute image index to a directory/file pair
	Locate {
		abs: usize,
	},
	/// Translate a directory/file pair to an absolute image index
	Abs {
		dir: usize,
		file: usize,
	},
	/// Reserve the path for the next image
	Next {
		/// Reserve a motion JPEG instead of a still
		#[arg(long)]
		mjpeg: bool,
	},
	/// Delete an image by absolute index
	Delete {
		abs: usize,
	},
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	let default_level = if cli.verbose { "debug" } else { "warn" };
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.init();

	let mut config = CatalogConfig::load_or_default(cli.config.as_deref())?;
	if let Some(root) = cli.root {
		config.image_root = root;
	}
	config.validate()?;

	let store = ImageStore::new(config, LocalStorage);
	let report = mount_with_spinner(&store)?;
	let catalog = store.catalog();

	match cli.command {
		Commands::Scan { json } => {
			if json {
				println!("{}", serde_json::to_string_pretty(&report)?);
			} else {
				println!("✅ Catalog built from {}", store.config().image_root.display());
				println!("📁 Directories: {}", report.directories);
				println!("🖼️  Images: {}", report.files);
				println!("⏭️  Skipped entries: {}", report.skipped_entries);
				println!(
					"💾 Arena: {} / {} bytes",
					report.arena_used, report.arena_capacity
				);
				if report.is_truncated() {
					println!(
						"⚠️  Catalog truncated: {} entries did not fit",
						report.dropped_entries
					);
				}
			}
		}
		Commands::List { dir } => {
			let kind = match dir {
				Some(n) => NameListKind::Files(n),
				None => NameListKind::Directories,
			};
			let list = catalog.name_list(kind);
			if list.is_empty() {
				println!("(empty)");
			}
			for (i, name) in list.names().iter().enumerate() {
				println!("{:4}  {}", i, name);
			}
		}
		Commands::Locate { abs } => match catalog.indexes_from_abs(abs) {
			Some((dir, file)) => {
				println!("🎯 Image {} is directory {} file {}", abs, dir, file);
				if let Some(path) = store.image_path(abs) {
					println!("{}", path.display());
				}
			}
			None => println!("❌ No image at index {}", abs),
		},
		Commands::Abs { dir, file } => match catalog.abs_file_index(dir, file) {
			Some(abs) => println!("{}", abs),
			None => println!("❌ No image at directory {} file {}", dir, file),
		},
		Commands::Next { mjpeg } => {
			let kind = if mjpeg { ImageKind::Mjpeg } else { ImageKind::Jpeg };
			let slot = store
				.prepare_image(kind)
				.context("Failed to reserve an image slot")?;
			println!("{}", slot.path.display());
		}
		Commands::Delete { abs } => {
			let path = store.image_path(abs);
			if store.delete_image(abs).context("Failed to delete image")? {
				if let Some(path) = path {
					println!("🗑️  Deleted {}", path.display());
				}
			} else {
				println!("❌ No image at index {}", abs);
			}
		}
	}
	Ok(())
}

fn mount_with_spinner(store: &ImageStore<LocalStorage>) -> Result<ScanReport> {
	let spinner = if atty::is(atty::Stream::Stderr) {
		let bar = ProgressBar::new_spinner();
		bar.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
		bar.set_message("Scanning card...");
		bar.enable_steady_tick(Duration::from_millis(80));
		Some(bar)
	} else {
		None
	};

	let result = store.mount();
	if let Some(bar) = spinner {
		bar.finish_and_clear();
	}
	result.with_context(|| {
		format!(
			"Failed to scan {}",
			store.config().image_root.display()
		)
	})
}
