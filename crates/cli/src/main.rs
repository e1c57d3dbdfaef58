use anyhow::Result;
use clap::{Parser, Subcommand};
use pagelift::commands::{
    fetch_command, history_command, init_project_command, list_ledger_command, migrate_command,
    project_info_command, sync_icons_command, MigrateOverrides,
};
use pagelift::init_tracing;

/// Content migration between two WordPress sites.
///
/// This CLI is a thin wrapper around `pagelift-core` (exposed in code as
/// `pagelift_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "pagelift",
    version,
    about = "Migrate pages between WordPress sites with icon assignment and media upload",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new migration project at the given root.
    ///
    /// This will:
    /// - Create a `.pagelift` metadata directory with `project.json`.
    /// - Create the `pages` and `images` directories.
    /// - Create the run history database.
    Init {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show paths, settings and counts for a project.
    Info {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Fetch source pages listed in `urls.txt` into `pages/`.
    ///
    /// Uses `WP_USER` / `WP_PASS` against each URL's own site.
    Fetch {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Build `icon_files.csv` from the destination's SVG media library.
    SyncIcons {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Rebuild the catalog even if it already exists.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Ignore media items with an id below this value.
        #[arg(long)]
        min_id: Option<u64>,
    },

    /// Migrate staged pages to the destination site.
    ///
    /// Uses `STAGING_URL` / `STAGING_USER` / `STAGING_PASS`. Only the first
    /// staged page is processed unless `--all` is given.
    Migrate {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Process every staged page (turns test mode off).
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Upload fresh images even for pages that already have media.
        #[arg(long, default_value_t = false)]
        upload_new_images: bool,

        /// Keep interlinking metadata in the payload.
        #[arg(long, default_value_t = false)]
        keep_interlinks: bool,

        /// Seed for reproducible image selection.
        #[arg(long)]
        seed: Option<u64>,

        /// Emit the run report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List migrated records from the ledger.
    Ledger {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// List recorded migration runs, or one run's per-record outcomes.
    History {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Show the outcomes of this run id.
        #[arg(long)]
        run: Option<i64>,

        /// Show at most this many runs.
        #[arg(long)]
        limit: Option<usize>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Init { root, name } => init_project_command(&root, name)?,
        Command::Info { root, json } => project_info_command(&root, json)?,
        Command::Fetch { root, json } => fetch_command(&root, json)?,
        Command::SyncIcons { root, force, min_id } => sync_icons_command(&root, force, min_id)?,
        Command::Migrate { root, all, upload_new_images, keep_interlinks, seed, json } => {
            let overrides = MigrateOverrides { all, upload_new_images, keep_interlinks, seed };
            migrate_command(&root, &overrides, json)?
        }
        Command::Ledger { root, json } => list_ledger_command(&root, json)?,
        Command::History { root, run, limit, json } => history_command(&root, run, limit, json)?,
    }

    Ok(())
}
