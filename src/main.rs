// Entry point: parse flags, set up logging, then run the picker
// interactively or print the loaded list with --list.

use clap::Parser;
use sitepick::logging::init_logging;
use sitepick::site::Site;
use sitepick::source::{JsonDirectory, SiteContext, SiteSource};
use sitepick::ui::{PickerMode, PickerProps, StaleSelectionPolicy, list, run};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "sitepick")]
#[command(about = "Pick one or more sites from a site directory")]
struct Args {
    /// JSON site directory to load from
    directory: PathBuf,

    /// Absolute url of the current site collection
    #[arg(long)]
    site_url: Option<String>,

    /// Absolute url of the current web (defaults to --site-url)
    #[arg(long)]
    web_url: Option<String>,

    /// Hub the current site collection belongs to
    #[arg(long)]
    hub_site_id: Option<String>,

    /// What to list: site, web or hub
    #[arg(short, long, default_value = "site")]
    mode: String,

    /// Only list sites under the current site collection
    #[arg(long)]
    limit_to_current_site_collection: bool,

    /// Show the search row above the list
    #[arg(long)]
    allow_search: bool,

    /// Site field to sort by (defaults to title)
    #[arg(long)]
    order_by: Option<String>,

    /// Sort descending
    #[arg(long)]
    desc: bool,

    /// Allow only one selected site
    #[arg(long)]
    single: bool,

    /// Ids of sites selected at start
    #[arg(long, value_delimiter = ',')]
    initial: Vec<String>,

    /// Label shown above the list
    #[arg(long, default_value = "")]
    label: String,

    /// Render read-only
    #[arg(long)]
    disabled: bool,

    /// Drop selected sites missing from a freshly loaded list
    #[arg(long)]
    prune_stale: bool,

    /// Print the loaded list and exit without the interactive UI
    #[arg(long)]
    list: bool,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn context(&self) -> Option<SiteContext> {
        let site_url = self.site_url.clone()?;
        Some(SiteContext {
            web_url: self.web_url.clone().unwrap_or_else(|| site_url.clone()),
            site_url,
            hub_site_id: self.hub_site_id.clone(),
        })
    }

    fn props(&self) -> PickerProps {
        let initial_sites = if self.initial.is_empty() {
            None
        } else {
            Some(self.initial.iter().map(|id| Site::new(id, "", "")).collect())
        };
        PickerProps {
            label: self.label.clone(),
            disabled: self.disabled,
            context: self.context(),
            initial_sites,
            multi_select: !self.single,
            mode: PickerMode::from(self.mode.as_str()),
            limit_to_current_site_collection: self.limit_to_current_site_collection,
            allow_search: self.allow_search,
            order_by: self.order_by.clone(),
            is_desc: self.desc,
            stale_selection: if self.prune_stale {
                StaleSelectionPolicy::Prune
            } else {
                StaleSelectionPolicy::Retain
            },
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        if let Err(e) = init_logging(path, &args.log_level) {
            eprintln!("failed to initialize logging: {e}");
        }
    }

    let source: Arc<dyn SiteSource> = Arc::new(JsonDirectory::new(&args.directory));
    let props = args.props();

    if args.list {
        match list(props, source).await {
            Ok(out) => {
                if !out.is_empty() {
                    println!("{out}");
                }
                process::exit(0);
            }
            Err(e) => {
                eprintln!("{e}");
                process::exit(2);
            }
        }
    }

    match run(props, source).await {
        Ok(Some(selection)) => match serde_json::to_string_pretty(&selection) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("failed to encode selection: {e}");
                process::exit(2);
            }
        },
        // quit without confirming
        Ok(None) => process::exit(1),
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    }
}
