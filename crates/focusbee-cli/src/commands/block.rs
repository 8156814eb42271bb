use clap::Subcommand;
use focusbee_core::blocking::block_page;
use focusbee_core::{Config, Gatekeeper, PageHost, RuleSink, Verdict};

use super::{open_controller, print_json, CliResult};

#[derive(Subcommand)]
pub enum BlockAction {
    /// Add a site to the blocklist
    Add {
        /// Domain or URL, e.g. "reddit.com" or "https://www.reddit.com/r/rust"
        url: String,
    },
    /// Remove a site by id or domain
    Remove { target: String },
    /// List blocked sites
    List {
        #[arg(long)]
        json: bool,
    },
    /// Remove every blocked site
    Clear,
    /// Turn blocking on
    Enable,
    /// Turn blocking off
    Disable,
    /// Flip blocking on/off
    Toggle,
    /// Print the installed redirect rules as JSON
    Rules,
    /// Check whether a page would be blocked
    Check {
        url: String,
        /// Print the block page HTML when blocked
        #[arg(long)]
        html: bool,
    },
}

/// A page that only exists for one check.
struct ConsolePage {
    url: String,
    document: Option<String>,
}

impl PageHost for ConsolePage {
    fn current_url(&self) -> String {
        self.url.clone()
    }

    fn stop_loading(&mut self) {
        tracing::debug!(url = %self.url, "page load stopped");
    }

    fn replace_document(&mut self, html: String) {
        self.document = Some(html);
    }

    fn lock_navigation(&mut self) {}
}

fn status_line(enabled: bool) -> &'static str {
    if enabled {
        "blocking: on"
    } else {
        "blocking: off"
    }
}

pub fn run(action: BlockAction, config: Config) -> CliResult {
    let mode = config.blocking.match_mode;
    let mut ctl = open_controller(config)?;

    match action {
        BlockAction::Add { url } => {
            let entry = ctl.add_blocked(&url)?;
            println!("Blocked: {} ({})", entry.url, entry.id);
        }
        BlockAction::Remove { target } => {
            let entry = ctl.remove_blocked(&target)?;
            println!("Unblocked: {}", entry.url);
        }
        BlockAction::List { json } => {
            let list = ctl.blocklist();
            if json {
                print_json(list.entries())?;
            } else {
                println!("{}", status_line(list.is_enabled()));
                if list.is_empty() {
                    println!("No blocked sites.");
                }
                for entry in list.entries() {
                    println!("  {}  {}", entry.id, entry.url);
                }
            }
        }
        BlockAction::Clear => {
            let removed = ctl.clear_blocked();
            println!("Removed {removed} site(s).");
        }
        BlockAction::Enable => {
            ctl.set_blocking(true);
            println!("{}", status_line(true));
        }
        BlockAction::Disable => {
            ctl.set_blocking(false);
            println!("{}", status_line(false));
        }
        BlockAction::Toggle => {
            let enabled = ctl.toggle_blocking();
            println!("{}", status_line(enabled));
        }
        BlockAction::Rules => {
            let rules = ctl.rules().dynamic_rules()?;
            print_json(&rules)?;
        }
        BlockAction::Check { url, html } => {
            let mut page = ConsolePage {
                url,
                document: None,
            };
            let mut gatekeeper = Gatekeeper::new(mode);
            match ctl.check_page(&mut gatekeeper, &mut page) {
                Verdict::Allowed => println!("allowed"),
                Verdict::Blocked { host, domain } => {
                    println!("blocked: {host} matches {domain}");
                    if html {
                        let document = page
                            .document
                            .unwrap_or_else(|| block_page::render(&host, None));
                        println!("{document}");
                    }
                }
            }
        }
    }
    Ok(())
}
