//! Terminal host for the RUIAN address widget
//!
//! Each stdin line is the current value of the address field. `:N` picks
//! suggestion N, `:reset` forgets the remembered municipality and street,
//! `:key <KEY>` swaps the registry credential.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use ruian_core::{AddressEvents, AddressWidget, CachePort, Diagnostics, FileCache, MemoryCache, WidgetConfig};
use ruian_types::{ResolvedAddress, SuggestionList, Validity};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Prints notifications and remembers the last list for `:N`
#[derive(Default)]
struct TerminalHost {
    suggestions: Mutex<SuggestionList>,
}

impl TerminalHost {
    fn suggestion(&self, index: usize) -> Option<ruian_types::Suggestion> {
        self.suggestions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }
}

impl AddressEvents for TerminalHost {
    fn on_result(&self, validity: Validity, address: Option<&ResolvedAddress>) {
        match (validity, address) {
            (Validity::Valid, Some(address)) => {
                let payload = serde_json::to_string_pretty(&address.to_payload())
                    .unwrap_or_else(|e| format!("<unprintable: {}>", e));
                println!("valid: true\n{}", payload);
            }
            (Validity::Invalid, _) => println!("valid: false"),
            _ => {}
        }
    }

    fn on_suggestions(&self, suggestions: &SuggestionList) {
        for (i, suggestion) in suggestions.items.iter().enumerate() {
            let marker = if suggestions.highlighted == Some(i) { '*' } else { ' ' };
            println!("{}{:>2}  {}", marker, i, suggestion.label());
        }
        *self.suggestions.lock().unwrap_or_else(PoisonError::into_inner) = suggestions.clone();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = Command::new("ruian-cli")
        .version("1.0.0")
        .about("Czech address autocomplete and validation against RUIAN")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file path (JSON, TOML or YAML)"),
        )
        .arg(
            Arg::new("api-key")
                .long("api-key")
                .value_name("KEY")
                .env("RUIAN_API_KEY")
                .help("Registry API key"),
        )
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .value_name("DIR")
                .help("Directory for the persisted municipality catalog"),
        )
        .arg(
            Arg::new("reset-cache")
                .long("reset-cache")
                .help("Drop the persisted municipality catalog before starting")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .value_name("ADDRESS")
                .help("Validate one address and exit"),
        )
        .get_matches();

    let api_key = matches.get_one::<String>("api-key").map(String::as_str);
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => WidgetConfig::load_with_api_key(Some(PathBuf::from(path).as_path()), api_key)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => WidgetConfig::load_with_api_key(None, api_key).context("No registry API key configured")?,
    };
    if matches.get_flag("reset-cache") {
        config.reset_cache = true;
    }
    config.validate()?;

    let cache: Arc<dyn CachePort> = match matches.get_one::<String>("cache-dir") {
        Some(dir) => {
            log::info!("Using catalog cache directory: {}", dir);
            Arc::new(FileCache::new(dir).with_context(|| format!("Cannot use cache directory {}", dir))?)
        }
        None => Arc::new(MemoryCache::new()),
    };

    let host = Arc::new(TerminalHost::default());
    let widget = AddressWidget::with_http(&config, cache, host.clone(), Diagnostics::new())?;

    if let Some(address) = matches.get_one::<String>("validate") {
        let valid = widget
            .resolve_now(address)
            .await
            .is_some_and(|r| r.validity == Validity::Valid);
        std::process::exit(if valid { 0 } else { 1 });
    }

    run_interactive(&widget, &host).await
}

async fn run_interactive(widget: &AddressWidget, host: &TerminalHost) -> Result<()> {
    log::info!("Type an address; ':N' selects, ':reset' clears, ':key <KEY>' replaces the credential");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_value: Option<String> = None;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let Some(command) = line.strip_prefix(':') else {
            widget.input(line.clone());
            last_value = Some(line);
            continue;
        };

        match command.trim() {
            "reset" => {
                widget.reset_context();
                println!("context cleared");
            }
            cmd if cmd.starts_with("key ") => {
                widget.set_api_key(cmd["key ".len()..].trim());
                println!("credential replaced");
            }
            cmd => match cmd.parse::<usize>().ok().and_then(|i| host.suggestion(i)) {
                Some(suggestion) => {
                    let selection = widget.select(&suggestion).await;
                    println!("> {}", selection.input);
                    last_value = None;
                }
                None => log::warn!("Unknown command or suggestion: :{}", cmd),
            },
        }
    }

    // Input ended before the quiet period elapsed
    if let Some(value) = last_value {
        widget.resolve_now(&value).await;
    }

    Ok(())
}
