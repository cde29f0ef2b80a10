use anyhow::anyhow;
use clap::{Parser, Subcommand};
use derive_more::Display;
use easel_config::settings::Setting;
use easel_config::storage::{JsonStorageAdapter, MemoryStorageAdapter};
use easel_config::{config_store, config_store_write, StorageAdapter};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Parser)]
#[clap(name = "easel-config", version = "0.1.0", author = "Easel")]
struct Cli {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[clap(arg_required_else_help = true, about = "View a setting")]
    View {
        #[clap(required = true, short = 'k', long = "key")]
        key: String,
    },
    #[clap(about = "List all settings")]
    List,
    #[clap(arg_required_else_help = true, about = "Set a setting")]
    Set {
        #[clap(required = true, short = 'k', long = "key")]
        key: String,
        #[clap(required = true, short = 'v', long = "value")]
        value: String,
    },
    #[clap(arg_required_else_help = true, about = "Search for a setting")]
    Search {
        #[clap(required = true, short = 'k', long = "key")]
        key: String,
    },
}

#[derive(Clone, Copy, Debug, Display, clap::ValueEnum)]
enum Engine {
    Memory,
    Json,
}

impl FromStr for Engine {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(Engine::Memory),
            "json" => Ok(Engine::Json),
            _ => Err(anyhow!("unknown storage engine '{s}'")),
        }
    }
}

#[derive(Debug, Parser)]
struct GlobalOpts {
    #[clap(short = 'e', long = "engine", global = true, default_value = "json")]
    engine: Engine,
    #[clap(
        short = 'p',
        long = "path",
        global = true,
        default_value = "settings.json"
    )]
    path: String,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    let storage: Box<dyn StorageAdapter> = match args.global_opts.engine {
        Engine::Memory => Box::new(MemoryStorageAdapter::new()),
        Engine::Json => Box::new(JsonStorageAdapter::try_from(Path::new(&args.global_opts.path))?),
    };

    config_store_write().set_storage(storage);

    match args.command {
        Commands::View { key } => {
            let store = config_store();
            let (Some(info), Some(value)) = (store.get_info(&key), store.get(&key)) else {
                println!("Key not found");
                return Ok(());
            };

            println!("Key            : {key}");
            println!("Current Value  : {value}");
            println!("Default Value  : {}", info.default);
            println!("Description    : {}", info.description);
        }
        Commands::List => print_matching("*"),
        Commands::Set { key, value } => {
            config_store().set(&key, Setting::from_str(&value)?);
        }
        Commands::Search { key } => print_matching(&key),
    }

    Ok(())
}

fn print_matching(search: &str) {
    let store = config_store();
    for key in store.find(search) {
        if let Some(value) = store.get(&key) {
            println!("{key:40}: {value}");
        }
    }
}
