use clap::{Parser, Subcommand};
use fern::colors::{Color, ColoredLevelConfig};
use phrasebook::cli;
use phrasebook::config::{Config, FlatConfig};
use phrasebook::store::PhraseStore;
use phrasebook::web_ui;

#[derive(Parser, Debug)]
#[command(name = "phrasebook", version, about = "Records search phrases and lists recent and popular searches")]
struct Cli {
    #[command(flatten)]
    config: FlatConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web application (the default)
    Serve,
    /// Print the most recently searched phrases
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Print the most searched-for phrases
    Popular {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = Cli::parse();
    let config: Config = args.config.into();
    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let store = PhraseStore::open(&config.db.db_path)?;
            web_ui::serve(config, store).await
        }
        Command::Recent { limit } => {
            cli::print_recent(config, limit);
            Ok(())
        }
        Command::Popular { limit } => {
            cli::print_popular(config, limit);
            Ok(())
        }
    }
}

fn init_logging() -> anyhow::Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Magenta);
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}
