use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
pub struct FlatConfig {
    #[arg(long, env = "PHRASEBOOK_DB", default_value = "phrasebook.db", help = "Path to the SQLite database file")]
    db_path: PathBuf,

    #[arg(long, env = "PHRASEBOOK_ADDR", default_value = "127.0.0.1:3000", help = "Address the web server binds to")]
    bind_addr: String,
}

#[derive(Debug)]
pub struct Config {
    pub db: DbConfiguration,
    pub http: HttpConfiguration,
}

#[derive(Debug)]
pub struct DbConfiguration {
    pub db_path: PathBuf, // PHRASEBOOK_DB
}

#[derive(Debug)]
pub struct HttpConfiguration {
    pub bind_addr: String, // PHRASEBOOK_ADDR
}

impl From<FlatConfig> for Config {
    fn from(value: FlatConfig) -> Self {
        Config {
            db: DbConfiguration {
                db_path: value.db_path,
            },
            http: HttpConfiguration {
                bind_addr: value.bind_addr,
            },
        }
    }
}
