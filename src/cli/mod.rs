use log::error;

use crate::config::Config;
use crate::entities::Phrase;
use crate::store::PhraseStore;

pub fn print_recent(config: Config, limit: usize) {
    let store = open_store(&config);
    let list_result = store.list_recent(limit);
    if list_result.is_err() {
        error!("Failed to list recent searches: {}", list_result.err().unwrap());
        std::process::exit(1);
    }
    print_listing(&list_result.unwrap());
    std::process::exit(0);
}

pub fn print_popular(config: Config, limit: usize) {
    let store = open_store(&config);
    let list_result = store.list_popular(limit);
    if list_result.is_err() {
        error!("Failed to list popular searches: {}", list_result.err().unwrap());
        std::process::exit(1);
    }
    print_listing(&list_result.unwrap());
    std::process::exit(0);
}

fn open_store(config: &Config) -> PhraseStore {
    let open_result = PhraseStore::open(&config.db.db_path);
    if open_result.is_err() {
        error!("Failed to open phrase store: {}", open_result.err().unwrap());
        std::process::exit(1);
    }
    open_result.unwrap()
}

fn print_listing(phrases: &[Phrase]) {
    if phrases.is_empty() {
        println!("No searches have been done.");
        return;
    }
    for phrase in phrases {
        println!(
            "{}  (searched {} times, last {})",
            phrase.text,
            phrase.search_count,
            phrase.last_searched.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
}
