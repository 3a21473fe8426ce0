use std::env;

mod app;
mod audio;
mod config;
mod daemon;
mod library;
mod lyrics;
mod mpris;
mod notify;
mod observers;
mod queue;
mod runtime;
mod storage;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match env::args().nth(1).as_deref() {
        Some("dump-config") => {
            // Effective settings, e.g. to seed a config.toml.
            print!("{}", runtime::load_settings().to_toml()?);
            Ok(())
        }
        Some("--version") | Some("-V") => {
            println!("lorchestre {}", storage::VERSION);
            Ok(())
        }
        _ => runtime::run(),
    }
}
