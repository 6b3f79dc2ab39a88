use clap::{Parser, Subcommand};
use std::path::PathBuf;

use reception_kiosk::config::KioskConfig;
use reception_kiosk::recognition::{AdminGallery, NullEngine, Recognizer};
use reception_kiosk::serve::{serve_kiosk, AppState};
use reception_kiosk::store::MeetingBook;
use reception_kiosk::videos::VideoArchive;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Reception desk kiosk: face-gated guest booking and video review over HTTP"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the kiosk HTTP server
    Serve {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();
    match args.command {
        Command::Serve { config, port } => {
            let mut kiosk_config = match config {
                Some(path) => KioskConfig::load(&path)?,
                None => KioskConfig::default(),
            };
            if let Some(port) = port {
                kiosk_config.port = port;
            }

            std::fs::create_dir_all(&kiosk_config.videos_dir)?;
            std::fs::create_dir_all(&kiosk_config.admins_dir)?;

            let state = AppState {
                book: MeetingBook::new(&kiosk_config.meetings_file),
                archive: VideoArchive::new(&kiosk_config.videos_dir),
                recognizer: Recognizer::new(
                    AdminGallery::new(&kiosk_config.admins_dir),
                    Box::new(NullEngine),
                ),
            };
            serve_kiosk(state, kiosk_config.port)
        }
    }
}
