use dotenvy::dotenv;
use gamelink_worker::{cli::handle_command_line_args, config::WorkerConfig, worker::run_worker};
use log::info;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    if handle_command_line_args() {
        return;
    }
    let config = WorkerConfig::from_env_or_default();

    info!("🚀️ Starting GameLink worker. SLA is {} minutes", config.sla.num_minutes());
    match run_worker(config).await {
        Ok(_) => println!("Bye!"),
        Err(e) => eprintln!("{e}"),
    }
}
