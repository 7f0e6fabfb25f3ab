use clap::Parser;
use code128_sheet::{App, BarcodeServer, Config};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    let app = App::from_config(config);
    let server = match BarcodeServer::bind(app) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(addr) = server.local_addr() {
        println!("Barcode generator started, open http://{} to generate", addr);
    }
    server.run();
}
