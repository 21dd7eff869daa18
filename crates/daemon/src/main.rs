use tokio::io::BufReader;
use tokio::net::TcpListener;
use tracing::{info, warn};

use chess_rig_core::{
    ControllerSettings, JsonFileSnapshots, RigConfig, ShakmatyOracle, StockfishSource,
    SyncController,
};

mod link;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let mut stdio = false;
    let mut config_path = None;
    for arg in std::env::args().skip(1) {
        if arg == "--stdio" {
            stdio = true;
        } else {
            config_path = Some(arg);
        }
    }

    let config = match &config_path {
        Some(path) => RigConfig::load(path).expect("Failed to load config"),
        None => RigConfig::default(),
    };

    let opponent = StockfishSource::spawn(&config).expect("Failed to start engine");
    let vision = JsonFileSnapshots::new(&config.snapshot_path);
    let mut controller = SyncController::new(
        ShakmatyOracle::new(),
        opponent,
        vision,
        ControllerSettings::from(&config),
    );

    if stdio {
        info!("serving controller link on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = link::serve(&mut controller, stdin, tokio::io::stdout()).await {
            warn!(error = %e, "link failed");
        }
        return;
    }

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .expect("Failed to bind controller link");

    info!(addr = %config.listen_addr, "waiting for controller link");

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };

        info!(%peer, "controller connected");
        let (read, write) = stream.into_split();
        if let Err(e) = link::serve(&mut controller, BufReader::new(read), write).await {
            warn!(%peer, error = %e, "link failed");
        }
    }
}
