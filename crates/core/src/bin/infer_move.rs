//! Replays one move inference from a recorded position and snapshot

use chess_rig_core::inference::SquareChanges;
use chess_rig_core::{infer, BoardSnapshot, RulesOracle, ShakmatyOracle};

fn main() {
    let mut args = std::env::args().skip(1);
    let (fen, snapshot_path) = match (args.next(), args.next()) {
        (Some(fen), Some(path)) => (fen, path),
        _ => {
            eprintln!("Usage: infer_move \"<fen>\" <snapshot.json>");
            std::process::exit(1);
        }
    };

    let oracle = ShakmatyOracle::new();
    let previous = oracle.from_fen(&fen).unwrap_or_else(|e| {
        eprintln!("{}", e);
        std::process::exit(1);
    });

    let snapshot = std::fs::read_to_string(&snapshot_path)
        .map_err(chess_rig_core::Error::from)
        .and_then(|json| BoardSnapshot::from_json(&json))
        .unwrap_or_else(|e| {
            eprintln!("Failed to read snapshot {}: {}", snapshot_path, e);
            std::process::exit(1);
        });

    println!("Previous: {}", previous.fen());
    println!("Pieces seen: {}", snapshot.piece_count());

    match SquareChanges::classify(&previous, &snapshot) {
        Ok(changes) => {
            println!("  vacated:  {:?}", changes.vacated);
            println!("  quiet:    {:?}", changes.quiet);
            println!("  captures: {:?}", changes.captures);
            if let Some(square) = changes.removed {
                println!("  removed:  {}", square);
            }
        }
        Err(e) => println!("  {}", e),
    }

    match infer(&oracle, &previous, &snapshot) {
        Ok(mv) => println!("\nInferred move: {}", mv),
        Err(e) => {
            println!("\nNo move: {}", e);
            std::process::exit(2);
        }
    }
}
