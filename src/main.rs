//! KEEPSAKE - Embedded Region Store
//! Interactive shell over a single store file.

use std::io::{self, BufRead, Write};

use keepsake::config::Config;
use keepsake::engine::Keepsake;
use keepsake::types::Key;

fn main() {
    env_logger::init();

    println!();
    println!("  ╔═══════════════════════════════════════════╗");
    println!("  ║          KEEPSAKE Region Store            ║");
    println!("  ║     Staged commits, single-file v1.0.0    ║");
    println!("  ╚═══════════════════════════════════════════╝");
    println!();
    println!("  Commands:");
    println!("    regions                      - List visible regions");
    println!("    show <region>                - Print a region's records");
    println!("    add <region>                 - Stage a new region");
    println!("    drop <region>                - Stage a region removal");
    println!("    put <region> <key> [vals..]  - Stage a record insert/overwrite");
    println!("    unset <region> <key>         - Stage a record removal");
    println!("    save                         - Commit staged changes");
    println!("    restore                      - Discard staged changes");
    println!("    info                         - Show engine statistics");
    println!("    exit                         - Shutdown");
    println!();

    let config = match std::env::args().nth(1) {
        Some(dir) => Config::new(dir, "store"),
        None => Config::default(),
    };
    let mut engine = match Keepsake::open(config) {
        Ok(e) => e,
        Err(err) => {
            eprintln!("[ERROR] Failed to open store: {}", err);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("keepsake> ");
        let _ = stdout.flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("[ERROR] {}", e);
                break;
            }
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue;
        }

        match parts[0].to_lowercase().as_str() {
            "regions" | "ls" => {
                let names = engine.list_regions();
                if names.is_empty() {
                    println!("  (empty)");
                } else {
                    for name in &names {
                        println!("  {}", name);
                    }
                    println!("  ({} regions)", names.len());
                }
            }
            "show" => {
                if parts.len() < 2 {
                    println!("  Usage: show <region>");
                    continue;
                }
                match engine.get_region(parts[1]) {
                    Some(region) if region.is_empty() => println!("  {} (no records)", region.name()),
                    Some(region) => {
                        for record in region.records() {
                            println!("  {} -> {:?}", record.key, record.values);
                        }
                        println!("  ({} records)", region.len());
                    }
                    None => println!("  (no such region)"),
                }
            }
            "add" => {
                if parts.len() < 2 {
                    println!("  Usage: add <region>");
                    continue;
                }
                if engine.add_region(parts[1]) {
                    println!("  OK (staged)");
                } else if engine.region_exists(parts[1]) {
                    println!("  ERROR: region already exists");
                } else {
                    println!("  ERROR: names may only use letters, digits and - _ ? !");
                }
            }
            "drop" => {
                if parts.len() < 2 {
                    println!("  Usage: drop <region>");
                    continue;
                }
                if engine.remove_region(parts[1]) {
                    println!("  OK (staged)");
                } else {
                    println!("  ERROR: no such region");
                }
            }
            "put" => {
                if parts.len() < 3 {
                    println!("  Usage: put <region> <key> [values...]");
                    continue;
                }
                let Some(mut region) = engine.get_region(parts[1]).cloned() else {
                    println!("  ERROR: no such region");
                    continue;
                };
                let key = Key::from(parts[2]);
                let values: Vec<String> = parts[3..].iter().map(|v| v.to_string()).collect();
                if !region.replace_item(key.clone(), values.clone()) {
                    region.add_item(key, values);
                }
                engine.replace_region(region);
                println!("  OK (staged)");
            }
            "unset" => {
                if parts.len() < 3 {
                    println!("  Usage: unset <region> <key>");
                    continue;
                }
                let Some(mut region) = engine.get_region(parts[1]).cloned() else {
                    println!("  ERROR: no such region");
                    continue;
                };
                if region.remove_item(&Key::from(parts[2])) {
                    engine.replace_region(region);
                    println!("  OK (staged)");
                } else {
                    println!("  (no such key)");
                }
            }
            "save" | "commit" => match engine.save() {
                Ok(()) => println!("  OK (saved)"),
                Err(e) => println!("  ERROR: {}", e),
            },
            "restore" | "rollback" => match engine.restore() {
                Ok(()) => println!("  OK (restored)"),
                Err(e) => println!("  ERROR: {}", e),
            },
            "info" | "stats" => {
                println!("  File:          {:?}", engine.path());
                println!("  Regions:       {}", engine.list_regions().len());
                println!("  Staged ops:    {}", engine.pending_len());
                println!("{}", engine.metrics().report());
            }
            "exit" | "quit" | "q" => {
                if engine.pending_len() > 0 {
                    println!("  Discarding {} unsaved operations", engine.pending_len());
                }
                println!("  Shutting down KEEPSAKE...");
                break;
            }
            _ => {
                println!("  Unknown command: '{}'. Type 'exit' to quit.", parts[0]);
            }
        }
    }
}
