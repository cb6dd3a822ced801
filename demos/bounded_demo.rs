use std::sync::Arc;
use std::thread;

use brim_hash::SyncHashTable;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    /// Number of slots in the table.
    #[arg(short = 'c', long = "capacity", default_value_t = 10)]
    capacity: usize,

    /// Producer/consumer thread pairs for the concurrent phase.
    #[arg(short = 'p', long = "pairs", default_value_t = 4)]
    pairs: usize,

    /// Items each producer inserts.
    #[arg(short = 'n', long = "items", default_value_t = 1000)]
    items: usize,
}

fn main() -> Result<(), brim_hash::Error> {
    let args = Args::parse();
    if args.capacity < 6 {
        // The scripted scenario below inserts six keys with nothing
        // consuming; a smaller table would park forever.
        eprintln!("capacity must be at least 6");
        std::process::exit(2);
    }

    let table = SyncHashTable::new(args.capacity)?;

    println!("Filling a table of capacity {}...", table.capacity());
    for (key, value) in [
        ("hello", 1),
        ("there", 2),
        ("ther", 6),
        ("the", 5),
        ("theree", 4),
        ("th", 3),
    ] {
        table.put(key, value)?;
    }
    println!("{}", table.render()?);

    println!("Iterating in slot order (the table is locked meanwhile):");
    for (key, value) in table.iter()? {
        println!("{key} {value}");
    }

    for key in table.keys()? {
        table.remove(&key)?;
    }

    println!(
        "Running {} producer/consumer pairs, {} items each...",
        args.pairs, args.items
    );
    let table = Arc::new(table);
    let mut handles = Vec::new();
    for pair in 0..args.pairs {
        let producer = Arc::clone(&table);
        let items = args.items;
        handles.push(thread::spawn(move || {
            for i in 0..items {
                producer
                    .put(format!("p{pair}i{i}"), i as i64)
                    .expect("producer shut down");
            }
        }));
        let consumer = Arc::clone(&table);
        handles.push(thread::spawn(move || {
            for i in 0..items {
                loop {
                    match consumer.remove(&format!("p{pair}i{i}")) {
                        Ok(_) => break,
                        Err(brim_hash::Error::KeyNotFound) => thread::yield_now(),
                        Err(err) => panic!("consumer failed: {err}"),
                    }
                }
            }
        }));
    }
    for handle in handles {
        handle.join().expect("worker panicked");
    }

    println!("Drained: {}", table.render()?);

    // Shutdown releases a writer parked on a full table.
    for i in 0..args.capacity {
        table.put(format!("fill{i}"), i as i64)?;
    }
    let parked = {
        let table = Arc::clone(&table);
        thread::spawn(move || table.put("one-too-many", 0))
    };
    table.set_shutting_down(true)?;
    let err = parked
        .join()
        .expect("parked writer panicked")
        .expect_err("no space ever frees up");
    println!("Parked writer released by shutdown: {err}");

    Ok(())
}
