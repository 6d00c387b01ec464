// src/cli/best.rs — Show the durable best record

use crate::core::tracker::BestRecord;
use crate::infra::paths;

pub fn show_best() -> anyhow::Result<()> {
    let path = paths::best_record_path();
    match BestRecord::load(&path) {
        Some(record) => {
            println!("score: {:.4}  ({})", record.score, record.origin);
            println!(
                "words: {}  affirmative: {}  recorded: {}",
                record.diagnostics.word_count,
                record.diagnostics.affirmative_count,
                record.recorded_at,
            );
            println!();
            println!("{}", record.instruction);
            Ok(())
        }
        None => {
            eprintln!("No best record at {} yet.", path.display());
            Ok(())
        }
    }
}
