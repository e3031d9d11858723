//! List command handler.

use anyhow::Result;
use dictee_core::split_into_sentences;
use dictee_core::text::count_signs;

use crate::bootstrap::CliContext;
use crate::presentation::{difficulty_label, print_separator, truncate_string};

/// Print every dictation of the bank in a table.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let bank = ctx.bank();
    if bank.is_empty() {
        println!("The dictation bank is empty.");
        return Ok(());
    }

    println!("{} dictation(s):\n", bank.len());
    println!(
        "{:<3} {:<32} {:<20} {:<10} {:<9} Signs",
        "ID", "Title", "Author", "Level", "Sentences"
    );
    print_separator(85);

    for dictation in bank.iter() {
        println!(
            "{:<3} {:<32} {:<20} {:<10} {:<9} {}",
            dictation.id,
            truncate_string(&dictation.title, 31),
            truncate_string(&dictation.author, 19),
            difficulty_label(dictation.difficulty),
            split_into_sentences(&dictation.text).len(),
            count_signs(&dictation.text),
        );
    }

    println!("\nStart an exam with 'dictee run <ID>'.");
    Ok(())
}
