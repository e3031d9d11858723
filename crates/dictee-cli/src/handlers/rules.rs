//! Rules command handler.
//!
//! Shows the grammar points to check once the dictation is written.

use anyhow::Result;
use dictee_core::{Dictation, RuleCategory};

use crate::bootstrap::CliContext;
use crate::presentation::print_separator;

const fn category_title(category: RuleCategory) -> &'static str {
    match category {
        RuleCategory::Accord => "Accord",
        RuleCategory::Conjugaison => "Conjugaison",
        RuleCategory::Homophones => "Homophones",
        RuleCategory::Vocabulaire => "Vocabulaire",
        RuleCategory::Other => "Divers",
    }
}

pub fn execute(ctx: &CliContext, id: u32) -> Result<()> {
    let dictation = ctx.dictation(id)?;
    print_header(dictation);

    if dictation.rules.is_empty() {
        println!("No grammar points recorded for this text.");
        return Ok(());
    }

    for (n, rule) in dictation.rules.iter().enumerate() {
        println!("{}. [{}] {}", n + 1, category_title(rule.category), rule.word);
        println!("   {}", rule.explanation);
    }
    Ok(())
}

fn print_header(dictation: &Dictation) {
    let mut source = dictation.author.clone();
    if let Some(work) = &dictation.work {
        source.push_str(&format!(", {work}"));
    }
    if let Some(year) = dictation.year {
        source.push_str(&format!(" ({year})"));
    }
    println!("{} - {source}", dictation.title);
    print_separator(60);
}
