//! Word Command
//!
//! Look up definition, examples and related words.
//!
//! Usage:
//!   wordwise word <WORD> [-f json]

use crate::cli::{CommandContext, require};
use crate::cli::ui::Output;
use crate::types::{Result, WordDetails};

pub async fn run(ctx: &CommandContext, word: &str, format: &str) -> Result<()> {
    let details = require(
        ctx.assistant.word_details(word).await,
        format!("Word details for \"{}\"", word.trim()),
    )?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&details)?);
    } else {
        print_details(&details);
    }
    Ok(())
}

fn print_details(details: &WordDetails) {
    let out = Output::new();

    let heading = match &details.pronunciation {
        Some(ipa) if !ipa.is_empty() => format!("{}  /{}/", details.word, ipa.trim_matches('/')),
        _ => details.word.clone(),
    };
    out.header(&heading);
    out.field("Part of speech", &details.part_of_speech);
    out.field("Definition", &details.definition);

    if !details.examples.is_empty() {
        out.section("Examples");
        for example in &details.examples {
            println!("  • {}", example);
        }
    }

    if !details.synonyms.is_empty() || !details.antonyms.is_empty() {
        out.section("Related");
        out.field("Synonyms", &details.synonyms.join(", "));
        out.field("Antonyms", &details.antonyms.join(", "));
    }

    if let Some(etymology) = &details.etymology {
        out.field("Etymology", etymology);
    }
    if let Some(mnemonic) = &details.mnemonic {
        out.field("Mnemonic", mnemonic);
    }

    let missing = details.missing_fields();
    if !missing.is_empty() {
        out.warning(&format!("Incomplete entry, missing: {}", missing.join(", ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::WordwiseError;

    #[tokio::test(start_paused = true)]
    async fn test_refused_lookup_is_an_error() {
        let mut config = Config::default();
        config.gemini.api_key = Some("test-key".to_string());
        let ctx = CommandContext::from_config(config).unwrap();
        ctx.assistant.gateway().cooldown().trip(None);

        let err = run(&ctx, "laconic", "text").await.unwrap_err();
        assert!(matches!(err, WordwiseError::Unavailable(_)));
        assert!(err.to_string().contains("laconic"));
    }
}
