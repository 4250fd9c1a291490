//! The `perlan init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("perlan.toml").exists() {
        println!("perlan.toml already exists, skipping.");
    } else {
        std::fs::write("perlan.toml", SAMPLE_CONFIG)?;
        println!("Created perlan.toml");
    }

    std::fs::create_dir_all("content")?;
    let example_path = std::path::Path::new("content/example.toml");
    if example_path.exists() {
        println!("content/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_PACK)?;
        println!("Created content/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit perlan.toml to point at your remote store (or stay offline)");
    println!("  2. Run: perlan validate content/example.toml");
    println!("  3. Run: perlan play --user <name>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# perlan configuration

# Local cache of questions, modules, results and stats.
data_dir = "./perlan-data"

# Authoritative content store. Remove this section to play offline.
# [remote]
# type = "http"
# base_url = "https://content.example.com"
# api_key = "${PERLAN_REMOTE_KEY}"

# [remote]
# type = "file"
# dir = "./perlan-remote"

# Question drafting for `perlan generate`.
# [generator]
# type = "openai"
# api_key = "${OPENAI_API_KEY}"
# model = "gpt-4.1-mini"

[game]
round_size = 10
countdown_ticks = 3
question_time_limit = 15
tick_millis = 1000
"#;

const EXAMPLE_PACK: &str = r#"[pack]
name = "Example pack"

[[questions]]
id = "example-1"
category = "northern-lights"
difficulty = "easy"
text = "Best month to see auroras in Iceland?"
options = ["February", "June", "July"]
correct_index = 0
fact = "Summer nights are too bright for auroras."

[[questions]]
id = "example-2"
category = "water"
difficulty = "medium"
text = "Where does most Reykjavik hot water come from?"
options = ["Geothermal wells", "Glaciers", "The sea"]
correct_index = 0
fact = "Nesjavellir pipes it 27 km to the city."

[[modules]]
id = "mod-example"
category = "perlan"
description = "A two-step tour of the dome."

[[modules.units]]
id = "unit-example-1"
title = "The hot water tanks"
duration = "1 min"
type = "text"
content = "Perlan sits on six tanks that once stored the city's hot water."

[[modules.units]]
id = "unit-example-2"
title = "Check yourself"
duration = "1 min"
type = "quiz"
question = "How many tanks hold up the dome?"
options = ["Four", "Six", "Eight"]
correct_index = 1
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn sample_config_parses() {
        let config = perlan_remote::config::parse_config(SAMPLE_CONFIG).unwrap();
        assert!(config.remote.is_none());
        assert_eq!(config.game.round_size, 10);
    }

    #[test]
    fn example_pack_is_valid() {
        let pack = perlan_core::parser::parse_content_pack_str(EXAMPLE_PACK, Path::new("example.toml"))
            .unwrap();
        assert_eq!(pack.questions.len(), 2);
        assert_eq!(pack.modules.len(), 1);
        assert!(perlan_core::parser::validate_content_pack(&pack).is_empty());
    }
}
