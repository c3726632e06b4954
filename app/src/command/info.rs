use super::AppContext;

/// Strategy for displaying the effective configuration.
///
/// Prints the config file location, the DerivedData root and whether it
/// exists, extraction limits, the active rule order and logging settings.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = AppContext;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let AppContext {
            config,
            config_file,
            root,
        } = &input;

        println!("=== xcdiag Configuration ===\n");

        println!("Config File:");
        println!(
            "  {} ({})",
            config_file.display(),
            if config_file.exists() { "found" } else { "not found, using defaults" }
        );
        println!();

        println!("DerivedData:");
        println!("  Root: {}", root.display());
        println!("  Exists: {}", root.is_dir());
        println!("  Log Extension: {}", config.derived_data.log_extension);
        println!();

        let extraction = &config.extraction;
        println!("Extraction:");
        println!("  Max Entries: {}", extraction.max_entries);
        println!("  Max Context Lines: {}", extraction.max_context_lines);
        println!("  Debug Info: {}", extraction.debug_info);
        println!(
            "  Concurrency Context Lines: {}",
            extraction.concurrency_context_lines
        );
        if let Some(dump) = &extraction.raw_dump {
            println!("  Raw Dump: {}", dump.display());
        }
        println!();

        let extractor = input.extractor()?;
        let rules = extractor.engine().rules();
        println!("Rules ({} total, {} custom):", rules.len(), extraction.extra_rules.len());
        for rule in rules.rules() {
            println!(
                "  {:<24} {:<8} {}",
                rule.name,
                rule.kind.as_str(),
                rule.category
            );
        }
        println!();

        println!("Logging:");
        println!("  Level: {}", config.logging.level);
        match &config.logging.file {
            Some(file) => println!("  File: {}", file.display()),
            None => println!("  File: (stderr)"),
        }

        Ok(())
    }
}
