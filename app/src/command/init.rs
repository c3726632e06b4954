use xcdiag_config::Config;

/// Strategy for initializing the configuration.
///
/// This strategy creates the default configuration file at `~/xcdiag/config.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config_path = Config::create_config()?;

        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Configuration options:");
        println!("   - derived_data.path: DerivedData root to scan");
        println!("   - extraction.max_entries: cap per errors/warnings bucket");
        println!("   - extraction.extra_rules: custom rules tried before the built-in ones");
        println!("   - extraction.raw_dump: write the decoded log text to this file");
        println!("   - logging.level / logging.file: log filter and destination");
        println!();
        Ok(())
    }
}
