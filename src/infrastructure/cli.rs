use clap::Parser;

use crate::{infrastructure::config::Config, utils::version};

#[derive(Parser, Debug, Default)]
#[command(author, version = version(), about)]
pub struct Cli {
    #[arg(short, long, value_name = "ID", help = "Telegram user id the temporary list belongs to")]
    pub user_id: Option<i64>,

    #[arg(short, long, value_name = "URL", help = "Base URL of the catalog API")]
    pub api_url: Option<String>,

    #[arg(long, value_name = "MS", help = "Quiescence window before a query is sent")]
    pub debounce_ms: Option<u64>,

    #[arg(long, value_name = "N", help = "Records requested per page")]
    pub page_size: Option<usize>,

    #[arg(long, value_name = "ROWS", help = "Height of the simulated viewport", default_value_t = 720)]
    pub viewport: u32,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(user_id) = self.user_id {
            config.user_id = user_id;
        }
        if let Some(api_url) = &self.api_url {
            config.api.base_url.clone_from(api_url);
        }
        if let Some(debounce_ms) = self.debounce_ms {
            config.search.debounce_ms = debounce_ms;
        }
        if let Some(page_size) = self.page_size {
            config.search.page_size = page_size;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from(["epicsearch", "--user-id", "42", "--page-size", "20"]);
        let mut config = Config::default();

        cli.apply(&mut config);

        assert_eq!(config.user_id, 42);
        assert_eq!(config.search.page_size, 20);
        assert_eq!(config.search.debounce_ms, 500);
        assert_eq!(cli.viewport, 720);
    }
}
