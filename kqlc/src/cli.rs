use clap::Parser;
use jiff::Timestamp;
use kql::{Backend, FieldMapping};

#[derive(Parser)]
#[command(about = "Compile KQL queries into search back-end queries")]
pub struct Cli {
    /// Query to compile. Reads queries line by line from stdin when omitted.
    pub query: Vec<String>,
    #[clap(long, env = "KQL_BACKEND", default_value_t = Backend::Bleve)]
    pub backend: Backend,
    /// Field naming used by the bleve back-end: verbatim or index.
    #[clap(long, default_value_t = FieldMapping::Verbatim)]
    pub fields: FieldMapping,
    /// IANA time zone for relative dates, e.g. Europe/Berlin.
    #[clap(long, env = "KQL_TZ")]
    pub tz: Option<String>,
    /// Pin "now" for relative dates (RFC 3339).
    #[clap(long)]
    pub now: Option<Timestamp>,
    /// Print the normalized tree as JSON instead of compiling it.
    #[clap(long, default_value = "false")]
    pub ast: bool,
}

impl Cli {
    pub fn config(&self) -> kql::Config {
        kql::Config {
            compiler: kql::CompilerConfig {
                backend: self.backend,
                fields: self.fields,
            },
            timezone: self.tz.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "kqlc",
            "--backend",
            "legacy",
            "--fields",
            "index",
            "--tz",
            "UTC",
            "tag:foo",
        ]);
        let config = cli.config();
        assert_eq!(config.compiler.backend, Backend::Legacy);
        assert_eq!(config.compiler.fields, FieldMapping::Index);
        assert_eq!(config.timezone.as_deref(), Some("UTC"));
        assert_eq!(cli.query, ["tag:foo"]);
    }

    #[test]
    fn now_is_parsed_as_timestamp() {
        let cli = Cli::parse_from(["kqlc", "--now", "2023-09-06T12:00:00Z", "--ast", "x"]);
        assert!(cli.ast);
        assert_eq!(cli.now, Some("2023-09-06T12:00:00Z".parse().unwrap()));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Cli::try_parse_from(["kqlc", "--backend", "solr", "x"]).is_err());
    }
}
