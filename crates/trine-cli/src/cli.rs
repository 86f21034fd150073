use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "trine",
    about = "Trine: in-memory triple store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML engine configuration
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the alice/knows/charlie walkthrough
    Demo,
    /// Time ingestion, lookups, reasoning and snapshots on synthetic data
    Bench(BenchArgs),
    /// Answer one pattern against a triple file
    Query(QueryArgs),
    /// Build a compressed snapshot of a triple file
    Snapshot(SnapshotArgs),
    /// Summarize a saved snapshot
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct BenchArgs {
    #[arg(long, default_value = "1000000")]
    pub triples: usize,
    #[arg(long, default_value = "100000")]
    pub subjects: u32,
    #[arg(long, default_value = "32")]
    pub predicates: u32,
    /// Objects per (subject, predicate)
    #[arg(long, default_value = "4")]
    pub fanout: usize,
    #[arg(long, default_value = "1000000")]
    pub queries: usize,
    #[arg(long, default_value = "42")]
    pub seed: u64,
}

#[derive(Args)]
pub struct QueryArgs {
    /// Whitespace-separated `subject predicate object` lines
    pub file: PathBuf,
    /// Subject text, `#n` for a raw id, or `?` / `_` for any
    pub subject: String,
    pub predicate: String,
    #[arg(default_value = "?")]
    pub object: String,
    /// Treat the predicate as transitive
    #[arg(long)]
    pub transitive: bool,
    /// List matching triples
    #[arg(long)]
    pub list: bool,
}

#[derive(Args)]
pub struct SnapshotArgs {
    pub file: PathBuf,
    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct InspectArgs {
    pub path: PathBuf,
    /// Print every triple with its terms resolved
    #[arg(long)]
    pub triples: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_demo() {
        let cli = Cli::try_parse_from(["trine", "demo"]).unwrap();
        assert!(matches!(cli.command, Command::Demo));
        assert!(matches!(cli.format, OutputFormat::Text));
    }

    #[test]
    fn parse_bench_defaults() {
        let cli = Cli::try_parse_from(["trine", "bench", "--triples", "500"]).unwrap();
        if let Command::Bench(args) = cli.command {
            assert_eq!(args.triples, 500);
            assert_eq!(args.fanout, 4);
            assert_eq!(args.seed, 42);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_query_default_object() {
        let cli = Cli::try_parse_from(["trine", "query", "g.txt", "alice", "knows"]).unwrap();
        if let Command::Query(args) = cli.command {
            assert_eq!(args.object, "?");
            assert!(!args.transitive);
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_snapshot_requires_out() {
        assert!(Cli::try_parse_from(["trine", "snapshot", "g.txt"]).is_err());
        let cli = Cli::try_parse_from(["trine", "snapshot", "g.txt", "-o", "g.trns"]).unwrap();
        assert!(matches!(cli.command, Command::Snapshot(_)));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "trine", "inspect", "g.trns", "--format", "json", "--config", "trine.toml", "-v",
        ])
        .unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("trine.toml")));
        assert!(cli.verbose);
    }
}
