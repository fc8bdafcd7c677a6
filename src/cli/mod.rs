pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::Source;

#[derive(Parser)]
#[command(name = "newsreel")]
#[command(about = "Crawl news sites, stage articles and merge them into a local store", long_about = None)]
pub struct Cli {
    /// Configuration file (default: ~/.config/newsreel/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Article database, overriding the configured path
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl the configured sources and merge what was staged
    Crawl {
        /// Crawl only these sources (bbc, global, guardian, cbc, nytimes)
        #[arg(long, value_delimiter = ',')]
        only: Vec<Source>,

        /// Stage articles without merging them into the database
        #[arg(long)]
        no_merge: bool,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Merge a staging file into the database
    Merge {
        /// Path to the staged CSV file
        path: PathBuf,
    },
    /// List stored articles, newest first
    List {
        /// Only articles from this source label (e.g. "BBC")
        #[arg(short, long)]
        source: Option<String>,

        /// Maximum number of articles to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },
    /// Show article counts per source
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_flags() {
        let cli = Cli::try_parse_from([
            "newsreel",
            "--database",
            "/tmp/n.db",
            "crawl",
            "--only",
            "bbc,cbc",
            "--no-merge",
        ])
        .unwrap();

        assert_eq!(cli.database, Some(PathBuf::from("/tmp/n.db")));
        match cli.command {
            Commands::Crawl { only, no_merge, json } => {
                assert_eq!(only, vec![Source::Bbc, Source::Cbc]);
                assert!(no_merge);
                assert!(!json);
            }
            _ => panic!("expected crawl"),
        }
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        assert!(Cli::try_parse_from(["newsreel", "crawl", "--only", "reuters"]).is_err());
    }

    #[test]
    fn test_list_defaults() {
        let cli = Cli::try_parse_from(["newsreel", "list", "-s", "BBC"]).unwrap();
        match cli.command {
            Commands::List { source, limit } => {
                assert_eq!(source.as_deref(), Some("BBC"));
                assert_eq!(limit, 20);
            }
            _ => panic!("expected list"),
        }
    }
}
