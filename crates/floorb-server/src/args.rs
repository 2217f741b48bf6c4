use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Floorb Server - serve federated social actors from a local store
#[derive(Debug, Parser)]
#[command(name = "floorb-server")]
#[command(author, version, about)]
pub struct ServerArgs {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the actor documents (overrides the config file)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Origin profile endpoints are derived from (overrides the config file)
    #[arg(long, global = true)]
    pub base_origin: Option<String>,

    /// Logging level, e.g. 'info', 'debug' (overrides the config file)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Log file; environment variables are expanded
    #[arg(long, global = true)]
    pub log_file: Option<String>,

    /// Log to stdout
    #[arg(long, global = true)]
    pub log_stdout: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve every actor in the store over HTTP
    Serve {
        /// Address to bind the server to
        #[arg(short, long, default_value = "127.0.0.1:8080")]
        address: SocketAddr,
    },

    /// Create a new local actor
    CreateActor {
        /// Actor name, also its storage key
        #[arg(long)]
        name: String,

        /// Profile summary
        #[arg(long, default_value = "")]
        summary: String,

        /// Actor type, e.g. 'Person' or 'Service'
        #[arg(long, default_value = "Person")]
        actor_type: String,

        /// The actor's own IRI
        #[arg(long)]
        iri: String,
    },

    /// Follow a remote actor and wait for the Follow to be delivered
    Follow {
        /// Local actor doing the following
        #[arg(long)]
        name: String,

        /// IRI of the actor to follow
        #[arg(long)]
        target: String,
    },

    /// Announce an object to the public and the actor's followers
    Announce {
        /// Local actor doing the announcing
        #[arg(long)]
        name: String,

        /// IRI of the object to announce
        #[arg(long)]
        object: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_follow_with_global_options() {
        let args = ServerArgs::try_parse_from([
            "floorb-server",
            "follow",
            "--name",
            "alice",
            "--target",
            "https://remote.example/users/bob",
            "--data-dir",
            "/tmp/actors",
        ])
        .unwrap();

        assert_eq!(args.data_dir, Some(PathBuf::from("/tmp/actors")));
        match args.command {
            Command::Follow { name, target } => {
                assert_eq!(name, "alice");
                assert_eq!(target, "https://remote.example/users/bob");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn announce_requires_an_object() {
        assert!(ServerArgs::try_parse_from(["floorb-server", "announce", "--name", "alice"]).is_err());
        let args = ServerArgs::try_parse_from([
            "floorb-server",
            "announce",
            "--name",
            "alice",
            "--object",
            "https://remote.example/notes/1",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Announce { .. }));
    }
}
