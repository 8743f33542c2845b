//! MongoDB instance information collector.
//!
//! Connects to a MongoDB server, checks that the server version is
//! supported by the bundled driver, and reports build information,
//! per-database statistics, runtime parameters, users and roles.
//!
//! # Security Guarantees
//! - Read-only administrative commands only
//! - Passwords are prompted for, never accepted on the command line
//! - Connection strings are redacted in every log line and error

mod output;

use clap::{Args, Parser, Subcommand};
use mongoinfo_core::error::redact_database_url;
use mongoinfo_core::security::Credentials;
use mongoinfo_core::session::probe_server_version;
use mongoinfo_core::{
    AggregatorConfig, CompatibilityPolicy, DRIVER_VERSION, EntityKeyMode, FilterWarning,
    MongoCommandClient, MongoInfoError, Result, Subset, gather_instance_info, init_logging,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mongoinfo")]
#[command(about = "Read-only MongoDB instance information collector")]
#[command(version)]
#[command(long_about = "
mongoinfo - MongoDB instance information collector

Gathers administrative state from a running MongoDB server:
- general:     server build information (buildInfo)
- databases:   per-database statistics (listDatabases)
- total_size:  total on-disk size in bytes
- parameters:  runtime parameters (getParameter)
- users:       user accounts of every database (usersInfo)
- roles:       role definitions of every database (rolesInfo)

FILTERS:
  A bare subset name includes it, a '!' prefix excludes it. Any inclusion
  wins over all exclusions. Unknown names are reported and ignored.

EXAMPLES:
  mongoinfo --database-url mongodb://localhost:27017
  mongoinfo collect --filter users,roles --pretty --output accounts.json
  mongoinfo --login-user admin --ask-password collect --filter '!parameters'
  mongoinfo check-version --server 4.4.29
")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Collect instance information (default)
    Collect(CollectArgs),
    /// Test the server connection
    Test,
    /// Check a server version against the driver compatibility policy
    CheckVersion(CheckVersionArgs),
    /// List the subset names accepted by --filter
    Subsets,
}

#[derive(Args, Default)]
struct CollectArgs {
    /// Subset filter tokens
    #[arg(
        short,
        long,
        value_delimiter = ',',
        help = "Comma-separated subsets to include, or '!name' to exclude"
    )]
    filter: Vec<String>,

    /// Output file path
    #[arg(short, long, help = "Write JSON to this file instead of stdout")]
    output: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long, help = "Pretty-print the JSON output")]
    pretty: bool,
}

#[derive(Args)]
struct CheckVersionArgs {
    /// Server version to check
    #[arg(long, help = "MongoDB server version, e.g. 7.0.5")]
    server: String,

    /// Driver version to check
    #[arg(long, default_value = DRIVER_VERSION, help = "Driver version")]
    driver: String,

    /// Alternative compatibility table
    #[arg(long, value_name = "FILE", help = "JSON compatibility policy file")]
    compat_policy: Option<PathBuf>,
}

#[derive(Args)]
struct GlobalArgs {
    /// MongoDB connection URL
    #[arg(
        long,
        global = true,
        env = "MONGODB_URL",
        help = "MongoDB connection string (credentials will be sanitized in logs)"
    )]
    database_url: Option<String>,

    /// Login user
    #[arg(long, global = true, help = "User to authenticate as (overrides the URL user)")]
    login_user: Option<String>,

    /// Authentication database
    #[arg(
        long,
        global = true,
        help = "Database the login user is defined in (default: admin)"
    )]
    login_database: Option<String>,

    /// Prompt for password
    #[arg(long, global = true, help = "Prompt for the login user's password")]
    ask_password: bool,

    /// Per-database concurrency
    #[arg(
        long,
        global = true,
        default_value_t = 4,
        help = "Maximum databases whose users and roles are fetched concurrently"
    )]
    max_concurrency: usize,

    /// Flat user/role keys
    #[arg(
        long,
        global = true,
        help = "Key users and roles by bare name; later databases overwrite earlier ones"
    )]
    key_by_name: bool,

    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    quiet: bool,
}

impl GlobalArgs {
    fn database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            MongoInfoError::configuration(
                "MongoDB connection URL is required (use --database-url or MONGODB_URL)",
            )
        })
    }

    fn aggregator_config(&self) -> AggregatorConfig {
        let entity_keys = if self.key_by_name {
            EntityKeyMode::Name
        } else {
            EntityKeyMode::Qualified
        };
        AggregatorConfig::new()
            .with_max_concurrency(self.max_concurrency)
            .with_entity_keys(entity_keys)
    }

    fn credentials(&self) -> Result<Option<Credentials>> {
        let Some(user) = &self.login_user else {
            if self.ask_password {
                return Err(MongoInfoError::configuration(
                    "--ask-password requires --login-user",
                ));
            }
            return Ok(None);
        };

        let password = if self.ask_password {
            Some(read_password(user)?)
        } else {
            None
        };

        let mut credentials = Credentials::new(user.clone(), password);
        if let Some(source) = &self.login_database {
            credentials = credentials.with_source(source.clone());
        }
        Ok(Some(credentials))
    }

    async fn connect(&self) -> Result<MongoCommandClient> {
        let database_url = self.database_url()?;
        info!("Target: {}", redact_database_url(database_url));

        let client = match self.credentials()? {
            Some(credentials) => {
                MongoCommandClient::with_credentials(database_url, &credentials).await
            }
            None => MongoCommandClient::new(database_url).await,
        };

        client.map_err(|e| {
            error!("Failed to create MongoDB client: {}", e);
            e
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.global.verbose, cli.global.quiet)?;

    match cli.command {
        Some(Command::Collect(args)) => collect(&cli.global, &args).await,
        Some(Command::Test) => test_connection(&cli.global).await,
        Some(Command::CheckVersion(args)) => check_version(&args).await,
        Some(Command::Subsets) => {
            list_subsets();
            Ok(())
        }
        None => collect(&cli.global, &CollectArgs::default()).await,
    }
}

/// Collects, filters and writes instance information.
async fn collect(global: &GlobalArgs, args: &CollectArgs) -> Result<()> {
    let client = global.connect().await?;

    let filtered = gather_instance_info(
        &client,
        DRIVER_VERSION,
        &CompatibilityPolicy::default(),
        &global.aggregator_config(),
        args.filter.as_slice(),
    )
    .await
    .map_err(|e| {
        error!("Collection failed: {}", e);
        e
    })?;

    report_warnings(&filtered.warnings, &mut io::stderr()).map_err(|e| MongoInfoError::Io {
        context: "Failed to write warnings to stderr".to_string(),
        source: e,
    })?;

    let json = output::render_json(&filtered.subsets, args.pretty)?;
    output::write_output(&json, args.output.as_deref()).await?;

    info!(
        "Collection completed: {} subsets, {} warnings",
        filtered.subsets.len(),
        filtered.warnings.len()
    );
    Ok(())
}

/// Writes filter warnings regardless of the log level.
fn report_warnings(warnings: &[FilterWarning], out: &mut impl Write) -> io::Result<()> {
    for warning in warnings {
        writeln!(out, "warning: {}", warning)?;
    }
    Ok(())
}

/// Tests the connection without collecting anything.
async fn test_connection(global: &GlobalArgs) -> Result<()> {
    info!("Testing MongoDB connection...");
    let client = global.connect().await?;

    client.test_connection().await.map_err(|e| {
        error!("Connection test failed: {}", e);
        e
    })?;
    let version = probe_server_version(&client).await?;

    info!("Connection test successful");
    println!("Connection to MongoDB {} successful", version);
    Ok(())
}

/// Checks a version pair without contacting a server.
async fn check_version(args: &CheckVersionArgs) -> Result<()> {
    let policy = match &args.compat_policy {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .map_err(|e| MongoInfoError::Io {
                    context: format!("Failed to read {}", path.display()),
                    source: e,
                })?;
            CompatibilityPolicy::from_json_str(&json)?
        }
        None => CompatibilityPolicy::default(),
    };

    policy.check(&args.server, &args.driver)?;
    println!(
        "Driver {} supports MongoDB server {}",
        args.driver, args.server
    );
    Ok(())
}

fn list_subsets() {
    println!("Subsets accepted by --filter:");
    for subset in Subset::ALL {
        let description = match subset {
            Subset::General => "server build information",
            Subset::Databases => "per-database statistics",
            Subset::TotalSize => "total on-disk size in bytes",
            Subset::Parameters => "runtime parameters",
            Subset::Users => "user accounts of every database",
            Subset::Roles => "role definitions of every database",
        };
        println!("  {:<12} {}", subset, description);
    }
}

fn read_password(user: &str) -> Result<String> {
    eprint!("Enter password for {}: ", user);
    io::stderr().flush().map_err(|e| {
        MongoInfoError::configuration(format!(
            "Failed to flush stderr before reading password: {}",
            e
        ))
    })?;
    let password = rpassword::read_password()
        .map_err(|e| MongoInfoError::configuration(format!("Failed to read password: {}", e)))?;

    if password.is_empty() {
        return Err(MongoInfoError::configuration("Password cannot be empty"));
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_collect() {
        let cli = Cli::try_parse_from(["mongoinfo", "--database-url", "mongodb://localhost"])
            .unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.global.database_url().unwrap(), "mongodb://localhost");
    }

    #[test]
    fn test_collect_filter_tokens_are_split() {
        let cli = Cli::try_parse_from(["mongoinfo", "collect", "--filter", "users,!roles,bogus"])
            .unwrap();
        let Some(Command::Collect(args)) = cli.command else {
            panic!("expected collect");
        };
        assert_eq!(args.filter, ["users", "!roles", "bogus"]);
        assert!(!args.pretty);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mongoinfo",
            "collect",
            "--key-by-name",
            "--max-concurrency",
            "8",
            "-vv",
        ])
        .unwrap();

        let config = cli.global.aggregator_config();
        assert_eq!(config.entity_keys, EntityKeyMode::Name);
        assert_eq!(config.max_concurrency, 8);
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn test_check_version_defaults_to_bundled_driver() {
        let cli = Cli::try_parse_from(["mongoinfo", "check-version", "--server", "7.0.5"]).unwrap();
        let Some(Command::CheckVersion(args)) = cli.command else {
            panic!("expected check-version");
        };
        assert_eq!(args.driver, DRIVER_VERSION);
        assert!(args.compat_policy.is_none());
    }

    #[test]
    fn test_login_user_without_password() {
        let cli = Cli::try_parse_from([
            "mongoinfo",
            "test",
            "--login-user",
            "auditor",
            "--login-database",
            "$external",
        ])
        .unwrap();

        let credentials = cli.global.credentials().unwrap().unwrap();
        assert_eq!(credentials.username(), "auditor");
        assert!(!credentials.has_password());
        assert_eq!(credentials.source.as_deref(), Some("$external"));
    }

    #[test]
    fn test_ask_password_requires_login_user() {
        let cli = Cli::try_parse_from(["mongoinfo", "test", "--ask-password"]).unwrap();
        assert!(cli.global.credentials().is_err());
    }

    #[test]
    fn test_report_warnings_writes_one_line_each() {
        let warnings = vec![
            FilterWarning::UnrecognizedFilterToken("bogus".to_string()),
            FilterWarning::UnrecognizedFilterToken("!!users".to_string()),
        ];
        let mut out = Vec::new();
        report_warnings(&warnings, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "warning: unrecognized filter token 'bogus' ignored");
        assert!(lines[1].contains("!!users"));
    }

    #[test]
    fn test_report_warnings_writes_nothing_without_warnings() {
        let mut out = Vec::new();
        report_warnings(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_check_version_with_policy_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policy.json");
        std::fs::write(
            &path,
            r#"{"rules":[{"driver":{"min":"3.0"},"server":{"min":"4.2","max":"5.0"}}]}"#,
        )
        .unwrap();

        let args = |server: &str| CheckVersionArgs {
            server: server.to_string(),
            driver: DRIVER_VERSION.to_string(),
            compat_policy: Some(path.clone()),
        };

        assert!(check_version(&args("4.4.29")).await.is_ok());
        assert!(matches!(
            check_version(&args("7.0.5")).await,
            Err(MongoInfoError::IncompatibleVersions { .. })
        ));
    }

    #[tokio::test]
    async fn test_check_version_missing_policy_file() {
        let args = CheckVersionArgs {
            server: "7.0.5".to_string(),
            driver: DRIVER_VERSION.to_string(),
            compat_policy: Some(PathBuf::from("/nonexistent/policy.json")),
        };
        assert!(matches!(
            check_version(&args).await,
            Err(MongoInfoError::Io { .. })
        ));
    }
}
