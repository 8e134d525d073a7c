use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use unity_client::commands::{self, MagicArgs};
use unity_client::config::ClientOptions;
use unity_client::unity::{JsonClientDriver, SecurityToken};

/// unity - Allscripts Unity JSON API client
///
/// Connection settings can also come from the environment, which keeps
/// passwords out of shell history.
///
/// Examples:
///   unity token                        # Print a new security token
///   unity magic GetPatient --user-id jmedici --patient-id 42
#[derive(Parser, Debug)]
#[command(author, version = env!("UNITY_CLIENT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base URL of the Unity server
    #[arg(long = "base-url", env = "UNITY_BASE_URL", value_name = "URL", global = true)]
    base_url: Option<String>,

    /// Application name registered with Unity
    #[arg(long, env = "UNITY_APPNAME", global = true)]
    appname: Option<String>,

    /// Unity service username
    #[arg(long, env = "UNITY_USERNAME", global = true)]
    username: Option<String>,

    /// Unity service password
    #[arg(long, env = "UNITY_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// IANA timezone of the Unity server
    #[arg(long, env = "UNITY_TIMEZONE", default_value = "UTC", global = true)]
    timezone: String,

    /// Request and connect timeout (defaults to 90)
    #[arg(long, value_name = "SECONDS", global = true)]
    timeout: Option<u64>,

    /// PEM bundle of trusted CA certificates
    #[arg(long = "ca-file", value_name = "PATH", global = true)]
    ca_file: Option<PathBuf>,

    /// Directory of trusted CA certificates
    #[arg(long = "ca-path", value_name = "PATH", global = true)]
    ca_path: Option<PathBuf>,

    /// HTTP proxy URL
    #[arg(long, value_name = "URL", global = true)]
    proxy: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Acquire a security token and print it
    Token,

    /// Retire a security token
    Retire(RetireArgs),

    /// Show server information (GetServerInfo)
    ServerInfo(ServerInfoArgs),

    /// Run any magic action
    Magic(MagicCommandArgs),
}

#[derive(clap::Args, Debug)]
struct RetireArgs {
    /// The token to retire
    #[arg(value_name = "TOKEN")]
    token: String,
}

#[derive(clap::Args, Debug)]
struct ServerInfoArgs {
    /// Use this token instead of acquiring one for the call
    #[arg(long)]
    token: Option<String>,

    /// EHR user to run the action as
    #[arg(long = "user-id")]
    user_id: Option<String>,
}

#[derive(clap::Args, Debug)]
struct MagicCommandArgs {
    /// Magic action name, e.g. GetPatient
    #[arg(value_name = "ACTION")]
    action: String,

    /// EHR user to run the action as
    #[arg(long = "user-id")]
    user_id: Option<String>,

    /// Patient the action applies to
    #[arg(long = "patient-id")]
    patient_id: Option<String>,

    /// Positional parameter; repeat for Parameter1, Parameter2, ...
    #[arg(short = 'p', long = "param", value_name = "VALUE")]
    params: Vec<String>,

    /// Use this token instead of acquiring one for the call
    #[arg(long)]
    token: Option<String>,
}

impl Cli {
    fn client_options(&self) -> Result<ClientOptions> {
        let base_url = self
            .base_url
            .as_deref()
            .context("A base URL is required (--base-url or UNITY_BASE_URL)")?;
        let appname = self
            .appname
            .as_deref()
            .context("An app name is required (--appname or UNITY_APPNAME)")?;

        let mut options =
            ClientOptions::new(base_url, appname).with_timezone_name(&self.timezone)?;

        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                options = options.with_credentials(username.as_str(), password.as_str());
            }
            (Some(_), None) => {
                bail!("--username was given without a password (--password or UNITY_PASSWORD)")
            }
            (None, Some(_)) => {
                bail!("--password was given without a username (--username or UNITY_USERNAME)")
            }
            (None, None) => {}
        }
        if let Some(seconds) = self.timeout {
            options = options.with_timeout(Duration::from_secs(seconds));
        }
        if let Some(ca_file) = &self.ca_file {
            options = options.with_ca_file(ca_file.as_path());
        }
        if let Some(ca_path) = &self.ca_path {
            options = options.with_ca_path(ca_path.as_path());
        }
        if let Some(proxy) = &self.proxy {
            options = options.with_proxy(proxy.as_str());
        }

        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let driver = JsonClientDriver::new(cli.client_options()?)?;
    let mut out = std::io::stdout();

    match cli.command {
        Commands::Token => commands::token(&driver, &mut out).await?,
        Commands::Retire(args) => {
            commands::retire(&driver, SecurityToken::new(args.token), &mut out).await?
        }
        Commands::ServerInfo(args) => {
            let token = args.token.map(SecurityToken::new);
            commands::server_info(&driver, token, args.user_id, &mut out).await?
        }
        Commands::Magic(args) => {
            let args = MagicArgs {
                action: args.action,
                user_id: args.user_id,
                patient_id: args.patient_id,
                parameters: args.params,
                token: args.token.map(SecurityToken::new),
            };
            commands::magic(&driver, args, &mut out).await?
        }
    }
    Ok(())
}
