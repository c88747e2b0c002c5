//! Account Portal CLI
//!
//! Entry point for the `portal` command-line tool.

use account_portal::config::{default_state_path, user_config_path, EffectiveConfig};
use account_portal::host::{HttpConfig, HttpTransport};
use account_portal::pages::{account, admin, changepw, login, register, session};
use account_portal::rules::RULES_UNAVAILABLE;
use account_portal::{FileStore, KeyValueStore, PageContext, PortalClient, TerminalUi, Ui};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Account portal client", version)]
struct Cli {
    /// Path to config file (default: ~/.config/portal/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Server root, overrides `base_url`
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log filter, overrides `log.filter` (RUST_LOG still wins)
    #[arg(long, global = true)]
    log: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the server's validation rules
    Rules,

    /// Log in
    Login { username: String, password: String },

    /// Create an account and log in
    Register {
        username: String,
        password: String,
        /// Password again
        confirm_password: String,
    },

    /// Change the password of the signed-in user
    Changepw {
        current_password: String,
        new_password: String,
        /// New password again
        confirm_password: String,
    },

    /// Delete the signed-in user's account
    DeleteAccount,

    /// Show who is signed in
    Whoami,

    /// Log out
    Logout,

    /// Admin user panel
    Admin {
        #[command(subcommand)]
        action: AdminCommands,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum AdminCommands {
    /// List users
    List,

    /// Edit one attribute of a user
    ///
    /// Omitted arguments are taken from the previous edit's draft.
    Modify {
        /// User id
        userid: String,

        /// Attribute to change (e.g. username, role)
        #[arg(long)]
        attr: Option<String>,

        /// Value type: str, int or bool
        #[arg(long = "type")]
        attr_type: Option<String>,

        /// New value
        #[arg(long)]
        value: Option<String>,
    },

    /// Delete a user
    Delete {
        /// User id
        userid: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("Error: {}", message);
            process::exit(1);
        }
    };

    if let Commands::Config = cli.command {
        run_config(&config);
        return;
    }

    let ctx = match build_context(&cli, &config) {
        Ok(ctx) => ctx,
        Err(message) => {
            eprintln!("Error: {}", message);
            process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Rules => run_rules(&ctx, cli.json).await,
        Commands::Login { username, password } => {
            login::submit(&ctx, &login::form(&username, &password))
                .await
                .exit_code()
        }
        Commands::Register {
            username,
            password,
            confirm_password,
        } => {
            let form = register::form(&username, &password, &confirm_password);
            register::submit(&ctx, &form).await.exit_code()
        }
        Commands::Changepw {
            current_password,
            new_password,
            confirm_password,
        } => {
            let form = changepw::form(&current_password, &new_password, &confirm_password);
            changepw::submit(&ctx, &form).await.exit_code()
        }
        Commands::DeleteAccount => account::delete(&ctx, &account::delete_form())
            .await
            .map(|outcome| outcome.exit_code())
            .unwrap_or(0),
        Commands::Whoami => run_whoami(&ctx).await,
        Commands::Logout => session::logout(&ctx, &session::logout_form())
            .await
            .exit_code(),
        Commands::Admin { action } => run_admin(&ctx, action).await,
        Commands::Config => 0,
    };

    process::exit(code);
}

/// Merge the config layers and start logging
fn load_config(cli: &Cli) -> Result<EffectiveConfig, String> {
    let mut overrides = serde_json::Map::new();
    if let Some(base_url) = &cli.base_url {
        overrides.insert("base_url".to_string(), Value::String(base_url.clone()));
    }
    if let Some(filter) = &cli.log {
        overrides.insert("log".to_string(), json!({ "filter": filter }));
    }
    let overrides = (!overrides.is_empty()).then(|| Value::Object(overrides));

    let path = cli.config.clone().or_else(user_config_path);
    let config = EffectiveConfig::build(path.as_deref(), overrides)
        .map_err(|e| format!("Failed to load config: {}", e))?;

    let filter = config
        .settings()
        .map(|s| s.log_filter)
        .unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    Ok(config)
}

fn build_context(cli: &Cli, config: &EffectiveConfig) -> Result<PageContext, String> {
    let settings = config.settings().map_err(|e| e.to_string())?;

    let state_path = settings
        .storage_path
        .clone()
        .or_else(default_state_path)
        .ok_or_else(|| "Cannot locate state file: HOME is not set".to_string())?;
    debug!(path = %state_path.display(), "using state file");
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(state_path));

    let transport = HttpTransport::new(HttpConfig {
        base_url: settings.base_url.clone(),
        connect_timeout: settings.connect_timeout,
    })
    .map_err(|e| e.to_string())?
    .with_session_store(store.clone());

    let ui: Arc<dyn Ui> = Arc::new(TerminalUi::new(cli.json, cli.yes));
    Ok(
        PageContext::new(PortalClient::new(Arc::new(transport)), ui, store)
            .with_busy_label(settings.busy_label),
    )
}

fn run_config(config: &EffectiveConfig) {
    match config.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Failed to serialize config: {}", e);
            process::exit(1);
        }
    }
}

async fn run_rules(ctx: &PageContext, json: bool) -> i32 {
    match ctx.rules.rules().await {
        Ok(rules) => {
            let rendered = if json {
                serde_json::to_string(rules.as_ref())
            } else {
                serde_json::to_string_pretty(rules.as_ref())
            };
            match rendered {
                Ok(text) => {
                    println!("{}", text);
                    0
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    1
                }
            }
        }
        Err(e) => {
            ctx.ui().notice(RULES_UNAVAILABLE);
            eprintln!("Error: {}", e);
            e.kind().exit_code()
        }
    }
}

async fn run_whoami(ctx: &PageContext) -> i32 {
    match session::load(ctx).await {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

async fn run_admin(ctx: &PageContext, action: AdminCommands) -> i32 {
    match action {
        AdminCommands::List => match admin::refresh(&ctx.client, ctx.ui()).await {
            Ok(_) => 0,
            Err(e) => e.exit_code(),
        },
        AdminCommands::Modify {
            userid,
            attr,
            attr_type,
            value,
        } => {
            let mut form = admin::modify_form(&userid, "", "", "");
            if let Err(e) = admin::restore_draft(ctx.store.as_ref(), &mut form) {
                eprintln!("Warning: could not restore edit draft: {}", e);
            }
            for (field, arg) in [("attr", attr), ("attr_type", attr_type), ("value", value)] {
                if let Some(arg) = arg {
                    form.set(field, arg);
                }
            }
            admin::modify(ctx, &form).await.exit_code()
        }
        AdminCommands::Delete { userid } => {
            admin::delete(ctx, &admin::delete_form(), &userid)
                .await
                .map(|outcome| outcome.exit_code())
                .unwrap_or(0)
        }
    }
}
