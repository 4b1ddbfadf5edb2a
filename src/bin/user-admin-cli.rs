use std::io::{self, BufRead, Write};
use std::process;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;
use user_admin::{
    client::ApiClient,
    panel::{AdminPanel, EditorState, NotificationLevel, Page},
    PanelConfig,
};

enum Command {
    Show,
    Create(Vec<(String, String)>),
    Edit(i64, Vec<(String, String)>),
    Delete(i64),
    Logout,
}

impl Command {
    fn parse(positional: &[&str]) -> anyhow::Result<Command> {
        let Some((name, rest)) = positional.split_first() else {
            return Ok(Command::Show);
        };
        let command = match *name {
            "show" => Command::Show,
            "create" => Command::Create(parse_fields(rest)?),
            "edit" => {
                let (id, fields) = rest.split_first().context("edit needs a user id")?;
                Command::Edit(parse_id(id)?, parse_fields(fields)?)
            }
            "delete" => {
                let id = rest.first().context("delete needs a user id")?;
                Command::Delete(parse_id(id)?)
            }
            "logout" => Command::Logout,
            other => bail!("unknown command: {}", other),
        };
        Ok(command)
    }
}

fn parse_id(raw: &str) -> anyhow::Result<i64> {
    raw.parse()
        .with_context(|| format!("invalid user id: {}", raw))
}

fn parse_fields(raw: &[&str]) -> anyhow::Result<Vec<(String, String)>> {
    raw.iter()
        .map(|pair| match pair.split_once('=') {
            Some((name, value)) => Ok((name.to_owned(), value.to_owned())),
            None => bail!("expected field=value, got {}", pair),
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let assume_yes = args.iter().any(|a| a == "--yes");
    let positional: Vec<&str> = args
        .iter()
        .skip(1)
        .filter(|a| !a.starts_with("--"))
        .map(String::as_str)
        .collect();

    let command = match Command::parse(&positional) {
        Ok(command) => command,
        Err(err) => {
            eprintln!("error: {:#}", err);
            print_usage();
            process::exit(2);
        }
    };

    let config = PanelConfig::from_env();
    let (Some(email), Some(password)) = (config.email.as_deref(), config.password.as_deref())
    else {
        bail!("ADMIN_EMAIL and ADMIN_PASSWORD must be set");
    };

    let mut api = ApiClient::new(&config)?;
    let login = api
        .login(email, password)
        .await
        .with_context(|| format!("login to {} failed", config.base_url))?;
    info!(is_admin = login.is_admin, "Signed in");

    let html = api
        .discover_csrf(&config.page_path)
        .await
        .with_context(|| format!("could not load {}", config.page_path))?;
    let page = Page::from_html(&config.page_path, &html);

    let mut panel = AdminPanel::new(api, page, config.locale);
    panel.init().await;

    match command {
        Command::Show => {}
        Command::Create(fields) => {
            panel.open_create();
            fill_form(&mut panel, &fields)?;
            panel.submit_create().await;
        }
        Command::Edit(id, fields) => {
            panel.open_edit(id).await;
            if panel.state() == EditorState::EditPending {
                fill_form(&mut panel, &fields)?;
                panel.submit_update().await;
            }
        }
        Command::Delete(id) => {
            let mut prompt = |message: &str| assume_yes || confirm_on_stdin(message);
            panel.delete_user(id, &mut prompt).await;
        }
        Command::Logout => panel.logout().await,
    }

    print!("{}", panel.page());
    if !panel
        .page()
        .notifications_of(NotificationLevel::Danger)
        .is_empty()
    {
        process::exit(1);
    }
    Ok(())
}

fn fill_form(panel: &mut AdminPanel<ApiClient>, fields: &[(String, String)]) -> anyhow::Result<()> {
    let form = panel.active_form().context("no dialog is open")?;
    for (name, value) in fields {
        if !form.set_field(name, value) {
            bail!("unknown field: {}", name);
        }
    }
    Ok(())
}

fn confirm_on_stdin(message: &str) -> bool {
    print!("{} [y/N] ", message);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn print_usage() {
    eprintln!("Usage: user-admin-cli [command] [--yes]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  show                         Show the page after loading (default)");
    eprintln!("  create field=value ...       Create a user");
    eprintln!("  edit <id> field=value ...    Edit a user; a blank password keeps the old one");
    eprintln!("  delete <id>                  Delete a user after confirmation");
    eprintln!("  logout                       End the session");
    eprintln!();
    eprintln!("Fields: firstName lastName email age password roles=admin,user");
    eprintln!();
    eprintln!("Environment: ADMIN_BASE_URL ADMIN_EMAIL ADMIN_PASSWORD ADMIN_PAGE ADMIN_CSRF ADMIN_LOCALE");
}
