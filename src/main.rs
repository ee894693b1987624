use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use log::error;
use taskforge_client::api::tasks;
use taskforge_client::models::{LoginData, RegisterData, TaskCreate, TaskQuery, TaskUpdate};
use taskforge_client::navigation::{LogNavigator, Navigator, Routes};
use taskforge_client::{
    storage, ApiGateway, ClientConfig, Guarded, RouteGuard, SessionController, TokenStore,
};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "taskforge-client", about = "Command-line client for the TaskForge API")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the issued tokens.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TASKFORGE_PASSWORD")]
        password: String,
    },
    /// Create an account and sign in with it.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long, env = "TASKFORGE_PASSWORD")]
        password: String,
    },
    /// Forget the stored tokens.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Renew the access token with the stored refresh token.
    Refresh,
    Tasks(TasksCommand),
}

#[derive(Args, Debug)]
struct TasksCommand {
    #[command(subcommand)]
    command: TasksSubcommand,
}

#[derive(Subcommand, Debug)]
enum TasksSubcommand {
    List {
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        completed: Option<bool>,
    },
    Get {
        task_id: Uuid,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        task_id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
    },
    Delete {
        task_id: Uuid,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::from_env()?;
    let backend = storage::for_context(config.context, &config.token_store_path);
    let tokens = TokenStore::new(backend);
    let gateway = ApiGateway::new(&config, tokens.clone())?;
    let navigator: Arc<dyn Navigator> = Arc::new(LogNavigator);
    let routes = Routes::from_config(&config);
    let guard = RouteGuard::new(navigator.clone(), routes.public.clone());

    let controller = SessionController::start(gateway, tokens, navigator, routes).await;

    match cli.command {
        Command::Login { email, password } => {
            let user = controller.login(&LoginData { email, password }).await?;
            println!("Logged in as {} <{}>", user.username, user.email);
        }
        Command::Register {
            email,
            username,
            password,
        } => {
            let data = RegisterData {
                email,
                username,
                password,
            };
            let user = controller.register(&data).await?;
            println!("Registered and logged in as {} <{}>", user.username, user.email);
        }
        Command::Logout => {
            controller.logout();
            println!("Logged out");
        }
        Command::Whoami => {
            let profile = guard.render(&controller.session(), |user| {
                format!(
                    "{} <{}>\nid: {}\nactive: {}\nsuperuser: {}\nmember since: {}",
                    user.username,
                    user.email,
                    user.id,
                    user.is_active,
                    user.is_superuser,
                    user.created_at.format("%Y-%m-%d")
                )
            });
            match profile {
                Guarded::Content(profile) => println!("{}", profile),
                _ => println!("Not logged in"),
            }
        }
        Command::Refresh => {
            let user = controller.refresh().await?;
            println!("Session renewed for {}", user.username);
        }
        Command::Tasks(cmd) => {
            if guard.render(&controller.session(), |_| ()).content().is_none() {
                println!("Not logged in");
                return Ok(());
            }
            run_tasks(&controller, cmd.command).await?;
        }
    }
    Ok(())
}

async fn run_tasks(
    controller: &SessionController,
    command: TasksSubcommand,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        TasksSubcommand::List {
            skip,
            limit,
            completed,
        } => {
            let query = TaskQuery {
                skip,
                limit,
                completed,
            };
            let list = controller
                .authorized(|gw| async move { tasks::list_tasks(&gw, &query).await })
                .await?;
            if list.is_empty() {
                println!("No tasks");
            }
            for task in list {
                let mark = if task.is_completed { "x" } else { " " };
                println!("[{}] {}  {}", mark, task.id, task.title);
            }
        }
        TasksSubcommand::Get { task_id } => {
            let task = controller
                .authorized(|gw| async move { tasks::get_task(&gw, task_id).await })
                .await?;
            println!("{}", serde_json::to_string_pretty(&task)?);
        }
        TasksSubcommand::Create { title, description } => {
            let data = TaskCreate {
                title,
                description,
                is_completed: None,
            };
            let task = controller
                .authorized(|gw| {
                    let data = data.clone();
                    async move { tasks::create_task(&gw, &data).await }
                })
                .await?;
            println!("Created {}", task.id);
        }
        TasksSubcommand::Update {
            task_id,
            title,
            description,
            completed,
        } => {
            let data = TaskUpdate {
                title,
                description,
                is_completed: completed,
            };
            let task = controller
                .authorized(|gw| {
                    let data = data.clone();
                    async move { tasks::update_task(&gw, task_id, &data).await }
                })
                .await?;
            println!("Updated {}", task.id);
        }
        TasksSubcommand::Delete { task_id } => {
            controller
                .authorized(|gw| async move { tasks::delete_task(&gw, task_id).await })
                .await?;
            println!("Deleted {}", task_id);
        }
    }
    Ok(())
}
