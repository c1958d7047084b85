mod cli;

use std::env;
use std::fs;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use log::info;

use mmu_timetable_ics::ics::{self as calendar, MALAYSIA};
use mmu_timetable_ics::mmu::{self, Credentials, MmuClient, Password};
use mmu_timetable_ics::{event, parse_timetable, ClassSession, Error, TrimesterWindow};

use cli::Invocation;

fn setup_logging() {
    let filters =
        env::var("LOG").unwrap_or_else(|_| concat!(env!("CARGO_CRATE_NAME"), "=info").into());

    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}

fn load_timetable(path: &Path) -> Result<Vec<ClassSession>> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read timetable from {}", path.display()))?;

    let sessions = parse_timetable(body)?;
    info!("Loaded {} class sessions from {}", sessions.len(), path.display());

    Ok(sessions)
}

async fn fetch_timetable(args: &cli::Args) -> Result<Vec<ClassSession>> {
    let student_id = match &args.student_id {
        Some(student_id) => student_id.clone(),
        None => cli::prompt_text("Student ID")?,
    };

    let password = match env::var(cli::PASSWORD_VAR) {
        Ok(password) => password,
        Err(_) => cli::prompt_password("Password")?,
    };

    let client = MmuClient::new(mmu::Config {
        api_url: args.api_url.clone(),
        timeout: args.timeout,
    })?;

    let credentials = Credentials {
        student_id,
        password: Password::new(password),
    };

    Ok(client.fetch_timetable(credentials).await?)
}

async fn run(args: cli::Args) -> Result<()> {
    let start = match args.start {
        Some(start) => start,
        None => cli::prompt_date("Trimester start date")?,
    };

    let end = match args.end {
        Some(end) => end,
        None => cli::prompt_date("Trimester end date")?,
    };

    let window = TrimesterWindow::new(start, end)?;

    let sessions = match &args.timetable {
        Some(path) => load_timetable(path)?,
        None => fetch_timetable(&args).await?,
    };

    let schedule = event::build(&sessions, &window);

    // Not subject to the LOG filter.
    if let Some(summary) = schedule.skip_summary(&window) {
        eprintln!("{summary}");
    }

    calendar::write(&args.output, &schedule.events, &MALAYSIA).map_err(Error::Io)?;
    info!(
        "Exported {} events as {}",
        schedule.events.len(),
        args.output.display()
    );

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    setup_logging();

    let args = match cli::parse(env::args().skip(1).collect(), |name| env::var(name).ok()) {
        Ok(Invocation::Run(args)) => args,
        Ok(Invocation::Help(usage)) => {
            println!("{usage}");
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
