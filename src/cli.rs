use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use getopts::Options;

use mmu_timetable_ics::mmu::DEFAULT_API_URL;

pub const STUDENT_ID_VAR: &str = "MMU_STUDENT_ID";
pub const PASSWORD_VAR: &str = "MMU_PASSWORD";
pub const API_URL_VAR: &str = "MMU_API_URL";

#[derive(Debug)]
pub struct Args {
    pub student_id: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub output: PathBuf,
    pub timetable: Option<PathBuf>,
    pub api_url: String,
    pub timeout: Duration,
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "i",
        "student-id",
        "MMU student ID [Default: $MMU_STUDENT_ID, otherwise prompted]",
        "ID",
    );
    opts.optopt(
        "s",
        "start",
        "First day of the trimester [Default: prompted]",
        "YYYY-MM-DD",
    );
    opts.optopt(
        "e",
        "end",
        "Last day of the trimester [Default: prompted]",
        "YYYY-MM-DD",
    );
    opts.optopt(
        "o",
        "output",
        "Calendar file to write [Default: mmutimetable.ics]",
        "PATH",
    );
    opts.optopt(
        "",
        "timetable",
        "Convert a saved timetable response instead of logging in",
        "FILE",
    );
    opts.optopt(
        "",
        "api-url",
        "Base URL of the MMU mobile API [Default: $MMU_API_URL, otherwise the public API]",
        "URL",
    );
    opts.optopt(
        "t",
        "timeout",
        "Timeout for each API request [Default: 30]",
        "SECONDS",
    );
    opts
}

pub enum Invocation {
    Run(Args),
    Help(String),
}

/// Parses the command line, falling back to `var` for options that may come
/// from the environment.
pub fn parse<F>(args: Vec<String>, var: F) -> Result<Invocation, String>
where
    F: Fn(&str) -> Option<String>,
{
    let opts = opts();

    let matches = opts.parse(args).map_err(|fail| fail.to_string())?;

    if matches.opt_present("help") {
        return Ok(Invocation::Help(format!(
            "{}\nThe password is read from ${PASSWORD_VAR} or prompted for.",
            opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME")))
        )));
    }

    let student_id = matches
        .opt_str("student-id")
        .or_else(|| var(STUDENT_ID_VAR));

    let start = matches
        .opt_get::<NaiveDate>("start")
        .map_err(|err| format!("Provided value for option 'start' is invalid: {err}"))?;

    let end = matches
        .opt_get::<NaiveDate>("end")
        .map_err(|err| format!("Provided value for option 'end' is invalid: {err}"))?;

    let output = matches
        .opt_str("output")
        .map_or_else(|| PathBuf::from("mmutimetable.ics"), PathBuf::from);

    let timetable = matches.opt_str("timetable").map(PathBuf::from);

    let api_url = matches
        .opt_str("api-url")
        .or_else(|| var(API_URL_VAR))
        .unwrap_or_else(|| DEFAULT_API_URL.into());

    let timeout = matches
        .opt_get_default("timeout", 30)
        .map(Duration::from_secs)
        .map_err(|err| format!("Provided value for option 'timeout' is invalid: {err}"))?;

    Ok(Invocation::Run(Args {
        student_id,
        start,
        end,
        output,
        timetable,
        api_url,
        timeout,
    }))
}

pub fn prompt_text(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read input")?;

    Ok(input.trim().to_string())
}

pub fn prompt_password(label: &str) -> Result<String> {
    rpassword::prompt_password(format!("{label}: ")).context("Failed to read password")
}

pub fn prompt_date(label: &str) -> Result<NaiveDate> {
    let input = prompt_text(&format!("{label} (YYYY-MM-DD)"))?;
    input
        .parse()
        .with_context(|| format!("`{input}` is not a valid date"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rstest::rstest;

    use super::*;

    fn run(args: &[&str], env: &[(&str, &str)]) -> Result<Args, String> {
        let env = env
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();

        let args = args.iter().map(ToString::to_string).collect();
        match parse(args, |name| env.get(name).cloned())? {
            Invocation::Run(args) => Ok(args),
            Invocation::Help(_) => Err("help".into()),
        }
    }

    #[test]
    fn defaults() {
        let args = run(&[], &[]).unwrap();

        assert_eq!(args.student_id, None);
        assert_eq!(args.start, None);
        assert_eq!(args.end, None);
        assert_eq!(args.output, PathBuf::from("mmutimetable.ics"));
        assert_eq!(args.timetable, None);
        assert_eq!(args.api_url, DEFAULT_API_URL);
        assert_eq!(args.timeout, Duration::from_secs(30));
    }

    #[test]
    fn options() {
        let args = run(
            &[
                "-i", "1211100001", "-s", "2024-01-01", "--end", "2024-04-01", "-o", "out.ics",
                "--timetable", "saved.json", "--api-url", "http://127.0.0.1:8080/api", "-t", "5",
            ],
            &[],
        )
        .unwrap();

        assert_eq!(args.student_id.as_deref(), Some("1211100001"));
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(args.end, NaiveDate::from_ymd_opt(2024, 4, 1));
        assert_eq!(args.output, PathBuf::from("out.ics"));
        assert_eq!(args.timetable, Some(PathBuf::from("saved.json")));
        assert_eq!(args.api_url, "http://127.0.0.1:8080/api");
        assert_eq!(args.timeout, Duration::from_secs(5));
    }

    #[test]
    fn environment_fallbacks() {
        let env = [
            (STUDENT_ID_VAR, "1211100002"),
            (API_URL_VAR, "http://localhost/api"),
        ];

        let args = run(&[], &env).unwrap();
        assert_eq!(args.student_id.as_deref(), Some("1211100002"));
        assert_eq!(args.api_url, "http://localhost/api");

        let args = run(&["-i", "1211100001", "--api-url", "http://other/api"], &env).unwrap();
        assert_eq!(args.student_id.as_deref(), Some("1211100001"));
        assert_eq!(args.api_url, "http://other/api");
    }

    #[rstest]
    #[case(&["--start", "01/01/2024"], "'start'")]
    #[case(&["--end", "2024-13-01"], "'end'")]
    #[case(&["--timeout", "soon"], "'timeout'")]
    fn rejects_invalid_values(#[case] args: &[&str], #[case] option: &str) {
        let err = run(args, &[]).unwrap_err();
        assert!(err.contains(option), "{err}");
    }

    #[test]
    fn rejects_unknown_option() {
        assert!(run(&["--frobnicate"], &[]).is_err());
    }

    #[test]
    fn help() {
        let help = parse(vec!["--help".into()], |_| None).ok();
        match help {
            Some(Invocation::Help(usage)) => {
                assert!(usage.contains("--student-id"));
                assert!(usage.contains(PASSWORD_VAR));
            }
            _ => panic!("expected help output"),
        }
    }
}
