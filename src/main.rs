use clap::Parser;
use log::error;
use reqwest::Client;
use std::path::PathBuf;

use pymirror::error::SyncError;
use pymirror::http::HttpClient;
use pymirror::index::{DevpiIndex, PypiIndex};
use pymirror::request::{PackageRequest, RequestSet};
use pymirror::requirements::parse_requirements;
use pymirror::sync::{self, SyncReport};

/// pymirror - selective package index mirror
///
/// Copies the newest matching release of selected Python packages from an
/// origin index (PyPI by default) into a devpi-compatible destination index.
/// Packages the destination already satisfies are left alone.
///
/// Examples:
///   pymirror requests                  # Mirror the newest requests release
///   pymirror 'requests>=2.0,<3.0'      # Constrain the version to mirror
///   pymirror -r requirements.txt       # Mirror everything the list names
#[derive(Parser, Debug)]
#[command(author, version = env!("PYMIRROR_VERSION"), about)]
struct Cli {
    /// A single requirement to mirror, e.g. "requests>=2.0"
    #[arg(value_name = "PACKAGE")]
    package: Option<String>,

    /// Requirements file naming the packages to mirror
    #[arg(long, short = 'r', value_name = "FILE")]
    requirements: Option<PathBuf>,

    /// Origin index base URL
    #[arg(
        long,
        short = 'o',
        value_name = "URL",
        default_value = "https://pypi.python.org"
    )]
    origin: String,

    /// Index name on the origin server
    #[arg(long, value_name = "NAME", default_value = "pypi")]
    origin_index: String,

    /// Username for the origin index
    #[arg(long, value_name = "USER")]
    orig_user: Option<String>,

    /// Password for the origin index (also via PYMIRROR_ORIG_PASS)
    #[arg(long, value_name = "PASSWORD", env = "PYMIRROR_ORIG_PASS")]
    orig_pass: Option<String>,

    /// Destination index base URL
    #[arg(
        long,
        short = 'd',
        value_name = "URL",
        default_value = "https://pypi.example.org"
    )]
    destination: String,

    /// Index name on the destination server
    #[arg(long, value_name = "NAME", default_value = "root/pypi")]
    destination_index: String,

    /// Username for the destination index
    #[arg(long, value_name = "USER", default_value = "root")]
    dest_user: String,

    /// Password for the destination index (also via PYMIRROR_DEST_PASS)
    #[arg(
        long,
        value_name = "PASSWORD",
        env = "PYMIRROR_DEST_PASS",
        default_value = ""
    )]
    dest_pass: String,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(report) => println!("{}", report),
        Err(err) => {
            let code = err.exit_code();
            error!("{:#}", anyhow::Error::from(err));
            std::process::exit(code);
        }
    }
}

async fn run(cli: Cli) -> Result<SyncReport, SyncError> {
    let requests = collect_requests(&cli)?;

    check_scheme(&cli.destination)?;
    check_scheme(&cli.origin)?;

    let client = Client::new();
    let http = HttpClient::new(client.clone());

    check_reachable(&http, &cli.destination).await?;
    check_reachable(&http, &cli.origin).await?;

    let origin_credentials = cli
        .orig_user
        .as_ref()
        .map(|user| (user.clone(), cli.orig_pass.clone().unwrap_or_default()));
    let origin = PypiIndex::new(
        client.clone(),
        &cli.origin,
        &cli.origin_index,
        origin_credentials,
    );

    let mut destination = DevpiIndex::new(client, &cli.destination, &cli.destination_index);
    destination.login(&cli.dest_user, &cli.dest_pass).await?;

    sync::run(&requests, &origin, &destination, &destination, &http).await
}

/// Merges the requirements file and the direct argument into one request
/// set. The same name in both places is a hard user error, not an
/// override.
fn collect_requests(cli: &Cli) -> Result<RequestSet, SyncError> {
    let mut requests = RequestSet::new();

    if let Some(path) = &cli.requirements {
        for request in parse_requirements(path)? {
            requests.append(request);
        }
    }

    if let Some(package) = &cli.package {
        let request: PackageRequest = package.parse()?;
        requests.insert_unique(request)?;
    }

    if requests.is_empty() {
        return Err(SyncError::MissingInput);
    }

    Ok(requests)
}

fn check_scheme(url: &str) -> Result<(), SyncError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(SyncError::MissingScheme(url.to_string()))
    }
}

/// One-shot reachability check, run before any sync work. A redirect
/// counts as reachable since public indexes commonly front their file
/// hosts with one.
async fn check_reachable(http: &HttpClient, url: &str) -> Result<(), SyncError> {
    match http.probe(url).await {
        Ok(status) if status.is_success() || status.is_redirection() => Ok(()),
        Ok(status) => Err(SyncError::Unreachable {
            url: url.to_string(),
            reason: format!("status {}", status),
        }),
        Err(err) => Err(SyncError::Unreachable {
            url: url.to_string(),
            reason: format!("{:#}", err),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["pymirror", "requests"]).unwrap();
        assert_eq!(cli.package, Some("requests".to_string()));
        assert_eq!(cli.origin, "https://pypi.python.org");
        assert_eq!(cli.origin_index, "pypi");
        assert_eq!(cli.destination, "https://pypi.example.org");
        assert_eq!(cli.destination_index, "root/pypi");
        assert_eq!(cli.dest_user, "root");
        assert_eq!(cli.dest_pass, "");
        assert_eq!(cli.orig_user, None);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::try_parse_from([
            "pymirror",
            "-o",
            "https://mirror.example.org",
            "-d",
            "http://devpi.example.org",
            "-r",
            "requirements.txt",
        ])
        .unwrap();
        assert_eq!(cli.origin, "https://mirror.example.org");
        assert_eq!(cli.destination, "http://devpi.example.org");
        assert_eq!(cli.requirements, Some(PathBuf::from("requirements.txt")));
        assert_eq!(cli.package, None);
    }

    #[test]
    fn test_cli_specifier_in_positional() {
        let cli = Cli::try_parse_from(["pymirror", "requests>=2.0,<3.0"]).unwrap();
        assert_eq!(cli.package, Some("requests>=2.0,<3.0".to_string()));
    }

    #[test]
    fn test_cli_no_arguments_parses() {
        // Missing input is a runtime error with its own exit code, not a
        // clap usage error
        let cli = Cli::try_parse_from(["pymirror"]).unwrap();
        assert_eq!(cli.package, None);
        assert_eq!(cli.requirements, None);
    }

    #[test]
    fn test_collect_requests_missing_input() {
        let cli = Cli::try_parse_from(["pymirror"]).unwrap();
        let result = collect_requests(&cli);
        assert!(matches!(result, Err(SyncError::MissingInput)));
    }

    #[test]
    fn test_collect_requests_from_package_argument() {
        let cli = Cli::try_parse_from(["pymirror", "requests>=2.0"]).unwrap();
        let requests = collect_requests(&cli).unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests.get("requests").is_some());
    }

    #[test]
    fn test_collect_requests_merges_file_and_argument() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "flask").unwrap();
        writeln!(file, "numpy==1.26.4").unwrap();
        file.flush().unwrap();

        let cli = Cli::try_parse_from([
            "pymirror",
            "requests",
            "-r",
            file.path().to_str().unwrap(),
        ])
        .unwrap();

        let requests = collect_requests(&cli).unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[test]
    fn test_collect_requests_rejects_duplicate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "requests>=1.0").unwrap();
        file.flush().unwrap();

        let cli = Cli::try_parse_from([
            "pymirror",
            "requests>=2.0",
            "-r",
            file.path().to_str().unwrap(),
        ])
        .unwrap();

        let result = collect_requests(&cli);
        assert!(matches!(result, Err(SyncError::DuplicatePackage(name)) if name == "requests"));
    }

    #[test]
    fn test_check_scheme() {
        assert!(check_scheme("https://pypi.python.org").is_ok());
        assert!(check_scheme("http://devpi.example.org:3141").is_ok());
        assert!(matches!(
            check_scheme("pypi.python.org"),
            Err(SyncError::MissingScheme(_))
        ));
        assert!(matches!(
            check_scheme("ftp://pypi.python.org"),
            Err(SyncError::MissingScheme(_))
        ));
    }
}
