//! route-checker binary.
//!
//! Entry point for the `route-checker` command-line tool.

use std::process::ExitCode;

use log::{error, info};
use route_checker::cli::Args;
use route_checker::exit::{codes, exit_code, failure_code};
use route_checker::logging::RunLogger;
use route_checker::{ArtifactWriter, CaptureRun, SessionManager, SshConnector};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    if std::env::args_os().len() <= 1 {
        eprintln!("{}", Args::help());
        return ExitCode::from(codes::CONFIG_ERROR);
    }

    let args = match Args::parse_with_env_file(std::env::args_os().collect::<Vec<_>>()) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(codes::CONFIG_ERROR)
            } else {
                ExitCode::from(codes::SUCCESS)
            };
        }
    };

    if !args.has_action() {
        println!("{}", Args::help());
        return ExitCode::from(codes::SUCCESS);
    }

    if let Err(e) = args.validate() {
        eprintln!("error: {e}");
        return ExitCode::from(codes::CONFIG_ERROR);
    }

    let _log_guard = match RunLogger::new(args.debug, Some(&args.log_file)).and_then(RunLogger::init)
    {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(codes::CONFIG_ERROR);
        }
    };

    let target = match args.resolver().resolve(args.target.as_deref()) {
        Ok(target) => target,
        Err(e) => {
            let e = route_checker::Error::from(e);
            error!("{e}");
            return ExitCode::from(exit_code(&e));
        }
    };

    if args.test {
        info!(
            "Configuration resolved: {target} port {} ({})",
            target.port, target.device_kind
        );
        return ExitCode::from(codes::SUCCESS);
    }

    let sessions = SessionManager::new(SshConnector::new(args.ssh_config()), args.session_options());
    let run = CaptureRun::new(sessions, ArtifactWriter::new(&args.output_dir)).lenient(args.lenient);

    match run.execute(&target).await {
        Ok(report) => {
            println!("{}", report.artifacts.raw_path.display());
            println!("{}", report.artifacts.structured_path.display());
            ExitCode::from(codes::SUCCESS)
        }
        Err(failure) => ExitCode::from(failure_code(&failure)),
    }
}
