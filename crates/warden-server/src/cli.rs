//! Command-line interface.

use clap::Parser;

use crate::config::ServerConfig;
use crate::query::Query;

#[derive(Debug, Parser)]
#[command(
    name = "warden",
    about = "Answers role queries against a Warden store snapshot",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ServerConfig,

    #[command(subcommand)]
    pub query: Query,
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::CommandFactory;
    use clap::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    use super::*;
    use crate::query::PrincipalKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("warden").chain(args.iter().copied()))
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_project_check() {
        let (user, tenant, project) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let cli = parse(&[
            "check",
            "user",
            &user.to_string(),
            "ssh",
            &tenant.to_string(),
            &project.to_string(),
        ])
        .unwrap();
        assert_eq!(
            cli.query,
            Query::Check {
                kind: PrincipalKind::User,
                subject: user,
                role: "ssh".into(),
                tenant,
                project: Some(project),
            }
        );
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let (group, snapshot) = (Uuid::new_v4(), "/var/lib/warden/state.json");
        let cli = parse(&[
            "group",
            &group.to_string(),
            "auditor",
            "--snapshot",
            snapshot,
            "--skip-expired",
            "--log",
            "warden=debug",
        ])
        .unwrap();
        assert_eq!(cli.config.snapshot_path, Some(PathBuf::from(snapshot)));
        assert_eq!(cli.config.log_filter, "warden=debug");
        assert!(cli.config.resolver().skip_expired_bindings);
    }

    #[test]
    fn service_account_kind_uses_snake_case() {
        let (sa, tenant) = (Uuid::new_v4(), Uuid::new_v4());
        let cli = parse(&[
            "shared",
            "service_account",
            &sa.to_string(),
            &tenant.to_string(),
        ])
        .unwrap();
        assert_eq!(
            cli.query,
            Query::Shared {
                kind: PrincipalKind::ServiceAccount,
                subject: sa,
                tenant,
            }
        );
    }

    #[test]
    fn rejects_groups_as_subjects_and_bad_arguments() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(
            parse(&["check", "group", &id, "ssh", &id]).unwrap_err().kind(),
            ErrorKind::InvalidValue
        );
        assert_eq!(
            parse(&["members", "ssh"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(
            parse(&["group", "not-a-uuid", "ssh"]).unwrap_err().kind(),
            ErrorKind::ValueValidation
        );
        assert!(parse(&[]).is_err());
    }
}
