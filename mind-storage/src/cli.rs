use clap::{Args, Parser, Subcommand};
use supabase::OAuthProvider;

#[derive(Debug, Parser)]
#[command(name = "mind-storage")]
#[command(about = "Terminal client for the mind storage mood journal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run against the configured backend (default)
    Run,
    /// Run in dev mode with local in-memory data
    Dev,
    /// Log in from the shell with e-mail/password or through the browser
    Login(LoginArgs),
    /// Remove the local session and saved navigation state
    Logout,
    /// Permanently delete the signed-in account and all of its entries
    DeleteAccount {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print config path and create default file if missing
    ConfigPath,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct LoginArgs {
    /// E-mail address; the password is prompted for
    #[arg(long)]
    pub email: Option<String>,
    /// OAuth provider: google or apple
    #[arg(long)]
    pub provider: Option<OAuthProvider>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["mind-storage"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn login_takes_exactly_one_method() {
        let cli = Cli::try_parse_from(["mind-storage", "login", "--provider", "Google"]).unwrap();
        match cli.command {
            Some(Commands::Login(args)) => {
                assert_eq!(args.provider, Some(OAuthProvider::Google));
                assert_eq!(args.email, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(Cli::try_parse_from(["mind-storage", "login"]).is_err());
        assert!(Cli::try_parse_from([
            "mind-storage",
            "login",
            "--email",
            "a@b.co",
            "--provider",
            "apple"
        ])
        .is_err());
        assert!(Cli::try_parse_from(["mind-storage", "login", "--provider", "github"]).is_err());
    }
}
