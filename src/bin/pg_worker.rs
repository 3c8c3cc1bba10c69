//! Runs embedded `PostgreSQL` lifecycle operations on behalf of the test
//! cluster when the test runner is root.
//!
//! ```text
//! pg_worker <setup|start|stop> <config-path>
//! ```
//!
//! `config-path` points at a JSON `WorkerPayload` carrying the cluster
//! settings and environment overrides. `initdb` refuses to run as root, so
//! the worker switches to `nobody` before touching the data directory.

/// Boxed error type for the main result.
type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(unix)]
mod worker {
    use super::BoxError;
    use camino::{Utf8Path, Utf8PathBuf};
    use nix::unistd::{Uid, User, initgroups, setgid, setuid};
    use pg_embedded_setup_unpriv::ambient_dir_and_path;
    use pg_embedded_setup_unpriv::worker::{PlainSecret, WorkerPayload};
    use postgresql_embedded::{PostgreSQL, Status};
    use std::ffi::CString;
    use std::io::Read;
    use std::mem::ManuallyDrop;
    use std::str::FromStr;
    use thiserror::Error;
    use tokio::runtime::Builder;

    const UNPRIVILEGED_USER: &str = "nobody";

    #[derive(Debug, Error)]
    pub enum WorkerError {
        #[error("usage: pg_worker <setup|start|stop> <config-path>")]
        Usage,
        #[error("unknown operation {0:?}")]
        UnknownOperation(String),
        #[error("failed to read worker config {path}: {source}")]
        ConfigRead {
            path: Utf8PathBuf,
            #[source]
            source: BoxError,
        },
        #[error("failed to parse worker config: {0}")]
        ConfigParse(#[from] serde_json::Error),
        #[error("invalid cluster settings: {0}")]
        Settings(String),
        #[error("failed to switch to {user}: {message}")]
        PrivilegeDrop { user: &'static str, message: String },
        #[error("failed to build runtime: {0}")]
        Runtime(#[source] std::io::Error),
        #[error("postgres {operation} failed: {message}")]
        Postgres {
            operation: Operation,
            message: String,
        },
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Operation {
        Setup,
        Start,
        Stop,
    }

    impl FromStr for Operation {
        type Err = WorkerError;

        fn from_str(raw: &str) -> Result<Self, Self::Err> {
            match raw {
                "setup" => Ok(Self::Setup),
                "start" => Ok(Self::Start),
                "stop" => Ok(Self::Stop),
                other => Err(WorkerError::UnknownOperation(other.to_owned())),
            }
        }
    }

    impl std::fmt::Display for Operation {
        fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str(match self {
                Self::Setup => "setup",
                Self::Start => "start",
                Self::Stop => "stop",
            })
        }
    }

    /// Parsed command line.
    #[derive(Debug, PartialEq, Eq)]
    pub struct WorkerArgs {
        pub operation: Operation,
        pub config: Utf8PathBuf,
    }

    impl WorkerArgs {
        pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, WorkerError> {
            let mut rest = args.into_iter().skip(1);
            let (Some(operation), Some(config), None) = (rest.next(), rest.next(), rest.next())
            else {
                return Err(WorkerError::Usage);
            };
            Ok(Self {
                operation: operation.parse()?,
                config: Utf8PathBuf::from(config),
            })
        }
    }

    pub fn run(args: &WorkerArgs) -> Result<(), WorkerError> {
        let payload = load_payload(&args.config)?;
        drop_privileges_if_root()?;
        let settings = payload
            .settings
            .into_settings()
            .map_err(|err| WorkerError::Settings(err.to_string()))?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(WorkerError::Runtime)?;
        apply_environment(&payload.environment);

        let operation = args.operation;
        let mut postgres = PostgreSQL::new(settings);
        runtime.block_on(async {
            match operation {
                Operation::Setup => {
                    postgres.setup().await.map_err(|err| failed(operation, &err))?;
                    ensure_started(&mut postgres, operation).await
                }
                Operation::Start => ensure_started(&mut postgres, operation).await,
                Operation::Stop => postgres.stop().await.map_err(|err| failed(operation, &err)),
            }
        })?;
        if operation == Operation::Start {
            // The server must outlive this process.
            let _running = ManuallyDrop::new(postgres);
        }
        Ok(())
    }

    async fn ensure_started(
        postgres: &mut PostgreSQL,
        operation: Operation,
    ) -> Result<(), WorkerError> {
        if matches!(postgres.status(), Status::Started) {
            return Ok(());
        }
        postgres.start().await.map_err(|err| failed(operation, &err))
    }

    fn failed(operation: Operation, err: &impl std::fmt::Display) -> WorkerError {
        WorkerError::Postgres {
            operation,
            message: err.to_string(),
        }
    }

    fn load_payload(path: &Utf8Path) -> Result<WorkerPayload, WorkerError> {
        let bytes = read_config(path).map_err(|source| WorkerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn read_config(path: &Utf8Path) -> Result<Vec<u8>, BoxError> {
        let (dir, relative) = ambient_dir_and_path(path)?;
        let mut file = dir.open(relative.as_std_path())?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn drop_privileges_if_root() -> Result<(), WorkerError> {
        if !Uid::effective().is_root() {
            return Ok(());
        }
        let refuse = |message: String| WorkerError::PrivilegeDrop {
            user: UNPRIVILEGED_USER,
            message,
        };
        let user = User::from_name(UNPRIVILEGED_USER)
            .map_err(|err| refuse(err.to_string()))?
            .ok_or_else(|| refuse("user not found".to_owned()))?;
        let name = CString::new(user.name.clone()).map_err(|err| refuse(err.to_string()))?;
        initgroups(&name, user.gid).map_err(|err| refuse(err.to_string()))?;
        setgid(user.gid).map_err(|err| refuse(err.to_string()))?;
        setuid(user.uid).map_err(|err| refuse(err.to_string()))?;

        // SAFETY: no other threads exist yet; the runtime is built afterwards.
        unsafe {
            std::env::set_var("HOME", &user.dir);
            std::env::set_var("USER", &user.name);
            std::env::set_var("LOGNAME", &user.name);
        }
        Ok(())
    }

    fn apply_environment(environment: &[(String, Option<PlainSecret>)]) {
        for (key, value) in environment {
            // SAFETY: the current-thread runtime has not spawned any threads,
            // so nothing else reads the environment concurrently.
            unsafe {
                match value {
                    Some(secret) => std::env::set_var(key, secret.expose()),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

}

#[cfg(unix)]
fn main() -> Result<(), BoxError> {
    let args = worker::WorkerArgs::parse(std::env::args())?;
    worker::run(&args)?;
    Ok(())
}

#[cfg(not(unix))]
fn main() -> Result<(), BoxError> {
    Err("pg_worker is only supported on Unix platforms".into())
}
