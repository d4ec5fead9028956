use super::args::*;

pub mod compare;
pub mod context;
pub mod edit;
pub mod generate;
pub mod reporting;

use crate::exit_codes;
use mailgrade_core::CancelFlag;
use tokio::task::JoinHandle;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Edit(args) => edit::run(args).await,
        Command::Generate(args) => generate::run(args).await,
        Command::Compare(args) => compare::run(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// Ctrl-C listener task, aborted on drop.
pub(crate) struct CtrlCListener {
    handle: JoinHandle<()>,
}

impl Drop for CtrlCListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Sets `cancel` on the first Ctrl-C until the returned listener is dropped.
pub(crate) fn spawn_cancel_on_ctrl_c(cancel: CancelFlag) -> CtrlCListener {
    let handle = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted; finishing the current email and stopping");
            cancel.cancel();
        }
    });
    CtrlCListener { handle }
}
