// Entrypoint for the blob transfer console.
// - Keeps `main` small: read the account, build the Azure client and hand
//   both to the menu loop.
// - Picks the dialoguer/indicatif front end on a terminal and the plain
//   line-based one when input or output is redirected.

use anyhow::Context;
use blobshift::azure::AzureBlobClient;
use blobshift::progress::{BarProgress, LineProgress, ProgressReporter};
use blobshift::ui::{collect_account, LinePrompter, Prompter, Session, TermPrompter};
use std::io::IsTerminal;

fn main() -> anyhow::Result<()> {
    blobshift::logging::init().context("Failed to initialise logging")?;

    if std::io::stdin().is_terminal() && std::io::stdout().is_terminal() {
        run(TermPrompter::new(), BarProgress::new())
    } else {
        run(LinePrompter::stdio(), LineProgress::new(std::io::stdout()))
    }
}

fn run<P: Prompter, R: ProgressReporter>(mut prompter: P, reporter: R) -> anyhow::Result<()> {
    // Input ended before both credentials were given: nothing to do.
    let Some(account) = collect_account(&mut prompter).context("Failed to read storage account")? else {
        return Ok(());
    };
    tracing::info!(account = %account.name, endpoint = %account.blob_endpoint, "using storage account");

    let client = AzureBlobClient::new(account).context("Failed to build storage client")?;

    // Blocks until the user quits or input ends.
    Session::new(prompter, client, reporter)
        .run()
        .context("Console input failed")?;
    Ok(())
}
