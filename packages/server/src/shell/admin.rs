//! Operator access to the command log.
//!
//! Skipping masks entries with the no-op; unskipping drops the mask. Neither
//! touches live state: both show up on the next full replay.

use anyhow::{Context, Result};
use futures::TryStreamExt;
use ledger::Command as _;
use tracing::info;

use crate::common::CommonsApp;

/// One `id kind payload` line per entry after `after`, as replay would see it.
pub async fn list(app: &CommonsApp, after: u64) -> Result<Vec<String>> {
    let entries: Vec<_> = app
        .log()
        .after(after)
        .try_collect()
        .await
        .context("reading command log")?;

    entries
        .into_iter()
        .map(|entry| {
            let payload = serde_json::to_string(&entry.message)?;
            Ok(format!("{:>3} {:>20} {}", entry.id, entry.message.kind(), payload))
        })
        .collect()
}

pub async fn skip_commands(app: &CommonsApp, ids: &[u64]) -> Result<()> {
    app.log()
        .revise_commands(ids, &|_| None)
        .await
        .with_context(|| format!("skipping commands {:?}", ids))?;
    info!(?ids, "commands skipped, effective on next replay");
    Ok(())
}

pub async fn unskip_commands(app: &CommonsApp, ids: &[u64]) -> Result<()> {
    app.log()
        .restore_commands(ids)
        .await
        .with_context(|| format!("restoring commands {:?}", ids))?;
    info!(?ids, "commands restored, effective on next replay");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ledger::{LedgerError, MemoryCommandLog};

    use super::*;
    use crate::common::{command_codec, Command};
    use crate::domains::auth::commands::SetAdminUsers;
    use crate::kernel::TestDependencies;
    use crate::server::build_app;

    async fn app_with_admins() -> CommonsApp {
        let deps = TestDependencies::new().into_deps();
        let app = build_app(Arc::new(MemoryCommandLog::new(command_codec())), &deps, false);
        app.handle_command(
            SetAdminUsers {
                usernames: vec!["alice".into()],
            }
            .into(),
        )
        .await
        .unwrap();
        app
    }

    #[tokio::test]
    async fn test_list_formats_entries() {
        let app = app_with_admins().await;

        let lines = list(&app, 0).await.unwrap();
        assert_eq!(lines.len(), 1);
        let fields: Vec<&str> = lines[0].split_whitespace().take(2).collect();
        assert_eq!(fields, vec!["1", "SetAdminUsers"]);
        assert!(lines[0].starts_with("  1 "));
        assert!(lines[0].contains("\"alice\""));
    }

    #[tokio::test]
    async fn test_skip_then_unskip() {
        let app = app_with_admins().await;

        skip_commands(&app, &[1]).await.unwrap();
        let lines = list(&app, 0).await.unwrap();
        assert!(lines[0].contains("Skip"));
        assert_eq!(
            app.log().original(1).await.unwrap(),
            Some(Command::SetAdminUsers(SetAdminUsers {
                usernames: vec!["alice".into()]
            }))
        );

        unskip_commands(&app, &[1]).await.unwrap();
        assert!(list(&app, 0).await.unwrap()[0].contains("SetAdminUsers"));
    }

    #[tokio::test]
    async fn test_skip_unknown_id_fails() {
        let app = app_with_admins().await;

        let err = skip_commands(&app, &[1, 9]).await.unwrap_err();
        assert!(err.downcast_ref::<LedgerError>().is_some());
        assert!(list(&app, 0).await.unwrap()[0].contains("SetAdminUsers"));
    }
}
