//! `courier`: inspect and edit story distribution lists in a Courier store.
//!
//! # Usage
//!
//! ```
//! courier lists ls
//! courier lists create "Close friends" --member 4 --member 9
//! courier --config ~/.config/courier/courier.toml lists show 2
//! ```

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use courier_core::{
  distribution::{DistributionListPrivacyMode, NewDistributionList},
  ids::{DistributionListId, MessageId, RecipientId},
  repository::{RemoteDeleteSender, StorySettings},
  store::DistributionListStore,
};
use courier_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::CliConfig;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Courier message store tool")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "courier.toml")]
  config: PathBuf,

  /// Store file; overrides `store_path` from the config.
  #[arg(long)]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Distribution lists ("story" audiences).
  #[command(subcommand)]
  Lists(ListsCommand),
}

#[derive(Subcommand)]
enum ListsCommand {
  /// List every live distribution list.
  Ls,
  /// Print one list as JSON.
  Show { id: i64 },
  /// Create a list.
  Create {
    name:       String,
    /// Recipient id to add; repeat for more.
    #[arg(long = "member")]
    members:    Vec<i64>,
    #[arg(long, value_enum, default_value_t = Mode::OnlyWith)]
    mode:       Mode,
    /// Disallow replies and reactions.
    #[arg(long)]
    no_replies: bool,
  },
  /// Delete a list and remote-delete the stories sent to it.
  Delete { id: i64 },
  /// Turn replies and reactions on or off.
  Replies {
    id:      i64,
    #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
    enabled: bool,
  },
  /// Take a recipient out of a list's audience.
  RemoveMember { id: i64, recipient: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
  OnlyWith,
  AllExcept,
  All,
}

impl From<Mode> for DistributionListPrivacyMode {
  fn from(mode: Mode) -> Self {
    match mode {
      Mode::OnlyWith => Self::OnlyWith,
      Mode::AllExcept => Self::AllExcept,
      Mode::All => Self::All,
    }
  }
}

// ─── Remote deletes ───────────────────────────────────────────────────────────

/// There is no network layer here; deletes are reported so they can be
/// replayed by a client.
struct ReportingSender;

impl RemoteDeleteSender for ReportingSender {
  async fn send_remote_delete(&self, message_id: MessageId) {
    tracing::info!(%message_id, "remote delete pending");
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = CliConfig::load(&cli.config)?;
  let store_path = cli.store.unwrap_or_else(|| cfg.store_path());

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Lists(command) => run_lists(store, command).await,
  }
}

async fn run_lists(store: SqliteStore, command: ListsCommand) -> anyhow::Result<()> {
  match command {
    ListsCommand::Ls => {
      for list in store.get_all_lists().await.context("failed to read lists")? {
        println!(
          "{:>4}  {:<24} {:<10} {:>3} members  replies={}",
          list.id.to_raw(),
          list.name,
          list.privacy_mode,
          list.members.len(),
          list.allows_replies,
        );
      }
    }

    ListsCommand::Show { id } => {
      let id = DistributionListId::from_raw(id);
      let record = store
        .get_list(id)
        .await?
        .with_context(|| format!("no live list {id}"))?;
      println!("{}", serde_json::to_string_pretty(&record)?);
    }

    ListsCommand::Create { name, members, mode, no_replies } => {
      let mut list = NewDistributionList::new(
        name.clone(),
        members.into_iter().map(RecipientId::from_raw).collect(),
      );
      list.privacy_mode = mode.into();
      list.allows_replies = !no_replies;

      match store.create_list_with(list).await? {
        Some(id) => println!("{}", id.to_raw()),
        None => anyhow::bail!("a list named {name:?} already exists"),
      }
    }

    ListsCommand::Delete { id } => {
      let id = DistributionListId::from_raw(id);
      let deleted = delete_list(store, id).await?;
      println!("deleted {id}; {} stories to remote-delete", deleted.len());
    }

    ListsCommand::Replies { id, enabled } => {
      let id = DistributionListId::from_raw(id);
      let settings = StorySettings::new(store, ReportingSender);
      settings.get_record(id).await?;
      settings.set_replies_and_reactions_enabled(id, enabled).await?;
    }

    ListsCommand::RemoveMember { id, recipient } => {
      let settings = StorySettings::new(store, ReportingSender);
      let record = settings
        .get_record(DistributionListId::from_raw(id))
        .await?;
      settings
        .remove_member(&record, RecipientId::from_raw(recipient))
        .await?;
    }
  }

  Ok(())
}

/// Delete a live list. Unknown ids are rejected before anything is written.
async fn delete_list(store: SqliteStore, id: DistributionListId) -> anyhow::Result<Vec<MessageId>> {
  let settings = StorySettings::new(store, ReportingSender);
  settings.get_record(id).await?;
  settings
    .delete(id)
    .await
    .with_context(|| format!("failed to delete {id}"))
}
